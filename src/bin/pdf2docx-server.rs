//! Server binary for pdf2docx-api.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `ServiceConfig`, installs logging, and serves until Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2docx_api::{server, ConversionHandler, ConverterBackend, ServiceConfig};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"ENDPOINTS:
  POST    /convert       multipart/form-data, field "file" (PDF, ≤ max upload size)
  OPTIONS /convert       CORS preflight
  (both also served under /api/convert)

EXAMPLES:
  pdf2docx-server
  pdf2docx-server --bind 0.0.0.0:8080 --max-upload-mb 20
  pdf2docx-server --backend pdfium --pdfium-lib /opt/pdfium/lib
  pdf2docx-server --converter soffice \
      --converter-args "--headless,--convert-to,docx,--outdir,/tmp,{input}"

  curl -F "file=@Report.pdf" -OJ http://127.0.0.1:5000/convert

CONVERTER ARGUMENTS:
  {input} and {output} in --converter-args are replaced with the staged PDF
  path and the target DOCX path. Default: convert,{input},{output}
"#;

/// Serve PDF → DOCX conversion over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2docx-server",
    version,
    about = "HTTP service that converts uploaded PDF files to Word documents",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to listen on.
    #[arg(short, long, env = "PDF2DOCX_BIND", default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Largest accepted upload in MiB.
    #[arg(long, env = "PDF2DOCX_MAX_UPLOAD_MB", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..=1024))]
    max_upload_mb: u64,

    /// Directory for per-request temporary files (default: OS temp dir).
    #[arg(long, env = "PDF2DOCX_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Conversion backend.
    #[arg(long, env = "PDF2DOCX_BACKEND", value_enum, default_value = "command")]
    backend: BackendArg,

    /// External converter program (command backend).
    #[arg(long, env = "PDF2DOCX_CONVERTER", default_value = "pdf2docx")]
    converter: String,

    /// Comma-separated argument template for the converter program.
    #[arg(
        long,
        env = "PDF2DOCX_CONVERTER_ARGS",
        value_delimiter = ',',
        default_value = "convert,{input},{output}"
    )]
    converter_args: Vec<String>,

    /// Directory containing the pdfium shared library (pdfium backend).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2DOCX_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum BackendArg {
    Command,
    Pdfium,
}

impl Cli {
    fn backend(&self) -> ConverterBackend {
        match self.backend {
            BackendArg::Command => ConverterBackend::Command {
                program: self.converter.clone(),
                args: self.converter_args.clone(),
            },
            BackendArg::Pdfium => ConverterBackend::Pdfium {
                library_dir: self.pdfium_lib.clone(),
            },
        }
    }

    fn config(&self) -> Result<ServiceConfig> {
        let mut builder = ServiceConfig::builder()
            .bind_addr(self.bind)
            .max_upload_mb(self.max_upload_mb as usize)
            .backend(self.backend());
        if let Some(dir) = &self.temp_dir {
            builder = builder.temp_dir(dir);
        }
        builder.build().context("Invalid server configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build handler ────────────────────────────────────────────────────
    let config = cli.config()?;
    if let Some(dir) = &cli.temp_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Cannot create temp dir {}", dir.display()))?;
    }
    let bind_addr = config.bind_addr;
    let handler = ConversionHandler::from_config(config).context("Failed to set up converter")?;
    info!(
        "Converter: {:?}, max upload {} MiB",
        handler.config().backend,
        cli.max_upload_mb
    );

    // ── Serve ────────────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;

    server::serve(listener, Arc::new(handler), async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutting down");
    })
    .await
    .context("Server error")?;

    Ok(())
}
