//! External-program converter.
//!
//! The default setup runs `pdf2docx convert {input} {output}`, but any tool
//! that reads one path and writes another works (`soffice`, a wrapper
//! script, ...). Arguments are passed straight to the process, never through
//! a shell, so paths with spaces need no quoting.

use super::DocumentConverter;
use crate::error::ConverterError;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tracing::debug;

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Runs an external program to perform the conversion.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
}

impl CommandConverter {
    /// A converter that invokes `program` as `program {input} {output}`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec![INPUT_PLACEHOLDER.to_string(), OUTPUT_PLACEHOLDER.to_string()],
        }
    }

    /// Replace the argument template. `{input}` and `{output}` are substituted
    /// anywhere they appear, including inside a larger argument such as
    /// `--out={output}`.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn render_args(&self, source: &Path, dest: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| match arg.as_str() {
                INPUT_PLACEHOLDER => source.as_os_str().to_owned(),
                OUTPUT_PLACEHOLDER => dest.as_os_str().to_owned(),
                _ => OsString::from(
                    arg.replace(INPUT_PLACEHOLDER, &source.to_string_lossy())
                        .replace(OUTPUT_PLACEHOLDER, &dest.to_string_lossy()),
                ),
            })
            .collect()
    }
}

impl DocumentConverter for CommandConverter {
    fn name(&self) -> &str {
        &self.program
    }

    fn convert(&self, source: &Path, dest: &Path) -> Result<(), ConverterError> {
        let args = self.render_args(source, dest);
        debug!("Running converter: {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| ConverterError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ConverterError::Exited {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}
