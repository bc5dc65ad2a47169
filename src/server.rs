//! HTTP surface: `POST /convert` and its `OPTIONS` preflight.
//!
//! This layer does three things and nothing else:
//!
//! 1. pull the `file` field out of the multipart body, applying the
//!    filename/type/size checks while streaming so an oversized upload is
//!    never buffered in full
//! 2. pass the resulting [`Upload`] to the [`ConversionHandler`]
//! 3. render the outcome as a DOCX download or a JSON error
//!
//! | Method  | Path                       | Response |
//! |---------|----------------------------|----------|
//! | OPTIONS | `/convert`, `/api/convert` | 200 + CORS headers |
//! | POST    | `/convert`, `/api/convert` | 200 DOCX, 400/500 JSON error |

use crate::error::Pdf2DocxError;
use crate::handler::{ConversionHandler, ConvertedDocument};
use crate::pipeline::validate::{self, Upload};
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

/// Multipart name of the upload field.
pub const FILE_FIELD: &str = "file";

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_ENVELOPE_BYTES: usize = 64 * 1024;

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

/// JSON body of the preflight response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreflightBody {
    pub status: String,
}

impl IntoResponse for Pdf2DocxError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (
            status,
            [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
            Json(body),
        )
            .into_response()
    }
}

impl IntoResponse for ConvertedDocument {
    fn into_response(self) -> Response {
        let disposition = HeaderValue::from_str(&self.content_disposition())
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (header::CONTENT_DISPOSITION, disposition),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// Build the router. The request-body limit is derived from the handler's
/// `max_upload_bytes`.
pub fn router(handler: Arc<ConversionHandler>) -> Router {
    let body_limit = handler
        .config()
        .max_upload_bytes
        .saturating_add(MULTIPART_ENVELOPE_BYTES);

    Router::new()
        .route("/convert", post(convert).options(preflight))
        .route("/api/convert", post(convert).options(preflight))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

/// Serve on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    handler: Arc<ConversionHandler>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(handler))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn preflight() -> impl IntoResponse {
    (
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST"),
        ],
        Json(PreflightBody {
            status: "ok".to_string(),
        }),
    )
}

async fn convert(
    State(handler): State<Arc<ConversionHandler>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = Uuid::new_v4();

    // A body that is not multipart at all carries no file field.
    let upload = match multipart {
        Ok(mut multipart) => read_upload(&mut multipart, &handler).await,
        Err(rejection) => {
            info!(%request_id, "Not a multipart request: {rejection}");
            Ok(None)
        }
    };

    let result = match upload {
        Ok(upload) => handler.handle_request(request_id, upload).await,
        Err(e) => Err(handler.reject(request_id, e)),
    };

    match result {
        Ok(doc) => doc.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Find the `file` field and read it, checking filename and type before the
/// body and the size while it streams in.
async fn read_upload(
    multipart: &mut Multipart,
    handler: &ConversionHandler,
) -> Result<Option<Upload>, Pdf2DocxError> {
    let config = handler.config();
    let limit = config.max_upload_bytes;

    while let Some(mut field) = multipart.next_field().await.map_err(field_error(limit))? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // A part without a `filename` parameter is a plain form value, not a
        // file upload.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        validate::check_filename(&filename, config)?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(field_error(limit))? {
            validate::check_size(bytes.len() + chunk.len(), limit)?;
            bytes.extend_from_slice(&chunk);
        }
        return Ok(Some(Upload::new(filename, bytes)));
    }

    Ok(None)
}

/// Hitting the router's body limit is still "too large"; anything else is a
/// malformed body.
fn field_error(limit: usize) -> impl Fn(MultipartError) -> Pdf2DocxError {
    move |e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Pdf2DocxError::TooLarge { limit_bytes: limit }
        } else {
            Pdf2DocxError::InvalidUpload {
                detail: e.body_text(),
            }
        }
    }
}
