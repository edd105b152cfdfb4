use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use centimo_import::{FileFormat, ImportError};

/// Failures the import endpoint can answer with. Whatever the variant, the
/// client sees the same envelope as a success: `success: false`, an empty
/// transaction list, and a `metadata.parsingMethod` naming the failure
/// stage. Raw parser errors never leak as bare 500 bodies.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Content type {0} is not accepted")]
    UnsupportedMediaType(String),

    #[error("Upload larger than the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("{source}")]
    Import {
        source: ImportError,
        /// Known when the filename routed before the stage failed.
        format: Option<FileFormat>,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Import { source, .. } => match source {
                ImportError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn parsing_method(&self) -> &'static str {
        match self {
            ApiError::Import { source, .. } => source.parsing_method(),
            ApiError::UnsupportedMediaType(_) => "unsupported-format",
            _ => "error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let mut metadata = json!({
            "totalTransactions": 0,
            "parsingMethod": self.parsing_method(),
        });
        if let ApiError::Import {
            format: Some(format),
            ..
        } = &self
        {
            metadata["fileType"] = json!(format);
        }

        let body = json!({
            "success": false,
            "transactions": [],
            "error": self.to_string(),
            "metadata": metadata,
        });

        (status, Json(body)).into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(format!("Malformed multipart body: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn unsupported_format_maps_to_415() {
        let err = ApiError::Import {
            source: ImportError::UnsupportedFormat("docx".into()),
            format: None,
        };
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["transactions"], json!([]));
        assert_eq!(body["metadata"]["parsingMethod"], json!("unsupported-format"));
        assert_eq!(body["metadata"]["totalTransactions"], json!(0));
    }

    #[tokio::test]
    async fn parse_failures_map_to_422_and_name_the_file_type() {
        let err = ApiError::Import {
            source: ImportError::NoTextLayer,
            format: Some(FileFormat::Pdf),
        };
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["metadata"]["parsingMethod"], json!("text-extraction-failed"));
        assert_eq!(body["metadata"]["fileType"], json!("PDF"));
    }

    #[tokio::test]
    async fn oversize_maps_to_413() {
        let (status, body) = body_of(ApiError::PayloadTooLarge { limit: 1024 }).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["error"].as_str().unwrap().contains("1024"));
        assert_eq!(body["metadata"]["parsingMethod"], json!("error"));
    }

    #[tokio::test]
    async fn rejected_mime_maps_to_415() {
        let (status, body) = body_of(ApiError::UnsupportedMediaType("application/zip".into())).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["metadata"]["parsingMethod"], json!("unsupported-format"));
    }
}
