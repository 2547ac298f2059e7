use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Mandatory upstream call (contracts feed) failed
    #[error("Erro ao buscar contratos: {0}")]
    Upstream(anyhow::Error),

    #[error("Sienge returned no contracts")]
    EmptyContractFeed,

    #[error("Storage error: {0}")]
    Storage(anyhow::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::EmptyContractFeed => StatusCode::BAD_GATEWAY,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            // the caller gets the whole error chain, the banner shows `error`
            ApiError::Upstream(e) => ErrorResponse {
                error: self.to_string(),
                details: Some(format!("{:?}", e)),
            },
            ApiError::Storage(_) => ErrorResponse {
                error: "Erro no armazenamento de anexos".to_string(),
                details: None,
            },
            _ => ErrorResponse {
                error: self.to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{:?}", self);
        } else {
            tracing::info!("{} {}", status.as_u16(), self);
        }
        (status, Json(self.body())).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Upstream(anyhow::anyhow!("HTTP 401")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::EmptyContractFeed.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_upstream_body_has_details() {
        let err = ApiError::Upstream(anyhow::anyhow!("HTTP 503").context("page offset=200"));
        let body = err.body();
        assert!(body.error.contains("page offset=200"));
        let details = body.details.unwrap();
        assert!(details.contains("HTTP 503"));
    }

    #[test]
    fn test_storage_body_hides_internals() {
        let body = ApiError::Storage(anyhow::anyhow!("disk I/O error")).body();
        assert!(!body.error.contains("disk"));
        assert!(body.details.is_none());
    }
}
