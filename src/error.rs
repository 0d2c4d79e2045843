use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Failures crossing the endpoint boundary. Everything a handler can
/// surface maps onto one of these, and each variant owns its status code
/// and JSON shape so services never touch HTTP types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<String>),

    #[error("{0} already taken")]
    Duplicate(&'static str),

    #[error("invalid credentials")]
    Authentication,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("upstream authentication failed: {0}")]
    UpstreamAuth(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Duplicate(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UpstreamAuth(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::Validation(errors) => ErrorBody {
                message: self.to_string(),
                errors: errors.clone(),
            },
            ApiError::Duplicate(field) => ErrorBody {
                message: self.to_string(),
                errors: vec![format!("{field} already taken")],
            },
            // Internal detail is logged, never sent to the client.
            ApiError::Internal(_) => ErrorBody {
                message: "internal server error".into(),
                errors: Vec::new(),
            },
            _ => ErrorBody {
                message: self.to_string(),
                errors: Vec::new(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref e) = self {
            error!(error = %e, "unhandled internal error");
        }
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400_with_listed_reasons() {
        let err = ApiError::Validation(vec!["password too short".into(), "no digit".into()]);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["message"], "validation failed");
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn duplicate_maps_to_400_naming_the_field() {
        let err = ApiError::Duplicate("username");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["message"], "username already taken");
    }

    #[test]
    fn authentication_maps_to_401_without_detail() {
        let err = ApiError::Authentication;
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["message"], "invalid credentials");
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn internal_hides_detail() {
        let err = ApiError::Internal(anyhow::anyhow!("connection pool exhausted"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["message"], "internal server error");
    }

    #[test]
    fn not_found_and_token_statuses() {
        assert_eq!(
            ApiError::NotFound("user not found").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::UpstreamAuth("provider refused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
