//! HTTP error mapping.

use axum::{http::StatusCode, response::IntoResponse, Json};

#[derive(Debug)]
pub enum ApiError {
    Internal(kaunseling_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
}

impl From<kaunseling_core::Error> for ApiError {
    fn from(err: kaunseling_core::Error) -> Self {
        use kaunseling_core::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            // Bodies that do not match the record shape
            Error::Serialization(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                tracing::error!(subsystem = "api", error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaunseling_core::Error;

    fn status_of(err: Error) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(Error::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(Error::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(Error::Unauthorized("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(Error::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(Error::Serialization("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(Error::Storage("disk".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
