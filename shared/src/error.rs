use lambda_http::{http::StatusCode, Body, Error, Response};
use thiserror::Error;

/// Request-boundary error taxonomy.
///
/// Every variant carries the user-facing message only. Internal fault detail
/// is logged where the fault happens and never crosses the boundary, so the
/// downstream variants have no payload.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    NotFound(String),
    #[error("model is not available")]
    ServiceUnavailable,
    #[error("failed to store uploaded image")]
    Storage,
    #[error("internal server error")]
    Service,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable | ApiError::Storage | ApiError::Service => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Render as the `{"error": true, "message": ...}` JSON body used by
    /// every endpoint.
    pub fn into_response(self) -> Result<Response<Body>, Error> {
        let body = serde_json::json!({
            "error": true,
            "message": self.to_string(),
        });
        Ok(Response::builder()
            .status(self.status())
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(body.to_string().into())
            .map_err(Box::new)?)
    }
}

/// Build a JSON response with the CORS header every endpoint carries.
pub fn json_response(
    status: StatusCode,
    body: &serde_json::Value,
) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(body.to_string().into())
        .map_err(Box::new)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Auth("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::ServiceUnavailable.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::Storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_downstream_variants_stay_generic() {
        assert_eq!(ApiError::Service.to_string(), "internal server error");
        assert_eq!(
            ApiError::Storage.to_string(),
            "failed to store uploaded image"
        );
    }
}
