use aide::OperationOutput;
use axum::{http::StatusCode, response::IntoResponse, Json};
use schemars::JsonSchema;
use serde_json::json;

/// Represent errors in the application
///
/// All `ServiceError`s can be transformed to http errors.
#[derive(Debug, Clone, JsonSchema)]
pub enum ServiceError {
    InternalServerError(String),
    NotFound,
    /// Request was rejected before any database write.
    BadRequest(String),
    /// The referenced row exists but its current state does not permit the operation.
    IllegalState(&'static str),
    Unauthorized(&'static str),
    Forbidden(&'static str),
    /// Non-2xx response from the external payment gateway.
    /// The gateway payload is attached for diagnostics, no local state was created.
    PaymentGateway {
        status: u16,
        body: String,
    },
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for ServiceError {}

/// Helper for `ServiceError` result
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ServiceError::NotFound,
            err => ServiceError::InternalServerError(err.to_string()),
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::InternalServerError(err.to_string())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::InternalServerError(err.to_string())
    }
}

impl OperationOutput for ServiceError {
    type Inner = String;
}
impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        if let ServiceError::InternalServerError(ref cause) = self {
            log::error!("Internal server error: {}", cause);
        }

        match self {
            ServiceError::InternalServerError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            ),
            ServiceError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Not found",
                })),
            ),
            ServiceError::BadRequest(ref cause) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": cause })),
            ),
            ServiceError::IllegalState(cause) => (
                StatusCode::CONFLICT,
                Json(json!({ "error": cause })),
            ),
            ServiceError::Unauthorized(cause) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": cause })),
            ),
            ServiceError::Forbidden(cause) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": cause })),
            ),
            ServiceError::PaymentGateway { status, ref body } => (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Payment gateway rejected the request", "gateway_status": status, "gateway_body": body })),
            ),
        }
        .into_response()
    }
}
