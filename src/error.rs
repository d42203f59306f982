// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::database::DatabaseError;
use crate::model::{ModelError, RecordError, RegistryError};
use crate::schema::SchemaError;
use crate::services::{BootstrapError, DescribeError, TenantError};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, field_errors } => {
                let mut response = json!({
                    "error": true,
                    "message": message,
                    "code": "VALIDATION_ERROR"
                });

                if let Some(field_errors) = field_errors {
                    response["field_errors"] = json!(field_errors);
                }

                response
            }
            _ => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code()
                })
            }
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

fn field_error(field: impl Into<String>, message: impl Into<String>) -> Option<HashMap<String, String>> {
    let mut field_errors = HashMap::new();
    field_errors.insert(field.into(), message.into());
    Some(field_errors)
}

// Convert other error types to ApiError
impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::MissingRequiredField(field) => {
                ApiError::validation_error("Missing required fields", field_error(field, "This field is required"))
            }
            RecordError::InvalidType { field, expected, value } => ApiError::validation_error(
                "Invalid field format",
                field_error(field, format!("Expected {}, got {}", expected, value)),
            ),
            RecordError::DuplicateValue { field, value } => {
                ApiError::conflict(format!("Duplicate value for '{}': {}", field, value))
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(_) => ApiError::not_found(err.to_string()),
            DatabaseError::InvalidName(_) => ApiError::bad_request(err.to_string()),
            DatabaseError::Configuration(msg) => {
                tracing::error!("Database configuration error: {}", msg);
                ApiError::internal_server_error("Database server is not configured")
            }
            DatabaseError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Driver(driver_err) => {
                // Log the real error but return generic message
                tracing::error!("Driver error: {}", driver_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnsupportedType(_) | SchemaError::UnsupportedArrayItem(_) => {
                ApiError::validation_error(err.to_string(), None)
            }
            SchemaError::Database(driver_err) => {
                tracing::error!("Schema storage error: {}", driver_err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::MissingModels(_) => ApiError::not_found(err.to_string()),
            RegistryError::Schema(e) => e.into(),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Record(e) => e.into(),
            ModelError::Driver(e) => {
                tracing::error!("Model driver error: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<BootstrapError> for ApiError {
    fn from(err: BootstrapError) -> Self {
        match err {
            BootstrapError::AlreadyExists(_) => ApiError::conflict(err.to_string()),
            BootstrapError::Database(e) => e.into(),
            BootstrapError::Creation(_) | BootstrapError::Driver(_) => {
                tracing::error!("{}", err);
                ApiError::internal_server_error(err.to_string())
            }
        }
    }
}

impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::InvalidName(msg) => ApiError::bad_request(msg),
            TenantError::AlreadyExists(_) => ApiError::conflict(err.to_string()),
            TenantError::NotFound(_) => ApiError::not_found(err.to_string()),
            TenantError::Protected(_) => ApiError::forbidden(err.to_string()),
            TenantError::Bootstrap(e) => e.into(),
            TenantError::Database(e) => e.into(),
            TenantError::Model(e) => e.into(),
            TenantError::Schema(e) => e.into(),
            TenantError::IncompleteTransfer(_)
            | TenantError::DropFailed(_)
            | TenantError::MissingModel(_)
            | TenantError::Driver(_) => {
                tracing::error!("Tenant operation failed: {}", err);
                ApiError::internal_server_error(err.to_string())
            }
        }
    }
}

impl From<DescribeError> for ApiError {
    fn from(err: DescribeError) -> Self {
        match err {
            DescribeError::NotFound(_) => ApiError::not_found(err.to_string()),
            DescribeError::AlreadyExists(_) => ApiError::conflict(err.to_string()),
            DescribeError::InvalidFormat(_) => ApiError::bad_request(err.to_string()),
            DescribeError::Protected(_) => ApiError::forbidden(err.to_string()),
            DescribeError::Schema(e) => e.into(),
            DescribeError::Unconfirmed { .. } | DescribeError::Driver(_) => {
                tracing::error!("Collection operation failed: {}", err);
                ApiError::internal_server_error(err.to_string())
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_map_to_status() {
        assert_eq!(ApiError::from(DatabaseError::NotFound("acme".into())).status_code(), 404);
        assert_eq!(ApiError::from(DatabaseError::Connection("refused".into())).status_code(), 503);
        assert_eq!(ApiError::from(DatabaseError::InvalidName("a b".into())).status_code(), 400);
    }

    #[test]
    fn configuration_fault_is_server_error() {
        let err = ApiError::from(DatabaseError::Configuration("no database URI configured for europe/staging".into()));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn missing_field_carries_field_errors() {
        let err = ApiError::from(RecordError::MissingRequiredField("email".into()));
        let body = err.to_json();

        assert_eq!(err.status_code(), 400);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field_errors"]["email"], "This field is required");
    }

    #[test]
    fn duplicate_value_is_conflict() {
        let err = ApiError::from(RecordError::DuplicateValue {
            field: "email".into(),
            value: "a@b.c".into(),
        });
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn tenant_errors_map_to_status() {
        assert_eq!(ApiError::from(TenantError::AlreadyExists("acme".into())).status_code(), 409);
        assert_eq!(ApiError::from(TenantError::Protected("master".into())).status_code(), 403);
        assert_eq!(ApiError::from(TenantError::NotFound("acme".into())).status_code(), 404);
    }
}
