//! Error handling for the Inventory POS platform
//!
//! Provides consistent error responses in English and Spanish

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        message_es: String,
    },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_es: String,
    },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_es: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Stock errors
    #[error("Variant not found: {0}")]
    VariantNotFound(Uuid),

    #[error("Insufficient stock. Available: {available}, Requested: {requested}")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("Concurrent update conflict")]
    ConcurrencyConflict,

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Only store-level conflicts are worth retrying; business rule
    /// failures fail the operation immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::ConcurrencyConflict)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::TokenExpired | AppError::InvalidToken | AppError::Unauthorized { .. } => {
                StatusCode::UNAUTHORIZED
            }
            AppError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AppError::Validation { .. }
            | AppError::DuplicateEntry(_)
            | AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) | AppError::VariantNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ConcurrencyConflict => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn validation(field: &str, message: &str, message_es: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_es: message_es.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = shared::first_field_error(&errors);
        AppError::Validation {
            message_es: format!("Dato inválido en {}: {}", field, message),
            field,
            message,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_es: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message_en: impl Into<String>, message_es: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message_en: message_en.into(),
            message_es: message_es.into(),
            field: None,
        }
    }

    fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_detail = match &self {
            AppError::TokenExpired => {
                ErrorDetail::new("TOKEN_EXPIRED", "Token has expired", "El token ha expirado")
            }
            AppError::InvalidToken => {
                ErrorDetail::new("INVALID_TOKEN", "Invalid token", "Token inválido")
            }
            AppError::InsufficientPermissions => ErrorDetail::new(
                "INSUFFICIENT_PERMISSIONS",
                "You do not have permission to perform this action",
                "No tiene permiso para realizar esta acción",
            ),
            AppError::Unauthorized { message, message_es } => {
                ErrorDetail::new("UNAUTHORIZED", message.clone(), message_es.clone())
            }
            AppError::Validation {
                field,
                message,
                message_es,
            } => ErrorDetail::new("VALIDATION_ERROR", message.clone(), message_es.clone())
                .with_field(field.clone()),
            AppError::DuplicateEntry(field) => ErrorDetail::new(
                "DUPLICATE_ENTRY",
                format!("A record with this {} already exists", field),
                format!("Ya existe un registro con este {}", field),
            )
            .with_field(field.clone()),
            AppError::Conflict {
                resource,
                message,
                message_es,
            } => ErrorDetail::new("CONFLICT", message.clone(), message_es.clone())
                .with_field(resource.clone()),
            AppError::NotFound(resource) => ErrorDetail::new(
                "NOT_FOUND",
                format!("{} not found", resource),
                format!("{} no encontrado", resource),
            ),
            AppError::VariantNotFound(_) => ErrorDetail::new(
                "VARIANT_NOT_FOUND",
                "Variant not found",
                "Variante no encontrada",
            ),
            AppError::InsufficientStock {
                available,
                requested,
            } => ErrorDetail::new(
                "INSUFFICIENT_STOCK",
                format!(
                    "Insufficient stock. Available: {}, Requested: {}",
                    available, requested
                ),
                format!(
                    "Stock insuficiente. Disponible: {}, Solicitado: {}",
                    available, requested
                ),
            ),
            AppError::ConcurrencyConflict => ErrorDetail::new(
                "CONCURRENCY_CONFLICT",
                "The stock changed concurrently. Please retry the operation.",
                "El stock cambió simultáneamente. Intente la operación nuevamente.",
            ),
            AppError::DatabaseError(_) => ErrorDetail::new(
                "DATABASE_ERROR",
                "A database error occurred",
                "Ocurrió un error en la base de datos",
            ),
            AppError::Internal(_) => ErrorDetail::new(
                "INTERNAL_ERROR",
                "An internal server error occurred",
                "Error interno del servidor",
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
