//! Error handling for the Hospital Stock Management Platform
//!
//! Provides consistent error types in French and English

use thiserror::Error;
use uuid::Uuid;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_fr: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    /// Enterprise stock settings are incomplete; there is no fallback
    /// algorithm or averaging window
    #[error("Stock settings incomplete: {0}")]
    IncompleteStockSettings(&'static str),

    /// A movement references a depot that does not exist
    #[error("Movement {movement_id} references unknown depot {depot_id}")]
    UnknownDepot { movement_id: Uuid, depot_id: Uuid },

    #[error("Unknown flux id on movement {movement_id}: {flux_id}")]
    UnknownFlux { movement_id: Uuid, flux_id: i16 },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code, used by callers translating errors
    /// into user-visible responses
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } | AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::IncompleteStockSettings(_) => "INCOMPLETE_STOCK_SETTINGS",
            AppError::UnknownDepot { .. } => "UNKNOWN_DEPOT",
            AppError::UnknownFlux { .. } => "UNKNOWN_FLUX",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Bilingual validation error helper
    pub fn validation(field: &str, message: &str, message_fr: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_fr: message_fr.to_string(),
        }
    }
}

/// Result type alias for services
pub type AppResult<T> = Result<T, AppError>;
