//! Database error types.
//!
//! Errors are storage-backend agnostic. thiserror provides the derives and
//! miette attaches diagnostic codes for fancy output in the binaries.

use miette::Diagnostic;
use thiserror::Error;

/// Database operation errors.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Entity not found: {entity_type} with id '{id}'")]
    #[diagnostic(code(classroom::db::not_found))]
    NotFound { entity_type: String, id: String },

    #[error("Entity already exists: {entity_type} with id '{id}'")]
    #[diagnostic(code(classroom::db::already_exists))]
    AlreadyExists { entity_type: String, id: String },

    #[error("Invalid data: {message}")]
    #[diagnostic(code(classroom::db::invalid_data))]
    InvalidData {
        message: String,
        #[help]
        help: String,
    },

    #[error("Validation error: {message}")]
    #[diagnostic(code(classroom::db::validation_error))]
    Validation { message: String },

    #[error("Database error: {message}")]
    #[diagnostic(code(classroom::db::database_error))]
    Database { message: String },

    #[error("Migration error: {message}")]
    #[diagnostic(code(classroom::db::migration_error))]
    Migration { message: String },

    #[error("Connection error: {message}")]
    #[diagnostic(code(classroom::db::connection_error))]
    Connection { message: String },

    #[error("Constraint violation: {message}")]
    #[diagnostic(code(classroom::db::constraint))]
    Constraint { message: String },
}

impl DbError {
    pub(crate) fn not_found(entity_type: &str, id: i64) -> Self {
        DbError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>, help: impl Into<String>) -> Self {
        DbError::InvalidData {
            message: message.into(),
            help: help.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        DbError::Validation {
            message: message.into(),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
