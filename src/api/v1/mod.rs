//! V1 API handlers.
//!
//! Shared DTOs and the conversion from [`DbError`] into HTTP responses live
//! here; each resource family has its own module.

mod system;
mod teachers;
mod todos;

#[cfg(test)]
mod teachers_test;
#[cfg(test)]
mod todos_test;

pub use system::*;
pub use teachers::*;
pub use todos::*;

use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::db::{
    Count, DbError, Entity, Fields, Filter, FilterExcludingWhere, Patch, Selection, Where,
};

// =============================================================================
// Shared DTOs
// =============================================================================

/// Error response DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    #[schema(example = "Entity not found: Todo with id '42'")]
    pub error: String,
}

/// Number of records counted or updated
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    #[schema(example = 3)]
    pub count: u64,
}

impl From<Count> for CountResponse {
    fn from(c: Count) -> Self {
        Self { count: c.count }
    }
}

/// `?filter=` query for reads.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FilterQuery {
    /// JSON filter: where, fields, order, limit, skip, include
    #[param(example = r#"{"where":{"isComplete":false},"order":"title ASC","limit":10}"#)]
    pub filter: Option<String>,
}

/// `?where=` query for count and bulk update.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WhereQuery {
    /// JSON predicate
    #[serde(rename = "where")]
    #[param(example = r#"{"isComplete":false}"#)]
    pub predicate: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

pub type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Map a database error to a status code and JSON body.
pub(crate) fn db_error(e: DbError) -> HandlerError {
    let status = match &e {
        DbError::NotFound { .. } => StatusCode::NOT_FOUND,
        DbError::InvalidData { .. } => StatusCode::BAD_REQUEST,
        DbError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DbError::AlreadyExists { .. } | DbError::Constraint { .. } => StatusCode::CONFLICT,
        DbError::Database { .. } | DbError::Migration { .. } | DbError::Connection { .. } => {
            error!(error = %e, "database failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn parse_filter(raw: Option<&str>) -> Result<Option<Filter>, HandlerError> {
    non_empty(raw)
        .map(Filter::parse)
        .transpose()
        .map_err(db_error)
}

pub(crate) fn parse_filter_excluding_where(
    raw: Option<&str>,
) -> Result<Option<FilterExcludingWhere>, HandlerError> {
    non_empty(raw)
        .map(FilterExcludingWhere::parse)
        .transpose()
        .map_err(db_error)
}

pub(crate) fn parse_where(raw: Option<&str>) -> Result<Option<Where>, HandlerError> {
    non_empty(raw).map(Where::parse).transpose().map_err(db_error)
}

/// Resolve `fields` into a selection, if one was requested.
pub(crate) fn selection<E: Entity>(
    fields: Option<&Fields>,
) -> Result<Option<Selection>, HandlerError> {
    fields
        .map(|f| f.selection::<E>())
        .transpose()
        .map_err(db_error)
}

/// Serialize a response DTO, dropping unselected properties.
pub(crate) fn render<T: Serialize>(
    record: T,
    selection: Option<&Selection>,
) -> Result<Value, HandlerError> {
    let value = serde_json::to_value(record).map_err(|e| {
        db_error(DbError::Database {
            message: e.to_string(),
        })
    })?;

    Ok(match selection {
        Some(selection) => selection.apply(value),
        None => value,
    })
}

/// Validate a patch DTO against the model declaration.
pub(crate) fn to_patch<E: Entity, T: Serialize>(req: T) -> Result<Patch<E>, HandlerError> {
    match serde_json::to_value(req) {
        Ok(Value::Object(map)) => Patch::from_json(map).map_err(db_error),
        Ok(other) => Err(db_error(DbError::validation(format!(
            "{} patch must be an object, got {}",
            E::NAME,
            other
        )))),
        Err(e) => Err(db_error(DbError::validation(e.to_string()))),
    }
}
