//! Teacher handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use utoipa::ToSchema;

use crate::api::AppState;
use crate::db::{CrudRepository, Database, Teacher};

use super::{
    CountResponse, ErrorResponse, FilterQuery, HandlerError, WhereQuery, db_error, parse_filter,
    parse_filter_excluding_where, parse_where, render, selection, to_patch,
};

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeacherResponse {
    /// Assigned by the database
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
    #[schema(example = "ada@school.test")]
    pub email: Option<String>,
    #[schema(example = "Mathematics")]
    pub subject: Option<String>,
}

impl From<Teacher> for TeacherResponse {
    fn from(t: Teacher) -> Self {
        Self {
            id: t.id.unwrap_or_default(),
            name: t.name,
            email: t.email,
            subject: t.subject,
        }
    }
}

/// New teacher. The id is generated and may not be supplied.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewTeacherRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
    #[schema(example = "ada@school.test")]
    pub email: Option<String>,
    #[schema(example = "Mathematics")]
    pub subject: Option<String>,
}

impl From<NewTeacherRequest> for Teacher {
    fn from(req: NewTeacherRequest) -> Self {
        Self {
            id: None,
            name: req.name,
            email: req.email,
            subject: req.subject,
        }
    }
}

/// Full teacher for replacement. Omitted attributes are cleared.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReplaceTeacherRequest {
    /// Must match the path id when present
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
}

impl From<ReplaceTeacherRequest> for Teacher {
    fn from(req: ReplaceTeacherRequest) -> Self {
        Self {
            id: req.id,
            name: req.name,
            email: req.email,
            subject: req.subject,
        }
    }
}

/// Partial teacher. Absent attributes are left unchanged; `null` clears.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PatchTeacherRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(
        default,
        deserialize_with = "crate::serde_utils::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, example = "Ada King")]
    pub name: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "crate::serde_utils::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "crate::serde_utils::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, example = "Computing")]
    pub subject: Option<Option<String>>,
}

// =============================================================================
// Handlers
// =============================================================================

#[utoipa::path(
    post,
    path = "/teachers",
    tag = "teachers",
    request_body = NewTeacherRequest,
    responses(
        (status = 200, description = "Teacher created", body = TeacherResponse),
        (status = 422, description = "Invalid teacher", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_teacher<D: Database>(
    State(state): State<AppState<D>>,
    Json(req): Json<NewTeacherRequest>,
) -> Result<Json<TeacherResponse>, HandlerError> {
    let created = state
        .db()
        .teachers()
        .create(&Teacher::from(req))
        .await
        .map_err(db_error)?;

    Ok(Json(TeacherResponse::from(created)))
}

#[utoipa::path(
    get,
    path = "/teachers/count",
    tag = "teachers",
    params(WhereQuery),
    responses(
        (status = 200, description = "Number of matching teachers", body = CountResponse),
        (status = 400, description = "Invalid predicate", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn count_teachers<D: Database>(
    State(state): State<AppState<D>>,
    Query(query): Query<WhereQuery>,
) -> Result<Json<CountResponse>, HandlerError> {
    let predicate = parse_where(query.predicate.as_deref())?;
    let count = state
        .db()
        .teachers()
        .count(predicate.as_ref())
        .await
        .map_err(db_error)?;

    Ok(Json(CountResponse::from(count)))
}

#[utoipa::path(
    get,
    path = "/teachers",
    tag = "teachers",
    params(FilterQuery),
    responses(
        (status = 200, description = "Matching teachers", body = Vec<TeacherResponse>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn find_teachers<D: Database>(
    State(state): State<AppState<D>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<Value>>, HandlerError> {
    let filter = parse_filter(query.filter.as_deref())?;
    let selected = selection::<Teacher>(filter.as_ref().and_then(|f| f.fields.as_ref()))?;

    let teachers = state
        .db()
        .teachers()
        .find(filter.as_ref())
        .await
        .map_err(db_error)?;

    let items = teachers
        .into_iter()
        .map(|t| render(TeacherResponse::from(t), selected.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(items))
}

#[utoipa::path(
    patch,
    path = "/teachers",
    tag = "teachers",
    params(WhereQuery),
    request_body = PatchTeacherRequest,
    responses(
        (status = 200, description = "Number of updated teachers", body = CountResponse),
        (status = 400, description = "Invalid predicate", body = ErrorResponse),
        (status = 422, description = "Invalid patch", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_all_teachers<D: Database>(
    State(state): State<AppState<D>>,
    Query(query): Query<WhereQuery>,
    Json(req): Json<PatchTeacherRequest>,
) -> Result<Json<CountResponse>, HandlerError> {
    let predicate = parse_where(query.predicate.as_deref())?;
    let patch = to_patch::<Teacher, _>(req)?;

    let count = state
        .db()
        .teachers()
        .update_all(&patch, predicate.as_ref())
        .await
        .map_err(db_error)?;

    Ok(Json(CountResponse::from(count)))
}

#[utoipa::path(
    get,
    path = "/teachers/{id}",
    tag = "teachers",
    params(
        ("id" = i64, Path, description = "Teacher ID"),
        FilterQuery
    ),
    responses(
        (status = 200, description = "Teacher found", body = TeacherResponse),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn find_teacher_by_id<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<i64>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Value>, HandlerError> {
    let filter = parse_filter_excluding_where(query.filter.as_deref())?;
    let selected = selection::<Teacher>(filter.as_ref().and_then(|f| f.fields.as_ref()))?;

    let teacher = state
        .db()
        .teachers()
        .find_by_id(id, filter.as_ref())
        .await
        .map_err(db_error)?;

    Ok(Json(render(TeacherResponse::from(teacher), selected.as_ref())?))
}

#[utoipa::path(
    patch,
    path = "/teachers/{id}",
    tag = "teachers",
    params(("id" = i64, Path, description = "Teacher ID")),
    request_body = PatchTeacherRequest,
    responses(
        (status = 204, description = "Teacher updated"),
        (status = 404, description = "Teacher not found", body = ErrorResponse),
        (status = 422, description = "Invalid patch", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_teacher_by_id<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<i64>,
    Json(req): Json<PatchTeacherRequest>,
) -> Result<StatusCode, HandlerError> {
    let patch = to_patch::<Teacher, _>(req)?;
    state
        .db()
        .teachers()
        .update_by_id(id, &patch)
        .await
        .map_err(db_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/teachers/{id}",
    tag = "teachers",
    params(("id" = i64, Path, description = "Teacher ID")),
    request_body = ReplaceTeacherRequest,
    responses(
        (status = 204, description = "Teacher replaced"),
        (status = 404, description = "Teacher not found", body = ErrorResponse),
        (status = 422, description = "Invalid teacher", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn replace_teacher_by_id<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<i64>,
    Json(req): Json<ReplaceTeacherRequest>,
) -> Result<StatusCode, HandlerError> {
    state
        .db()
        .teachers()
        .replace_by_id(id, &Teacher::from(req))
        .await
        .map_err(db_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/teachers/{id}",
    tag = "teachers",
    params(("id" = i64, Path, description = "Teacher ID")),
    responses(
        (status = 204, description = "Teacher deleted"),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_teacher_by_id<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, HandlerError> {
    state
        .db()
        .teachers()
        .delete_by_id(id)
        .await
        .map_err(db_error)?;

    Ok(StatusCode::NO_CONTENT)
}
