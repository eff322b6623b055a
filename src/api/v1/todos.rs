//! Todo handlers.

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
use crate::db::{CrudRepository, Database, Todo};

use super::{
    CountResponse, ErrorResponse, FilterQuery, HandlerError, WhereQuery, db_error, parse_filter,
    parse_filter_excluding_where, parse_where, render, selection, to_patch,
};

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Buy milk")]
    pub title: Option<String>,
    #[schema(example = "Semi-skimmed, two litres")]
    pub desc: Option<String>,
    #[schema(example = false)]
    pub is_complete: Option<bool>,
}

impl From<Todo> for TodoResponse {
    fn from(t: Todo) -> Self {
        Self {
            id: t.id.unwrap_or_default(),
            title: t.title,
            desc: t.desc,
            is_complete: t.is_complete,
        }
    }
}

/// New todo. The caller chooses the id.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTodoRequest {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Buy milk")]
    pub title: Option<String>,
    pub desc: Option<String>,
    #[schema(example = false)]
    pub is_complete: Option<bool>,
}

impl From<NewTodoRequest> for Todo {
    fn from(req: NewTodoRequest) -> Self {
        Self {
            id: Some(req.id),
            title: req.title,
            desc: req.desc,
            is_complete: req.is_complete,
        }
    }
}

/// Full todo for replacement. Omitted attributes are cleared.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReplaceTodoRequest {
    /// Must match the path id when present
    pub id: Option<i64>,
    pub title: Option<String>,
    pub desc: Option<String>,
    pub is_complete: Option<bool>,
}

impl From<ReplaceTodoRequest> for Todo {
    fn from(req: ReplaceTodoRequest) -> Self {
        Self {
            id: req.id,
            title: req.title,
            desc: req.desc,
            is_complete: req.is_complete,
        }
    }
}

/// Partial todo. Absent attributes are left unchanged; `null` clears.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchTodoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(
        default,
        deserialize_with = "crate::serde_utils::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, example = "Buy oat milk")]
    pub title: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "crate::serde_utils::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub desc: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "crate::serde_utils::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<bool>, example = true)]
    pub is_complete: Option<Option<bool>>,
}

// =============================================================================
// Handlers
// =============================================================================

#[utoipa::path(
    post,
    path = "/todos",
    tag = "todos",
    request_body = NewTodoRequest,
    responses(
        (status = 200, description = "Todo created", body = TodoResponse),
        (status = 409, description = "Id already taken", body = ErrorResponse),
        (status = 422, description = "Invalid todo", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_todo<D: Database>(
    State(state): State<AppState<D>>,
    Json(req): Json<NewTodoRequest>,
) -> Result<Json<TodoResponse>, HandlerError> {
    let created = state
        .db()
        .todos()
        .create(&Todo::from(req))
        .await
        .map_err(db_error)?;

    Ok(Json(TodoResponse::from(created)))
}

#[utoipa::path(
    get,
    path = "/todos/count",
    tag = "todos",
    params(WhereQuery),
    responses(
        (status = 200, description = "Number of matching todos", body = CountResponse),
        (status = 400, description = "Invalid predicate", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn count_todos<D: Database>(
    State(state): State<AppState<D>>,
    Query(query): Query<WhereQuery>,
) -> Result<Json<CountResponse>, HandlerError> {
    let predicate = parse_where(query.predicate.as_deref())?;
    let count = state
        .db()
        .todos()
        .count(predicate.as_ref())
        .await
        .map_err(db_error)?;

    Ok(Json(CountResponse::from(count)))
}

#[utoipa::path(
    get,
    path = "/todos",
    tag = "todos",
    params(FilterQuery),
    responses(
        (status = 200, description = "Matching todos", body = Vec<TodoResponse>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn find_todos<D: Database>(
    State(state): State<AppState<D>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<Value>>, HandlerError> {
    let filter = parse_filter(query.filter.as_deref())?;
    let selected = selection::<Todo>(filter.as_ref().and_then(|f| f.fields.as_ref()))?;

    let todos = state
        .db()
        .todos()
        .find(filter.as_ref())
        .await
        .map_err(db_error)?;

    let items = todos
        .into_iter()
        .map(|t| render(TodoResponse::from(t), selected.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(items))
}

#[utoipa::path(
    patch,
    path = "/todos",
    tag = "todos",
    params(WhereQuery),
    request_body = PatchTodoRequest,
    responses(
        (status = 200, description = "Number of updated todos", body = CountResponse),
        (status = 400, description = "Invalid predicate", body = ErrorResponse),
        (status = 422, description = "Invalid patch", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_all_todos<D: Database>(
    State(state): State<AppState<D>>,
    Query(query): Query<WhereQuery>,
    Json(req): Json<PatchTodoRequest>,
) -> Result<Json<CountResponse>, HandlerError> {
    let predicate = parse_where(query.predicate.as_deref())?;
    let patch = to_patch::<Todo, _>(req)?;

    let count = state
        .db()
        .todos()
        .update_all(&patch, predicate.as_ref())
        .await
        .map_err(db_error)?;

    Ok(Json(CountResponse::from(count)))
}

#[utoipa::path(
    get,
    path = "/todos/{id}",
    tag = "todos",
    params(
        ("id" = i64, Path, description = "Todo ID"),
        FilterQuery
    ),
    responses(
        (status = 200, description = "Todo found", body = TodoResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn find_todo_by_id<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<i64>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Value>, HandlerError> {
    let filter = parse_filter_excluding_where(query.filter.as_deref())?;
    let selected = selection::<Todo>(filter.as_ref().and_then(|f| f.fields.as_ref()))?;

    let todo = state
        .db()
        .todos()
        .find_by_id(id, filter.as_ref())
        .await
        .map_err(db_error)?;

    Ok(Json(render(TodoResponse::from(todo), selected.as_ref())?))
}

#[utoipa::path(
    patch,
    path = "/todos/{id}",
    tag = "todos",
    params(("id" = i64, Path, description = "Todo ID")),
    request_body = PatchTodoRequest,
    responses(
        (status = 204, description = "Todo updated"),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 422, description = "Invalid patch", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_todo_by_id<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<i64>,
    Json(req): Json<PatchTodoRequest>,
) -> Result<StatusCode, HandlerError> {
    let patch = to_patch::<Todo, _>(req)?;
    state
        .db()
        .todos()
        .update_by_id(id, &patch)
        .await
        .map_err(db_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/todos/{id}",
    tag = "todos",
    params(("id" = i64, Path, description = "Todo ID")),
    request_body = ReplaceTodoRequest,
    responses(
        (status = 204, description = "Todo replaced"),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 422, description = "Invalid todo", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn replace_todo_by_id<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<i64>,
    Json(req): Json<ReplaceTodoRequest>,
) -> Result<StatusCode, HandlerError> {
    state
        .db()
        .todos()
        .replace_by_id(id, &Todo::from(req))
        .await
        .map_err(db_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/todos/{id}",
    tag = "todos",
    params(("id" = i64, Path, description = "Todo ID")),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_todo_by_id<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, HandlerError> {
    state
        .db()
        .todos()
        .delete_by_id(id)
        .await
        .map_err(db_error)?;

    Ok(StatusCode::NO_CONTENT)
}
