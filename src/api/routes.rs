//! API route configuration.

use axum::Router;
use axum::routing::{delete, get, patch, post, put};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use super::state::AppState;
use super::v1::{
    self, CountResponse, ErrorResponse, HealthResponse, NewTeacherRequest, NewTodoRequest,
    PatchTeacherRequest, PatchTodoRequest, ReplaceTeacherRequest, ReplaceTodoRequest,
    TeacherResponse, TodoResponse,
};
use crate::db::Database;

/// Build routes with generic database type.
///
/// This macro reduces boilerplate when registering handlers that are generic
/// over the Database trait. It applies the turbofish operator automatically.
macro_rules! routes {
    ($D:ty => {
        $($method:ident $path:literal => $($handler:ident)::+),* $(,)?
    }) => {{
        let router = Router::new();
        $(
            let router = router.route($path, $method($($handler)::+::<$D>));
        )*
        router
    }};
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Classroom API",
        version = "0.1.0",
        description = "CRUD API for teachers and todos",
        license(name = "GPL-2.0")
    ),
    paths(
        v1::health,
        v1::create_teacher,
        v1::count_teachers,
        v1::find_teachers,
        v1::update_all_teachers,
        v1::find_teacher_by_id,
        v1::update_teacher_by_id,
        v1::replace_teacher_by_id,
        v1::delete_teacher_by_id,
        v1::create_todo,
        v1::count_todos,
        v1::find_todos,
        v1::update_all_todos,
        v1::find_todo_by_id,
        v1::update_todo_by_id,
        v1::replace_todo_by_id,
        v1::delete_todo_by_id,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            CountResponse,
            TeacherResponse,
            NewTeacherRequest,
            PatchTeacherRequest,
            ReplaceTeacherRequest,
            TodoResponse,
            NewTodoRequest,
            PatchTodoRequest,
            ReplaceTodoRequest,
        )
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "teachers", description = "Teacher management endpoints"),
        (name = "todos", description = "Todo management endpoints")
    )
)]
pub struct ApiDoc;

/// Create the API router with OpenAPI documentation
pub fn create_router<D: Database + 'static>(state: AppState<D>) -> Router {
    // System routes (non-generic)
    let system_routes = Router::new()
        .route("/health", get(v1::health))
        .route("/openapi.json", get(v1::openapi));

    let teacher_routes = routes!(D => {
        post "/teachers" => v1::create_teacher,
        get "/teachers/count" => v1::count_teachers,
        get "/teachers" => v1::find_teachers,
        patch "/teachers" => v1::update_all_teachers,
        get "/teachers/{id}" => v1::find_teacher_by_id,
        patch "/teachers/{id}" => v1::update_teacher_by_id,
        put "/teachers/{id}" => v1::replace_teacher_by_id,
        delete "/teachers/{id}" => v1::delete_teacher_by_id,
    });

    let todo_routes = routes!(D => {
        post "/todos" => v1::create_todo,
        get "/todos/count" => v1::count_todos,
        get "/todos" => v1::find_todos,
        patch "/todos" => v1::update_all_todos,
        get "/todos/{id}" => v1::find_todo_by_id,
        patch "/todos/{id}" => v1::update_todo_by_id,
        put "/todos/{id}" => v1::replace_todo_by_id,
        delete "/todos/{id}" => v1::delete_todo_by_id,
    });

    system_routes
        .merge(teacher_routes)
        .merge(todo_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .with_state(state)
}
