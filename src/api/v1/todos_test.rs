//! Integration tests for Todo API endpoints.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::api::{AppState, create_router};
use crate::db::{Database, SqliteDatabase};

/// Create a test app with an in-memory database
async fn test_app() -> axum::Router {
    let db = SqliteDatabase::in_memory().await.unwrap();
    db.migrate().await.unwrap();
    create_router(AppState::new(db))
}

/// Helper to parse JSON response body
async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Percent-encode a JSON query value.
fn encode(value: &Value) -> String {
    value
        .to_string()
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn seed(app: &axum::Router) {
    for todo in [
        json!({"id": 1, "title": "Buy milk", "isComplete": false}),
        json!({"id": 2, "title": "Walk dog", "desc": "Around the park", "isComplete": true}),
        json!({"id": 3, "title": "Write report", "isComplete": false}),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/todos", todo))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn create_todo_returns_record() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/todos",
            json!({"id": 7, "title": "Buy milk", "desc": "2 litres", "isComplete": false}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({"id": 7, "title": "Buy milk", "desc": "2 litres", "isComplete": false})
    );

    let response = app.oneshot(get_request("/todos/7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["title"], "Buy milk");
}

#[tokio::test(flavor = "multi_thread")]
async fn create_todo_with_taken_id_conflicts() {
    let app = test_app().await;
    seed(&app).await;

    let response = app
        .oneshot(json_request("POST", "/todos", json!({"id": 1, "title": "Again"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test(flavor = "multi_thread")]
async fn create_todo_without_id_is_rejected() {
    let app = test_app().await;

    let response = app
        .oneshot(json_request("POST", "/todos", json!({"title": "No id"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_todo_with_unknown_property_is_rejected() {
    let app = test_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/todos",
            json!({"id": 1, "title": "x", "priority": 3}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// =============================================================================
// Find and count
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn find_todos_without_filter_returns_all_in_id_order() {
    let app = test_app().await;
    seed(&app).await;

    let response = app.oneshot(get_request("/todos")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test(flavor = "multi_thread")]
async fn find_todos_with_filter() {
    let app = test_app().await;
    seed(&app).await;

    let filter = json!({
        "where": {"isComplete": false},
        "order": "title DESC",
        "fields": {"id": true, "title": true}
    });
    let response = app
        .oneshot(get_request(&format!("/todos?filter={}", encode(&filter))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        json!([
            {"id": 3, "title": "Write report"},
            {"id": 1, "title": "Buy milk"}
        ])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn find_todos_with_limit_and_skip() {
    let app = test_app().await;
    seed(&app).await;

    let filter = json!({"limit": 1, "skip": 1});
    let response = app
        .oneshot(get_request(&format!("/todos?filter={}", encode(&filter))))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn find_todos_with_zero_limit_returns_all() {
    let app = test_app().await;
    seed(&app).await;

    let filter = json!({"limit": 0});
    let response = app
        .oneshot(get_request(&format!("/todos?filter={}", encode(&filter))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn find_todos_with_out_of_range_paging_is_bad_request() {
    let app = test_app().await;
    seed(&app).await;

    for filter in [
        json!({"limit": 18446744073709551615u64}),
        json!({"skip": 18446744073709551615u64}),
    ] {
        let response = app
            .clone()
            .oneshot(get_request(&format!("/todos?filter={}", encode(&filter))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", filter);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn find_todos_with_unknown_order_property_is_bad_request() {
    let app = test_app().await;

    let filter = json!({"order": "priority DESC"});
    let response = app
        .oneshot(get_request(&format!("/todos?filter={}", encode(&filter))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn find_todos_with_malformed_filter_is_bad_request() {
    let app = test_app().await;

    let response = app
        .oneshot(get_request("/todos?filter=%7Bnot-json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn find_todos_with_include_is_bad_request() {
    let app = test_app().await;

    let filter = json!({"include": "owner"});
    let response = app
        .oneshot(get_request(&format!("/todos?filter={}", encode(&filter))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("Relation 'owner' is not defined for Todo model")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn count_todos_with_and_without_where() {
    let app = test_app().await;
    seed(&app).await;

    let response = app.clone().oneshot(get_request("/todos/count")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"count": 3}));

    let predicate = json!({"isComplete": true});
    let response = app
        .oneshot(get_request(&format!("/todos/count?where={}", encode(&predicate))))
        .await
        .unwrap();
    assert_eq!(json_body(response).await, json!({"count": 1}));
}

#[tokio::test(flavor = "multi_thread")]
async fn find_todo_by_id_with_fields() {
    let app = test_app().await;
    seed(&app).await;

    let filter = json!({"fields": ["title"]});
    let response = app
        .oneshot(get_request(&format!("/todos/2?filter={}", encode(&filter))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"title": "Walk dog"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn find_todo_by_id_with_where_is_bad_request() {
    let app = test_app().await;
    seed(&app).await;

    let filter = json!({"where": {"id": 2}, "limit": 1});
    let response = app
        .oneshot(get_request(&format!("/todos/1?filter={}", encode(&filter))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("Invalid filter"));
}

#[tokio::test(flavor = "multi_thread")]
async fn find_todo_by_missing_id_is_not_found() {
    let app = test_app().await;

    let response = app.oneshot(get_request("/todos/99")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Entity not found: Todo with id '99'");
}

// =============================================================================
// Updates
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn update_all_todos_only_touches_matches() {
    let app = test_app().await;
    seed(&app).await;

    let predicate = json!({"isComplete": false});
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/todos?where={}", encode(&predicate)),
            json!({"isComplete": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"count": 2}));

    let predicate = json!({"isComplete": true});
    let response = app
        .oneshot(get_request(&format!("/todos/count?where={}", encode(&predicate))))
        .await
        .unwrap();
    assert_eq!(json_body(response).await, json!({"count": 3}));
}

#[tokio::test(flavor = "multi_thread")]
async fn update_all_todos_rejects_id() {
    let app = test_app().await;
    seed(&app).await;

    let response = app
        .oneshot(json_request("PATCH", "/todos", json!({"id": 5})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test(flavor = "multi_thread")]
async fn patch_todo_merges_and_clears() {
    let app = test_app().await;
    seed(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/todos/2",
            json!({"isComplete": false, "desc": null}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get_request("/todos/2")).await.unwrap();
    assert_eq!(
        json_body(response).await,
        json!({"id": 2, "title": "Walk dog", "desc": null, "isComplete": false})
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn patch_todo_missing_is_not_found() {
    let app = test_app().await;

    let response = app
        .oneshot(json_request("PATCH", "/todos/42", json!({"title": "x"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn patch_todo_with_different_id_is_rejected() {
    let app = test_app().await;
    seed(&app).await;

    let response = app
        .oneshot(json_request("PATCH", "/todos/1", json!({"id": 2})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test(flavor = "multi_thread")]
async fn put_todo_replaces_all_attributes() {
    let app = test_app().await;
    seed(&app).await;

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/todos/2", json!({"title": "Feed cat"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get_request("/todos/2")).await.unwrap();
    assert_eq!(
        json_body(response).await,
        json!({"id": 2, "title": "Feed cat", "desc": null, "isComplete": null})
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn put_todo_missing_is_not_found() {
    let app = test_app().await;

    let response = app
        .oneshot(json_request("PUT", "/todos/5", json!({"id": 5, "title": "x"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn delete_todo_then_get_is_not_found() {
    let app = test_app().await;
    seed(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/todos/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(get_request("/todos/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/todos/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
