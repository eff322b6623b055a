//! Integration tests for Teacher API endpoints.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::api::{AppState, create_router};
use crate::db::{Database, SqliteDatabase};

async fn test_app() -> axum::Router {
    let db = SqliteDatabase::in_memory().await.unwrap();
    db.migrate().await.unwrap();
    create_router(AppState::new(db))
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

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

async fn create(app: &axum::Router, body: Value) -> i64 {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/teachers", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["id"].as_i64().unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn teacher_crud_lifecycle() {
    let app = test_app().await;

    // Create
    let id = create(
        &app,
        json!({"name": "Ada", "email": "ada@school.test", "subject": "Mathematics"}),
    )
    .await;

    // Read
    let response = app
        .clone()
        .oneshot(get_request(&format!("/teachers/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"id": id, "name": "Ada", "email": "ada@school.test", "subject": "Mathematics"})
    );

    // Partial update
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/teachers/{}", id),
            json!({"subject": "Logic"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/teachers/{}", id)))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["name"], "Ada");
    assert_eq!(body["subject"], "Logic");

    // Replace
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/teachers/{}", id),
            json!({"id": id, "name": "Ada Lovelace"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/teachers/{}", id)))
        .await
        .unwrap();
    assert_eq!(
        json_body(response).await,
        json!({"id": id, "name": "Ada Lovelace", "email": null, "subject": null})
    );

    // Delete
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/teachers/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get_request(&format!("/teachers/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_teacher_rejects_client_id() {
    let app = test_app().await;

    let response = app
        .oneshot(json_request("POST", "/teachers", json!({"id": 9, "name": "Ada"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test(flavor = "multi_thread")]
async fn find_teachers_by_subject_and_count() {
    let app = test_app().await;
    create(&app, json!({"name": "Ada", "subject": "Mathematics"})).await;
    create(&app, json!({"name": "Grace", "subject": "Computing"})).await;
    create(&app, json!({"name": "Emmy", "subject": "Mathematics"})).await;

    let filter = json!({"where": {"subject": "Mathematics"}, "order": ["name ASC"]});
    let response = app
        .clone()
        .oneshot(get_request(&format!("/teachers?filter={}", encode(&filter))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ada", "Emmy"]);

    let response = app
        .clone()
        .oneshot(get_request("/teachers/count"))
        .await
        .unwrap();
    assert_eq!(json_body(response).await, json!({"count": 3}));

    let predicate = json!({"or": [{"name": "Ada"}, {"name": "Grace"}]});
    let response = app
        .oneshot(get_request(&format!(
            "/teachers/count?where={}",
            encode(&predicate)
        )))
        .await
        .unwrap();
    assert_eq!(json_body(response).await, json!({"count": 2}));
}

#[tokio::test(flavor = "multi_thread")]
async fn find_teachers_excluding_fields() {
    let app = test_app().await;
    create(&app, json!({"name": "Ada", "email": "ada@school.test"})).await;

    let filter = json!({"fields": {"email": false, "subject": false}});
    let response = app
        .oneshot(get_request(&format!("/teachers?filter={}", encode(&filter))))
        .await
        .unwrap();
    let body = json_body(response).await;
    let first = body[0].as_object().unwrap();
    assert!(first.contains_key("id"));
    assert!(first.contains_key("name"));
    assert!(!first.contains_key("email"));
    assert!(!first.contains_key("subject"));
}

#[tokio::test(flavor = "multi_thread")]
async fn count_teachers_with_unknown_property_is_bad_request() {
    let app = test_app().await;

    let predicate = json!({"age": {"gt": 30}});
    let response = app
        .oneshot(get_request(&format!(
            "/teachers/count?where={}",
            encode(&predicate)
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn update_all_teachers_without_where_touches_all() {
    let app = test_app().await;
    create(&app, json!({"name": "Ada"})).await;
    create(&app, json!({"name": "Grace"})).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/teachers",
            json!({"subject": "Computing"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"count": 2}));

    let predicate = json!({"subject": "Computing"});
    let response = app
        .oneshot(get_request(&format!(
            "/teachers/count?where={}",
            encode(&predicate)
        )))
        .await
        .unwrap();
    assert_eq!(json_body(response).await, json!({"count": 2}));
}

#[tokio::test(flavor = "multi_thread")]
async fn replace_missing_teacher_is_not_found() {
    let app = test_app().await;

    let response = app
        .oneshot(json_request("PUT", "/teachers/77", json!({"name": "Nobody"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn non_numeric_id_is_bad_request() {
    let app = test_app().await;

    let response = app.oneshot(get_request("/teachers/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn find_teacher_by_id_with_where_is_bad_request() {
    let app = test_app().await;
    let id = create(&app, json!({"name": "Ada", "subject": "Mathematics"})).await;

    let filter = json!({"where": {"subject": "History"}});
    let response = app
        .oneshot(get_request(&format!(
            "/teachers/{}?filter={}",
            id,
            encode(&filter)
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
