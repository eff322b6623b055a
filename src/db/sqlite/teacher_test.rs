//! Tests for the SQLite teacher repository.

use serde_json::json;

use crate::db::{CrudRepository, Database, DbError, Filter, Patch, SqliteDatabase, Teacher, Where};

async fn setup_db() -> SqliteDatabase {
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create in-memory database");
    db.migrate().await.expect("Migration should succeed");
    db
}

fn make_teacher(name: &str, subject: &str) -> Teacher {
    Teacher {
        id: None,
        name: Some(name.to_string()),
        email: Some(format!("{}@school.test", name.to_lowercase())),
        subject: Some(subject.to_string()),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn teacher_create_assigns_id() {
    let db = setup_db().await;
    let teachers = db.teachers();

    let first = teachers
        .create(&make_teacher("Ada", "Mathematics"))
        .await
        .expect("Create should succeed");
    let second = teachers
        .create(&make_teacher("Grace", "Computing"))
        .await
        .expect("Create should succeed");

    let first_id = first.id.expect("id assigned");
    let second_id = second.id.expect("id assigned");
    assert_ne!(first_id, second_id);

    let retrieved = teachers.find_by_id(first_id, None).await.unwrap();
    assert_eq!(retrieved.name.as_deref(), Some("Ada"));
    assert_eq!(retrieved.email.as_deref(), Some("ada@school.test"));
    assert_eq!(retrieved.subject.as_deref(), Some("Mathematics"));
}

#[tokio::test(flavor = "multi_thread")]
async fn teacher_create_with_explicit_id() {
    let db = setup_db().await;
    let teachers = db.teachers();

    let mut teacher = make_teacher("Ada", "Mathematics");
    teacher.id = Some(100);
    let created = teachers.create(&teacher).await.unwrap();
    assert_eq!(created.id, Some(100));

    let duplicate = teachers.create(&teacher).await;
    assert!(matches!(duplicate, Err(DbError::AlreadyExists { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn teacher_get_nonexistent_is_not_found() {
    let db = setup_db().await;
    let result = db.teachers().find_by_id(12345, None).await;

    match result {
        Err(DbError::NotFound { entity_type, id }) => {
            assert_eq!(entity_type, "Teacher");
            assert_eq!(id, "12345");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn teacher_patch_then_replace() {
    let db = setup_db().await;
    let teachers = db.teachers();
    let id = teachers
        .create(&make_teacher("Ada", "Mathematics"))
        .await
        .unwrap()
        .id
        .unwrap();

    let patch = Patch::<Teacher>::from_json(
        json!({"subject": "Logic"}).as_object().cloned().unwrap(),
    )
    .unwrap();
    teachers.update_by_id(id, &patch).await.unwrap();

    let patched = teachers.find_by_id(id, None).await.unwrap();
    assert_eq!(patched.name.as_deref(), Some("Ada"));
    assert_eq!(patched.subject.as_deref(), Some("Logic"));

    teachers
        .replace_by_id(
            id,
            &Teacher {
                id: Some(id),
                name: Some("Ada Lovelace".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let replaced = teachers.find_by_id(id, None).await.unwrap();
    assert_eq!(replaced.name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(replaced.email, None);
    assert_eq!(replaced.subject, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn teacher_find_by_subject_and_count() {
    let db = setup_db().await;
    let teachers = db.teachers();
    teachers.create(&make_teacher("Ada", "Mathematics")).await.unwrap();
    teachers.create(&make_teacher("Grace", "Computing")).await.unwrap();
    teachers.create(&make_teacher("Emmy", "Mathematics")).await.unwrap();

    let maths = Where::from(json!({"subject": "Mathematics"}));
    let found = teachers
        .find(Some(&Filter::default().with_where(maths.clone()).with_order("name")))
        .await
        .unwrap();
    let names: Vec<_> = found.iter().filter_map(|t| t.name.as_deref()).collect();
    assert_eq!(names, vec!["Ada", "Emmy"]);

    assert_eq!(teachers.count(Some(&maths)).await.unwrap().count, 2);
    assert_eq!(teachers.count(None).await.unwrap().count, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn teacher_ilike_is_case_insensitive() {
    let db = setup_db().await;
    let teachers = db.teachers();
    teachers.create(&make_teacher("Ada", "Mathematics")).await.unwrap();

    let filter = Filter::default().with_where(Where::from(json!({"name": {"ilike": "ADA"}})));
    assert_eq!(teachers.find(Some(&filter)).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn teacher_delete_removes_only_target() {
    let db = setup_db().await;
    let teachers = db.teachers();
    let ada = teachers.create(&make_teacher("Ada", "Mathematics")).await.unwrap();
    teachers.create(&make_teacher("Grace", "Computing")).await.unwrap();

    teachers.delete_by_id(ada.id.unwrap()).await.unwrap();

    let remaining = teachers.find(None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name.as_deref(), Some("Grace"));
}
