mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn another_users_records_look_absent() {
    let app = TestApp::new();
    let (_, alice) = app.register("alice@x.com").await;
    let (_, bob) = app.register("bob@x.com").await;

    for (kind, body) in [
        ("tasks", json!({ "title": "t" })),
        ("notes", json!({ "title": "n", "content": "c" })),
        ("goals", json!({ "title": "g" })),
        ("routines", json!({ "title": "r" })),
    ] {
        let (status, record) = app.post(&format!("/api/{}", kind), &alice, body).await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/{}/{}", kind, record["id"].as_str().unwrap());

        let (status, _) = app.get(&uri, &bob).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{kind} get");
        let (status, _) = app.put(&uri, &bob, json!({ "title": "mine now" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{kind} update");
        let (status, _) = app.delete(&uri, &bob).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{kind} delete");

        let (_, list) = app.get(&format!("/api/{}", kind), &bob).await;
        assert_eq!(list, json!([]), "{kind} list");

        let (status, still) = app.get(&uri, &alice).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(still, record);
    }
}

#[tokio::test]
async fn toggling_someone_elses_routine_is_not_found() {
    let app = TestApp::new();
    let (_, alice) = app.register("alice@x.com").await;
    let (_, bob) = app.register("bob@x.com").await;

    let (_, routine) = app.post("/api/routines", &alice, json!({ "title": "r" })).await;
    let uri = format!("/api/routines/{}/toggle/2024-01-01", routine["id"].as_str().unwrap());

    let (status, body) = app.request(Method::POST, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Routine not found");

    let (_, unchanged) = app
        .get(&format!("/api/routines/{}", routine["id"].as_str().unwrap()), &alice)
        .await;
    assert_eq!(unchanged["completions"], json!({}));
}

#[tokio::test]
async fn unparseable_and_unknown_ids_are_not_found() {
    let app = TestApp::new();
    let (_, token) = app.register("a@x.com").await;

    let (status, body) = app.get("/api/tasks/not-a-uuid", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = app
        .get("/api/tasks/00000000-0000-0000-0000-000000000000", &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
