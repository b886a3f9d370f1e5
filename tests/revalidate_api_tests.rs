mod test_utils;

use portfolio_content::{
    constants::collections,
    entities::project::NewProjectRequest,
    store::{to_document, DocumentStore, StoreTimestamp},
};
use serde_json::{json, Value};
use test_utils::*;

/// Writes straight to the store, bypassing cache invalidation.
async fn insert_behind_the_cache(app: &TestApp, title: &str) {
    let request: NewProjectRequest =
        serde_json::from_value(project_body(title, "Web", &["Rust"])).expect("valid project body");
    let data = to_document(&request.into_insert(StoreTimestamp::now())).expect("serializable insert");
    app.state.store.insert(collections::PROJECTS, data).await.expect("insert succeeds");
}

fn count(list: &Value) -> usize {
    list.as_array().map(Vec::len).unwrap_or_default()
}

#[actix_rt::test]
async fn wrong_secret_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/api/revalidate", &json!({ "path": "/projects", "secret": "guess" }))
        .await;
    assert_eq!(response.status(), 401);

    let response = app.get("/api/revalidate?tag=projects").await;
    assert_eq!(response.status(), 401);
}

#[actix_rt::test]
async fn revalidating_a_path_drops_stale_lists() {
    let app = TestApp::spawn().await;
    assert_eq!(count(&app.get_json("/api/v1/projects").await), 0);

    insert_behind_the_cache(&app, "Sneaky Project").await;
    assert_eq!(count(&app.get_json("/api/v1/projects").await), 0, "list is still cached");

    let response = app
        .post_json("/api/revalidate", &json!({ "path": "/projects", "secret": REVALIDATION_SECRET }))
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["revalidated"], true);
    assert!(body["now"].as_i64().is_some());

    assert_eq!(count(&app.get_json("/api/v1/projects").await), 1);
}

#[actix_rt::test]
async fn get_trigger_without_target_refreshes_projects() {
    let app = TestApp::spawn().await;
    assert_eq!(count(&app.get_json("/api/v1/projects").await), 0);
    insert_behind_the_cache(&app, "Another Project").await;

    let body = app.get_json(&format!("/api/revalidate?secret={REVALIDATION_SECRET}")).await;
    assert_eq!(body["message"], "Revalidated all project pages");

    assert_eq!(count(&app.get_json("/api/v1/projects").await), 1);
}

#[actix_rt::test]
async fn open_endpoint_when_no_secret_is_configured() {
    let mut config = test_config();
    config.revalidation_secret = None;
    let app = TestApp::spawn_with(config).await;

    let response = app.post_json("/api/revalidate", &json!({ "tag": "blog" })).await;
    assert_eq!(response.status(), 200);
}
