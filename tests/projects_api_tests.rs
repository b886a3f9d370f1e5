mod test_utils;

use reqwest::Method;
use serde_json::{json, Value};
use test_utils::*;

fn titles(list: &Value) -> Vec<String> {
    list.as_array()
        .expect("array body")
        .iter()
        .map(|p| p["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[actix_rt::test]
async fn created_project_is_listed_and_reachable_by_slug() {
    let app = TestApp::spawn().await;

    let id = app
        .create("/api/v1/admin/projects", project_body("Portfolio Site", "Web", &["React", "Rust"]))
        .await;

    let list = app.get_json("/api/v1/projects").await;
    assert_eq!(titles(&list), vec!["Portfolio Site"]);
    assert_eq!(list[0]["id"], id.as_str());
    assert_eq!(list[0]["slug"], "portfolio-site");

    let project = app.get_json("/api/v1/projects/portfolio-site").await;
    assert_eq!(project["category"], "Web");
    assert!(project["createdAt"].as_str().is_some_and(|ts| ts.ends_with('Z')));

    let slugs = app.get_json("/api/v1/projects/slugs").await;
    assert_eq!(slugs, json!(["portfolio-site"]));
}

#[actix_rt::test]
async fn unknown_slug_is_404() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/v1/projects/does-not-exist").await;
    assert_eq!(response.status(), 404);
}

#[actix_rt::test]
async fn drafts_stay_hidden_from_public_lists() {
    let app = TestApp::spawn().await;

    let mut draft = project_body("Secret Draft", "Web", &["Rust"]);
    draft["published"] = json!(false);
    app.create("/api/v1/admin/projects", draft).await;

    assert_eq!(app.get_json("/api/v1/projects").await, json!([]));
    assert_eq!(app.get("/api/v1/projects/secret-draft").await.status(), 404);

    let (status, admin_list) = app.admin(Method::GET, "/api/v1/admin/projects", None).await;
    assert_eq!(status, 200);
    assert_eq!(titles(&admin_list), vec!["Secret Draft"]);
}

#[actix_rt::test]
async fn category_filter_treats_all_as_no_filter() {
    let app = TestApp::spawn().await;
    app.create("/api/v1/admin/projects", project_body("Web App", "Web", &["React"])).await;
    app.create("/api/v1/admin/projects", project_body("Ml Model", "AI", &["Python"])).await;

    let ai = app.get_json("/api/v1/projects?category=AI").await;
    assert_eq!(titles(&ai), vec!["Ml Model"]);

    let all = app.get_json("/api/v1/projects?category=All").await;
    assert_eq!(all.as_array().map(Vec::len), Some(2));
}

#[actix_rt::test]
async fn toggling_publication_refreshes_cached_lists() {
    let app = TestApp::spawn().await;
    let id = app
        .create("/api/v1/admin/projects", project_body("Cached One", "Web", &["Rust"]))
        .await;

    // Prime the cache.
    assert_eq!(titles(&app.get_json("/api/v1/projects").await), vec!["Cached One"]);

    let (status, body) = app
        .admin(Method::POST, &format!("/api/v1/admin/projects/{id}/toggle-published"), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Project status updated successfully!");

    assert_eq!(app.get_json("/api/v1/projects").await, json!([]));
}

#[actix_rt::test]
async fn featured_projects_follow_the_featured_flag() {
    let app = TestApp::spawn().await;
    let id = app
        .create("/api/v1/admin/projects", project_body("Star Project", "Web", &["Rust"]))
        .await;

    assert_eq!(app.get_json("/api/v1/projects/featured").await, json!([]));

    let (status, _) = app
        .admin(Method::POST, &format!("/api/v1/admin/projects/{id}/toggle-featured"), None)
        .await;
    assert_eq!(status, 200);

    assert_eq!(titles(&app.get_json("/api/v1/projects/featured").await), vec!["Star Project"]);
}

#[actix_rt::test]
async fn related_projects_rank_by_shared_technologies() {
    let app = TestApp::spawn().await;
    app.create("/api/v1/admin/projects", project_body("Reference", "Web", &["React", "Next.js", "AI"])).await;
    app.create("/api/v1/admin/projects", project_body("One Shared", "Web", &["React", "Vue"])).await;
    app.create("/api/v1/admin/projects", project_body("Two Shared", "Web", &["React", "Next.js"])).await;
    app.create("/api/v1/admin/projects", project_body("None Shared", "Web", &["Go"])).await;

    let related = app.get_json("/api/v1/projects/reference/related?limit=3").await;
    let names = titles(&related);

    assert_eq!(names.len(), 3);
    assert_eq!(names[0], "Two Shared");
    assert_eq!(names[1], "One Shared");
    assert!(!names.contains(&"Reference".to_string()));
}

#[actix_rt::test]
async fn invalid_project_returns_field_errors() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/admin/projects",
            Some(json!({
                "title": "X",
                "description": "short",
                "excerpt": "short",
                "category": "",
                "technologies": [],
                "featuredImage": "not a url"
            })),
        )
        .await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(body["errors"]["title"].is_array());
    assert!(body["errors"]["technologies"].is_array());
}

#[actix_rt::test]
async fn updating_a_missing_project_is_404() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .admin(Method::PATCH, "/api/v1/admin/projects/missing", Some(json!({ "title": "New Title" })))
        .await;

    assert_eq!(status, 404);
    assert_eq!(body["message"], "Project not found.");
}

#[actix_rt::test]
async fn deleted_project_disappears() {
    let app = TestApp::spawn().await;
    let id = app
        .create("/api/v1/admin/projects", project_body("Short Lived", "Web", &["Rust"]))
        .await;
    assert_eq!(app.get_json("/api/v1/projects").await.as_array().map(Vec::len), Some(1));

    let (status, _) = app.admin(Method::DELETE, &format!("/api/v1/admin/projects/{id}"), None).await;
    assert_eq!(status, 200);

    assert_eq!(app.get_json("/api/v1/projects").await, json!([]));
    let (status, _) = app.admin(Method::GET, &format!("/api/v1/admin/projects/{id}"), None).await;
    assert_eq!(status, 404);
}
