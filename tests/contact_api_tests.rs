mod test_utils;

use serde_json::{json, Value};
use test_utils::*;

fn contact_form(email: &str) -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": email,
        "subject": "Project inquiry",
        "message": "I would like to talk about a new project.",
        "budget": "$5k-$15k",
        "timeline": "1-3 months"
    })
}

#[actix_rt::test]
async fn valid_submission_sends_notification_and_confirmation() {
    let app = TestApp::spawn().await;

    let response = app.post_json("/api/v1/contact", &contact_form("ada@example.com")).await;
    assert_eq!(response.status(), 200);

    let body: ActionResponseBody = response.json().await.expect("action body");
    assert!(body.success);
    assert_eq!(body.message, "Thanks for your message! I'll get back to you within 24 hours.");

    let sent = app.mailer.sent.lock();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, vec!["owner@example.com".to_string()]);
    assert_eq!(sent[0].reply_to.as_deref(), Some("ada@example.com"));
    assert_eq!(sent[1].to, vec!["ada@example.com".to_string()]);
}

#[actix_rt::test]
async fn invalid_submission_lists_field_errors() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/v1/contact",
            &json!({ "name": "A", "email": "nope", "subject": "Hi", "message": "short" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let body: ActionResponseBody = response.json().await.expect("action body");
    assert!(!body.success);
    let errors = body.errors.expect("field errors");
    for field in ["name", "email", "subject", "message"] {
        assert!(errors[field].is_array(), "missing error for {field}");
    }
    assert!(app.mailer.sent.lock().is_empty());
}

#[actix_rt::test]
async fn fourth_submission_from_one_email_within_an_hour_is_throttled() {
    let app = TestApp::spawn().await;

    for _ in 0..3 {
        let response = app.post_json("/api/v1/contact", &contact_form("busy@example.com")).await;
        assert_eq!(response.status(), 200);
    }

    let response = app.post_json("/api/v1/contact", &contact_form("busy@example.com")).await;
    assert_eq!(response.status(), 429);

    let body: ActionResponseBody = response.json().await.expect("action body");
    assert_eq!(body.message, "Too many submissions. Please wait before submitting again.");
}
