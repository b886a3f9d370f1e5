use actix_web::{http::StatusCode, HttpResponse};

/// `{message, error}` body used by the revalidation endpoints.
pub fn json_error(status: StatusCode, message: &str, error: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "message": message,
        "error": error
    }))
}
