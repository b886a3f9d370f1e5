use actix_web::{get, HttpResponse, Responder};

use crate::constants::OWNER_NAME;

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Welcome to the portfolio content API!",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "author": OWNER_NAME,
        "endpoints": ["/api/v1/projects", "/api/v1/blog/posts", "/api/v1/contact", "/health"]
    }))
}
