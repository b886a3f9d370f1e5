use actix_web::{http::StatusCode, web, HttpResponse};
use tracing::error;

use crate::{
    errors::AppError,
    handlers::json_error::json_error,
    use_cases::revalidation::RevalidateRequest,
    AppState,
};

async fn run(state: &AppState, request: RevalidateRequest) -> HttpResponse {
    match state.revalidation_handler.revalidate(&request).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(AppError::UnauthorizedAccess) => HttpResponse::Unauthorized().json(serde_json::json!({
            "message": "Invalid secret"
        })),
        Err(e) => {
            error!(error = %e, "Revalidation error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error revalidating", &e.to_string())
        }
    }
}

pub async fn revalidate(state: web::Data<AppState>, body: web::Json<RevalidateRequest>) -> HttpResponse {
    run(&state, body.into_inner()).await
}

/// Manual trigger: `?path=` / `?tag=` (and `?secret=` when configured).
pub async fn revalidate_get(state: web::Data<AppState>, query: web::Query<RevalidateRequest>) -> HttpResponse {
    run(&state, query.into_inner()).await
}
