use actix_web::{post, web, HttpResponse, Responder};

use crate::entities::token::LoginRequest;
use crate::errors::AuthError;
use crate::AppState;

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    credentials: web::Json<LoginRequest>,
) -> Result<impl Responder, AuthError> {
    let auth_response = state.auth_handler.login(credentials.into_inner())?;
    Ok(HttpResponse::Ok().json(auth_response))
}
