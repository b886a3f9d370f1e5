use actix_web::{
    error::{InternalError, JsonPayloadError, QueryPayloadError},
    web, HttpResponse,
};

use crate::entities::action::{ActionKind, ActionResponse};

/// Malformed bodies and query strings answer with an `ActionResponse`
/// instead of actix's plain-text error.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = json_message(&err);
        InternalError::from_response(err, rejected(message)).into()
    }));

    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let message = query_message(&err);
        InternalError::from_response(err, rejected(message)).into()
    }));
}

fn json_message(err: &JsonPayloadError) -> String {
    match err {
        JsonPayloadError::ContentType => "Expected an application/json body".to_string(),
        other => format!("JSON payload error: {other}"),
    }
}

fn query_message(err: &QueryPayloadError) -> String {
    format!("Query string error: {err}")
}

fn rejected(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ActionResponse::fail(ActionKind::Invalid, message))
}
