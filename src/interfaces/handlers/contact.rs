use actix_web::{web, HttpRequest, Responder};
use tracing::instrument;

use crate::{
    entities::contact::{ContactFormRequest, SubmissionMeta},
    utils::get_client_ip::{get_client_ip, get_user_agent},
    AppState,
};

#[instrument(skip(req, state, form))]
pub async fn submit_contact_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<ContactFormRequest>,
) -> impl Responder {
    let meta = SubmissionMeta {
        ip_address: get_client_ip(&req, state.trust_x_forwarded_for),
        user_agent: get_user_agent(&req),
    };

    state.contact_handler.submit(form.into_inner(), meta).await
}
