use actix_web::{body::BoxBody, http::StatusCode, HttpRequest, HttpResponse, Responder};

use crate::entities::action::{ActionKind, ActionResponse};

impl ActionKind {
    pub fn status(self) -> StatusCode {
        match self {
            ActionKind::Done => StatusCode::OK,
            ActionKind::Created => StatusCode::CREATED,
            ActionKind::Invalid => StatusCode::BAD_REQUEST,
            ActionKind::NotFound => StatusCode::NOT_FOUND,
            ActionKind::Rejected => StatusCode::FORBIDDEN,
            ActionKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ActionKind::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Responder for ActionResponse {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::build(self.kind.status()).json(self)
    }
}
