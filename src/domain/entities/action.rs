use std::collections::BTreeMap;

use serde::Serialize;
use validator::ValidationErrors;

use crate::entities::validation::field_messages;

pub const CHECK_FORM_DATA: &str = "Please check your form data and try again.";

/// What went wrong with a failed action, used to pick the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionKind {
    #[default]
    Done,
    Created,
    Invalid,
    NotFound,
    Rejected,
    TooManyRequests,
    Failed,
}

/// Outcome of an admin mutation or a contact submission. Errors are
/// reported in `message`/`errors`, never as raw server errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip)]
    pub kind: ActionKind,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        ActionResponse {
            success: true,
            message: message.into(),
            errors: None,
            id: None,
            kind: ActionKind::Done,
        }
    }

    pub fn created(message: impl Into<String>, id: String) -> Self {
        ActionResponse {
            id: Some(id),
            kind: ActionKind::Created,
            ..Self::ok(message)
        }
    }

    pub fn fail(kind: ActionKind, message: impl Into<String>) -> Self {
        ActionResponse {
            success: false,
            message: message.into(),
            errors: None,
            id: None,
            kind,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::fail(ActionKind::Failed, message)
    }

    pub fn invalid(errors: &ValidationErrors) -> Self {
        ActionResponse {
            errors: Some(field_messages(errors)),
            ..Self::fail(ActionKind::Invalid, CHECK_FORM_DATA)
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::fail(ActionKind::NotFound, message)
    }
}
