use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::infrastructure::{store::StoreTimestamp, utils::sanitize::sanitize_input};

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s\-'.]+$").expect("name pattern is valid"));

pub const SUBMISSION_SOURCE: &str = "portfolio_contact_form";
pub const STATUS_UNREAD: &str = "unread";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum Budget {
    #[serde(rename = "<$5k")]
    #[display("<$5k")]
    Under5k,
    #[serde(rename = "$5k-$15k")]
    #[display("$5k-$15k")]
    From5kTo15k,
    #[serde(rename = "$15k-$50k")]
    #[display("$15k-$50k")]
    From15kTo50k,
    #[serde(rename = "$50k+")]
    #[display("$50k+")]
    Over50k,
    #[serde(rename = "Not sure")]
    #[display("Not sure")]
    NotSure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum Timeline {
    #[serde(rename = "ASAP")]
    #[display("ASAP")]
    Asap,
    #[serde(rename = "1-3 months")]
    #[display("1-3 months")]
    OneToThreeMonths,
    #[serde(rename = "3-6 months")]
    #[display("3-6 months")]
    ThreeToSixMonths,
    #[serde(rename = "6+ months")]
    #[display("6+ months")]
    OverSixMonths,
    #[serde(rename = "Just exploring")]
    #[display("Just exploring")]
    JustExploring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum ProjectType {
    #[serde(rename = "Web Application")]
    #[display("Web Application")]
    WebApplication,
    #[serde(rename = "Mobile App")]
    #[display("Mobile App")]
    MobileApp,
    #[serde(rename = "AI/ML Project")]
    #[display("AI/ML Project")]
    AiMl,
    #[serde(rename = "API Development")]
    #[display("API Development")]
    ApiDevelopment,
    #[serde(rename = "Consulting")]
    #[display("Consulting")]
    Consulting,
    #[serde(rename = "Other")]
    #[display("Other")]
    Other,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormRequest {
    #[validate(
        length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"),
        regex(path = *NAME_PATTERN, message = "Name contains invalid characters")
    )]
    pub name: String,

    #[validate(
        email(message = "Please enter a valid email address"),
        length(max = 255, message = "Email must be less than 255 characters")
    )]
    pub email: String,

    #[validate(length(max = 100, message = "Company name must be less than 100 characters"))]
    pub company: Option<String>,

    #[validate(length(min = 5, max = 200, message = "Subject must be between 5 and 200 characters"))]
    pub subject: String,

    #[validate(length(min = 10, max = 5000, message = "Message must be between 10 and 5000 characters"))]
    pub message: String,

    pub budget: Option<Budget>,

    pub timeline: Option<Timeline>,

    pub project_type: Option<ProjectType>,

    pub recaptcha_token: Option<String>,
}

impl ContactFormRequest {
    /// Strips markup from every free-text field before validation.
    pub fn sanitized(self) -> Self {
        ContactFormRequest {
            name: sanitize_input(&self.name),
            email: sanitize_input(&self.email),
            company: self
                .company
                .map(|c| sanitize_input(&c))
                .filter(|c| !c.is_empty()),
            subject: sanitize_input(&self.subject),
            message: sanitize_input(&self.message),
            recaptcha_token: self.recaptcha_token.filter(|t| !t.is_empty()),
            ..self
        }
    }
}

/// Request metadata recorded with each submission.
#[derive(Debug, Clone, Default)]
pub struct SubmissionMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Stored shape of a contact form submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub subject: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Timeline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub source: &'static str,
    pub status: &'static str,
    pub created_at: StoreTimestamp,
}

impl ContactSubmission {
    pub fn new(form: ContactFormRequest, meta: SubmissionMeta, now: StoreTimestamp) -> Self {
        ContactSubmission {
            name: form.name,
            email: form.email,
            company: form.company,
            subject: form.subject,
            message: form.message,
            budget: form.budget,
            timeline: form.timeline,
            project_type: form.project_type,
            ip_address: meta.ip_address,
            user_agent: meta.user_agent,
            source: SUBMISSION_SOURCE,
            status: STATUS_UNREAD,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: serde_json::Value) -> ContactFormRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_a_complete_form_with_enum_labels() {
        let request = form(json!({
            "name": "Ada O'Neil",
            "email": "ada@example.com",
            "subject": "New project",
            "message": "I would like to build an API.",
            "budget": "$5k-$15k",
            "timeline": "1-3 months",
            "projectType": "AI/ML Project"
        }));

        assert!(request.validate().is_ok());
        assert_eq!(request.budget, Some(Budget::From5kTo15k));
        assert_eq!(request.project_type.map(|p| p.to_string()).as_deref(), Some("AI/ML Project"));
    }

    #[test]
    fn unknown_budget_label_is_rejected_at_parse_time() {
        let parsed = serde_json::from_value::<ContactFormRequest>(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "subject": "Hello there",
            "message": "Long enough message",
            "budget": "a lot"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn rejects_digits_in_name_and_short_message() {
        let request = form(json!({
            "name": "R2D2",
            "email": "droid@example.com",
            "subject": "Beep boop",
            "message": "short"
        }));

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("message"));
    }

    #[test]
    fn sanitizing_strips_markup_and_blank_company() {
        let request = form(json!({
            "name": "  Ada  ",
            "email": "ada@example.com",
            "company": "   ",
            "subject": "<b>Hello</b> there",
            "message": "<script>alert(1)</script>Please get in touch"
        }))
        .sanitized();

        assert_eq!(request.name, "Ada");
        assert_eq!(request.subject, "Hello there");
        assert_eq!(request.message, "Please get in touch");
        assert!(request.company.is_none());
    }

    #[test]
    fn submission_is_stored_unread_with_source() {
        let request = form(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "subject": "Hello there",
            "message": "Long enough message"
        }));
        let submission = ContactSubmission::new(
            request,
            SubmissionMeta { ip_address: Some("10.0.0.1".into()), user_agent: None },
            StoreTimestamp { seconds: 10, nanos: 0 },
        );
        let doc = serde_json::to_value(&submission).unwrap();

        assert_eq!(doc["status"], "unread");
        assert_eq!(doc["source"], "portfolio_contact_form");
        assert_eq!(doc["ipAddress"], "10.0.0.1");
        assert_eq!(doc["createdAt"]["_seconds"], 10);
        assert!(doc.get("userAgent").is_none());
    }
}
