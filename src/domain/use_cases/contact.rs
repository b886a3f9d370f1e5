use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::{
    entities::{
        action::{ActionKind, ActionResponse},
        contact::{ContactFormRequest, ContactSubmission, SubmissionMeta},
    },
    mail::{Mailer, OutgoingEmail},
    recaptcha::CaptchaVerifier,
    repositories::contact::ContactRepository,
    settings::AppConfig,
    store::StoreTimestamp,
    utils::sanitize::escape_html,
};

const MAX_PER_EMAIL_PER_HOUR: usize = 3;
const MAX_PER_IP_PER_HOUR: usize = 5;

/// Addresses and names used on outgoing contact mail.
#[derive(Debug, Clone)]
pub struct ContactSettings {
    pub to_email: String,
    pub from_email: String,
    pub owner_name: String,
}

impl From<&AppConfig> for ContactSettings {
    fn from(config: &AppConfig) -> Self {
        ContactSettings {
            to_email: config.contact_to_email.clone(),
            from_email: config.contact_from_email.clone(),
            owner_name: config.owner_name.clone(),
        }
    }
}

pub struct ContactHandler<R>
where
    R: ContactRepository,
{
    pub contact_repo: R,
    mailer: Arc<dyn Mailer>,
    captcha: Arc<dyn CaptchaVerifier>,
    settings: ContactSettings,
}

impl<R> ContactHandler<R>
where
    R: ContactRepository,
{
    pub fn new(
        contact_repo: R,
        mailer: Arc<dyn Mailer>,
        captcha: Arc<dyn CaptchaVerifier>,
        settings: ContactSettings,
    ) -> Self {
        ContactHandler { contact_repo, mailer, captcha, settings }
    }

    /// Validates, screens and relays a contact form submission, then
    /// records it. Only the owner notification is required to succeed.
    #[instrument(skip(self, request, meta), fields(ip = ?meta.ip_address))]
    pub async fn submit(&self, request: ContactFormRequest, meta: SubmissionMeta) -> ActionResponse {
        let form = request.sanitized();
        if let Err(errors) = form.validate() {
            return ActionResponse::invalid(&errors);
        }

        if let Some(token) = &form.recaptcha_token {
            if !self.captcha.verify(token).await {
                return ActionResponse::fail(
                    ActionKind::Rejected,
                    "reCAPTCHA verification failed. Please try again.",
                );
            }
        }

        if !self.within_rate_limit(&form.email, meta.ip_address.as_deref()).await {
            return ActionResponse::fail(
                ActionKind::TooManyRequests,
                "Too many submissions. Please wait before submitting again.",
            );
        }

        if let Err(e) = self.mailer.send(notification_email(&form, &self.settings)).await {
            error!(error = %e, "Failed to send notification email");
            return ActionResponse::failed(
                "Failed to send your message. Please try again or contact me directly.",
            );
        }

        if let Err(e) = self.mailer.send(confirmation_email(&form, &self.settings)).await {
            warn!(error = %e, "Failed to send confirmation email");
        }

        let submission = ContactSubmission::new(form, meta, StoreTimestamp::now());
        match self.contact_repo.save_submission(&submission).await {
            Ok(id) => info!(id = %id, "Contact submission saved"),
            Err(e) => error!(error = %e, "Failed to save contact submission"),
        }

        ActionResponse::ok("Thanks for your message! I'll get back to you within 24 hours.")
    }

    /// At most 3 submissions per email and 5 per IP within the last hour.
    /// A failed count lets the submission through.
    async fn within_rate_limit(&self, email: &str, ip: Option<&str>) -> bool {
        let since = StoreTimestamp::from(Utc::now() - Duration::hours(1));

        match self.contact_repo.count_recent_by("email", email, since).await {
            Ok(count) if count >= MAX_PER_EMAIL_PER_HOUR => return false,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Rate limit check failed");
                return true;
            }
        }

        if let Some(ip) = ip {
            match self.contact_repo.count_recent_by("ipAddress", ip, since).await {
                Ok(count) if count >= MAX_PER_IP_PER_HOUR => return false,
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Rate limit check failed"),
            }
        }
        true
    }
}

fn optional_line(label: &str, value: Option<String>) -> (String, String) {
    match value {
        Some(value) => (
            format!("<p><strong>{label}:</strong> {}</p>", escape_html(&value)),
            format!("{label}: {value}\n"),
        ),
        None => (String::new(), String::new()),
    }
}

pub fn notification_email(form: &ContactFormRequest, settings: &ContactSettings) -> OutgoingEmail {
    let sent_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let (company_html, company_text) = optional_line("Company", form.company.clone());
    let (type_html, type_text) = optional_line("Project Type", form.project_type.map(|p| p.to_string()));
    let (budget_html, budget_text) = optional_line("Budget", form.budget.map(|b| b.to_string()));
    let (timeline_html, timeline_text) = optional_line("Timeline", form.timeline.map(|t| t.to_string()));

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>New Contact Form Submission</h2>
  <h3>Contact Information</h3>
  <p><strong>Name:</strong> {name}</p>
  <p><strong>Email:</strong> {email}</p>
  {company_html}
  <h3>Project Details</h3>
  <p><strong>Subject:</strong> {subject}</p>
  {type_html}{budget_html}{timeline_html}
  <h3>Message</h3>
  <p style="white-space: pre-wrap; line-height: 1.6;">{message}</p>
  <p>Sent from your portfolio contact form</p>
  <p>Time: {sent_at}</p>
</div>"#,
        name = escape_html(&form.name),
        email = escape_html(&form.email),
        subject = escape_html(&form.subject),
        message = escape_html(&form.message),
    );

    let text = format!(
        "New Contact Form Submission\n\nContact Information:\nName: {}\nEmail: {}\n{company_text}\nProject Details:\nSubject: {}\n{type_text}{budget_text}{timeline_text}\nMessage:\n{}\n\n---\nSent from your portfolio contact form\nTime: {sent_at}\n",
        form.name, form.email, form.subject, form.message,
    );

    OutgoingEmail {
        from: format!("Portfolio Contact <{}>", settings.from_email),
        to: vec![settings.to_email.clone()],
        reply_to: Some(form.email.clone()),
        subject: format!("New Contact: {}", form.subject),
        html,
        text: Some(text),
    }
}

pub fn confirmation_email(form: &ContactFormRequest, settings: &ContactSettings) -> OutgoingEmail {
    let owner = escape_html(&settings.owner_name);
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Thanks for reaching out, {name}!</h2>
  <p>I've received your message and will get back to you within 24 hours.</p>
  <h3>Your message:</h3>
  <p><strong>Subject:</strong> {subject}</p>
  <p style="white-space: pre-wrap; line-height: 1.6;">{message}</p>
  <p>Best regards,<br>{owner}</p>
  <p>This is an automated confirmation. Please don't reply to this email.</p>
</div>"#,
        name = escape_html(&form.name),
        subject = escape_html(&form.subject),
        message = escape_html(&form.message),
    );

    OutgoingEmail {
        from: format!("{} <{}>", settings.owner_name, settings.from_email),
        to: vec![form.email.clone()],
        reply_to: None,
        subject: "Thanks for reaching out!".to_string(),
        html,
        text: None,
    }
}
