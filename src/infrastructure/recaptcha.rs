use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, warn};

const SITEVERIFY_ENDPOINT: &str = "https://www.google.com/recaptcha/api/siteverify";
const MIN_SCORE: f64 = 0.5;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Whether the token proves a human. Transport failures count as `false`.
    async fn verify(&self, token: &str) -> bool;
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default)]
    score: f64,
}

pub struct RecaptchaVerifier {
    client: Client,
    secret: Option<String>,
}

impl RecaptchaVerifier {
    pub fn new(client: Client, secret: Option<String>) -> Self {
        RecaptchaVerifier { client, secret }
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str) -> bool {
        let Some(secret) = self.secret.as_deref() else {
            warn!("reCAPTCHA secret key not configured");
            return true;
        };

        let response = self
            .client
            .post(SITEVERIFY_ENDPOINT)
            .form(&[("secret", secret), ("response", token)])
            .send()
            .await;

        match response {
            Ok(res) => match res.json::<SiteverifyResponse>().await {
                Ok(body) => body.success && body.score > MIN_SCORE,
                Err(e) => {
                    error!("reCAPTCHA response unreadable: {}", e);
                    false
                }
            },
            Err(e) => {
                error!("reCAPTCHA verification failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_secret_lets_submissions_through() {
        let verifier = RecaptchaVerifier::new(Client::new(), None);
        assert!(verifier.verify("anything").await);
    }

    #[test]
    fn score_defaults_to_zero() {
        let body: SiteverifyResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(body.success);
        assert_eq!(body.score, 0.0);
    }
}
