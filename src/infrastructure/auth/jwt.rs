use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, TokenData, Validation};

use crate::entities::token::Claims;
use crate::errors::AuthError;
use crate::settings::{AppConfig, JwtKeys};

const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    access_expiration: Duration,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: JwtKeys::from(config),
            access_expiration: Duration::minutes(config.jwt_expiration_minutes),
        }
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.access_expiration.num_seconds()
    }

    /// Issues an access token for the configured site admin.
    pub fn create_admin_jwt(&self, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = (now + self.access_expiration).timestamp() as usize;

        let claims = Claims {
            sub: "admin".to_string(),
            email: email.to_string(),
            admin: true,
            exp,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.encoding)
            .map_err(|_| AuthError::TokenCreation)
    }

    pub fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.keys.decoding, &validation).map_err(AuthError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AppEnvironment, LogFormat};

    fn config() -> AppConfig {
        AppConfig {
            env: AppEnvironment::Testing,
            name: "test".into(),
            port: 0,
            host: "127.0.0.1".into(),
            worker_count: 1,
            database_url: None,
            cors_allowed_origins: vec!["*".into()],
            jwt_secret: "a-very-long-secret-used-only-in-unit-tests".into(),
            jwt_expiration_minutes: 5,
            admin_email: "admin@example.com".into(),
            admin_password_hash: String::new(),
            revalidation_secret: None,
            revalidate_peers: vec![],
            resend_api_key: None,
            contact_to_email: "owner@example.com".into(),
            contact_from_email: "site@example.com".into(),
            owner_name: "Owner".into(),
            recaptcha_secret: None,
            list_cache_ttl_secs: 60,
            detail_cache_ttl_secs: 300,
            cache_sweep_interval_secs: 60,
            log_format: LogFormat::Pretty,
            trust_x_forwarded_for: false,
        }
    }

    #[test]
    fn issued_tokens_decode_with_admin_claim() {
        let service = JwtService::new(&config());
        let token = service.create_admin_jwt("admin@example.com").unwrap();

        let claims = service.decode_jwt(&token).unwrap().claims;
        assert!(claims.admin);
        assert_eq!(claims.email, "admin@example.com");
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let service = JwtService::new(&config());
        let mut other = config();
        other.jwt_secret = "another-secret-that-is-also-long-enough".into();
        let token = JwtService::new(&other).create_admin_jwt("admin@example.com").unwrap();

        assert!(matches!(service.decode_jwt(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn expired_tokens_are_reported_as_expired() {
        let mut cfg = config();
        cfg.jwt_expiration_minutes = -10;
        let service = JwtService::new(&cfg);
        let token = service.create_admin_jwt("admin@example.com").unwrap();

        assert!(matches!(service.decode_jwt(&token), Err(AuthError::TokenExpired)));
    }
}
