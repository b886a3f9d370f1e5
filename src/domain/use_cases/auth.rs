use validator::Validate;

use crate::auth::password::verify_password;
use crate::entities::token::{AuthResponse, LoginRequest};
use crate::errors::AuthError;
use crate::repositories::token::TokenServiceRepository;

/// Credentials of the single site administrator.
#[derive(Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password_hash: String,
}

pub struct AuthHandler<T>
where
    T: TokenServiceRepository,
{
    pub token_service: T,
    admin: AdminCredentials,
}

impl<T> AuthHandler<T>
where
    T: TokenServiceRepository,
{
    pub fn new(token_service: T, admin: AdminCredentials) -> Self {
        AuthHandler { token_service, admin }
    }

    /// Checks the admin email and password and issues an access token.
    pub fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        if !request.email.eq_ignore_ascii_case(&self.admin.email) {
            tracing::warn!("Login attempt for unknown account");
            return Err(AuthError::WrongCredentials);
        }

        let is_password_valid = verify_password(&request.password, &self.admin.password_hash)
            .map_err(|e| {
                tracing::error!("Admin password hash could not be checked: {}", e);
                AuthError::WrongCredentials
            })?;
        if !is_password_valid {
            return Err(AuthError::WrongCredentials);
        }

        let access_token = self.token_service.create_admin_jwt(&self.admin.email)?;

        tracing::info!("Admin logged in successfully");
        Ok(AuthResponse::new(access_token, self.token_service.expires_in_secs()))
    }
}
