use jsonwebtoken::TokenData;

use crate::{auth::jwt::JwtService, entities::token::Claims, errors::AuthError};

pub trait TokenServiceRepository: Send + Sync {
    /// Issues an admin access token for `email`.
    fn create_admin_jwt(&self, email: &str) -> Result<String, AuthError>;

    /// Decodes and validates an access token.
    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError>;

    /// Lifetime of issued tokens, in seconds.
    fn expires_in_secs(&self) -> i64;
}

impl TokenServiceRepository for JwtService {
    fn create_admin_jwt(&self, email: &str) -> Result<String, AuthError> {
        JwtService::create_admin_jwt(self, email)
    }

    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        JwtService::decode_jwt(self, token)
    }

    fn expires_in_secs(&self) -> i64 {
        JwtService::expires_in_secs(self)
    }
}
