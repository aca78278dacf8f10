use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::integration;
use crate::user;

use super::TokenClaims;

#[derive(Clone)]
pub struct AuthService {
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl AuthService {
    pub fn new(config: &integration::JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&config.audience]);

        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(config.secret.as_bytes())),
            validation: Arc::new(validation),
        }
    }
}

impl AuthService {
    /// Validates the bearer token and resolves the caller identity.
    pub fn validate(&self, token: &str) -> super::Result<user::Sub> {
        let data =
            jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims.sub)
    }
}
