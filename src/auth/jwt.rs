use anyhow::Context;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, Identity, Role};
use crate::config::JwtConfig;

/// The only algorithm tokens may carry; anything else is rejected before
/// the signature is even looked at.
const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Signing and verification keys, built once from the immutable JWT config.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            ttl: Duration::seconds(cfg.ttl_minutes.saturating_mul(60)),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.whole_seconds()
    }

    pub fn issue(&self, user_id: i64, role: Role) -> anyhow::Result<String> {
        self.issue_at(user_id, role, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, user_id: i64, role: Role, now: OffsetDateTime) -> anyhow::Result<String> {
        let expires = now
            .checked_add(self.ttl)
            .context("token expiry is out of range")?;
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now.unix_timestamp(),
            exp: expires.unix_timestamp(),
            iss: self.issuer.clone(),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(user_id, %role, "jwt signed");
        Ok(token)
    }

    /// Checks structure, algorithm, signature and then expiry, in that order.
    /// No database lookup: the identity is exactly what was issued.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        let identity = Identity::try_from(data.claims)?;
        debug!(user_id = identity.user_id, role = %identity.role, "jwt verified");
        Ok(identity)
    }
}
