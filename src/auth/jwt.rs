use anyhow::Context;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{auth::claims::Claims, config::JwtConfig, error::AuthError};

/// HS256 signing and verification keys derived from the process secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_minutes: Option<i64>,
}

/// `now + minutes`, or `None` when the result leaves the representable range.
fn expires_at(now: OffsetDateTime, minutes: i64) -> Option<OffsetDateTime> {
    minutes
        .checked_mul(60)
        .map(TimeDuration::seconds)
        .and_then(|ttl| now.checked_add(ttl))
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl_minutes: cfg.ttl_minutes,
        }
    }

    pub fn issue(&self, user_id: i64) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = match self.ttl_minutes {
            Some(minutes) => Some(
                expires_at(now, minutes)
                    .context("token lifetime out of range")?
                    .unix_timestamp() as usize,
            ),
            None => None,
        };
        let claims = Claims {
            id: user_id,
            iat: now.unix_timestamp() as usize,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id, expires = exp.is_some(), "jwt signed");
        Ok(token)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is checked whenever present, but only demanded when tokens are minted with one.
        validation.required_spec_claims.clear();
        if self.ttl_minutes.is_some() {
            validation.required_spec_claims.insert("exp".to_owned());
        }
        validation
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation()).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            AuthError::InvalidToken
        })?;
        debug!(user_id = data.claims.id, "jwt verified");
        Ok(data.claims)
    }

    /// Reads claims without checking the signature. Only for tokens already
    /// passed through [`JwtKeys::verify`].
    pub fn decode(token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}
