use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{json, Map, Value};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::config::JwtConfig;
use crate::state::AppState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid or expired token")]
    Invalid,
    #[error("token has no subject claim")]
    MissingSubject,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    default_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm: config.algorithm,
            default_ttl: Duration::from_secs(config.ttl_minutes.max(0) as u64 * 60),
        }
    }

    /// Signs the claims with `exp = now + ttl` merged in (config default when
    /// `ttl` is None). The rest of the map is embedded as-is.
    pub fn issue(
        &self,
        mut claims: Map<String, Value>,
        ttl: Option<Duration>,
    ) -> anyhow::Result<String> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let exp = OffsetDateTime::now_utc() + TimeDuration::seconds(ttl.as_secs() as i64);
        claims.insert("exp".into(), json!(exp.unix_timestamp()));
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!("jwt issued");
        Ok(token)
    }

    /// Checks signature and expiry, then extracts the subject claim. Pure:
    /// callers decide how to surface the failure.
    pub fn verify_subject(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        let data = decode::<Map<String, Value>>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?;
        data.claims
            .get("sub")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(TokenError::MissingSubject)
    }
}
