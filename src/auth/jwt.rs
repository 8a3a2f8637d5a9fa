use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::state::AppState;

/// JWT payload: the subject is the username, expiry is issue time plus the
/// configured lifetime. Tokens are stateless; nothing is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Why a token was rejected. Callers collapse all of these into a single
/// generic 401; the distinction exists for logging and tests only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

/// Signing and verification keys derived from the process-wide secret.
/// Built per request via `FromRef<AppState>`, same key material each time.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let jwt = &state.config.jwt;
        Self::new(&jwt.secret, Duration::minutes(jwt.ttl_minutes))
    }
}

impl JwtKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn sign(&self, subject: &str) -> anyhow::Result<String> {
        self.sign_at(subject, OffsetDateTime::now_utc())
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Issues a token as of `now`; split out so expiry is testable without
    /// a wall clock.
    pub fn sign_at(&self, subject: &str, now: OffsetDateTime) -> anyhow::Result<String> {
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: (now + self.ttl).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(subject = %subject, "jwt signed");
        Ok(token)
    }

    /// Verifies signature and shape, then checks expiry against `now`.
    ///
    /// The library's own exp validation is disabled because it only knows
    /// the wall clock; the manual comparison keeps the Expired case exact
    /// (valid strictly before the embedded expiry).
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            }
        })?;

        if now.unix_timestamp() >= data.claims.exp as i64 {
            return Err(AuthError::Expired);
        }
        debug!(subject = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::new("test-secret", Duration::minutes(30))
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let token = keys.sign("alice").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn token_valid_before_expiry_and_expired_after() {
        let keys = make_keys();
        let issued = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let token = keys.sign_at("alice", issued).expect("sign");

        let claims = keys
            .verify_at(&token, issued + Duration::minutes(29))
            .expect("valid at +29min");
        assert_eq!(claims.sub, "alice");

        let err = keys
            .verify_at(&token, issued + Duration::minutes(31))
            .unwrap_err();
        assert_eq!(err, AuthError::Expired);
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let keys = make_keys();
        let issued = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let token = keys.sign_at("alice", issued).expect("sign");
        // current time == exp counts as expired
        let err = keys
            .verify_at(&token, issued + Duration::minutes(30))
            .unwrap_err();
        assert_eq!(err, AuthError::Expired);
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let keys = make_keys();
        let other = JwtKeys::new("other-secret", Duration::minutes(30));
        let token = keys.sign("alice").expect("sign");
        assert_eq!(other.verify(&token).unwrap_err(), AuthError::InvalidSignature);
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = make_keys();
        assert_eq!(
            keys.verify("not-a-jwt").unwrap_err(),
            AuthError::Malformed
        );
        assert_eq!(keys.verify("").unwrap_err(), AuthError::Malformed);
    }

    #[test]
    fn token_without_required_claims_is_malformed() {
        #[derive(Serialize)]
        struct Bare {
            exp: usize,
        }
        let keys = make_keys();
        let token = encode(
            &Header::default(),
            &Bare { exp: usize::MAX },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert_eq!(keys.verify(&token).unwrap_err(), AuthError::Malformed);
    }
}
