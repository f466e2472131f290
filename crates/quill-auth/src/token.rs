//! HS256 session tokens.
//!
//! The token carries the subject id and email, expires after a configurable
//! TTL (`TOKEN_TTL_HOURS`, default 24), and is validated for signature,
//! expiry, and issuer. Unknown-email and wrong-password failures never reach
//! this module; everything here maps to the generic 401 family.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quill_core::defaults::{TOKEN_ISSUER, TOKEN_LEEWAY_SECS, TOKEN_TTL_HOURS};
use quill_core::{Error, Result};

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: Uuid,
    /// The user's email at signing time (display convenience, not identity).
    pub email: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expires at (unix timestamp).
    pub exp: i64,
    /// Issuer.
    pub iss: String,
}

/// Signing and verification keys derived once at boot from the shared secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

// Manual impl: the jsonwebtoken key types are not Debug (they hold secret
// material), so the keys are omitted from the output.
impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    /// Build keys from a secret and token lifetime.
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Build keys from the environment.
    ///
    /// `TOKEN_SECRET` is required; a missing secret is a fatal configuration
    /// error and callers should refuse to boot. `TOKEN_TTL_HOURS` defaults
    /// to 24.
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("TOKEN_SECRET")
            .map_err(|_| Error::Config("TOKEN_SECRET is not set".to_string()))?;
        if secret.is_empty() {
            return Err(Error::Config("TOKEN_SECRET is empty".to_string()));
        }
        let ttl_hours = std::env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(TOKEN_TTL_HOURS);
        Ok(Self::new(&secret, Duration::hours(ttl_hours)))
    }

    /// Sign a token for the given user.
    pub fn sign(&self, user_id: Uuid, email: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iss: TOKEN_ISSUER.to_string(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("token signing failed: {e}")))?;
        tracing::debug!(user_id = %user_id, "token signed");
        Ok(token)
    }

    /// Verify signature, expiry, and issuer; returns the claims on success.
    ///
    /// Expired tokens are distinguished in the message so clients can prompt
    /// for re-login, but both cases are the same 401 to the API.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.leeway = TOKEN_LEEWAY_SECS;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Error::Unauthorized("token expired".to_string())
                }
                _ => Error::Unauthorized("invalid token".to_string()),
            }
        })?;
        tracing::debug!(user_id = %data.claims.sub, "token verified");
        Ok(data.claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::new(secret, Duration::hours(1))
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("dev-secret");
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, "alice@example.com").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let signer = make_keys("secret-a");
        let verifier = make_keys("secret-b");
        let token = signer.sign(Uuid::new_v4(), "a@b.com").expect("sign");
        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(ref m) if m == "invalid token"));
    }

    #[test]
    fn verify_rejects_expired_token() {
        // TTL far enough in the past to clear the leeway window
        let keys = JwtKeys::new("dev-secret", Duration::seconds(-120));
        let token = keys.sign(Uuid::new_v4(), "a@b.com").expect("sign");
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(ref m) if m == "token expired"));
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys("dev-secret");
        assert!(keys.verify("not.a.token").is_err());
        assert!(keys.verify("").is_err());
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("Bearer  abc123 "), Some("abc123"));
        assert_eq!(bearer_token("bearer abc123"), None);
        assert_eq!(bearer_token("Basic abc123"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token(""), None);
    }

    #[test]
    fn claims_serde_shape() {
        let claims = Claims {
            sub: Uuid::nil(),
            email: "a@b.com".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_086_400,
            iss: TOKEN_ISSUER.to_string(),
        };
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains(r#""sub":"00000000-0000-0000-0000-000000000000""#));
        assert!(json.contains(r#""iss":"quillmark""#));
        let parsed: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.exp, claims.exp);
    }

    #[test]
    fn from_env_requires_secret() {
        // Isolated var names are process-global; use a scoped remove/restore.
        let prev = std::env::var("TOKEN_SECRET").ok();
        std::env::remove_var("TOKEN_SECRET");
        let err = JwtKeys::from_env().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        if let Some(v) = prev {
            std::env::set_var("TOKEN_SECRET", v);
        }
    }
}
