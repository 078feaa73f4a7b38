use super::Identity;
use crate::config::AppConfig;
use crate::error::{JoblyError, JoblyResult};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token claims.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub username: String,
    pub is_admin: bool,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration time (seconds since epoch)
    pub exp: i64,
}

/// Issues and verifies HS256 tokens with the configured secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: &AppConfig) -> Self {
        let secret = config.secret_key.as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: config.token_ttl,
        }
    }

    /// Sign a token for `username`.
    pub fn issue(&self, username: &str, is_admin: bool) -> JoblyResult<String> {
        let iat = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs())
            .map_err(|_| JoblyError::Token("token TTL out of range".to_string()))?;
        let claims = Claims {
            username: username.to_string(),
            is_admin,
            iat,
            exp: iat.saturating_add(ttl),
        };
        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> JoblyResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| JoblyError::Token(e.to_string()))
    }

    /// Verify signature and expiry. Any failure yields `None`.
    pub fn verify(&self, token: &str) -> Option<Identity> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(Identity::new(data.claims.username, data.claims.is_admin)),
            Err(err) => {
                tracing::debug!(target: "jobly.auth", error = %err, "token rejected");
                None
            }
        }
    }

    /// Resolve an `Authorization` header value to an identity.
    ///
    /// Accepts `Bearer <token>` or a bare token.
    pub fn identity_from_header(&self, header: Option<&str>) -> Option<Identity> {
        let raw = header?.trim();
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
        if token.is_empty() {
            return None;
        }
        self.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&AppConfig::new().secret_key(secret))
    }

    #[test]
    fn issued_token_verifies_to_its_identity() {
        let tokens = service("k1");
        let token = tokens.issue("u1", true).unwrap();
        assert_eq!(tokens.verify(&token), Some(Identity::new("u1", true)));
    }

    #[test]
    fn wrong_secret_yields_no_identity() {
        let token = service("k1").issue("u1", false).unwrap();
        assert_eq!(service("k2").verify(&token), None);
    }

    #[test]
    fn expired_token_yields_no_identity() {
        let tokens = service("k1");
        let now = Utc::now().timestamp();
        let token = tokens
            .sign(&Claims {
                username: "u1".into(),
                is_admin: false,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert_eq!(tokens.verify(&token), None);
    }

    #[test]
    fn header_parsing() {
        let tokens = service("k1");
        let token = tokens.issue("u1", false).unwrap();
        let bearer = format!("Bearer {token}");
        assert!(tokens.identity_from_header(Some(&bearer)).is_some());
        assert!(tokens.identity_from_header(Some(&token)).is_some());
        assert_eq!(tokens.identity_from_header(None), None);
        assert_eq!(tokens.identity_from_header(Some("Bearer ")), None);
        assert_eq!(tokens.identity_from_header(Some("Bearer not.a.jwt")), None);
    }

    #[test]
    fn claims_use_camel_case() {
        let claims = Claims {
            username: "u1".into(),
            is_admin: true,
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["isAdmin"], serde_json::json!(true));
    }
}
