use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;

/// Token flavour carried in the `kind` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Session,
    Pat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Token ID
    pub jti: String,
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pat_id: Option<String>,
}

/// HS256 token issuer and verifier.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    session_expiry_minutes: i64,
    pat_expiry_days: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        let secret = config.secret.expose_secret();
        if secret.is_empty() {
            return Err(anyhow::anyhow!("JWT secret must not be empty"));
        }

        tracing::info!(issuer = %config.issuer, "JWT service initialized with HS256 key");

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: config.issuer.clone(),
            session_expiry_minutes: config.session_expiry_minutes,
            pat_expiry_days: config.pat_expiry_days,
        })
    }

    /// Issue a regular session token for a user.
    pub fn issue_session_token(&self, user_id: &str) -> Result<String, anyhow::Error> {
        self.issue(
            user_id,
            TokenKind::Session,
            None,
            Duration::minutes(self.session_expiry_minutes),
        )
    }

    /// Issue a personal access token bound to `pat_id`.
    pub fn issue_personal_access_token(
        &self,
        user_id: &str,
        pat_id: &str,
    ) -> Result<String, anyhow::Error> {
        self.issue(
            user_id,
            TokenKind::Pat,
            Some(pat_id.to_string()),
            Duration::days(self.pat_expiry_days),
        )
    }

    fn issue(
        &self,
        user_id: &str,
        kind: TokenKind,
        pat_id: Option<String>,
        ttl: Duration,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            kind,
            pat_id,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode token: {}", e))
    }

    /// Verify signature, issuer and expiry, and return the claims.
    pub fn validate_token(&self, token: &str) -> Result<TokenClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_issuer(&[self.issuer.as_str()]);

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid token: {}", e))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_config(session_expiry_minutes: i64) -> JwtConfig {
        JwtConfig {
            secret: Secret::new("test-secret-key".to_string()),
            issuer: "authz-test".to_string(),
            session_expiry_minutes,
            pat_expiry_days: 30,
        }
    }

    #[test]
    fn test_session_token_round_trip() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config(15))?;

        let token = service.issue_session_token("user_123")?;
        let claims = service.validate_token(&token)?;
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.kind, TokenKind::Session);
        assert!(claims.pat_id.is_none());

        Ok(())
    }

    #[test]
    fn test_pat_carries_pat_id() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config(15))?;

        let token = service.issue_personal_access_token("user_123", "pat_abc")?;
        let claims = service.validate_token(&token)?;
        assert_eq!(claims.kind, TokenKind::Pat);
        assert_eq!(claims.pat_id.as_deref(), Some("pat_abc"));

        Ok(())
    }

    #[test]
    fn test_expired_token_is_rejected() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config(-10))?;

        let token = service.issue_session_token("user_123")?;
        assert!(service.validate_token(&token).is_err());

        Ok(())
    }

    #[test]
    fn test_foreign_signature_is_rejected() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config(15))?;
        let mut other_config = test_config(15);
        other_config.secret = Secret::new("another-secret".to_string());
        let other = JwtService::new(&other_config)?;

        let token = other.issue_session_token("user_123")?;
        assert!(service.validate_token(&token).is_err());

        Ok(())
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let mut config = test_config(15);
        config.secret = Secret::new(String::new());
        assert!(JwtService::new(&config).is_err());
    }
}
