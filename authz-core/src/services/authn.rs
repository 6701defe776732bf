//! Token to session resolution.

use async_trait::async_trait;

use super::error::ServiceError;
use super::jwt::{JwtService, TokenKind};
use crate::models::Session;

/// Resolves a bearer token into a session. Pure, no side effects.
#[async_trait]
pub trait Authentication: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Session, ServiceError>;
}

pub struct JwtAuthenticator {
    jwt: JwtService,
}

impl JwtAuthenticator {
    pub fn new(jwt: JwtService) -> Self {
        Self { jwt }
    }
}

#[async_trait]
impl Authentication for JwtAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Session, ServiceError> {
        if token.is_empty() {
            return Err(ServiceError::MissingCredentials);
        }

        let claims = self.jwt.validate_token(token).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            ServiceError::Authentication(e.to_string())
        })?;

        match claims.kind {
            TokenKind::Session => Ok(Session::new(claims.sub)),
            TokenKind::Pat => match claims.pat_id {
                Some(pat_id) if !pat_id.is_empty() => {
                    Ok(Session::personal_access_token(claims.sub, pat_id))
                }
                _ => Err(ServiceError::Authentication(
                    "personal access token without pat id".to_string(),
                )),
            },
        }
    }
}

/// Whether the route being served carries a domain segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainRequirement {
    Required,
    Optional,
}

/// Parse `Authorization: Bearer <token>`.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, ServiceError> {
    let header = header.ok_or(ServiceError::MissingCredentials)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(ServiceError::MissingCredentials)?
        .trim();

    if token.is_empty() {
        return Err(ServiceError::MissingCredentials);
    }
    Ok(token)
}

/// Extract, authenticate and scope a request's session in one step.
pub async fn authenticate_request(
    authn: &dyn Authentication,
    authorization_header: Option<&str>,
    domain_id: Option<&str>,
    requirement: DomainRequirement,
) -> Result<Session, ServiceError> {
    let token = extract_bearer_token(authorization_header)?;
    let session = authn.authenticate(token).await?;

    match (domain_id.filter(|d| !d.is_empty()), requirement) {
        (Some(domain_id), _) => Ok(session.with_domain(domain_id)),
        (None, DomainRequirement::Required) => Err(ServiceError::MissingDomain),
        (None, DomainRequirement::Optional) => Ok(session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use secrecy::Secret;

    fn authenticator() -> (JwtService, JwtAuthenticator) {
        let jwt = JwtService::new(&JwtConfig {
            secret: Secret::new("authn-test-secret".to_string()),
            issuer: "authz-test".to_string(),
            session_expiry_minutes: 15,
            pat_expiry_days: 1,
        })
        .unwrap();
        (jwt.clone(), JwtAuthenticator::new(jwt))
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert!(matches!(
            extract_bearer_token(None),
            Err(ServiceError::MissingCredentials)
        ));
        assert!(matches!(
            extract_bearer_token(Some("Basic abc")),
            Err(ServiceError::MissingCredentials)
        ));
        assert!(matches!(
            extract_bearer_token(Some("Bearer   ")),
            Err(ServiceError::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn test_session_token_resolves_with_domain() {
        let (jwt, authn) = authenticator();
        let token = jwt.issue_session_token("u1").unwrap();
        let header = format!("Bearer {}", token);

        let session = authenticate_request(
            &authn,
            Some(&header),
            Some("d1"),
            DomainRequirement::Required,
        )
        .await
        .unwrap();
        assert_eq!(session.domain_user_id(), "d1:u1");
        assert!(!session.is_pat());
    }

    #[tokio::test]
    async fn test_missing_domain() {
        let (jwt, authn) = authenticator();
        let token = jwt.issue_session_token("u1").unwrap();
        let header = format!("Bearer {}", token);

        let result =
            authenticate_request(&authn, Some(&header), Some(""), DomainRequirement::Required)
                .await;
        assert!(matches!(result, Err(ServiceError::MissingDomain)));

        let session = authenticate_request(&authn, Some(&header), None, DomainRequirement::Optional)
            .await
            .unwrap();
        assert!(session.domain_id().is_empty());
    }

    #[tokio::test]
    async fn test_pat_token_resolves_to_pat_session() {
        let (jwt, authn) = authenticator();
        let token = jwt.issue_personal_access_token("u1", "pat-9").unwrap();

        let session = authn.authenticate(&token).await.unwrap();
        assert!(session.is_pat());
        assert_eq!(session.pat_id(), Some("pat-9"));
    }

    #[tokio::test]
    async fn test_garbage_token_is_authentication_error() {
        let (_, authn) = authenticator();
        let result = authn.authenticate("not-a-jwt").await;
        assert!(matches!(result, Err(ServiceError::Authentication(_))));
    }
}
