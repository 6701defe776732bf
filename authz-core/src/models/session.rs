//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

/// How the caller authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[default]
    SessionToken,
    PersonalAccessToken,
}

/// Identity of the caller for the duration of one request.
///
/// A session is never mutated after it is built. Domain scoping and the
/// super-admin mark both produce a new value that the caller passes on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    user_id: String,
    domain_id: String,
    domain_user_id: String,
    super_admin: bool,
    auth_type: AuthType,
    pat_id: Option<String>,
}

impl Session {
    /// Session for a user that authenticated with a regular token.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            domain_id: String::new(),
            domain_user_id: String::new(),
            super_admin: false,
            auth_type: AuthType::SessionToken,
            pat_id: None,
        }
    }

    /// Session for a user that authenticated with a personal access token.
    pub fn personal_access_token(user_id: impl Into<String>, pat_id: impl Into<String>) -> Self {
        Self {
            auth_type: AuthType::PersonalAccessToken,
            pat_id: Some(pat_id.into()),
            ..Self::new(user_id)
        }
    }

    /// Scope the session to a domain. An empty domain clears the scope.
    pub fn with_domain(self, domain_id: impl Into<String>) -> Self {
        let domain_id = domain_id.into();
        let domain_user_id = if domain_id.is_empty() {
            String::new()
        } else {
            encode_domain_user_id(&domain_id, &self.user_id)
        };
        Self {
            domain_id,
            domain_user_id,
            ..self
        }
    }

    /// Convenience for `Session::new(user).with_domain(domain)`.
    pub fn scoped_to(user_id: impl Into<String>, domain_id: impl Into<String>) -> Self {
        Self::new(user_id).with_domain(domain_id)
    }

    /// Copy of this session marked as a platform super-admin.
    pub fn as_super_admin(&self) -> Self {
        Self {
            super_admin: true,
            ..self.clone()
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn domain_id(&self) -> &str {
        &self.domain_id
    }

    pub fn domain_user_id(&self) -> &str {
        &self.domain_user_id
    }

    pub fn is_super_admin(&self) -> bool {
        self.super_admin
    }

    pub fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    pub fn pat_id(&self) -> Option<&str> {
        self.pat_id.as_deref()
    }

    pub fn is_pat(&self) -> bool {
        self.auth_type == AuthType::PersonalAccessToken
    }
}

/// `"{domain}:{user}"`, the subject used for every domain-scoped check.
pub fn encode_domain_user_id(domain_id: &str, user_id: &str) -> String {
    format!("{}:{}", domain_id, user_id)
}

/// Split a domain-scoped subject back into `(domain, user)`.
pub fn decode_domain_user_id(domain_user_id: &str) -> Option<(&str, &str)> {
    domain_user_id
        .split_once(':')
        .filter(|(domain, user)| !domain.is_empty() && !user.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_domain_computes_domain_user_id() {
        let session = Session::new("alice").with_domain("d1");
        assert_eq!(session.domain_id(), "d1");
        assert_eq!(session.domain_user_id(), "d1:alice");
        assert!(!session.is_super_admin());
        assert_eq!(session.auth_type(), AuthType::SessionToken);
    }

    #[test]
    fn test_empty_domain_leaves_subject_empty() {
        let session = Session::scoped_to("alice", "");
        assert!(session.domain_user_id().is_empty());
    }

    #[test]
    fn test_as_super_admin_does_not_touch_original() {
        let session = Session::scoped_to("root", "d1");
        let elevated = session.as_super_admin();
        assert!(elevated.is_super_admin());
        assert!(!session.is_super_admin());
        assert_eq!(elevated.domain_user_id(), "d1:root");
    }

    #[test]
    fn test_pat_session_carries_pat_id() {
        let session = Session::personal_access_token("bob", "pat-1").with_domain("d2");
        assert!(session.is_pat());
        assert_eq!(session.pat_id(), Some("pat-1"));
        assert_eq!(session.domain_user_id(), "d2:bob");
    }

    #[test]
    fn test_decode_domain_user_id() {
        assert_eq!(decode_domain_user_id("d1:alice"), Some(("d1", "alice")));
        assert_eq!(decode_domain_user_id("alice"), None);
        assert_eq!(decode_domain_user_id(":alice"), None);
    }
}
