//! Contracts of the relationship-policy evaluator.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{PatReq, PolicyReq};

/// Failure reported by the policy evaluator.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("permission denied")]
    Denied,

    #[error("policy evaluator unavailable: {0}")]
    Unavailable(anyhow::Error),

    #[error("policy evaluation deadline exceeded")]
    Timeout,
}

/// Yes/no relationship queries.
#[async_trait]
pub trait Authorization: Send + Sync {
    async fn authorize(&self, req: &PolicyReq) -> Result<(), PolicyError>;
    async fn authorize_pat(&self, req: &PatReq) -> Result<(), PolicyError>;
}

/// Relationship tuple writes.
#[async_trait]
pub trait PolicyService: Send + Sync {
    async fn add_policies(&self, reqs: &[PolicyReq]) -> Result<(), PolicyError>;
    async fn delete_policies(&self, reqs: &[PolicyReq]) -> Result<(), PolicyError>;
}

/// Bounds every evaluator call by a fixed deadline.
///
/// An expired deadline drops the in-flight call and yields
/// [`PolicyError::Timeout`]; nothing is retried.
pub struct DeadlineAuthorization {
    inner: Arc<dyn Authorization>,
    timeout: Duration,
}

impl DeadlineAuthorization {
    pub fn new(inner: Arc<dyn Authorization>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl Authorization for DeadlineAuthorization {
    async fn authorize(&self, req: &PolicyReq) -> Result<(), PolicyError> {
        match tokio::time::timeout(self.timeout, self.inner.authorize(req)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    object = %req.object,
                    permission = %req.edge(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Policy evaluation timed out"
                );
                Err(PolicyError::Timeout)
            }
        }
    }

    async fn authorize_pat(&self, req: &PatReq) -> Result<(), PolicyError> {
        match tokio::time::timeout(self.timeout, self.inner.authorize_pat(req)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    pat_id = %req.pat_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "PAT evaluation timed out"
                );
                Err(PolicyError::Timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::policy::USER_TYPE;

    struct Slow;

    #[async_trait]
    impl Authorization for Slow {
        async fn authorize(&self, _req: &PolicyReq) -> Result<(), PolicyError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }

        async fn authorize_pat(&self, _req: &PatReq) -> Result<(), PolicyError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_deadline_expires_as_timeout() {
        let authz = DeadlineAuthorization::new(Arc::new(Slow), Duration::from_millis(20));
        let req = PolicyReq::permission(USER_TYPE, "d1:u1", "view", "client", "c1");
        let result = authz.authorize(&req).await;
        assert!(matches!(result, Err(PolicyError::Timeout)));
    }
}
