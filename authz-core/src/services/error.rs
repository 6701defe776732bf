use service_core::error::AppError;
use thiserror::Error;

use super::policy::PolicyError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("missing or invalid credentials")]
    MissingCredentials,

    #[error("missing domain id")]
    MissingDomain,

    #[error("not authorized to {action}")]
    Authorization {
        action: String,
        #[source]
        source: PolicyError,
    },

    #[error("personal access token is not authorized for this operation")]
    UnauthorizedPat(#[source] PolicyError),

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("role name already exists: {0}")]
    DuplicateRoleName(String),

    #[error("operation has no permission mapped: {0}")]
    UnmappedOperation(String),

    #[error("operation is mapped more than once: {0}")]
    DuplicateOperation(String),

    #[error("operation is not registered: {0}")]
    UnknownOperation(String),

    #[error("creation rolled back: {0}")]
    Rollback(#[source] Box<ServiceError>),

    #[error("rollback failed: {rollback} (original error: {source})")]
    RollbackFailed {
        #[source]
        source: Box<ServiceError>,
        rollback: Box<ServiceError>,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("policy evaluation timed out")]
    Timeout,

    #[error("repository error: {0}")]
    Repository(anyhow::Error),

    #[error("policy error: {0}")]
    Policy(#[source] PolicyError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn authorization(action: impl Into<String>, source: PolicyError) -> Self {
        ServiceError::Authorization {
            action: action.into(),
            source,
        }
    }

    /// Wrap a provisioning failure with the outcome of the compensating delete.
    pub fn rolled_back(cause: ServiceError, rollback: Result<(), ServiceError>) -> Self {
        match rollback {
            Ok(()) => ServiceError::Rollback(Box::new(cause)),
            Err(rollback) => ServiceError::RollbackFailed {
                source: Box::new(cause),
                rollback: Box::new(rollback),
            },
        }
    }

    /// True for authorization denials, including PAT-scope denials.
    pub fn is_denied(&self) -> bool {
        matches!(
            self,
            ServiceError::Authorization { .. } | ServiceError::UnauthorizedPat(_)
        )
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Authentication(_) | ServiceError::MissingCredentials => {
                AppError::Unauthorized(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::MissingDomain | ServiceError::InvalidAction(_) => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::Authorization { .. } | ServiceError::UnauthorizedPat(_) => {
                AppError::Forbidden(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::DuplicateRoleName(_) | ServiceError::Conflict(_) => {
                AppError::Conflict(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::UnmappedOperation(_)
            | ServiceError::DuplicateOperation(_)
            | ServiceError::UnknownOperation(_) => {
                AppError::ConfigError(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::NotFound(_) => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            ServiceError::Validation(msg) => AppError::ValidationError(msg),
            ServiceError::Timeout => AppError::Timeout(err.to_string()),
            ServiceError::Policy(PolicyError::Unavailable(_)) => AppError::ServiceUnavailable,
            ServiceError::Internal(e) => AppError::InternalError(e),
            other => AppError::InternalError(anyhow::Error::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_authorization_message_names_action() {
        let err = ServiceError::authorization("view channel", PolicyError::Denied);
        assert_eq!(err.to_string(), "not authorized to view channel");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_rolled_back_keeps_both_causes() {
        let err = ServiceError::rolled_back(
            ServiceError::Policy(PolicyError::Denied),
            Err(ServiceError::Repository(anyhow::anyhow!("delete failed"))),
        );
        match err {
            ServiceError::RollbackFailed { source, rollback } => {
                assert!(matches!(*source, ServiceError::Policy(_)));
                assert!(matches!(*rollback, ServiceError::Repository(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rolled_back_success_wraps_cause() {
        let err = ServiceError::rolled_back(ServiceError::Timeout, Ok(()));
        assert!(matches!(err, ServiceError::Rollback(_)));
    }

    #[test]
    fn test_app_error_mapping() {
        let denied: AppError = ServiceError::authorization("edit client", PolicyError::Denied).into();
        assert!(matches!(denied, AppError::Forbidden(_)));

        let pat: AppError = ServiceError::UnauthorizedPat(PolicyError::Denied).into();
        assert!(matches!(pat, AppError::Forbidden(_)));

        let authn: AppError = ServiceError::MissingCredentials.into();
        assert!(matches!(authn, AppError::Unauthorized(_)));

        let dup: AppError = ServiceError::DuplicateRoleName("ops".into()).into();
        assert!(matches!(dup, AppError::Conflict(_)));

        let timeout: AppError = ServiceError::Timeout.into();
        assert!(matches!(timeout, AppError::Timeout(_)));

        let rollback: AppError = ServiceError::Rollback(Box::new(ServiceError::Timeout)).into();
        assert!(matches!(rollback, AppError::InternalError(_)));
    }
}
