//! In-memory relationship evaluator for development and tests.
//!
//! Stores relationship tuples, expands role usersets one hop
//! (`role#member -> action -> object` plus `subject -> member -> role`),
//! checks PAT scopes, records every query and supports fault injection.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::policy::{Authorization, PolicyError, PolicyService};
use crate::models::policy::{
    ADMIN_PERMISSION, ANY_IDS, MEMBER_RELATION, PLATFORM_OBJECT, ROLE_TYPE, USER_TYPE,
};
use crate::models::{EntityType, PatOperation, PatReq, PolicyReq};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Tuple {
    subject: String,
    subject_relation: String,
    edge: String,
    object_type: String,
    object: String,
}

impl From<&PolicyReq> for Tuple {
    fn from(req: &PolicyReq) -> Self {
        Self {
            subject: req.subject.clone(),
            subject_relation: req.subject_relation.clone(),
            edge: req.edge().to_string(),
            object_type: req.object_type.clone(),
            object: req.object.clone(),
        }
    }
}

/// What a personal access token may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatScope {
    pub user_id: String,
    pub entity_type: EntityType,
    pub optional_domain_id: String,
    pub operation: PatOperation,
    pub entity_id: String,
}

impl PatScope {
    fn allows(&self, req: &PatReq) -> bool {
        self.user_id == req.user_id
            && self.entity_type == req.entity_type
            && self.operation == req.operation
            && (self.entity_id == ANY_IDS || self.entity_id == req.entity_id)
            && (self.optional_domain_id.is_empty()
                || self.optional_domain_id == req.optional_domain_id)
    }
}

#[derive(Default)]
pub struct MockPolicyEvaluator {
    tuples: Mutex<HashSet<Tuple>>,
    pat_scopes: DashMap<String, Vec<PatScope>>,
    authorize_calls: Mutex<Vec<PolicyReq>>,
    pat_calls: Mutex<Vec<PatReq>>,
    failing_writes: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    unavailable: Mutex<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockPolicyEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `permission` on an object directly to a subject.
    pub fn grant(&self, subject: &str, permission: &str, object_type: &str, object: &str) {
        let req = PolicyReq::permission(USER_TYPE, subject, permission, object_type, object);
        lock(&self.tuples).insert(Tuple::from(&req));
    }

    pub fn revoke(&self, subject: &str, permission: &str, object_type: &str, object: &str) {
        let req = PolicyReq::permission(USER_TYPE, subject, permission, object_type, object);
        lock(&self.tuples).remove(&Tuple::from(&req));
    }

    /// Make `user_id` a platform administrator.
    pub fn grant_platform_admin(&self, user_id: &str) {
        self.grant(user_id, ADMIN_PERMISSION, PLATFORM_OBJECT, PLATFORM_OBJECT);
    }

    pub fn add_pat_scope(&self, pat_id: &str, scope: PatScope) {
        self.pat_scopes
            .entry(pat_id.to_string())
            .or_default()
            .push(scope);
    }

    /// Every `add_policies` batch touching `object` fails.
    pub fn fail_writes_for(&self, object: &str) {
        lock(&self.failing_writes).insert(object.to_string());
    }

    /// Every `delete_policies` batch touching `object` fails.
    pub fn fail_deletes_for(&self, object: &str) {
        lock(&self.failing_deletes).insert(object.to_string());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *lock(&self.unavailable) = unavailable;
    }

    pub fn has_policy(&self, req: &PolicyReq) -> bool {
        lock(&self.tuples).contains(&Tuple::from(req))
    }

    /// Number of stored tuples whose object is `object`.
    pub fn policies_on(&self, object: &str) -> usize {
        lock(&self.tuples)
            .iter()
            .filter(|t| t.object == object)
            .count()
    }

    pub fn authorize_calls(&self) -> Vec<PolicyReq> {
        lock(&self.authorize_calls).clone()
    }

    pub fn pat_calls(&self) -> Vec<PatReq> {
        lock(&self.pat_calls).clone()
    }

    pub fn reset_calls(&self) {
        lock(&self.authorize_calls).clear();
        lock(&self.pat_calls).clear();
    }

    fn check_available(&self) -> Result<(), PolicyError> {
        if *lock(&self.unavailable) {
            return Err(PolicyError::Unavailable(anyhow::anyhow!(
                "policy evaluator is unreachable"
            )));
        }
        Ok(())
    }

    fn allowed(&self, req: &PolicyReq) -> bool {
        let tuples = lock(&self.tuples);
        let edge = req.edge();

        let direct = Tuple::from(req);
        if tuples.contains(&direct) {
            return true;
        }

        // One hop through role usersets.
        tuples.iter().any(|t| {
            t.subject_relation == MEMBER_RELATION
                && t.edge == edge
                && t.object == req.object
                && t.object_type == req.object_type
                && tuples.contains(&Tuple {
                    subject: req.subject.clone(),
                    subject_relation: String::new(),
                    edge: MEMBER_RELATION.to_string(),
                    object_type: ROLE_TYPE.to_string(),
                    object: t.subject.clone(),
                })
        })
    }

    fn batch_blocked(&self, faults: &Mutex<HashSet<String>>, reqs: &[PolicyReq]) -> Option<String> {
        let faults = lock(faults);
        reqs.iter()
            .find(|r| faults.contains(&r.object))
            .map(|r| r.object.clone())
    }
}

#[async_trait]
impl Authorization for MockPolicyEvaluator {
    async fn authorize(&self, req: &PolicyReq) -> Result<(), PolicyError> {
        lock(&self.authorize_calls).push(req.clone());
        self.check_available()?;

        if self.allowed(req) {
            Ok(())
        } else {
            Err(PolicyError::Denied)
        }
    }

    async fn authorize_pat(&self, req: &PatReq) -> Result<(), PolicyError> {
        lock(&self.pat_calls).push(req.clone());
        self.check_available()?;

        let allowed = self
            .pat_scopes
            .get(&req.pat_id)
            .map(|scopes| scopes.iter().any(|s| s.allows(req)))
            .unwrap_or(false);

        if allowed {
            Ok(())
        } else {
            Err(PolicyError::Denied)
        }
    }
}

#[async_trait]
impl PolicyService for MockPolicyEvaluator {
    async fn add_policies(&self, reqs: &[PolicyReq]) -> Result<(), PolicyError> {
        self.check_available()?;
        if let Some(object) = self.batch_blocked(&self.failing_writes, reqs) {
            return Err(PolicyError::Unavailable(anyhow::anyhow!(
                "failed to write policies for {}",
                object
            )));
        }

        let mut tuples = lock(&self.tuples);
        tuples.extend(reqs.iter().map(Tuple::from));
        Ok(())
    }

    async fn delete_policies(&self, reqs: &[PolicyReq]) -> Result<(), PolicyError> {
        self.check_available()?;
        if let Some(object) = self.batch_blocked(&self.failing_deletes, reqs) {
            return Err(PolicyError::Unavailable(anyhow::anyhow!(
                "failed to delete policies for {}",
                object
            )));
        }

        let mut tuples = lock(&self.tuples);
        for req in reqs {
            tuples.remove(&Tuple::from(req));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_direct_grant_allows() {
        let evaluator = MockPolicyEvaluator::new();
        evaluator.grant("d1:u1", "view", "client", "c1");

        let req = PolicyReq::permission(USER_TYPE, "d1:u1", "view", "client", "c1");
        assert!(evaluator.authorize(&req).await.is_ok());

        let other = PolicyReq::permission(USER_TYPE, "d1:u2", "view", "client", "c1");
        assert!(matches!(
            evaluator.authorize(&other).await,
            Err(PolicyError::Denied)
        ));
        assert_eq!(evaluator.authorize_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_role_userset_expansion() {
        let evaluator = MockPolicyEvaluator::new();
        evaluator
            .add_policies(&[
                PolicyReq::permission(ROLE_TYPE, "r1", "edit", "channel", "ch1")
                    .with_subject_relation(MEMBER_RELATION),
                PolicyReq::relation(USER_TYPE, "d1:u1", MEMBER_RELATION, ROLE_TYPE, "r1"),
            ])
            .await
            .unwrap();

        let req = PolicyReq::permission(USER_TYPE, "d1:u1", "edit", "channel", "ch1");
        assert!(evaluator.authorize(&req).await.is_ok());

        let view = PolicyReq::permission(USER_TYPE, "d1:u1", "view", "channel", "ch1");
        assert!(evaluator.authorize(&view).await.is_err());
    }

    #[tokio::test]
    async fn test_pat_scope_matches_entity_id_or_wildcard() {
        let evaluator = MockPolicyEvaluator::new();
        evaluator.add_pat_scope(
            "pat-1",
            PatScope {
                user_id: "u1".to_string(),
                entity_type: EntityType::Clients,
                optional_domain_id: "d1".to_string(),
                operation: PatOperation::Update,
                entity_id: "c1".to_string(),
            },
        );

        let mut req = PatReq {
            user_id: "u1".to_string(),
            pat_id: "pat-1".to_string(),
            entity_type: EntityType::Clients,
            optional_domain_id: "d1".to_string(),
            operation: PatOperation::Update,
            entity_id: "c1".to_string(),
        };
        assert!(evaluator.authorize_pat(&req).await.is_ok());

        req.entity_id = "c2".to_string();
        assert!(evaluator.authorize_pat(&req).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_write_batch_stores_nothing() {
        let evaluator = MockPolicyEvaluator::new();
        evaluator.fail_writes_for("ch2");

        let result = evaluator
            .add_policies(&[
                PolicyReq::relation(USER_TYPE, "u1", "member", "channel", "ch1"),
                PolicyReq::relation(USER_TYPE, "u1", "member", "channel", "ch2"),
            ])
            .await;
        assert!(matches!(result, Err(PolicyError::Unavailable(_))));
        assert_eq!(evaluator.policies_on("ch1"), 0);
    }

    #[tokio::test]
    async fn test_unavailable_is_not_denied() {
        let evaluator = MockPolicyEvaluator::new();
        evaluator.set_unavailable(true);
        let req = PolicyReq::permission(USER_TYPE, "d1:u1", "view", "client", "c1");
        assert!(matches!(
            evaluator.authorize(&req).await,
            Err(PolicyError::Unavailable(_))
        ));
    }
}
