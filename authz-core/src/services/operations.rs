//! Operation to permission registries.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use super::error::ServiceError;
use crate::models::PatOperation;

/// Capability name understood by the policy evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Permission {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An operation a decorator can authorize.
///
/// `Display` renders the human label used in denial messages
/// (`"view channel"`). `ALL` lists every variant the service exposes and is
/// what [`OperationPerm::validate`] checks against.
pub trait Operation:
    Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    const ALL: &'static [Self];

    /// CRUD class presented to PAT scope checks. `None` skips the PAT
    /// check, for external checks that pair with a local one which already
    /// ran it.
    fn pat_operation(&self) -> Option<PatOperation>;
}

/// Operation set for services that issue no external checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoOperation {}

impl fmt::Display for NoOperation {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl Operation for NoOperation {
    const ALL: &'static [Self] = &[];

    fn pat_operation(&self) -> Option<PatOperation> {
        match *self {}
    }
}

/// Validated mapping from operations to permissions.
///
/// Built mutable, validated once, then only read.
#[derive(Debug, Clone)]
pub struct OperationPerm<O: Operation> {
    perms: HashMap<O, Permission>,
}

impl<O: Operation> Default for OperationPerm<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Operation> OperationPerm<O> {
    pub fn new() -> Self {
        Self {
            perms: HashMap::new(),
        }
    }

    /// Merge `map` into the registry. Nothing is merged if any operation is
    /// already present or repeated within `map`.
    pub fn add_operation_permission_map<I>(&mut self, map: I) -> Result<(), ServiceError>
    where
        I: IntoIterator<Item = (O, Permission)>,
    {
        let entries: Vec<(O, Permission)> = map.into_iter().collect();
        let mut seen = HashSet::with_capacity(entries.len());
        for (op, _) in &entries {
            if self.perms.contains_key(op) || !seen.insert(*op) {
                return Err(ServiceError::DuplicateOperation(op.to_string()));
            }
        }
        self.perms.extend(entries);
        Ok(())
    }

    /// Fails if any operation in `O::ALL` has no permission.
    pub fn validate(&self) -> Result<(), ServiceError> {
        match O::ALL.iter().find(|op| !self.perms.contains_key(*op)) {
            Some(op) => Err(ServiceError::UnmappedOperation(op.to_string())),
            None => Ok(()),
        }
    }

    pub fn get_permission(&self, op: O) -> Result<&Permission, ServiceError> {
        self.perms
            .get(&op)
            .ok_or_else(|| ServiceError::UnknownOperation(op.to_string()))
    }

    pub fn len(&self) -> usize {
        self.perms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum ThingOp {
        View,
        Update,
    }

    impl fmt::Display for ThingOp {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                ThingOp::View => f.write_str("view thing"),
                ThingOp::Update => f.write_str("update thing"),
            }
        }
    }

    impl Operation for ThingOp {
        const ALL: &'static [Self] = &[ThingOp::View, ThingOp::Update];

        fn pat_operation(&self) -> Option<PatOperation> {
            match self {
                ThingOp::View => Some(PatOperation::Read),
                ThingOp::Update => Some(PatOperation::Update),
            }
        }
    }

    #[test]
    fn test_validate_succeeds_when_complete() {
        let mut perms = OperationPerm::new();
        perms
            .add_operation_permission_map([
                (ThingOp::View, Permission::from("view")),
                (ThingOp::Update, Permission::from("edit")),
            ])
            .unwrap();
        assert!(perms.validate().is_ok());
        assert_eq!(perms.get_permission(ThingOp::Update).unwrap().as_str(), "edit");
    }

    #[test]
    fn test_validate_fails_on_missing_mapping() {
        let mut perms = OperationPerm::new();
        perms
            .add_operation_permission_map([(ThingOp::View, Permission::from("view"))])
            .unwrap();
        match perms.validate() {
            Err(ServiceError::UnmappedOperation(op)) => assert_eq!(op, "update thing"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_mapping_is_rejected_atomically() {
        let mut perms = OperationPerm::new();
        perms
            .add_operation_permission_map([(ThingOp::View, Permission::from("view"))])
            .unwrap();
        let result = perms.add_operation_permission_map([
            (ThingOp::Update, Permission::from("edit")),
            (ThingOp::View, Permission::from("read")),
        ]);
        assert!(matches!(result, Err(ServiceError::DuplicateOperation(_))));
        assert_eq!(perms.len(), 1);
    }

    #[test]
    fn test_unknown_operation() {
        let perms: OperationPerm<ThingOp> = OperationPerm::new();
        assert!(matches!(
            perms.get_permission(ThingOp::View),
            Err(ServiceError::UnknownOperation(_))
        ));
    }

    #[test]
    fn test_no_operation_registry_is_valid() {
        let perms: OperationPerm<NoOperation> = OperationPerm::new();
        assert!(perms.validate().is_ok());
        assert!(perms.is_empty());
    }
}
