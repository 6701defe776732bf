//! Available-action catalog, one per entity type.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::error::ServiceError;
use crate::models::role::dedup_ordered;
use crate::models::{EntityType, BUILTIN_ADMIN_ROLE};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    actions: Vec<String>,
    #[serde(default)]
    builtin_roles: BTreeMap<String, Vec<String>>,
}

/// Actions roles on one entity type may grant, plus the built-in roles
/// provisioned for every new entity of that type.
///
/// The `admin` built-in role always exists and grants every action.
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    entity_type: EntityType,
    actions: Vec<String>,
    builtin_roles: BTreeMap<String, Vec<String>>,
}

impl ActionCatalog {
    pub fn new(entity_type: EntityType, actions: &[&str]) -> Self {
        let actions: Vec<String> = actions.iter().map(|a| a.to_string()).collect();
        let actions = dedup_ordered(&actions);
        let mut builtin_roles = BTreeMap::new();
        builtin_roles.insert(BUILTIN_ADMIN_ROLE.to_string(), actions.clone());

        Self {
            entity_type,
            actions,
            builtin_roles,
        }
    }

    /// Register an extra built-in role. Its actions must come from the catalog.
    pub fn with_builtin_role(mut self, name: &str, actions: &[&str]) -> Result<Self, ServiceError> {
        if name == BUILTIN_ADMIN_ROLE {
            return Err(ServiceError::DuplicateRoleName(name.to_string()));
        }
        let actions: Vec<String> = actions.iter().map(|a| a.to_string()).collect();
        self.validate_actions(&actions)?;
        self.builtin_roles
            .insert(name.to_string(), dedup_ordered(&actions));
        Ok(self)
    }

    /// Load a catalog from a TOML, JSON or YAML file.
    pub fn load(entity_type: EntityType, path: &str) -> Result<Self, ServiceError> {
        let file: CatalogFile = service_core::config::load_file(path)
            .map_err(|e| ServiceError::Internal(anyhow::Error::new(e)))?;

        let actions: Vec<&str> = file.actions.iter().map(String::as_str).collect();
        let mut catalog = Self::new(entity_type, &actions);
        for (name, role_actions) in &file.builtin_roles {
            if name == BUILTIN_ADMIN_ROLE {
                continue;
            }
            let role_actions: Vec<&str> = role_actions.iter().map(String::as_str).collect();
            catalog = catalog.with_builtin_role(name, &role_actions)?;
        }

        tracing::info!(
            entity_type = %entity_type,
            path = %path,
            actions = catalog.actions.len(),
            builtin_roles = catalog.builtin_roles.len(),
            "Loaded action catalog"
        );
        Ok(catalog)
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn available_actions(&self) -> &[String] {
        &self.actions
    }

    pub fn contains(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    /// Fails with the first action the catalog does not know.
    pub fn validate_actions(&self, actions: &[String]) -> Result<(), ServiceError> {
        match actions.iter().find(|a| !self.contains(a)) {
            Some(action) => Err(ServiceError::InvalidAction(action.clone())),
            None => Ok(()),
        }
    }

    pub fn builtin_roles(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.builtin_roles
            .iter()
            .map(|(name, actions)| (name.as_str(), actions.as_slice()))
    }

    pub fn builtin_role_actions(&self, name: &str) -> Option<&[String]> {
        self.builtin_roles.get(name).map(Vec::as_slice)
    }
}
