use authz_core::config::{AuthzConfig, CatalogSettings};
use service_core::error::AppError;

#[derive(Debug, Clone)]
pub struct ClientsConfig {
    pub authz: AuthzConfig,
    /// TOML/JSON file listing the client actions and builtin roles.
    pub actions_file: Option<String>,
}

impl ClientsConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            authz: AuthzConfig::from_env("clients-service")?,
            actions_file: CatalogSettings::load("clients", "CLIENTS")?.actions_file,
        })
    }
}
