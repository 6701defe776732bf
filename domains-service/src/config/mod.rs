use authz_core::config::{AuthzConfig, CatalogSettings};
use service_core::error::AppError;

#[derive(Debug, Clone)]
pub struct DomainsConfig {
    pub authz: AuthzConfig,
    pub actions_file: Option<String>,
}

impl DomainsConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            authz: AuthzConfig::from_env("domains-service")?,
            actions_file: CatalogSettings::load("domains", "DOMAINS")?.actions_file,
        })
    }
}
