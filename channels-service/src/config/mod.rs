use authz_core::config::{AuthzConfig, CatalogSettings};
use service_core::error::AppError;

#[derive(Debug, Clone)]
pub struct ChannelsConfig {
    pub authz: AuthzConfig,
    pub actions_file: Option<String>,
}

impl ChannelsConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            authz: AuthzConfig::from_env("channels-service")?,
            actions_file: CatalogSettings::load("channels", "CHANNELS")?.actions_file,
        })
    }
}
