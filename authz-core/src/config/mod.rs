use secrecy::Secret;
use serde::Deserialize;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AuthzConfig {
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub jwt: JwtConfig,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub issuer: String,
    pub session_expiry_minutes: i64,
    pub pat_expiry_days: i64,
}

#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub timeout_ms: u64,
}

impl PolicyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AuthzConfig {
    /// Read settings for `default_service_name` from the environment.
    ///
    /// In prod every key must be set; in dev the defaults apply.
    pub fn from_env(default_service_name: &str) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = AuthzConfig {
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some(default_service_name), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            jwt: JwtConfig {
                secret: Secret::new(get_env("JWT_SECRET", Some("dev-only-secret"), is_prod)?),
                issuer: get_env("JWT_ISSUER", Some("iot-platform"), is_prod)?,
                session_expiry_minutes: parse_env("JWT_SESSION_EXPIRY_MINUTES", "15", is_prod)?,
                pat_expiry_days: parse_env("JWT_PAT_EXPIRY_DAYS", "30", is_prod)?,
            },
            policy: PolicyConfig {
                timeout_ms: parse_env("POLICY_TIMEOUT_MS", "2000", is_prod)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.jwt.session_expiry_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SESSION_EXPIRY_MINUTES must be positive"
            )));
        }

        if self.jwt.pat_expiry_days <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_PAT_EXPIRY_DAYS must be positive"
            )));
        }

        if self.policy.timeout_ms == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "POLICY_TIMEOUT_MS must be greater than 0"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

/// Per-entity catalog settings: an optional `<file_name>` file layered under
/// `<PREFIX>__ACTIONS_FILE` style environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSettings {
    #[serde(default)]
    pub actions_file: Option<String>,
}

impl CatalogSettings {
    pub fn load(file_name: &str, env_prefix: &str) -> Result<Self, AppError> {
        let settings: Self = service_core::config::load(file_name, env_prefix)?;
        Ok(Self {
            actions_file: settings.actions_file.filter(|p| !p.trim().is_empty()),
        })
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Prod);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_dev_defaults_apply() {
        let value = get_env("AUTHZ_TEST_SURELY_UNSET_KEY", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_prod_requires_key() {
        let result = get_env("AUTHZ_TEST_SURELY_UNSET_KEY", Some("fallback"), true);
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_parse_env_reports_key() {
        let result: Result<u64, AppError> =
            parse_env("AUTHZ_TEST_SURELY_UNSET_KEY", "not-a-number", false);
        match result {
            Err(AppError::ConfigError(e)) => {
                assert!(e.to_string().contains("AUTHZ_TEST_SURELY_UNSET_KEY"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_catalog_settings_read_prefixed_env() {
        env::set_var("AUTHZCATALOGTEST__ACTIONS_FILE", "/etc/actions/clients.toml");
        let settings = CatalogSettings::load("missing", "AUTHZCATALOGTEST").unwrap();
        assert_eq!(
            settings.actions_file.as_deref(),
            Some("/etc/actions/clients.toml")
        );

        env::set_var("AUTHZCATALOGBLANK__ACTIONS_FILE", "  ");
        let settings = CatalogSettings::load("missing", "AUTHZCATALOGBLANK").unwrap();
        assert!(settings.actions_file.is_none());
    }
}
