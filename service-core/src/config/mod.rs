use crate::error::AppError;
use config::{Config as Cfg, Environment, File};
use serde::de::DeserializeOwned;

/// Load settings from an optional `configuration` file layered under
/// `<prefix>__`-separated environment variables.
pub fn load<T: DeserializeOwned>(file_name: &str, env_prefix: &str) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let config = Cfg::builder()
        .add_source(File::with_name(file_name).required(false))
        .add_source(Environment::with_prefix(env_prefix).separator("__"))
        .build()?;

    Ok(config.try_deserialize()?)
}

/// Load settings from a single required file. The format is inferred from the
/// extension (toml, json, yaml).
pub fn load_file<T: DeserializeOwned>(path: &str) -> Result<T, AppError> {
    let config = Cfg::builder()
        .add_source(File::with_name(path).required(true))
        .build()?;

    Ok(config.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
        actions: Vec<String>,
    }

    #[test]
    fn test_load_file_reads_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "name = \"clients\"\nactions = [\"view\", \"edit\"]").unwrap();

        let sample: Sample = load_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(sample.name, "clients");
        assert_eq!(sample.actions, vec!["view", "edit"]);
    }

    #[test]
    fn test_load_file_missing_is_config_error() {
        let result: Result<Sample, AppError> = load_file("/nonexistent/actions.toml");
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
