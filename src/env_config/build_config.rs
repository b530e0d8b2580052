use super::error::ConfigError;
use super::models::app_config::AppConfig;
use super::models::app_env::Env;
use std::fs;

const CONFIG_DIR: &str = "config";

impl AppConfig {
    /// Loads `config/<env>.toml`.
    pub fn new(env: &Env) -> Result<AppConfig, ConfigError> {
        let path = format!("{}/{}.toml", CONFIG_DIR, env);
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        Self::from_toml(&raw).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn from_toml(raw: &str) -> Result<AppConfig, toml::de::Error> {
        toml::from_str(raw)
    }
}
