use super::error::ConfigError;
use super::models::app_env::{AppEnv, Env};
use std::env;
use std::str::FromStr;

impl AppEnv {
    pub fn new() -> Result<AppEnv, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the environment from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<AppEnv, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).ok_or(ConfigError::MissingVar(name));

        let env_value = get("ENV")?;
        let env = Env::from_str(&env_value).map_err(|_| ConfigError::InvalidVar {
            name: "ENV",
            value: env_value.clone(),
        })?;

        let port_value = get("SERVER_PORT")?;
        let server_port = port_value.parse().map_err(|_| ConfigError::InvalidVar {
            name: "SERVER_PORT",
            value: port_value.clone(),
        })?;

        Ok(AppEnv {
            env,
            server_port,
            server_address: get("SERVER_ADDRESS")?,
            postgres_host: get("POSTGRES_HOST")?,
            postgres_user: get("POSTGRES_USER")?,
            postgres_password: get("POSTGRES_PASSWORD")?,
            postgres_database: get("POSTGRES_DATABASE")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("ENV", "local"),
            ("SERVER_PORT", "8080"),
            ("SERVER_ADDRESS", "127.0.0.1"),
            ("POSTGRES_HOST", "localhost:5432"),
            ("POSTGRES_USER", "monitor"),
            ("POSTGRES_PASSWORD", "monitor"),
            ("POSTGRES_DATABASE", "long_short"),
        ])
    }

    #[test]
    fn test_builds_from_complete_environment() {
        let vars = full_env();
        let env = AppEnv::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();

        assert_eq!(env.env, Env::Local);
        assert_eq!(env.server_port, 8080);
        assert_eq!(env.postgres_database, "long_short");
    }

    #[test]
    fn test_missing_variable_is_named() {
        let mut vars = full_env();
        vars.remove("POSTGRES_HOST");

        let err = AppEnv::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("POSTGRES_HOST")));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut vars = full_env();
        vars.insert("SERVER_PORT", "eighty");

        let err = AppEnv::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { name: "SERVER_PORT", .. }));
    }
}
