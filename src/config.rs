use crate::errors::{AppError, AppResult};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub log_filter: String,
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            log_filter: "commission_engine=debug,tower_http=info".to_string(),
            seed_demo_data: true,
        }
    }
}

fn parse_bool(name: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!("{} must be true or false", name))),
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let defaults = Self::default();

        let server_port = match lookup("SERVER_PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| AppError::Config("SERVER_PORT must be a valid port number".to_string()))?,
            None => defaults.server_port,
        };
        let seed_demo_data = match lookup("SEED_DEMO_DATA") {
            Some(value) => parse_bool("SEED_DEMO_DATA", &value)?,
            None => defaults.seed_demo_data,
        };

        Ok(Self {
            server_host: lookup("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
            log_filter: lookup("LOG_FILTER").unwrap_or(defaults.log_filter),
            seed_demo_data,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).expect("defaults load");
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
        assert!(config.seed_demo_data);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_HOST", "0.0.0.0"),
            ("SERVER_PORT", "8080"),
            ("SEED_DEMO_DATA", "no"),
        ]))
        .expect("config loads");
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn rejects_bad_port() {
        let err = Config::from_lookup(lookup(&[("SERVER_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
