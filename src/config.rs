//! Process configuration for the relay.
//!
//! All values come from the environment (optionally seeded from a `.env` file by
//! `main`). The struct is built once at startup and handed to the application,
//! so nothing below `main` reads environment variables directly.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_REGISTRY_PATH: &str = "config/devices.yaml";

/// Errors raised while assembling [`RelayConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Connection details for the Odoo JSON-RPC endpoint.
#[derive(Clone)]
pub struct OdooConfig {
    pub url: String,
    pub database: String,
    pub uid: i64,
    pub password: String,
}

impl fmt::Debug for OdooConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdooConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("uid", &self.uid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Top-level relay configuration.
#[derive(Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    pub report_key: String,
    pub registry_path: PathBuf,
    pub odoo: OdooConfig,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bind_addr", &self.bind_addr)
            .field("report_key", &"<redacted>")
            .field("registry_path", &self.registry_path)
            .field("odoo", &self.odoo)
            .finish()
    }
}

impl RelayConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let host = get("BIND_HOST").unwrap_or_else(|| DEFAULT_BIND_HOST.to_string());
        let bind_addr = format!("{}:{}", host.trim(), port)
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_HOST",
                reason: e.to_string(),
            })?;

        let uid = require("ODOO_USER_ID")?
            .trim()
            .parse::<i64>()
            .map_err(|e| ConfigError::Invalid {
                name: "ODOO_USER_ID",
                reason: e.to_string(),
            })?;

        Ok(Self {
            bind_addr,
            report_key: require("REPORT_KEY")?,
            registry_path: get("DEVICE_REGISTRY_PATH")
                .unwrap_or_else(|| DEFAULT_REGISTRY_PATH.to_string())
                .into(),
            odoo: OdooConfig {
                url: require("ODOO_URL")?,
                database: require("ODOO_DB")?,
                uid,
                password: require("ODOO_PASSWORD")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("REPORT_KEY", "s3cret"),
            ("ODOO_URL", "https://erp.example.com/jsonrpc"),
            ("ODOO_DB", "prod"),
            ("ODOO_USER_ID", "2"),
            ("ODOO_PASSWORD", "hunter2"),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let config = RelayConfig::from_lookup(lookup_from(&required())).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.registry_path, PathBuf::from("config/devices.yaml"));
        assert_eq!(config.odoo.uid, 2);
        assert_eq!(config.report_key, "s3cret");
    }

    #[test]
    fn test_overrides() {
        let mut vars = required();
        vars.push(("PORT", "8081"));
        vars.push(("BIND_HOST", "127.0.0.1"));
        vars.push(("DEVICE_REGISTRY_PATH", "/etc/relay/devices.yaml"));
        let config = RelayConfig::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8081".parse().unwrap());
        assert_eq!(
            config.registry_path,
            PathBuf::from("/etc/relay/devices.yaml")
        );
    }

    #[test]
    fn test_missing_secret_is_reported() {
        let vars: Vec<_> = required()
            .into_iter()
            .filter(|(k, _)| *k != "REPORT_KEY")
            .collect();
        let err = RelayConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("REPORT_KEY")));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = required();
        vars.retain(|(k, _)| *k != "ODOO_DB");
        vars.push(("ODOO_DB", "   "));
        let err = RelayConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ODOO_DB")));
    }

    #[test]
    fn test_non_numeric_uid_rejected() {
        let mut vars = required();
        vars.retain(|(k, _)| *k != "ODOO_USER_ID");
        vars.push(("ODOO_USER_ID", "admin"));
        let err = RelayConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "ODOO_USER_ID",
                ..
            }
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = RelayConfig::from_lookup(lookup_from(&required())).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
