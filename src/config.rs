use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::application::label_issuer::IssuerSettings;
use crate::domain::courier::{CatalogError, CourierRegistry};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub label_base_url: String,
    pub issue_attempts: u32,
    pub courier_catalog_path: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = IssuerSettings::default();
        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => 8080,
        };
        let issue_attempts = match get("LABEL_ISSUE_ATTEMPTS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "LABEL_ISSUE_ATTEMPTS",
                        value: raw,
                        reason: "expected a positive integer".to_string(),
                    })
                }
            },
            None => defaults.max_attempts,
        };

        Ok(Self {
            database_url,
            host,
            port,
            label_base_url: get("LABEL_BASE_URL").unwrap_or(defaults.label_base_url),
            issue_attempts,
            courier_catalog_path: get("COURIER_CATALOG_PATH").map(PathBuf::from),
        })
    }

    /// The built-in catalog, or the JSON file named by `COURIER_CATALOG_PATH`.
    pub fn courier_registry(&self) -> Result<CourierRegistry, ConfigError> {
        match &self.courier_catalog_path {
            Some(path) => Ok(CourierRegistry::from_json_file(path)?),
            None => Ok(CourierRegistry::builtin()),
        }
    }

    pub fn issuer_settings(&self) -> IssuerSettings {
        IssuerSettings {
            label_base_url: self.label_base_url.clone(),
            max_attempts: self.issue_attempts,
        }
    }
}
