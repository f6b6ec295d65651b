//! Service configuration.
//!
//! Two sources:
//! - [`AppConfig`]: non-secret settings from `config/<env>.yaml`
//! - [`PaymentConfig`]: gateway credentials and database access from the
//!   environment, injected into the dispatcher and callback processor

use std::fmt;
use std::fs;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payout::cipher::EncryptionKey;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub server: ServerConfig,
    #[serde(default)]
    pub gateway: GatewayClientConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Outbound gateway client settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayClientConfig {
    /// Hard deadline for one gateway call; expiry is a failed transfer
    pub timeout_secs: u64,
}

impl Default for GatewayClientConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl GatewayClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
            path: config_path.clone(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// String that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Persistence access: connection URL plus service credential.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub service_role: Secret,
}

/// Gateway + persistence credentials.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Gateway base URL, without trailing slash
    pub api_url: String,
    pub api_key: Secret,
    /// Shared signing secret appended to the signature source
    pub secret_key: Secret,
    pub encryption_key: EncryptionKey,
    /// `None` runs on the in-memory store
    pub database: Option<DatabaseConfig>,
}

pub mod env_vars {
    pub const PAYMENT_API_URL: &str = "PAYMENT_API_URL";
    pub const PAYMENT_API_KEY: &str = "PAYMENT_API_KEY";
    pub const PAYMENT_SECRET_KEY: &str = "PAYMENT_SECRET_KEY";
    pub const PAYMENT_ENCRYPTION_KEY: &str = "PAYMENT_ENCRYPTION_KEY";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const DATABASE_SERVICE_ROLE: &str = "DATABASE_SERVICE_ROLE";

    /// Legacy deployments exported the public-facing values with this prefix
    pub const LEGACY_PREFIX: &str = "VITE_";
}

impl PaymentConfig {
    /// Read from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through an arbitrary lookup (tests pass a map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        use env_vars::*;

        // Unprefixed name wins over the legacy one
        let get = |name: &'static str| -> Option<String> {
            lookup(name)
                .or_else(|| lookup(&format!("{LEGACY_PREFIX}{name}")))
                .filter(|v| !v.trim().is_empty())
        };
        let require = |name: &'static str| -> Result<String, ConfigError> {
            get(name).ok_or(ConfigError::Missing(name))
        };

        let api_url = require(PAYMENT_API_URL)?
            .trim_end_matches('/')
            .to_string();
        let api_key = Secret::new(require(PAYMENT_API_KEY)?);
        let secret_key = Secret::new(require(PAYMENT_SECRET_KEY)?);
        let encryption_key = EncryptionKey::new(require(PAYMENT_ENCRYPTION_KEY)?)
            .map_err(|e| ConfigError::InvalidKeyMaterial(e.to_string()))?;

        let database = match (get(DATABASE_URL), get(DATABASE_SERVICE_ROLE)) {
            (Some(url), Some(role)) => Some(DatabaseConfig {
                url,
                service_role: Secret::new(role),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(DATABASE_SERVICE_ROLE)),
            (None, Some(_)) => return Err(ConfigError::Missing(DATABASE_URL)),
        };

        Ok(Self {
            api_url,
            api_key,
            secret_key,
            encryption_key,
            database,
        })
    }
}
