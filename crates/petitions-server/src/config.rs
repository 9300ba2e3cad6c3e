use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PETITIONS_JWT_SECRET is unset or still a placeholder")]
    InsecureSecret,

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("{0} must be set together with PETITIONS_STORAGE_URL")]
    IncompleteStorage(&'static str),
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub url: String,
    pub bucket: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub storage: Option<StorageConfig>,
    pub admin: Option<AdminBootstrap>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = var("PETITIONS_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::InsecureSecret);
        }

        let host = var("PETITIONS_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = var("PETITIONS_PORT").unwrap_or_else(|| "3000".into());
        let addr_str = format!("{}:{}", host, port);
        let addr = addr_str.parse().map_err(|_| ConfigError::Invalid {
            key: "PETITIONS_HOST/PETITIONS_PORT",
            value: addr_str.clone(),
        })?;

        let db_path = var("PETITIONS_DB_PATH")
            .unwrap_or_else(|| "petitions.db".into())
            .into();

        let storage = match var("PETITIONS_STORAGE_URL") {
            Some(url) => Some(StorageConfig {
                url,
                bucket: var("PETITIONS_STORAGE_BUCKET")
                    .ok_or(ConfigError::IncompleteStorage("PETITIONS_STORAGE_BUCKET"))?,
                api_key: var("PETITIONS_STORAGE_KEY")
                    .ok_or(ConfigError::IncompleteStorage("PETITIONS_STORAGE_KEY"))?,
            }),
            None => None,
        };

        let admin = match (var("PETITIONS_ADMIN_EMAIL"), var("PETITIONS_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap { email, password }),
            _ => None,
        };

        Ok(Self {
            addr,
            db_path,
            jwt_secret,
            storage,
            admin,
        })
    }
}
