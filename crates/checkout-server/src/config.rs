//! Server Configuration
//!
//! Read from the environment after `.env` has been loaded.

use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("DATABASE_URL is set but the server was built without the `mysql` feature")]
    MysqlDisabled,

    #[error("{key} has invalid value `{value}`, expected true or false")]
    InvalidFlag { key: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_addr: String,

    /// Base URL of the client app, used for checkout redirects
    pub client_url: String,

    /// MySQL purchase records; in-memory store when absent
    pub database_url: Option<String>,

    /// JSON catalog file; built-in catalog when absent
    pub catalog_path: Option<PathBuf>,

    /// Take the caller's identity from the `x-user-id` header. Only safe
    /// behind a gateway that authenticates and overwrites that header.
    pub trust_user_id_header: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL");
        if database_url.is_some() && !cfg!(feature = "mysql") {
            return Err(ConfigError::MysqlDisabled);
        }

        Ok(Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            client_url: non_empty("CLIENT_URL").ok_or(ConfigError::Missing("CLIENT_URL"))?,
            database_url,
            catalog_path: non_empty("CATALOG_PATH").map(PathBuf::from),
            trust_user_id_header: flag("TRUST_USER_ID_HEADER", non_empty("TRUST_USER_ID_HEADER"))?,
        })
    }
}

fn flag(key: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { key, value }),
    }
}
