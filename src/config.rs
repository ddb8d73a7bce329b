use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "GBV Register";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";

/// Tracing filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "gbv_register_lib=info,tower_http=warn"
}

/// Get the application data directory
/// ~/GbvRegister/ on all platforms; falls back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("GbvRegister")
}

/// Default database file
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("gbv.db")
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid listen address '{0}'")]
    InvalidListenAddr(String),

    #[error("Listen address {0} is not a loopback address; the register only serves this machine")]
    NonLoopback(SocketAddr),
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub listen_addr: SocketAddr,
    pub facility_name: Option<String>,
}

impl AppConfig {
    /// Read `GBV_DB_PATH`, `GBV_LISTEN_ADDR` and `GBV_FACILITY_NAME`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let db_path = non_blank("GBV_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let raw_addr = non_blank("GBV_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr = raw_addr
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddr(raw_addr.clone()))?;
        if !listen_addr.ip().is_loopback() {
            return Err(ConfigError::NonLoopback(listen_addr));
        }

        Ok(Self {
            db_path,
            listen_addr,
            facility_name: non_blank("GBV_FACILITY_NAME"),
        })
    }
}
