//! Configuration module for the scouting backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

/// Public read-only competition API used when nothing else is configured.
pub const DEFAULT_TBA_BASE_URL: &str = "https://www.thebluealliance.com/api/v3";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file backing the local store
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Remote sheet endpoint receiving `{ data: [...] }` batches
    pub sync_endpoint: Option<String>,
    /// Base URL of the competition-data API
    pub tba_base_url: String,
    /// Value sent in the `X-TBA-Auth-Key` header
    pub tba_auth_key: String,
    /// Username that opens an admin session
    pub admin_username: String,
    /// Connectivity assumed at startup
    pub start_online: bool,
    /// Delay before a terminal sync status falls back to idle
    pub sync_reset_delay: Duration,
    /// Delay between recording an entry and the automatic sync attempt
    pub auto_sync_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("SCOUT_DB_PATH")
            .unwrap_or_else(|_| "./data/scouting.sqlite".to_string())
            .into();

        let bind_addr = env::var("SCOUT_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid SCOUT_BIND_ADDR: {}", e)))?;

        let log_level = env::var("SCOUT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let sync_endpoint = env::var("SCOUT_SYNC_ENDPOINT")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let tba_base_url =
            env::var("SCOUT_TBA_BASE_URL").unwrap_or_else(|_| DEFAULT_TBA_BASE_URL.to_string());

        let tba_auth_key =
            env::var("SCOUT_TBA_AUTH_KEY").unwrap_or_else(|_| "frc-scouting-app-v1".to_string());

        let admin_username =
            env::var("SCOUT_ADMIN_USERNAME").unwrap_or_else(|_| "admin6560".to_string());

        let start_online = parse_bool("SCOUT_START_ONLINE", true)?;
        let sync_reset_delay = Duration::from_millis(parse_millis("SCOUT_SYNC_RESET_MS", 3000)?);
        let auto_sync_delay =
            Duration::from_millis(parse_millis("SCOUT_AUTO_SYNC_DELAY_MS", 500)?);

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            sync_endpoint,
            tba_base_url,
            tba_auth_key,
            admin_username,
            start_online,
            sync_reset_delay,
            auto_sync_delay,
        })
    }
}

fn parse_bool(key: &str, default: bool) -> Result<bool, AppError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(AppError::Config(format!(
                "Invalid {}: expected a boolean, got {:?}",
                key, other
            ))),
        },
        Err(_) => Ok(default),
    }
}

fn parse_millis(key: &str, default: u64) -> Result<u64, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}
