use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Storage backend ("memory" or "postgres")
    #[serde(default = "default_storage")]
    pub storage: String,

    // PostgreSQL configuration
    /// PostgreSQL host
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    /// PostgreSQL port
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    /// PostgreSQL database name
    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    /// PostgreSQL username
    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    /// PostgreSQL password
    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    /// Maximum PostgreSQL pool size
    #[serde(default = "default_postgres_max_pool_size")]
    pub postgres_max_pool_size: usize,

    // Synchronizer configuration
    /// Outbox poll interval in milliseconds
    #[serde(default = "default_sync_poll_interval_ms")]
    pub sync_poll_interval_ms: u64,

    /// Maximum outbox events drained per poll
    #[serde(default = "default_sync_batch_size")]
    pub sync_batch_size: usize,

    /// Concurrent apply lanes
    #[serde(default = "default_sync_lanes")]
    pub sync_lanes: usize,

    /// Initial backend retry delay in milliseconds
    #[serde(default = "default_sync_retry_initial_delay_ms")]
    pub sync_retry_initial_delay_ms: u64,

    /// Maximum backend retry delay in milliseconds
    #[serde(default = "default_sync_retry_max_delay_ms")]
    pub sync_retry_max_delay_ms: u64,

    // Check cache configuration
    /// Positive check cache TTL in seconds
    #[serde(default = "default_check_cache_ttl_secs")]
    pub check_cache_ttl_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_storage() -> String {
    "memory".to_string()
}

// PostgreSQL defaults
fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "palisade".to_string()
}

fn default_postgres_username() -> String {
    "palisade".to_string()
}

fn default_postgres_password() -> String {
    "palisade".to_string()
}

fn default_postgres_max_pool_size() -> usize {
    10
}

// Synchronizer defaults
fn default_sync_poll_interval_ms() -> u64 {
    250
}

fn default_sync_batch_size() -> usize {
    64
}

fn default_sync_lanes() -> usize {
    8
}

fn default_sync_retry_initial_delay_ms() -> u64 {
    200
}

fn default_sync_retry_max_delay_ms() -> u64 {
    5000
}

// Check cache defaults
fn default_check_cache_ttl_secs() -> u64 {
    30
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("PALISADE"))
            .build()?
            .try_deserialize()
    }
}
