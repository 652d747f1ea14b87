//! Configuration module for the bazaar tracker

use serde::Deserialize;
use std::env;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Snapshot feed endpoint
    pub api_endpoint: String,

    /// Seconds between refresh cycles
    pub refresh_interval_secs: u64,

    /// Timeout for one feed request in seconds
    pub fetch_timeout_secs: u64,

    /// Rolling history entries kept per instrument
    pub history_capacity: usize,

    /// Bounded wait for read-side lock acquisition in seconds
    pub read_lock_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            api_endpoint: env::var("BAZAAR_API_URL")
                .unwrap_or_else(|_| "https://api.hypixel.net/v2/skyblock/bazaar".to_string()),
            refresh_interval_secs: env::var("REFRESH_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            history_capacity: env::var("HISTORY_CAPACITY")
                .unwrap_or_else(|_| "28800".to_string())
                .parse()
                .unwrap_or(28_800),
            read_lock_timeout_secs: env::var("READ_LOCK_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_endpoint: "https://api.hypixel.net/v2/skyblock/bazaar".to_string(),
            refresh_interval_secs: 60,
            fetch_timeout_secs: 10,
            history_capacity: 28_800,
            read_lock_timeout_secs: 5,
        }
    }
}
