use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Fixed hold window; every hold ends exactly this long after creation.
    #[serde(default = "default_hold_minutes")]
    pub hold_minutes: i64,
    /// Polling cadence for the refresh loop, bounding worst-case staleness
    /// when the push channel is degraded.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_hold_minutes() -> i64 {
    cyclemart_domain::DEFAULT_HOLD_MINUTES
}

fn default_refresh_interval() -> u64 {
    12
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Then the per-environment file, which is optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Finally environment variables, e.g. CYCLEMART__SERVER__PORT=9000
            .add_source(config::Environment::with_prefix("CYCLEMART").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
