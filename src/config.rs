//! Configuration management
//!
//! Handles loading and validating pool configuration from TOML files.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

use crate::registry::MAX_SHARDS;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

/// Pool registry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Number of registry shards (0 = auto)
    #[serde(default)]
    pub shards: usize,
    /// Free-list bound for objects pooled through the default mode
    #[serde(default = "default_object_capacity")]
    pub object_capacity: usize,
    /// Byte slab settings
    #[serde(default)]
    pub slab: SlabConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            shards: 0,
            object_capacity: default_object_capacity(),
            slab: SlabConfig::default(),
        }
    }
}

impl PoolConfig {
    /// Get effective shard count (auto-detect if 0), capped at [`MAX_SHARDS`]
    pub fn effective_shards(&self) -> usize {
        let wanted = if self.shards == 0 {
            num_cpus::get()
        } else {
            self.shards
        };
        wanted.clamp(1, MAX_SHARDS)
    }
}

/// Size-classed byte slab configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SlabConfig {
    /// log2 of the smallest pooled capacity
    #[serde(default = "default_min_shift")]
    pub min_shift: u32,
    /// log2 of the largest pooled capacity
    #[serde(default = "default_max_shift")]
    pub max_shift: u32,
    /// Maximum free buffers retained per size class.
    ///
    /// Each free-list reserves its slots up front: about 32 bytes per slot,
    /// per size class, per shard. The default of 1024 with 13 classes is
    /// roughly 416 KiB for each shard that resolves the byte pool.
    #[serde(default = "default_slot_capacity")]
    pub slot_capacity: usize,
}

impl Default for SlabConfig {
    fn default() -> Self {
        Self {
            min_shift: default_min_shift(),
            max_shift: default_max_shift(),
            slot_capacity: default_slot_capacity(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics endpoint
    #[serde(default)]
    pub enabled: bool,
    /// Metrics server bind address
    #[serde(default = "default_metrics_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_addr: default_metrics_addr(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Synthetic request driver configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    /// Number of concurrent request handlers (0 = auto)
    #[serde(default)]
    pub workers: usize,
    /// Requests each handler runs before exiting
    #[serde(default = "default_requests_per_worker")]
    pub requests_per_worker: usize,
    /// Body size written per request
    #[serde(default = "default_payload_size")]
    pub payload_size: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            requests_per_worker: default_requests_per_worker(),
            payload_size: default_payload_size(),
        }
    }
}

impl DriverConfig {
    /// Get effective worker count (auto-detect if 0)
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}

// Default value functions
fn default_object_capacity() -> usize { 1024 }
fn default_min_shift() -> u32 { 3 }
fn default_max_shift() -> u32 { 15 }
fn default_slot_capacity() -> usize { 1024 }
fn default_metrics_addr() -> SocketAddr { SocketAddr::from(([127, 0, 0, 1], 9090)) }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }
fn default_requests_per_worker() -> usize { 10_000 }
fn default_payload_size() -> usize { 512 }

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .with_context(|| "Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let slab = &self.pool.slab;
        if slab.min_shift > slab.max_shift {
            anyhow::bail!("slab.min_shift must be <= slab.max_shift");
        }
        if slab.max_shift >= 32 {
            anyhow::bail!("slab.max_shift must be < 32");
        }
        if slab.slot_capacity == 0 {
            anyhow::bail!("slab.slot_capacity must be > 0");
        }
        if self.pool.object_capacity == 0 {
            anyhow::bail!("object_capacity must be > 0");
        }
        if self.driver.requests_per_worker == 0 {
            anyhow::bail!("requests_per_worker must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.pool.slab.min_shift, 3);
        assert_eq!(config.pool.slab.max_shift, 15);
        assert_eq!(config.pool.object_capacity, 1024);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_effective_shards_capped() {
        let mut pool = PoolConfig::default();
        assert!(pool.effective_shards() >= 1);
        assert!(pool.effective_shards() <= MAX_SHARDS);

        pool.shards = 1000;
        assert_eq!(pool.effective_shards(), MAX_SHARDS);

        pool.shards = 4;
        assert_eq!(pool.effective_shards(), 4);
    }

    #[test]
    fn test_parse_overrides() {
        let config = Config::parse(
            r#"
            [pool]
            shards = 2

            [pool.slab]
            min_shift = 4
            max_shift = 10

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.pool.shards, 2);
        assert_eq!(config.pool.slab.min_shift, 4);
        assert_eq!(config.pool.slab.slot_capacity, 1024);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_inverted_shifts_rejected() {
        let err = Config::parse("[pool.slab]\nmin_shift = 9\nmax_shift = 4\n").unwrap_err();
        assert!(err.to_string().contains("min_shift"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(Config::parse("[pool]\nobject_capacity = 0\n").is_err());
        assert!(Config::parse("[pool.slab]\nslot_capacity = 0\n").is_err());
    }
}
