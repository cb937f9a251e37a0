//! Configuration management for eventline
//!
//! Configuration is loaded from environment variables or a TOML file and
//! validated before any component is built. Every section falls back to its
//! defaults, so a file only needs the values it changes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::consumer::MAX_PERIODICITY;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Windowed consumer configuration
    pub consumer: ConsumerConfig,

    /// Settings shared by every clustering pipeline
    pub clustering: ClusteringConfig,

    /// Reporting of breaking topics
    pub burst: BurstConfig,

    /// ELD pipeline configuration
    pub eld: EldConfig,

    /// FIRE pipeline configuration
    pub fire: FireConfig,

    /// Zhao pipeline configuration
    pub zhao: ZhaoConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Windowed consumer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Close windows on item timestamps instead of wall-clock time
    pub stream_relative: bool,

    /// Seconds without input before ingestion ends; negative waits forever
    pub max_inactivity: f64,

    /// Seconds to wait before starting
    pub wait: f64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            stream_relative: true,
            max_inactivity: 60.0,
            wait: 0.0,
        }
    }
}

/// Settings shared by every clustering pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Keep frozen clusters in memory instead of discarding them
    pub store_frozen: bool,
}

/// Reporting of breaking topics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstConfig {
    /// Representative texts reported per topic
    pub representatives: usize,

    /// Terms reported per topic
    pub max_terms: usize,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            representatives: 3,
            max_terms: 10,
        }
    }
}

/// ELD pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EldConfig {
    /// Window length in seconds
    pub time_window: u64,

    /// Similarity needed to join a cluster
    pub threshold: f64,

    /// Seconds of inactivity before a cluster freezes
    pub freeze_period: f64,

    /// Smallest cluster checked for breaking terms
    pub min_size: usize,

    /// Seconds between two checks of the same cluster
    pub cooldown: f64,

    /// Clusters more cohesive than this are treated as spam
    pub max_intra_similarity: f64,

    /// Windows of history kept and compared against
    pub sets: u32,

    /// Burst a term needs to be breaking
    pub min_burst: f64,

    /// Decay of older windows
    pub decay_rate: f64,
}

impl Default for EldConfig {
    fn default() -> Self {
        Self {
            time_window: 30,
            threshold: 0.5,
            freeze_period: 20.0,
            min_size: 3,
            cooldown: 1.0,
            max_intra_similarity: 0.8,
            sets: 10,
            min_burst: 0.5,
            decay_rate: 0.5,
        }
    }
}

/// FIRE pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireConfig {
    /// Window length in seconds
    pub time_window: u64,

    /// Similarity needed to join a cluster
    pub threshold: f64,

    /// Seconds of inactivity before a cluster freezes
    pub freeze_period: f64,

    /// Smallest cluster checked for bursty terms
    pub min_cluster_size: usize,

    /// Windows of history compared against
    pub sets: u32,

    /// Lowest document quality score kept
    pub score_threshold: f64,
}

impl Default for FireConfig {
    fn default() -> Self {
        Self {
            time_window: 60,
            threshold: 0.7,
            freeze_period: 20.0,
            min_cluster_size: 4,
            sets: 10,
            score_threshold: 1.37,
        }
    }
}

/// Zhao pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZhaoConfig {
    /// Window length in seconds
    pub time_window: u64,

    /// Candidate window sizes in seconds
    pub windows: Vec<i64>,

    /// Volume ratio that signals a burst
    pub post_rate: f64,
}

impl Default for ZhaoConfig {
    fn default() -> Self {
        Self {
            time_window: 60,
            windows: crate::tdt::zhao::DEFAULT_WINDOWS.to_vec(),
            post_rate: crate::tdt::zhao::DEFAULT_POST_RATE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Parse `EVENTLINE_<name>`, falling back to `default` when unset
fn env_or<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let key = format!("EVENTLINE_{name}");
    match std::env::var(&key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value '{value}' for {key}: {e}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let zhao_windows = match std::env::var("EVENTLINE_ZHAO_WINDOWS") {
            Ok(value) => value
                .split(',')
                .map(|w| w.trim().parse::<i64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .with_context(|| format!("Invalid value '{value}' for EVENTLINE_ZHAO_WINDOWS"))?,
            Err(_) => defaults.zhao.windows.clone(),
        };

        Ok(Self {
            consumer: ConsumerConfig {
                stream_relative: env_or("STREAM_RELATIVE", defaults.consumer.stream_relative)?,
                max_inactivity: env_or("MAX_INACTIVITY", defaults.consumer.max_inactivity)?,
                wait: env_or("WAIT", defaults.consumer.wait)?,
            },
            clustering: ClusteringConfig {
                store_frozen: env_or("STORE_FROZEN", defaults.clustering.store_frozen)?,
            },
            burst: BurstConfig {
                representatives: env_or("REPRESENTATIVES", defaults.burst.representatives)?,
                max_terms: env_or("MAX_TERMS", defaults.burst.max_terms)?,
            },
            eld: EldConfig {
                time_window: env_or("ELD_TIME_WINDOW", defaults.eld.time_window)?,
                threshold: env_or("ELD_THRESHOLD", defaults.eld.threshold)?,
                freeze_period: env_or("ELD_FREEZE_PERIOD", defaults.eld.freeze_period)?,
                min_size: env_or("ELD_MIN_SIZE", defaults.eld.min_size)?,
                cooldown: env_or("ELD_COOLDOWN", defaults.eld.cooldown)?,
                max_intra_similarity: env_or(
                    "ELD_MAX_INTRA_SIMILARITY",
                    defaults.eld.max_intra_similarity,
                )?,
                sets: env_or("ELD_SETS", defaults.eld.sets)?,
                min_burst: env_or("ELD_MIN_BURST", defaults.eld.min_burst)?,
                decay_rate: env_or("ELD_DECAY_RATE", defaults.eld.decay_rate)?,
            },
            fire: FireConfig {
                time_window: env_or("FIRE_TIME_WINDOW", defaults.fire.time_window)?,
                threshold: env_or("FIRE_THRESHOLD", defaults.fire.threshold)?,
                freeze_period: env_or("FIRE_FREEZE_PERIOD", defaults.fire.freeze_period)?,
                min_cluster_size: env_or("FIRE_MIN_CLUSTER_SIZE", defaults.fire.min_cluster_size)?,
                sets: env_or("FIRE_SETS", defaults.fire.sets)?,
                score_threshold: env_or("FIRE_SCORE_THRESHOLD", defaults.fire.score_threshold)?,
            },
            zhao: ZhaoConfig {
                time_window: env_or("ZHAO_TIME_WINDOW", defaults.zhao.time_window)?,
                windows: zhao_windows,
                post_rate: env_or("ZHAO_POST_RATE", defaults.zhao.post_rate)?,
            },
            logging: LoggingConfig {
                level: env_or("LOG_LEVEL", defaults.logging.level)?,
                format: env_or("LOG_FORMAT", defaults.logging.format)?,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.consumer.wait < 0.0 || !self.consumer.wait.is_finite() {
            anyhow::bail!("consumer.wait must be a non-negative number of seconds");
        }

        // Negative or infinite values wait for input forever
        if self.consumer.max_inactivity.is_nan() {
            anyhow::bail!("consumer.max_inactivity must be a number of seconds");
        }

        if self.burst.max_terms == 0 {
            anyhow::bail!("burst.max_terms must be greater than 0");
        }

        for (name, window) in [
            ("eld", self.eld.time_window),
            ("fire", self.fire.time_window),
            ("zhao", self.zhao.time_window),
        ] {
            if window == 0 {
                anyhow::bail!("{name}.time_window must be greater than 0");
            }
            if window > MAX_PERIODICITY.as_secs() {
                anyhow::bail!(
                    "{name}.time_window must be at most {} seconds, got {window}",
                    MAX_PERIODICITY.as_secs()
                );
            }
        }

        for (name, threshold) in [("eld", self.eld.threshold), ("fire", self.fire.threshold)] {
            if !(0.0..=1.0).contains(&threshold) {
                anyhow::bail!("{name}.threshold must be between 0 and 1, got {threshold}");
            }
        }

        for (name, period) in [
            ("eld", self.eld.freeze_period),
            ("fire", self.fire.freeze_period),
        ] {
            if period.is_nan() || period < 0.0 {
                anyhow::bail!("{name}.freeze_period must not be negative, got {period}");
            }
        }

        if !(self.eld.decay_rate > 0.0 && self.eld.decay_rate.is_finite()) {
            anyhow::bail!("eld.decay_rate must be positive, got {}", self.eld.decay_rate);
        }

        if !(0.0..=1.0).contains(&self.eld.max_intra_similarity) {
            anyhow::bail!("eld.max_intra_similarity must be between 0 and 1");
        }

        if self.eld.cooldown < 0.0 {
            anyhow::bail!("eld.cooldown must not be negative");
        }

        if self.eld.sets == 0 || self.fire.sets == 0 {
            anyhow::bail!("sets must be greater than 0");
        }

        if !(self.zhao.post_rate > 0.0 && self.zhao.post_rate.is_finite()) {
            anyhow::bail!("zhao.post_rate must be positive, got {}", self.zhao.post_rate);
        }

        if self.zhao.windows.is_empty() {
            anyhow::bail!("zhao.windows must not be empty");
        }

        if let Some(w) = self.zhao.windows.iter().find(|w| **w < 2) {
            anyhow::bail!("zhao.windows must be at least 2 seconds, got {w}");
        }

        if let Some(w) = self.zhao.windows.iter().find(|w| **w % 2 != 0) {
            anyhow::bail!("zhao.windows must be even so both halves are equal, got {w}");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging.format must be 'text' or 'json', got '{}'", self.logging.format);
        }

        Ok(())
    }
}
