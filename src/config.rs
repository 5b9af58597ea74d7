//! Configuration types for tickshift

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub replay: ReplayConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub telemetry: TelemetryConfig,
}

/// WebSocket server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the replay server listens on
    pub bind: String,
}

/// Historical dataset configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayConfig {
    /// Parquet dataset streamed to clients; missing file switches the
    /// server to synthetic bars
    pub data_path: PathBuf,
    /// Symbol attached to every outbound tick
    pub symbol: String,
    /// Interval covered by one bar, used by the synthetic fallback
    #[serde(default = "default_bar_interval_secs")]
    pub bar_interval_secs: u64,
}

/// Per-session streaming parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Ticks synthesized per bar
    #[serde(default = "default_ticks_per_bar")]
    pub ticks_per_bar: usize,

    /// Ticks per outbound batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Inter-batch delay at speed 1.0 (milliseconds)
    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,

    /// Bounded command-poll window (milliseconds); kept an order of
    /// magnitude below the inter-batch delay so commands are never starved
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Sleep between cycles while the session is idle (milliseconds)
    #[serde(default = "default_idle_wait_ms")]
    pub idle_wait_ms: u64,

    /// Floor applied to the client speed multiplier
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,
}

fn default_bar_interval_secs() -> u64 {
    60
}
fn default_ticks_per_bar() -> usize {
    60
}
fn default_batch_size() -> usize {
    10
}
fn default_base_interval_ms() -> u64 {
    1000
}
fn default_poll_timeout_ms() -> u64 {
    25
}
fn default_idle_wait_ms() -> u64 {
    200
}
fn default_min_speed() -> f64 {
    0.1
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ticks_per_bar: 60,
            batch_size: 10,
            base_interval_ms: 1000,
            poll_timeout_ms: 25,
            idle_wait_ms: 200,
            min_speed: 0.1,
        }
    }
}

impl SessionConfig {
    /// Command-poll window as a [`Duration`]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Idle sleep as a [`Duration`]
    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }
}

/// Trade log configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Write closed trades to Parquet; disabled keeps them in memory only
    #[serde(default = "default_store_enabled")]
    pub enabled: bool,

    /// Output directory for trade log files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Buffered records before a flush
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Maximum time between flushes (seconds)
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

fn default_store_enabled() -> bool {
    true
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./trades")
}
fn default_buffer_size() -> usize {
    64
}
fn default_flush_interval_secs() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: PathBuf::from("./trades"),
            buffer_size: 64,
            flush_interval_secs: 30,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Prometheus exporter port; metrics are disabled when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
