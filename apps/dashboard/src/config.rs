//! Dashboard configuration.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/sensorboard/dashboard.toml`
//! - Windows: `%APPDATA%/sensorboard/dashboard.toml`
//!
//! A path given on the command line takes precedence. Every field has a
//! default, so a missing file or a partial one is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use sensorboard_consumers::ChannelSpec;
use sensorboard_history::DEFAULT_CAPACITY;
use sensorboard_protocol::constants::{DEFAULT_BROKER_PORT, DEFAULT_TOPICS};

/// rumqttc rejects keep-alive intervals shorter than this.
const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// Dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub broker: BrokerConfig,
    pub channels: Vec<ChannelConfig>,
    pub history: HistoryConfig,
    pub render: RenderConfig,
    pub report: ReportConfig,
}

/// MQTT broker connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// Empty means connect without credentials.
    pub username: String,
    pub password: String,
    /// Empty means `sensorboard-<hostname>-<random>`.
    pub client_id: String,
    pub keep_alive_secs: u64,
}

/// A subscribed topic and how to present its channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub topic: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Samples kept per channel.
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    /// Sparkline width in columns.
    pub width: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub interval_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let [temperature, humidity] = DEFAULT_TOPICS;
        Self {
            broker: BrokerConfig::default(),
            channels: vec![
                ChannelConfig {
                    topic: temperature.into(),
                    label: "Temperature".into(),
                    unit: "°C".into(),
                },
                ChannelConfig {
                    topic: humidity.into(),
                    label: "Humidity".into(),
                    unit: "%".into(),
                },
            ],
            history: HistoryConfig::default(),
            render: RenderConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: DEFAULT_BROKER_PORT,
            username: String::new(),
            password: String::new(),
            client_id: String::new(),
            keep_alive_secs: 60,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 1000,
            width: 60,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

impl DashboardConfig {
    /// Loads and validates configuration.
    ///
    /// An explicit `path` must exist. Without one, the platform config file is
    /// used if present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => Self::read(path)?,
            None => {
                let path = config_path()?;
                if path.exists() {
                    Self::read(&path)?
                } else {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: DashboardConfig =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Rejects values the core cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.history.capacity == 0 {
            bail!("history.capacity must be > 0");
        }
        if self.render.interval_ms == 0 || self.report.interval_ms == 0 {
            bail!("render.interval_ms and report.interval_ms must be > 0");
        }
        if self.broker.keep_alive_secs < MIN_KEEP_ALIVE_SECS {
            bail!("broker.keep_alive_secs must be at least {MIN_KEEP_ALIVE_SECS}");
        }
        if self.channels.is_empty() {
            bail!("at least one [[channels]] entry is required");
        }
        self.channel_specs().map(|_| ())
    }

    /// Topics to subscribe to, in configuration order.
    pub fn topics(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.topic.clone()).collect()
    }

    /// Display metadata for the tracked channels.
    pub fn channel_specs(&self) -> anyhow::Result<Vec<ChannelSpec>> {
        self.channels
            .iter()
            .map(|c| {
                ChannelSpec::from_topic(&c.topic, &c.label, &c.unit)
                    .with_context(|| format!("channel topic {:?}", c.topic))
            })
            .collect()
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render.interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report.interval_ms)
    }
}

impl BrokerConfig {
    /// The configured client id, or a generated one unique to this process.
    pub fn client_id(&self) -> String {
        if !self.client_id.is_empty() {
            return self.client_id.clone();
        }
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".into());
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("sensorboard-{host}-{}", &suffix[..8])
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("sensorboard")
            .join("dashboard.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata)
            .join("sensorboard")
            .join("dashboard.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/sensorboard/dashboard.toml"))
    }
}
