use crate::application::polling::PollingConfig;
use crate::application::projector::{ChartProjector, DEFAULT_SMOOTHING_WINDOW};
use crate::domain::chart::ColorAssignment;
use crate::domain::range::TimeRange;
use anyhow::{Context, bail};
use chrono::FixedOffset;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

pub const CONFIG_FILE: &str = "config/dashboard";
pub const ENV_PREFIX: &str = "SKOGSNET";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub service: ServiceSettings,
    pub polling: PollingSettings,
    pub chart: ChartSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceSettings {
    pub base_url: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingSettings {
    pub interval_secs: u64,
    pub retry_delay_secs: u64,
    /// Range token, e.g. `24h` or `week`. Empty means the service default.
    pub range: String,
    pub live: bool,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            retry_delay_secs: 5,
            range: TimeRange::Today.token().to_string(),
            live: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartSettings {
    pub smoothing_window: usize,
    pub utc_offset_minutes: i32,
    pub colors: ColorAssignment,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            utc_offset_minutes: 0,
            colors: ColorAssignment::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8090".to_string(),
        }
    }
}

/// Loads `config/dashboard.*` (optional) overlaid with `SKOGSNET__*` variables.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(CONFIG_FILE)
}

pub fn load_settings_from(path: &str) -> anyhow::Result<Settings> {
    let builder = config::Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
    build(builder)
}

fn build(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Settings> {
    let settings: Settings = builder
        .build()
        .context("failed to read dashboard configuration")?
        .try_deserialize()
        .context("invalid dashboard configuration")?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<()> {
        let base_url = self.service.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!(
                "service.base_url must be an http(s) URL, got '{}'",
                self.service.base_url
            );
        }
        if self.polling.interval_secs == 0 {
            bail!("polling.interval_secs must be greater than zero");
        }
        if self.polling.retry_delay_secs == 0 {
            bail!("polling.retry_delay_secs must be greater than zero");
        }
        if self.chart.smoothing_window == 0 {
            bail!("chart.smoothing_window must be at least 1");
        }
        self.initial_range()?;
        self.utc_offset()?;
        self.bind_addr()?;
        Ok(())
    }

    pub fn initial_range(&self) -> anyhow::Result<TimeRange> {
        self.polling
            .range
            .parse()
            .context("polling.range is not a known range")
    }

    pub fn utc_offset(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.chart.utc_offset_minutes.saturating_mul(60)).with_context(|| {
            format!(
                "chart.utc_offset_minutes out of range: {}",
                self.chart.utc_offset_minutes
            )
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("server.bind is not a socket address: '{}'", self.server.bind))
    }

    pub fn polling_config(&self) -> PollingConfig {
        PollingConfig {
            interval: Duration::from_secs(self.polling.interval_secs),
            retry_delay: Duration::from_secs(self.polling.retry_delay_secs),
        }
    }

    pub fn projector(&self) -> anyhow::Result<ChartProjector> {
        Ok(ChartProjector::new(
            self.chart.smoothing_window,
            self.utc_offset()?,
        ))
    }
}
