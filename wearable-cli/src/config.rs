//! Layered TOML configuration: compiled-in defaults merged with a user file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use wearable_core::ReadingMode;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WearableConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for WearableConfig {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("default wearable config to parse")
    }
}

impl WearableConfig {
    pub fn merge(&mut self, other: &Self) {
        self.server.merge(&other.server);
        self.notifier.merge(&other.notifier);
        self.telemetry.merge(&other.telemetry);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl ServerConfig {
    fn merge(&mut self, other: &Self) {
        if !other.listen_addr.is_empty() {
            self.listen_addr.clone_from(&other.listen_addr);
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:50051".to_string(),
        }
    }
}

/// Where and how alerts are delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Push-sender address, `host:port` or a full `http://` URI.
    pub endpoint: String,
    /// Recipient identifier attached to every alert.
    pub target_id: String,
    pub message: String,
    /// Per-call deadline; unset means the call blocks until the transport gives up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

impl NotifierConfig {
    fn merge(&mut self, other: &Self) {
        if !other.endpoint.is_empty() {
            self.endpoint.clone_from(&other.endpoint);
        }
        if !other.target_id.is_empty() {
            self.target_id.clone_from(&other.target_id);
        }
        if !other.message.is_empty() {
            self.message.clone_from(&other.message);
        }
        if other.request_timeout_ms.is_some() {
            self.request_timeout_ms = other.request_timeout_ms;
        }
    }

    /// Endpoint as a URI tonic can dial.
    #[must_use]
    pub fn endpoint_uri(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("http://{}", self.endpoint)
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://push-sender:51126".to_string(),
            target_id: "some_uuid".to_string(),
            message: wearable_core::DEFAULT_ALERT_TEXT.to_string(),
            request_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub reading_mode: ReadingMode,
    /// Minimum spacing between alerts within one stream. Unset sends every alert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_cooldown_ms: Option<u64>,
    /// Fixed RNG seed for reproducible streams.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl TelemetryConfig {
    fn merge(&mut self, other: &Self) {
        self.reading_mode = other.reading_mode;
        if other.alert_cooldown_ms.is_some() {
            self.alert_cooldown_ms = other.alert_cooldown_ms;
        }
        if other.seed.is_some() {
            self.seed = other.seed;
        }
    }

    #[must_use]
    pub fn alert_cooldown(&self) -> Option<Duration> {
        self.alert_cooldown_ms.map(Duration::from_millis)
    }
}

pub struct ConfigManager {
    path: PathBuf,
    config: WearableConfig,
}

impl ConfigManager {
    pub fn load() -> Result<Self> {
        let path = default_config_path()?;
        Self::load_with_path(path)
    }

    pub fn load_with_path<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let mut config = WearableConfig::default();

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config at {}", path.display()))?;
            let user_config: WearableConfig = toml::from_str(&contents)
                .with_context(|| format!("invalid config at {}", path.display()))?;
            config.merge(&user_config);
        }

        Ok(Self { path, config })
    }

    #[must_use]
    pub const fn config(&self) -> &WearableConfig {
        &self.config
    }

    pub const fn config_mut(&mut self) -> &mut WearableConfig {
        &mut self.config
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory {}", parent.display())
            })?;
        }
        let toml = toml::to_string_pretty(&self.config)?;
        fs::write(&self.path, toml)
            .with_context(|| format!("failed to write config to {}", self.path.display()))?;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let config = &self.config;
        match key {
            "server.listen_addr" => Some(config.server.listen_addr.clone()),
            "notifier.endpoint" => Some(config.notifier.endpoint.clone()),
            "notifier.target_id" => Some(config.notifier.target_id.clone()),
            "notifier.message" => Some(config.notifier.message.clone()),
            "notifier.request_timeout_ms" => Some(format_optional(config.notifier.request_timeout_ms)),
            "telemetry.reading_mode" => Some(format_reading_mode(config.telemetry.reading_mode)),
            "telemetry.alert_cooldown_ms" => {
                Some(format_optional(config.telemetry.alert_cooldown_ms))
            }
            "telemetry.seed" => Some(format_optional(config.telemetry.seed)),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let config = &mut self.config;
        match key {
            "server.listen_addr" => config.server.listen_addr = non_empty(key, value)?,
            "notifier.endpoint" => config.notifier.endpoint = non_empty(key, value)?,
            "notifier.target_id" => config.notifier.target_id = non_empty(key, value)?,
            "notifier.message" => config.notifier.message = non_empty(key, value)?,
            "notifier.request_timeout_ms" => {
                config.notifier.request_timeout_ms = parse_optional(value)?;
            }
            "telemetry.reading_mode" => {
                config.telemetry.reading_mode = parse_reading_mode(value)?;
            }
            "telemetry.alert_cooldown_ms" => {
                config.telemetry.alert_cooldown_ms = parse_optional(value)?;
            }
            "telemetry.seed" => config.telemetry.seed = parse_optional(value)?,
            _ => return Err(anyhow!("unknown configuration key: {key}")),
        }
        Ok(())
    }
}

/// Every key accepted by [`ConfigManager::get`] and [`ConfigManager::set`].
pub const CONFIG_KEYS: &[&str] = &[
    "server.listen_addr",
    "notifier.endpoint",
    "notifier.target_id",
    "notifier.message",
    "notifier.request_timeout_ms",
    "telemetry.reading_mode",
    "telemetry.alert_cooldown_ms",
    "telemetry.seed",
];

fn non_empty(key: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn parse_optional(value: &str) -> Result<Option<u64>> {
    match value.trim().to_lowercase().as_str() {
        "" | "none" | "off" => Ok(None),
        other => other
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("expected a non-negative integer or 'none', received '{value}'")),
    }
}

fn parse_reading_mode(value: &str) -> Result<ReadingMode> {
    match value.trim().to_lowercase().as_str() {
        "independent" => Ok(ReadingMode::Independent),
        "shared" => Ok(ReadingMode::Shared),
        _ => Err(anyhow!(
            "expected 'independent' or 'shared', received '{value}'"
        )),
    }
}

fn format_reading_mode(mode: ReadingMode) -> String {
    match mode {
        ReadingMode::Independent => "independent".to_string(),
        ReadingMode::Shared => "shared".to_string(),
    }
}

fn format_optional(value: Option<u64>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}

fn default_config_path() -> Result<PathBuf> {
    let base =
        dirs::config_dir().ok_or_else(|| anyhow!("unable to determine configuration directory"))?;
    Ok(base.join("wearable").join("config.toml"))
}

#[must_use]
pub fn format_sections(manager: &ConfigManager) -> Vec<String> {
    let mut lines = Vec::new();
    let mut section = "";
    for &key in CONFIG_KEYS {
        let (prefix, field) = key.split_once('.').unwrap_or(("", key));
        if prefix != section {
            if !section.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("[{prefix}]"));
            section = prefix;
        }
        if let Some(value) = manager.get(key) {
            lines.push(format!("{field}={value}"));
        }
    }
    lines
}
