//! Client configuration.
//!
//! Loaded from TOML. Every section is optional; missing fields take the
//! defaults below.
//!
//! ```toml
//! api_base_url = "https://studybuddy.example/api"
//! socket_url = "wss://studybuddy.example/ws"
//! auth_token = "..."
//! log_level = "debug"
//!
//! [viewer]
//! id = "42"
//! first_name = "Ann"
//! last_name = "Lee"
//!
//! [chat]
//! optimistic_send = false
//! display_offset_minutes = 120
//! tick_interval_ms = 100
//!
//! [reconnect]
//! max_attempts = 5
//! base_delay_ms = 1000
//! ```

use std::{path::Path, time::Duration};

use reqwest::Url;
use serde::Deserialize;
use studybuddy_app::{ChatConfig, DEFAULT_TICK_INTERVAL, Viewer};
use studybuddy_core::{
    ReconnectPolicy,
    connection::{DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_BASE_DELAY},
};

use crate::error::ConfigError;

/// Default REST base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

/// Default WebSocket URL.
pub const DEFAULT_SOCKET_URL: &str = "ws://localhost:3000";

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL the REST paths are appended to.
    pub api_base_url: String,
    /// WebSocket endpoint.
    pub socket_url: String,
    /// Bearer token for both REST and the socket.
    pub auth_token: String,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// The signed-in user.
    pub viewer: ViewerConfig,
    /// Chat session tuning.
    pub chat: ChatSection,
    /// Reconnect backoff.
    pub reconnect: ReconnectSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            auth_token: String::new(),
            log_level: "info".to_string(),
            viewer: ViewerConfig::default(),
            chat: ChatSection::default(),
            reconnect: ReconnectSection::default(),
        }
    }
}

/// `[viewer]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// User identifier.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// `[chat]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatSection {
    /// See [`ChatConfig::optimistic_send`].
    pub optimistic_send: bool,
    /// See [`ChatConfig::display_offset_minutes`].
    pub display_offset_minutes: i32,
    /// Runtime tick interval in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            optimistic_send: false,
            display_offset_minutes: 0,
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
        }
    }
}

/// `[reconnect]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconnectSection {
    /// Automatic attempts between manual connects.
    pub max_attempts: u32,
    /// Delay unit in milliseconds; attempt N waits N units.
    pub base_delay_ms: u64,
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            base_delay_ms: DEFAULT_RECONNECT_BASE_DELAY.as_millis() as u64,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check that both endpoints parse with the expected schemes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let api = parse_url("api_base_url", &self.api_base_url)?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "api_base_url must be http(s), got {}",
                api.scheme()
            )));
        }
        if api.cannot_be_a_base() {
            return Err(ConfigError::Invalid("api_base_url cannot take a path".into()));
        }

        let socket = parse_url("socket_url", &self.socket_url)?;
        if !matches!(socket.scheme(), "ws" | "wss") {
            return Err(ConfigError::Invalid(format!(
                "socket_url must be ws(s), got {}",
                socket.scheme()
            )));
        }

        if self.chat.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        Ok(())
    }

    /// Session configuration for the runtime.
    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            optimistic_send: self.chat.optimistic_send,
            display_offset_minutes: self.chat.display_offset_minutes,
            tick_interval: Duration::from_millis(self.chat.tick_interval_ms),
            reconnect: self.reconnect_policy(),
        }
    }

    /// Reconnect backoff.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.reconnect.max_attempts,
            base_delay: Duration::from_millis(self.reconnect.base_delay_ms),
        }
    }

    /// The signed-in user.
    pub fn viewer(&self) -> Viewer {
        Viewer::new(
            self.viewer.id.as_str(),
            self.viewer.first_name.as_str(),
            self.viewer.last_name.as_str(),
        )
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Invalid(format!("{field}: {e}")))
}
