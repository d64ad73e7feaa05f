//! # Settings
//!
//! Layered configuration, later sources win:
//!
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `config/local.toml` (optional, not committed)
//! 4. `BOARD__*` environment variables, e.g. `BOARD__BACKEND__BASE_URL`
//!
//! The binary loads `.env` with `dotenvy` before calling [`Settings::load`],
//! so values from it land in step 4.

use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] ConfigError),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Root of the REST API, including the `/api` prefix.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001/api".to_string(),
            timeout_secs: 15,
        }
    }
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub secure_cookies: bool,
    /// Visitors idle for longer start over as a fresh client session.
    pub idle_minutes: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "board-session".to_string(),
            secure_cookies: false,
            idle_minutes: 60,
        }
    }
}

impl SessionSettings {
    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_minutes.saturating_mul(60))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive; `RUST_LOG` overrides it.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub per_page: u32,
    pub admin_per_page: u32,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            per_page: 20,
            admin_per_page: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub session: SessionSettings,
    pub log: LogSettings,
    pub ui: UiSettings,
}

impl Settings {
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(Path::new("config"))
    }

    /// Reads `default` and `local` from `dir`, then the environment.
    pub fn load_from(dir: &Path) -> Result<Self, SettingsError> {
        debug!(dir = %dir.display(), "loading settings");
        let builder = Config::builder()
            .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false))
            .add_source(File::with_name(&dir.join("local").to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix("BOARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let base_url = self.backend.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(SettingsError::Invalid {
                key: "backend.base_url",
                reason: format!("`{base_url}` is not an http(s) URL"),
            });
        }
        if self.server.port == 0 {
            return Err(SettingsError::Invalid {
                key: "server.port",
                reason: "must not be 0".to_string(),
            });
        }
        if self.backend.timeout_secs == 0 {
            return Err(SettingsError::Invalid {
                key: "backend.timeout_secs",
                reason: "must not be 0".to_string(),
            });
        }
        if self.session.idle_minutes == 0 {
            return Err(SettingsError::Invalid {
                key: "session.idle_minutes",
                reason: "must not be 0".to_string(),
            });
        }
        for (key, value) in [
            ("ui.per_page", self.ui.per_page),
            ("ui.admin_per_page", self.ui.admin_per_page),
        ] {
            if value == 0 {
                return Err(SettingsError::Invalid {
                    key,
                    reason: "must not be 0".to_string(),
                });
            }
        }
        Ok(())
    }
}
