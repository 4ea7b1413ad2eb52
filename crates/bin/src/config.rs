//! Host configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub const CONFIG_FILE: &str = "host.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HostConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub client: ClientSettings,
}

impl HostConfig {
    /// Load configuration from `host.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Read `path`, writing the defaults there first if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Port to listen on. `PORT` in the environment overrides it.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Handed to the browser client as `/config.json`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClientSettings {
    /// Game server the client connects to (`ws://...` or bare `host:port`).
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_canvas_id")]
    pub canvas_id: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ClientSettings {
    /// The JSON object the client's constructor expects (camelCase keys).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "serverUrl": self.server_url,
            "canvasId": self.canvas_id,
            "logLevel": self.log_level,
        })
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            canvas_id: default_canvas_id(),
            log_level: default_log_level(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_server_url() -> String {
    "localhost:8000".to_string()
}

fn default_canvas_id() -> String {
    "gameCanvas".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
