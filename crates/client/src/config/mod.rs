// Runtime client configuration, handed over from JS as a plain object
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// `ws://host:port/path`, or a bare `host:port` (scheme follows the page).
    pub server_url: String,
    pub canvas_id: String,
    /// One of `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "localhost:8000".to_string(),
            canvas_id: "gameCanvas".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Decode from a JS object. `undefined`/`null` yield the defaults.
    pub fn from_js(value: JsValue) -> Result<Self, JsValue> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value).map_err(Into::into)
    }

    pub fn level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}
