/// Configuration schema and defaults for gridcast.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[predictor]`, `[storage]`, `[session]`, `[export]`, `[logging]`, and
/// `[web]`.
///
/// Every field has a built-in default. Users only need to set the values they
/// want to override.
use serde::{Deserialize, Serialize};

use crate::session::DEFAULT_LOGIN_DELAY_MS;

/// Default prediction service endpoint.
pub const DEFAULT_PREDICTOR_URL: &str = "https://your-python-api.onrender.com/predict";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level gridcast configuration.
///
/// Maps to `~/.gridcast/config.toml` and `.gridcast.toml`. All sections and
/// fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridcastConfig {
    pub predictor: PredictorConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
    pub web: WebConfig,
}

// ---------------------------------------------------------------------------
// [predictor]
// ---------------------------------------------------------------------------

/// External prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Full URL that receives the `POST` with the project parameters.
    pub url: String,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PREDICTOR_URL.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [storage]
// ---------------------------------------------------------------------------

/// Local key-value store holding the session and the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for record files. `~` is expanded to the home directory.
    pub dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: "~/.gridcast/store".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [session]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Simulated login latency (milliseconds).
    pub login_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_delay_ms: DEFAULT_LOGIN_DELAY_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// [export]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory where forecast reports are written.
    pub dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether event logging is enabled.
    pub enabled: bool,
    /// Path to the event log file. `~` is expanded to the home directory.
    pub path: String,
    /// Log level: `"debug"`, `"info"`, `"warn"`, `"error"`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.gridcast/events.jsonl".to_string(),
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for `gridcast web`.
    pub addr: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML
// ---------------------------------------------------------------------------

impl GridcastConfig {
    /// Annotated default config written by `gridcast config init`.
    pub fn default_toml() -> String {
        format!(
            r#"# gridcast configuration
#
# Precedence: built-in defaults < ~/.gridcast/config.toml < .gridcast.toml
# < GRIDCAST_* environment variables.

[predictor]
# Endpoint receiving POST {{budget, location, tower_type, substation_type}}
url = "{DEFAULT_PREDICTOR_URL}"

[storage]
# Directory holding the session and prediction history records
dir = "~/.gridcast/store"

[session]
# Simulated login latency in milliseconds
login_delay_ms = {DEFAULT_LOGIN_DELAY_MS}

[export]
# Where `gridcast export` writes forecast reports
dir = "."

[logging]
enabled = true
path = "~/.gridcast/events.jsonl"
# debug | info | warn | error
level = "info"

[web]
addr = "127.0.0.1:9747"
"#
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
