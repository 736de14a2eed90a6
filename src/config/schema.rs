/// Configuration schema and defaults for ozon-dash.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[api]`, `[dashboard]`, `[web]` and `[logging]`. Every field has a
/// built-in default; users only set what they want to override.
use serde::{Deserialize, Serialize};

use crate::models::Period;

/// Backend URL used in production.
pub const PRODUCTION_API_URL: &str = "https://ozon-bot-api.onrender.com";

/// Backend URL used during local development.
pub const DEVELOPMENT_API_URL: &str = "http://localhost:8000";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level ozon-dash configuration.
///
/// Maps to `~/.ozon-dash/config.toml` and `.ozon-dash.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub api: ApiConfig,
    pub dashboard: DashboardConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Which backend deployment to talk to when no explicit URL is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Development => write!(f, "development"),
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// `production` or `development`; picks the base URL when `base_url` is empty.
    pub environment: Environment,
    /// Explicit backend URL. Overrides `environment` when non-empty.
    pub base_url: String,
    /// Timeout for regular requests, in milliseconds.
    pub timeout_ms: u64,
    /// Timeout for the liveness probe, in milliseconds.
    pub probe_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            base_url: String::new(),
            timeout_ms: 15_000,
            probe_timeout_ms: 5_000,
        }
    }
}

impl ApiConfig {
    /// The effective backend URL, without a trailing slash.
    pub fn resolved_base_url(&self) -> String {
        let url = if self.base_url.trim().is_empty() {
            match self.environment {
                Environment::Production => PRODUCTION_API_URL,
                Environment::Development => DEVELOPMENT_API_URL,
            }
        } else {
            self.base_url.trim()
        };
        url.trim_end_matches('/').to_string()
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Dashboard behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Period selected on startup.
    pub default_period: Period,
    /// Products per page for client-side pagination.
    pub page_size: u32,
    /// Seconds between background liveness probes.
    pub probe_interval_secs: u64,
    /// Margin (percent) below which products are flagged as low-margin.
    pub margin_threshold: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_period: Period::Month,
            page_size: 20,
            probe_interval_secs: 30,
            margin_threshold: 15.0,
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Embedded web dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Address the dashboard server binds to.
    pub bind: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Event log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether the JSONL event log is written.
    pub enabled: bool,
    /// Path to the event log. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.ozon-dash/events.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl DashConfig {
    /// Annotated default config written by `ozon-dash config init`.
    pub fn default_toml() -> String {
        r#"# ozon-dash configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (OZON_DASH_*)
#   2. Project config (.ozon-dash.toml in current directory)
#   3. User global config (~/.ozon-dash/config.toml)
#   4. Built-in defaults

[api]
environment = "production"  # production | development
base_url = ""               # overrides environment when set
timeout_ms = 15000
probe_timeout_ms = 5000

[dashboard]
default_period = "month"    # day | week | month | year
page_size = 20              # 10 | 20 | 50 | 100
probe_interval_secs = 30
margin_threshold = 15.0     # percent; lower margins are flagged

[web]
bind = "127.0.0.1:9747"
open_browser = true

[logging]
enabled = true
path = "~/.ozon-dash/events.jsonl"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_back() {
        let config: DashConfig = toml::from_str(&DashConfig::default_toml()).unwrap();
        assert_eq!(config.api.environment, Environment::Production);
        assert_eq!(config.dashboard.page_size, 20);
        assert_eq!(config.dashboard.default_period, Period::Month);
        assert!(config.logging.enabled);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: DashConfig = toml::from_str(
            r#"
[dashboard]
margin_threshold = 20.0
"#,
        )
        .unwrap();
        assert_eq!(config.dashboard.margin_threshold, 20.0);
        assert_eq!(config.dashboard.probe_interval_secs, 30);
        assert_eq!(config.web.bind, "127.0.0.1:9747");
    }

    #[test]
    fn base_url_follows_environment() {
        let mut api = ApiConfig::default();
        assert_eq!(api.resolved_base_url(), PRODUCTION_API_URL);
        api.environment = Environment::Development;
        assert_eq!(api.resolved_base_url(), DEVELOPMENT_API_URL);
        api.base_url = "http://example.test:9000/".to_string();
        assert_eq!(api.resolved_base_url(), "http://example.test:9000");
    }

    #[test]
    fn environment_display() {
        assert_eq!(Environment::Production.to_string(), "production");
        assert_eq!(Environment::Development.to_string(), "development");
    }
}
