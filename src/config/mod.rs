/// Configuration system for ozon-dash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::DashConfig::default()`]
/// 2. **User global config**: `~/.ozon-dash/config.toml`
/// 3. **Project local config**: `.ozon-dash.toml` in the current directory
/// 4. **Environment variables**: `OZON_DASH_*` overrides (highest precedence)
///
/// Malformed files are ignored so a broken config never keeps the dashboard
/// from starting.
///
/// # Usage
///
/// ```rust,ignore
/// use ozon_dash::config;
///
/// let cfg = config::load();
/// let url = cfg.api.resolved_base_url();
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::models::Period;

pub use schema::DashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env vars.
pub fn load() -> DashConfig {
    let mut config = load_layers(global_config_path(), project_config_path());
    apply_env_overrides(&mut config);
    config
}

/// Merge the file layers over the defaults, key by key.
///
/// A layer only overrides the keys it sets. A file that does not parse, or
/// whose values do not fit the schema, is skipped as a whole.
fn load_layers(global: Option<PathBuf>, project: Option<PathBuf>) -> DashConfig {
    let mut merged = toml::Table::new();
    for layer in [global, project].into_iter().filter_map(load_toml_layer) {
        merge_tables(&mut merged, layer);
    }

    toml::Value::Table(merged).try_into().unwrap_or_default()
}

/// Read a TOML config file as a raw table (if it exists and fits the schema).
fn load_toml_layer(path: Option<PathBuf>) -> Option<toml::Table> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    let table: toml::Table = toml::from_str(&content).ok()?;
    let _: DashConfig = toml::Value::Table(table.clone()).try_into().ok()?;
    Some(table)
}

/// Recursively merge `overlay` into `base`; overlay values win.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(over) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, over);
                } else {
                    base.insert(key, toml::Value::Table(over));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.ozon-dash/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ozon-dash").join("config.toml"))
}

/// Path to the project local config: `.ozon-dash.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".ozon-dash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `OZON_DASH_ENV`: `production` or `development`
/// - `OZON_DASH_API_URL`: explicit backend URL
/// - `OZON_DASH_API_TIMEOUT_MS`: request timeout
/// - `OZON_DASH_PERIOD`: default period (`day`, `week`, `month`, `year`)
/// - `OZON_DASH_PAGE_SIZE`: products per page
/// - `OZON_DASH_PROBE_INTERVAL_SECS`: liveness probe interval
/// - `OZON_DASH_MARGIN_THRESHOLD`: low-margin threshold in percent
/// - `OZON_DASH_WEB_BIND`: web dashboard bind address
/// - `OZON_DASH_LOGGING`: event log switch (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut DashConfig) {
    if let Ok(val) = std::env::var("OZON_DASH_ENV")
        && let Some(env) = parse_environment(&val)
    {
        config.api.environment = env;
    }
    if let Ok(val) = std::env::var("OZON_DASH_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("OZON_DASH_API_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }

    if let Ok(val) = std::env::var("OZON_DASH_PERIOD")
        && let Some(period) = Period::parse(&val)
    {
        config.dashboard.default_period = period;
    }
    if let Ok(val) = std::env::var("OZON_DASH_PAGE_SIZE")
        && let Ok(size) = val.parse::<u32>()
        && size > 0
    {
        config.dashboard.page_size = size;
    }
    if let Ok(val) = std::env::var("OZON_DASH_PROBE_INTERVAL_SECS")
        && let Ok(secs) = val.parse::<u64>()
    {
        config.dashboard.probe_interval_secs = secs;
    }
    if let Ok(val) = std::env::var("OZON_DASH_MARGIN_THRESHOLD")
        && let Ok(pct) = val.parse::<f64>()
    {
        config.dashboard.margin_threshold = pct;
    }

    if let Ok(val) = std::env::var("OZON_DASH_WEB_BIND")
        && !val.is_empty()
    {
        config.web.bind = val;
    }
    if let Ok(val) = std::env::var("OZON_DASH_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_environment(val: &str) -> Option<schema::Environment> {
    match val.to_ascii_lowercase().as_str() {
        "production" | "prod" => Some(schema::Environment::Production),
        "development" | "dev" => Some(schema::Environment::Development),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.ozon-dash/config.toml`.
///
/// Returns an error if the file already exists unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.ozon-dash/ directory")?;
    }

    fs::write(&path, DashConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key in the global config file.
///
/// Supports dotted keys like `dashboard.page_size`. Keys missing from the
/// file are filled in from the defaults before the update.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let current: DashConfig = if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config file")?
    } else {
        DashConfig::default()
    };

    let toml_str = toml::to_string_pretty(&current).context("failed to serialize config")?;
    let mut value_table: toml::Value =
        toml::from_str(&toml_str).context("failed to parse serialized config")?;

    set_toml_value(&mut value_table, key, value)?;

    // Validate the result against the schema before writing it.
    let output =
        toml::to_string_pretty(&value_table).context("failed to serialize updated config")?;
    let _: DashConfig = toml::from_str(&output)
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key: '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("'{key}' is a section, not a value"),
        None => anyhow::bail!("unknown config key: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
