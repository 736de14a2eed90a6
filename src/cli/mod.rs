//! CLI command implementations for ozon-dash.
//!
//! Provides subcommand handlers for:
//! - `ozon-dash web`: embedded web dashboard
//! - `ozon-dash products`: product list with cost, margin and ROI
//! - `ozon-dash analytics --period P`: analytics tiles and series
//! - `ozon-dash cost` / `bulk-cost`: set product costs
//! - `ozon-dash login|logout|telegram-login`: session management
//! - `ozon-dash report`: send a report to Telegram
//! - `ozon-dash health`: backend, config and storage status
//! - `ozon-dash theme`: dashboard theme preference
//! - `ozon-dash events`: recent event log entries
//! - `ozon-dash config show|init|set|reset`: configuration management

use std::time::Duration;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::api::ApiClient;
use crate::auth::Credentials;
use crate::charts::{self, ChartKind};
use crate::config::{self, schema::DashConfig};
use crate::events::{Event, EventKind, EventLog};
use crate::metrics::{CostRow, MarginBand};
use crate::models::{AnalyticsSnapshot, Period};
use crate::shell::{Action, CostSync, Dashboard, Tab};
use crate::storage::LocalStorage;
use crate::web;

/// Output format for list commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Dashboard wired to the configured backend, local storage and event log.
pub fn build_dashboard(cfg: &DashConfig) -> Dashboard<ApiClient> {
    let log = EventLog::from_config(&cfg.logging);
    let client = ApiClient::from_config(&cfg.api, log.clone());
    Dashboard::new(client, LocalStorage::open_default(), log, &cfg.dashboard)
}

fn print_notices(dash: &Dashboard<ApiClient>) {
    let state = dash.state();
    if let Some(banner) = &state.banner {
        eprintln!("{}", banner.yellow());
    }
    if let Some(error) = &state.error {
        eprintln!("{}", error.red());
    }
}

// ---------------------------------------------------------------------------
// ozon-dash web
// ---------------------------------------------------------------------------

/// Start the web dashboard.
pub fn run_web(bind: Option<&str>, no_open: bool) -> Result<()> {
    let cfg = config::load();
    let addr = bind.unwrap_or(&cfg.web.bind).to_string();
    let mut dash = build_dashboard(&cfg);
    dash.probe();

    web::serve(
        &addr,
        dash,
        Duration::from_secs(cfg.dashboard.probe_interval_secs.max(1)),
        cfg.web.open_browser && !no_open,
    )
}

// ---------------------------------------------------------------------------
// ozon-dash products
// ---------------------------------------------------------------------------

/// Options for `ozon-dash products`.
#[derive(Debug, Clone, Default)]
pub struct ProductsArgs {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub period: Option<Period>,
}

/// List products with derived profit, margin and ROI.
pub fn run_products(args: &ProductsArgs, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let mut dash = build_dashboard(&cfg);
    if let Some(period) = args.period {
        dash.dispatch(Action::SelectPeriod(period));
    }
    dash.select_tab(Tab::Products);

    if let Some(search) = &args.search {
        dash.products_mut().set_search(search);
    }
    if let Some(category) = &args.category {
        dash.products_mut().set_category(category);
    }
    if let Some(limit) = args.limit {
        dash.set_items_per_page(limit)?;
    }
    if let Some(page) = args.page {
        dash.go_to_page(page)?;
    }
    print_notices(&dash);

    let list = dash.products();
    let visible: Vec<_> = list.current_items().into_iter().cloned().collect();
    let rows = crate::metrics::cost_table(&visible, dash.margin_threshold());

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "items": rows,
                "page": list.current_page(),
                "total_pages": list.total_pages(),
                "info": list.items_info(),
                "demo": dash.state().demo,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => print_cost_rows_csv(&rows),
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No products found.".yellow());
                return Ok(());
            }
            println!("{}", "Products".bold().cyan());
            println!("{}", "=".repeat(96));
            print_cost_rows_table(&rows);
            println!();
            println!(
                "  {}  page {} of {}",
                list.items_info().to_string().dimmed(),
                list.current_page(),
                list.total_pages().max(1)
            );
            let categories = list.categories();
            if !categories.is_empty() {
                println!("  {} {}", "Categories:".dimmed(), categories.join(", "));
            }
        }
    }

    Ok(())
}

fn print_cost_rows_table(rows: &[CostRow]) {
    println!(
        "  {:<14} {:<28} {:>12} {:>12} {:>12} {:>8} {:>8}",
        "Offer", "Name", "Price", "Cost", "Profit", "Margin", "ROI"
    );
    println!("  {}", "-".repeat(94));

    for (i, row) in rows.iter().enumerate() {
        let margin = format!("{:>7.1}%", row.margin);
        let margin = match row.band {
            MarginBand::Low => margin.red(),
            MarginBand::High => margin.green(),
            MarginBand::Normal => margin.normal(),
        };
        let line = format!(
            "  {:<14} {:<28} {:>12} {:>12} {:>12}",
            truncate(&row.offer_id, 14),
            truncate(&row.name, 28),
            format_amount(row.price),
            format_amount(row.cost),
            format_amount(row.profit),
        );
        let line = if i % 2 == 0 {
            line.normal()
        } else {
            line.dimmed()
        };
        println!("{} {} {:>7.1}%", line, margin, row.roi);
    }
}

fn print_cost_rows_csv(rows: &[CostRow]) {
    println!("offer_id,name,price,cost,profit,margin,roi,band");
    for row in rows {
        println!(
            "{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{}",
            csv_field(&row.offer_id),
            csv_field(&row.name),
            row.price,
            row.cost,
            row.profit,
            row.margin,
            row.roi,
            match row.band {
                MarginBand::Low => "low",
                MarginBand::Normal => "normal",
                MarginBand::High => "high",
            }
        );
    }
}

// ---------------------------------------------------------------------------
// ozon-dash analytics
// ---------------------------------------------------------------------------

/// Show analytics tiles and series for a period.
pub fn run_analytics(period: Option<Period>, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let mut dash = build_dashboard(&cfg);
    if let Some(period) = period {
        dash.dispatch(Action::SelectPeriod(period));
    }
    if !dash.state().is_authenticated() && dash.state().api_available {
        println!(
            "{}",
            "Not signed in. Run `ozon-dash telegram-login <user-id>` first.".yellow()
        );
    }
    dash.select_tab(Tab::Analytics);
    print_notices(&dash);

    let state = dash.state();
    let snapshot = &state.analytics;

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "period": state.period,
                "demo": state.demo,
                "analytics": snapshot,
                "cost_table": dash.cost_table(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => {
            println!("metric,value");
            for (name, value) in analytics_tiles(snapshot) {
                println!("{name},{value}");
            }
        }
        OutputFormat::Table => {
            let title = format!("Analytics ({})", state.period);
            println!("{}", title.bold().cyan());
            if state.demo {
                println!("  {}", "demo data".yellow());
            }
            println!("{}", "=".repeat(50));
            for (name, value) in analytics_tiles(snapshot) {
                println!("  {:<20} {}", format!("{name}:").bold(), value);
            }
            for kind in ChartKind::ALL {
                let series = kind.series(snapshot);
                if series.is_empty() {
                    continue;
                }
                println!();
                println!("{}", kind.title().bold().cyan());
                for line in charts::terminal_bars(kind, series, 30) {
                    println!("  {line}");
                }
            }
        }
    }

    Ok(())
}

fn analytics_tiles(s: &AnalyticsSnapshot) -> Vec<(&'static str, String)> {
    vec![
        ("Sales", format!("{} ₽", format_amount(s.sales))),
        ("Profit", format!("{} ₽", format_amount(s.profit))),
        ("Margin", format!("{:.1}%", s.margin)),
        ("ROI", format!("{:.1}%", s.roi)),
        ("Orders", s.orders.to_string()),
        ("Average order", format!("{} ₽", format_amount(s.average_order))),
        (
            "Products",
            format!("{} active / {} total", s.active_products, s.total_products),
        ),
        ("Marketplace fees", format!("{} ₽", format_amount(s.marketplace_fees))),
        ("Advertising", format!("{} ₽", format_amount(s.advertising_costs))),
    ]
}

// ---------------------------------------------------------------------------
// ozon-dash cost | bulk-cost
// ---------------------------------------------------------------------------

/// Set the cost of one product.
pub fn run_cost(offer_id: &str, cost: f64) -> Result<()> {
    if !cost.is_finite() || cost < 0.0 {
        bail!("cost must be a non-negative number");
    }
    let cfg = config::load();
    let mut dash = build_dashboard(&cfg);
    dash.select_tab(Tab::Products);
    ensure_loaded(&dash, &[offer_id.to_string()])?;

    let saved = dash.set_cost(offer_id, cost)?;
    let local_only = !dash.state().api_available;
    print_cost_result(saved, local_only, 1, cost);
    Ok(())
}

/// Set one cost for several products.
pub fn run_bulk_cost(offer_ids: &[String], cost: f64) -> Result<()> {
    if !cost.is_finite() || cost < 0.0 {
        bail!("cost must be a non-negative number");
    }
    let cfg = config::load();
    let mut dash = build_dashboard(&cfg);
    dash.select_tab(Tab::Products);
    ensure_loaded(&dash, offer_ids)?;

    let saved = dash.bulk_set_cost(offer_ids, cost)?;
    let local_only = !dash.state().api_available;
    print_cost_result(saved, local_only, offer_ids.len(), cost);
    Ok(())
}

fn ensure_loaded(dash: &Dashboard<ApiClient>, offer_ids: &[String]) -> Result<()> {
    let products = dash.products().products();
    let missing: Vec<&str> = offer_ids
        .iter()
        .filter(|id| !products.iter().any(|p| &p.offer_id == *id))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        bail!("unknown offer id(s): {}", missing.join(", "));
    }
    Ok(())
}

fn print_cost_result(saved: bool, local_only: bool, count: usize, cost: f64) {
    if !saved {
        println!("{} Cost unchanged", "·".dimmed());
    } else if local_only {
        println!(
            "{} Cost {} set on {} product(s), saved locally only (API server unavailable)",
            "✓".yellow().bold(),
            format_amount(cost),
            count
        );
    } else {
        println!(
            "{} Cost {} set on {} product(s)",
            "✓".green().bold(),
            format_amount(cost),
            count
        );
    }
}

// ---------------------------------------------------------------------------
// ozon-dash login | logout | telegram-login | report
// ---------------------------------------------------------------------------

/// Store credentials entered by hand.
pub fn run_login(credentials: Credentials, api_key: Option<&str>) -> Result<()> {
    if !credentials.is_authenticated() {
        bail!("both --token and --client-id are required");
    }
    let cfg = config::load();
    let mut dash = build_dashboard(&cfg);
    dash.login(credentials, api_key);
    println!(
        "{} Signed in as client {}",
        "✓".green().bold(),
        dash.state().credentials.ozon_client_id.bold()
    );
    Ok(())
}

pub fn run_logout() -> Result<()> {
    let cfg = config::load();
    let mut dash = build_dashboard(&cfg);
    dash.logout();
    println!("{} Signed out", "✓".green().bold());
    Ok(())
}

/// Load tokens the Telegram bot holds for `user_id`.
pub fn run_telegram_login(user_id: u64) -> Result<()> {
    let cfg = config::load();
    let mut dash = build_dashboard(&cfg);
    dash.telegram_login(user_id)
        .with_context(|| format!("telegram login for user {user_id} failed"))?;
    println!(
        "{} Signed in as client {} (telegram user {})",
        "✓".green().bold(),
        dash.state().credentials.ozon_client_id.bold(),
        user_id
    );
    Ok(())
}

/// Send a report to the seller's Telegram chat.
pub fn run_report() -> Result<()> {
    let cfg = config::load();
    let mut dash = build_dashboard(&cfg);
    dash.probe();
    let message = dash.send_report()?;
    println!("{} Report sent: {}", "✓".green().bold(), message);
    Ok(())
}

/// Save every product's current cost, locally and to the backend.
pub fn run_save_costs() -> Result<()> {
    let cfg = config::load();
    let mut dash = build_dashboard(&cfg);
    dash.select_tab(Tab::Products);
    match dash.save_costs()? {
        CostSync::Synced => println!("{} Product costs saved", "✓".green().bold()),
        CostSync::LocalOnly => println!(
            "{} API server unavailable; costs saved locally only",
            "✓".yellow().bold()
        ),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ozon-dash health
// ---------------------------------------------------------------------------

/// Check backend reachability, config, session and storage.
pub fn run_health() -> Result<()> {
    println!("{}", "ozon-dash Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();

    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.ozon-dash/config.toml found"
        } else {
            "not found (run `ozon-dash config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".ozon-dash.toml found"
        } else {
            "none (optional)"
        },
    );

    let mut dash = build_dashboard(&cfg);
    let base_url = cfg.api.resolved_base_url();
    let up = dash.probe();
    print_health_item(
        "API server",
        up,
        &if up {
            format!("reachable at {base_url}")
        } else {
            format!("not reachable at {base_url}")
        },
    );

    let state = dash.state();
    print_health_item(
        "Session",
        state.is_authenticated(),
        &if state.is_authenticated() {
            format!(
                "client {} (token {})",
                state.credentials.ozon_client_id,
                state.credentials.masked_token()
            )
        } else {
            "not signed in".to_string()
        },
    );

    let storage_path = dash
        .storage()
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "in memory".to_string());
    print_health_item("Local storage", dash.storage().path().is_some(), &storage_path);

    let log_entries = dash.log().read_recent(usize::MAX).len();
    print_health_item(
        "Event log",
        dash.log().path().is_some(),
        &match dash.log().path() {
            Some(path) => format!("{} ({} entries)", path.display(), log_entries),
            None => "disabled".to_string(),
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// ozon-dash theme
// ---------------------------------------------------------------------------

/// Show, set or toggle the stored theme.
pub fn run_theme(value: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let mut dash = build_dashboard(&cfg);

    let dark = match value {
        None => dash.state().dark_theme,
        Some("toggle") => dash.toggle_theme(),
        Some("dark") => dash.set_theme(true),
        Some("light") => dash.set_theme(false),
        Some(other) => bail!("unknown theme '{other}' (expected dark, light or toggle)"),
    };

    println!(
        "Theme: {}",
        if dark { "dark".bold() } else { "light".bold() }
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// ozon-dash events
// ---------------------------------------------------------------------------

/// Print the most recent event log entries.
pub fn run_events(limit: usize, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let log = EventLog::from_config(&cfg.logging);
    let events = log.read_recent(limit);

    if events.is_empty() {
        println!("{}", "No events logged yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&events)?),
        OutputFormat::Csv => {
            println!("timestamp,kind,message,path,status");
            for e in &events {
                println!(
                    "{},{},{},{},{}",
                    e.timestamp,
                    e.kind,
                    csv_field(&e.message),
                    csv_field(e.path.as_deref().unwrap_or("")),
                    e.status.map(|s| s.to_string()).unwrap_or_default()
                );
            }
        }
        OutputFormat::Table => {
            for e in &events {
                print_event(e);
            }
        }
    }
    Ok(())
}

fn print_event(event: &Event) {
    let kind = event.kind.to_string();
    let kind = match event.kind {
        EventKind::ServiceUnavailable | EventKind::ServerError | EventKind::Error => kind.red(),
        EventKind::Warning => kind.yellow(),
        EventKind::AvailabilityChanged => kind.cyan(),
        _ => kind.green(),
    };
    let timestamp = event.timestamp.get(..19).unwrap_or(event.timestamp.as_str());
    println!("  {} {:<22} {}", timestamp.dimmed(), kind, event.message);
}

// ---------------------------------------------------------------------------
// ozon-dash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective ozon-dash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.ozon-dash/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.ozon-dash/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".ozon-dash.toml".dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), ".ozon-dash.toml (not found)".dimmed());
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "OZON_DASH_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.ozon-dash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format an amount with two decimals and comma-grouped thousands.
fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let int_part: String = grouped.chars().rev().collect();
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{int_part}.{frac}")
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(750.0), "750.00");
        assert_eq!(format_amount(24500.0), "24,500.00");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-1500.5), "-1,500.50");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("Демо товар 1", 5), "Демо…");
    }

    #[test]
    fn test_csv_field() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn analytics_tiles_cover_every_metric() {
        let tiles = analytics_tiles(&crate::models::demo::analytics());
        assert_eq!(tiles.len(), 9);
        assert_eq!(tiles[0], ("Sales", "24,500.00 ₽".to_string()));
        assert_eq!(tiles[4], ("Orders", "52".to_string()));
    }
}
