/// Integration tests for the dashboard shell running against a real HTTP
/// client, a fake backend and file-backed storage.
///
/// Unit tests with an in-process backend live in `src/shell/mod.rs`. These
/// cover what only shows up end to end: headers and query strings sent by the
/// shell, persistence across restarts, and the offline fallback when the
/// backend port is closed.
mod common;

use std::time::Duration;

use common::{FakeBackend, closed_port_url, products_body, spawn_backend};
use ozon_dash::api::ApiClient;
use ozon_dash::auth::{self, Credentials};
use ozon_dash::config::schema::DashboardConfig;
use ozon_dash::events::EventLog;
use ozon_dash::models::Period;
use ozon_dash::shell::{CostSync, Dashboard, ShellError, Tab, load_cost_overrides};
use ozon_dash::storage::LocalStorage;

fn dashboard(url: &str, storage: LocalStorage) -> Dashboard<ApiClient> {
    let client = ApiClient::new(
        url,
        Duration::from_secs(5),
        Duration::from_millis(500),
        EventLog::disabled(),
    );
    Dashboard::new(
        client,
        storage,
        EventLog::disabled(),
        &DashboardConfig::default(),
    )
}

fn seller_backend() -> FakeBackend {
    spawn_backend(|_, url| {
        let path = url.split('?').next().unwrap_or(url);
        match path {
            "/" => (200, r#"{"status":"ok"}"#.to_string()),
            "/analytics" => (
                200,
                r#"{"sales": 3000.0, "profit": 900.0, "orders": 4, "margin": 30.0}"#.to_string(),
            ),
            "/products" if url.contains("page=2") => (
                200,
                products_body(&[("P-3", 800.0, 400.0)], Some((2, 2, 3))),
            ),
            "/products" => (
                200,
                products_body(
                    &[("P-1", 1000.0, 600.0), ("P-2", 500.0, 450.0)],
                    Some((1, 2, 3)),
                ),
            ),
            "/products/costs" => (200, r#"{"status":"ok"}"#.to_string()),
            "/send_report" => (200, r#"{"message":"report queued"}"#.to_string()),
            "/telegram/user/77/tokens" => (
                200,
                r#"{"tokens":{"ozon_api_token":"tok-abcdef","ozon_client_id":"client-77"},"api_key":"key-77"}"#
                    .to_string(),
            ),
            "/telegram/user/78/tokens" => (200, r#"{"message":"no tokens"}"#.to_string()),
            _ => (404, r#"{"detail":"not found"}"#.to_string()),
        }
    })
}

// ---------------------------------------------------------------------------
// Online session
// ---------------------------------------------------------------------------

#[test]
fn signed_in_refresh_loads_analytics_and_products() {
    let backend = seller_backend();
    let mut dash = dashboard(&backend.url, LocalStorage::in_memory());
    dash.login(Credentials::new("tok-1234", "client-1"), Some("key-1"));

    dash.select_tab(Tab::Analytics);

    let state = dash.state();
    assert!(state.api_available);
    assert!(!state.demo);
    assert_eq!(state.analytics.sales, 3000.0);
    assert_eq!(state.analytics.orders, 4);
    assert_eq!(dash.products().products().len(), 2);
    assert_eq!(dash.products().total_pages(), 2);

    let analytics = backend.requests_to("/analytics");
    assert_eq!(analytics.len(), 1);
    assert!(analytics[0].url.contains("period=month"));
    assert_eq!(analytics[0].api_key.as_deref(), Some("key-1"));
}

#[test]
fn anonymous_refresh_skips_analytics() {
    let backend = seller_backend();
    let mut dash = dashboard(&backend.url, LocalStorage::in_memory());

    dash.select_tab(Tab::Products);

    assert!(backend.requests_to("/analytics").is_empty());
    assert_eq!(backend.requests_to("/products").len(), 1);
    assert_eq!(dash.products().products().len(), 2);
}

#[test]
fn period_change_refetches_with_new_period() {
    let backend = seller_backend();
    let mut dash = dashboard(&backend.url, LocalStorage::in_memory());
    dash.login(Credentials::new("tok-1234", "client-1"), Some("key-1"));

    dash.select_period(Period::Week);
    dash.select_period(Period::Week);

    let analytics = backend.requests_to("/analytics");
    assert_eq!(analytics.len(), 1);
    assert!(analytics[0].url.contains("period=week"));
}

#[test]
fn server_pages_are_fetched_on_navigation() {
    let backend = seller_backend();
    let mut dash = dashboard(&backend.url, LocalStorage::in_memory());
    dash.select_tab(Tab::Products);

    dash.go_to_page(2).unwrap();

    let list = dash.products();
    assert_eq!(list.current_page(), 2);
    let offers: Vec<&str> = list
        .current_items()
        .iter()
        .map(|p| p.offer_id.as_str())
        .collect();
    assert_eq!(offers, vec!["P-3"]);

    let fetched = backend.requests_to("/products");
    assert!(fetched.last().unwrap().url.contains("page=2"));
}

#[test]
fn cost_edit_posts_and_mirrors_locally() {
    let backend = seller_backend();
    let mut dash = dashboard(&backend.url, LocalStorage::in_memory());
    dash.login(Credentials::new("tok-1234", "client-1"), Some("key-1"));
    dash.select_tab(Tab::Products);

    assert!(dash.set_cost("P-2", 300.0).unwrap());

    let posts = backend.requests_to("/products/costs");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].api_key.as_deref(), Some("key-1"));
    assert!(posts[0].body.contains("P-2"));

    let cached = load_cost_overrides(dash.storage());
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].offer_id, "P-2");
    assert_eq!(cached[0].cost, 300.0);
}

#[test]
fn bulk_cost_updates_every_selected_product() {
    let backend = seller_backend();
    let mut dash = dashboard(&backend.url, LocalStorage::in_memory());
    dash.login(Credentials::new("tok-1234", "client-1"), Some("key-1"));
    dash.select_tab(Tab::Products);

    let ids = vec!["P-1".to_string(), "P-2".to_string()];
    assert!(dash.bulk_set_cost(&ids, 100.0).unwrap());

    let products = dash.products().products();
    assert!(products.iter().all(|p| p.cost == 100.0));
    assert!(dash.products().selected().is_empty());
    assert_eq!(load_cost_overrides(dash.storage()).len(), 2);
}

#[test]
fn save_costs_without_api_key_is_rejected() {
    let backend = seller_backend();
    let mut dash = dashboard(&backend.url, LocalStorage::in_memory());
    dash.login(Credentials::new("tok-1234", "client-1"), None);
    dash.select_tab(Tab::Products);

    assert_eq!(dash.save_costs(), Err(ShellError::MissingApiKey));
    assert!(backend.requests_to("/products/costs").is_empty());
}

#[test]
fn telegram_login_and_report() {
    let backend = seller_backend();
    let mut dash = dashboard(&backend.url, LocalStorage::in_memory());

    dash.telegram_login(77).unwrap();
    assert!(dash.state().is_authenticated());
    assert_eq!(dash.state().telegram_user, Some(77));
    assert_eq!(auth::api_key(dash.storage()).as_deref(), Some("key-77"));

    let message = dash.send_report().unwrap();
    assert_eq!(message, "report queued");
    let reports = backend.requests_to("/send_report");
    assert_eq!(reports[0].api_key.as_deref(), Some("key-77"));
}

#[test]
fn telegram_login_without_tokens_fails() {
    let backend = seller_backend();
    let mut dash = dashboard(&backend.url, LocalStorage::in_memory());

    assert_eq!(dash.telegram_login(78), Err(ShellError::TokensNotFound));
    assert!(!dash.state().is_authenticated());
    assert!(dash.state().error.is_some());
}

// ---------------------------------------------------------------------------
// Offline fallback
// ---------------------------------------------------------------------------

#[test]
fn closed_backend_falls_back_to_demo_data() {
    let mut dash = dashboard(&closed_port_url(), LocalStorage::in_memory());
    dash.login(Credentials::new("tok-1234", "client-1"), Some("key-1"));

    dash.select_tab(Tab::Analytics);

    let state = dash.state();
    assert!(!state.api_available);
    assert!(state.demo);
    assert!(state.banner.is_some());
    assert_eq!(state.analytics.sales, 24500.0);
    let offers: Vec<&str> = dash
        .products()
        .products()
        .iter()
        .map(|p| p.offer_id.as_str())
        .collect();
    assert_eq!(offers, vec!["DEMO-001", "DEMO-002"]);
}

#[test]
fn offline_cost_save_is_local_only() {
    let mut dash = dashboard(&closed_port_url(), LocalStorage::in_memory());
    dash.login(Credentials::new("tok-1234", "client-1"), Some("key-1"));
    dash.select_tab(Tab::Products);

    assert_eq!(dash.save_costs(), Ok(CostSync::LocalOnly));
    assert_eq!(load_cost_overrides(dash.storage()).len(), 2);
}

#[test]
fn offline_report_is_refused() {
    let mut dash = dashboard(&closed_port_url(), LocalStorage::in_memory());
    dash.login(Credentials::new("tok-1234", "client-1"), Some("key-1"));
    dash.probe();

    assert_eq!(dash.send_report(), Err(ShellError::Offline));
}

// ---------------------------------------------------------------------------
// Persistence across restarts
// ---------------------------------------------------------------------------

#[test]
fn session_theme_and_costs_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let backend = seller_backend();

    {
        let mut dash = dashboard(&backend.url, LocalStorage::at(&path));
        dash.login(Credentials::new("tok-1234", "client-1"), Some("key-1"));
        dash.set_theme(true);
        dash.select_tab(Tab::Products);
        dash.set_cost("P-1", 550.0).unwrap();
    }

    let mut dash = dashboard(&backend.url, LocalStorage::at(&path));
    assert!(dash.state().is_authenticated());
    assert_eq!(dash.state().credentials.ozon_client_id, "client-1");
    assert!(dash.state().dark_theme);
    assert_eq!(dash.theme_class(), "dark-theme");

    // The backend still reports the old cost; the local override wins.
    dash.select_tab(Tab::Products);
    let p1 = dash
        .products()
        .products()
        .iter()
        .find(|p| p.offer_id == "P-1")
        .unwrap();
    assert_eq!(p1.cost, 550.0);
}

#[test]
fn logout_clears_persisted_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let backend = seller_backend();

    {
        let mut dash = dashboard(&backend.url, LocalStorage::at(&path));
        dash.login(Credentials::new("tok-1234", "client-1"), Some("key-1"));
        dash.logout();
    }

    let dash = dashboard(&backend.url, LocalStorage::at(&path));
    assert!(!dash.state().is_authenticated());
    assert!(auth::api_key(dash.storage()).is_none());
}
