//! Dashboard shell.
//!
//! Ties the backend, local storage and the event log to the
//! [`DashboardState`]. Each operation does its I/O here and then dispatches
//! [`Action`]s through [`reduce`](state::reduce).
//!
//! When the backend is unreachable the shell keeps working: the
//! `api_available` flag drops, an offline banner is shown, products and
//! analytics switch to the built-in demo data, and cost edits are kept in
//! local storage only.

pub mod state;

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::api::{ApiError, Backend, ProductQuery, TelegramTokens};
use crate::auth::{self, Credentials};
use crate::config::schema::DashboardConfig;
use crate::events::{EventKind, EventLog};
use crate::metrics::{self, CostRow};
use crate::models::{AnalyticsSnapshot, CostEntry, Period, ProductPage, apply_cost_overrides};
use crate::products::{Paging, ProductActions, ProductList};
use crate::storage::{KEY_DARK_THEME, KEY_PRODUCT_COSTS, LocalStorage};

pub use state::{Action, DashboardState, Tab, reduce};

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("Ozon API token required. Enter it through the Telegram bot")]
    NotAuthenticated,
    #[error("API server is unavailable")]
    Offline,
    #[error("API tokens not found. Enter your tokens in the Telegram bot")]
    TokensNotFound,
    #[error("API key not found")]
    MissingApiKey,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Where saved costs ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSync {
    /// Stored locally and accepted by the backend.
    Synced,
    /// Stored locally only; the backend was unreachable.
    LocalOnly,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub struct Dashboard<B: Backend> {
    backend: B,
    storage: LocalStorage,
    log: EventLog,
    state: DashboardState,
    margin_threshold: f64,
}

impl<B: Backend> Dashboard<B> {
    /// Restore credentials, theme and telegram identity from storage.
    pub fn new(backend: B, storage: LocalStorage, log: EventLog, config: &DashboardConfig) -> Self {
        let mut state = DashboardState::new(config.default_period, config.page_size.max(1));
        state.credentials = auth::load_tokens(&storage);
        state.telegram_user = auth::telegram_user_id(&storage);
        state.dark_theme = resolve_theme(&storage, system_prefers_dark());

        Self {
            backend,
            storage,
            log,
            state,
            margin_threshold: config.margin_threshold,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Margin below which products are flagged.
    pub fn margin_threshold(&self) -> f64 {
        self.margin_threshold
    }

    /// Cost, margin and ROI for every loaded product.
    pub fn cost_table(&self) -> Vec<CostRow> {
        metrics::cost_table(self.state.products.products(), self.margin_threshold)
    }

    pub fn dispatch(&mut self, action: Action) {
        reduce(&mut self.state, action);
    }

    // -- Navigation --

    /// Switch tabs. Entering products or analytics refreshes.
    pub fn select_tab(&mut self, tab: Tab) {
        self.dispatch(Action::SelectTab(tab));
        if tab.needs_data() {
            self.refresh();
        }
    }

    /// Change the period. Refreshes when signed in.
    pub fn select_period(&mut self, period: Period) {
        if period == self.state.period {
            return;
        }
        self.dispatch(Action::SelectPeriod(period));
        if self.state.is_authenticated() {
            self.refresh();
        }
    }

    /// Fetch analytics (when signed in) and then products.
    ///
    /// While offline the backend is re-probed once; if it is still down the
    /// demo data is shown without further requests.
    pub fn refresh(&mut self) {
        self.dispatch(Action::RefreshStarted);

        if !self.state.api_available && !self.probe() {
            self.dispatch(Action::DemoData);
            self.dispatch(Action::RefreshFinished);
            return;
        }

        let api_key = auth::api_key(&self.storage);
        let period = self.state.period;

        if self.state.is_authenticated() {
            match self.backend.analytics(api_key.as_deref(), period) {
                Ok(snapshot) => self.dispatch(Action::AnalyticsLoaded(snapshot)),
                Err(e) => {
                    if self.refresh_failed(e, "Failed to load analytics") {
                        return;
                    }
                }
            }
        }

        let query = match self.state.products.paging() {
            Paging::Server(p) => ProductQuery::page(period, p.page, p.limit),
            Paging::Client { .. } => ProductQuery::for_period(period),
        };
        match self.backend.products(api_key.as_deref(), &query) {
            Ok(mut page) => {
                apply_cost_overrides(&mut page.items, &load_cost_overrides(&self.storage));
                self.dispatch(Action::ProductsLoaded(page));
            }
            Err(e) => {
                if self.refresh_failed(e, "Failed to load products") {
                    return;
                }
            }
        }

        self.dispatch(Action::RefreshFinished);
    }

    /// Returns true when the refresh ended in offline mode.
    fn refresh_failed(&mut self, err: ApiError, context: &str) -> bool {
        if err.is_unavailable() {
            self.went_offline();
            self.dispatch(Action::DemoData);
            self.dispatch(Action::RefreshFinished);
            true
        } else {
            self.dispatch(Action::Failed(format!("{context}: {err}")));
            false
        }
    }

    // -- Availability --

    /// Check the backend once and flip the flag on change.
    pub fn probe(&mut self) -> bool {
        let up = self.backend.check_availability();
        if up != self.state.api_available {
            self.log.record(
                EventKind::AvailabilityChanged,
                if up { "API server reachable" } else { "API server unreachable" },
            );
            self.dispatch(Action::AvailabilityChanged(up));
        }
        up
    }

    fn went_offline(&mut self) {
        if self.state.api_available {
            self.log
                .record(EventKind::AvailabilityChanged, "API server unreachable");
        }
        self.dispatch(Action::WentOffline);
    }

    // -- Theme --

    /// Flip and persist the theme. Returns the new value.
    pub fn toggle_theme(&mut self) -> bool {
        self.set_theme(!self.state.dark_theme)
    }

    pub fn set_theme(&mut self, dark: bool) -> bool {
        let result = self.storage.set(KEY_DARK_THEME, dark.to_string());
        self.persisted(result);
        self.dispatch(Action::ThemeSet(dark));
        dark
    }

    pub fn theme_class(&self) -> &'static str {
        self.state.theme_class()
    }

    // -- Session --

    /// Store a credentials bundle (and backend key) and sign in.
    pub fn login(&mut self, credentials: Credentials, api_key: Option<&str>) {
        let result = auth::save_tokens(&mut self.storage, &credentials);
        self.persisted(result);
        if let Some(key) = api_key {
            let result = auth::set_api_key(&mut self.storage, key);
            self.persisted(result);
        }
        self.log.record(
            EventKind::Login,
            format!("signed in as client {}", credentials.ozon_client_id),
        );
        self.dispatch(Action::LoggedIn {
            credentials,
            telegram_user: None,
        });
    }

    /// Drop the cached bundle and API key.
    pub fn logout(&mut self) {
        let result = auth::clear_tokens(&mut self.storage);
        self.persisted(result);
        self.log.record(EventKind::Logout, "signed out");
        self.dispatch(Action::LoggedOut);
    }

    /// Sign in with the tokens the Telegram bot holds for `user_id`.
    pub fn telegram_login(&mut self, user_id: u64) -> Result<(), ShellError> {
        let result = auth::set_telegram_user_id(&mut self.storage, user_id);
        self.persisted(result);

        match self.backend.telegram_tokens(user_id) {
            Ok(TelegramTokens {
                tokens: Some(credentials),
                api_key,
                ..
            }) if credentials.is_authenticated() => {
                let result = auth::save_tokens(&mut self.storage, &credentials);
                self.persisted(result);
                if let Some(key) = api_key.as_deref().filter(|k| !k.is_empty()) {
                    let result = auth::set_api_key(&mut self.storage, key);
                    self.persisted(result);
                }
                self.log.record(
                    EventKind::Login,
                    format!("signed in through telegram user {user_id}"),
                );
                self.dispatch(Action::LoggedIn {
                    credentials,
                    telegram_user: Some(user_id),
                });
                Ok(())
            }
            Ok(_) => {
                self.dispatch(Action::Failed(ShellError::TokensNotFound.to_string()));
                Err(ShellError::TokensNotFound)
            }
            Err(e) => {
                if e.is_unavailable() {
                    self.went_offline();
                }
                self.dispatch(Action::Failed(format!("Failed to load tokens: {e}")));
                Err(e.into())
            }
        }
    }

    // -- Reports --

    /// Ask the backend to send a report to the seller's Telegram chat.
    pub fn send_report(&mut self) -> Result<String, ShellError> {
        if !self.state.is_authenticated() {
            return Err(ShellError::NotAuthenticated);
        }
        if !self.state.api_available {
            return Err(ShellError::Offline);
        }

        self.dispatch(Action::ReportStatus(Some("Sending report...".to_string())));
        let api_key = auth::api_key(&self.storage);

        match self.backend.send_report(api_key.as_deref()) {
            Ok(message) => {
                self.log.record(EventKind::ReportSent, message.clone());
                self.dispatch(Action::ReportStatus(Some(
                    "Report sent successfully!".to_string(),
                )));
                Ok(message)
            }
            Err(e) => {
                let status = if e.is_unavailable() {
                    self.went_offline();
                    "Error: API server is unavailable.".to_string()
                } else {
                    format!("Send failed: {e}")
                };
                self.dispatch(Action::ReportStatus(Some(status)));
                Err(e.into())
            }
        }
    }

    // -- Costs --

    /// Save every loaded product's cost. Local storage is written first;
    /// while offline that is the only copy.
    pub fn save_costs(&mut self) -> Result<CostSync, ShellError> {
        if !self.state.is_authenticated() {
            return Err(ShellError::NotAuthenticated);
        }

        let entries: Vec<CostEntry> = self
            .state
            .products
            .products()
            .iter()
            .map(CostEntry::from)
            .collect();
        let result = mirror_costs(&mut self.storage, &entries);
        self.persisted(result);

        if !self.state.api_available {
            self.log.record(
                EventKind::CostsSaved,
                format!("{} costs saved locally", entries.len()),
            );
            return Ok(CostSync::LocalOnly);
        }

        let Some(api_key) = auth::api_key(&self.storage) else {
            return Err(ShellError::MissingApiKey);
        };

        match self.backend.save_costs(Some(&api_key), &entries) {
            Ok(()) => {
                self.log
                    .record(EventKind::CostsSaved, format!("{} costs saved", entries.len()));
                Ok(CostSync::Synced)
            }
            Err(e) if e.is_unavailable() => {
                self.went_offline();
                Ok(CostSync::LocalOnly)
            }
            Err(e) => {
                self.dispatch(Action::Failed(format!("Failed to save costs: {e}")));
                Err(e.into())
            }
        }
    }

    /// Set one product's cost and save it.
    pub fn set_cost(&mut self, offer_id: &str, cost: f64) -> Result<bool, ApiError> {
        self.state.products.edit_cost(offer_id, &cost.to_string());
        self.save_cost(offer_id)
    }

    /// Set one cost on several products in a single update.
    pub fn bulk_set_cost(&mut self, offer_ids: &[String], cost: f64) -> Result<bool, ApiError> {
        let list = &mut self.state.products;
        list.clear_selection();
        for id in offer_ids {
            if !list.is_selected(id) {
                list.toggle_select(id);
            }
        }
        list.set_bulk_cost(&cost.to_string());
        self.apply_bulk()
    }

    // -- Product list --

    pub fn products(&self) -> &ProductList {
        &self.state.products
    }

    pub fn products_mut(&mut self) -> &mut ProductList {
        &mut self.state.products
    }

    pub fn save_cost(&mut self, offer_id: &str) -> Result<bool, ApiError> {
        self.with_gateway("Failed to save cost", |list, gateway| {
            list.save_cost(offer_id, gateway)
        })
    }

    pub fn apply_bulk(&mut self) -> Result<bool, ApiError> {
        self.with_gateway("Failed to update costs", |list, gateway| {
            list.apply_bulk(gateway)
        })
    }

    pub fn go_to_page(&mut self, page: u32) -> Result<(), ApiError> {
        self.with_gateway("Failed to load products", |list, gateway| {
            list.go_to_page(page, gateway)
        })
    }

    pub fn set_items_per_page(&mut self, limit: u32) -> Result<(), ApiError> {
        self.state.page_size = limit.max(1);
        self.with_gateway("Failed to load products", |list, gateway| {
            list.set_items_per_page(limit, gateway)
        })
    }

    fn with_gateway<T>(
        &mut self,
        context: &str,
        op: impl FnOnce(&mut ProductList, &mut CostGateway<'_, B>) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let product_ids = self
            .state
            .products
            .products()
            .iter()
            .map(|p| (p.offer_id.clone(), p.product_id))
            .collect();
        let api_key = auth::api_key(&self.storage);
        let mut gateway = CostGateway {
            backend: &self.backend,
            storage: &mut self.storage,
            log: &self.log,
            api_key,
            online: self.state.api_available,
            period: self.state.period,
            product_ids,
        };
        let result = op(&mut self.state.products, &mut gateway);

        if let Err(e) = &result {
            if e.is_unavailable() {
                self.went_offline();
            } else {
                self.dispatch(Action::Failed(format!("{context}: {e}")));
            }
        }
        result
    }

    fn persisted(&self, result: anyhow::Result<()>) {
        if let Err(e) = result {
            self.log
                .record(EventKind::Error, format!("local storage write failed: {e:#}"));
        }
    }

    // -- View --

    /// Serializable summary for the web front end and `--format json`.
    pub fn view(&self) -> StateView<'_> {
        let s = &self.state;
        StateView {
            tab: s.tab,
            period: s.period,
            api_available: s.api_available,
            banner: s.banner.as_deref(),
            error: s.error.as_deref(),
            report_status: s.report_status.as_deref(),
            authenticated: s.is_authenticated(),
            client_id: &s.credentials.ozon_client_id,
            masked_token: s.credentials.masked_token(),
            telegram_user: s.telegram_user,
            dark_theme: s.dark_theme,
            theme_class: s.theme_class(),
            loading: s.loading,
            demo: s.demo,
            analytics: &s.analytics,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StateView<'a> {
    pub tab: Tab,
    pub period: Period,
    pub api_available: bool,
    pub banner: Option<&'a str>,
    pub error: Option<&'a str>,
    pub report_status: Option<&'a str>,
    pub authenticated: bool,
    pub client_id: &'a str,
    pub masked_token: String,
    pub telegram_user: Option<u64>,
    pub dark_theme: bool,
    pub theme_class: &'static str,
    pub loading: bool,
    pub demo: bool,
    pub analytics: &'a AnalyticsSnapshot,
}

// ---------------------------------------------------------------------------
// Product list callbacks
// ---------------------------------------------------------------------------

/// Borrowed view of the shell handed to the product list as its callbacks.
pub struct CostGateway<'a, B: Backend> {
    backend: &'a B,
    storage: &'a mut LocalStorage,
    log: &'a EventLog,
    api_key: Option<String>,
    online: bool,
    period: Period,
    product_ids: HashMap<String, u64>,
}

impl<B: Backend> CostGateway<'_, B> {
    /// Cost entries for the loaded products among `offer_ids`. Unknown ids
    /// have no product id to key the cached override on and are skipped.
    fn entries(&self, offer_ids: &[String], cost: f64) -> Vec<CostEntry> {
        offer_ids
            .iter()
            .filter_map(|id| {
                let product_id = *self.product_ids.get(id)?;
                Some(CostEntry {
                    product_id,
                    offer_id: id.clone(),
                    cost,
                })
            })
            .collect()
    }

    fn push(&mut self, entries: &[CostEntry]) -> Result<(), ApiError> {
        if entries.is_empty() {
            return Ok(());
        }
        if let Err(e) = mirror_costs(self.storage, entries) {
            self.log
                .record(EventKind::Error, format!("local storage write failed: {e:#}"));
        }
        if !self.online {
            return Ok(());
        }
        self.backend.save_costs(self.api_key.as_deref(), entries)?;
        self.log
            .record(EventKind::CostsSaved, format!("{} costs saved", entries.len()));
        Ok(())
    }
}

impl<B: Backend> ProductActions for CostGateway<'_, B> {
    fn save_cost(&mut self, offer_id: &str, cost: f64) -> Result<(), ApiError> {
        let entries = self.entries(&[offer_id.to_string()], cost);
        self.push(&entries)
    }

    fn bulk_update(&mut self, offer_ids: &[String], cost: f64) -> Result<(), ApiError> {
        let entries = self.entries(offer_ids, cost);
        self.push(&entries)
    }

    fn fetch_page(&mut self, page: u32, limit: u32) -> Result<ProductPage, ApiError> {
        if !self.online {
            return Err(ApiError::ServiceUnavailable);
        }
        let query = ProductQuery::page(self.period, page, limit);
        let mut fetched = self.backend.products(self.api_key.as_deref(), &query)?;
        apply_cost_overrides(&mut fetched.items, &load_cost_overrides(self.storage));
        Ok(fetched)
    }
}

// ---------------------------------------------------------------------------
// Local cost cache
// ---------------------------------------------------------------------------

/// Cost overrides cached under `productCosts`. Malformed data reads as empty.
pub fn load_cost_overrides(storage: &LocalStorage) -> Vec<CostEntry> {
    storage
        .get(KEY_PRODUCT_COSTS)
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default()
}

/// Merge entries into the cached overrides, replacing by `product_id`.
pub fn mirror_costs(storage: &mut LocalStorage, entries: &[CostEntry]) -> anyhow::Result<()> {
    let mut cached = load_cost_overrides(storage);
    for entry in entries {
        match cached.iter_mut().find(|c| c.product_id == entry.product_id) {
            Some(existing) => *existing = entry.clone(),
            None => cached.push(entry.clone()),
        }
    }
    storage.set(KEY_PRODUCT_COSTS, serde_json::to_string(&cached)?)
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// Stored theme preference, or the system preference when none is stored.
pub fn resolve_theme(storage: &LocalStorage, system_dark: bool) -> bool {
    match storage.get(KEY_DARK_THEME) {
        Some("true") => true,
        Some("false") => false,
        _ => system_dark,
    }
}

/// Terminal color-scheme hint from `COLORFGBG` ("fg;bg"); dark backgrounds
/// use the low ANSI colors.
pub fn system_prefers_dark() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|v| v.rsplit(';').next().and_then(|bg| bg.trim().parse::<u8>().ok()))
        .is_some_and(|bg| bg < 7 || bg == 8)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
