//! Dashboard state and its reducer.
//!
//! Every state change the shell makes is expressed as an [`Action`] and
//! applied by [`reduce`]. The reducer is pure: network calls, storage writes
//! and logging happen in the shell before an action is dispatched.

use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::models::{AnalyticsSnapshot, Period, ProductPage, demo};
use crate::products::ProductList;

/// Banner shown while the backend is unreachable. Stays until the probe sees it again.
pub const OFFLINE_BANNER: &str = "API server is unavailable. Working offline with demo data.";

/// Presentation class toggled by the theme switch.
pub const DARK_THEME_CLASS: &str = "dark-theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Home,
    Products,
    Analytics,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Home, Tab::Products, Tab::Analytics, Tab::Settings];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Products => "products",
            Self::Analytics => "analytics",
            Self::Settings => "settings",
        }
    }

    pub fn parse(val: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == val.to_ascii_lowercase())
    }

    /// Tabs whose content comes from the backend.
    pub fn needs_data(self) -> bool {
        matches!(self, Self::Products | Self::Analytics)
    }
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub tab: Tab,
    pub period: Period,
    /// Optimistic until the first probe or failed request says otherwise.
    pub api_available: bool,
    /// Persistent offline banner.
    pub banner: Option<String>,
    /// Transient error from the last failed action.
    pub error: Option<String>,
    pub report_status: Option<String>,
    pub credentials: Credentials,
    pub telegram_user: Option<u64>,
    pub products: ProductList,
    pub analytics: AnalyticsSnapshot,
    /// Products and analytics are the built-in demo data.
    pub demo: bool,
    pub dark_theme: bool,
    pub loading: bool,
    pub page_size: u32,
}

impl DashboardState {
    pub fn new(period: Period, page_size: u32) -> Self {
        Self {
            tab: Tab::Home,
            period,
            api_available: true,
            banner: None,
            error: None,
            report_status: None,
            credentials: Credentials::default(),
            telegram_user: None,
            products: ProductList::client(Vec::new(), page_size),
            analytics: AnalyticsSnapshot::default(),
            demo: false,
            dark_theme: false,
            loading: false,
            page_size,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    /// Class list for the root element.
    pub fn theme_class(&self) -> &'static str {
        if self.dark_theme { DARK_THEME_CLASS } else { "" }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectTab(Tab),
    SelectPeriod(Period),
    RefreshStarted,
    RefreshFinished,
    AnalyticsLoaded(AnalyticsSnapshot),
    ProductsLoaded(ProductPage),
    /// Backend lost: flag and banner only.
    WentOffline,
    /// Replace products and analytics with demo data.
    DemoData,
    AvailabilityChanged(bool),
    Failed(String),
    ClearError,
    ThemeSet(bool),
    LoggedIn {
        credentials: Credentials,
        telegram_user: Option<u64>,
    },
    LoggedOut,
    ReportStatus(Option<String>),
}

/// Apply one action.
pub fn reduce(state: &mut DashboardState, action: Action) {
    match action {
        Action::SelectTab(tab) => {
            state.tab = tab;
            state.report_status = None;
        }
        Action::SelectPeriod(period) => state.period = period,
        Action::RefreshStarted => {
            state.loading = true;
            state.error = None;
        }
        Action::RefreshFinished => state.loading = false,
        Action::AnalyticsLoaded(snapshot) => {
            state.analytics = snapshot;
            state.demo = false;
        }
        Action::ProductsLoaded(page) => {
            let mut list = ProductList::new(page.items, page.pagination, true, state.page_size);
            list.set_filter(state.products.filter().clone());
            state.products = list;
            state.demo = false;
        }
        Action::WentOffline => {
            state.api_available = false;
            state.banner = Some(OFFLINE_BANNER.to_string());
        }
        Action::DemoData => {
            let mut list = ProductList::client(demo::products(), state.page_size);
            list.set_filter(state.products.filter().clone());
            state.products = list;
            state.analytics = demo::analytics();
            state.demo = true;
        }
        Action::AvailabilityChanged(up) => {
            state.api_available = up;
            state.banner = if up {
                None
            } else {
                Some(OFFLINE_BANNER.to_string())
            };
        }
        Action::Failed(message) => state.error = Some(message),
        Action::ClearError => state.error = None,
        Action::ThemeSet(dark) => state.dark_theme = dark,
        Action::LoggedIn {
            credentials,
            telegram_user,
        } => {
            state.credentials = credentials;
            if telegram_user.is_some() {
                state.telegram_user = telegram_user;
            }
            state.error = None;
        }
        Action::LoggedOut => {
            state.credentials = Credentials::default();
            state.analytics = AnalyticsSnapshot::default();
        }
        Action::ReportStatus(status) => state.report_status = status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Pagination, Product};

    fn state() -> DashboardState {
        DashboardState::new(Period::Month, 20)
    }

    #[test]
    fn starts_optimistic_on_home() {
        let s = state();
        assert_eq!(s.tab, Tab::Home);
        assert!(s.api_available);
        assert!(s.banner.is_none());
        assert!(!s.is_authenticated());
    }

    #[test]
    fn offline_then_online_toggles_banner() {
        let mut s = state();
        reduce(&mut s, Action::WentOffline);
        assert!(!s.api_available);
        assert_eq!(s.banner.as_deref(), Some(OFFLINE_BANNER));

        reduce(&mut s, Action::AvailabilityChanged(true));
        assert!(s.api_available);
        assert!(s.banner.is_none());
    }

    #[test]
    fn demo_data_replaces_products_and_analytics() {
        let mut s = state();
        reduce(&mut s, Action::DemoData);
        let ids: Vec<&str> = s.products.products().iter().map(|p| p.offer_id.as_str()).collect();
        assert_eq!(ids, vec!["DEMO-001", "DEMO-002"]);
        assert_eq!(s.analytics.sales, 24500.0);
        assert!(s.demo);
    }

    #[test]
    fn products_loaded_keeps_filter_and_picks_mode() {
        let mut s = state();
        s.products.set_search("kettle");
        reduce(
            &mut s,
            Action::ProductsLoaded(ProductPage {
                items: vec![Product::new(1, "Kettle", "K-1", 10.0, 0.0)],
                pagination: Some(Pagination {
                    page: 1,
                    limit: 10,
                    total: 30,
                }),
            }),
        );
        assert_eq!(s.products.filter().search, "kettle");
        assert!(s.products.paging().is_server());
        assert_eq!(s.products.total_pages(), 3);
    }

    #[test]
    fn refresh_clears_transient_error() {
        let mut s = state();
        reduce(&mut s, Action::Failed("boom".to_string()));
        reduce(&mut s, Action::RefreshStarted);
        assert!(s.error.is_none());
        assert!(s.loading);
        reduce(&mut s, Action::RefreshFinished);
        assert!(!s.loading);
    }

    #[test]
    fn theme_class_follows_flag() {
        let mut s = state();
        assert_eq!(s.theme_class(), "");
        reduce(&mut s, Action::ThemeSet(true));
        assert_eq!(s.theme_class(), DARK_THEME_CLASS);
    }

    #[test]
    fn tab_parse() {
        assert_eq!(Tab::parse("Products"), Some(Tab::Products));
        assert_eq!(Tab::parse("orders"), None);
        assert!(Tab::Analytics.needs_data());
        assert!(!Tab::Settings.needs_data());
    }

    #[test]
    fn logout_drops_credentials() {
        let mut s = state();
        reduce(
            &mut s,
            Action::LoggedIn {
                credentials: Credentials::new("t", "c"),
                telegram_user: Some(42),
            },
        );
        assert!(s.is_authenticated());
        assert_eq!(s.telegram_user, Some(42));
        reduce(&mut s, Action::LoggedOut);
        assert!(!s.is_authenticated());
    }
}
