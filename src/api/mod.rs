//! Backend API gateway.
//!
//! [`ApiClient`] talks to the seller analytics backend over HTTP. Callers go
//! through the [`Backend`] trait so the dashboard shell can run against an
//! in-process fake in tests.
//!
//! Failures are normalized into [`ApiError`]: network-level loss becomes
//! [`ApiError::ServiceUnavailable`] so callers can switch to offline mode,
//! non-success statuses become [`ApiError::Server`], and everything else keeps
//! its original message in [`ApiError::Other`].

mod client;

pub use client::{ApiClient, Method};

use serde::Deserialize;
use thiserror::Error;

use crate::auth::Credentials;
use crate::models::{AnalyticsSnapshot, CostEntry, Pagination, Period, Product, ProductPage};

/// Default page size assumed when the server omits `limit`.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout or other transport loss.
    #[error("API server is unavailable")]
    ServiceUnavailable,
    /// The server answered with a non-success status.
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable)
    }
}

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

/// Query for `GET /products`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductQuery {
    pub period: Period,
    /// Requested page; `None` lets the server decide (usually "everything").
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductQuery {
    pub fn for_period(period: Period) -> Self {
        Self {
            period,
            page: None,
            limit: None,
        }
    }

    pub fn page(period: Period, page: u32, limit: u32) -> Self {
        Self {
            period,
            page: Some(page),
            limit: Some(limit),
        }
    }
}

/// Response of `GET /telegram/user/{id}/tokens`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TelegramTokens {
    #[serde(default)]
    pub tokens: Option<Credentials>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Operations the dashboard needs from the backend.
///
/// `api_key` is the cached backend key sent as `X-API-Key`; `None` sends no
/// header.
pub trait Backend {
    /// Liveness probe. Never fails; any error reads as `false`.
    fn check_availability(&self) -> bool;

    fn products(&self, api_key: Option<&str>, query: &ProductQuery) -> Result<ProductPage, ApiError>;

    fn analytics(&self, api_key: Option<&str>, period: Period) -> Result<AnalyticsSnapshot, ApiError>;

    fn save_costs(&self, api_key: Option<&str>, entries: &[CostEntry]) -> Result<(), ApiError>;

    /// Ask the backend to push a report to the seller's Telegram chat.
    fn send_report(&self, api_key: Option<&str>) -> Result<String, ApiError>;

    fn telegram_tokens(&self, user_id: u64) -> Result<TelegramTokens, ApiError>;
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parse a `GET /products` body of the form `{"result": {"items": [...]}}`.
///
/// A pagination descriptor is produced only when the server includes
/// `total`; `page` and `limit` fall back to the query, then to defaults.
/// Returns `None` when the body does not have the expected shape.
pub fn parse_product_page(body: &serde_json::Value, query: &ProductQuery) -> Option<ProductPage> {
    let result = body.get("result")?;
    let items = result.get("items")?.as_array()?;

    let items: Vec<Product> = items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect();

    let as_u32 = |key: &str| {
        result
            .get(key)
            .and_then(serde_json::Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    };

    let pagination = as_u32("total").map(|total| Pagination {
        page: as_u32("page").or(query.page).unwrap_or(1).max(1),
        limit: as_u32("limit")
            .or(query.limit)
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .max(1),
        total,
    });

    Some(ProductPage { items, pagination })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
