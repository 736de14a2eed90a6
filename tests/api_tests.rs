/// Integration tests for the HTTP backend client.
///
/// Each test starts a throwaway `tiny_http` server on an ephemeral port and
/// points an [`ApiClient`] at it, so the full request path (query encoding,
/// API key header, JSON decoding, status mapping) is exercised.
mod common;

use std::time::Duration;

use common::{closed_port_url, products_body, spawn_backend};
use ozon_dash::api::{ApiClient, ApiError, Backend, ProductQuery};
use ozon_dash::events::EventLog;
use ozon_dash::models::{CostEntry, Period};

fn client(url: &str) -> ApiClient {
    ApiClient::new(
        url,
        Duration::from_secs(5),
        Duration::from_millis(500),
        EventLog::disabled(),
    )
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

#[test]
fn availability_probe_hits_root() {
    let backend = spawn_backend(|_, _| (200, "{}".to_string()));
    assert!(client(&backend.url).check_availability());
    assert_eq!(backend.requests_to("/").len(), 1);
}

#[test]
fn availability_probe_fails_on_closed_port() {
    assert!(!client(&closed_port_url()).check_availability());
}

#[test]
fn error_status_is_not_available() {
    let backend = spawn_backend(|_, _| (500, "{}".to_string()));
    assert!(!client(&backend.url).check_availability());
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[test]
fn products_send_period_and_api_key() {
    let backend = spawn_backend(|_, _| {
        (
            200,
            products_body(&[("A-1", 1000.0, 600.0), ("A-2", 500.0, 0.0)], None),
        )
    });

    let page = client(&backend.url)
        .products(Some("key-1"), &ProductQuery::for_period(Period::Week))
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].offer_id, "A-1");
    assert_eq!(page.items[0].cost, 600.0);
    assert!(page.pagination.is_none());

    let requests = backend.requests_to("/products");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert!(requests[0].url.contains("period=week"));
    assert!(requests[0].url.contains("api_key=key-1"));
    assert_eq!(requests[0].api_key.as_deref(), Some("key-1"));
}

#[test]
fn products_read_server_pagination() {
    let backend = spawn_backend(|_, _| {
        (200, products_body(&[("B-21", 100.0, 50.0)], Some((2, 20, 41))))
    });

    let page = client(&backend.url)
        .products(None, &ProductQuery::page(Period::Month, 2, 20))
        .unwrap();

    let pagination = page.pagination.unwrap();
    assert_eq!(pagination.page, 2);
    assert_eq!(pagination.limit, 20);
    assert_eq!(pagination.total, 41);

    let url = &backend.requests_to("/products")[0].url;
    assert!(url.contains("page=2"));
    assert!(url.contains("limit=20"));
}

#[test]
fn unexpected_products_shape_is_an_empty_page() {
    let backend = spawn_backend(|_, _| (200, r#"{"items": []}"#.to_string()));
    let page = client(&backend.url)
        .products(None, &ProductQuery::for_period(Period::Day))
        .unwrap();
    assert!(page.items.is_empty());
}

#[test]
fn server_errors_keep_status_and_body() {
    let backend = spawn_backend(|_, _| (500, r#"{"detail":"boom"}"#.to_string()));
    let err = client(&backend.url)
        .products(None, &ProductQuery::for_period(Period::Day))
        .unwrap_err();

    match err {
        ApiError::Server { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[test]
fn closed_port_is_service_unavailable() {
    let err = client(&closed_port_url())
        .products(None, &ProductQuery::for_period(Period::Day))
        .unwrap_err();
    assert_eq!(err, ApiError::ServiceUnavailable);
    assert!(err.is_unavailable());
}

#[test]
fn malformed_json_is_other_error() {
    let backend = spawn_backend(|_, _| (200, "not json".to_string()));
    let err = client(&backend.url)
        .analytics(None, Period::Month)
        .unwrap_err();
    assert!(matches!(err, ApiError::Other(_)));
    assert!(!err.is_unavailable());
}

// ---------------------------------------------------------------------------
// Analytics, costs, reports, telegram
// ---------------------------------------------------------------------------

#[test]
fn analytics_fill_missing_fields() {
    let backend = spawn_backend(|_, _| (200, r#"{"sales": 1200.5, "orders": 7}"#.to_string()));
    let snapshot = client(&backend.url)
        .analytics(Some("key-1"), Period::Year)
        .unwrap();

    assert_eq!(snapshot.sales, 1200.5);
    assert_eq!(snapshot.orders, 7);
    assert_eq!(snapshot.profit, 0.0);
    assert!(!snapshot.sales_data.is_empty());

    let requests = backend.requests_to("/analytics");
    assert!(requests[0].url.contains("period=year"));
    assert_eq!(requests[0].api_key.as_deref(), Some("key-1"));
}

#[test]
fn save_costs_posts_entries_as_json() {
    let backend = spawn_backend(|_, _| (200, r#"{"status":"ok"}"#.to_string()));
    let entries = vec![
        CostEntry {
            product_id: 1,
            offer_id: "A-1".to_string(),
            cost: 600.0,
        },
        CostEntry {
            product_id: 2,
            offer_id: "A-2".to_string(),
            cost: 250.5,
        },
    ];

    client(&backend.url)
        .save_costs(Some("key-1"), &entries)
        .unwrap();

    let requests = backend.requests_to("/products/costs");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    let posted: Vec<CostEntry> = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(posted, entries);
}

#[test]
fn send_report_returns_backend_message() {
    let backend = spawn_backend(|_, _| (200, r#"{"message":"queued"}"#.to_string()));
    let message = client(&backend.url).send_report(Some("key-1")).unwrap();
    assert_eq!(message, "queued");
    assert_eq!(backend.requests_to("/send_report").len(), 1);
}

#[test]
fn telegram_tokens_are_fetched_per_user() {
    let backend = spawn_backend(|_, url| {
        if url == "/telegram/user/42/tokens" {
            (
                200,
                r#"{"tokens":{"ozon_api_token":"tok-9999","ozon_client_id":"c-1"},"api_key":"k-1"}"#
                    .to_string(),
            )
        } else {
            (404, r#"{"detail":"not found"}"#.to_string())
        }
    });

    let api = client(&backend.url);
    let found = api.telegram_tokens(42).unwrap();
    let tokens = found.tokens.unwrap();
    assert_eq!(tokens.ozon_client_id, "c-1");
    assert_eq!(found.api_key.as_deref(), Some("k-1"));

    let missing = api.telegram_tokens(7).unwrap_err();
    assert!(matches!(missing, ApiError::Server { status: 404, .. }));
}
