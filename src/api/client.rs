/// Synchronous HTTP client for the seller analytics backend.
///
/// Built on `ureq`. One client is created per dashboard and reused; it holds
/// no per-user state, the cached API key is passed in on every call.
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;

use super::{ApiError, Backend, ProductQuery, TelegramTokens, parse_product_page};
use crate::config::schema::ApiConfig;
use crate::events::{EventKind, EventLog};
use crate::models::{AnalyticsSnapshot, CostEntry, Period, ProductPage};

/// Header carrying the backend API key.
const API_KEY_HEADER: &str = "X-API-Key";

/// HTTP methods used by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
    probe_timeout: Duration,
    probe_failing: AtomicBool,
    log: EventLog,
}

impl ApiClient {
    /// Build a client from the `[api]` config section.
    pub fn from_config(config: &ApiConfig, log: EventLog) -> Self {
        Self::new(
            &config.resolved_base_url(),
            Duration::from_millis(config.timeout_ms),
            Duration::from_millis(config.probe_timeout_ms),
            log,
        )
    }

    pub fn new(base_url: &str, timeout: Duration, probe_timeout: Duration, log: EventLog) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
            probe_timeout,
            probe_failing: AtomicBool::new(false),
            log,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request and decode the JSON body.
    ///
    /// Non-success statuses become [`ApiError::Server`], transport failures
    /// become [`ApiError::ServiceUnavailable`]. Every failure is logged.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        api_key: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let result = self.send(method, path, query, api_key, body);

        if let Err(e) = &result {
            let (kind, status) = match e {
                ApiError::ServiceUnavailable => (EventKind::ServiceUnavailable, None),
                ApiError::Server { status, .. } => (EventKind::ServerError, Some(*status)),
                ApiError::Other(_) => (EventKind::Error, None),
            };
            self.log.record_full(
                kind,
                format!("{} {path} failed: {e}", method.as_str()),
                Some(path),
                status,
            );
        }

        result
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        api_key: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);
        let mut req = self.agent.request(method.as_str(), &url);
        for (k, v) in query {
            req = req.query(k, v);
        }
        if let Some(key) = api_key {
            req = req.set(API_KEY_HEADER, key);
        }

        let response = match body {
            Some(json) => req.send_json(json),
            None => req.call(),
        }
        .map_err(map_ureq_error)?;

        response
            .into_json::<Value>()
            .map_err(|e| ApiError::Other(format!("failed to parse response from {path}: {e}")))
    }

    fn url(&self, path: &str) -> String {
        // On Windows, "localhost" may resolve to ::1 first while the backend
        // only listens on IPv4.
        format!("{}{}", self.base_url, path).replace("://localhost", "://127.0.0.1")
    }
}

/// Map a `ureq` failure onto the gateway error kinds.
fn map_ureq_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(status, response) => ApiError::Server {
            status,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => match transport.kind() {
            ureq::ErrorKind::Dns
            | ureq::ErrorKind::ConnectionFailed
            | ureq::ErrorKind::Io
            | ureq::ErrorKind::ProxyConnect => ApiError::ServiceUnavailable,
            _ => ApiError::Other(transport.to_string()),
        },
    }
}

impl Backend for ApiClient {
    fn check_availability(&self) -> bool {
        let result = self
            .agent
            .get(&self.url("/"))
            .timeout(self.probe_timeout)
            .call();

        match result {
            Ok(_) => {
                self.probe_failing.store(false, Ordering::Relaxed);
                true
            }
            // Only the first failure of an outage is logged.
            Err(_) if self.probe_failing.swap(true, Ordering::Relaxed) => false,
            Err(e) => {
                self.log.record_full(
                    EventKind::ServiceUnavailable,
                    format!("availability probe failed: {e}"),
                    Some("/"),
                    None,
                );
                false
            }
        }
    }

    fn products(&self, api_key: Option<&str>, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let mut params = vec![("period", query.period.as_str().to_string())];
        if let Some(page) = query.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(key) = api_key {
            params.push(("api_key", key.to_string()));
        }

        let body = self.request(Method::Get, "/products", &params, api_key, None)?;

        match parse_product_page(&body, query) {
            Some(page) => Ok(page),
            None => {
                self.log.record_full(
                    EventKind::Warning,
                    "unexpected products response shape",
                    Some("/products"),
                    None,
                );
                Ok(ProductPage::default())
            }
        }
    }

    fn analytics(&self, api_key: Option<&str>, period: Period) -> Result<AnalyticsSnapshot, ApiError> {
        let params = [("period", period.as_str().to_string())];
        let body = self.request(Method::Get, "/analytics", &params, api_key, None)?;
        serde_json::from_value(body)
            .map_err(|e| ApiError::Other(format!("failed to parse analytics: {e}")))
    }

    fn save_costs(&self, api_key: Option<&str>, entries: &[CostEntry]) -> Result<(), ApiError> {
        let body = serde_json::to_value(entries)
            .map_err(|e| ApiError::Other(format!("failed to encode costs: {e}")))?;
        self.request(Method::Post, "/products/costs", &[], api_key, Some(&body))?;
        Ok(())
    }

    fn send_report(&self, api_key: Option<&str>) -> Result<String, ApiError> {
        let body = self.request(Method::Get, "/send_report", &[], api_key, None)?;
        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("report sent")
            .to_string())
    }

    fn telegram_tokens(&self, user_id: u64) -> Result<TelegramTokens, ApiError> {
        let path = format!("/telegram/user/{user_id}/tokens");
        let body = self.request(Method::Get, &path, &[], None, None)?;
        serde_json::from_value(body)
            .map_err(|e| ApiError::Other(format!("failed to parse telegram tokens: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_strips_trailing_slash() {
        let client = ApiClient::new(
            "http://example.test/",
            Duration::from_secs(1),
            Duration::from_secs(1),
            EventLog::disabled(),
        );
        assert_eq!(client.base_url(), "http://example.test");
        assert_eq!(client.url("/products"), "http://example.test/products");
    }

    #[test]
    fn localhost_is_rewritten_to_ipv4() {
        let client = ApiClient::new(
            "http://localhost:8000",
            Duration::from_secs(1),
            Duration::from_secs(1),
            EventLog::disabled(),
        );
        assert_eq!(client.url("/"), "http://127.0.0.1:8000/");
    }

    #[test]
    fn repeated_probe_failures_log_once_per_outage() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::from_config(&crate::config::schema::LoggingConfig {
            enabled: true,
            path: dir.path().join("events.jsonl").display().to_string(),
        });

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = ApiClient::new(
            &format!("http://127.0.0.1:{port}"),
            Duration::from_secs(1),
            Duration::from_millis(300),
            log.clone(),
        );
        for _ in 0..3 {
            assert!(!client.check_availability());
        }

        let events = log.read_recent(10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::ServiceUnavailable);
    }

    #[test]
    fn from_config_uses_resolved_url() {
        let config = ApiConfig {
            base_url: "http://api.test".to_string(),
            ..ApiConfig::default()
        };
        let client = ApiClient::from_config(&config, EventLog::disabled());
        assert_eq!(client.base_url(), "http://api.test");
    }
}
