//! Shared helpers for integration tests: a throwaway HTTP backend built on
//! `tiny_http` that answers from a routing closure and records every request.

#![allow(dead_code)]

use std::io::Read;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

use tiny_http::{Response, Server};

/// One request as seen by the fake backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub api_key: Option<String>,
    pub body: String,
}

pub struct FakeBackend {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeBackend {
    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose path (without query) equals `path`.
    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.split('?').next() == Some(path))
            .collect()
    }
}

/// Start a backend on an ephemeral port. `route` receives the method and the
/// full request URL (path plus query) and returns a status and JSON body.
pub fn spawn_backend<F>(route: F) -> FakeBackend
where
    F: Fn(&str, &str) -> (u16, String) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);

    thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let api_key = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("X-API-Key"))
                .map(|h| h.value.as_str().to_string());
            let method = request.method().to_string();
            let url = request.url().to_string();

            let (status, reply) = route(&method, &url);
            recorded.lock().unwrap().push(Recorded {
                method,
                url,
                api_key,
                body,
            });
            let _ = request.respond(Response::from_string(reply).with_status_code(status));
        }
    });

    FakeBackend {
        url: format!("http://{addr}"),
        requests,
    }
}

/// URL of a local port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

/// JSON body for `GET /products` with the given `(offer_id, price, cost)` items.
pub fn products_body(items: &[(&str, f64, f64)], paging: Option<(u32, u32, u32)>) -> String {
    let items: Vec<serde_json::Value> = items
        .iter()
        .enumerate()
        .map(|(i, (offer_id, price, cost))| {
            serde_json::json!({
                "product_id": i as u64 + 1,
                "name": format!("Product {offer_id}"),
                "offer_id": offer_id,
                "price": price,
                "cost": cost,
                "category": if i % 2 == 0 { "Home" } else { "Garden" },
            })
        })
        .collect();

    let mut result = serde_json::json!({ "items": items });
    if let Some((page, limit, total)) = paging {
        result["page"] = page.into();
        result["limit"] = limit.into();
        result["total"] = total.into();
    }
    serde_json::json!({ "result": result }).to_string()
}
