//! Embedded web dashboard for ozon-dash.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page seller dashboard (products, analytics, settings)
//! - JSON API endpoints driving the shared [`Dashboard`]
//! - SVG charts for the analytics series
//!
//! Launched via `ozon-dash web` (default: `http://127.0.0.1:9747`). A
//! background thread re-probes the backend on a fixed interval so the
//! offline banner clears on its own once the backend is back.

mod api;
mod frontend;

use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::api::Backend;
use crate::shell::Dashboard;

pub(crate) type Reply = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server on the given address.
///
/// Blocks the current thread. Requests are handled sequentially and
/// serialize with the probe thread on the dashboard lock.
pub fn serve<B>(addr: &str, dashboard: Dashboard<B>, probe_interval: Duration, open: bool) -> Result<()>
where
    B: Backend + Send + 'static,
{
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("ozon-dash running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    let dashboard = Arc::new(Mutex::new(dashboard));
    spawn_probe(Arc::clone(&dashboard), probe_interval);

    if open {
        let _ = open_browser(&format!("http://{addr}"));
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let result = {
            let mut dash = dashboard.lock().unwrap_or_else(PoisonError::into_inner);
            dispatch(&mut dash, &method, &url, body.as_deref())
        };

        let resp = result.unwrap_or_else(|e| api::error_response(500, &format!("{e:#}")));
        let _ = request.respond(resp);

        println!(
            "{} {} {}",
            method,
            url,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

/// Re-probe the backend every `interval` for the life of the process.
fn spawn_probe<B>(dashboard: Arc<Mutex<Dashboard<B>>>, interval: Duration)
where
    B: Backend + Send + 'static,
{
    thread::spawn(move || {
        loop {
            thread::sleep(interval);
            let mut dash = dashboard.lock().unwrap_or_else(PoisonError::into_inner);
            dash.probe();
        }
    });
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
pub(crate) fn dispatch<B: Backend>(
    dash: &mut Dashboard<B>,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<Reply> {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let body = body.unwrap_or("");

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        // API: shell
        (&Method::Get, "/api/state") => api::get_state(dash),
        (&Method::Post, "/api/tab") => api::post_tab(dash, body),
        (&Method::Post, "/api/period") => api::post_period(dash, body),
        (&Method::Post, "/api/refresh") => api::post_refresh(dash),
        (&Method::Post, "/api/theme") => api::post_theme(dash),

        // API: products
        (&Method::Get, "/api/products") => api::get_products(dash, query),
        (&Method::Post, "/api/products/cost") => api::post_product_cost(dash, body),
        (&Method::Post, "/api/products/save") => api::post_products_save(dash, body),
        (&Method::Post, "/api/products/bulk") => api::post_products_bulk(dash, body),

        // API: session
        (&Method::Post, "/api/login") => api::post_login(dash, body),
        (&Method::Post, "/api/logout") => api::post_logout(dash),
        (&Method::Post, "/api/telegram") => api::post_telegram(dash, body),
        (&Method::Post, "/api/report") => api::post_report(dash),

        // Charts
        (&Method::Get, p) if p.starts_with("/api/charts/") => api::get_chart(dash, p),

        (&Method::Get, "/api/health") => api::get_health(dash),

        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Serve the embedded single-page frontend.
fn serve_frontend() -> Reply {
    Response::from_data(frontend::INDEX_HTML.as_bytes().to_vec())
        .with_header(content_type("text/html; charset=utf-8"))
        .with_status_code(StatusCode(200))
}

fn not_found() -> Reply {
    api::error_response(404, "not found")
}

pub(crate) fn content_type(value: &str) -> Header {
    Header::from_bytes("Content-Type", value).expect("static content type header is valid")
}

pub(crate) fn content_type_json() -> Header {
    content_type("application/json; charset=utf-8")
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
