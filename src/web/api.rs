//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an endpoint, works on the locked
//! [`Dashboard`] and returns a `tiny_http` response. POST bodies and query
//! strings are `application/x-www-form-urlencoded`.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Serialize;
use tiny_http::{Response, StatusCode};

use crate::api::{ApiError, Backend};
use crate::auth::Credentials;
use crate::charts::{self, ChartKind};
use crate::metrics::{self, MarginBand};
use crate::models::{Period, Product};
use crate::products::{ItemsInfo, PAGE_SIZES, ProductList};
use crate::shell::{CostSync, Dashboard, ShellError, StateView, Tab};

use super::{Reply, content_type, content_type_json};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct StateResponse<'a> {
    #[serde(flatten)]
    view: StateView<'a>,
    categories: Vec<&'a str>,
    margin_threshold: f64,
    cost_table: Vec<metrics::CostRow>,
}

/// One product card in the list view.
#[derive(Serialize)]
struct ProductRow<'a> {
    product_id: u64,
    name: &'a str,
    offer_id: &'a str,
    category: &'a str,
    image: &'a str,
    price: f64,
    draft_cost: f64,
    saved_cost: Option<f64>,
    changed: bool,
    saving: bool,
    selected: bool,
    profit: f64,
    margin: f64,
    roi: f64,
    band: MarginBand,
    band_class: &'static str,
}

#[derive(Serialize)]
struct ProductsResponse<'a> {
    items: Vec<ProductRow<'a>>,
    categories: Vec<&'a str>,
    search: &'a str,
    category: &'a str,
    page: u32,
    total_pages: u32,
    page_buttons: Vec<u32>,
    has_prev: bool,
    has_next: bool,
    items_per_page: u32,
    page_sizes: [u32; 4],
    info: ItemsInfo,
    info_text: String,
    server_paging: bool,
    page_loading: bool,
    selected: &'a [String],
    bulk_cost: &'a str,
    can_apply_bulk: bool,
    bulk_updating: bool,
    demo: bool,
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    api_available: bool,
    authenticated: bool,
    storage_path: Option<String>,
    log_path: Option<String>,
    version: &'a str,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<Reply> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

/// Build a JSON `{"error": ...}` response with the given status.
pub(crate) fn error_response(status: u16, message: &str) -> Reply {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

fn api_error_response(err: &ApiError) -> Reply {
    let status = match err {
        ApiError::ServiceUnavailable => 503,
        ApiError::Server { .. } | ApiError::Other(_) => 502,
    };
    error_response(status, &err.to_string())
}

fn shell_error_response(err: &ShellError) -> Reply {
    match err {
        ShellError::NotAuthenticated => error_response(401, &err.to_string()),
        ShellError::Offline => error_response(503, &err.to_string()),
        ShellError::TokensNotFound => error_response(404, &err.to_string()),
        ShellError::MissingApiKey => error_response(400, &err.to_string()),
        ShellError::Api(e) => api_error_response(e),
    }
}

/// Decode a form-encoded body or query string. Later keys win.
fn form(input: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(input.as_bytes())
        .into_owned()
        .collect()
}

/// All values of a repeated form key, in order.
fn form_all(input: &str, key: &str) -> Vec<String> {
    url::form_urlencoded::parse(input.as_bytes())
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .collect()
}

fn required<'a>(fields: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn product_row<'a>(list: &'a ProductList, product: &'a Product, threshold: f64) -> ProductRow<'a> {
    let id = product.offer_id.as_str();
    let cost = list.draft_cost(id);
    let margin = metrics::margin(product.price, cost);
    let band = metrics::margin_band(margin, threshold);
    ProductRow {
        product_id: product.product_id,
        name: &product.name,
        offer_id: id,
        category: product.category_str(),
        image: product.display_image(),
        price: product.price,
        draft_cost: cost,
        saved_cost: list.saved_cost(id),
        changed: list.is_cost_changed(id),
        saving: list.is_saving(id),
        selected: list.is_selected(id),
        profit: metrics::profit(product.price, cost),
        margin,
        roi: metrics::roi(product.price, cost),
        band,
        band_class: band.css_class(),
    }
}

fn products_json<B: Backend>(dash: &Dashboard<B>) -> Result<Reply> {
    let list = dash.products();
    let threshold = dash.margin_threshold();
    let info = list.items_info();

    let resp = ProductsResponse {
        items: list
            .current_items()
            .into_iter()
            .map(|p| product_row(list, p, threshold))
            .collect(),
        categories: list.categories(),
        search: &list.filter().search,
        category: &list.filter().category,
        page: list.current_page(),
        total_pages: list.total_pages(),
        page_buttons: list.page_buttons(),
        has_prev: list.has_prev(),
        has_next: list.has_next(),
        items_per_page: list.items_per_page(),
        page_sizes: PAGE_SIZES,
        info,
        info_text: info.to_string(),
        server_paging: list.paging().is_server(),
        page_loading: list.is_page_loading(),
        selected: list.selected(),
        bulk_cost: list.bulk_cost_text(),
        can_apply_bulk: list.can_apply_bulk(),
        bulk_updating: list.is_bulk_updating(),
        demo: dash.state().demo,
    };

    json_response(&resp)
}

// ---------------------------------------------------------------------------
// Shell handlers
// ---------------------------------------------------------------------------

/// `GET /api/state`: shell state, categories and the cost table.
pub fn get_state<B: Backend>(dash: &mut Dashboard<B>) -> Result<Reply> {
    let resp = StateResponse {
        view: dash.view(),
        categories: dash.products().categories(),
        margin_threshold: dash.margin_threshold(),
        cost_table: dash.cost_table(),
    };
    json_response(&resp)
}

/// `POST /api/tab` with `tab=home|products|analytics|settings`.
pub fn post_tab<B: Backend>(dash: &mut Dashboard<B>, body: &str) -> Result<Reply> {
    let fields = form(body);
    let Some(tab) = required(&fields, "tab").and_then(Tab::parse) else {
        return Ok(error_response(400, "unknown tab"));
    };
    dash.select_tab(tab);
    get_state(dash)
}

/// `POST /api/period` with `period=day|week|month|year`.
pub fn post_period<B: Backend>(dash: &mut Dashboard<B>, body: &str) -> Result<Reply> {
    let fields = form(body);
    let Some(period) = required(&fields, "period").and_then(Period::parse) else {
        return Ok(error_response(400, "unknown period"));
    };
    dash.select_period(period);
    get_state(dash)
}

/// `POST /api/refresh`
pub fn post_refresh<B: Backend>(dash: &mut Dashboard<B>) -> Result<Reply> {
    dash.refresh();
    get_state(dash)
}

/// `POST /api/theme`: flip the theme.
pub fn post_theme<B: Backend>(dash: &mut Dashboard<B>) -> Result<Reply> {
    let dark = dash.toggle_theme();
    json_response(&serde_json::json!({
        "dark_theme": dark,
        "theme_class": dash.theme_class(),
    }))
}

// ---------------------------------------------------------------------------
// Product handlers
// ---------------------------------------------------------------------------

/// `GET /api/products?search=&category=&page=&limit=`
///
/// Filter parameters replace the current filter when present. A changed
/// `limit` resets to page 1 before `page` is applied.
pub fn get_products<B: Backend>(dash: &mut Dashboard<B>, query: &str) -> Result<Reply> {
    let params = form(query);

    if let Some(search) = params.get("search") {
        dash.products_mut().set_search(search);
    }
    if let Some(category) = params.get("category") {
        dash.products_mut().set_category(category);
    }

    let limit = params.get("limit").and_then(|v| v.parse::<u32>().ok());
    if let Some(limit) = limit
        && limit != dash.products().items_per_page()
        && let Err(e) = dash.set_items_per_page(limit)
    {
        return Ok(api_error_response(&e));
    }

    let page = params.get("page").and_then(|v| v.parse::<u32>().ok());
    if let Some(page) = page
        && page != dash.products().current_page()
        && let Err(e) = dash.go_to_page(page)
    {
        return Ok(api_error_response(&e));
    }

    products_json(dash)
}

/// `POST /api/products/cost` with `offer_id` and `cost`: edit the draft only.
pub fn post_product_cost<B: Backend>(dash: &mut Dashboard<B>, body: &str) -> Result<Reply> {
    let fields = form(body);
    let Some(offer_id) = required(&fields, "offer_id") else {
        return Ok(error_response(400, "offer_id is required"));
    };
    let raw = fields.get("cost").map(String::as_str).unwrap_or("");
    dash.products_mut().edit_cost(offer_id, raw);
    products_json(dash)
}

/// `POST /api/products/save`: with `offer_id` saves that item's draft,
/// without it saves every loaded product's cost.
pub fn post_products_save<B: Backend>(dash: &mut Dashboard<B>, body: &str) -> Result<Reply> {
    let fields = form(body);

    if let Some(offer_id) = required(&fields, "offer_id") {
        return match dash.save_cost(offer_id) {
            Ok(_) => products_json(dash),
            Err(e) => Ok(api_error_response(&e)),
        };
    }

    match dash.save_costs() {
        Ok(sync) => {
            let message = match sync {
                CostSync::Synced => "Product costs saved",
                CostSync::LocalOnly => "API server is unavailable. Costs saved locally only",
            };
            json_response(&serde_json::json!({ "sync": sync, "message": message }))
        }
        Err(e) => Ok(shell_error_response(&e)),
    }
}

/// `POST /api/products/bulk` with `action=toggle|clear|value|apply`.
///
/// `toggle` takes `offer_id`, `value` takes `cost`.
pub fn post_products_bulk<B: Backend>(dash: &mut Dashboard<B>, body: &str) -> Result<Reply> {
    let fields = form(body);

    match required(&fields, "action") {
        Some("toggle") => {
            for id in form_all(body, "offer_id") {
                dash.products_mut().toggle_select(&id);
            }
        }
        Some("clear") => dash.products_mut().clear_selection(),
        Some("value") => {
            let raw = fields.get("cost").map(String::as_str).unwrap_or("");
            dash.products_mut().set_bulk_cost(raw);
        }
        Some("apply") => {
            if let Err(e) = dash.apply_bulk() {
                return Ok(api_error_response(&e));
            }
        }
        _ => return Ok(error_response(400, "unknown bulk action")),
    }

    products_json(dash)
}

// ---------------------------------------------------------------------------
// Session handlers
// ---------------------------------------------------------------------------

/// `POST /api/login` with the credentials bundle fields and optional `api_key`.
pub fn post_login<B: Backend>(dash: &mut Dashboard<B>, body: &str) -> Result<Reply> {
    let fields = form(body);
    let (Some(token), Some(client_id)) = (
        required(&fields, "ozon_api_token"),
        required(&fields, "ozon_client_id"),
    ) else {
        return Ok(error_response(400, "ozon_api_token and ozon_client_id are required"));
    };

    let credentials = Credentials {
        ozon_api_token: token.to_string(),
        ozon_client_id: client_id.to_string(),
        telegram_bot_token: required(&fields, "telegram_bot_token").map(str::to_string),
        telegram_chat_id: required(&fields, "telegram_chat_id").map(str::to_string),
    };
    let api_key = required(&fields, "api_key").map(str::to_string);
    dash.login(credentials, api_key.as_deref());
    get_state(dash)
}

/// `POST /api/logout`
pub fn post_logout<B: Backend>(dash: &mut Dashboard<B>) -> Result<Reply> {
    dash.logout();
    get_state(dash)
}

/// `POST /api/telegram` with `user_id`.
pub fn post_telegram<B: Backend>(dash: &mut Dashboard<B>, body: &str) -> Result<Reply> {
    let fields = form(body);
    let Some(user_id) = required(&fields, "user_id").and_then(|v| v.parse::<u64>().ok()) else {
        return Ok(error_response(400, "numeric user_id is required"));
    };

    match dash.telegram_login(user_id) {
        Ok(()) => get_state(dash),
        Err(e) => Ok(shell_error_response(&e)),
    }
}

/// `POST /api/report`
pub fn post_report<B: Backend>(dash: &mut Dashboard<B>) -> Result<Reply> {
    match dash.send_report() {
        Ok(message) => json_response(&serde_json::json!({
            "message": message,
            "status": dash.state().report_status,
        })),
        Err(e) => Ok(shell_error_response(&e)),
    }
}

// ---------------------------------------------------------------------------
// Charts and health
// ---------------------------------------------------------------------------

/// `GET /api/charts/{sales|margin|roi}.svg`
pub fn get_chart<B: Backend>(dash: &mut Dashboard<B>, path: &str) -> Result<Reply> {
    let kind = path
        .strip_prefix("/api/charts/")
        .and_then(|name| name.strip_suffix(".svg"))
        .and_then(ChartKind::parse);
    let Some(kind) = kind else {
        return Ok(error_response(404, "unknown chart"));
    };

    let svg = charts::render_svg(kind, kind.series(&dash.state().analytics));
    Ok(Response::from_data(svg.into_bytes())
        .with_header(content_type("image/svg+xml"))
        .with_status_code(StatusCode(200)))
}

/// `GET /api/health`: probes the backend.
pub fn get_health<B: Backend>(dash: &mut Dashboard<B>) -> Result<Reply> {
    let api_available = dash.probe();
    let resp = HealthResponse {
        api_available,
        authenticated: dash.state().is_authenticated(),
        storage_path: dash.storage().path().map(|p| p.display().to_string()),
        log_path: dash.log().path().map(|p| p.display().to_string()),
        version: env!("CARGO_PKG_VERSION"),
    };
    json_response(&resp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
