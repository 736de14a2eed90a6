//! Product list controller.
//!
//! Owns everything the product list view needs besides the products
//! themselves: search/category filter, pagination cursor, selection, per-item
//! draft and saved costs, and the bulk cost editor.
//!
//! The controller never talks to the network. Saving, bulk updates and page
//! fetches go through the caller-supplied [`ProductActions`].
//!
//! Pagination runs in exactly one of two modes, fixed at construction:
//! server mode when the caller can fetch pages *and* supplied a pagination
//! descriptor, client mode (slicing the filtered list) otherwise.

pub mod filter;
pub mod pagination;

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::api::ApiError;
use crate::models::{Pagination, Product, ProductPage};

pub use filter::ProductFilter;
pub use pagination::{ItemsInfo, PAGE_SIZES};

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// Side effects requested by the product list.
pub trait ProductActions {
    /// Persist one product's cost.
    fn save_cost(&mut self, offer_id: &str, cost: f64) -> Result<(), ApiError>;

    /// Persist one cost for several products in a single call.
    fn bulk_update(&mut self, offer_ids: &[String], cost: f64) -> Result<(), ApiError>;

    /// Fetch one page from the server. Only called in server mode.
    fn fetch_page(&mut self, page: u32, limit: u32) -> Result<ProductPage, ApiError> {
        let _ = (page, limit);
        Err(ApiError::Other("page fetching is not supported".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Pagination mode
// ---------------------------------------------------------------------------

/// Active pagination mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Paging {
    /// Page state mirrored from the server.
    Server(Pagination),
    /// Page state owned locally over the loaded products.
    Client { page: u32, limit: u32 },
}

impl Paging {
    /// Choose the mode: server iff the caller can fetch pages and sent a descriptor.
    pub fn select(pagination: Option<Pagination>, can_fetch_pages: bool, page_size: u32) -> Self {
        match pagination {
            Some(p) if can_fetch_pages => Self::Server(p),
            _ => Self::Client {
                page: 1,
                limit: page_size.max(1),
            },
        }
    }

    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server(_))
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ProductList {
    products: Vec<Product>,
    filter: ProductFilter,
    paging: Paging,
    page_loading: bool,
    drafts: HashMap<String, f64>,
    saved: HashMap<String, f64>,
    saving: HashSet<String>,
    selection: Vec<String>,
    bulk_cost: String,
    bulk_in_flight: bool,
}

impl ProductList {
    pub fn new(
        products: Vec<Product>,
        pagination: Option<Pagination>,
        can_fetch_pages: bool,
        page_size: u32,
    ) -> Self {
        let mut list = Self {
            products: Vec::new(),
            filter: ProductFilter::default(),
            paging: Paging::select(pagination, can_fetch_pages, page_size),
            page_loading: false,
            drafts: HashMap::new(),
            saved: HashMap::new(),
            saving: HashSet::new(),
            selection: Vec::new(),
            bulk_cost: String::new(),
            bulk_in_flight: false,
        };
        list.load(products, None);
        list
    }

    /// Client-mode list over an already fetched array.
    pub fn client(products: Vec<Product>, page_size: u32) -> Self {
        Self::new(products, None, false, page_size)
    }

    /// Replace the loaded products and reset draft and saved costs from them.
    ///
    /// In server mode a new descriptor replaces the mirrored one.
    pub fn load(&mut self, products: Vec<Product>, pagination: Option<Pagination>) {
        self.saved = products
            .iter()
            .map(|p| (p.offer_id.clone(), p.cost))
            .collect();
        self.drafts = self.saved.clone();
        self.products = products;

        if let (Paging::Server(current), Some(next)) = (&mut self.paging, pagination) {
            *current = next;
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn paging(&self) -> Paging {
        self.paging
    }

    // -- Filtering --

    pub fn filter(&self) -> &ProductFilter {
        &self.filter
    }

    /// Carry a filter over from a previous list.
    pub fn set_filter(&mut self, filter: ProductFilter) {
        self.filter = filter;
        self.rewind_client_page();
    }

    pub fn set_search(&mut self, term: &str) {
        self.filter.search = term.to_string();
        self.rewind_client_page();
    }

    pub fn set_category(&mut self, category: &str) {
        self.filter.category = category.to_string();
        self.rewind_client_page();
    }

    /// A changed filter reshapes the client-side pages; start over at page 1.
    fn rewind_client_page(&mut self) {
        if let Paging::Client { limit, .. } = self.paging {
            self.paging = Paging::Client { page: 1, limit };
        }
    }

    pub fn categories(&self) -> Vec<&str> {
        filter::categories(&self.products)
    }

    /// Loaded products passing the current filter.
    pub fn filtered(&self) -> Vec<&Product> {
        self.filter.apply(&self.products)
    }

    // -- Pagination --

    pub fn current_page(&self) -> u32 {
        match self.paging {
            Paging::Server(p) => p.page,
            Paging::Client { page, .. } => page,
        }
    }

    pub fn items_per_page(&self) -> u32 {
        match self.paging {
            Paging::Server(p) => p.limit,
            Paging::Client { limit, .. } => limit,
        }
    }

    /// Item count the page math runs over: server total, or the filtered length.
    pub fn total_items(&self) -> usize {
        match self.paging {
            Paging::Server(p) => p.total as usize,
            Paging::Client { .. } => self.filtered().len(),
        }
    }

    pub fn total_pages(&self) -> u32 {
        pagination::total_pages(self.total_items(), self.items_per_page())
    }

    /// Products to render on the current page.
    ///
    /// In server mode the loaded page is already the current page.
    pub fn current_items(&self) -> Vec<&Product> {
        let filtered = self.filtered();
        match self.paging {
            Paging::Server(_) => filtered,
            Paging::Client { page, limit } => {
                let range = pagination::page_bounds(page, limit, filtered.len());
                filtered[range].to_vec()
            }
        }
    }

    pub fn page_buttons(&self) -> Vec<u32> {
        pagination::page_window(self.current_page(), self.total_pages())
    }

    pub fn has_prev(&self) -> bool {
        self.current_page() > 1 && !self.page_loading
    }

    pub fn has_next(&self) -> bool {
        self.current_page() < self.total_pages() && !self.page_loading
    }

    pub fn items_info(&self) -> ItemsInfo {
        ItemsInfo::new(self.current_page(), self.items_per_page(), self.total_items())
    }

    pub fn is_page_loading(&self) -> bool {
        self.page_loading
    }

    /// Move to a page. Server mode fetches it through `actions`.
    pub fn go_to_page(&mut self, page: u32, actions: &mut dyn ProductActions) -> Result<(), ApiError> {
        if self.page_loading {
            return Ok(());
        }
        let page = page.clamp(1, self.total_pages().max(1));

        match self.paging {
            Paging::Server(p) => self.fetch(page, p.limit, actions),
            Paging::Client { limit, .. } => {
                self.paging = Paging::Client { page, limit };
                Ok(())
            }
        }
    }

    /// Change the page size and return to page 1.
    pub fn set_items_per_page(
        &mut self,
        limit: u32,
        actions: &mut dyn ProductActions,
    ) -> Result<(), ApiError> {
        if self.page_loading {
            return Ok(());
        }
        let limit = limit.max(1);

        match self.paging {
            Paging::Server(_) => self.fetch(1, limit, actions),
            Paging::Client { .. } => {
                self.paging = Paging::Client { page: 1, limit };
                Ok(())
            }
        }
    }

    fn fetch(&mut self, page: u32, limit: u32, actions: &mut dyn ProductActions) -> Result<(), ApiError> {
        self.page_loading = true;
        let result = actions.fetch_page(page, limit);
        self.page_loading = false;

        let fetched = result?;
        let total = match self.paging {
            Paging::Server(p) => p.total,
            Paging::Client { .. } => 0,
        };
        let descriptor = fetched
            .pagination
            .unwrap_or(Pagination { page, limit, total });
        self.load(fetched.items, Some(descriptor));
        Ok(())
    }

    // -- Per-item cost editing --

    /// Update the draft cost from user input.
    ///
    /// Unparsable input counts as `0`; negative values are clamped to `0`.
    pub fn edit_cost(&mut self, offer_id: &str, raw: &str) {
        self.drafts.insert(offer_id.to_string(), parse_cost(raw).unwrap_or(0.0));
    }

    pub fn draft_cost(&self, offer_id: &str) -> f64 {
        self.drafts.get(offer_id).copied().unwrap_or(0.0)
    }

    pub fn saved_cost(&self, offer_id: &str) -> Option<f64> {
        self.saved.get(offer_id).copied()
    }

    /// Whether the draft differs from the last saved value. Drives the save button.
    pub fn is_cost_changed(&self, offer_id: &str) -> bool {
        self.drafts.get(offer_id) != self.saved.get(offer_id)
    }

    pub fn is_saving(&self, offer_id: &str) -> bool {
        self.saving.contains(offer_id)
    }

    /// Start saving a changed draft. Returns the cost to send, or `None` when
    /// there is nothing to save or a save for this item is already in flight.
    pub fn begin_save(&mut self, offer_id: &str) -> Option<f64> {
        if !self.is_cost_changed(offer_id) || self.is_saving(offer_id) {
            return None;
        }
        let cost = self.draft_cost(offer_id);
        self.saving.insert(offer_id.to_string());
        Some(cost)
    }

    /// Finish a save started with [`begin_save`](Self::begin_save).
    ///
    /// On success the saved value (and the product's cost) becomes `cost`. On
    /// failure the draft stays diverged so the user can retry.
    pub fn finish_save(&mut self, offer_id: &str, cost: f64, result: &Result<(), ApiError>) {
        self.saving.remove(offer_id);
        if result.is_ok() {
            self.saved.insert(offer_id.to_string(), cost);
            self.set_product_cost(offer_id, cost);
        }
    }

    /// Save one item's draft through `actions`. `Ok(false)` when unchanged.
    pub fn save_cost(&mut self, offer_id: &str, actions: &mut dyn ProductActions) -> Result<bool, ApiError> {
        let Some(cost) = self.begin_save(offer_id) else {
            return Ok(false);
        };
        let result = actions.save_cost(offer_id, cost);
        self.finish_save(offer_id, cost, &result);
        result.map(|()| true)
    }

    fn set_product_cost(&mut self, offer_id: &str, cost: f64) {
        if let Some(p) = self.products.iter_mut().find(|p| p.offer_id == offer_id) {
            p.cost = cost;
        }
    }

    // -- Selection --

    /// Toggle an item's membership in the bulk selection.
    ///
    /// Offer ids that are not among the loaded products are never selected.
    pub fn toggle_select(&mut self, offer_id: &str) {
        if let Some(pos) = self.selection.iter().position(|id| id == offer_id) {
            self.selection.remove(pos);
        } else if self.products.iter().any(|p| p.offer_id == offer_id) {
            self.selection.push(offer_id.to_string());
        }
    }

    pub fn is_selected(&self, offer_id: &str) -> bool {
        self.selection.iter().any(|id| id == offer_id)
    }

    pub fn selected(&self) -> &[String] {
        &self.selection
    }

    /// Drop the selection and the pending bulk value.
    pub fn clear_selection(&mut self) {
        if self.bulk_in_flight {
            return;
        }
        self.selection.clear();
        self.bulk_cost.clear();
    }

    // -- Bulk edit --

    pub fn set_bulk_cost(&mut self, raw: &str) {
        if !self.bulk_in_flight {
            self.bulk_cost = raw.to_string();
        }
    }

    pub fn bulk_cost_text(&self) -> &str {
        &self.bulk_cost
    }

    pub fn is_bulk_updating(&self) -> bool {
        self.bulk_in_flight
    }

    /// Apply is enabled with a valid value, a non-empty selection and no update in flight.
    pub fn can_apply_bulk(&self) -> bool {
        !self.bulk_in_flight && !self.selection.is_empty() && parse_cost(&self.bulk_cost).is_some()
    }

    /// Start a bulk update. Returns the selected ids and the parsed cost.
    pub fn begin_bulk(&mut self) -> Option<(Vec<String>, f64)> {
        if !self.can_apply_bulk() {
            return None;
        }
        let cost = parse_cost(&self.bulk_cost)?;
        self.bulk_in_flight = true;
        Some((self.selection.clone(), cost))
    }

    /// Finish a bulk update. On success the cost is mirrored into draft and
    /// saved maps for every id, and selection and bulk value are cleared.
    pub fn finish_bulk(&mut self, offer_ids: &[String], cost: f64, result: &Result<(), ApiError>) {
        self.bulk_in_flight = false;
        if result.is_err() {
            return;
        }
        for id in offer_ids {
            self.drafts.insert(id.clone(), cost);
            self.saved.insert(id.clone(), cost);
            self.set_product_cost(id, cost);
        }
        self.selection.clear();
        self.bulk_cost.clear();
    }

    /// Push the bulk value to every selected item through `actions`.
    /// `Ok(false)` when the editor is disabled.
    pub fn apply_bulk(&mut self, actions: &mut dyn ProductActions) -> Result<bool, ApiError> {
        let Some((ids, cost)) = self.begin_bulk() else {
            return Ok(false);
        };
        let result = actions.bulk_update(&ids, cost);
        self.finish_bulk(&ids, cost, &result);
        result.map(|()| true)
    }
}

/// Parse a cost field. `None` for empty, unparsable, negative or non-finite input.
pub fn parse_cost(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().replace(',', ".").parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
