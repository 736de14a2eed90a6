//! Financial metrics for seller products: profit, margin and ROI.
//!
//! All functions are pure and total over `price >= 0`, `cost >= 0`. A cost of
//! zero means "not entered yet", so margin and ROI are reported as `0.0`
//! rather than derived from an unknown cost.

use serde::Serialize;

use crate::models::Product;

/// Margin above which a product is highlighted as high-margin (percent).
pub const HIGH_MARGIN_PCT: f64 = 30.0;

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

/// Profit per unit: `price - cost`. Negative when cost exceeds price.
pub fn profit(price: f64, cost: f64) -> f64 {
    price - cost
}

/// Profit as a percentage of price.
///
/// Returns `0.0` when the cost is unset. A zero price with a known cost also
/// yields `0.0` instead of an infinite percentage.
pub fn margin(price: f64, cost: f64) -> f64 {
    if cost > 0.0 && price > 0.0 {
        profit(price, cost) / price * 100.0
    } else {
        0.0
    }
}

/// Profit as a percentage of cost. Returns `0.0` when the cost is unset.
pub fn roi(price: f64, cost: f64) -> f64 {
    if cost > 0.0 {
        profit(price, cost) / cost * 100.0
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Margin bands
// ---------------------------------------------------------------------------

/// Highlight band for a product's margin in the cost table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarginBand {
    /// Below the user's notification threshold.
    Low,
    Normal,
    /// Above [`HIGH_MARGIN_PCT`].
    High,
}

impl MarginBand {
    /// CSS class used by the web view, if any.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Low => "low-margin",
            Self::Normal => "",
            Self::High => "high-margin",
        }
    }
}

/// Classify a margin against the notification threshold.
pub fn margin_band(margin: f64, threshold: f64) -> MarginBand {
    if margin < threshold {
        MarginBand::Low
    } else if margin > HIGH_MARGIN_PCT {
        MarginBand::High
    } else {
        MarginBand::Normal
    }
}

// ---------------------------------------------------------------------------
// Product-level derivation
// ---------------------------------------------------------------------------

/// Fill `profit`, `margin` and `roi` on a product from its price and cost.
pub fn derive(product: &mut Product) {
    product.profit = Some(profit(product.price, product.cost));
    product.margin = Some(margin(product.price, product.cost));
    product.roi = Some(roi(product.price, product.cost));
}

/// One row of the cost/margin/ROI table shown on the analytics tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostRow {
    pub offer_id: String,
    pub name: String,
    pub price: f64,
    pub cost: f64,
    pub profit: f64,
    pub margin: f64,
    pub roi: f64,
    pub band: MarginBand,
}

/// Build the cost table for a product list.
pub fn cost_table(products: &[Product], threshold: f64) -> Vec<CostRow> {
    products
        .iter()
        .map(|p| {
            let margin = margin(p.price, p.cost);
            CostRow {
                offer_id: p.offer_id.clone(),
                name: p.name.clone(),
                price: p.price,
                cost: p.cost,
                profit: profit(p.price, p.cost),
                margin,
                roi: roi(p.price, p.cost),
                band: margin_band(margin, threshold),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
