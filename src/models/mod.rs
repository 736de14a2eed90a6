//! Domain entities exchanged with the backend and shown in the dashboard.

pub mod demo;

use serde::{Deserialize, Serialize};

/// Image shown when a product carries no image URLs at all.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/150";

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A seller product as returned by `GET /products`.
///
/// `offer_id` is the identity used for cost edits and selection. `cost` of
/// `0.0` means the seller has not entered a cost yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub product_id: u64,
    #[serde(default)]
    pub name: String,
    pub offer_id: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi: Option<f64>,
}

impl Product {
    /// Build a bare product with no images, category or derived fields.
    pub fn new(product_id: u64, name: &str, offer_id: &str, price: f64, cost: f64) -> Self {
        Self {
            product_id,
            name: name.to_string(),
            offer_id: offer_id.to_string(),
            price,
            cost,
            images: Vec::new(),
            image_url: None,
            category: None,
            commission_amount: None,
            profit: None,
            margin: None,
            roi: None,
        }
    }

    /// Builder-style category setter, mostly for fixtures.
    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// The image to display: explicit URL, then first image, then placeholder.
    pub fn display_image(&self) -> &str {
        self.image_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.images.first().map(String::as_str))
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// Category or the empty string when the backend sent none.
    pub fn category_str(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Page descriptor mirrored from a server response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u32,
}

/// One page of products plus the server's pagination descriptor, if it sent one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub pagination: Option<Pagination>,
}

// ---------------------------------------------------------------------------
// Costs
// ---------------------------------------------------------------------------

/// A single cost override, as posted to `/products/costs` and cached locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub product_id: u64,
    pub offer_id: String,
    pub cost: f64,
}

impl From<&Product> for CostEntry {
    fn from(p: &Product) -> Self {
        Self {
            product_id: p.product_id,
            offer_id: p.offer_id.clone(),
            cost: p.cost,
        }
    }
}

/// Apply cached cost overrides to freshly fetched products, matched by `product_id`.
pub fn apply_cost_overrides(products: &mut [Product], overrides: &[CostEntry]) {
    for product in products.iter_mut() {
        if let Some(entry) = overrides.iter().find(|e| e.product_id == product.product_id) {
            product.cost = entry.cost;
        }
    }
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

/// Reporting period for analytics and product queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Day, Period::Week, Period::Month, Period::Year];

    /// Query-string value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    pub fn parse(val: &str) -> Option<Self> {
        match val.to_ascii_lowercase().as_str() {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate analytics for a period, replaced wholesale on every refresh.
///
/// Missing scalars default to zero. Missing series fall back to the demo
/// series so the charts always have something to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    #[serde(default)]
    pub sales: f64,
    #[serde(default)]
    pub margin: f64,
    #[serde(default)]
    pub roi: f64,
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub active_products: u64,
    #[serde(default)]
    pub orders: u64,
    #[serde(default)]
    pub average_order: f64,
    #[serde(default)]
    pub marketplace_fees: f64,
    #[serde(default)]
    pub advertising_costs: f64,
    #[serde(default = "demo::sales_series")]
    pub sales_data: Vec<f64>,
    #[serde(default = "demo::margin_series")]
    pub margin_data: Vec<f64>,
    #[serde(default = "demo::roi_series")]
    pub roi_data: Vec<f64>,
}

impl Default for AnalyticsSnapshot {
    fn default() -> Self {
        Self {
            sales: 0.0,
            margin: 0.0,
            roi: 0.0,
            profit: 0.0,
            total_products: 0,
            active_products: 0,
            orders: 0,
            average_order: 0.0,
            marketplace_fees: 0.0,
            advertising_costs: 0.0,
            sales_data: Vec::new(),
            margin_data: Vec::new(),
            roi_data: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_deserializes_with_missing_cost() {
        let json = r#"{"product_id": 123456, "name": "Item", "offer_id": "TEST-001",
                       "price": 1500, "images": ["https://img/1.png"]}"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.cost, 0.0);
        assert_eq!(p.price, 1500.0);
        assert_eq!(p.display_image(), "https://img/1.png");
        assert_eq!(p.category_str(), "");
    }

    #[test]
    fn display_image_falls_back_to_placeholder() {
        let p = Product::new(1, "A", "A-1", 1.0, 0.0);
        assert_eq!(p.display_image(), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn cost_overrides_match_by_product_id() {
        let mut products = vec![
            Product::new(1, "A", "A-1", 100.0, 0.0),
            Product::new(2, "B", "B-1", 200.0, 10.0),
        ];
        let overrides = vec![CostEntry {
            product_id: 2,
            offer_id: "other".to_string(),
            cost: 55.0,
        }];
        apply_cost_overrides(&mut products, &overrides);
        assert_eq!(products[0].cost, 0.0);
        assert_eq!(products[1].cost, 55.0);
    }

    #[test]
    fn analytics_missing_series_use_demo_defaults() {
        let snap: AnalyticsSnapshot = serde_json::from_str(r#"{"sales": 100}"#).unwrap();
        assert_eq!(snap.sales, 100.0);
        assert_eq!(snap.orders, 0);
        assert_eq!(snap.sales_data, demo::sales_series());
        assert_eq!(snap.roi_data.len(), 7);
    }

    #[test]
    fn period_parse_and_display() {
        assert_eq!(Period::parse("WEEK"), Some(Period::Week));
        assert_eq!(Period::parse("quarter"), None);
        assert_eq!(Period::default().to_string(), "month");
    }
}
