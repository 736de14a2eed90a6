//! Hard-coded offline data shown while the backend is unreachable.

use super::{AnalyticsSnapshot, Product, PLACEHOLDER_IMAGE};

pub fn sales_series() -> Vec<f64> {
    vec![15000.0, 18000.0, 22000.0, 24500.0, 20000.0, 23000.0, 24500.0]
}

pub fn margin_series() -> Vec<f64> {
    vec![18.5, 20.2, 22.8, 24.1, 23.5, 24.0, 23.5]
}

pub fn roi_series() -> Vec<f64> {
    vec![33.2, 38.5, 41.2, 43.7, 42.1, 42.5, 42.8]
}

/// The two demo products `DEMO-001` and `DEMO-002`.
pub fn products() -> Vec<Product> {
    let mut first = Product::new(123456, "Демо товар 1", "DEMO-001", 1500.0, 750.0);
    first.images = vec![PLACEHOLDER_IMAGE.to_string()];
    let mut second = Product::new(123457, "Демо товар 2", "DEMO-002", 2500.0, 1250.0);
    second.images = vec![PLACEHOLDER_IMAGE.to_string()];
    vec![first, second]
}

/// Demo analytics snapshot for a month of sales.
pub fn analytics() -> AnalyticsSnapshot {
    AnalyticsSnapshot {
        sales: 24500.0,
        margin: 23.5,
        roi: 42.8,
        profit: 8250.0,
        total_products: 36,
        active_products: 28,
        orders: 52,
        average_order: 3100.0,
        marketplace_fees: 3675.0,
        advertising_costs: 2200.0,
        sales_data: sales_series(),
        margin_data: margin_series(),
        roi_data: roi_series(),
    }
}
