/// Search and category filtering for the product list.
///
/// Filtering is always applied client side, over whatever products are
/// currently loaded (under server pagination that is one page).
use crate::models::Product;

/// Active search term and category filter. Empty strings mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: String,
    pub category: String,
}

impl ProductFilter {
    pub fn new(search: &str, category: &str) -> Self {
        Self {
            search: search.to_string(),
            category: category.to_string(),
        }
    }

    /// Whether a product passes both filters.
    ///
    /// Search matches name or offer id, case-insensitively. Category must
    /// match exactly.
    pub fn matches(&self, product: &Product) -> bool {
        matches_search(product, &self.search) && matches_category(product, &self.category)
    }

    /// Products passing the filter, in their original order.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.category.is_empty()
    }
}

pub fn matches_search(product: &Product, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    product.name.to_lowercase().contains(&term) || product.offer_id.to_lowercase().contains(&term)
}

pub fn matches_category(product: &Product, category: &str) -> bool {
    category.is_empty() || product.category_str() == category
}

/// Distinct non-empty categories in first-seen order.
pub fn categories(products: &[Product]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for category in products.iter().map(Product::category_str) {
        if !category.is_empty() && !seen.contains(&category) {
            seen.push(category);
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Product> {
        vec![
            Product::new(1, "Red Kettle", "KT-001", 1200.0, 0.0).with_category("Kitchen"),
            Product::new(2, "Blue Mug", "MG-002", 300.0, 100.0).with_category("Kitchen"),
            Product::new(3, "Desk Lamp", "LP-003", 2100.0, 900.0).with_category("Office"),
            Product::new(4, "Kettle Descaler", "DS-004", 150.0, 0.0),
        ]
    }

    fn ids(products: &[&Product]) -> Vec<u64> {
        products.iter().map(|p| p.product_id).collect()
    }

    #[test]
    fn empty_filter_passes_everything() {
        let products = catalog();
        assert_eq!(ProductFilter::default().apply(&products).len(), 4);
        assert!(ProductFilter::default().is_empty());
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_offer_id() {
        let products = catalog();
        assert_eq!(ids(&ProductFilter::new("kettle", "").apply(&products)), vec![1, 4]);
        assert_eq!(ids(&ProductFilter::new("mg-0", "").apply(&products)), vec![2]);
    }

    #[test]
    fn category_is_exact_match() {
        let products = catalog();
        assert_eq!(ids(&ProductFilter::new("", "Kitchen").apply(&products)), vec![1, 2]);
        assert!(ProductFilter::new("", "kitchen").apply(&products).is_empty());
    }

    #[test]
    fn filters_commute() {
        let products = catalog();
        let both = ProductFilter::new("kettle", "Kitchen").apply(&products);

        let search_first: Vec<&Product> = products
            .iter()
            .filter(|p| matches_search(p, "kettle"))
            .filter(|p| matches_category(p, "Kitchen"))
            .collect();
        let category_first: Vec<&Product> = products
            .iter()
            .filter(|p| matches_category(p, "Kitchen"))
            .filter(|p| matches_search(p, "kettle"))
            .collect();

        assert_eq!(ids(&both), vec![1]);
        assert_eq!(ids(&search_first), ids(&category_first));
    }

    #[test]
    fn filtering_is_idempotent() {
        let products = catalog();
        let filter = ProductFilter::new("e", "Kitchen");
        let once: Vec<Product> = filter.apply(&products).into_iter().cloned().collect();
        let twice = filter.apply(&once);
        assert_eq!(ids(&twice), once.iter().map(|p| p.product_id).collect::<Vec<_>>());
    }

    #[test]
    fn categories_are_distinct_and_ordered() {
        let products = catalog();
        assert_eq!(categories(&products), vec!["Kitchen", "Office"]);
    }
}
