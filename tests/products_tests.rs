/// Integration tests for the product list controller, the metrics it feeds
/// and the credential cache.
///
/// These run through the public API only and check properties across many
/// filter and page-size combinations rather than single cases.
use ozon_dash::api::ApiError;
use ozon_dash::auth::{self, Credentials};
use ozon_dash::metrics::{self, MarginBand};
use ozon_dash::models::{Product, ProductPage};
use ozon_dash::products::{PAGE_SIZES, ProductActions, ProductFilter, ProductList};

#[derive(Default)]
struct Recorder {
    saves: Vec<(String, f64)>,
    bulks: Vec<(Vec<String>, f64)>,
    fail_with: Option<ApiError>,
}

impl ProductActions for Recorder {
    fn save_cost(&mut self, offer_id: &str, cost: f64) -> Result<(), ApiError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.saves.push((offer_id.to_string(), cost));
        Ok(())
    }

    fn bulk_update(&mut self, offer_ids: &[String], cost: f64) -> Result<(), ApiError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.bulks.push((offer_ids.to_vec(), cost));
        Ok(())
    }

    fn fetch_page(&mut self, _page: u32, _limit: u32) -> Result<ProductPage, ApiError> {
        panic!("client-mode lists must not fetch pages");
    }
}

fn catalog(n: u64) -> Vec<Product> {
    (1..=n)
        .map(|i| {
            let category = match i % 3 {
                0 => "Kitchen",
                1 => "Garden",
                _ => "Toys",
            };
            Product::new(
                i,
                &format!("Item {i:03}"),
                &format!("OF-{i:03}"),
                100.0 * i as f64,
                40.0 * i as f64,
            )
            .with_category(category)
        })
        .collect()
}

fn offer_ids(products: &[&Product]) -> Vec<String> {
    products.iter().map(|p| p.offer_id.clone()).collect()
}

// ---------------------------------------------------------------------------
// Filtering and client pagination
// ---------------------------------------------------------------------------

#[test]
fn filter_order_does_not_matter() {
    let mut a = ProductList::client(catalog(40), 10);
    a.set_search("item 0");
    a.set_category("Garden");

    let mut b = ProductList::client(catalog(40), 10);
    b.set_category("Garden");
    b.set_search("ITEM 0");

    assert_eq!(offer_ids(&a.filtered()), offer_ids(&b.filtered()));
    assert!(!a.filtered().is_empty());
}

#[test]
fn client_pages_partition_the_filtered_list() {
    let filters = [
        ProductFilter::default(),
        ProductFilter::new("", "Toys"),
        ProductFilter::new("of-01", ""),
        ProductFilter::new("nothing matches", ""),
    ];
    let mut actions = Recorder::default();

    for filter in filters {
        for limit in PAGE_SIZES.iter().copied().chain([3, 7]) {
            let mut list = ProductList::client(catalog(57), 10);
            list.set_filter(filter.clone());
            list.set_items_per_page(limit, &mut actions).unwrap();

            let expected = offer_ids(&list.filtered());
            let mut collected = Vec::new();
            for page in 1..=list.total_pages() {
                list.go_to_page(page, &mut actions).unwrap();
                let items = list.current_items();
                assert!(items.len() <= limit as usize);
                collected.extend(offer_ids(&items));
            }

            assert_eq!(collected, expected, "filter {filter:?}, limit {limit}");
        }
    }
}

#[test]
fn page_buttons_stay_in_range() {
    let mut actions = Recorder::default();
    let mut list = ProductList::client(catalog(100), 10);

    for page in 1..=10 {
        list.go_to_page(page, &mut actions).unwrap();
        let buttons = list.page_buttons();
        assert!(buttons.len() <= 5);
        assert!(buttons.contains(&page));
        assert!(buttons.iter().all(|b| (1..=10).contains(b)));
    }
}

#[test]
fn categories_follow_first_seen_order() {
    let list = ProductList::client(catalog(6), 10);
    assert_eq!(list.categories(), vec!["Garden", "Toys", "Kitchen"]);
}

// ---------------------------------------------------------------------------
// Cost editing
// ---------------------------------------------------------------------------

#[test]
fn bulk_cost_sets_every_selected_item() {
    let mut actions = Recorder::default();
    let mut list = ProductList::client(catalog(5), 10);

    list.toggle_select("OF-001");
    list.toggle_select("OF-004");
    list.set_bulk_cost("900");

    assert!(list.apply_bulk(&mut actions).unwrap());
    assert_eq!(
        actions.bulks,
        vec![(vec!["OF-001".to_string(), "OF-004".to_string()], 900.0)]
    );
    assert_eq!(list.saved_cost("OF-001"), Some(900.0));
    assert_eq!(list.saved_cost("OF-004"), Some(900.0));
    assert_eq!(list.saved_cost("OF-002"), Some(80.0));
    assert!(list.selected().is_empty());
    assert!(list.bulk_cost_text().is_empty());
}

#[test]
fn failed_save_keeps_draft_and_saved_apart() {
    let mut actions = Recorder {
        fail_with: Some(ApiError::Server {
            status: 500,
            body: "boom".to_string(),
        }),
        ..Recorder::default()
    };
    let mut list = ProductList::client(catalog(3), 10);

    list.edit_cost("OF-002", "55,5");
    assert!(list.save_cost("OF-002", &mut actions).is_err());
    assert_eq!(list.draft_cost("OF-002"), 55.5);
    assert_eq!(list.saved_cost("OF-002"), Some(80.0));
    assert!(list.is_cost_changed("OF-002"));
    assert!(!list.is_saving("OF-002"));
}

#[test]
fn unparsable_cost_edits_to_zero() {
    let mut actions = Recorder::default();
    let mut list = ProductList::client(catalog(2), 10);

    list.edit_cost("OF-001", "abc");
    assert_eq!(list.draft_cost("OF-001"), 0.0);
    assert!(list.save_cost("OF-001", &mut actions).unwrap());
    assert_eq!(actions.saves, vec![("OF-001".to_string(), 0.0)]);
}

// ---------------------------------------------------------------------------
// Metrics over a loaded list
// ---------------------------------------------------------------------------

#[test]
fn cost_table_matches_worked_example() {
    let products = vec![
        Product::new(1, "A", "A", 1500.0, 750.0),
        Product::new(2, "B", "B", 2500.0, 0.0),
    ];
    let rows = metrics::cost_table(&products, 15.0);

    let margins: Vec<f64> = rows.iter().map(|r| r.margin).collect();
    let rois: Vec<f64> = rows.iter().map(|r| r.roi).collect();
    assert_eq!(margins, vec![50.0, 0.0]);
    assert_eq!(rois, vec![100.0, 0.0]);
    assert_eq!(rows[0].band, MarginBand::High);
    assert_eq!(rows[1].band, MarginBand::Low);
}

// ---------------------------------------------------------------------------
// Credential cache
// ---------------------------------------------------------------------------

#[test]
fn credentials_survive_encoding() {
    let mut bundle = Credentials::new("tok-ABCDEFGH", "client-9");
    bundle.telegram_chat_id = Some("-100500".to_string());

    assert_eq!(auth::decode(&auth::encode(&bundle)), bundle);
}

#[test]
fn garbage_tokens_decode_to_empty() {
    for garbage in ["", "!!!", "bm90IGpzb24=", "e30"] {
        let decoded = auth::decode(garbage);
        assert!(!decoded.is_authenticated(), "{garbage:?}");
    }
}
