/// Page arithmetic shared by both pagination modes.
use std::ops::Range;

/// Page sizes offered by the page-size selector.
pub const PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];

/// Maximum number of numbered page buttons shown at once.
pub const MAX_PAGE_BUTTONS: u32 = 5;

/// Number of pages needed for `total` items at `limit` per page.
pub fn total_pages(total: usize, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit as usize) as u32
}

/// Index range of a 1-based page inside a list of `len` items.
///
/// Pages past the end yield an empty range.
pub fn page_bounds(page: u32, limit: u32, len: usize) -> Range<usize> {
    let page = page.max(1) as usize;
    let limit = limit as usize;
    let start = ((page - 1) * limit).min(len);
    let end = (page * limit).min(len);
    start..end
}

/// Numbered page buttons: up to [`MAX_PAGE_BUTTONS`] centered on `current`,
/// clamped to `1..=total_pages`.
pub fn page_window(current: u32, total_pages: u32) -> Vec<u32> {
    if total_pages == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total_pages);
    let half = MAX_PAGE_BUTTONS / 2;
    let mut start = current.saturating_sub(half).max(1);
    let end = (start + MAX_PAGE_BUTTONS - 1).min(total_pages);
    if end - start + 1 < MAX_PAGE_BUTTONS {
        start = (end + 1).saturating_sub(MAX_PAGE_BUTTONS).max(1);
    }
    (start..=end).collect()
}

/// "Showing `from`-`to` of `total`" summary under the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ItemsInfo {
    pub from: usize,
    pub to: usize,
    pub total: usize,
}

impl ItemsInfo {
    pub fn new(page: u32, limit: u32, total: usize) -> Self {
        let range = page_bounds(page, limit, total);
        if range.is_empty() {
            return Self {
                from: 0,
                to: 0,
                total,
            };
        }
        Self {
            from: range.start + 1,
            to: range.end,
            total,
        }
    }
}

impl std::fmt::Display for ItemsInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Showing {}-{} of {} products", self.from, self.to, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn bounds_clip_last_page() {
        assert_eq!(page_bounds(1, 10, 25), 0..10);
        assert_eq!(page_bounds(3, 10, 25), 20..25);
        assert_eq!(page_bounds(4, 10, 25), 25..25);
        assert_eq!(page_bounds(0, 10, 25), 0..10);
    }

    #[test]
    fn window_centers_on_current() {
        assert_eq!(page_window(5, 10), vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn window_clamps_current_past_the_end() {
        assert_eq!(page_window(5, 1), vec![1]);
        assert_eq!(page_window(9, 3), vec![1, 2, 3]);
        assert_eq!(page_window(0, 2), vec![1, 2]);
    }

    #[test]
    fn window_clamps_at_edges() {
        assert_eq!(page_window(1, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(2, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(10, 10), vec![6, 7, 8, 9, 10]);
        assert_eq!(page_window(9, 10), vec![6, 7, 8, 9, 10]);
    }

    #[test]
    fn window_with_few_pages() {
        assert_eq!(page_window(1, 3), vec![1, 2, 3]);
        assert_eq!(page_window(2, 1), vec![1]);
        assert!(page_window(1, 0).is_empty());
    }

    #[test]
    fn items_info_ranges() {
        assert_eq!(ItemsInfo::new(1, 20, 45), ItemsInfo { from: 1, to: 20, total: 45 });
        assert_eq!(ItemsInfo::new(3, 20, 45), ItemsInfo { from: 41, to: 45, total: 45 });
        assert_eq!(ItemsInfo::new(1, 20, 0), ItemsInfo { from: 0, to: 0, total: 0 });
        assert_eq!(ItemsInfo::new(2, 10, 15).to_string(), "Showing 11-15 of 15 products");
    }
}
