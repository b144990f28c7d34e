//! Page-count derivation from an exact total.

use crate::params::SearchParams;

/// Number of pages needed for `total_count` items, `items_per_page` at a time.
pub fn total_page_count(total_count: i64, items_per_page: u32) -> i64 {
    let total = total_count.max(0);
    let per_page = i64::from(items_per_page.max(1));
    let mut pages = total / per_page;
    if total % per_page > 0 {
        pages += 1;
    }
    pages
}

impl SearchParams {
    /// Attach the exact total and the derived page count, keeping the
    /// resolved page index and page size.
    pub fn attach_paging(&mut self, total_count: i64) {
        let total = total_count.max(0);
        self.page_info.total_item_count = Some(total);
        self.page_info.total_page_count =
            Some(total_page_count(total, self.page_info.items_per_page));
    }
}
