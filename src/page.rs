//! Pagination over a counted result set.

use serde::Serialize;
use std::fmt;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    pub item_count: u64,
    pub page_index: u64,
    pub page_size: u64,
    pub page_count: u64,
    pub offset: u64,
    pub limit: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Page {
    /// `page_index` is 1-based. An empty set or an index past the end yields an empty first page.
    pub fn new(item_count: u64, page_index: u64, page_size: u64) -> Self {
        let page_size = page_size.max(1);
        let page_count = item_count.div_ceil(page_size);
        let (page_index, offset, limit) = if item_count == 0 || page_index > page_count {
            (1, 0, 0)
        } else {
            let index = page_index.max(1);
            (index, page_size * (index - 1), page_size)
        };
        Page {
            item_count,
            page_index,
            page_size,
            page_count,
            offset,
            limit,
            has_next: page_index < page_count,
            has_previous: page_index > 1,
        }
    }

    pub fn with_default_size(item_count: u64, page_index: u64) -> Self {
        Page::new(item_count, page_index, DEFAULT_PAGE_SIZE)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "item_count: {}, page_count: {}, page_index: {}, page_size: {}, offset: {}, limit: {}",
            self.item_count, self.page_count, self.page_index, self.page_size, self.offset, self.limit
        )
    }
}
