//! Table placement: assigns supplementary tables to pages after the description.
//!
//! Tables are never shrunk to fit. The first table always opens on a page that holds no
//! description text; later tables share that page while its row budget allows.

use serde::{Deserialize, Serialize};

/// Default number of table rows that fit on one continuation page.
pub const DEFAULT_TABLE_ROWS_PER_PAGE: usize = 19;

/// Where each table goes, as indices into the document's page list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePlacement {
    /// Page index per table, in table order.
    pub pages: Vec<usize>,
    /// Total pages the document needs, description pages included.
    pub total_pages: usize,
}

/// Places tables with `row_counts` rows after `description_pages` pages of description.
///
/// A table whose rows alone exceed `rows_per_page` still gets a page of its own.
pub fn place_tables(
    row_counts: &[usize],
    description_pages: usize,
    rows_per_page: usize,
) -> TablePlacement {
    let mut pages = Vec::with_capacity(row_counts.len());
    let mut page = description_pages;
    let mut rows_on_page = 0usize;

    for (index, &rows) in row_counts.iter().enumerate() {
        if index > 0 && rows_on_page + rows > rows_per_page {
            page += 1;
            rows_on_page = 0;
        }
        rows_on_page += rows;
        pages.push(page);
    }

    let total_pages = match pages.last() {
        Some(last) => last + 1,
        None => description_pages,
    };
    TablePlacement { pages, total_pages }
}
