//! View-model handed to the renderer.

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use super::QueryState;
use super::Row;
use super::SortKey;

/// Rows and total count produced by one successful fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    /// Mapped rows in response order.
    pub rows: Vec<Row>,
    /// Total number of items across all pages.
    pub total_items: u64,
}

/// Externally visible snapshot of a table.
///
/// Serializes with camelCase keys for renderers that consume JSON.
///
/// # Example
///
/// ```ignore
/// let view = controller.go_to_page(2).await;
///
/// if let Some(error) = &view.error {
///     eprintln!("{error}");
/// }
/// for (i, row) in view.rows.iter().enumerate() {
///     println!("{} {}", view.serial(i), row.display("Name"));
/// }
/// println!("Page {} of {}", view.page, view.total_pages);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Rows of the current page.
    pub rows: Vec<Row>,
    /// Total number of items reported by the backend.
    pub total_items: u64,
    /// Current page, starting at 1.
    pub page: u64,
    /// Number of pages, never less than 1.
    pub total_pages: u64,
    /// Whether the backend reports a total. Without one, paging has no
    /// upper bound and `total_pages` stays at 1.
    pub total_known: bool,
    /// Rows per page.
    pub rows_per_page: u64,
    /// Active sort.
    pub sort: Option<SortKey>,
    /// Committed search term.
    pub search: String,
    /// Whether a fetch is in flight.
    pub loading: bool,
    /// Message of the last failed fetch.
    pub error: Option<String>,
    /// When the rows were last replaced by a fetch.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl ViewState {
    /// Creates an empty view for a query.
    pub fn new(query: &QueryState) -> Self {
        Self {
            rows: Vec::new(),
            total_items: 0,
            page: query.page,
            total_pages: 1,
            total_known: true,
            rows_per_page: query.rows_per_page,
            sort: query.sort.clone(),
            search: query.committed_search.clone(),
            loading: false,
            error: None,
            fetched_at: None,
        }
    }

    /// Copies the query-derived fields and recomputes the page count.
    pub(crate) fn sync_query(&mut self, query: &QueryState) {
        self.page = query.page;
        self.rows_per_page = query.rows_per_page;
        self.sort = query.sort.clone();
        self.search = query.committed_search.clone();
        self.total_pages = total_pages(self.total_items, self.rows_per_page);
    }

    /// Replaces rows and total from a successful fetch.
    pub(crate) fn apply(&mut self, result: FetchResult) {
        self.rows = result.rows;
        self.total_items = result.total_items;
        self.total_pages = total_pages(self.total_items, self.rows_per_page);
        self.fetched_at = Some(Utc::now());
    }

    /// Returns `true` if a previous page exists.
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Returns `true` if a next page may exist.
    ///
    /// Always `true` when no total is reported, matching the controller's
    /// unbounded `next_page`.
    pub fn has_next(&self) -> bool {
        !self.total_known || self.page < self.total_pages
    }

    /// Returns the 1-based serial number of the row at `index` on this page.
    ///
    /// Saturates at `u64::MAX` for pages beyond the addressable range.
    pub fn serial(&self, index: usize) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.rows_per_page)
            .saturating_add(index as u64)
            .saturating_add(1)
    }
}

/// Computes `max(ceil(total_items / rows_per_page), 1)`.
///
/// A `rows_per_page` of zero is treated as one.
pub fn total_pages(total_items: u64, rows_per_page: u64) -> u64 {
    total_items.div_ceil(rows_per_page.max(1)).max(1)
}
