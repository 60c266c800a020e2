//! Query state driving each fetch.

use serde::Deserialize;
use serde::Serialize;

/// Sort direction for ordering results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl SortDirection {
    /// Returns the wire value (`asc` or `desc`).
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// The active sort: a column title and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    /// Title of the sorted column.
    pub column: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortKey {
    /// Creates an ascending sort on a column.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Creates a descending sort on a column.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Everything the request depends on.
///
/// `page` is 1-based. A cleared sort is `None`, so a direction can never
/// exist without a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    /// Current page, starting at 1.
    pub page: u64,
    /// Rows per page, always positive.
    pub rows_per_page: u64,
    /// Active sort, `None` for the backend's original order.
    pub sort: Option<SortKey>,
    /// Search input as typed.
    pub raw_search: String,
    /// Debounced search term; the only one that triggers a fetch.
    pub committed_search: String,
}

impl QueryState {
    /// Creates the initial state for a freshly mounted table.
    pub fn new(rows_per_page: u64) -> Self {
        Self {
            page: 1,
            rows_per_page: rows_per_page.max(1),
            sort: None,
            raw_search: String::new(),
            committed_search: String::new(),
        }
    }

    /// Returns the number of records before the current page.
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.rows_per_page)
    }

    /// Returns the committed search term, or `None` when it is blank.
    pub fn search_term(&self) -> Option<&str> {
        let term = self.committed_search.trim();
        (!term.is_empty()).then_some(term)
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(10)
    }
}
