//! Three-state sort cycle.

use crate::model::SortDirection;
use crate::model::SortKey;

/// Per-table sort state.
///
/// Activating the same column cycles ascending, descending, then back to
/// the backend's original order. Activating another column always starts
/// over at ascending.
///
/// # Example
///
/// ```
/// use datatable_lib::model::SortKey;
/// use datatable_lib::table::SortCycle;
///
/// let mut cycle = SortCycle::new();
/// assert_eq!(cycle.activate("Age"), Some(&SortKey::asc("Age")));
/// assert_eq!(cycle.activate("Age"), Some(&SortKey::desc("Age")));
/// assert_eq!(cycle.activate("Age"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortCycle {
    current: Option<SortKey>,
}

impl SortCycle {
    /// Creates a cycle in the original order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the cycle for `column` and returns the new state.
    pub fn activate(&mut self, column: &str) -> Option<&SortKey> {
        self.current = match self.current.take() {
            Some(key) if key.column == column => match key.direction {
                SortDirection::Asc => Some(SortKey::desc(column)),
                SortDirection::Desc => None,
            },
            _ => Some(SortKey::asc(column)),
        };
        self.current.as_ref()
    }

    /// Returns the active sort.
    pub fn current(&self) -> Option<&SortKey> {
        self.current.as_ref()
    }

    /// Returns to the original order.
    pub fn clear(&mut self) {
        self.current = None;
    }
}
