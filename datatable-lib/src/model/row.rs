//! Normalized table rows

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

/// Placeholder rendered for absent or null cells.
pub const PLACEHOLDER: &str = "-";

/// A row keyed by column title.
///
/// A column whose source path did not resolve has no entry; the renderer
/// shows [`PLACEHOLDER`] for it.
///
/// # Example
///
/// ```
/// use datatable_lib::model::Row;
/// use serde_json::json;
///
/// let row = Row::new().with("Name", json!("Jo"));
/// assert_eq!(row.display("Name"), "Jo");
/// assert_eq!(row.display("Email"), "-");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: HashMap<String, Value>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cell, returning the row.
    pub fn with(mut self, title: impl Into<String>, value: Value) -> Self {
        self.cells.insert(title.into(), value);
        self
    }

    /// Sets a cell.
    pub fn insert(&mut self, title: impl Into<String>, value: Value) {
        self.cells.insert(title.into(), value);
    }

    /// Returns the cell value for a column, if present.
    pub fn get(&self, title: &str) -> Option<&Value> {
        self.cells.get(title)
    }

    /// Returns the display text for a column.
    pub fn display(&self, title: &str) -> String {
        match self.cells.get(title) {
            None | Some(Value::Null) => PLACEHOLDER.to_string(),
            Some(value) => display_value(value),
        }
    }

    /// Iterates over the present cells.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of present cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if no cell resolved.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Formats a cell value for display. Strings are shown without quotes.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => PLACEHOLDER.to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_display() {
        let row: Row = [
            ("Name", json!("Jo")),
            ("Age", json!(31)),
            ("Active", json!(true)),
            ("Manager", Value::Null),
            ("Tags", json!(["a", "b"])),
        ]
        .into_iter()
        .collect();

        assert_eq!(row.display("Name"), "Jo");
        assert_eq!(row.display("Age"), "31");
        assert_eq!(row.display("Active"), "true");
        assert_eq!(row.display("Manager"), PLACEHOLDER);
        assert_eq!(row.display("Missing"), PLACEHOLDER);
        assert_eq!(row.display("Tags"), r#"["a","b"]"#);
    }
}
