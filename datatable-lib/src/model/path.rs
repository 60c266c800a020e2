//! Dotted field paths into JSON documents.
//!
//! The same path type is used in both directions: reading values out of a
//! response body and writing nested keys into a request payload. A backend
//! that nests its pagination under `pagination.totalItems` is described with
//! configuration alone.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// A dot-separated path such as `pagination.skip`.
///
/// Parsing never fails; a path with no segments or with an empty segment
/// resolves to nothing and is rejected by [`FieldPath::is_valid`] during
/// configuration validation.
///
/// # Example
///
/// ```
/// use datatable_lib::model::FieldPath;
/// use serde_json::json;
///
/// let path = FieldPath::new("pagination.totalItems");
/// let body = json!({ "pagination": { "totalItems": 42 } });
/// assert_eq!(path.resolve(&body), Some(&json!(42)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Parses a dotted path.
    pub fn new(path: impl Into<String>) -> Self {
        let raw = path.into();
        let segments = if raw.is_empty() {
            Vec::new()
        } else {
            raw.split('.').map(str::to_string).collect()
        };
        Self { raw, segments }
    }

    /// Returns the path as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the individual path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns `true` if the path has at least one segment and no empty ones.
    pub fn is_valid(&self) -> bool {
        !self.segments.is_empty() && self.segments.iter().all(|s| !s.trim().is_empty())
    }

    /// Reads the value at this path.
    pub fn resolve<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        if self.segments.is_empty() {
            return None;
        }
        self.segments
            .iter()
            .try_fold(record, |current, segment| step(current, segment))
    }

    /// Writes `value` at this path, creating intermediate objects.
    ///
    /// Intermediate values that are not objects are replaced. A path with no
    /// segments leaves `target` untouched.
    pub fn assign(&self, target: &mut Map<String, Value>, value: Value) {
        let Some((last, parents)) = self.segments.split_last() else {
            return;
        };

        let mut current = target;
        for segment in parents {
            let slot = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot.as_object_mut() {
                Some(map) => map,
                None => return,
            };
        }
        current.insert(last.clone(), value);
    }
}

fn step<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Reads the value at a dotted path.
///
/// Empty paths, missing segments and scalar intermediates all yield `None`.
pub fn resolve<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    FieldPath::new(path).resolve(record)
}

/// Writes `value` into `target` at a dotted path.
pub fn assign(target: &mut Map<String, Value>, path: &str, value: Value) {
    FieldPath::new(path).assign(target, value);
}

impl From<String> for FieldPath {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for FieldPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.raw
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
