//! Column definitions

use std::collections::HashSet;

use serde::Deserialize;

use super::FieldPath;
use crate::error::ConfigError;

/// A column of the table.
///
/// Columns come in three flavours:
///
/// - field columns read a value from each record through `source`
/// - serial columns (`source == None`) are numbered by the renderer
/// - the collection root column names the response field holding the
///   record array and is never rendered
///
/// The JSON form uses the familiar data table keys
/// (`dataIndex`, `sort`, `dataSrc`, `serial`).
///
/// # Example
///
/// ```
/// use datatable_lib::model::ColumnSpec;
///
/// let columns = vec![
///     ColumnSpec::serial("Serial"),
///     ColumnSpec::field("Name", "name").sortable(),
///     ColumnSpec::field("City", "address.city"),
///     ColumnSpec::collection_root("data"),
/// ];
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawColumn")]
pub struct ColumnSpec {
    /// Unique title, used as the row key.
    pub title: String,
    /// Dotted path into a raw record, `None` for serial columns.
    pub source: Option<FieldPath>,
    /// Marks the column naming the record array in the response.
    pub collection_root: bool,
    /// Whether the column takes part in the sort cycle.
    pub sortable: bool,
}

impl ColumnSpec {
    /// Creates a column reading `source` from each record.
    pub fn field(title: impl Into<String>, source: impl Into<FieldPath>) -> Self {
        Self {
            title: title.into(),
            source: Some(source.into()),
            collection_root: false,
            sortable: false,
        }
    }

    /// Creates a serial (row number) column.
    pub fn serial(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: None,
            collection_root: false,
            sortable: false,
        }
    }

    /// Creates the collection root marker for responses shaped like
    /// `{ "<path>": [ ... ] }`.
    pub fn collection_root(path: impl Into<FieldPath>) -> Self {
        let path = path.into();
        Self {
            title: path.to_string(),
            source: Some(path),
            collection_root: true,
            sortable: false,
        }
    }

    /// Marks the column as sortable.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Returns `true` if the column is projected into rows.
    pub fn is_projected(&self) -> bool {
        self.source.is_some() && !self.collection_root
    }

    /// Returns `true` for serial columns.
    pub fn is_serial(&self) -> bool {
        self.source.is_none()
    }
}

/// Validated column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Columns {
    columns: Vec<ColumnSpec>,
}

impl Columns {
    /// Validates a column list.
    ///
    /// Titles must be unique, at most one column may be the collection root,
    /// and sortable or root columns need a source path.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self, ConfigError> {
        let mut titles = HashSet::new();
        let mut root: Option<&ColumnSpec> = None;

        for column in &columns {
            if !titles.insert(column.title.as_str()) {
                return Err(ConfigError::DuplicateColumn {
                    title: column.title.clone(),
                });
            }

            if let Some(source) = &column.source
                && !source.is_valid()
            {
                return Err(ConfigError::InvalidFieldPath {
                    field: "column",
                    path: source.to_string(),
                });
            }

            if column.collection_root {
                if column.source.is_none() {
                    return Err(ConfigError::RootWithoutSource {
                        title: column.title.clone(),
                    });
                }
                if let Some(first) = root {
                    return Err(ConfigError::MultipleCollectionRoots {
                        first: first.title.clone(),
                        second: column.title.clone(),
                    });
                }
                root = Some(column);
            } else if column.sortable && column.source.is_none() {
                return Err(ConfigError::SortWithoutSource {
                    title: column.title.clone(),
                });
            }
        }

        Ok(Self { columns })
    }

    /// Returns all columns in declaration order.
    pub fn all(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Returns the columns that are projected into rows.
    pub fn projected(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.is_projected())
    }

    /// Returns the path of the collection root, if one is declared.
    pub fn root(&self) -> Option<&FieldPath> {
        self.columns
            .iter()
            .find(|c| c.collection_root)
            .and_then(|c| c.source.as_ref())
    }

    /// Looks up a column by title.
    pub fn get(&self, title: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.title == title)
    }

    /// Looks up a sortable column by title.
    pub fn sortable(&self, title: &str) -> Option<&ColumnSpec> {
        self.get(title)
            .filter(|c| c.sortable && !c.collection_root && c.source.is_some())
    }
}

/// Column as written in configuration documents.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawColumn {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "source", alias = "sourcePath")]
    data_index: Option<String>,
    #[serde(default)]
    data_src: Option<String>,
    #[serde(default, alias = "sortable")]
    sort: bool,
    #[serde(default)]
    serial: bool,
}

impl From<RawColumn> for ColumnSpec {
    fn from(raw: RawColumn) -> Self {
        if let Some(root) = raw.data_src {
            let mut column = ColumnSpec::collection_root(root);
            if let Some(title) = raw.title {
                column.title = title;
            }
            return column;
        }

        let title = raw
            .title
            .or_else(|| raw.data_index.clone())
            .unwrap_or_default();

        match raw.data_index {
            Some(path) if !raw.serial => ColumnSpec {
                title,
                source: Some(FieldPath::new(path)),
                collection_root: false,
                sortable: raw.sort,
            },
            _ => ColumnSpec::serial(title),
        }
    }
}
