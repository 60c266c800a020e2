//! Configuration error types

use super::MappingError;

/// Errors detected while setting up a table controller.
///
/// These are fatal: the controller refuses to start instead of rendering a
/// table that can never load.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Two columns share the same title.
    #[error("Duplicate column title '{title}'")]
    DuplicateColumn { title: String },

    /// More than one column is marked as the collection root.
    #[error("Columns '{first}' and '{second}' are both marked as the collection root")]
    MultipleCollectionRoots { first: String, second: String },

    /// A collection root column has no source path.
    #[error("Collection root column '{title}' has no source path")]
    RootWithoutSource { title: String },

    /// A sortable column has no source path to send as the sort field.
    #[error("Sortable column '{title}' has no source path")]
    SortWithoutSource { title: String },

    /// The endpoint is empty.
    #[error("Endpoint must not be empty")]
    EmptyEndpoint,

    /// Rows per page must be positive.
    #[error("Rows per page must be greater than zero")]
    InvalidRowsPerPage,

    /// A configured field name is empty or contains an empty segment.
    #[error("Field name for '{field}' is not a valid dotted path: '{path}'")]
    InvalidFieldPath { field: &'static str, path: String },

    /// The static payload is not a JSON object.
    #[error("Static payload must be a JSON object, got {found}")]
    InvalidStaticPayload { found: &'static str },

    /// The supplied initial data could not be mapped to rows.
    #[error("Initial data has no resolvable record source: {0}")]
    InitialData(#[source] MappingError),

    /// The configuration document could not be parsed.
    #[error("Invalid table configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
