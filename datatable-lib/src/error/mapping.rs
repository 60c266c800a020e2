//! MappingError for response bodies

/// The response body matched none of the record-source rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    /// The declared collection root is not present in the response.
    #[error("collection root '{root}' not found in response")]
    RootMissing { root: String },

    /// The declared collection root exists but is not an array.
    #[error("collection root '{root}' is a {found}, expected an array")]
    RootNotArray { root: String, found: &'static str },

    /// The response is neither an array nor an object.
    #[error("response is a {found}, expected an array or an object")]
    UnsupportedShape { found: &'static str },
}

impl MappingError {
    /// Creates a new missing root error.
    pub fn root_missing(root: impl Into<String>) -> Self {
        Self::RootMissing { root: root.into() }
    }
}
