//! Error types

mod api;
mod config;
mod mapping;

pub use api::*;
pub use config::*;
pub use mapping::*;

/// Top-level error for the table controller.
///
/// Configuration problems are fatal and surface from construction. API errors
/// are normally recovered into [`ViewState::error`](crate::model::ViewState)
/// and only escape through the lower-level building blocks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid table configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Request or response failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<MappingError> for Error {
    fn from(err: MappingError) -> Self {
        Self::Api(ApiError::Mapping(err))
    }
}
