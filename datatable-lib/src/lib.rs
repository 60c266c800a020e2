//! Remote paginated table library
//!
//! A backend-agnostic data controller for paginated tables: it builds
//! requests from a declarative description of the backend, maps arbitrary
//! JSON responses onto columns and keeps paging, sorting and debounced
//! search consistent while responses arrive out of order.

pub mod api;
pub mod error;
pub mod model;
pub mod schedule;
pub mod table;
pub mod transport;

mod client;

pub use client::*;
pub use error::Error;
pub use table::TableConfig;
pub use table::TableController;
