//! Typed models

mod column;
mod descriptor;
mod path;
mod query;
mod row;
mod view;

pub use column::*;
pub use descriptor::*;
pub use path::*;
pub use query::*;
pub use row::*;
pub use view::*;
