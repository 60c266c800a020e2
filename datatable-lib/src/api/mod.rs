//! Request building and response mapping

pub mod local;
mod mapper;
mod request;

pub use mapper::*;
pub use request::*;
