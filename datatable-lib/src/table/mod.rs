//! Table controller and its state machines

mod config;
mod controller;
mod debounce;
mod orchestrator;
mod sort;

pub use config::*;
pub use controller::*;
pub use debounce::*;
pub use orchestrator::*;
pub use sort::*;
