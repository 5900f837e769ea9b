//! CLI command handlers.

pub mod check;
pub mod spec;

pub use check::run_check;
pub use spec::run_spec;
