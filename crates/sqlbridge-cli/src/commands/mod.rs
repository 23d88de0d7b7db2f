//! CLI command implementations.

pub mod constants;
pub mod escape;
pub mod exec;
pub mod query;
