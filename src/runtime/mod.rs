//! The container side: running one task and reading its secrets.

pub mod runner;
pub mod secret;
