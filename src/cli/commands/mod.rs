//! CLI command implementations.

pub mod agent;
pub mod analytics;
pub mod available;
pub mod cache;
pub mod init;
pub mod migrate;
