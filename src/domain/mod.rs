//! Domain layer for agent administration
//!
//! Models, port traits and errors. Nothing here touches SQLite, Redis or HTTP.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
