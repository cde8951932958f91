//! Retail chain daily sales generator
//!
//! Simulates one day of sales for a chain of stores and produces reproducible
//! receipts for loading into an analytics store.
//!
//! Module structure:
//! - `domain/` - Value types (items, receipts, identifiers) and persistence records
//! - `services/` - Catalog, cash register, store and chain generation
//! - `infra/` - Configuration, logging, metrics and seeding
//! - `io/` - Sales file output

pub mod domain;
pub mod error;
pub mod infra;
pub mod io;
pub mod services;

pub use error::SalesError;
