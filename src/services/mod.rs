//! Services - the generation pipeline
//!
//! - `catalog` - item universe, price/discount model and quantity pool
//! - `cash_register` - receipts for one register's assigned times
//! - `store` - slot grid, load allocation and concurrent register days
//! - `chain` - date seeding, per-store load and concurrent store days
//! - `task_group` - spawn-then-join-or-abort primitive used at each level
//! - `flatten` - receipts to persistence records

pub mod cash_register;
pub mod catalog;
pub mod chain;
pub mod flatten;
pub mod store;
pub mod task_group;

// Re-export commonly used types
pub use cash_register::CashRegister;
pub use catalog::Catalog;
pub use chain::{generate_day, ChainState, ChainStores};
pub use flatten::DaySales;
pub use store::{slot_grid, Store};
pub use task_group::TaskGroup;
