//! Domain models - value types and persistence records
//!
//! - `types` - store/register identifiers, items, receipt lines and receipts
//! - `records` - flattened rows and per-table records for the persistence boundary

pub mod records;
pub mod types;

pub use records::{receipt_id, receipt_ids, ReceiptLineRecord, ReceiptRecord, SalesRow};
pub use types::{Basket, Item, Receipt, ReceiptLine, RegisterId, StoreId, MAX_UNITS};
