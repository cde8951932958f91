//! Typed records handed to the persistence boundary
//!
//! `SalesRow` is the flat one-row-per-line shape written to sales files.
//! `ReceiptRecord` and `ReceiptLineRecord` are the table-shaped split of the
//! same data: one record per receipt and one per receipt line.

use crate::domain::types::{RegisterId, StoreId};
use chrono::{NaiveDateTime, SubsecRound};
use serde::Serialize;

/// Timestamp layout used inside receipt identifiers (second resolution)
pub const RECEIPT_ID_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Build the receipt identifier: store code + register code + time to the second.
///
/// `repeat` is the number of earlier receipts at the same register with the same
/// second; a non-zero value is appended as `-N` to keep identifiers unique.
pub fn receipt_id(
    store: StoreId,
    register: RegisterId,
    time: &NaiveDateTime,
    repeat: u32,
) -> String {
    let base = format!("{}{}{}", store, register, time.format(RECEIPT_ID_TIME_FORMAT));
    if repeat == 0 {
        base
    } else {
        format!("{}-{}", base, repeat)
    }
}

/// Assign identifiers to a register's receipt times, which must already be sorted
pub fn receipt_ids<'a, I>(store: StoreId, register: RegisterId, times: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a NaiveDateTime>,
{
    let mut ids = Vec::new();
    let mut previous: Option<NaiveDateTime> = None;
    let mut repeat = 0u32;

    for time in times {
        let second = time.trunc_subsecs(0);
        repeat = if previous == Some(second) { repeat + 1 } else { 0 };
        previous = Some(second);
        ids.push(receipt_id(store, register, time, repeat));
    }

    ids
}

/// One flattened sales row: (store, register, receipt, line)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRow {
    pub store: String,
    pub register: String,
    pub receipt_id: String,
    pub receipt_time: NaiveDateTime,
    pub category_key: u16,
    pub item_key: u16,
    pub item: String,
    pub category: String,
    pub price: u32,
    pub discount: f64,
    pub quantity: u32,
}

/// Receipt table record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptRecord {
    pub id: String,
    pub receipt_time: NaiveDateTime,
    pub store_id: u8,
    pub cash_reg_id: u8,
}

/// Receipt line table record; `line_no` is 1-based within its receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptLineRecord {
    pub id_receipt: String,
    pub line_no: u32,
    pub category_key: u16,
    pub item_key: u16,
    pub quantity: u32,
}
