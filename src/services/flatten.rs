//! Flattening of generated receipts into persistence records
//!
//! Rows are emitted store by store, register by register, in receipt time order,
//! so the output of a run is fully determined by its inputs.

use crate::domain::records::{receipt_ids, ReceiptLineRecord, ReceiptRecord, SalesRow};
use crate::services::cash_register::CashRegister;
use crate::services::catalog::Catalog;
use chrono::NaiveDate;

/// Everything one processing day hands to the persistence boundary
#[derive(Debug, Clone, Default)]
pub struct DaySales {
    pub date: Option<NaiveDate>,
    pub rows: Vec<SalesRow>,
    pub receipts: Vec<ReceiptRecord>,
    pub lines: Vec<ReceiptLineRecord>,
}

impl DaySales {
    pub fn new(date: NaiveDate) -> Self {
        Self { date: Some(date), ..Default::default() }
    }

    /// Append all records of one register
    pub fn push_register(&mut self, register: &CashRegister, catalog: &Catalog) {
        let store = register.store_id();
        let reg = register.register_id();
        let ids = receipt_ids(store, reg, register.receipts().iter().map(|r| &r.time));

        for (receipt, id) in register.receipts().iter().zip(ids) {
            for (n, line) in receipt.lines.iter().enumerate() {
                self.rows.push(SalesRow {
                    store: store.to_string(),
                    register: reg.to_string(),
                    receipt_id: id.clone(),
                    receipt_time: receipt.time,
                    category_key: line.item.category_key,
                    item_key: line.item.item_key,
                    item: catalog.item_name(&line.item),
                    category: catalog.category_name(&line.item).to_string(),
                    price: line.item.price,
                    discount: line.item.discount,
                    quantity: line.quantity,
                });
                self.lines.push(ReceiptLineRecord {
                    id_receipt: id.clone(),
                    line_no: n as u32 + 1,
                    category_key: line.item.category_key,
                    item_key: line.item.item_key,
                    quantity: line.quantity,
                });
            }
            self.receipts.push(ReceiptRecord {
                id,
                receipt_time: receipt.time,
                store_id: store.0,
                cash_reg_id: reg.0,
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{RegisterId, StoreId};
    use crate::infra::config::Config;
    use crate::infra::metrics::Metrics;

    #[test]
    fn test_push_register_rows_and_records() {
        let catalog = Catalog::build(Config::default().goods(), 42).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let times = vec![
            date.and_hms_opt(9, 0, 0).unwrap(),
            date.and_hms_opt(9, 0, 0).unwrap(),
            date.and_hms_opt(13, 20, 0).unwrap(),
        ];
        let mut register = CashRegister::new(StoreId(1), RegisterId(0), times, 5);
        register.create_day(&catalog, &Metrics::new()).unwrap();

        let mut day = DaySales::new(date);
        day.push_register(&register, &catalog);

        let line_total: usize = register.receipts().iter().map(|r| r.lines.len()).sum();
        assert_eq!(day.rows.len(), line_total);
        assert_eq!(day.lines.len(), line_total);
        assert_eq!(day.receipts.len(), 3);

        let ids: Vec<&str> = day.receipts.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["Ba20240101090000", "Ba20240101090000-1", "Ba20240101132000"]);

        for row in &day.rows {
            assert_eq!(row.store, "B");
            assert_eq!(row.register, "a");
            assert!(row.quantity >= 1);
            assert!(row.item.starts_with(&Config::default().goods().name_prefix[row.category_key as usize]));
        }
        assert!(day.lines.iter().all(|l| l.line_no >= 1));
    }
}
