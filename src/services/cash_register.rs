//! Cash register - turns assigned transaction times into receipts
//!
//! Each register owns its generator (seeded by the store from a stable register
//! index), so its output does not depend on how tasks are interleaved.

use crate::domain::types::{Receipt, RegisterId, StoreId};
use crate::error::SalesError;
use crate::infra::metrics::Metrics;
use crate::infra::seed::rng_from_seed;
use crate::services::catalog::Catalog;
use chrono::NaiveDateTime;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CashRegister {
    store_id: StoreId,
    register_id: RegisterId,
    seed: u64,
    times: Vec<NaiveDateTime>,
    receipts: Vec<Receipt>,
}

impl CashRegister {
    pub fn new(
        store_id: StoreId,
        register_id: RegisterId,
        times: Vec<NaiveDateTime>,
        seed: u64,
    ) -> Self {
        debug!(
            store = %store_id,
            register = %register_id,
            sales = %times.len(),
            "cash_register_created"
        );
        Self { store_id, register_id, seed, times, receipts: Vec::new() }
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn register_id(&self) -> RegisterId {
        self.register_id
    }

    /// Store code followed by register code, e.g. `Ab`
    pub fn label(&self) -> String {
        format!("{}{}", self.store_id, self.register_id)
    }

    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Receipts in ascending time order (empty until `create_day` has run)
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// Generate one receipt per assigned time.
    ///
    /// Times are sorted once, then a line count is drawn from the quantity pool for
    /// every receipt and each basket is filled with that many lines.
    pub fn create_day(&mut self, catalog: &Catalog, metrics: &Metrics) -> Result<(), SalesError> {
        let scope = format!("register {}", self.label());
        self.times.sort_unstable();

        let mut rng = rng_from_seed(self.seed);
        let line_counts = self
            .times
            .iter()
            .map(|_| catalog.sample_quantity(&mut rng))
            .collect::<Result<Vec<u32>, SalesError>>()
            .map_err(|e| e.in_scope(&scope))?;

        let mut receipts = Vec::with_capacity(self.times.len());
        for (time, lines) in self.times.iter().zip(line_counts) {
            let basket = catalog
                .get_basket(lines as usize, &mut rng)
                .map_err(|e| e.in_scope(&scope))?;
            let receipt = Receipt::new(*time, basket);
            metrics.record_receipt(receipt.lines.len() as u64, receipt.units());
            receipts.push(receipt);
        }

        self.receipts = receipts;
        metrics.record_register_completed();
        debug!(
            store = %self.store_id,
            register = %self.register_id,
            receipts = %self.receipts.len(),
            "cash_register_day_created"
        );
        Ok(())
    }
}
