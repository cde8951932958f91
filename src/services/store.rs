//! Store - allocates the day's transaction volume across its cash registers
//!
//! The store lays out the slot grid for its opening hours, scales the grid by its
//! daily load, gives every register a randomly scaled share of that target and
//! runs all register days concurrently. The store day succeeds only if every
//! register task succeeds.

use crate::domain::types::{RegisterId, StoreId};
use crate::error::SalesError;
use crate::infra::config::{LoadSettings, StoreSpec};
use crate::infra::metrics::Metrics;
use crate::infra::seed::{child_seed, rng_from_seed};
use crate::services::cash_register::CashRegister;
use crate::services::catalog::Catalog;
use crate::services::task_group::TaskGroup;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};

/// All transaction slots from opening (inclusive) to closing (exclusive) at a fixed cadence
pub fn slot_grid(
    date: NaiveDate,
    opening_hour: u32,
    closing_hour: u32,
    cadence_secs: u32,
) -> Vec<NaiveDateTime> {
    let midnight = date.and_time(NaiveTime::MIN);
    let start = midnight + TimeDelta::hours(opening_hour as i64);
    let stop = midnight + TimeDelta::hours(closing_hour as i64);
    let step = TimeDelta::seconds(cadence_secs.max(1) as i64);

    let mut slots = Vec::new();
    let mut t = start;
    while t < stop {
        slots.push(t);
        t += step;
    }
    slots
}

#[derive(Debug)]
pub struct Store {
    spec: StoreSpec,
    processing_date: NaiveDate,
    daily_load: f64,
    load: LoadSettings,
    seed: u64,
    cash_registers: Vec<CashRegister>,
}

impl Store {
    pub fn new(
        spec: StoreSpec,
        processing_date: NaiveDate,
        daily_load: f64,
        load: LoadSettings,
        seed: u64,
    ) -> Self {
        debug!(
            store = %spec.id,
            cash_registers = %spec.cash_registers,
            opening_hour = %spec.opening_hour,
            closing_hour = %spec.closing_hour,
            daily_load = %daily_load,
            "store_created"
        );
        Self { spec, processing_date, daily_load, load, seed, cash_registers: Vec::new() }
    }

    pub fn id(&self) -> StoreId {
        self.spec.id
    }

    pub fn daily_load(&self) -> f64 {
        self.daily_load
    }

    pub fn spec(&self) -> &StoreSpec {
        &self.spec
    }

    /// Registers with their generated receipts (empty until `create_day` succeeds)
    pub fn cash_registers(&self) -> &[CashRegister] {
        &self.cash_registers
    }

    pub fn slots(&self) -> Vec<NaiveDateTime> {
        slot_grid(
            self.processing_date,
            self.spec.opening_hour,
            self.spec.closing_hour,
            self.load.min_sec_per_transaction,
        )
    }

    /// Expected number of transactions for the whole store
    pub fn target_volume(&self, slot_count: usize) -> f64 {
        slot_count as f64 * self.daily_load
    }

    /// Build the registers with their sampled transaction times
    pub fn allocate_registers(&self) -> Vec<CashRegister> {
        let slots = self.slots();
        let target = self.target_volume(slots.len());
        let (mult_min, mult_max) = self.load.cash_register_daily;
        let mut rng = rng_from_seed(self.seed);

        (0..self.spec.cash_registers)
            .map(|i| {
                let multiplier = rng.gen_range(mult_min..=mult_max);
                let count = if slots.is_empty() {
                    0
                } else {
                    (target * multiplier).round() as usize
                };
                let times: Vec<NaiveDateTime> =
                    (0..count).map(|_| slots[rng.gen_range(0..slots.len())]).collect();
                CashRegister::new(self.spec.id, RegisterId(i), times, child_seed(self.seed, i as u64))
            })
            .collect()
    }

    /// Run every register's day concurrently; any register failure fails the store day
    pub async fn create_day(
        &mut self,
        catalog: Arc<Catalog>,
        metrics: Arc<Metrics>,
    ) -> Result<(), SalesError> {
        let registers = self.allocate_registers();
        let mut group = TaskGroup::new(format!("store {}", self.spec.id));

        for mut register in registers {
            let catalog = catalog.clone();
            let metrics = metrics.clone();
            let span = info_span!("register_day", register = %register.register_id());
            group.spawn(
                async move {
                    register.create_day(&catalog, &metrics)?;
                    Ok::<_, SalesError>(register)
                }
                .instrument(span),
            );
        }

        self.cash_registers = group.join_all().await?;
        metrics.record_store_completed();

        let receipts: usize = self.cash_registers.iter().map(|r| r.receipts().len()).sum();
        info!(
            store = %self.spec.id,
            cash_registers = %self.cash_registers.len(),
            receipts = %receipts,
            "store_day_created"
        );
        Ok(())
    }
}
