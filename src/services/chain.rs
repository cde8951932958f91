//! Chain of stores - one processing day for every store
//!
//! Lifecycle of a run:
//! Idle -> Seeded -> Generating -> Aggregated -> Done, or Failed from Generating.
//!
//! The run seed comes from the processing date, so regenerating the same date
//! with the same configuration reproduces the same receipts.

use crate::error::SalesError;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::infra::seed::{child_seed, date_seed, rng_from_seed};
use crate::services::catalog::Catalog;
use crate::services::flatten::DaySales;
use crate::services::store::Store;
use crate::services::task_group::TaskGroup;
use chrono::NaiveDate;
use rand::Rng;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Idle,
    Seeded,
    Generating,
    Aggregated,
    Done,
    Failed,
}

impl ChainState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainState::Idle => "idle",
            ChainState::Seeded => "seeded",
            ChainState::Generating => "generating",
            ChainState::Aggregated => "aggregated",
            ChainState::Done => "done",
            ChainState::Failed => "failed",
        }
    }
}

pub struct ChainStores {
    config: Arc<Config>,
    catalog: Arc<Catalog>,
    metrics: Arc<Metrics>,
    processing_date: NaiveDate,
    seed: u64,
    chain_daily_load: Option<f64>,
    stores: Vec<Store>,
    state: ChainState,
}

impl ChainStores {
    pub fn new(
        config: Arc<Config>,
        catalog: Arc<Catalog>,
        metrics: Arc<Metrics>,
        processing_date: NaiveDate,
    ) -> Self {
        Self {
            config,
            catalog,
            metrics,
            processing_date,
            seed: date_seed(processing_date),
            chain_daily_load: None,
            stores: Vec::new(),
            state: ChainState::Idle,
        }
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn processing_date(&self) -> NaiveDate {
        self.processing_date
    }

    /// Chain-wide load factor; drawn when the run is seeded
    pub fn chain_daily_load(&self) -> Option<f64> {
        self.chain_daily_load
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    /// Seed the run from the processing date and draw the chain-wide load
    pub fn seed_run(&mut self) -> Result<f64, SalesError> {
        if self.state != ChainState::Idle {
            return Err(SalesError::task(
                "chain",
                format!("cannot seed a run in state {}", self.state.as_str()),
            ));
        }

        let (lo, hi) = self.config.load().chain_daily;
        let mut rng = rng_from_seed(self.seed);
        let load = rng.gen_range(lo..=hi);
        self.chain_daily_load = Some(load);
        self.state = ChainState::Seeded;

        info!(
            seed = %self.seed,
            stores = %self.config.stores().len(),
            daily_load = %load,
            processing_date = %self.processing_date,
            "chain_seeded"
        );
        Ok(load)
    }

    /// Generate the whole chain day; any store failure fails the day and discards all results
    pub async fn create_day(&mut self) -> Result<(), SalesError> {
        let chain_load = match self.state {
            ChainState::Idle => self.seed_run()?,
            ChainState::Seeded => self.chain_daily_load.unwrap_or_default(),
            other => {
                return Err(SalesError::task(
                    "chain",
                    format!("cannot generate a day in state {}", other.as_str()),
                ))
            }
        };

        let stores: Vec<Store> = self
            .config
            .stores()
            .iter()
            .map(|spec| {
                Store::new(
                    spec.clone(),
                    self.processing_date,
                    chain_load * spec.rank as f64 / 100.0,
                    *self.config.load(),
                    child_seed(self.seed, spec.id.index() as u64),
                )
            })
            .collect();

        self.state = ChainState::Generating;
        let mut group = TaskGroup::new("chain");
        for mut store in stores {
            let catalog = self.catalog.clone();
            let metrics = self.metrics.clone();
            let span = info_span!("store_day", store = %store.id());
            group.spawn(
                async move {
                    store.create_day(catalog, metrics).await?;
                    Ok::<_, SalesError>(store)
                }
                .instrument(span),
            );
        }

        match group.join_all().await {
            Ok(stores) => {
                self.stores = stores;
                self.state = ChainState::Aggregated;
                info!(
                    processing_date = %self.processing_date,
                    stores = %self.stores.len(),
                    "chain_day_created"
                );
                Ok(())
            }
            Err(e) => {
                self.stores.clear();
                self.state = ChainState::Failed;
                error!(processing_date = %self.processing_date, error = %e, "chain_day_failed");
                Err(e)
            }
        }
    }

    /// Flatten all receipts into persistence records; stores are released afterwards
    pub fn flatten(&mut self) -> Result<DaySales, SalesError> {
        if self.state != ChainState::Aggregated {
            return Err(SalesError::task(
                "chain",
                format!("cannot flatten a run in state {}", self.state.as_str()),
            ));
        }

        let mut day = DaySales::new(self.processing_date);
        for store in &self.stores {
            for register in store.cash_registers() {
                day.push_register(register, &self.catalog);
            }
        }

        self.stores.clear();
        self.state = ChainState::Done;
        Ok(day)
    }
}

/// Run a full chain day: seed, generate, flatten
pub async fn generate_day(
    config: Arc<Config>,
    catalog: Arc<Catalog>,
    metrics: Arc<Metrics>,
    processing_date: NaiveDate,
) -> Result<DaySales, SalesError> {
    let span = info_span!("chain_day", date = %processing_date);
    async move {
        let mut chain = ChainStores::new(config, catalog, metrics, processing_date);
        chain.create_day().await?;
        chain.flatten()
    }
    .instrument(span)
    .await
}
