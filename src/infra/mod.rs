//! Infrastructure - configuration, logging, metrics and seeding
//!
//! - `config` - Application configuration (TOML loading, validation, defaults)
//! - `logging` - tracing subscriber construction
//! - `metrics` - Lock-free generation counters
//! - `seed` - Date seed and per-task generator derivation

pub mod config;
pub mod logging;
pub mod metrics;
pub mod seed;

// Re-export commonly used types
pub use config::{Config, GoodsSettings, LoadSettings, OutputFormat, StoreSpec};
pub use metrics::{Metrics, MetricsSummary};
pub use seed::{child_seed, date_seed, rng_from_seed, SimRng};
