//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/default.toml

use crate::domain::types::{StoreId, MAX_UNITS};
use crate::error::SalesError;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Tolerance for the discount probabilities summing to one
const PROB_SUM_TOLERANCE: f64 = 1e-6;

/// Highest store rank: a store at rank 100 gets the full chain load
pub const MAX_RANK: u32 = 100;

/// `config_file` of a configuration built from `Config::default()`
const DEFAULT_SOURCE: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Jsonl,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoresToml {
    /// Number of cash registers in each store
    pub cash_registers: Vec<u8>,
    /// Popularity rank of each store, as a percentage of the chain load
    pub ranks: Vec<u32>,
    /// `[opening_hour, closing_hour]` of each store
    pub opening_hours: Vec<[u32; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricesToml {
    /// `[min_price, max_price]`
    pub range: [u32; 2],
    #[serde(default = "default_mean_price")]
    pub mean: u32,
}

fn default_mean_price() -> u32 {
    1500
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscountsToml {
    pub values: Vec<f64>,
    pub probs: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoodsToml {
    pub categories: Vec<String>,
    pub name_prefix: Vec<String>,
    pub category_capacity: Vec<u16>,
    pub prices: PricesToml,
    pub discounts: DiscountsToml,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadToml {
    /// `[min, max]` of the chain-wide daily load factor
    pub chain_daily: [f64; 2],
    /// `[min, max]` of the per-register multiplier
    pub cash_register_daily: [f64; 2],
    #[serde(default = "default_min_sec_per_transaction")]
    pub min_sec_per_transaction: u32,
}

fn default_min_sec_per_transaction() -> u32 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorToml {
    #[serde(default = "default_catalog_seed")]
    pub catalog_seed: u64,
    #[serde(default = "default_skip_sundays")]
    pub skip_sundays: bool,
}

impl Default for GeneratorToml {
    fn default() -> Self {
        Self { catalog_seed: default_catalog_seed(), skip_sundays: default_skip_sundays() }
    }
}

fn default_catalog_seed() -> u64 {
    42
}

fn default_skip_sundays() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputToml {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_output_format")]
    pub format: OutputFormat,
    /// Also write the `receipt` and `receipt_line` tables
    #[serde(default)]
    pub tables: bool,
}

impl Default for OutputToml {
    fn default() -> Self {
        Self { path: default_output_path(), format: default_output_format(), tables: false }
    }
}

fn default_output_path() -> String {
    "data".to_string()
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Csv
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingToml {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingToml {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub stores: StoresToml,
    pub goods: GoodsToml,
    pub load: LoadToml,
    #[serde(default)]
    pub generator: GeneratorToml,
    #[serde(default)]
    pub output: OutputToml,
    #[serde(default)]
    pub logging: LoggingToml,
}

/// Settings of one store in the chain
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSpec {
    pub id: StoreId,
    pub cash_registers: u8,
    pub rank: u32,
    pub opening_hour: u32,
    pub closing_hour: u32,
}

/// Goods taxonomy and price/discount model parameters
#[derive(Debug, Clone, PartialEq)]
pub struct GoodsSettings {
    pub categories: Vec<String>,
    pub name_prefix: Vec<String>,
    pub category_capacity: Vec<u16>,
    pub min_price: u32,
    pub max_price: u32,
    pub mean_price: u32,
    pub discount_values: Vec<f64>,
    pub discount_probs: Vec<f64>,
}

impl GoodsSettings {
    /// Catalog size: item keys run from 0 to capacity inclusive in every category
    pub fn catalog_size(&self) -> usize {
        self.category_capacity.iter().map(|&c| c as usize + 1).sum()
    }
}

/// Load ranges and the slot cadence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSettings {
    pub chain_daily: (f64, f64),
    pub cash_register_daily: (f64, f64),
    pub min_sec_per_transaction: u32,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    config_file: String,
    stores: Vec<StoreSpec>,
    goods: GoodsSettings,
    load: LoadSettings,
    catalog_seed: u64,
    skip_sundays: bool,
    output_path: String,
    output_format: OutputFormat,
    output_tables: bool,
    log_level: String,
    log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        let hours = [(9, 21), (10, 20), (8, 22)];
        let stores = [3u8, 2, 4]
            .iter()
            .zip([100u32, 60, 80])
            .zip(hours)
            .enumerate()
            .map(|(i, ((&cash_registers, rank), (open, close)))| StoreSpec {
                id: StoreId(i as u8),
                cash_registers,
                rank,
                opening_hour: open,
                closing_hour: close,
            })
            .collect();

        Self {
            config_file: DEFAULT_SOURCE.to_string(),
            stores,
            goods: GoodsSettings {
                categories: vec!["Kitchen".into(), "Bathroom".into(), "Garden".into()],
                name_prefix: vec!["KT".into(), "BT".into(), "GD".into()],
                category_capacity: vec![30, 20, 25],
                min_price: 50,
                max_price: 20000,
                mean_price: 1500,
                discount_values: vec![0.0, 0.05, 0.1, 0.2],
                discount_probs: vec![0.6, 0.2, 0.15, 0.05],
            },
            load: LoadSettings {
                chain_daily: (0.5, 0.9),
                cash_register_daily: (0.8, 1.2),
                min_sec_per_transaction: 120,
            },
            catalog_seed: default_catalog_seed(),
            skip_sundays: true,
            output_path: default_output_path(),
            output_format: OutputFormat::Csv,
            output_tables: false,
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Config {
    /// Determine config file path from args or environment
    pub fn resolve_config_path(args: &[String]) -> String {
        for (i, arg) in args.iter().enumerate() {
            if arg == "--config" {
                if let Some(path) = args.get(i + 1) {
                    return path.clone();
                }
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                return path.to_string();
            }
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        "config/default.toml".to_string()
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str, source: &str) -> Result<Self, SalesError> {
        let toml_config: TomlConfig = toml::from_str(content)
            .map_err(|e| SalesError::config(format!("failed to parse {}: {}", source, e)))?;

        let stores = toml_config.stores;
        if stores.ranks.len() != stores.cash_registers.len()
            || stores.opening_hours.len() != stores.cash_registers.len()
        {
            return Err(SalesError::config(
                "stores.cash_registers, stores.ranks and stores.opening_hours must have equal length",
            ));
        }
        if stores.cash_registers.len() > MAX_UNITS {
            return Err(SalesError::config(format!("at most {} stores are supported", MAX_UNITS)));
        }

        let store_specs = stores
            .cash_registers
            .iter()
            .zip(&stores.ranks)
            .zip(&stores.opening_hours)
            .enumerate()
            .map(|(i, ((&cash_registers, &rank), hours))| StoreSpec {
                id: StoreId(i as u8),
                cash_registers,
                rank,
                opening_hour: hours[0],
                closing_hour: hours[1],
            })
            .collect();

        let goods = toml_config.goods;
        let config = Self {
            config_file: source.to_string(),
            stores: store_specs,
            goods: GoodsSettings {
                categories: goods.categories,
                name_prefix: goods.name_prefix,
                category_capacity: goods.category_capacity,
                min_price: goods.prices.range[0],
                max_price: goods.prices.range[1],
                mean_price: goods.prices.mean,
                discount_values: goods.discounts.values,
                discount_probs: goods.discounts.probs,
            },
            load: LoadSettings {
                chain_daily: (toml_config.load.chain_daily[0], toml_config.load.chain_daily[1]),
                cash_register_daily: (
                    toml_config.load.cash_register_daily[0],
                    toml_config.load.cash_register_daily[1],
                ),
                min_sec_per_transaction: toml_config.load.min_sec_per_transaction,
            },
            catalog_seed: toml_config.generator.catalog_seed,
            skip_sundays: toml_config.generator.skip_sundays,
            output_path: toml_config.output.path,
            output_format: toml_config.output.format,
            output_tables: toml_config.output.tables,
            log_level: toml_config.logging.level,
            log_json: toml_config.logging.json,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SalesError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SalesError::config(format!("failed to read config file {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Load configuration - a missing file falls back to defaults, an invalid one is an error.
    /// Callers report the fallback through `uses_defaults` once logging is up.
    pub fn load_from_path(path: &str) -> Result<Self, SalesError> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Check every invariant the generator relies on
    pub fn validate(&self) -> Result<(), SalesError> {
        if self.stores.is_empty() {
            return Err(SalesError::config("at least one store is required"));
        }
        for store in &self.stores {
            if store.cash_registers == 0 || store.cash_registers as usize > MAX_UNITS {
                return Err(SalesError::config(format!(
                    "store {} must have between 1 and {} cash registers",
                    store.id, MAX_UNITS
                )));
            }
            if store.opening_hour >= store.closing_hour || store.closing_hour > 24 {
                return Err(SalesError::config(format!(
                    "store {} has invalid opening hours {}..{}",
                    store.id, store.opening_hour, store.closing_hour
                )));
            }
            if store.rank == 0 || store.rank > MAX_RANK {
                return Err(SalesError::config(format!(
                    "store {} rank must be between 1 and {} (got {})",
                    store.id, MAX_RANK, store.rank
                )));
            }
        }

        let goods = &self.goods;
        if goods.categories.is_empty() {
            return Err(SalesError::config("goods.categories must not be empty"));
        }
        if goods.name_prefix.len() != goods.categories.len()
            || goods.category_capacity.len() != goods.categories.len()
        {
            return Err(SalesError::config(
                "goods.categories, goods.name_prefix and goods.category_capacity must have equal length",
            ));
        }
        if goods.min_price == 0
            || goods.min_price > goods.mean_price
            || goods.mean_price > goods.max_price
        {
            return Err(SalesError::config(format!(
                "price settings must satisfy 0 < min ({}) <= mean ({}) <= max ({})",
                goods.min_price, goods.mean_price, goods.max_price
            )));
        }
        if goods.discount_values.is_empty()
            || goods.discount_values.len() != goods.discount_probs.len()
        {
            return Err(SalesError::config(
                "goods.discounts.values and goods.discounts.probs must be non-empty and of equal length",
            ));
        }
        if goods.discount_probs.iter().any(|&p| !(p >= 0.0)) {
            return Err(SalesError::config("discount probabilities must be non-negative"));
        }
        let prob_sum: f64 = goods.discount_probs.iter().sum();
        if (prob_sum - 1.0).abs() > PROB_SUM_TOLERANCE {
            return Err(SalesError::config(format!(
                "discount probabilities must sum to 1 (got {})",
                prob_sum
            )));
        }

        for (name, (lo, hi)) in [
            ("load.chain_daily", self.load.chain_daily),
            ("load.cash_register_daily", self.load.cash_register_daily),
        ] {
            if !(lo >= 0.0) || !(lo <= hi) || !hi.is_finite() {
                return Err(SalesError::config(format!(
                    "{} must be an ordered non-negative range (got [{}, {}])",
                    name, lo, hi
                )));
            }
        }
        let (lo, hi) = self.load.chain_daily;
        if hi > 1.0 {
            return Err(SalesError::config(format!(
                "load.chain_daily must lie within [0, 1] (got [{}, {}])",
                lo, hi
            )));
        }
        if self.load.min_sec_per_transaction == 0 {
            return Err(SalesError::config("load.min_sec_per_transaction must be positive"));
        }

        Ok(())
    }

    // Getters for all config fields
    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// True when no configuration file was found and built-in defaults are in use
    pub fn uses_defaults(&self) -> bool {
        self.config_file == DEFAULT_SOURCE
    }

    pub fn stores(&self) -> &[StoreSpec] {
        &self.stores
    }

    pub fn goods(&self) -> &GoodsSettings {
        &self.goods
    }

    pub fn load(&self) -> &LoadSettings {
        &self.load
    }

    pub fn catalog_seed(&self) -> u64 {
        self.catalog_seed
    }

    pub fn skip_sundays(&self) -> bool {
        self.skip_sundays
    }

    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn output_tables(&self) -> bool {
        self.output_tables
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn log_json(&self) -> bool {
        self.log_json
    }

    /// Builder method to replace the store topology
    pub fn with_stores(mut self, stores: Vec<StoreSpec>) -> Self {
        self.stores = stores;
        self
    }

    /// Builder method to replace the goods settings
    pub fn with_goods(mut self, goods: GoodsSettings) -> Self {
        self.goods = goods;
        self
    }

    /// Builder method to replace the load settings
    pub fn with_load(mut self, load: LoadSettings) -> Self {
        self.load = load;
        self
    }

    pub fn with_output(mut self, path: &str, format: OutputFormat) -> Self {
        self.output_path = path.to_string();
        self.output_format = format;
        self
    }

    pub fn with_output_tables(mut self, tables: bool) -> Self {
        self.output_tables = tables;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stores().len(), 3);
        assert_eq!(config.stores()[2].id, StoreId(2));
        assert_eq!(config.load().min_sec_per_transaction, 120);
        assert_eq!(config.output_format(), OutputFormat::Csv);
        assert_eq!(config.goods().catalog_size(), 31 + 21 + 26);
    }

    #[test]
    fn test_resolve_config_path_from_arg() {
        let args: Vec<String> =
            vec!["sales-generator".to_string(), "--config".to_string(), "config/big.toml".to_string()];
        assert_eq!(Config::resolve_config_path(&args), "config/big.toml");
    }

    #[test]
    fn test_resolve_config_path_from_arg_equals() {
        let args: Vec<String> =
            vec!["sales-generator".to_string(), "--config=config/small.toml".to_string()];
        assert_eq!(Config::resolve_config_path(&args), "config/small.toml");
    }

    #[test]
    fn test_rejects_discount_probs_not_summing_to_one() {
        let mut goods = Config::default().goods().clone();
        goods.discount_probs = vec![0.5, 0.2, 0.2, 0.2];
        let config = Config::default().with_goods(goods);
        assert!(matches!(config.validate(), Err(SalesError::Configuration(_))));
    }

    #[test]
    fn test_rejects_inverted_hours() {
        let config = Config::default().with_stores(vec![StoreSpec {
            id: StoreId(0),
            cash_registers: 1,
            rank: 100,
            opening_hour: 20,
            closing_hour: 9,
        }]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_mean_outside_price_range() {
        let mut goods = Config::default().goods().clone();
        goods.mean_price = 30_000;
        assert!(Config::default().with_goods(goods).validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_load_range() {
        let load = LoadSettings {
            chain_daily: (0.9, 0.5),
            cash_register_daily: (0.8, 1.2),
            min_sec_per_transaction: 120,
        };
        assert!(Config::default().with_load(load).validate().is_err());
    }

    fn single_store(rank: u32) -> Vec<StoreSpec> {
        vec![StoreSpec { id: StoreId(0), cash_registers: 1, rank, opening_hour: 9, closing_hour: 21 }]
    }

    #[test]
    fn test_rejects_rank_out_of_range() {
        for rank in [0, 101, 300, u32::MAX] {
            let config = Config::default().with_stores(single_store(rank));
            assert!(
                matches!(config.validate(), Err(SalesError::Configuration(_))),
                "rank {} accepted",
                rank
            );
        }
        assert!(Config::default().with_stores(single_store(MAX_RANK)).validate().is_ok());
        assert!(Config::default().with_stores(single_store(1)).validate().is_ok());
    }

    #[test]
    fn test_rejects_chain_load_above_one() {
        let load = LoadSettings {
            chain_daily: (2.0, 3.0),
            cash_register_daily: (0.8, 1.2),
            min_sec_per_transaction: 120,
        };
        let config = Config::default().with_stores(single_store(300)).with_load(load);
        assert!(matches!(config.validate(), Err(SalesError::Configuration(_))));

        let load = LoadSettings { chain_daily: (0.5, 1.01), ..load };
        let err = Config::default().with_load(load).validate().unwrap_err();
        assert!(err.to_string().contains("load.chain_daily"));

        let load = LoadSettings { chain_daily: (1.0, 1.0), ..load };
        assert!(Config::default().with_load(load).validate().is_ok());
    }

    #[test]
    fn test_uses_defaults() {
        assert!(Config::default().uses_defaults());
        let config = Config::load_from_path("/nonexistent/sales.toml").unwrap();
        assert!(config.uses_defaults());
    }

    #[test]
    fn test_output_format_value_enum() {
        use clap::ValueEnum;
        assert_eq!(OutputFormat::from_str("jsonl", false).unwrap(), OutputFormat::Jsonl);
        assert_eq!(OutputFormat::from_str("csv", false).unwrap(), OutputFormat::Csv);
        assert!(OutputFormat::from_str("parquet", false).is_err());
    }

    #[test]
    fn test_rejects_mismatched_store_arrays() {
        let content = r#"
[stores]
cash_registers = [2, 3]
ranks = [100]
opening_hours = [[9, 21], [9, 21]]

[goods]
categories = ["A"]
name_prefix = ["A"]
category_capacity = [1]
prices = { range = [100, 2000], mean = 500 }
discounts = { values = [0.0], probs = [1.0] }

[load]
chain_daily = [0.5, 0.9]
cash_register_daily = [0.8, 1.2]
"#;
        let err = Config::from_toml_str(content, "inline").unwrap_err();
        assert!(err.to_string().contains("equal length"));
    }
}
