//! Integration tests for configuration loading

use sales_generator::domain::StoreId;
use sales_generator::infra::{Config, OutputFormat};
use sales_generator::SalesError;
use std::io::Write;
use tempfile::NamedTempFile;

const VALID: &str = r#"
[stores]
cash_registers = [2, 1]
ranks = [100, 50]
opening_hours = [[9, 21], [10, 18]]

[goods]
categories = ["A", "B"]
name_prefix = ["a", "b"]
category_capacity = [1, 1]

[goods.prices]
range = [100, 2000]
mean = 500

[goods.discounts]
values = [0.0, 0.1]
probs = [0.5, 0.5]

[load]
chain_daily = [0.6, 0.8]
cash_register_daily = [0.9, 1.1]
min_sec_per_transaction = 90

[output]
path = "out"
format = "jsonl"
tables = true
"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_config_from_file() {
    let temp_file = write_temp(VALID);
    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.stores().len(), 2);
    assert_eq!(config.stores()[1].id, StoreId(1));
    assert_eq!(config.stores()[1].rank, 50);
    assert_eq!(config.stores()[1].closing_hour, 18);
    assert_eq!(config.goods().catalog_size(), 4);
    assert_eq!(config.goods().min_price, 100);
    assert_eq!(config.load().cash_register_daily, (0.9, 1.1));
    assert_eq!(config.load().min_sec_per_transaction, 90);
    assert_eq!(config.output_path(), "out");
    assert_eq!(config.output_format(), OutputFormat::Jsonl);
    assert!(config.output_tables());
    assert!(!config.uses_defaults());
    // Sections left out fall back to defaults
    assert_eq!(config.catalog_seed(), 42);
    assert!(config.skip_sundays());
    assert_eq!(config.log_level(), "info");
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml").unwrap();
    assert!(config.uses_defaults());
    assert_eq!(config.stores().len(), 3);
}

#[test]
fn test_invalid_file_is_configuration_error() {
    let content = VALID.replace("probs = [0.5, 0.5]", "probs = [0.5, 0.6]");
    let temp_file = write_temp(&content);
    let path = temp_file.path().to_str().unwrap().to_string();

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(matches!(err, SalesError::Configuration(_)));
    assert!(err.to_string().contains("sum to 1"));
}

#[test]
fn test_malformed_toml_is_configuration_error() {
    let temp_file = write_temp("[stores\ncash_registers = ");
    assert!(matches!(Config::from_file(temp_file.path()), Err(SalesError::Configuration(_))));
}

#[test]
fn test_bundled_default_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
    let config = Config::from_file(path).unwrap();
    assert_eq!(config.stores().len(), 4);
    assert_eq!(config.goods().categories.len(), 4);
}

#[test]
fn test_rank_above_hundred_is_configuration_error() {
    let content = VALID.replace("ranks = [100, 50]", "ranks = [300, 50]");
    let temp_file = write_temp(&content);
    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(matches!(err, SalesError::Configuration(_)));
    assert!(err.to_string().contains("rank"));
}

#[test]
fn test_chain_load_above_one_is_configuration_error() {
    let content = VALID.replace("chain_daily = [0.6, 0.8]", "chain_daily = [2.0, 3.0]");
    let temp_file = write_temp(&content);
    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("load.chain_daily"));
}
