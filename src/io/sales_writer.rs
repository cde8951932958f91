//! Sales egress - writes a finished day to per-register files
//!
//! Layout: `<root>/<YYYY-MM-DD>/<store>_<register>.<csv|jsonl>`. With tables enabled the
//! same directory also gets `receipt.<ext>` and `receipt_line.<ext>`, one record per
//! receipt and per receipt line, keyed by receipt id for table loads.
//! Writing a day replaces that day's directory, so re-running a date is idempotent.

use crate::domain::records::SalesRow;
use crate::error::SalesError;
use crate::infra::config::OutputFormat;
use crate::services::flatten::DaySales;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of persisting one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub dir: PathBuf,
    pub files: usize,
    pub rows: usize,
}

/// Destination for a fully generated day
#[async_trait]
pub trait SalesSink: Send + Sync {
    async fn write_day(&self, day: Arc<DaySales>) -> Result<WriteSummary, SalesError>;
}

#[derive(Debug, Clone)]
pub struct FileSalesWriter {
    root: PathBuf,
    format: OutputFormat,
    tables: bool,
}

impl FileSalesWriter {
    pub fn new(root: impl AsRef<Path>, format: OutputFormat) -> Self {
        let root = root.as_ref().to_path_buf();
        info!(root = %root.display(), format = %format.extension(), "sales_writer_initialized");
        Self { root, format, tables: false }
    }

    /// Also write the `receipt` and `receipt_line` tables
    pub fn with_tables(mut self, tables: bool) -> Self {
        self.tables = tables;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the files of one processing day
    pub fn day_dir(&self, date: chrono::NaiveDate) -> PathBuf {
        self.root.join(date.format("%Y-%m-%d").to_string())
    }

    /// Write all rows of a day, one file per (store, register)
    pub fn write_files(&self, day: &DaySales) -> Result<WriteSummary, SalesError> {
        let date = day
            .date
            .ok_or_else(|| SalesError::Persistence("day has no processing date".to_string()))?;
        let dir = self.day_dir(date);

        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;

        let mut units: FxHashMap<(&str, &str), Vec<&SalesRow>> = FxHashMap::default();
        for row in &day.rows {
            units.entry((row.store.as_str(), row.register.as_str())).or_default().push(row);
        }

        let mut files = 0usize;
        for ((store, register), rows) in &units {
            self.write_records(&dir, &format!("{}_{}", store, register), rows)?;
            files += 1;
        }

        if self.tables {
            self.write_records(&dir, "receipt", &day.receipts)?;
            self.write_records(&dir, "receipt_line", &day.lines)?;
            files += 2;
        }

        let summary = WriteSummary { dir, files, rows: day.rows.len() };
        info!(
            dir = %summary.dir.display(),
            files = %summary.files,
            rows = %summary.rows,
            "sales_day_written"
        );
        Ok(summary)
    }

    fn write_records<T: Serialize>(
        &self,
        dir: &Path,
        stem: &str,
        records: &[T],
    ) -> Result<(), SalesError> {
        let path = dir.join(format!("{}.{}", stem, self.format.extension()));
        match self.format {
            OutputFormat::Csv => write_csv(&path, records)?,
            OutputFormat::Jsonl => write_jsonl(&path, records)?,
        }
        debug!(file = %path.display(), rows = %records.len(), "sales_file_written");
        Ok(())
    }
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), SalesError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), SalesError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[async_trait]
impl SalesSink for FileSalesWriter {
    async fn write_day(&self, day: Arc<DaySales>) -> Result<WriteSummary, SalesError> {
        let writer = self.clone();
        tokio::task::spawn_blocking(move || writer.write_files(&day))
            .await
            .map_err(|e| SalesError::Persistence(format!("writer task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{RegisterId, StoreId};
    use crate::infra::config::Config;
    use crate::infra::metrics::Metrics;
    use crate::services::cash_register::CashRegister;
    use crate::services::catalog::Catalog;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn row(store: &str, register: &str, id: &str, quantity: u32) -> SalesRow {
        SalesRow {
            store: store.to_string(),
            register: register.to_string(),
            receipt_id: id.to_string(),
            receipt_time: date().and_hms_opt(9, 0, 0).unwrap(),
            category_key: 0,
            item_key: 4,
            item: "KT4".to_string(),
            category: "Kitchen".to_string(),
            price: 1250,
            discount: 0.1,
            quantity,
        }
    }

    fn sample_day() -> DaySales {
        let mut day = DaySales::new(date());
        day.rows = vec![
            row("A", "a", "Aa20240101090000", 1),
            row("A", "a", "Aa20240101090000", 3),
            row("A", "b", "Ab20240101090000", 2),
            row("B", "a", "Ba20240101090000", 1),
        ];
        day
    }

    #[test]
    fn test_write_csv_files() {
        let dir = tempdir().unwrap();
        let writer = FileSalesWriter::new(dir.path(), OutputFormat::Csv);

        let summary = writer.write_files(&sample_day()).unwrap();
        assert_eq!(summary.files, 3);
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.dir, dir.path().join("2024-01-01"));

        let content = fs::read_to_string(summary.dir.join("A_a.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("store,register,receipt_id,receipt_time"));
        assert!(lines[1].contains("Aa20240101090000"));
        assert!(summary.dir.join("B_a.csv").exists());
    }

    #[test]
    fn test_write_jsonl_files() {
        let dir = tempdir().unwrap();
        let writer = FileSalesWriter::new(dir.path(), OutputFormat::Jsonl);
        let summary = writer.write_files(&sample_day()).unwrap();

        let content = fs::read_to_string(summary.dir.join("A_a.jsonl")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed["quantity"], 3);
        assert_eq!(parsed["item"], "KT4");
    }

    #[test]
    fn test_rewrite_replaces_day() {
        let dir = tempdir().unwrap();
        let writer = FileSalesWriter::new(dir.path(), OutputFormat::Csv);
        let day_dir = writer.day_dir(date());
        fs::create_dir_all(&day_dir).unwrap();
        fs::write(day_dir.join("Z_z.csv"), "stale").unwrap();

        writer.write_files(&sample_day()).unwrap();
        writer.write_files(&sample_day()).unwrap();

        assert!(!day_dir.join("Z_z.csv").exists());
        assert_eq!(fs::read_dir(&day_dir).unwrap().count(), 3);
    }

    #[test]
    fn test_write_receipt_tables() {
        let catalog = Catalog::build(Config::default().goods(), 42).unwrap();
        let times = vec![
            date().and_hms_opt(9, 0, 0).unwrap(),
            date().and_hms_opt(9, 0, 0).unwrap(),
            date().and_hms_opt(11, 30, 0).unwrap(),
        ];
        let mut register = CashRegister::new(StoreId(0), RegisterId(1), times, 7);
        register.create_day(&catalog, &Metrics::new()).unwrap();
        let mut day = DaySales::new(date());
        day.push_register(&register, &catalog);

        let dir = tempdir().unwrap();
        let writer = FileSalesWriter::new(dir.path(), OutputFormat::Csv).with_tables(true);
        let summary = writer.write_files(&day).unwrap();
        assert_eq!(summary.files, 3);

        let receipts = fs::read_to_string(summary.dir.join("receipt.csv")).unwrap();
        let receipts: Vec<&str> = receipts.lines().collect();
        assert_eq!(receipts[0], "id,receipt_time,store_id,cash_reg_id");
        assert_eq!(receipts.len(), 4);
        assert!(receipts[2].starts_with("Ab20240101090000-1,"));
        assert!(receipts[1].ends_with(",0,1"));

        let lines = fs::read_to_string(summary.dir.join("receipt_line.csv")).unwrap();
        let lines: Vec<&str> = lines.lines().collect();
        assert_eq!(lines[0], "id_receipt,line_no,category_key,item_key,quantity");
        assert_eq!(lines.len(), day.rows.len() + 1);
        assert!(lines[1].starts_with("Ab20240101090000,1,"));
    }

    #[test]
    fn test_tables_off_by_default() {
        let dir = tempdir().unwrap();
        let writer = FileSalesWriter::new(dir.path(), OutputFormat::Jsonl);
        let summary = writer.write_files(&sample_day()).unwrap();
        assert!(!summary.dir.join("receipt.jsonl").exists());
        assert!(!summary.dir.join("receipt_line.jsonl").exists());
    }

    #[test]
    fn test_day_without_date_is_persistence_error() {
        let dir = tempdir().unwrap();
        let writer = FileSalesWriter::new(dir.path(), OutputFormat::Csv);
        let err = writer.write_files(&DaySales::default()).unwrap_err();
        assert!(matches!(err, SalesError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_sink_write_day() {
        let dir = tempdir().unwrap();
        let sink: Box<dyn SalesSink> = Box::new(FileSalesWriter::new(dir.path(), OutputFormat::Csv));
        let summary = sink.write_day(Arc::new(sample_day())).await.unwrap();
        assert_eq!(summary.rows, 4);
    }
}
