// 📤 Export - bronze.csv / silver.csv writers
// Nulls are written as empty cells; dates as YYYY-MM-DD.

use crate::bronze::BronzeTable;
use crate::schema::{BRONZE_COLUMNS, SILVER_COLUMNS};
use crate::silver::SilverAggregate;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::{info, warn};

// Header is written explicitly so an empty table still declares its columns
fn write_rows<W, R>(writer: W, header: &[&str], rows: &[R]) -> Result<()>
where
    W: Write,
    R: Serialize,
{
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(header).context("Failed to write CSV header")?;
    for row in rows {
        wtr.serialize(row).context("Failed to write CSV row")?;
    }
    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

pub fn write_bronze<W: Write>(writer: W, bronze: &BronzeTable) -> Result<()> {
    write_rows(writer, &BRONZE_COLUMNS, &bronze.records())
}

pub fn write_silver<W: Write>(writer: W, silver: &[SilverAggregate]) -> Result<()> {
    write_rows(writer, &SILVER_COLUMNS, silver)
}

/// Bronze rendered to an in-memory CSV string
pub fn bronze_csv(bronze: &BronzeTable) -> Result<String> {
    let mut buf = Vec::new();
    write_bronze(&mut buf, bronze)?;
    String::from_utf8(buf).context("Bronze CSV is not valid UTF-8")
}

/// Silver rendered to an in-memory CSV string
pub fn silver_csv(silver: &[SilverAggregate]) -> Result<String> {
    let mut buf = Vec::new();
    write_silver(&mut buf, silver)?;
    String::from_utf8(buf).context("Silver CSV is not valid UTF-8")
}

pub fn write_bronze_file(path: &Path, bronze: &BronzeTable) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_bronze(file, bronze)?;
    info!(path = %path.display(), rows = bronze.len(), "wrote bronze");
    Ok(())
}

pub fn write_silver_file(path: &Path, silver: &[SilverAggregate]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_silver(file, silver)?;
    info!(path = %path.display(), rows = silver.len(), "wrote silver");
    Ok(())
}

/// Delete output left by an earlier run; a missing file is fine
pub fn remove_stale_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            warn!(path = %path.display(), "removed stale output");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_empty_bronze_has_header() {
        let csv = bronze_csv(&BronzeTable::empty()).unwrap();

        assert_eq!(csv, "date,partner,amount,source_file,ingested_at\n");
    }

    #[test]
    fn test_silver_nulls_are_empty_cells() {
        let silver = vec![
            SilverAggregate {
                month: NaiveDate::from_ymd_opt(2024, 1, 1),
                partner: Some("ACME".to_string()),
                amount: Some(1734.5),
            },
            SilverAggregate { month: None, partner: None, amount: None },
        ];

        let csv = silver_csv(&silver).unwrap();

        assert_eq!(csv, "month,partner,amount\n2024-01-01,ACME,1734.5\n,,\n");
    }

    #[test]
    fn test_remove_stale_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("silver.csv");
        write_silver_file(&path, &[]).unwrap();
        assert!(path.exists());

        remove_stale_file(&path).unwrap();
        assert!(!path.exists());

        // Already gone
        remove_stale_file(&path).unwrap();
    }
}
