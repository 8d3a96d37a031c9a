// 📐 Shape Layer - Canonical column names + schema errors
// Data-quality problems never land here; these errors mean the caller broke the contract.

use crate::table::Table;
use thiserror::Error;

// ============================================================================
// COLUMN NAMES
// ============================================================================

pub const DATE: &str = "date";
pub const PARTNER: &str = "partner";
pub const AMOUNT: &str = "amount";
pub const SOURCE_FILE: &str = "source_file";
pub const INGESTED_AT: &str = "ingested_at";
pub const MONTH: &str = "month";

/// The three-field shape every source is normalized into
pub const CANONICAL_COLUMNS: [&str; 3] = [DATE, PARTNER, AMOUNT];

/// Fixed bronze column set, in output order
pub const BRONZE_COLUMNS: [&str; 5] = [DATE, PARTNER, AMOUNT, SOURCE_FILE, INGESTED_AT];

/// Silver export header
pub const SILVER_COLUMNS: [&str; 3] = [MONTH, PARTNER, AMOUNT];

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("column '{name}' has {found} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
}

/// Names from `required` that the table does not declare, in `required` order
pub fn missing_columns(table: &Table, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !table.has_column(name))
        .map(|name| name.to_string())
        .collect()
}

/// Hard check used by the aggregation side of the pipeline.
///
/// The message lists the missing names sorted, so the same breach always
/// reads the same way regardless of which columns were passed in.
pub fn require_columns(table: &Table, required: &[&str]) -> Result<(), SchemaError> {
    let mut missing = missing_columns(table, required);
    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    Err(SchemaError::MissingColumns(missing))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    #[test]
    fn test_missing_columns_keeps_required_order() {
        let table = Table::from_columns(vec![(
            PARTNER.to_string(),
            Column::Text(vec![Some("ACME".to_string())]),
        )])
        .unwrap();

        assert_eq!(
            missing_columns(&table, &CANONICAL_COLUMNS),
            vec!["date".to_string(), "amount".to_string()]
        );
    }

    #[test]
    fn test_require_columns_sorts_names() {
        let table = Table::empty(0);
        let err = require_columns(&table, &[PARTNER, DATE]).unwrap_err();

        assert_eq!(
            err,
            SchemaError::MissingColumns(vec!["date".to_string(), "partner".to_string()])
        );
        assert_eq!(err.to_string(), "missing required columns: date, partner");
    }

    #[test]
    fn test_require_columns_ok() {
        let table = Table::from_columns(vec![
            (DATE.to_string(), Column::Date(vec![])),
            (PARTNER.to_string(), Column::Text(vec![])),
            (AMOUNT.to_string(), Column::Number(vec![])),
        ])
        .unwrap();

        assert!(require_columns(&table, &CANONICAL_COLUMNS).is_ok());
    }
}
