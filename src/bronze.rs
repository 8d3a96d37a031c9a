// 🥉 Bronze Assembler
// Unifies tagged batches into one table with the fixed column set
// date, partner, amount, source_file, ingested_at.

use crate::schema::{SchemaError, AMOUNT, CANONICAL_COLUMNS, DATE, INGESTED_AT, PARTNER, SOURCE_FILE};
use crate::table::{Column, ColumnType, Table};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Declared type of each bronze column, in output order
const BRONZE_TYPES: [(&str, ColumnType); 5] = [
    (DATE, ColumnType::Date),
    (PARTNER, ColumnType::Text),
    (AMOUNT, ColumnType::Number),
    (SOURCE_FILE, ColumnType::Text),
    (INGESTED_AT, ColumnType::Text),
];

// ============================================================================
// BRONZE TABLE
// ============================================================================

/// Unified, lineage-tagged, per-row canonical table.
/// Always declares the five bronze columns with their bronze types.
#[derive(Debug, Clone, PartialEq)]
pub struct BronzeTable(Table);

/// One bronze row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BronzeRecord {
    pub date: Option<NaiveDate>,
    pub partner: Option<String>,
    pub amount: Option<f64>,
    pub source_file: Option<String>,
    pub ingested_at: Option<String>,
}

impl BronzeTable {
    /// Zero rows, five declared columns
    pub fn empty() -> Self {
        let mut table = Table::empty(0);
        for (name, kind) in BRONZE_TYPES {
            table.put(name, Column::nulls(kind, 0));
        }
        BronzeTable(table)
    }

    pub fn table(&self) -> &Table {
        &self.0
    }

    pub fn into_table(self) -> Table {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `date, partner, amount` projection handed to validation and aggregation
    pub fn canonical(&self) -> Result<Table, SchemaError> {
        self.0.select(&CANONICAL_COLUMNS)
    }

    pub fn records(&self) -> Vec<BronzeRecord> {
        let dates = self.0.column(DATE).and_then(Column::as_date).unwrap_or(&[]);
        let partners = self.0.column(PARTNER).and_then(Column::as_text).unwrap_or(&[]);
        let amounts = self.0.column(AMOUNT).and_then(Column::as_number).unwrap_or(&[]);
        let sources = self.0.column(SOURCE_FILE).and_then(Column::as_text).unwrap_or(&[]);
        let stamps = self.0.column(INGESTED_AT).and_then(Column::as_text).unwrap_or(&[]);

        (0..self.len())
            .map(|i| BronzeRecord {
                date: dates.get(i).copied().flatten(),
                partner: partners.get(i).cloned().flatten(),
                amount: amounts.get(i).copied().flatten(),
                source_file: sources.get(i).cloned().flatten(),
                ingested_at: stamps.get(i).cloned().flatten(),
            })
            .collect()
    }
}

impl Default for BronzeTable {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// ASSEMBLY
// ============================================================================

/// Concatenate tagged batches into bronze.
///
/// Absent (`None`) and empty batches are skipped. Missing bronze columns are
/// null-filled, then every column is coerced to its bronze type. Rows keep
/// append order; nothing is sorted or deduplicated.
pub fn concat_bronze<I, T>(frames: I) -> BronzeTable
where
    I: IntoIterator<Item = T>,
    T: Into<Option<Table>>,
{
    // One accumulator per bronze column; each batch is appended once
    let mut columns: Vec<Column> = BRONZE_TYPES.iter().map(|&(_, kind)| Column::nulls(kind, 0)).collect();
    let mut rows = 0usize;
    let mut used = 0usize;
    let mut skipped = 0usize;

    for frame in frames {
        let frame: Option<Table> = frame.into();
        let frame = match frame {
            Some(f) if !f.is_empty() => f,
            _ => {
                skipped += 1;
                continue;
            }
        };

        let height = frame.height();
        for (column, (name, kind)) in columns.iter_mut().zip(BRONZE_TYPES) {
            let incoming = frame
                .column(name)
                .cloned()
                .unwrap_or_else(|| Column::nulls(kind, height))
                .coerce(kind);
            column.append(incoming);
        }

        rows += height;
        used += 1;
    }

    let mut table = Table::empty(rows);
    for (column, (name, _)) in columns.into_iter().zip(BRONZE_TYPES) {
        table.put(name, column);
    }
    let bronze = BronzeTable(table);

    debug!(used, skipped, rows = bronze.len(), "assembled bronze");
    bronze
}

// ============================================================================
// TESTS
// ============================================================================
