// 🔁 Pipeline - one processing run
// normalize → tag → assemble bronze → validate → (if clean) aggregate silver

use crate::bronze::{concat_bronze, BronzeTable};
use crate::data_quality::{basic_checks, Violation};
use crate::lineage::tag_lineage;
use crate::normalize::{normalize_columns, ColumnMapping};
use crate::parser::RawSource;
use crate::schema::SchemaError;
use crate::silver::{to_silver, SilverAggregate};
use crate::table::Table;
use crate::temporal::Clock;
use tracing::{info, warn};

/// One source as handed to a run
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub name: String,
    pub table: Table,
    pub mapping: ColumnMapping,
}

impl SourceBatch {
    pub fn new(name: impl Into<String>, table: Table, mapping: ColumnMapping) -> Self {
        SourceBatch {
            name: name.into(),
            table,
            mapping,
        }
    }

    pub fn from_raw(raw: RawSource, mapping: ColumnMapping) -> Self {
        SourceBatch::new(raw.name, raw.table, mapping)
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub bronze: BronzeTable,
    pub violations: Vec<Violation>,
    /// Present only when validation passed
    pub silver: Option<Vec<SilverAggregate>>,
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Run every stage over `sources`.
///
/// Data problems come back as violations in the outcome; only a schema breach
/// (which bronze assembly rules out) is an `Err`.
pub fn run<C: Clock + ?Sized>(sources: &[SourceBatch], clock: &C) -> Result<RunOutcome, SchemaError> {
    let tagged: Vec<Table> = sources
        .iter()
        .map(|source| {
            let normalized = normalize_columns(&source.table, &source.mapping);
            tag_lineage(&normalized, &source.name, clock)
        })
        .collect();

    let bronze = concat_bronze(tagged);
    info!(sources = sources.len(), rows = bronze.len(), "bronze assembled");

    let violations = if bronze.is_empty() {
        vec![Violation::empty_dataset()]
    } else {
        basic_checks(&bronze.canonical()?)
    };

    if !violations.is_empty() {
        for v in &violations {
            warn!(rule = %v.rule, field = %v.field, "{}", v.message);
        }
        return Ok(RunOutcome {
            bronze,
            violations,
            silver: None,
        });
    }

    let silver = to_silver(&bronze.canonical()?)?;
    info!(groups = silver.len(), "silver derived");

    Ok(RunOutcome {
        bronze,
        violations,
        silver: Some(silver),
    })
}

// ============================================================================
// TESTS
// ============================================================================
