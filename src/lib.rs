// Partner Ledger - Core Library
// Heterogeneous transaction CSVs → canonical bronze table → monthly partner silver table

pub mod table;
pub mod schema;
pub mod temporal;
pub mod amount;
pub mod normalize;
pub mod lineage;
pub mod bronze;
pub mod data_quality;
pub mod silver;
pub mod report;
pub mod parser;
pub mod export;
pub mod config;
pub mod pipeline;
pub mod logging;

// Re-export commonly used types
pub use table::{Column, ColumnType, Table};
pub use schema::{SchemaError, BRONZE_COLUMNS, CANONICAL_COLUMNS, SILVER_COLUMNS};
pub use temporal::{parse_date, Clock, FixedClock, SystemClock};
pub use amount::{parse_amount, parse_amounts, SeparatorStyle};
pub use normalize::{normalize_columns, CanonicalField, ColumnMapping};
pub use lineage::tag_lineage;
pub use bronze::{concat_bronze, BronzeRecord, BronzeTable};
pub use data_quality::{basic_checks, Violation};
pub use silver::{to_silver, SilverAggregate};
pub use report::{kpis, monthly_totals, Kpis, MonthlyTotal, RunReport, SourceSummary};
pub use parser::{CsvSourceReader, RawSource, SourceEncoding};
pub use config::{build_mapping, Config};
pub use pipeline::{run, RunOutcome, SourceBatch};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
