// 🏷️ Lineage Tagger
// Stamps a normalized batch with where it came from and when it was ingested.

use crate::schema::{INGESTED_AT, SOURCE_FILE};
use crate::table::Table;
use crate::temporal::{iso_timestamp, Clock};
use tracing::debug;

/// Append `source_file` and `ingested_at` to every row of `table`.
///
/// The clock is read once, so all rows of one call share the same timestamp.
pub fn tag_lineage<C: Clock + ?Sized>(table: &Table, source_name: &str, clock: &C) -> Table {
    let ingested_at = iso_timestamp(clock.now());
    debug!(source = source_name, %ingested_at, rows = table.height(), "tagging lineage");

    table
        .clone()
        .with_constant(SOURCE_FILE, source_name)
        .with_constant(INGESTED_AT, &ingested_at)
}
