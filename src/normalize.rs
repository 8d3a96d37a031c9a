// 🧹 Column Normalizer
// Maps source-specific column names onto the canonical {date, partner, amount} schema
// and cleans each role. Unmapped columns never survive.

use crate::amount::parse_amounts;
use crate::schema::{AMOUNT, DATE, PARTNER};
use crate::table::{Column, ColumnType, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

// ============================================================================
// CANONICAL FIELDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    Date,
    Partner,
    Amount,
}

impl CanonicalField {
    /// Output order of canonical columns
    pub const ALL: [CanonicalField; 3] = [
        CanonicalField::Date,
        CanonicalField::Partner,
        CanonicalField::Amount,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            CanonicalField::Date => DATE,
            CanonicalField::Partner => PARTNER,
            CanonicalField::Amount => AMOUNT,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        CanonicalField::ALL
            .into_iter()
            .find(|f| f.column_name() == name)
    }
}

// ============================================================================
// COLUMN MAPPING
// ============================================================================

/// Source column name → canonical role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    entries: BTreeMap<String, CanonicalField>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        ColumnMapping::default()
    }

    /// `date → date`, `partner → partner`, `amount → amount`
    pub fn identity() -> Self {
        CanonicalField::ALL
            .into_iter()
            .fold(ColumnMapping::new(), |m, f| m.with(f.column_name(), f))
    }

    /// Builder pattern: map `source` onto `field`
    pub fn with(mut self, source: impl Into<String>, field: CanonicalField) -> Self {
        self.entries.insert(source.into(), field);
        self
    }

    pub fn target(&self, source: &str) -> Option<CanonicalField> {
        self.entries.get(source).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, CanonicalField)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// First source column (in table order) mapped onto `field`
    fn source_for<'t>(&self, table: &'t Table, field: CanonicalField) -> Option<(&'t str, &'t Column)> {
        let mut hits = table.iter().filter(|(name, _)| self.target(name) == Some(field));
        let first = hits.next();
        if let Some((extra, _)) = hits.next() {
            debug!(field = field.column_name(), ignored = extra, "several columns map to one role, keeping the first");
        }
        first
    }
}

// ============================================================================
// CLEANUP
// ============================================================================

/// Trim and collapse internal whitespace runs; blank text becomes null
pub fn clean_partner(raw: &str) -> Option<String> {
    let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn normalize_field(field: CanonicalField, column: &Column) -> Column {
    match field {
        CanonicalField::Date => column.clone().coerce(ColumnType::Date),
        CanonicalField::Partner => Column::Text(
            column
                .to_texts()
                .iter()
                .map(|c| c.as_deref().and_then(clean_partner))
                .collect(),
        ),
        CanonicalField::Amount => Column::Number(parse_amounts(column.to_texts())),
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Rename, select and clean `raw` into the canonical schema.
///
/// The output holds only the canonical columns the mapping actually supplied,
/// in `date, partner, amount` order, with the same row count as `raw`.
pub fn normalize_columns(raw: &Table, mapping: &ColumnMapping) -> Table {
    let mut normalized = Table::empty(raw.height());

    for field in CanonicalField::ALL {
        if let Some((source, column)) = mapping.source_for(raw, field) {
            debug!(source, target = field.column_name(), "mapping column");
            normalized.put(field.column_name(), normalize_field(field, column));
        }
    }

    debug!(
        rows = normalized.height(),
        columns = normalized.width(),
        dropped = raw.width().saturating_sub(normalized.width()),
        "normalized source"
    );
    normalized
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn cell(s: &str) -> Option<String> {
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    }

    fn raw(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_records(
            headers,
            rows.iter().map(|r| r.iter().map(|c| cell(c)).collect()).collect(),
        )
    }

    fn spanish_mapping() -> ColumnMapping {
        ColumnMapping::new()
            .with("Fecha", CanonicalField::Date)
            .with("Cliente", CanonicalField::Partner)
            .with("Importe", CanonicalField::Amount)
    }

    #[test]
    fn test_renames_and_types_columns() {
        let table = raw(
            &["Fecha", "Cliente", "Importe", "Notas"],
            &[&["15/01/2024", "  ACME   Corp ", "1.234,56", "x"]],
        );

        let out = normalize_columns(&table, &spanish_mapping());

        assert_eq!(out.names().collect::<Vec<_>>(), vec!["date", "partner", "amount"]);
        assert_eq!(
            out.column("date"),
            Some(&Column::Date(vec![NaiveDate::from_ymd_opt(2024, 1, 15)]))
        );
        assert_eq!(
            out.column("partner"),
            Some(&Column::Text(vec![Some("ACME Corp".to_string())]))
        );
        assert_eq!(out.column("amount"), Some(&Column::Number(vec![Some(1234.56)])));
    }

    #[test]
    fn test_unmapped_columns_dropped_even_if_canonical_named() {
        let table = raw(&["date", "Cliente"], &[&["2024-01-01", "ACME"]]);
        let mapping = ColumnMapping::new().with("Cliente", CanonicalField::Partner);

        let out = normalize_columns(&table, &mapping);

        assert_eq!(out.names().collect::<Vec<_>>(), vec!["partner"]);
    }

    #[test]
    fn test_empty_mapping_yields_no_columns() {
        let table = raw(&["a", "b"], &[&["1", "2"], &["3", "4"]]);

        let out = normalize_columns(&table, &ColumnMapping::new());

        assert_eq!(out.width(), 0);
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_unparseable_values_become_null() {
        let table = raw(
            &["date", "partner", "amount"],
            &[&["not a date", "", "abc"], &["2024-02-01", "B", ""]],
        );

        let out = normalize_columns(&table, &ColumnMapping::identity());

        assert_eq!(out.column("date").map(|c| c.null_count()), Some(1));
        assert_eq!(out.column("partner"), Some(&Column::Text(vec![None, Some("B".to_string())])));
        assert_eq!(out.column("amount"), Some(&Column::Number(vec![None, None])));
    }

    #[test]
    fn test_idempotent_on_canonical_input() {
        let table = raw(
            &["date", "partner", "amount"],
            &[&["2024-01-20", "ACME", "500.00"], &["", "Beta  Ltd", "1.234,5"]],
        );
        let mapping = ColumnMapping::identity();

        let once = normalize_columns(&table, &mapping);
        let twice = normalize_columns(&once, &mapping);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_first_matching_column_wins() {
        let table = raw(&["Importe", "Total"], &[&["1", "2"]]);
        let mapping = ColumnMapping::new()
            .with("Importe", CanonicalField::Amount)
            .with("Total", CanonicalField::Amount);

        let out = normalize_columns(&table, &mapping);

        assert_eq!(out.column("amount"), Some(&Column::Number(vec![Some(1.0)])));
    }

    #[test]
    fn test_clean_partner() {
        assert_eq!(clean_partner("  a \t b\u{a0}c  "), Some("a b c".to_string()));
        assert_eq!(clean_partner("   "), None);
    }

    #[test]
    fn test_canonical_field_names() {
        assert_eq!(CanonicalField::from_name("amount"), Some(CanonicalField::Amount));
        assert_eq!(CanonicalField::from_name("Importe"), None);
        assert_eq!(ColumnMapping::identity().len(), 3);
    }
}
