// 🧱 Table - Tagged columnar frame
// Raw sources arrive as all-text columns; each stage returns a new Table with
// typed columns. No stage mutates the table it was given.

use crate::schema::SchemaError;
use crate::temporal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// COLUMN TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Date,
}

impl ColumnType {
    pub fn name(&self) -> &str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
        }
    }
}

/// One column of cells; `None` is a null cell
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<Option<String>>),
    Number(Vec<Option<f64>>),
    Date(Vec<Option<NaiveDate>>),
}

impl Column {
    /// Null-filled column of the given type
    pub fn nulls(kind: ColumnType, len: usize) -> Self {
        match kind {
            ColumnType::Text => Column::Text(vec![None; len]),
            ColumnType::Number => Column::Number(vec![None; len]),
            ColumnType::Date => Column::Date(vec![None; len]),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Text(_) => ColumnType::Text,
            Column::Number(_) => ColumnType::Number,
            Column::Date(_) => ColumnType::Date,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::Number(v) => v.len(),
            Column::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            Column::Text(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::Number(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::Date(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    pub fn as_text(&self) -> Option<&[Option<String>]> {
        match self {
            Column::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&[Option<f64>]> {
        match self {
            Column::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&[Option<NaiveDate>]> {
        match self {
            Column::Date(v) => Some(v),
            _ => None,
        }
    }

    /// Render every cell as text, keeping nulls null
    pub fn to_texts(&self) -> Vec<Option<String>> {
        match self {
            Column::Text(v) => v.clone(),
            Column::Number(v) => v.iter().map(|c| c.map(|n| n.to_string())).collect(),
            Column::Date(v) => v
                .iter()
                .map(|c| c.map(|d| d.format("%Y-%m-%d").to_string()))
                .collect(),
        }
    }

    /// Coerce to `kind`. Cells that cannot be represented become null.
    ///
    /// - text → number: strict float parse (no separator heuristics)
    /// - text → date: best-effort date parse
    /// - number ↔ date: always null
    pub fn coerce(self, kind: ColumnType) -> Column {
        match (self, kind) {
            (col @ Column::Text(_), ColumnType::Text)
            | (col @ Column::Number(_), ColumnType::Number)
            | (col @ Column::Date(_), ColumnType::Date) => col,

            (col, ColumnType::Text) => Column::Text(col.to_texts()),

            (Column::Text(v), ColumnType::Number) => Column::Number(
                v.iter()
                    .map(|c| c.as_deref().and_then(parse_strict_number))
                    .collect(),
            ),
            (Column::Text(v), ColumnType::Date) => Column::Date(
                v.iter()
                    .map(|c| c.as_deref().and_then(temporal::parse_date))
                    .collect(),
            ),

            (col, other) => Column::nulls(other, col.len()),
        }
    }

    /// Append `other` after this column, coercing it to this column's type first
    pub fn append(&mut self, other: Column) {
        let other = other.coerce(self.column_type());
        match (self, other) {
            (Column::Text(a), Column::Text(b)) => a.extend(b),
            (Column::Number(a), Column::Number(b)) => a.extend(b),
            (Column::Date(a), Column::Date(b)) => a.extend(b),
            _ => unreachable!("coerce returns the requested column type"),
        }
    }
}

fn parse_strict_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

// ============================================================================
// TABLE
// ============================================================================

/// Ordered named columns of equal height.
///
/// A table can have rows but no columns (a mapping that selected nothing),
/// so the height is tracked separately from the columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    /// Table with `height` rows and no columns
    pub fn empty(height: usize) -> Self {
        Table {
            names: Vec::new(),
            columns: Vec::new(),
            height,
        }
    }

    /// Build from named columns; all columns must share one length
    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self, SchemaError> {
        let height = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut table = Table::empty(height);

        for (name, column) in columns {
            if table.has_column(&name) {
                return Err(SchemaError::DuplicateColumn(name));
            }
            if column.len() != height {
                return Err(SchemaError::LengthMismatch {
                    name,
                    expected: height,
                    found: column.len(),
                });
            }
            table.names.push(name);
            table.columns.push(column);
        }

        Ok(table)
    }

    /// Build an all-text table from header names and string records.
    /// Short records are padded with nulls, long ones are cut to the header width.
    pub fn from_records<S: AsRef<str>>(headers: &[S], records: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(records.len()); width];

        for mut record in records.into_iter() {
            record.resize(width, None);
            for (idx, cell) in record.into_iter().enumerate() {
                cells[idx].push(cell);
            }
        }

        let height = cells.first().map(|c| c.len()).unwrap_or(0);
        Table {
            names: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            columns: cells.into_iter().map(Column::Text).collect(),
            height,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// No rows, or no columns
    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.columns[idx])
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column(name).map(|c| c.column_type())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(|n| n.as_str()).zip(self.columns.iter())
    }

    /// New table holding only `names`, in that order. Any absent name is a schema error.
    pub fn select(&self, names: &[&str]) -> Result<Table, SchemaError> {
        let missing = crate::schema::missing_columns(self, names);
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns(missing));
        }

        let mut selected = Table::empty(self.height);
        for name in names {
            if let Some(column) = self.column(name) {
                selected.put(name, column.clone());
            }
        }
        Ok(selected)
    }

    /// Add (or replace) a column; its length must match the table height
    pub fn with_column(mut self, name: &str, column: Column) -> Result<Table, SchemaError> {
        if !self.columns.is_empty() && column.len() != self.height {
            return Err(SchemaError::LengthMismatch {
                name: name.to_string(),
                expected: self.height,
                found: column.len(),
            });
        }
        if self.columns.is_empty() {
            self.height = column.len();
        }
        self.put(name, column);
        Ok(self)
    }

    /// Add (or replace) a text column holding `value` on every row
    pub fn with_constant(mut self, name: &str, value: &str) -> Table {
        let column = Column::Text(vec![Some(value.to_string()); self.height]);
        self.put(name, column);
        self
    }

    // Callers guarantee `column.len() == self.height`
    pub(crate) fn put(&mut self, name: &str, column: Column) {
        debug_assert_eq!(column.len(), self.height, "column '{}' height", name);
        match self.names.iter().position(|n| n == name) {
            Some(idx) => self.columns[idx] = column,
            None => {
                self.names.push(name.to_string());
                self.columns.push(column);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[&str]) -> Column {
        Column::Text(
            values
                .iter()
                .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                .collect(),
        )
    }

    #[test]
    fn test_from_records_pads_short_rows() {
        let table = Table::from_records(
            &["a", "b"],
            vec![
                vec![Some("1".to_string())],
                vec![Some("2".to_string()), Some("x".to_string()), Some("extra".to_string())],
            ],
        );

        assert_eq!(table.height(), 2);
        assert_eq!(table.width(), 2);
        assert_eq!(table.column("b"), Some(&text(&["", "x"])));
    }

    #[test]
    fn test_from_columns_rejects_ragged() {
        let result = Table::from_columns(vec![
            ("a".to_string(), text(&["1", "2"])),
            ("b".to_string(), text(&["1"])),
        ]);

        assert!(matches!(result, Err(SchemaError::LengthMismatch { .. })));
    }

    #[test]
    fn test_from_columns_rejects_duplicates() {
        let result = Table::from_columns(vec![
            ("a".to_string(), text(&["1"])),
            ("a".to_string(), text(&["2"])),
        ]);

        assert_eq!(result, Err(SchemaError::DuplicateColumn("a".to_string())));
    }

    #[test]
    fn test_coerce_text_to_number_is_strict() {
        let col = text(&["12.5", "1.234,56", "", "nan"]).coerce(ColumnType::Number);

        assert_eq!(col, Column::Number(vec![Some(12.5), None, None, None]));
    }

    #[test]
    fn test_coerce_text_to_date() {
        let col = text(&["2024-01-15", "garbage"]).coerce(ColumnType::Date);

        assert_eq!(
            col,
            Column::Date(vec![NaiveDate::from_ymd_opt(2024, 1, 15), None])
        );
    }

    #[test]
    fn test_coerce_number_to_date_is_null() {
        let col = Column::Number(vec![Some(1.0), None]).coerce(ColumnType::Date);

        assert_eq!(col, Column::Date(vec![None, None]));
    }

    #[test]
    fn test_coerce_to_text_renders_values() {
        let numbers = Column::Number(vec![Some(1234.56), Some(500.0), None]);
        let dates = Column::Date(vec![NaiveDate::from_ymd_opt(2024, 1, 5)]);

        assert_eq!(
            numbers.coerce(ColumnType::Text),
            Column::Text(vec![Some("1234.56".to_string()), Some("500".to_string()), None])
        );
        assert_eq!(
            dates.coerce(ColumnType::Text),
            Column::Text(vec![Some("2024-01-05".to_string())])
        );
    }

    #[test]
    fn test_append_coerces_other_side() {
        let mut col = Column::Number(vec![Some(1.0)]);
        col.append(text(&["2", "x"]));

        assert_eq!(col, Column::Number(vec![Some(1.0), Some(2.0), None]));
    }

    #[test]
    fn test_select_missing_is_schema_error() {
        let table = Table::from_columns(vec![("date".to_string(), text(&["2024-01-01"]))]).unwrap();

        assert_eq!(
            table.select(&["date", "amount"]),
            Err(SchemaError::MissingColumns(vec!["amount".to_string()]))
        );
    }

    #[test]
    fn test_with_constant_keeps_height() {
        let table = Table::empty(3).with_constant("source_file", "a.csv");

        assert_eq!(table.height(), 3);
        assert_eq!(table.column("source_file").map(|c| c.null_count()), Some(0));
    }

    #[test]
    fn test_with_column_replaces_existing() {
        let table = Table::from_columns(vec![("a".to_string(), text(&["1"]))])
            .unwrap()
            .with_column("a", Column::Number(vec![Some(1.0)]))
            .unwrap();

        assert_eq!(table.width(), 1);
        assert_eq!(table.column_type("a"), Some(ColumnType::Number));
    }

    #[test]
    fn test_empty_table() {
        assert!(Table::empty(0).is_empty());
        assert!(Table::empty(4).is_empty());
        assert_eq!(Table::empty(4).height(), 4);
    }
}
