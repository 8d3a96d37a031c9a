// ✅ Data Quality - minimal checks on the canonical {date, partner, amount} table
// Pure reporting: returns violations, never raises for data problems.
// Whether to stop before aggregation is the caller's decision.

use crate::schema::{missing_columns, AMOUNT, CANONICAL_COLUMNS, DATE};
use crate::table::{Column, ColumnType, Table};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ============================================================================
// VIOLATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: String,
    pub field: String,
    pub message: String,
}

impl Violation {
    fn new(rule: &str, field: &str, message: String) -> Self {
        Violation {
            rule: rule.to_string(),
            field: field.to_string(),
            message,
        }
    }

    /// Reported by the run orchestrator when no source produced a row
    pub fn empty_dataset() -> Self {
        Violation::new("dataset_not_empty", "*", "dataset is empty".to_string())
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ============================================================================
// CHECKS
// ============================================================================

/// Run the checks in order:
/// 1. required columns present (stops here if not)
/// 2. `date` is date-typed, then has no nulls
/// 3. `amount` is numeric, then has no negative values
///
/// An empty result means the dataset passed.
pub fn basic_checks(table: &Table) -> Vec<Violation> {
    let mut violations = Vec::new();

    let missing = missing_columns(table, &CANONICAL_COLUMNS);
    if !missing.is_empty() {
        violations.push(Violation::new(
            "required_columns",
            &missing.join(","),
            format!("missing required columns: {}", missing.join(", ")),
        ));
        return violations;
    }

    if let Some(date) = table.column(DATE) {
        violations.extend(check_date(date));
    }
    if let Some(amount) = table.column(AMOUNT) {
        violations.extend(check_amount(amount));
    }

    debug!(rows = table.height(), violations = violations.len(), "basic checks done");
    violations
}

fn check_date(column: &Column) -> Option<Violation> {
    if column.column_type() != ColumnType::Date {
        return Some(Violation::new(
            "date_type",
            DATE,
            format!("column 'date' is not a date column (found {})", column.column_type().name()),
        ));
    }

    let nulls = column.null_count();
    (nulls > 0).then(|| {
        Violation::new(
            "date_not_null",
            DATE,
            format!("column 'date' has {} null or unparseable values", nulls),
        )
    })
}

fn check_amount(column: &Column) -> Option<Violation> {
    let Some(values) = column.as_number() else {
        return Some(Violation::new(
            "amount_type",
            AMOUNT,
            format!("column 'amount' is not numeric (found {})", column.column_type().name()),
        ));
    };

    let negatives = values.iter().flatten().filter(|v| **v < 0.0).count();
    (negatives > 0).then(|| {
        Violation::new(
            "amount_non_negative",
            AMOUNT,
            format!("column 'amount' has {} negative values", negatives),
        )
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PARTNER;
    use chrono::NaiveDate;

    fn canonical(dates: Vec<Option<NaiveDate>>, amounts: Vec<Option<f64>>) -> Table {
        let partners = vec![Some("ACME".to_string()); dates.len()];
        Table::from_columns(vec![
            (DATE.to_string(), Column::Date(dates)),
            (PARTNER.to_string(), Column::Text(partners)),
            (AMOUNT.to_string(), Column::Number(amounts)),
        ])
        .unwrap()
    }

    fn jan(day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, day)
    }

    #[test]
    fn test_valid_table_has_no_violations() {
        let table = canonical(vec![jan(1), jan(2)], vec![Some(10.0), None]);

        assert!(basic_checks(&table).is_empty());
    }

    #[test]
    fn test_missing_amount_is_single_violation() {
        let table = canonical(vec![jan(1)], vec![Some(1.0)]).select(&[DATE, PARTNER]).unwrap();

        let violations = basic_checks(&table);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, "required_columns");
        assert!(violations[0].message.contains("amount"));
        assert!(!violations[0].message.contains("date"));
    }

    #[test]
    fn test_missing_columns_short_circuits() {
        let violations = basic_checks(&Table::empty(0));

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].to_string(), "missing required columns: date, partner, amount");
    }

    #[test]
    fn test_negative_amount_is_single_violation() {
        let table = canonical(vec![jan(1), jan(2)], vec![Some(-5.0), Some(3.0)]);

        let violations = basic_checks(&table);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, "amount_non_negative");
    }

    #[test]
    fn test_null_date_reported() {
        let table = canonical(vec![jan(1), None], vec![Some(1.0), Some(2.0)]);

        let violations = basic_checks(&table);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, "date_not_null");
    }

    #[test]
    fn test_wrong_types_reported() {
        let table = Table::from_records(
            &["date", "partner", "amount"],
            vec![vec![Some("2024-01-01".to_string()), None, Some("5".to_string())]],
        );

        let rules: Vec<_> = basic_checks(&table).into_iter().map(|v| v.rule).collect();

        assert_eq!(rules, vec!["date_type", "amount_type"]);
    }

    #[test]
    fn test_date_and_amount_issues_both_reported_in_order() {
        let table = canonical(vec![None], vec![Some(-1.0)]);

        let rules: Vec<_> = basic_checks(&table).into_iter().map(|v| v.rule).collect();

        assert_eq!(rules, vec!["date_not_null", "amount_non_negative"]);
    }

    #[test]
    fn test_empty_dataset_violation() {
        assert_eq!(Violation::empty_dataset().to_string(), "dataset is empty");
    }
}
