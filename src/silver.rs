// 🥈 Silver - monthly partner aggregation over bronze

use crate::schema::{require_columns, SchemaError, AMOUNT, CANONICAL_COLUMNS, DATE, PARTNER};
use crate::table::ColumnType;
use crate::table::Table;
use crate::temporal::month_start;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One (month, partner) total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilverAggregate {
    /// First day of the month; null when the bronze date was null
    pub month: Option<NaiveDate>,
    pub partner: Option<String>,
    /// Null when every contributing amount was null
    pub amount: Option<f64>,
}

/// Sum that stays null until a non-null value shows up
pub(crate) fn add_nullable(acc: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (acc, value) {
        (Some(a), Some(b)) => Some(a + b),
        (None, Some(b)) => Some(b),
        (a, None) => a,
    }
}

/// Aggregate bronze `{date, partner, amount}` into monthly partner totals.
///
/// Null month and null partner are group keys of their own. Output is ordered
/// by month, then partner, with nulls first.
pub fn to_silver(bronze: &Table) -> Result<Vec<SilverAggregate>, SchemaError> {
    require_columns(bronze, &CANONICAL_COLUMNS)?;

    let coerced = |name: &str, kind: ColumnType| {
        bronze
            .column(name)
            .cloned()
            .map(|c| c.coerce(kind))
            .ok_or_else(|| SchemaError::MissingColumns(vec![name.to_string()]))
    };
    let dates = coerced(DATE, ColumnType::Date)?;
    let partners = coerced(PARTNER, ColumnType::Text)?;
    let amounts = coerced(AMOUNT, ColumnType::Number)?;

    let (Some(dates), Some(partners), Some(amounts)) =
        (dates.as_date(), partners.as_text(), amounts.as_number())
    else {
        unreachable!("coerce returns the requested column type");
    };

    let mut groups: BTreeMap<(Option<NaiveDate>, Option<String>), Option<f64>> = BTreeMap::new();
    for ((date, partner), amount) in dates.iter().zip(partners).zip(amounts) {
        let key = (date.map(month_start), partner.clone());
        let slot = groups.entry(key).or_insert(None);
        *slot = add_nullable(*slot, *amount);
    }

    debug!(rows = bronze.height(), groups = groups.len(), "aggregated silver");

    Ok(groups
        .into_iter()
        .map(|((month, partner), amount)| SilverAggregate {
            month,
            partner,
            amount,
        })
        .collect())
}

// ============================================================================
// TESTS
// ============================================================================
