// 📊 Run Report - KPIs over bronze/silver plus a JSON-able summary of one run

use crate::bronze::BronzeTable;
use crate::data_quality::Violation;
use crate::silver::{add_nullable, SilverAggregate};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

// ============================================================================
// KPIs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Sum of non-null silver amounts, 0 when there are none
    pub total_amount: f64,
    /// Distinct non-null partners in bronze
    pub partners: usize,
    /// Distinct non-null months in silver
    pub months: usize,
}

pub fn kpis(bronze: &BronzeTable, silver: &[SilverAggregate]) -> Kpis {
    let total_amount: f64 = silver.iter().filter_map(|s| s.amount).sum();

    let partners: BTreeSet<String> = bronze
        .records()
        .into_iter()
        .filter_map(|r| r.partner)
        .collect();

    let months: BTreeSet<NaiveDate> = silver.iter().filter_map(|s| s.month).collect();

    Kpis {
        total_amount,
        partners: partners.len(),
        months: months.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub month: Option<NaiveDate>,
    pub amount: Option<f64>,
}

/// Silver collapsed over partners, one entry per month (null month included)
pub fn monthly_totals(silver: &[SilverAggregate]) -> Vec<MonthlyTotal> {
    let mut by_month: BTreeMap<Option<NaiveDate>, Option<f64>> = BTreeMap::new();
    for row in silver {
        let slot = by_month.entry(row.month).or_insert(None);
        *slot = add_nullable(*slot, row.amount);
    }

    by_month
        .into_iter()
        .map(|(month, amount)| MonthlyTotal { month, amount })
        .collect()
}

// ============================================================================
// RUN REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub name: String,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: String,
    pub sources: Vec<SourceSummary>,
    pub bronze_rows: usize,
    pub violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silver_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kpis: Option<Kpis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub monthly_totals: Vec<MonthlyTotal>,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn summary(&self) -> String {
        match &self.kpis {
            Some(k) => format!(
                "{} sources, {} bronze rows → {} silver rows | total {:.2}, {} partners, {} months",
                self.sources.len(),
                self.bronze_rows,
                self.silver_rows.unwrap_or(0),
                k.total_amount,
                k.partners,
                k.months
            ),
            None => format!(
                "{} sources, {} bronze rows | {} violations, silver not derived",
                self.sources.len(),
                self.bronze_rows,
                self.violations.len()
            ),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize run report")
    }
}

// ============================================================================
// TESTS
// ============================================================================
