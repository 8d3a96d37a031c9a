// ⚙️ Run Configuration
// Optional TOML file: default column mapping, per-source overrides, output locations.
//
// [mapping]
// date = "Fecha"
// partner = "Cliente"
// amount = "Importe"
//
// [sources."us_export.csv"]
// date = "date"
//
// [output]
// dir = "out"

use crate::normalize::{CanonicalField, ColumnMapping};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "partner-ledger.toml";

/// Source column names per role. `None` inherits; an empty string omits the role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub date: Option<String>,
    pub partner: Option<String>,
    pub amount: Option<String>,
}

impl MappingConfig {
    /// Fill unset roles from `base`
    pub fn over(&self, base: &MappingConfig) -> MappingConfig {
        MappingConfig {
            date: self.date.clone().or_else(|| base.date.clone()),
            partner: self.partner.clone().or_else(|| base.partner.clone()),
            amount: self.amount.clone().or_else(|| base.amount.clone()),
        }
    }

    /// Resolve into a mapping; roles still unset fall back to their canonical name
    pub fn to_mapping(&self) -> ColumnMapping {
        build_mapping(
            self.date.as_deref().unwrap_or("date"),
            self.partner.as_deref().unwrap_or("partner"),
            self.amount.as_deref().unwrap_or("amount"),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub bronze_file: String,
    pub silver_file: String,
    pub report_file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: PathBuf::from("out"),
            bronze_file: "bronze.csv".to_string(),
            silver_file: "silver.csv".to_string(),
            report_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Force a delimiter instead of sniffing it
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mapping: MappingConfig,
    pub sources: BTreeMap<String, MappingConfig>,
    pub input: InputConfig,
    pub output: OutputConfig,
    /// Column names given on the command line; layered over every source
    #[serde(skip)]
    pub flags: MappingConfig,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Config> {
        toml::from_str(text).context("Failed to parse configuration")
    }

    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Command-line column names; they win over `[mapping]` and `[sources]`
    pub fn with_flags(mut self, flags: MappingConfig) -> Self {
        self.flags = flags;
        self
    }

    /// Mapping for one source: flags, then its `[sources]` entry, then `[mapping]`
    pub fn mapping_for(&self, source_name: &str) -> ColumnMapping {
        let file = match self.sources.get(source_name) {
            Some(overrides) => overrides.over(&self.mapping),
            None => self.mapping.clone(),
        };
        self.flags.over(&file).to_mapping()
    }

    /// Single-byte delimiter, if one was configured
    pub fn delimiter(&self) -> Result<Option<u8>> {
        self.input
            .delimiter
            .map(|c| u8::try_from(c).with_context(|| format!("Delimiter {:?} is not a single byte", c)))
            .transpose()
    }
}

/// Mapping from the three source column names; blank names omit the role
pub fn build_mapping(date: &str, partner: &str, amount: &str) -> ColumnMapping {
    [
        (date, CanonicalField::Date),
        (partner, CanonicalField::Partner),
        (amount, CanonicalField::Amount),
    ]
    .into_iter()
    .map(|(name, field)| (name.trim(), field))
    .filter(|(name, _)| !name.is_empty())
    .fold(ColumnMapping::new(), |m, (name, field)| m.with(name, field))
}

// ============================================================================
// TESTS
// ============================================================================
