// 🏗️ Source Reader - raw CSV files → all-text Tables
// Column names and cell types are unknown here; normalization assigns meaning later.

use crate::table::Table;
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

// ============================================================================
// CORE TYPES
// ============================================================================

/// How the raw bytes were decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceEncoding {
    Utf8,
    Latin1,
}

impl SourceEncoding {
    pub fn name(&self) -> &str {
        match self {
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::Latin1 => "latin-1",
        }
    }
}

/// RawSource - one uploaded file, read but not yet interpreted
#[derive(Debug, Clone)]
pub struct RawSource {
    pub name: String,      // Lineage identifier (file name)
    pub table: Table,      // All-text columns, header names as found
    pub encoding: SourceEncoding,
    pub delimiter: u8,
    pub sha256: String,    // Digest of the raw bytes
}

// ============================================================================
// DECODING
// ============================================================================

/// UTF-8 first, Latin-1 when the bytes are not valid UTF-8. A UTF-8 BOM is dropped.
pub fn decode(bytes: &[u8]) -> (String, SourceEncoding) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (
            text.strip_prefix('\u{feff}').unwrap_or(text).to_string(),
            SourceEncoding::Utf8,
        ),
        Err(_) => (
            bytes.iter().map(|&b| char::from(b)).collect(),
            SourceEncoding::Latin1,
        ),
    }
}

/// Pick `,` `;` or tab by frequency in the header line (ties go to `,`)
pub fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    [b',', b';', b'\t']
        .into_iter()
        .map(|d| (header.bytes().filter(|&b| b == d).count(), d))
        .fold((0, b','), |best, cur| if cur.0 > best.0 { cur } else { best })
        .1
}

/// File name of `path`, used as the source identifier
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.csv")
        .to_string()
}

// Repeated header names get `.1`, `.2`, ... suffixes so every column stays addressable
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    headers
        .into_iter()
        .map(|h| {
            let mut candidate = h.clone();
            let mut n = 1;
            while seen.contains(&candidate) {
                candidate = format!("{}.{}", h, n);
                n += 1;
            }
            seen.insert(candidate.clone());
            candidate
        })
        .collect()
}

// ============================================================================
// READER
// ============================================================================

/// CSV reader for user-supplied sources
#[derive(Debug, Clone, Default)]
pub struct CsvSourceReader {
    delimiter: Option<u8>,
}

impl CsvSourceReader {
    pub fn new() -> Self {
        CsvSourceReader { delimiter: None }
    }

    /// Builder pattern: force a delimiter instead of sniffing
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Read and parse one file from disk
    pub fn read(&self, path: &Path) -> Result<RawSource> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        self.parse(&source_name(path), &bytes)
    }

    /// Parse raw bytes already in memory
    pub fn parse(&self, name: &str, bytes: &[u8]) -> Result<RawSource> {
        let sha256 = format!("{:x}", Sha256::digest(bytes));
        let (text, encoding) = decode(bytes);
        if encoding == SourceEncoding::Latin1 {
            warn!(source = name, "not valid UTF-8, decoded as latin-1");
        }

        let delimiter = self.delimiter.unwrap_or_else(|| sniff_delimiter(&text));
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Failed to read CSV header in {}", name))?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let headers = dedupe_headers(headers);

        let mut records = Vec::new();
        for (line_num, result) in reader.records().enumerate() {
            let record = result.with_context(|| {
                format!("Failed to parse CSV line {} in {}", line_num + 2, name)
            })?;

            if record.len() > headers.len() {
                warn!(
                    source = name,
                    line = line_num + 2,
                    extra = record.len() - headers.len(),
                    "record wider than header, extra cells dropped"
                );
            }

            let cells = record
                .iter()
                .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
                .collect();
            records.push(cells);
        }

        let table = Table::from_records(&headers, records);
        debug!(
            source = name,
            rows = table.height(),
            columns = table.width(),
            delimiter = %(delimiter as char).escape_default(),
            encoding = encoding.name(),
            "read source"
        );

        Ok(RawSource {
            name: name.to_string(),
            table,
            encoding,
            delimiter,
            sha256,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    #[test]
    fn test_decode_utf8_strips_bom() {
        let (text, enc) = decode("\u{feff}Fecha,Cliente".as_bytes());

        assert_eq!(text, "Fecha,Cliente");
        assert_eq!(enc, SourceEncoding::Utf8);
    }

    #[test]
    fn test_decode_falls_back_to_latin1() {
        // "Año" in latin-1
        let (text, enc) = decode(&[b'A', 0xF1, b'o']);

        assert_eq!(text, "Año");
        assert_eq!(enc, SourceEncoding::Latin1);
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3"), b',');
        assert_eq!(sniff_delimiter("Fecha;Cliente;Importe\n15/01/2024;ACME;1.234,56"), b';');
        assert_eq!(sniff_delimiter("a\tb\n"), b'\t');
        assert_eq!(sniff_delimiter("single"), b',');
    }

    #[test]
    fn test_parse_european_semicolon_file() {
        let csv = "Fecha;Cliente;Importe\n15/01/2024;ACME;1.234,56\n16/01/2024;;\n";

        let source = CsvSourceReader::new().parse("ventas.csv", csv.as_bytes()).unwrap();

        assert_eq!(source.name, "ventas.csv");
        assert_eq!(source.delimiter, b';');
        assert_eq!(source.table.height(), 2);
        assert_eq!(
            source.table.column("Importe"),
            Some(&Column::Text(vec![Some("1.234,56".to_string()), None]))
        );
        assert_eq!(source.sha256.len(), 64);
    }

    #[test]
    fn test_parse_ragged_rows() {
        let csv = "a,b\n1\n2,3,4\n";

        let source = CsvSourceReader::new().parse("ragged.csv", csv.as_bytes()).unwrap();

        assert_eq!(source.table.height(), 2);
        assert_eq!(
            source.table.column("b"),
            Some(&Column::Text(vec![None, Some("3".to_string())]))
        );
    }

    #[test]
    fn test_duplicate_headers_renamed() {
        assert_eq!(
            dedupe_headers(vec!["a".into(), "a".into(), "b".into(), "a".into()]),
            vec!["a", "a.1", "b", "a.2"]
        );
    }

    #[test]
    fn test_forced_delimiter() {
        let csv = "a;b|c\n1;2|3\n";

        let source = CsvSourceReader::new()
            .with_delimiter(b'|')
            .parse("pipe.csv", csv.as_bytes())
            .unwrap();

        assert_eq!(source.table.names().collect::<Vec<_>>(), vec!["a;b", "c"]);
    }

    #[test]
    fn test_source_name() {
        assert_eq!(source_name(Path::new("/tmp/uploads/ventas.csv")), "ventas.csv");
    }
}
