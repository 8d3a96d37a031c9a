// 💶 Amount Parser
// Turns raw amount text (currency-annotated, either decimal convention) into f64 or null.
// Never fails: anything unparseable is None.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

static CURRENCY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)€|eur").expect("currency token regex is valid"));

// ============================================================================
// SEPARATOR STYLE
// ============================================================================

/// Which separator branch a cleaned amount falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeparatorStyle {
    /// Both `.` and `,` present: `.` groups thousands, `,` is the decimal point
    European,
    /// Only `,` present: treated as a decimal point (`"1,234"` → 1.234)
    DecimalComma,
    /// No comma: already dot-decimal or integer
    Plain,
}

impl SeparatorStyle {
    pub fn detect(cleaned: &str) -> Self {
        let has_dot = cleaned.contains('.');
        let has_comma = cleaned.contains(',');
        match (has_dot, has_comma) {
            (true, true) => SeparatorStyle::European,
            (false, true) => SeparatorStyle::DecimalComma,
            _ => SeparatorStyle::Plain,
        }
    }

    /// Rewrite `cleaned` into dot-decimal form
    pub fn apply(&self, cleaned: &str) -> String {
        match self {
            SeparatorStyle::European => cleaned.replace('.', "").replace(',', "."),
            SeparatorStyle::DecimalComma => cleaned.replace(',', "."),
            SeparatorStyle::Plain => cleaned.to_string(),
        }
    }
}

// ============================================================================
// PARSING
// ============================================================================

/// Strip whitespace (incl. non-breaking) and the currency markers `€` / `EUR`
fn strip_decorations(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    CURRENCY_TOKEN.replace_all(&compact, "").into_owned()
}

/// Parse one raw amount.
///
/// ```text
/// "1.234,56 €" → Some(1234.56)   European
/// "1234,56"    → Some(1234.56)   DecimalComma
/// "1'234.56"   → Some(1234.56)   Plain, apostrophes dropped
/// "1.234"      → Some(1.234)     Plain
/// "nan"        → None
/// ```
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned = strip_decorations(raw);
    let style = SeparatorStyle::detect(&cleaned);
    let normalized = style.apply(&cleaned).replace('\'', "");

    if normalized.is_empty() || normalized == "nan" || normalized == "None" {
        return None;
    }

    let parsed = normalized.parse::<f64>().ok().filter(|n| !n.is_nan());
    trace!(raw, ?style, normalized = %normalized, ?parsed, "amount parsed");
    parsed
}

/// Parse a column of amounts; output has the same length and order.
/// Null cells stay null.
pub fn parse_amounts<I, S>(values: I) -> Vec<Option<f64>>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|cell| cell.and_then(|raw| parse_amount(raw.as_ref())))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_european_branch() {
        assert_eq!(SeparatorStyle::detect("1.234,56"), SeparatorStyle::European);
        assert_eq!(parse_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("1.234.567,89"), Some(1234567.89));
    }

    #[test]
    fn test_decimal_comma_branch() {
        assert_eq!(SeparatorStyle::detect("1234,56"), SeparatorStyle::DecimalComma);
        assert_eq!(parse_amount("1234,56"), Some(1234.56));
    }

    #[test]
    fn test_decimal_comma_branch_misreads_english_thousands() {
        // Known ambiguity: an English thousands comma is read as a decimal comma
        assert_eq!(parse_amount("1,234"), Some(1.234));
    }

    #[test]
    fn test_plain_branch() {
        assert_eq!(SeparatorStyle::detect("1234.56"), SeparatorStyle::Plain);
        assert_eq!(parse_amount("1234.56"), Some(1234.56));
        assert_eq!(parse_amount("42"), Some(42.0));
        assert_eq!(parse_amount("-5"), Some(-5.0));
    }

    #[test]
    fn test_plain_branch_keeps_single_dot_as_decimal() {
        assert_eq!(SeparatorStyle::detect("1.234"), SeparatorStyle::Plain);
        assert_eq!(parse_amount("1.234"), Some(1.234));
    }

    #[test]
    fn test_apostrophe_thousands() {
        assert_eq!(parse_amount("1'234.56"), Some(1234.56));
    }

    #[test]
    fn test_currency_and_whitespace_stripped() {
        assert_eq!(parse_amount("1.234,56 €"), Some(1234.56));
        assert_eq!(parse_amount("EUR 500.00"), Some(500.0));
        assert_eq!(parse_amount("500,5eur"), Some(500.5));
        assert_eq!(parse_amount("1\u{a0}234,56"), Some(1234.56));
        assert_eq!(parse_amount("  12 345 "), Some(12345.0));
    }

    #[test]
    fn test_null_tokens() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("nan"), None);
        assert_eq!(parse_amount("None"), None);
        assert_eq!(parse_amount("€"), None);
    }

    #[test]
    fn test_unparseable_is_none() {
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("12abc"), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_parse_amounts_preserves_shape() {
        let parsed = parse_amounts(vec![Some("1.234,56"), None, Some("x"), Some("7")]);

        assert_eq!(parsed, vec![Some(1234.56), None, None, Some(7.0)]);
    }
}
