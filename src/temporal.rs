// ⏰ Temporal Model
// Two kinds of time flow through a run:
// 1. Business time: the `date` cell of a transaction (calendar date, no timezone)
// 2. Ingestion time: when a source was tagged (UTC instant from a Clock)

use chrono::{DateTime, Datelike, Days, Month, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

// ============================================================================
// CLOCK
// ============================================================================

/// Source of "now". Lineage tagging is the only consumer.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant (tests, replays)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// ISO-8601 rendering used for `ingested_at`, e.g. `2024-01-20T10:30:00.000000+00:00`
pub fn iso_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, false)
}

// ============================================================================
// BUSINESS DATES
// ============================================================================

/// First calendar day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const ZONED_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

/// Best-effort, format-agnostic calendar date parse.
///
/// Offsets are dropped keeping the local wall-clock date, and any time of day
/// is discarded. All-numeric dates with the year last are read month-first,
/// falling back to day-first when the month would be invalid. Month-only
/// values (`Jan 2024`, `2024-01`) resolve to the first of the month.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() || is_null_token(s) {
        return None;
    }

    if let Ok(zoned) = DateTime::parse_from_rfc3339(s) {
        return Some(zoned.naive_local().date());
    }
    for fmt in ZONED_FORMATS {
        if let Ok(zoned) = DateTime::parse_from_str(s, fmt) {
            return Some(zoned.naive_local().date());
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.date());
        }
    }
    if let Some(named) = parse_named_month_date(s) {
        return named;
    }

    // "15/01/2024 10:30" → date part only
    let head = s.split_whitespace().next().unwrap_or(s);
    parse_numeric_date(head)
}

fn is_null_token(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "nan" | "nat" | "none" | "null")
}

/// `15 Jan 2024`, `Jan 15, 2024`, `15-Jan-24`, `March 2024`.
///
/// `None` when `s` has no month name; `Some(None)` when it has one but the
/// rest does not make a valid date.
fn parse_named_month_date(s: &str) -> Option<Option<NaiveDate>> {
    let tokens: Vec<&str> = s
        .split(|c: char| c.is_whitespace() || c == ',' || c == '-' || c == '/' || c == '.')
        .filter(|t| !t.is_empty())
        .collect();

    let (pos, month) = tokens
        .iter()
        .enumerate()
        .find_map(|(i, t)| month_from_name(t).map(|m| (i, m)))?;

    let (day, year) = match (pos, tokens.len()) {
        (0, 2) => ("1", tokens[1]),
        (0, 3) => (tokens[1], tokens[2]),
        (1, 3) => (tokens[0], tokens[2]),
        _ => return Some(None),
    };

    if day.is_empty() || day.len() > 2 || !day.bytes().all(|b| b.is_ascii_digit()) {
        return Some(None);
    }
    Some(year_from_token(year).and_then(|y| NaiveDate::from_ymd_opt(y, month, day.parse().ok()?)))
}

// Full or 3-letter English month name, any case
fn month_from_name(token: &str) -> Option<u32> {
    token
        .parse::<Month>()
        .ok()
        .map(|m| m.number_from_month())
}

// Only 4-digit years are taken as-is; 2-digit years are expanded
fn year_from_token(token: &str) -> Option<i32> {
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match token.len() {
        4 => token.parse().ok(),
        2 => token.parse().ok().map(expand_two_digit_year),
        _ => None,
    }
}

fn parse_numeric_date(s: &str) -> Option<NaiveDate> {
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(s, "%Y%m%d").ok();
    }

    let parts: Vec<&str> = s.split(['/', '-', '.']).collect();
    if parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let nums: Vec<u32> = parts.iter().filter_map(|p| p.parse().ok()).collect();
    if nums.len() != parts.len() {
        return None;
    }

    match parts.len() {
        // Year-month: 2024-01 → first of the month
        2 if parts[0].len() == 4 && parts[1].len() <= 2 => {
            return NaiveDate::from_ymd_opt(nums[0] as i32, nums[1], 1);
        }
        3 => {}
        _ => return None,
    }

    // Year first: 2024-01-15, 2024/01/15, 2024.01.15
    if parts[0].len() == 4 {
        return NaiveDate::from_ymd_opt(nums[0] as i32, nums[1], nums[2]);
    }

    let year = year_from_token(parts[2])?;

    NaiveDate::from_ymd_opt(year, nums[0], nums[1])
        .or_else(|| NaiveDate::from_ymd_opt(year, nums[1], nums[0]))
}

// 00-68 → 20xx, 69-99 → 19xx
fn expand_two_digit_year(yy: u32) -> i32 {
    if yy < 69 {
        2000 + yy as i32
    } else {
        1900 + yy as i32
    }
}

// ============================================================================
// TESTS
// ============================================================================
