use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::FinplanError;

// ── MonthKey ──────────────────────────────────────────────────────────────────

/// A calendar month, rendered canonically as `YYYY-MM`.
///
/// Years are restricted to four digits so that the string form stays
/// zero-padded and lexicographic order matches chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub const MIN_YEAR: i32 = 1000;
    pub const MAX_YEAR: i32 = 9999;

    /// Build a key from a year and a 1-based month, or `None` when either is
    /// out of range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) || !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { year, month })
    }

    /// Key for the month containing `date`.
    pub fn from_date<D: Datelike>(date: &D) -> Option<Self> {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month `offset` months after this one, carrying into the year.
    ///
    /// `2025-11 + 2` is `2026-01`. Returns `None` past year 9999.
    pub fn add_months(&self, offset: u32) -> Option<Self> {
        let index = i64::from(self.year) * 12 + i64::from(self.month - 1) + i64::from(offset);
        let year = i32::try_from(index.div_euclid(12)).ok()?;
        let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
        Self::new(year, month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = FinplanError;

    /// Strict parse of the canonical `YYYY-MM` form only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        year_month_exact()
            .captures(s)
            .and_then(|caps| key_from_captures(&caps))
            .ok_or_else(|| FinplanError::InvalidMonthKey(s.to_string()))
    }
}

impl TryFrom<String> for MonthKey {
    type Error = FinplanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

// ── Patterns ──────────────────────────────────────────────────────────────────

fn iso_date_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})-\d{2}").expect("regex is valid"))
}

fn year_month_exact() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})$").expect("regex is valid"))
}

fn year_month_anywhere() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})-(\d{2})").expect("regex is valid"))
}

fn key_from_captures(caps: &regex::Captures<'_>) -> Option<MonthKey> {
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    MonthKey::new(year, month)
}

// ── Normalization ─────────────────────────────────────────────────────────────

/// Full-date layouts tried by the generic fallback, in order.
const DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y.%m.%d",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Year-month layouts; parsed by pinning the day to the 1st.
const YEAR_MONTH_FORMATS: &[&str] = &["%Y-%m", "%Y/%m", "%m/%Y", "%m-%Y", "%B %Y", "%b %Y"];

/// Canonicalise a date-like string into a [`MonthKey`].
///
/// Priority:
/// 1. `YYYY-MM-DD…` (any ISO date or timestamp) is truncated to its month.
/// 2. `YYYY-MM` is taken as-is.
/// 3. Generic parsing: RFC 3339, RFC 2822, then common date layouts.
///
/// Anything else yields `None`; callers skip the record.
pub fn normalize_month_str(raw: &str) -> Option<MonthKey> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = iso_date_prefix().captures(s) {
        if let Some(key) = key_from_captures(&caps) {
            return Some(key);
        }
    }

    if let Some(caps) = year_month_exact().captures(s) {
        if let Some(key) = key_from_captures(&caps) {
            return Some(key);
        }
    }

    let parsed = parse_generic(s);
    if parsed.is_none() {
        debug!("normalize_month_str: unparseable month \"{}\"", s);
    }
    parsed
}

fn parse_generic(s: &str) -> Option<MonthKey> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return MonthKey::from_date(&dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return MonthKey::from_date(&dt);
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return MonthKey::from_date(&date);
        }
    }

    let pinned = format!("{} 01", s);
    for fmt in YEAR_MONTH_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&pinned, &format!("{} %d", fmt)) {
            return MonthKey::from_date(&date);
        }
    }

    None
}

/// Canonicalise any JSON date-like value into a [`MonthKey`].
///
/// Handles:
/// * JSON string → [`normalize_month_str`].
/// * JSON number → a six-digit `YYYYMM` integer, or a Unix timestamp of at
///   least 10^9 (magnitudes above 10^11 are read as milliseconds).
///   Small numbers such as a bare month index are ambiguous and yield `None`.
/// * JSON object with numeric `year` and `month` members.
///
/// `null`, booleans, arrays and non-finite numbers yield `None`.
pub fn normalize_month_key(value: &Value) -> Option<MonthKey> {
    match value {
        Value::String(s) => normalize_month_str(s),
        Value::Number(n) => {
            let raw = n.as_f64().filter(|f| f.is_finite())?;
            if (100_001.0..=999_912.0).contains(&raw) && raw.fract() == 0.0 {
                let code = raw as u32;
                return MonthKey::new((code / 100) as i32, code % 100);
            }
            if raw < 1e9 {
                return None;
            }
            let secs = if raw > 1e11 { raw / 1000.0 } else { raw };
            let dt = DateTime::from_timestamp(secs.trunc() as i64, 0)?;
            MonthKey::from_date(&dt)
        }
        Value::Object(map) => {
            let year = map.get("year").and_then(Value::as_i64)?;
            let month = map.get("month").and_then(Value::as_u64)?;
            MonthKey::new(i32::try_from(year).ok()?, u32::try_from(month).ok()?)
        }
        _ => None,
    }
}

/// Find the first valid `YYYY-MM` run embedded anywhere in `s`.
///
/// Used for composite keys such as `ALLOCATION#2025-03#MOD-ING`.
pub fn find_month_key(s: &str) -> Option<MonthKey> {
    year_month_anywhere()
        .captures_iter(s)
        .find_map(|caps| key_from_captures(&caps))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
