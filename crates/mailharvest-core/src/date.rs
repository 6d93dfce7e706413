//! Mail date parsing as an ordered chain of strategies.
//!
//! Archived mail spans many years of clients, and the `Date:` headers are
//! not consistently formatted. A value is handed to each strategy in turn and
//! the first one that produces a timestamp wins.

use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::{Error, Result};

/// Characters of the `Date:` value kept before parsing. Drops trailing
/// timezone-name annotations such as `(EST)` on typical headers.
pub const DATE_VALUE_MAX_CHARS: usize = 26;

/// A numeric zone cut short by truncation, e.g. `-05` or `-050` from `-0500`.
static CUT_ZONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s([+-])(\d{0,3})$").expect("valid regex"));

/// One way of turning a mail date string into a timestamp.
pub trait DateStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn parse(&self, value: &str) -> Option<DateTime<FixedOffset>>;
}

/// Strict RFC 2822 (`5 Jan 2008 09:12:18 -0500`, weekday optional).
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc2822Strategy;

impl DateStrategy for Rfc2822Strategy {
    fn name(&self) -> &'static str {
        "rfc2822"
    }

    fn parse(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc2822(value).ok()
    }
}

/// A fixed list of `strftime` layouts seen in the archive.
///
/// Layouts without a zone are read as UTC.
#[derive(Debug, Clone)]
pub struct FormatListStrategy {
    zoned: Vec<&'static str>,
    naive: Vec<&'static str>,
}

impl Default for FormatListStrategy {
    fn default() -> Self {
        Self {
            zoned: vec![
                "%d %b %Y %H:%M:%S %z",
                "%d %B %Y %H:%M:%S %z",
                "%d %b %Y %H:%M %z",
                "%d %b %y %H:%M:%S %z",
                "%Y-%m-%d %H:%M:%S %z",
            ],
            naive: vec!["%d %b %Y %H:%M:%S", "%d %b %Y %H:%M", "%Y-%m-%d %H:%M:%S"],
        }
    }
}

impl DateStrategy for FormatListStrategy {
    fn name(&self) -> &'static str {
        "format-list"
    }

    fn parse(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        self.zoned
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
            .or_else(|| {
                self.naive.iter().find_map(|fmt| {
                    NaiveDateTime::parse_from_str(value, fmt)
                        .ok()
                        .map(|naive| naive.and_utc().fixed_offset())
                })
            })
    }
}

/// Token-based lenient parser from `mailparse`. Produces UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientMailDateStrategy;

impl DateStrategy for LenientMailDateStrategy {
    fn name(&self) -> &'static str {
        "lenient"
    }

    fn parse(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        if !value.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        // Anything at or before the epoch means the tokens were not placed.
        let ts = mailparse::dateparse(value).ok().filter(|ts| *ts > 0)?;
        DateTime::<Utc>::from_timestamp(ts, 0).map(|dt| dt.fixed_offset())
    }
}

/// Ordered list of date strategies.
pub struct DateParserChain {
    strategies: Vec<Box<dyn DateStrategy>>,
}

impl Default for DateParserChain {
    fn default() -> Self {
        Self::new()
            .with(Rfc2822Strategy)
            .with(FormatListStrategy::default())
            .with(LenientMailDateStrategy)
    }
}

impl DateParserChain {
    /// An empty chain. Fails every value until strategies are added.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    pub fn with(mut self, strategy: impl DateStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Truncate a raw `Date:` value and parse it with the first strategy that accepts it.
    pub fn parse(&self, raw: &str) -> Result<DateTime<FixedOffset>> {
        let truncated = truncate_date_value(raw);
        let candidate = repair_cut_zone(strip_comment(truncated));

        for strategy in &self.strategies {
            if let Some(parsed) = strategy.parse(&candidate) {
                tracing::trace!(strategy = strategy.name(), value = %candidate, "Parsed date");
                return Ok(parsed);
            }
        }

        Err(Error::UnparseableDate(truncated.to_string()))
    }
}

/// Keep the first [`DATE_VALUE_MAX_CHARS`] characters of a date value.
pub fn truncate_date_value(raw: &str) -> &str {
    match raw.char_indices().nth(DATE_VALUE_MAX_CHARS) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}

/// Drop a (possibly cut-off) parenthesized zone name and surrounding whitespace.
fn strip_comment(value: &str) -> &str {
    match value.find('(') {
        Some(pos) => value[..pos].trim(),
        None => value.trim(),
    }
}

/// Complete a numeric zone that truncation cut short.
///
/// `±HH` becomes `±HH00`. `±HHM` keeps the hours and maps the minute tens
/// digit to the only offsets in use (`:00`, `:30`, `:45`). Anything shorter,
/// or an unknown minute digit, drops the zone so the value reads as naive UTC.
pub fn repair_cut_zone(value: &str) -> Cow<'_, str> {
    let Some(caps) = CUT_ZONE.captures(value) else {
        return Cow::Borrowed(value);
    };
    let (Some(whole), Some(sign), Some(digits)) = (caps.get(0), caps.get(1), caps.get(2)) else {
        return Cow::Borrowed(value);
    };

    let prefix = value[..whole.start()].trim_end();
    let digits = digits.as_str();
    let minutes = match digits.len() {
        2 => Some("00"),
        3 => match &digits[2..] {
            "0" => Some("00"),
            "3" => Some("30"),
            "4" => Some("45"),
            _ => None,
        },
        _ => None,
    };

    match minutes {
        Some(minutes) => Cow::Owned(format!(
            "{} {}{}{}",
            prefix,
            sign.as_str(),
            &digits[..2],
            minutes
        )),
        None => Cow::Borrowed(prefix),
    }
}
