//! Header field extraction.
//!
//! The archive's headers are scraped with line-anchored patterns rather than a
//! full RFC 5322 parser. Each field is only reported when its pattern matches
//! exactly once in the header block; zero or several matches mean "absent".

use std::sync::LazyLock;

use regex::Regex;

/// Pulls the fields the harvester stores out of a raw header block.
pub trait HeaderExtractor: Send + Sync {
    /// Sender address, normalized to lowercase.
    fn email(&self, headers: &str) -> Option<String>;

    /// Raw `Date:` value, not yet parsed.
    fn date_value(&self, headers: &str) -> Option<String>;

    /// Subject line, normalized to lowercase.
    fn subject(&self, headers: &str) -> Option<String>;
}

static FROM_WITH_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^From: .* <(\S+@\S+)>\r?$").expect("valid regex"));
static FROM_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^From: (\S+@\S+)\r?$").expect("valid regex"));
// Greedy prefix: the captured value starts after the last ", " on the line.
static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Date: .*, (.*)$").expect("valid regex"));
static SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Subject: (.*)$").expect("valid regex"));

/// Extractor for the mbox-style pages served by the sequential archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct MboxArchiveExtractor;

impl MboxArchiveExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl HeaderExtractor for MboxArchiveExtractor {
    fn email(&self, headers: &str) -> Option<String> {
        single_capture(&FROM_WITH_NAME, headers)
            .or_else(|| single_capture(&FROM_BARE, headers))
            .map(normalize_email)
    }

    fn date_value(&self, headers: &str) -> Option<String> {
        single_capture(&DATE, headers).map(|v| v.trim_end_matches('\r').to_string())
    }

    fn subject(&self, headers: &str) -> Option<String> {
        single_capture(&SUBJECT, headers).map(|s| s.trim().to_lowercase())
    }
}

/// Return the first capture group if the pattern matches exactly once.
fn single_capture<'a>(pattern: &Regex, haystack: &'a str) -> Option<&'a str> {
    let mut matches = pattern
        .captures_iter(haystack)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()));

    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(first)
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase().replace('<', "")
}
