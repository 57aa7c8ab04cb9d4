use crate::formats::{Layout, Zone, CATALOG};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("unrecognized timestamp: {0:?}")]
    NotRecognized(String),
    #[error("{candidate:?} does not match layout {layout:?}")]
    LayoutMismatch { layout: &'static str, candidate: String },
}

/// A successful parse together with the catalog entry that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recognized {
    pub timestamp: DateTime<Utc>,
    pub layout: &'static Layout,
}

// Year given to year-less layouts (syslog style stamps).
static ASSUMED_YEAR: Lazy<i32> = Lazy::new(|| Utc::now().year());

static RE_ZONE_ABBREV: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3,5}$").unwrap());

/// Tries every catalog layout in priority order and returns the first that accepts `candidate`.
pub fn recognize(candidate: &str) -> Result<Recognized, TimestampError> {
    recognize_with_year(candidate, *ASSUMED_YEAR)
}

pub fn recognize_with_year(candidate: &str, year: i32) -> Result<Recognized, TimestampError> {
    if !candidate.bytes().any(|b| b.is_ascii_digit()) {
        return Err(TimestampError::NotRecognized(candidate.to_string()));
    }
    CATALOG
        .iter()
        .find_map(|layout| {
            parse_layout(layout, candidate, year).map(|timestamp| Recognized { timestamp, layout })
        })
        .ok_or_else(|| TimestampError::NotRecognized(candidate.to_string()))
}

impl Layout {
    /// Parses `candidate` with this layout only. Offsets are folded into UTC.
    pub fn parse(&self, candidate: &str) -> Result<DateTime<Utc>, TimestampError> {
        self.parse_with_year(candidate, *ASSUMED_YEAR)
    }

    /// Like [`Layout::parse`], with an explicit year for year-less layouts.
    pub fn parse_with_year(&self, candidate: &str, year: i32) -> Result<DateTime<Utc>, TimestampError> {
        parse_layout(self, candidate, year).ok_or_else(|| TimestampError::LayoutMismatch {
            layout: self.template,
            candidate: candidate.to_string(),
        })
    }

    /// Writes `ts` the way this layout expects it, with whitespace collapsed to single spaces.
    pub fn render(&self, ts: DateTime<Utc>) -> String {
        // %#z is parse-only in chrono
        let fmt = self.format.replace("%#z", "%z");
        let rendered = ts.format(&fmt).to_string();
        rendered.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn previous_leap_year(year: i32) -> i32 {
    (0..8)
        .map(|back| year - back)
        .find(|&y| NaiveDate::from_ymd_opt(y, 2, 29).is_some())
        .unwrap_or(year)
}

fn parse_layout(layout: &Layout, candidate: &str, year: i32) -> Option<DateTime<Utc>> {
    if layout.zone == Zone::Named && !zone_abbreviation_ok(layout, candidate) {
        return None;
    }
    if layout.is_yearless() {
        let fmt = format!("%Y {}", layout.format);
        // Feb 29 in a common year still names a real day
        return parse_naive(&format!("{year} {candidate}"), &fmt).or_else(|| {
            let leap = previous_leap_year(year);
            if leap == year || !candidate.contains("29") {
                return None;
            }
            parse_naive(&format!("{leap} {candidate}"), &fmt)
        });
    }
    let (candidate, format) = strip_weekday(candidate, layout.format)?;
    match layout.zone {
        Zone::Naive | Zone::Utc | Zone::Named => parse_naive(candidate, format),
        Zone::Offset => parse_offset(candidate, format),
        Zone::OffsetOrUtc => match candidate.strip_suffix('Z') {
            Some(rest) => parse_naive(rest, format.trim_end_matches("%:z")),
            None => parse_offset(candidate, format),
        },
    }
}

/// Drops a leading weekday name from both `candidate` and `format`.
///
/// The name only has to be spelled right; chrono would also reject a weekday
/// that disagrees with the date, and such lines would lose their timestamp.
fn strip_weekday<'c, 'f>(candidate: &'c str, format: &'f str) -> Option<(&'c str, &'f str)> {
    let (rest, long) = match (format.strip_prefix("%a"), format.strip_prefix("%A")) {
        (Some(rest), _) => (rest, false),
        (_, Some(rest)) => (rest, true),
        _ => return Some((candidate, format)),
    };
    let end = candidate
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(candidate.len());
    let name = &candidate[..end];
    let spelled = if long { name.len() > 3 } else { name.len() == 3 };
    (spelled && name.parse::<Weekday>().is_ok()).then_some((&candidate[end..], rest))
}

fn parse_naive(s: &str, fmt: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, fmt)
        .ok()
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

fn parse_offset(s: &str, fmt: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(s, fmt)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// chrono skips %Z without validating it, so the abbreviation is checked here.
fn zone_abbreviation_ok(layout: &Layout, candidate: &str) -> bool {
    let Some(pos) = layout.format.split_whitespace().position(|f| f.contains("%Z")) else {
        return true;
    };
    candidate
        .split_whitespace()
        .nth(pos)
        .map(|tok| RE_ZONE_ABBREV.is_match(tok))
        .unwrap_or(false)
}
