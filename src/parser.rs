use crate::formats::Layout;
use crate::recognizer::{self, Recognized, TimestampError};
use chrono::{DateTime, Utc};

/// Largest number of leading tokens ever offered as one candidate.
pub const MAX_WINDOW: usize = 3;

/// Leading tokens of a line joined by single spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub tokens: usize,
}

/// Timestamp found at the head of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extracted {
    pub timestamp: DateTime<Utc>,
    pub layout: &'static Layout,
    /// How many leading whitespace separated tokens the timestamp occupied.
    pub tokens: usize,
}

/// Yields the 1, 2 and 3 token windows at the start of `line`, shortest first.
pub fn candidates(line: &str) -> impl Iterator<Item = Candidate> + '_ {
    let fields: Vec<&str> = line.split_whitespace().take(MAX_WINDOW).collect();
    (1..=fields.len()).map(move |n| Candidate { text: fields[..n].join(" "), tokens: n })
}

/// Finds the timestamp prefix of `line` against the whole catalog.
pub fn extract_timestamp(line: &str) -> Result<Extracted, TimestampError> {
    candidates(line)
        .find_map(|c| {
            recognizer::recognize(&c.text).ok().map(|Recognized { timestamp, layout }| Extracted {
                timestamp,
                layout,
                tokens: c.tokens,
            })
        })
        .ok_or_else(|| TimestampError::NotRecognized(line.to_string()))
}

/// Finds the timestamp prefix of `line` using `layout` only.
pub fn extract_with_layout(line: &str, layout: &'static Layout) -> Result<Extracted, TimestampError> {
    candidates(line)
        .find_map(|c| {
            layout.parse(&c.text).ok().map(|timestamp| Extracted { timestamp, layout, tokens: c.tokens })
        })
        .ok_or_else(|| TimestampError::LayoutMismatch {
            layout: layout.template,
            candidate: line.to_string(),
        })
}

/// Layout of the first line, in file order, that has a recognizable timestamp.
pub fn detect_main_format<I, S>(lines: I) -> Option<&'static Layout>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .find_map(|line| extract_timestamp(line.as_ref()).ok().map(|e| e.layout))
}
