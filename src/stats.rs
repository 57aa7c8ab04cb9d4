use crate::corpus::LogCorpus;
use crate::temporal::minute_key;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;

static RE_ERR_WARN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(err|wrn|error|warn)\b").unwrap());

/// Number of busiest minutes listed in the report.
pub const BUSIEST_MINUTES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinuteCount {
    pub minute: String,
    pub count: usize,
}

/// Whole-file overview for the `stat` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub total_lines: usize,
    pub with_timestamp: usize,
    pub without_timestamp: usize,
    pub busiest_minutes: Vec<MinuteCount>,
    pub error_warning_lines: usize,
    pub other_lines: usize,
    /// Percentage of all lines carrying an error/warning keyword.
    pub error_warning_ratio: f64,
    pub avg_lines_per_minute: f64,
}

pub fn is_error_or_warning(line: &str) -> bool {
    RE_ERR_WARN.is_match(line)
}

pub fn build_statistics(corpus: &LogCorpus) -> StatisticsReport {
    let hist = corpus.histogram();
    let total_lines = corpus.len();
    let with_timestamp = hist.total();

    let error_warning_lines = corpus.lines().par_iter().filter(|l| is_error_or_warning(l)).count();
    let error_warning_ratio = if total_lines == 0 {
        0.0
    } else {
        error_warning_lines as f64 / total_lines as f64 * 100.0
    };

    let avg_lines_per_minute = match (hist.first(), hist.last()) {
        (Some(first), Some(last)) => {
            let minutes = (last - first).num_milliseconds() as f64 / 60_000.0;
            if minutes > 0.0 { with_timestamp as f64 / minutes } else { 0.0 }
        }
        _ => 0.0,
    };

    StatisticsReport {
        first_timestamp: hist.first(),
        last_timestamp: hist.last(),
        total_lines,
        with_timestamp,
        without_timestamp: total_lines - with_timestamp,
        busiest_minutes: hist
            .busiest(BUSIEST_MINUTES)
            .into_iter()
            .map(|(t, count)| MinuteCount { minute: minute_key(t), count })
            .collect(),
        error_warning_lines,
        other_lines: total_lines - error_warning_lines,
        error_warning_ratio,
        avg_lines_per_minute,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_needs_word_boundary() {
        assert!(is_error_or_warning("ERR disk"));
        assert!(is_error_or_warning("level=warn msg"));
        assert!(!is_error_or_warning("errors piled up"));
        assert!(!is_error_or_warning("terror"));
    }

    #[test]
    fn empty_corpus_has_zero_ratios() {
        let c = LogCorpus::from_lines(Vec::<String>::new());
        let r = build_statistics(&c);
        assert_eq!(r.total_lines, 0);
        assert_eq!(r.error_warning_ratio, 0.0);
        assert_eq!(r.avg_lines_per_minute, 0.0);
        assert!(r.busiest_minutes.is_empty());
    }
}
