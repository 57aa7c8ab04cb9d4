use crate::corpus::LogCorpus;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GotoError {
    #[error("timestamp format of this file could not be determined")]
    FormatUndetermined,
    #[error("cannot parse {input:?} (completed to {completed:?}) with layout {layout:?}")]
    Unparseable {
        input: String,
        completed: String,
        layout: &'static str,
    },
    #[error("no line with a timestamp in the main format")]
    NotFound,
}

/// Right-pads user input with the missing tail of `template`.
///
/// Purely textual: tokens the user typed are kept, except that the last one,
/// when shorter than its template token, is extended with the rest of that
/// token. Template tokens the input never reached are appended as-is. Input
/// whose tokens do not line up with the template fails to parse later.
pub fn complete_timestamp(input: &str, template: &str) -> String {
    let layout_parts: Vec<&str> = template.split(' ').collect();
    let mut out: Vec<String> = input.split_whitespace().map(str::to_string).collect();
    let typed = out.len();

    if let (Some(last), Some(lp)) = (out.last_mut(), typed.checked_sub(1).and_then(|i| layout_parts.get(i))) {
        if last.len() < lp.len() && lp.is_char_boundary(last.len()) {
            last.push_str(&lp[last.len()..]);
        }
    }
    out.extend(layout_parts.iter().skip(typed).map(|s| s.to_string()));
    out.join(" ")
}

/// Index of the line whose main-format timestamp is closest to `target`.
///
/// Equal distances go to the later timestamp; identical timestamps keep the earlier line.
pub fn locate(corpus: &LogCorpus, target: DateTime<Utc>) -> Option<usize> {
    let mut best: Option<(usize, DateTime<Utc>, i128)> = None;
    for (idx, ts) in corpus.main_format_timestamps().iter().enumerate() {
        let Some(ts) = *ts else { continue };
        let delta = distance_ns(ts, target);
        let better = match best {
            None => true,
            Some((_, best_ts, best_delta)) => delta < best_delta || (delta == best_delta && ts > best_ts),
        };
        if better {
            best = Some((idx, ts, delta));
        }
    }
    best.map(|(idx, _, _)| idx)
}

/// Completes `input` against the main format, parses it and locates the nearest line.
pub fn goto(corpus: &LogCorpus, input: &str) -> Result<usize, GotoError> {
    let layout = corpus.main_format().ok_or(GotoError::FormatUndetermined)?;
    let completed = complete_timestamp(input.trim(), layout.template);
    let target = layout.parse(&completed).map_err(|_| GotoError::Unparseable {
        input: input.to_string(),
        completed: completed.clone(),
        layout: layout.template,
    })?;
    let idx = locate(corpus, target).ok_or(GotoError::NotFound)?;
    debug!(input, completed = %completed, %target, line = idx, "goto resolved");
    Ok(idx)
}

fn distance_ns(a: DateTime<Utc>, b: DateTime<Utc>) -> i128 {
    let secs = (a.timestamp() as i128) - (b.timestamp() as i128);
    let nanos = (a.timestamp_subsec_nanos() as i128) - (b.timestamp_subsec_nanos() as i128);
    (secs * 1_000_000_000 + nanos).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_missing_fields_from_template_text() {
        let t = "2006/01/02 15:04:05.000000";
        assert_eq!(complete_timestamp("2025/04/22 12:00", t), "2025/04/22 12:00:05.000000");
        assert_eq!(complete_timestamp("2025/04/22", t), "2025/04/22 15:04:05.000000");
        assert_eq!(complete_timestamp("2025/04/22 12:00:00.000000", t), "2025/04/22 12:00:00.000000");
    }

    #[test]
    fn extra_input_tokens_are_kept() {
        assert_eq!(complete_timestamp("a b c", "2006-01-02"), "a b c");
    }

    #[test]
    fn only_the_last_token_is_padded() {
        let t = "Jan _2 15:04:05";
        assert_eq!(complete_timestamp("Mar 5 07:08:09", t), "Mar 5 07:08:09");
        assert_eq!(complete_timestamp("Mar 5 07:08", t), "Mar 5 07:08:05");
        assert_eq!(complete_timestamp("Mar 5", t), "Mar 5 15:04:05");
    }
}
