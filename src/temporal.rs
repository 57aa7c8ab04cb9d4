use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

/// Format of minute bucket keys and histogram labels.
pub const MINUTE_KEY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Bar height used when the caller does not pick one.
pub const DEFAULT_BAR_HEIGHT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistogramError {
    #[error("no timestamped lines to plot")]
    Empty,
    #[error("render width {width} is too narrow (need at least 2)")]
    TooNarrow { width: usize },
}

pub fn floor_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(t)
}

pub fn minute_key(t: DateTime<Utc>) -> String {
    t.format(MINUTE_KEY_FORMAT).to_string()
}

pub fn parse_minute_key(key: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(key, MINUTE_KEY_FORMAT)
        .ok()
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// Per-minute line counts plus the exact earliest and latest instants seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinuteHistogram {
    buckets: BTreeMap<DateTime<Utc>, usize>,
    first: Option<DateTime<Utc>>,
    last: Option<DateTime<Utc>>,
}

/// Minute buckets as handed to the shell, which rebins them per render width.
pub type HistogramSnapshot = MinuteHistogram;

impl MinuteHistogram {
    pub fn new() -> Self { Self::default() }

    pub fn from_timestamps<I>(times: I) -> Self
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let mut h = Self::new();
        for t in times {
            h.record(t);
        }
        h
    }

    pub fn record(&mut self, t: DateTime<Utc>) {
        *self.buckets.entry(floor_minute(t)).or_insert(0) += 1;
        if self.first.map_or(true, |f| t < f) { self.first = Some(t); }
        if self.last.map_or(true, |l| t > l) { self.last = Some(t); }
    }

    /// Earliest timestamp recorded, at full precision.
    pub fn first(&self) -> Option<DateTime<Utc>> { self.first }

    /// Latest timestamp recorded, at full precision.
    pub fn last(&self) -> Option<DateTime<Utc>> { self.last }

    /// Number of timestamps recorded.
    pub fn total(&self) -> usize {
        self.buckets.values().sum()
    }

    /// Number of distinct minutes.
    pub fn len(&self) -> usize { self.buckets.len() }

    pub fn is_empty(&self) -> bool { self.buckets.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, usize)> + '_ {
        self.buckets.iter().map(|(t, c)| (*t, *c))
    }

    /// Count for a `YYYY-MM-DD HH:MM` key.
    pub fn get(&self, key: &str) -> Option<usize> {
        parse_minute_key(key).and_then(|t| self.buckets.get(&t).copied())
    }

    /// The histogram as string-keyed buckets.
    pub fn keyed(&self) -> BTreeMap<String, usize> {
        self.iter().map(|(t, c)| (minute_key(t), c)).collect()
    }

    /// The `n` fullest minutes, largest first; equal counts keep the earlier minute first.
    pub fn busiest(&self, n: usize) -> Vec<(DateTime<Utc>, usize)> {
        let mut v: Vec<(DateTime<Utc>, usize)> = self.iter().collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        v.truncate(n);
        v
    }

    /// Spreads the minute buckets over `width` equal bins between the first and
    /// last minute and scales them to bars at most `height` tall.
    pub fn rebin(&self, width: usize, height: usize) -> Result<RenderHistogram, HistogramError> {
        let (Some((&start, _)), Some((&end, _))) = (self.buckets.first_key_value(), self.buckets.last_key_value()) else {
            return Err(HistogramError::Empty);
        };
        if width < 2 {
            return Err(HistogramError::TooNarrow { width });
        }

        let mut span = end - start;
        if span == Duration::zero() {
            span = Duration::minutes(1);
        }
        // nanosecond arithmetic in i128 so multi-century spans cannot overflow
        let span_ns = span.num_seconds() as i128 * 1_000_000_000;
        let bin_ns = (span_ns / width as i128).max(1);

        let mut counts = vec![0usize; width];
        for (t, c) in self.iter() {
            let offset_ns = (t - start).num_seconds() as i128 * 1_000_000_000;
            let idx = ((offset_ns / bin_ns) as usize).min(width - 1);
            counts[idx] += c;
        }

        let max_count = counts.iter().copied().max().unwrap_or(0).max(1);
        let heights = counts
            .iter()
            .map(|&c| {
                let h = c * height / max_count;
                if c > 0 && h == 0 { 1 } else { h }
            })
            .collect();

        Ok(RenderHistogram {
            counts,
            heights,
            height,
            start,
            mid: start + Duration::seconds(span.num_seconds() / 2),
            end,
            bin_seconds: (bin_ns as f64) / 1e9,
        })
    }
}

impl Serialize for MinuteHistogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(t, c)| (minute_key(t), c)))
    }
}

/// Width-adapted view of a [`MinuteHistogram`], rebuilt on every redraw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderHistogram {
    pub counts: Vec<usize>,
    pub heights: Vec<usize>,
    pub height: usize,
    pub start: DateTime<Utc>,
    pub mid: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub bin_seconds: f64,
}

impl RenderHistogram {
    pub fn width(&self) -> usize { self.counts.len() }

    pub fn total(&self) -> usize { self.counts.iter().sum() }

    /// Start, midpoint and end labels.
    pub fn labels(&self) -> [String; 3] {
        [minute_key(self.start), minute_key(self.mid), minute_key(self.end)]
    }

    /// Bar rows, top first. A cell is filled when its bar reaches that row.
    pub fn rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|row| {
                self.heights
                    .iter()
                    .map(|&h| if self.height - row - 1 < h { '█' } else { ' ' })
                    .collect()
            })
            .collect()
    }

    /// One row with the start label left, mid label centred and end label right.
    pub fn label_row(&self) -> String {
        let width = self.width();
        let [start, mid, end] = self.labels();
        let mut row = vec![' '; width];
        place(&mut row, 0, &start);
        let mid_len = mid.chars().count();
        let mid_pos = (width / 2).saturating_sub(mid_len / 2);
        if mid_pos + mid_len < width {
            place(&mut row, mid_pos, &mid);
        }
        if let Some(end_pos) = width.checked_sub(end.chars().count()) {
            place(&mut row, end_pos, &end);
        }
        row.into_iter().collect()
    }
}

fn place(row: &mut [char], at: usize, label: &str) {
    for (slot, ch) in row.iter_mut().skip(at).zip(label.chars()) {
        *slot = ch;
    }
}
