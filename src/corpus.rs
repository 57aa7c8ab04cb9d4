use crate::formats::Layout;
use crate::masking;
use crate::parser;
use crate::temporal::MinuteHistogram;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid regular expression: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// Summary handed to the shell once a file is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadResult {
    pub path: Option<PathBuf>,
    pub total_lines: usize,
    pub timestamped_lines: usize,
    pub min_timestamp: Option<DateTime<Utc>>,
    pub max_timestamp: Option<DateTime<Utc>>,
    pub main_format: Option<&'static Layout>,
}

/// Lines matching a filter expression, as indices into the corpus in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterResult {
    pub pattern: String,
    pub indices: Vec<usize>,
}

impl FilterResult {
    pub fn len(&self) -> usize { self.indices.len() }

    pub fn is_empty(&self) -> bool { self.indices.is_empty() }

    pub fn lines<'a>(&'a self, corpus: &'a LogCorpus) -> impl Iterator<Item = &'a str> + 'a {
        self.indices.iter().filter_map(move |&i| corpus.line(i))
    }
}

/// The loaded file: every raw line in order with the timestamp found at its head, if any.
///
/// Built once and read-only afterwards; share it behind an `Arc`.
#[derive(Debug)]
pub struct LogCorpus {
    path: Option<PathBuf>,
    lines: Vec<String>,
    timestamps: Vec<Option<DateTime<Utc>>>,
    histogram: MinuteHistogram,
    main_format: Option<&'static Layout>,
    // timestamps re-read under `main_format` only, computed on first goto
    main_format_timestamps: OnceCell<Vec<Option<DateTime<Utc>>>>,
    normalized: OnceCell<Vec<String>>,
}

impl LogCorpus {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let started = Instant::now();
        let file = File::open(path).map_err(|source| LoadError::Open { path: path.to_path_buf(), source })?;
        // Larger buffer reduces syscalls on big files.
        let reader = BufReader::with_capacity(1 << 20, file);
        let lines = read_lines(reader).map_err(|source| LoadError::Read { path: path.to_path_buf(), source })?;
        debug!(path = %path.display(), lines = lines.len(), elapsed_ms = started.elapsed().as_millis() as u64, "read file");

        let mut corpus = Self::from_lines(lines);
        corpus.path = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            total_lines = corpus.len(),
            timestamped = corpus.timestamped_count(),
            main_format = corpus.main_format.map(|l| l.template).unwrap_or("-"),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded log file"
        );
        if corpus.main_format.is_none() && !corpus.is_empty() {
            warn!(path = %path.display(), "no recognizable timestamp in file; goto is unavailable");
        }
        Ok(corpus)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        Ok(Self::from_lines(read_lines(reader)?))
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        let timestamps: Vec<Option<DateTime<Utc>>> = lines
            .par_iter()
            .map(|l| parser::extract_timestamp(l).ok().map(|e| e.timestamp))
            .collect();
        let histogram = MinuteHistogram::from_timestamps(timestamps.iter().flatten().copied());
        let main_format = parser::detect_main_format(&lines);
        Self {
            path: None,
            lines,
            timestamps,
            histogram,
            main_format,
            main_format_timestamps: OnceCell::new(),
            normalized: OnceCell::new(),
        }
    }

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    pub fn len(&self) -> usize { self.lines.len() }

    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    pub fn lines(&self) -> &[String] { &self.lines }

    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    /// Lines from `idx` to the end of the file.
    pub fn tail_from(&self, idx: usize) -> &[String] {
        &self.lines[idx.min(self.lines.len())..]
    }

    /// Per-line timestamps found against the full catalog.
    pub fn timestamps(&self) -> &[Option<DateTime<Utc>>] { &self.timestamps }

    pub fn timestamp(&self, idx: usize) -> Option<DateTime<Utc>> {
        self.timestamps.get(idx).copied().flatten()
    }

    pub fn timestamped_count(&self) -> usize {
        self.histogram.total()
    }

    pub fn histogram(&self) -> &MinuteHistogram { &self.histogram }

    pub fn main_format(&self) -> Option<&'static Layout> { self.main_format }

    /// Per-line timestamps parsed under the main format only; all `None` when it is unknown.
    pub fn main_format_timestamps(&self) -> &[Option<DateTime<Utc>>] {
        self.main_format_timestamps.get_or_init(|| match self.main_format {
            Some(layout) => self
                .lines
                .par_iter()
                .map(|l| parser::extract_with_layout(l, layout).ok().map(|e| e.timestamp))
                .collect(),
            None => vec![None; self.lines.len()],
        })
    }

    /// Normalized pattern of every line, shared by the pattern analyses.
    pub fn normalized(&self) -> &[String] {
        self.normalized
            .get_or_init(|| self.lines.par_iter().map(|l| masking::normalize_cached(l)).collect())
    }

    pub fn load_result(&self) -> LoadResult {
        LoadResult {
            path: self.path.clone(),
            total_lines: self.len(),
            timestamped_lines: self.timestamped_count(),
            min_timestamp: self.histogram.first(),
            max_timestamp: self.histogram.last(),
            main_format: self.main_format,
        }
    }

    /// Lines matching `expr`, in file order.
    pub fn filter(&self, expr: &str) -> Result<FilterResult, FilterError> {
        let re = Regex::new(expr)?;
        let indices = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, l)| re.is_match(l))
            .map(|(i, _)| i)
            .collect();
        Ok(FilterResult { pattern: expr.to_string(), indices })
    }
}

/// Splits on `\n`, drops a trailing `\r` and decodes invalid UTF-8 lossily.
pub fn read_lines<R: BufRead>(mut reader: R) -> io::Result<Vec<String>> {
    let mut out = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        out.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(out)
}
