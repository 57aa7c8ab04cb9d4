use crate::parser;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::num::NonZeroUsize;

static RE_UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b").unwrap()
});

static RE_IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,3}(?:\.\d{1,3}){3}\b").unwrap()
});

static RE_HEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b0x[0-9a-fA-F]+\b").unwrap()
});

static RE_INT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d+\b").unwrap()
});

// Per-thread cache; log files repeat the same lines a lot
thread_local! {
    static NORMALIZE_CACHE: RefCell<lru::LruCache<String, String>> = RefCell::new(
        lru::LruCache::new(NonZeroUsize::new(8192).unwrap())
    );
}

/// Removes the timestamp prefix, if the leading 1..=3 tokens form one.
///
/// When a prefix is removed the remaining tokens are rejoined with single spaces;
/// otherwise the line is returned untouched.
pub fn strip_timestamp(line: &str) -> String {
    match parser::extract_timestamp(line) {
        Ok(e) => line.split_whitespace().skip(e.tokens).join(" "),
        Err(_) => line.to_string(),
    }
}

/// Replaces variable tokens with placeholders.
pub fn mask_text(input: &str) -> String {
    // Order matters: the generic integer rule would eat the digits of the others
    let s = RE_UUID.replace_all(input, "<UUID>");
    let s = RE_IPV4.replace_all(&s, "<IP>");
    let s = RE_HEX.replace_all(&s, "<HEX>");
    let s = RE_INT.replace_all(&s, "<NUM>");
    s.into_owned()
}

/// Structural pattern of a log line: timestamp prefix removed, variables masked.
pub fn normalize(line: &str) -> String {
    mask_text(&strip_timestamp(line))
}

/// [`normalize`] backed by a thread-local LRU cache.
pub fn normalize_cached(line: &str) -> String {
    if let Some(hit) = NORMALIZE_CACHE.with(|c| c.borrow_mut().get(line).cloned()) {
        return hit;
    }
    let out = normalize(line);
    NORMALIZE_CACHE.with(|c| c.borrow_mut().put(line.to_string(), out.clone()));
    out
}
