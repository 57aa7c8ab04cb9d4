use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;

/// A labelled case-insensitive failure signature.
pub struct SuspiciousRule {
    pub label: &'static str,
    regex: Regex,
}

impl SuspiciousRule {
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

static RULES: Lazy<Vec<SuspiciousRule>> = Lazy::new(|| {
    [
        ("fail", r"(?i)\bfail(ed|ing|s)?\b"),
        ("exception", r"(?i)\bexception(s)?\b"),
        ("panic", r"(?i)\bpanic(s|ed|ing)?\b"),
        ("critical", r"(?i)\bcritical\b"),
        ("abort", r"(?i)\babort(ed|ing|s)?\b"),
        ("timeout", r"(?i)\btime\s?out(s|ed|ing)?\b"),
        ("traceback", r"(?i)\btraceback\b"),
        ("unreachable", r"(?i)\bunreachable\b"),
        ("unhandled", r"(?i)\bunhandled\b"),
        ("fatal", r"(?i)\bfatal\b"),
        ("segfault", r"(?i)\bsegfault\b"),
        ("stacktrace", r"(?i)\bstack\s?trace\b"),
        ("not found", r"(?i)not found"),
        ("could not", r"(?i)could not"),
        ("no such file", r"(?i)no such file"),
        ("connection refused", r"(?i)connection refused"),
        ("permission denied", r"(?i)permission denied"),
        ("out of memory", r"(?i)out of memory"),
        ("disk full", r"(?i)disk full"),
        ("broken pipe", r"(?i)broken pipe"),
    ]
    .into_iter()
    .map(|(label, re)| SuspiciousRule { label, regex: Regex::new(re).unwrap() })
    .collect()
});

/// The fixed rule list, in reporting order.
pub fn rules() -> &'static [SuspiciousRule] {
    &RULES
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspiciousHit {
    pub index: usize,
    pub line: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspiciousGroup {
    pub label: &'static str,
    /// Most recent matches, in file order.
    pub hits: Vec<SuspiciousHit>,
}

/// For every rule, the last `per_rule` matching lines. Rules without a match are left out.
pub fn scan<S>(lines: &[S], per_rule: usize) -> Vec<SuspiciousGroup>
where
    S: AsRef<str> + Sync,
{
    rules()
        .par_iter()
        .filter_map(|rule| {
            let mut hits: Vec<SuspiciousHit> = lines
                .iter()
                .enumerate()
                .rev()
                .filter(|(_, l)| rule.is_match(l.as_ref()))
                .take(per_rule)
                .map(|(index, l)| SuspiciousHit { index, line: l.as_ref().to_string() })
                .collect();
            if hits.is_empty() {
                return None;
            }
            hits.reverse();
            Some(SuspiciousGroup { label: rule.label, hits })
        })
        .collect()
}
