use crate::masking;
use ahash::AHashMap;
use rayon::prelude::*;
use serde::Serialize;

/// All lines sharing one normalized pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternStat {
    pub pattern: String,
    pub count: usize,
    /// First raw line seen with this pattern.
    pub example: String,
    /// Line index of `example`.
    pub first_seen: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LongLine {
    pub index: usize,
    pub length: usize,
    pub line: String,
}

/// Normalizes every line and groups by exact pattern equality, in first-seen order.
pub fn group_patterns<S>(lines: &[S]) -> Vec<PatternStat>
where
    S: AsRef<str> + Sync,
{
    let normalized: Vec<String> = lines
        .par_iter()
        .map(|l| masking::normalize_cached(l.as_ref()))
        .collect();
    group_normalized(lines, normalized)
}

/// Groups pre-normalized patterns; `normalized[i]` must belong to `lines[i]`.
pub fn group_normalized<S: AsRef<str>>(lines: &[S], normalized: Vec<String>) -> Vec<PatternStat> {
    let mut index: AHashMap<String, usize> = AHashMap::new();
    let mut stats: Vec<PatternStat> = Vec::new();
    for (i, pattern) in normalized.into_iter().enumerate() {
        match index.get(&pattern) {
            Some(&slot) => stats[slot].count += 1,
            None => {
                index.insert(pattern.clone(), stats.len());
                stats.push(PatternStat {
                    pattern,
                    count: 1,
                    example: lines[i].as_ref().to_string(),
                    first_seen: i,
                });
            }
        }
    }
    stats
}

/// The `n` most frequent patterns; ties keep first-seen order.
pub fn top_patterns(stats: &[PatternStat], n: usize) -> Vec<PatternStat> {
    let mut v = stats.to_vec();
    v.sort_by(|a, b| b.count.cmp(&a.count).then(a.first_seen.cmp(&b.first_seen)));
    v.truncate(n);
    v
}

/// Up to `n` patterns seen at most `max_count` times, rarest first.
pub fn rare_patterns(stats: &[PatternStat], max_count: usize, n: usize) -> Vec<PatternStat> {
    let mut v: Vec<PatternStat> = stats.iter().filter(|s| s.count <= max_count).cloned().collect();
    v.sort_by(|a, b| a.count.cmp(&b.count).then(a.first_seen.cmp(&b.first_seen)));
    v.truncate(n);
    v
}

/// The `n` longest raw lines by character count. Duplicates are not merged.
pub fn longest_lines<S: AsRef<str>>(lines: &[S], n: usize) -> Vec<LongLine> {
    let mut v: Vec<(usize, usize)> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| (i, l.as_ref().chars().count()))
        .collect();
    v.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    v.into_iter()
        .take(n)
        .map(|(index, length)| LongLine { index, length, line: lines[index].as_ref().to_string() })
        .collect()
}
