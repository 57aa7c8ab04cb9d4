use ahash::AHashMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NGramCount {
    pub phrase: String,
    pub count: usize,
}

/// Most frequent phrases of `n` consecutive normalized tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NGramTable {
    pub n: usize,
    pub top: Vec<NGramCount>,
}

/// Counts every window of `n` whitespace separated tokens across `patterns`.
pub fn count_ngrams<S: AsRef<str>>(patterns: &[S], n: usize) -> AHashMap<String, usize> {
    let mut freq: AHashMap<String, usize> = AHashMap::new();
    if n == 0 {
        return freq;
    }
    for p in patterns {
        let words: Vec<&str> = p.as_ref().split_whitespace().collect();
        for w in words.windows(n) {
            *freq.entry(w.join(" ")).or_insert(0) += 1;
        }
    }
    freq
}

/// The `k` most frequent `n`-grams, count descending then phrase ascending.
pub fn top_ngrams<S: AsRef<str>>(patterns: &[S], n: usize, k: usize) -> NGramTable {
    let mut top: Vec<NGramCount> = count_ngrams(patterns, n)
        .into_iter()
        .map(|(phrase, count)| NGramCount { phrase, count })
        .collect();
    top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.phrase.cmp(&b.phrase)));
    top.truncate(k);
    NGramTable { n, top }
}

/// One table per entry of `sizes`, in that order.
pub fn ngram_tables<S: AsRef<str>>(patterns: &[S], sizes: &[usize], k: usize) -> Vec<NGramTable> {
    sizes.iter().map(|&n| top_ngrams(patterns, n, k)).collect()
}
