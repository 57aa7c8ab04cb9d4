use crate::corpus::LogCorpus;
use crate::ngrams::{self, NGramTable};
use crate::patterns::{self, LongLine, PatternStat};
use crate::suspicious::{self, SuspiciousGroup};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Identifies one analysis section; also the merge key of an [`AnalysisReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    TopPatterns,
    RarePatterns,
    LongestLines,
    Suspicious,
    NGrams,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 5] = [
        AnalysisKind::TopPatterns,
        AnalysisKind::RarePatterns,
        AnalysisKind::LongestLines,
        AnalysisKind::Suspicious,
        AnalysisKind::NGrams,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnalysisKind::TopPatterns => "top_patterns",
            AnalysisKind::RarePatterns => "rare_patterns",
            AnalysisKind::LongestLines => "longest_lines",
            AnalysisKind::Suspicious => "suspicious",
            AnalysisKind::NGrams => "ngrams",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of one analyzer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisSection {
    TopPatterns(Vec<PatternStat>),
    RarePatterns(Vec<PatternStat>),
    LongestLines(Vec<LongLine>),
    Suspicious(Vec<SuspiciousGroup>),
    NGrams(Vec<NGramTable>),
}

impl AnalysisSection {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisSection::TopPatterns(_) => AnalysisKind::TopPatterns,
            AnalysisSection::RarePatterns(_) => AnalysisKind::RarePatterns,
            AnalysisSection::LongestLines(_) => AnalysisKind::LongestLines,
            AnalysisSection::Suspicious(_) => AnalysisKind::Suspicious,
            AnalysisSection::NGrams(_) => AnalysisKind::NGrams,
        }
    }
}

/// Knobs for the analysis sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisOpts {
    pub top: usize,
    pub rare: usize,
    /// Patterns seen more often than this are never rare.
    pub rare_max_count: usize,
    pub longest: usize,
    pub suspicious_per_rule: usize,
    pub ngram_top: usize,
    pub ngram_sizes: Vec<usize>,
}

impl Default for AnalysisOpts {
    fn default() -> Self {
        Self {
            top: 7,
            rare: 5,
            rare_max_count: 2,
            longest: 5,
            suspicious_per_rule: 3,
            ngram_top: 10,
            ngram_sizes: vec![2, 3, 4],
        }
    }
}

/// Trait that all analyzers implement. Analyzers only read the corpus.
pub trait Analyzer: Send + Sync {
    fn kind(&self) -> AnalysisKind;
    fn analyze(&self, corpus: &LogCorpus, opts: &AnalysisOpts) -> AnalysisSection;
}

pub struct TopPatternsAnalyzer;
pub struct RarePatternsAnalyzer;
pub struct LongestLinesAnalyzer;
pub struct SuspiciousAnalyzer;
pub struct NGramAnalyzer;

fn pattern_groups(corpus: &LogCorpus) -> Vec<PatternStat> {
    patterns::group_normalized(corpus.lines(), corpus.normalized().to_vec())
}

impl Analyzer for TopPatternsAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::TopPatterns
    }

    fn analyze(&self, corpus: &LogCorpus, opts: &AnalysisOpts) -> AnalysisSection {
        AnalysisSection::TopPatterns(patterns::top_patterns(&pattern_groups(corpus), opts.top))
    }
}

impl Analyzer for RarePatternsAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::RarePatterns
    }

    fn analyze(&self, corpus: &LogCorpus, opts: &AnalysisOpts) -> AnalysisSection {
        let groups = pattern_groups(corpus);
        AnalysisSection::RarePatterns(patterns::rare_patterns(&groups, opts.rare_max_count, opts.rare))
    }
}

impl Analyzer for LongestLinesAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::LongestLines
    }

    fn analyze(&self, corpus: &LogCorpus, opts: &AnalysisOpts) -> AnalysisSection {
        AnalysisSection::LongestLines(patterns::longest_lines(corpus.lines(), opts.longest))
    }
}

impl Analyzer for SuspiciousAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Suspicious
    }

    fn analyze(&self, corpus: &LogCorpus, opts: &AnalysisOpts) -> AnalysisSection {
        AnalysisSection::Suspicious(suspicious::scan(corpus.lines(), opts.suspicious_per_rule))
    }
}

impl Analyzer for NGramAnalyzer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::NGrams
    }

    fn analyze(&self, corpus: &LogCorpus, opts: &AnalysisOpts) -> AnalysisSection {
        AnalysisSection::NGrams(ngrams::ngram_tables(corpus.normalized(), &opts.ngram_sizes, opts.ngram_top))
    }
}

/// Sections merged by kind as they arrive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    #[serde(flatten)]
    sections: BTreeMap<AnalysisKind, AnalysisSection>,
}

impl AnalysisReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `section` in its own slot, replacing an earlier section of the same kind.
    pub fn insert(&mut self, section: AnalysisSection) {
        self.sections.insert(section.kind(), section);
    }

    pub fn get(&self, kind: AnalysisKind) -> Option<&AnalysisSection> {
        self.sections.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        AnalysisKind::ALL.iter().all(|k| self.sections.contains_key(k))
    }

    /// Sections in [`AnalysisKind::ALL`] order.
    pub fn sections(&self) -> impl Iterator<Item = &AnalysisSection> {
        self.sections.values()
    }

    pub fn top_patterns(&self) -> Option<&[PatternStat]> {
        match self.get(AnalysisKind::TopPatterns) {
            Some(AnalysisSection::TopPatterns(v)) => Some(v),
            _ => None,
        }
    }

    pub fn rare_patterns(&self) -> Option<&[PatternStat]> {
        match self.get(AnalysisKind::RarePatterns) {
            Some(AnalysisSection::RarePatterns(v)) => Some(v),
            _ => None,
        }
    }

    pub fn longest_lines(&self) -> Option<&[LongLine]> {
        match self.get(AnalysisKind::LongestLines) {
            Some(AnalysisSection::LongestLines(v)) => Some(v),
            _ => None,
        }
    }

    pub fn suspicious(&self) -> Option<&[SuspiciousGroup]> {
        match self.get(AnalysisKind::Suspicious) {
            Some(AnalysisSection::Suspicious(v)) => Some(v),
            _ => None,
        }
    }

    pub fn ngrams(&self) -> Option<&[NGramTable]> {
        match self.get(AnalysisKind::NGrams) {
            Some(AnalysisSection::NGrams(v)) => Some(v),
            _ => None,
        }
    }
}

/// Main analyzer registry that manages all analyzers
pub struct AnalyzerRegistry {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self {
            analyzers: vec![
                Box::new(TopPatternsAnalyzer),
                Box::new(RarePatternsAnalyzer),
                Box::new(LongestLinesAnalyzer),
                Box::new(SuspiciousAnalyzer),
                Box::new(NGramAnalyzer),
            ],
        }
    }

    pub fn kinds(&self) -> Vec<AnalysisKind> {
        self.analyzers.iter().map(|a| a.kind()).collect()
    }

    /// Runs every analyzer on the rayon pool and sends each section to `tx` as it finishes.
    fn run(&self, corpus: &LogCorpus, opts: &AnalysisOpts, tx: &Sender<AnalysisSection>) {
        // The cache initializer runs par_iter; it must not be entered from inside the scope.
        corpus.normalized();
        rayon::scope(|s| {
            for analyzer in &self.analyzers {
                let tx = tx.clone();
                s.spawn(move |_| {
                    let started = Instant::now();
                    let section = analyzer.analyze(corpus, opts);
                    debug!(
                        section = analyzer.kind().name(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "analysis section done"
                    );
                    // receiver gone means nobody wants the rest
                    let _ = tx.send(section);
                });
            }
        });
    }

    /// Fans the analyzers out and blocks until all sections are merged.
    pub fn analyze(&self, corpus: &LogCorpus, opts: &AnalysisOpts) -> AnalysisReport {
        let (tx, rx) = unbounded();
        self.run(corpus, opts, &tx);
        drop(tx);
        let mut report = AnalysisReport::new();
        for section in rx {
            report.insert(section);
        }
        report
    }

    /// Starts the analyzers in the background; sections arrive on the returned
    /// receiver in completion order and it disconnects once all are sent.
    pub fn spawn(self: Arc<Self>, corpus: Arc<LogCorpus>, opts: AnalysisOpts) -> Receiver<AnalysisSection> {
        let (tx, rx) = unbounded();
        rayon::spawn(move || {
            self.run(&corpus, &opts, &tx);
        });
        rx
    }
}

/// [`AnalyzerRegistry::analyze`] with the default analyzers.
pub fn analyse(corpus: &LogCorpus, opts: &AnalysisOpts) -> AnalysisReport {
    AnalyzerRegistry::new().analyze(corpus, opts)
}

/// [`AnalyzerRegistry::spawn`] with the default analyzers.
pub fn spawn_analysis(corpus: Arc<LogCorpus>, opts: AnalysisOpts) -> Receiver<AnalysisSection> {
    Arc::new(AnalyzerRegistry::new()).spawn(corpus, opts)
}
