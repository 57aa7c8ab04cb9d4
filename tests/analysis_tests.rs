use logtrail::analyzers::{analyse, AnalysisKind, AnalysisOpts, AnalysisReport, AnalysisSection};
use logtrail::corpus::LogCorpus;
use tracing::Level;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::DEBUG)
        .try_init();
}

#[test]
fn continuation_lines_take_part_in_analysis() {
    init_tracing();
    let c = LogCorpus::from_lines([
        "2024-01-01 10:00:00 ERROR request failed",
        "java.lang.IllegalStateException: boom",
        "    at com.acme.Handler.run(Handler.java:42)",
        "2024-01-01 10:00:05 INFO recovered",
    ]);
    assert_eq!(c.timestamped_count(), 2);

    let r = analyse(&c, &AnalysisOpts::default());
    let total: usize = r.top_patterns().unwrap().iter().map(|p| p.count).sum();
    assert_eq!(total, 4);

    let labels: Vec<&str> = r.suspicious().unwrap().iter().map(|g| g.label).collect();
    assert_eq!(labels, vec!["fail"]);

    let bigrams = &r.ngrams().unwrap()[0];
    assert!(bigrams.top.iter().any(|g| g.phrase == "at com.acme.Handler.run(Handler.java:<NUM>)"));
}

#[test]
fn options_bound_each_section() {
    let lines: Vec<String> = (0..50).map(|i| format!("event kind{} value {}", i % 10, i)).collect();
    let c = LogCorpus::from_lines(lines);
    let opts = AnalysisOpts { top: 3, longest: 2, ngram_sizes: vec![2], ngram_top: 4, ..AnalysisOpts::default() };
    let r = analyse(&c, &opts);
    assert_eq!(r.top_patterns().unwrap().len(), 3);
    assert_eq!(r.longest_lines().unwrap().len(), 2);
    assert!(r.rare_patterns().unwrap().is_empty());
    let ngrams = r.ngrams().unwrap();
    assert_eq!(ngrams.len(), 1);
    assert_eq!(ngrams[0].top.len(), 4);
}

#[test]
fn report_merges_by_kind() {
    let mut r = AnalysisReport::new();
    r.insert(AnalysisSection::LongestLines(vec![]));
    r.insert(AnalysisSection::LongestLines(vec![]));
    assert_eq!(r.len(), 1);
    assert!(!r.is_complete());
    assert_eq!(r.get(AnalysisKind::LongestLines).map(|s| s.kind()), Some(AnalysisKind::LongestLines));
}

#[test]
fn report_serializes_sections_by_name() {
    let c = LogCorpus::from_lines(["a 1", "a 2"]);
    let v = serde_json::to_value(analyse(&c, &AnalysisOpts::default())).unwrap();
    assert_eq!(v["top_patterns"][0]["pattern"], "a <NUM>");
    assert_eq!(v["top_patterns"][0]["count"], 2);
    assert!(v.get("ngrams").is_some());
}

#[test]
fn fan_out_completes_on_a_wide_pool() {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(16).build().unwrap();
    let kinds = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta"];
    for round in 0..20 {
        let lines: Vec<String> = (0..4000)
            .map(|i| format!("2024-01-01 10:{:02}:00 worker {} id={} round {}", i % 60, kinds[i % 7], i, round))
            .collect();
        let c = LogCorpus::from_lines(lines);
        let r = pool.install(|| analyse(&c, &AnalysisOpts::default()));
        assert!(r.is_complete(), "round {round} lost a section");
        assert_eq!(r.top_patterns().unwrap()[0].count, 4000 / 7 + 1);
    }
}
