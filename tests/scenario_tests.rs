use logtrail::analyzers::{analyse, AnalysisOpts};
use logtrail::corpus::LogCorpus;
use std::io::Write;

const SAMPLE: &str = "2024-01-01 10:00:00 INFO start\n2024-01-01 10:00:30 ERROR boom id=42\n2024-01-01 10:01:00 INFO done";

#[test]
fn three_line_file_end_to_end() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(SAMPLE.as_bytes()).unwrap();
    let c = LogCorpus::load(f.path()).unwrap();

    let keyed = c.histogram().keyed();
    assert_eq!(keyed.len(), 2);
    assert_eq!(keyed["2024-01-01 10:00"], 2);
    assert_eq!(keyed["2024-01-01 10:01"], 1);

    assert_eq!(logtrail::masking::normalize(c.line(1).unwrap()), "ERROR boom id=<NUM>");
    assert_eq!(logtrail::query::goto(&c, "2024-01-01 10:00:40"), Ok(1));

    let r = c.histogram().rebin(10, 5).unwrap();
    assert_eq!(r.total(), 3);
    assert_eq!(r.counts[0], 2);
    assert_eq!(r.counts[9], 1);
}

#[test]
fn thousand_lines_five_panics() {
    let mut lines: Vec<String> = (0..1000)
        .map(|i| format!("2024-01-01 10:{:02}:{:02} INFO tick {i}", i / 60 % 60, i % 60))
        .collect();
    for i in [3, 250, 600, 601, 999] {
        lines[i] = format!("2024-01-01 11:00:00 FATAL panic in worker {i}");
    }
    let c = LogCorpus::from_lines(lines);
    let r = analyse(&c, &AnalysisOpts::default());
    let panic = r.suspicious().unwrap().iter().find(|g| g.label == "panic").unwrap();
    let idx: Vec<usize> = panic.hits.iter().map(|h| h.index).collect();
    assert_eq!(idx, vec![600, 601, 999]);
}
