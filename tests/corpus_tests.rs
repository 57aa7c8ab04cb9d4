use chrono::{TimeZone, Utc};
use logtrail::corpus::{LoadError, LogCorpus};
use std::io::Write;

#[test]
fn loads_file_and_summarizes() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(
        f,
        "2024-01-01 10:00:00 INFO start\r\n\
         2024-01-01 10:00:30 ERROR boom id=42\r\n\
         \tcaused by: io\r\n\
         2024-01-01 10:01:00 INFO done"
    )
    .unwrap();
    let c = LogCorpus::load(f.path()).unwrap();
    let r = c.load_result();
    assert_eq!(r.total_lines, 4);
    assert_eq!(r.timestamped_lines, 3);
    assert_eq!(r.min_timestamp, Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()));
    assert_eq!(r.max_timestamp, Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 1, 0).unwrap()));
    assert_eq!(r.main_format.unwrap().template, "2006-01-02 15:04:05");
    assert_eq!(r.path.as_deref(), Some(f.path()));
    assert_eq!(c.line(2), Some("\tcaused by: io"));
    assert_eq!(c.timestamp(2), None);
}

#[test]
fn missing_file_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = LogCorpus::load(dir.path().join("nope.log")).unwrap_err();
    assert!(matches!(err, LoadError::Open { .. }));
    assert!(err.to_string().contains("nope.log"));
}

#[test]
fn filter_keeps_file_order() {
    let c = LogCorpus::from_lines(["b1", "a", "b2", "c", "b3"]);
    let f = c.filter("^b").unwrap();
    assert_eq!(f.indices, vec![0, 2, 4]);
    assert_eq!(f.lines(&c).collect::<Vec<_>>(), vec!["b1", "b2", "b3"]);
}

#[test]
fn tail_from_clamps_past_the_end() {
    let c = LogCorpus::from_lines(["x", "y"]);
    assert_eq!(c.tail_from(1), ["y".to_string()]);
    assert!(c.tail_from(9).is_empty());
}

#[test]
fn mixed_zones_compare_in_utc() {
    let c = LogCorpus::from_lines([
        "2024-01-01T12:00:00+02:00 a",
        "2024-01-01T11:00:00Z b",
    ]);
    assert_eq!(c.timestamp(0), Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()));
    assert_eq!(c.histogram().first(), c.timestamp(0));
    assert_eq!(c.histogram().last(), c.timestamp(1));
}
