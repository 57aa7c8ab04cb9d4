use chrono::{Duration, TimeZone, Utc};
use logtrail::corpus::LogCorpus;
use logtrail::masking::normalize;
use logtrail::patterns::group_patterns;
use logtrail::temporal::MinuteHistogram;
use proptest::prelude::*;

fn base() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

proptest! {
    /// Every recorded timestamp lands in exactly one minute bucket.
    #[test]
    fn minute_histogram_counts_every_timestamp(offsets in prop::collection::vec(0i64..5_000_000, 0..200)) {
        let h = MinuteHistogram::from_timestamps(offsets.iter().map(|s| base() + Duration::seconds(*s)));
        prop_assert_eq!(h.total(), offsets.len());
        prop_assert_eq!(h.keyed().values().sum::<usize>(), offsets.len());
    }

    /// Rebinning never loses or duplicates counts.
    #[test]
    fn rebin_preserves_total(
        offsets in prop::collection::vec(0i64..50_000_000, 1..200),
        width in 2usize..400,
        height in 1usize..12,
    ) {
        let h = MinuteHistogram::from_timestamps(offsets.iter().map(|s| base() + Duration::seconds(*s)));
        let r = h.rebin(width, height).unwrap();
        prop_assert_eq!(r.width(), width);
        prop_assert_eq!(r.total(), h.total());
        for (c, bar) in r.counts.iter().zip(&r.heights) {
            prop_assert!(*bar <= height);
            prop_assert_eq!(*c > 0, *bar > 0);
        }
    }

    /// Only timestamped lines reach the histogram.
    #[test]
    fn corpus_histogram_matches_timestamped_lines(kinds in prop::collection::vec(any::<bool>(), 0..100)) {
        let lines: Vec<String> = kinds
            .iter()
            .enumerate()
            .map(|(i, stamped)| {
                if *stamped {
                    format!("2024-01-01 {:02}:{:02}:00 event {}", i / 60 % 24, i % 60, i)
                } else {
                    format!("    continuation {i}")
                }
            })
            .collect();
        let c = LogCorpus::from_lines(lines);
        let stamped = kinds.iter().filter(|k| **k).count();
        prop_assert_eq!(c.histogram().total(), stamped);
        prop_assert_eq!(c.timestamps().iter().flatten().count(), stamped);
        prop_assert_eq!(c.len(), kinds.len());
    }

    #[test]
    fn normalize_is_idempotent(line in "[a-zA-Z0-9 =.-]{0,40}") {
        let once = normalize(&line);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn pattern_groups_partition_the_lines(lines in prop::collection::vec("[a-c0-9 ]{0,8}", 0..60)) {
        let stats = group_patterns(&lines);
        prop_assert_eq!(stats.iter().map(|s| s.count).sum::<usize>(), lines.len());
    }

    /// Two lines equally far from the target: the later one wins, wherever it sits in the file.
    #[test]
    fn equidistant_tie_goes_forward(delta in 1i64..86_400, later_first in any::<bool>()) {
        let target = base() + Duration::days(1);
        let fmt = |t: chrono::DateTime<Utc>| format!("{} msg", t.format("%Y-%m-%d %H:%M:%S"));
        let before = fmt(target - Duration::seconds(delta));
        let after = fmt(target + Duration::seconds(delta));
        let (lines, expected) = if later_first { (vec![after, before], 0) } else { (vec![before, after], 1) };
        let c = LogCorpus::from_lines(lines);
        prop_assert_eq!(logtrail::query::locate(&c, target), Some(expected));
    }
}
