//! Plain-text rendering of engine results for the line shell.

use crate::analyzers::{AnalysisReport, AnalysisSection};
use crate::corpus::{LoadResult, LogCorpus};
use crate::session::View;
use crate::stats::StatisticsReport;
use crate::temporal::RenderHistogram;
use chrono::{DateTime, SecondsFormat, Utc};

pub const HELP: &str = "\
commands:
  list              show every line
  filter [regex]    show lines matching a regular expression
  goto [timestamp]  jump to the line nearest to a (partial) timestamp
  stat              file statistics
  analyse           pattern, rare, longest, suspicious and n-gram report
  help              this text
  quit | exit       leave";

fn ts(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_else(|| "-".into())
}

pub fn render_load(r: &LoadResult) -> String {
    let path = r.path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "-".into());
    let format = r.main_format.map(|l| l.template).unwrap_or("undetermined");
    [
        format!("file:        {path}"),
        format!("lines:       {} ({} with timestamp)", r.total_lines, r.timestamped_lines),
        format!("range:       {} .. {}", ts(r.min_timestamp), ts(r.max_timestamp)),
        format!("main format: {format}"),
    ]
    .join("\n")
}

pub fn render_histogram(h: &RenderHistogram) -> String {
    let mut out = h.rows();
    out.push(h.label_row());
    out.join("\n")
}

pub fn render_statistics(s: &StatisticsReport) -> String {
    let mut out = vec![
        format!("first timestamp:      {}", ts(s.first_timestamp)),
        format!("last timestamp:       {}", ts(s.last_timestamp)),
        format!("total lines:          {}", s.total_lines),
        format!("with timestamp:       {}", s.with_timestamp),
        format!("without timestamp:    {}", s.without_timestamp),
        format!(
            "error/warning lines:  {} ({:.2}%), other {}",
            s.error_warning_lines, s.error_warning_ratio, s.other_lines
        ),
        format!("avg lines per minute: {:.2}", s.avg_lines_per_minute),
        "busiest minutes:".to_string(),
    ];
    out.extend(s.busiest_minutes.iter().map(|m| format!("  {:<18} {}", m.minute, m.count)));
    out.join("\n")
}

pub fn render_section(section: &AnalysisSection) -> String {
    let mut out = vec![format!("== {} ==", section.kind())];
    match section {
        AnalysisSection::TopPatterns(v) | AnalysisSection::RarePatterns(v) => {
            out.push(format!("{:<6} {}", "Count", "Pattern"));
            for p in v {
                out.push(format!("{:<6} {}", p.count, p.pattern));
                out.push(format!("{:<6} e.g. {}", "", p.example));
            }
        }
        AnalysisSection::LongestLines(v) => {
            out.push(format!("{:<8} {:<6} {}", "Line", "Chars", "Text"));
            out.extend(v.iter().map(|l| format!("{:<8} {:<6} {}", l.index + 1, l.length, l.line)));
        }
        AnalysisSection::Suspicious(groups) => {
            for g in groups {
                out.push(format!("# {}", g.label));
                out.extend(g.hits.iter().map(|h| format!("{:<8} {}", h.index + 1, h.line)));
            }
        }
        AnalysisSection::NGrams(tables) => {
            for t in tables {
                out.push(format!("# {}-grams", t.n));
                out.extend(t.top.iter().map(|g| format!("{:<6} {}", g.count, g.phrase)));
            }
        }
    }
    out.join("\n")
}

pub fn render_analysis(report: &AnalysisReport) -> String {
    report.sections().map(render_section).collect::<Vec<_>>().join("\n\n")
}

/// Numbered lines, 1-based like an editor.
pub fn render_lines<'a, I>(lines: I) -> String
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    lines
        .into_iter()
        .map(|(i, l)| format!("{:>7}  {}", i + 1, l))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_view(corpus: &LogCorpus, view: &View) -> String {
    match view {
        View::Welcome => render_load(&corpus.load_result()),
        View::All => render_lines(corpus.lines().iter().map(String::as_str).enumerate()),
        View::Filtered(f) => render_lines(f.indices.iter().filter_map(|&i| corpus.line(i).map(|l| (i, l)))),
        View::Tail { from } => render_lines(
            corpus.tail_from(*from).iter().enumerate().map(|(i, l)| (from + i, l.as_str())),
        ),
        View::Statistics(s) => render_statistics(s),
        View::Analysis(r) => render_analysis(r),
        View::Help => HELP.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_numbered_from_one() {
        let out = render_lines([(0, "a"), (9, "b")]);
        assert_eq!(out, "      1  a\n     10  b");
    }

    #[test]
    fn tail_view_keeps_file_line_numbers() {
        let corpus = LogCorpus::from_lines(["x", "y", "z"]);
        let out = render_view(&corpus, &View::Tail { from: 1 });
        assert_eq!(out, "      2  y\n      3  z");
    }
}
