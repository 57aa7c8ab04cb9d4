use logtrail::analyzers::{AnalysisKind, AnalysisOpts};
use logtrail::corpus::LogCorpus;
use logtrail::session::{Mode, Response, Session, SessionError, View};
use std::sync::Arc;

fn session() -> Session {
    let corpus = LogCorpus::from_lines([
        "2024-01-01 10:00:00 INFO start",
        "2024-01-01 10:00:30 ERROR boom id=42",
        "2024-01-01 10:01:00 INFO done",
    ]);
    Session::new(Arc::new(corpus), AnalysisOpts::default())
}

#[test]
fn filter_waits_for_its_argument() {
    let mut s = session();
    assert_eq!(s.submit("filter").unwrap(), Response::Prompt("filter regex"));
    assert_eq!(s.mode(), Mode::AwaitingFilterInput);
    assert_eq!(s.submit("ERROR").unwrap(), Response::Updated);
    assert_eq!(s.mode(), Mode::Idle);
    match s.view() {
        View::Filtered(f) => assert_eq!(f.indices, vec![1]),
        other => panic!("unexpected view {other:?}"),
    }
}

#[test]
fn bad_regex_keeps_previous_view() {
    let mut s = session();
    s.submit("list").unwrap();
    s.submit("filter").unwrap();
    let err = s.submit("([").unwrap_err();
    assert!(matches!(err, SessionError::Filter(_)));
    assert_eq!(s.mode(), Mode::Idle);
    assert_eq!(s.view(), &View::All);
}

#[test]
fn goto_shows_the_tail() {
    let mut s = session();
    s.submit("goto").unwrap();
    assert_eq!(s.mode(), Mode::AwaitingGotoInput);
    s.submit("2024-01-01 10:00:40").unwrap();
    assert_eq!(s.view(), &View::Tail { from: 1 });
}

#[test]
fn bad_goto_input_keeps_previous_view() {
    let mut s = session();
    s.submit("stat").unwrap();
    let before = s.view().clone();
    assert!(matches!(s.submit("goto nonsense"), Err(SessionError::Goto(_))));
    assert_eq!(s.view(), &before);
    assert_eq!(s.mode(), Mode::Idle);
}

fn busy_session() -> Session {
    let lines: Vec<String> = (0..50_000)
        .map(|i| format!("2024-01-01 10:{:02}:{:02} INFO request {} served in {}ms", i / 60 % 60, i % 60, i, i % 97))
        .collect();
    Session::new(Arc::new(LogCorpus::from_lines(lines)), AnalysisOpts::default())
}

#[test]
fn analysis_runs_once_at_a_time() {
    let mut s = busy_session();
    assert_eq!(s.submit("analyse").unwrap(), Response::AnalysisStarted);
    assert_eq!(s.mode(), Mode::AnalysisRunning);
    assert!(matches!(s.submit("analyse"), Err(SessionError::Busy)));

    let mut kinds = Vec::new();
    while let Some(kind) = s.next_section() {
        kinds.push(kind);
    }
    assert!(kinds.len() <= AnalysisKind::ALL.len());
    assert_eq!(s.mode(), Mode::Idle);
    match s.view() {
        View::Analysis(r) => assert!(r.is_complete()),
        other => panic!("unexpected view {other:?}"),
    }
    assert_eq!(s.submit("help").unwrap(), Response::Updated);
}

#[test]
fn sections_arrive_in_any_order() {
    let mut s = session();
    s.submit("analyse").unwrap();
    let mut kinds = Vec::new();
    while let Some(kind) = s.next_section() {
        kinds.push(kind);
    }
    kinds.sort();
    assert_eq!(kinds, AnalysisKind::ALL.to_vec());
}

#[test]
fn finished_analysis_frees_the_session_without_polling() {
    let mut s = session();
    assert_eq!(s.submit("analyse").unwrap(), Response::AnalysisStarted);
    let mut answered = None;
    for _ in 0..500 {
        match s.submit("help") {
            Err(SessionError::Busy) => std::thread::sleep(std::time::Duration::from_millis(10)),
            other => {
                answered = Some(other);
                break;
            }
        }
    }
    assert!(matches!(answered, Some(Ok(Response::Updated))), "still busy: {answered:?}");
    assert_eq!(s.mode(), Mode::Idle);
    assert_eq!(s.view(), &View::Help);
}

#[test]
fn unknown_and_quit_commands() {
    let mut s = session();
    assert!(matches!(s.submit("frobnicate"), Err(SessionError::UnknownCommand(_))));
    assert_eq!(s.view(), &View::Welcome);
    assert_eq!(s.submit("").unwrap(), Response::Unchanged);
    assert_eq!(s.submit("exit").unwrap(), Response::Quit);
}
