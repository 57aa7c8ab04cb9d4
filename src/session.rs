//! Command state machine driven by a line-oriented shell.
//!
//! The shell feeds every input line to [`Session::submit`] and renders
//! [`Session::view`] afterwards. Commands that need an argument (`filter`,
//! `goto`) either take it inline or switch the session into an awaiting
//! state where the next line is consumed as that argument.

use crate::analyzers::{AnalysisKind, AnalysisOpts, AnalysisReport, AnalysisSection, AnalyzerRegistry};
use crate::corpus::{FilterError, FilterResult, LogCorpus};
use crate::query::{self, GotoError};
use crate::stats::{self, StatisticsReport};
use crossbeam_channel::{Receiver, TryRecvError};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    AwaitingFilterInput,
    AwaitingGotoInput,
    AnalysisRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Filter(Option<String>),
    Goto(Option<String>),
    Stat,
    Analyse,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (word, rest) = match s.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (s, ""),
        };
        let arg = (!rest.is_empty()).then(|| rest.to_string());
        match word.to_ascii_lowercase().as_str() {
            "list" | "all" => Ok(Command::List),
            "filter" => Ok(Command::Filter(arg)),
            "goto" => Ok(Command::Goto(arg)),
            "stat" | "stats" => Ok(Command::Stat),
            "analyse" | "analyze" => Ok(Command::Analyse),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            _ => Err(SessionError::UnknownCommand(s.to_string())),
        }
    }
}

/// What the shell should currently display.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Welcome,
    All,
    Filtered(FilterResult),
    /// The file from line `from` to the end.
    Tail { from: usize },
    Statistics(StatisticsReport),
    /// Complete once the session is back to idle; partial while analysis runs.
    Analysis(AnalysisReport),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The view changed.
    Updated,
    /// Nothing to do.
    Unchanged,
    /// The next line is the argument of the previous command.
    Prompt(&'static str),
    AnalysisStarted,
    Quit,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("analysis is still running")]
    Busy,
    #[error("unknown command {0:?} (type `help`)")]
    UnknownCommand(String),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Goto(#[from] GotoError),
}

pub struct Session {
    corpus: Arc<LogCorpus>,
    registry: Arc<AnalyzerRegistry>,
    opts: AnalysisOpts,
    mode: Mode,
    view: View,
    pending: Option<Receiver<AnalysisSection>>,
}

impl Session {
    pub fn new(corpus: Arc<LogCorpus>, opts: AnalysisOpts) -> Self {
        Self {
            corpus,
            registry: Arc::new(AnalyzerRegistry::new()),
            opts,
            mode: Mode::Idle,
            view: View::Welcome,
            pending: None,
        }
    }

    pub fn corpus(&self) -> &LogCorpus {
        &self.corpus
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Handles one input line.
    ///
    /// On error the view is left as it was and the session returns to idle
    /// (or stays in `AnalysisRunning` when the error is [`SessionError::Busy`]).
    pub fn submit(&mut self, input: &str) -> Result<Response, SessionError> {
        if self.mode == Mode::AnalysisRunning {
            // may bring the session back to idle
            self.poll();
        }
        match self.mode {
            Mode::AwaitingFilterInput => {
                self.mode = Mode::Idle;
                self.apply_filter(input.trim())
            }
            Mode::AwaitingGotoInput => {
                self.mode = Mode::Idle;
                self.apply_goto(input.trim())
            }
            Mode::AnalysisRunning => match input.parse::<Command>()? {
                Command::Quit => Ok(Response::Quit),
                _ => Err(SessionError::Busy),
            },
            Mode::Idle => {
                if input.trim().is_empty() {
                    return Ok(Response::Unchanged);
                }
                let command = input.parse::<Command>()?;
                self.dispatch(command)
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<Response, SessionError> {
        debug!(?command, "dispatch");
        match command {
            Command::List => self.show(View::All),
            Command::Filter(Some(expr)) => self.apply_filter(&expr),
            Command::Filter(None) => {
                self.mode = Mode::AwaitingFilterInput;
                Ok(Response::Prompt("filter regex"))
            }
            Command::Goto(Some(ts)) => self.apply_goto(&ts),
            Command::Goto(None) => {
                self.mode = Mode::AwaitingGotoInput;
                Ok(Response::Prompt("goto timestamp"))
            }
            Command::Stat => self.show(View::Statistics(stats::build_statistics(&self.corpus))),
            Command::Analyse => self.start_analysis(),
            Command::Help => self.show(View::Help),
            Command::Quit => Ok(Response::Quit),
        }
    }

    fn show(&mut self, view: View) -> Result<Response, SessionError> {
        self.view = view;
        Ok(Response::Updated)
    }

    fn apply_filter(&mut self, expr: &str) -> Result<Response, SessionError> {
        let result = self.corpus.filter(expr)?;
        debug!(pattern = expr, matches = result.len(), "filter applied");
        self.show(View::Filtered(result))
    }

    fn apply_goto(&mut self, input: &str) -> Result<Response, SessionError> {
        let from = query::goto(&self.corpus, input)?;
        self.show(View::Tail { from })
    }

    fn start_analysis(&mut self) -> Result<Response, SessionError> {
        let rx = Arc::clone(&self.registry).spawn(Arc::clone(&self.corpus), self.opts.clone());
        self.pending = Some(rx);
        self.mode = Mode::AnalysisRunning;
        self.view = View::Analysis(AnalysisReport::new());
        info!(lines = self.corpus.len(), "analysis started");
        Ok(Response::AnalysisStarted)
    }

    fn accept(&mut self, section: AnalysisSection) -> AnalysisKind {
        let kind = section.kind();
        if let View::Analysis(report) = &mut self.view {
            report.insert(section);
        }
        kind
    }

    fn finish_analysis(&mut self) {
        self.pending = None;
        self.mode = Mode::Idle;
        info!("analysis finished");
    }

    /// Collects sections that are already finished without blocking.
    pub fn poll(&mut self) -> Vec<AnalysisKind> {
        let mut arrived = Vec::new();
        loop {
            let next = match &self.pending {
                Some(rx) => rx.try_recv(),
                None => break,
            };
            match next {
                Ok(section) => arrived.push(self.accept(section)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finish_analysis();
                    break;
                }
            }
        }
        arrived
    }

    /// Blocks for the next section; `None` once the analysis has finished.
    pub fn next_section(&mut self) -> Option<AnalysisKind> {
        let next = self.pending.as_ref()?.recv();
        match next {
            Ok(section) => Some(self.accept(section)),
            Err(_) => {
                self.finish_analysis();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_inline_arguments() {
        assert_eq!("list".parse::<Command>().unwrap(), Command::List);
        assert_eq!("  EXIT ".parse::<Command>().unwrap(), Command::Quit);
        assert_eq!(
            "filter ERROR|WARN".parse::<Command>().unwrap(),
            Command::Filter(Some("ERROR|WARN".into()))
        );
        assert_eq!("goto".parse::<Command>().unwrap(), Command::Goto(None));
        assert!(matches!("dance".parse::<Command>(), Err(SessionError::UnknownCommand(_))));
    }
}
