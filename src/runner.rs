use std::fmt::Display;

use crate::{Report, State};

/// Runs a check and turns its error, if any, into a state and message.
pub struct Runner<E> {
    on_error: Option<Box<dyn FnOnce(&E) -> (State, String)>>,
}

impl<E: Display> Runner<E> {
    pub fn new() -> Self {
        Self { on_error: None }
    }

    pub fn on_error(mut self, f: impl FnOnce(&E) -> (State, String) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// This will run either the default `on_error` handler or the one specified by calling
    /// [Runner::on_error]. Without a handler an error is reported as [State::Unknown] with the
    /// error's message.
    pub fn safe_run(self, f: impl FnOnce() -> Result<Report, E>) -> RunnerResult {
        match f() {
            Ok(report) => RunnerResult::Ok(report),
            Err(err) => {
                let (state, msg) = self
                    .on_error
                    .map(|f| f(&err))
                    .unwrap_or_else(|| (State::Unknown, err.to_string()));

                RunnerResult::Err(state, msg)
            }
        }
    }
}

impl<E: Display> Default for Runner<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub enum RunnerResult {
    Ok(Report),
    Err(State, String),
}

impl RunnerResult {
    pub fn into_report(self) -> Report {
        match self {
            RunnerResult::Ok(report) => report,
            RunnerResult::Err(state, msg) => Report::message(state, &msg),
        }
    }

    pub fn print_and_exit(self) -> ! {
        self.into_report().print_and_exit()
    }
}
