use std::fmt;

use crate::range::{RangeParseError, RangeSpec};
use crate::State;

/// Which of the two thresholds a range belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    Warning,
    Critical,
}

impl fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdKind::Warning => f.write_str("warning"),
            ThresholdKind::Critical => f.write_str("critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("error parsing {kind} threshold \"{text}\": {source}")]
pub struct ThresholdError {
    pub kind: ThresholdKind,
    pub text: String,
    #[source]
    pub source: RangeParseError,
}

/// The warning/critical pair a value is judged against.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub warning: RangeSpec,
    pub critical: RangeSpec,
}

impl Thresholds {
    /// Parses both ranges. The critical text is looked at first, so with two broken ranges the
    /// error names the critical one.
    pub fn parse(warning: &str, critical: &str) -> Result<Thresholds, ThresholdError> {
        let critical = parse_one(ThresholdKind::Critical, critical)?;
        let warning = parse_one(ThresholdKind::Warning, warning)?;
        Ok(Thresholds { warning, critical })
    }

    /// Critical wins over warning; a value neither range alarms on is OK.
    pub fn state_for(&self, value: f64) -> State {
        if self.critical.triggers(value) {
            State::Critical
        } else if self.warning.triggers(value) {
            State::Warning
        } else {
            State::Ok
        }
    }

    pub fn evaluate(&self, value: f64) -> Verdict {
        let state = self.state_for(value);
        let message = match state {
            State::Critical => format!("{} alarms on critical range {}", value, self.critical),
            State::Warning => format!("{} alarms on warning range {}", value, self.warning),
            _ => format!("{} is within thresholds", value),
        };
        Verdict { state, message }
    }
}

fn parse_one(kind: ThresholdKind, text: &str) -> Result<RangeSpec, ThresholdError> {
    text.parse().map_err(|source| ThresholdError {
        kind,
        text: text.to_owned(),
        source,
    })
}

/// Outcome of judging one value.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub state: State,
    pub message: String,
}

/// Parses both threshold texts and judges `value` against them.
///
/// A threshold that does not parse yields `State::Unknown` with the parse error as message,
/// without looking at the value.
///
/// ```rust
/// # use snmpdisk::{evaluate, State};
/// assert_eq!(evaluate("80", "90", 95.0).state, State::Critical);
/// assert_eq!(evaluate("80", "90", 85.0).state, State::Warning);
/// assert_eq!(evaluate("80", "90", 50.0).state, State::Ok);
/// assert_eq!(evaluate("80", "90:10", 50.0).state, State::Unknown);
/// ```
pub fn evaluate(warning: &str, critical: &str, value: f64) -> Verdict {
    match Thresholds::parse(warning, critical) {
        Ok(thresholds) => thresholds.evaluate(value),
        Err(err) => Verdict {
            state: State::Unknown,
            message: err.to_string(),
        },
    }
}
