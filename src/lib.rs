//! The snmpdisk crate checks disk and inode usage of a remote host over SNMP and reports the
//! result the way Nagios and Icinga expect from a check plugin.
//!
//! The building blocks are usable on their own:
//!
//! * [`RangeSpec`] parses and evaluates threshold ranges like `~:80` or `@10:20`.
//! * [`correlate`] finds a row in one SNMP table column and reads the same row of another.
//! * [`check`] runs one complete check against any [`SnmpSession`].
//!
//! ```rust
//! # use snmpdisk::{evaluate, Report, State};
//! let verdict = evaluate("~:80", "~:90", 84.5);
//! assert_eq!(verdict.state, State::Warning);
//!
//! let report = Report::new(verdict.state, "/data", "84.50");
//! assert_eq!(&report.to_nagios_string(), "WARNING: /data 84.50");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::process;

#[macro_use]
mod macros;

pub mod check;
pub mod config;
#[cfg(feature = "clap")]
pub mod config_generator;
pub mod correlate;
pub mod oid;
pub mod range;
pub mod runner;
pub mod session;
pub mod threshold;
#[cfg(feature = "snmp")]
pub mod transport;
pub mod value;

pub use crate::check::{list_names, list_report, run_check, CheckError};
pub use crate::config::{CheckConfig, CheckKind, TableLayout};
pub use crate::correlate::{
    fetch_correlated_value, fetch_percentage, find_row_index, CorrelateError, Metric,
};
pub use crate::oid::{Oid, OidError};
pub use crate::range::{RangeParseError, RangeSpec};
pub use crate::runner::{Runner, RunnerResult};
pub use crate::session::{SnmpSession, TableRow, TableWalk, TransportError, VarBind};
pub use crate::threshold::{evaluate, ThresholdError, ThresholdKind, Thresholds, Verdict};
pub use crate::value::{SnmpValue, ValueKindError};

/// Represents a service state from nagios.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl State {
    /// Returns the corresponding nagios exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            State::Ok => 0,
            State::Warning => 1,
            State::Critical => 2,
            State::Unknown => 3,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Ok => "OK",
            State::Warning => "WARNING",
            State::Critical => "CRITICAL",
            State::Unknown => "UNKNOWN",
        })
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &State) -> Option<Ordering> {
        let f = |state: &State| match state {
            State::Unknown => 0,
            State::Ok => 1,
            State::Warning => 2,
            State::Critical => 3,
        };

        f(self).partial_cmp(&f(other))
    }
}

/// Performance data attached to a report, e.g. `/data=84.50%;~:80;~:90;0;100`.
#[derive(Clone, Debug, PartialEq)]
pub struct PerfData {
    label: String,
    value: Metric,
    unit: &'static str,
    warning: Option<RangeSpec>,
    critical: Option<RangeSpec>,
    min: Option<f64>,
    max: Option<f64>,
}

impl PerfData {
    pub fn new(label: &str, value: Metric) -> Self {
        PerfData {
            label: label.to_owned(),
            value,
            unit: "",
            warning: None,
            critical: None,
            min: None,
            max: None,
        }
    }

    /// A percentage bounded by 0 and 100.
    pub fn percentage(label: &str, value: Metric) -> Self {
        PerfData {
            unit: "%",
            min: Some(0.0),
            max: Some(100.0),
            ..PerfData::new(label, value)
        }
    }

    pub fn with_thresholds(mut self, thresholds: &Thresholds) -> Self {
        self.warning = Some(thresholds.warning);
        self.critical = Some(thresholds.critical);
        self
    }

    pub fn perf_string(&self) -> String {
        // replace `=`
        let label = self.label.replace('=', "_");

        // quote `'`
        let label = label.replace('\'', "''");

        // quote if contains spaces
        let label = if label.contains(' ') {
            format!("'{}'", label)
        } else {
            label
        };

        let render = |v: &Option<RangeSpec>| v.map(|r| r.to_string()).unwrap_or_default();
        let number = |v: &Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();

        perf_string!(
            label,
            format!("{}{}", self.value, self.unit),
            render(&self.warning),
            render(&self.critical),
            number(&self.min),
            number(&self.max)
        )
    }
}

/// The single line a check plugin prints, plus its exit code.
///
/// ```rust
/// # use snmpdisk::{Report, State};
/// let report = Report::new(State::Critical, "/data", "4.32");
/// assert_eq!(&report.to_nagios_string(), "CRITICAL: /data 4.32");
/// assert_eq!(report.exit_code(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    state: State,
    context: String,
    value: String,
    perf_data: Option<PerfData>,
    long_output: Vec<String>,
}

impl Report {
    pub fn new(state: State, context: &str, value: &str) -> Report {
        Report {
            state,
            context: context.to_owned(),
            value: value.to_owned(),
            perf_data: None,
            long_output: Vec::new(),
        }
    }

    /// A report carrying only a message, e.g. for errors.
    pub fn message(state: State, message: &str) -> Report {
        Report::new(state, message, "")
    }

    pub fn with_perf_data(mut self, perf_data: PerfData) -> Report {
        self.perf_data = Some(perf_data);
        self
    }

    /// Lines printed below the status line.
    pub fn with_long_output(mut self, lines: Vec<String>) -> Report {
        self.long_output = lines;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Returns `"<STATE>: <context> <value>"`, followed by ` | <perfdata>` if present.
    pub fn to_nagios_string(&self) -> String {
        let mut s = format!("{}: {}", self.state, self.context);

        if !self.value.is_empty() {
            s.push_str(&format!(" {}", self.value));
        }

        if let Some(ref perf_data) = self.perf_data {
            s.push_str(&format!(" | {}", perf_data.perf_string()));
        }

        for line in &self.long_output {
            s.push('\n');
            s.push_str(line);
        }

        s
    }

    pub fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }

    /// Will print Self::to_nagios_string and exit with the exit code from Self::exit_code
    pub fn print_and_exit(&self) -> ! {
        println!("{}", self.to_nagios_string());
        process::exit(self.exit_code());
    }
}
