//! One check invocation: parse thresholds, look the mount up, judge the value, build the report.

use tracing::info;

use crate::config::{
    CheckConfig, CheckKind, TableLayout, DSK_PERCENT_COLUMN, DSK_PERCENT_NODE_COLUMN,
    HR_STORAGE_SIZE_COLUMN, HR_STORAGE_USED_COLUMN,
};
use crate::correlate::{fetch_correlated_value, fetch_percentage, CorrelateError, Metric};
use crate::oid::Oid;
use crate::session::{SnmpSession, TransportError};
use crate::threshold::{ThresholdError, Thresholds};
use crate::value::SnmpValue;
use crate::{PerfData, Report, State};

/// Everything that ends a check with an UNKNOWN state.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
    #[error("error connecting to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: TransportError,
    },
    #[error("couldn't find drive {mount} in {table}")]
    DriveNotFound { mount: String, table: Oid },
    #[error("drive {mount} reports a total size of 0 at {oid}")]
    ZeroTotal { mount: String, oid: Oid },
    #[error("error querying drive {mount}: {source}")]
    Query {
        mount: String,
        #[source]
        source: CorrelateError,
    },
    #[error("error walking {table}: {source}")]
    Walk {
        table: Oid,
        #[source]
        source: TransportError,
    },
}

impl CheckError {
    fn from_lookup(mount: &str, layout: &TableLayout, err: CorrelateError) -> CheckError {
        match err {
            CorrelateError::NotFound { .. } => CheckError::DriveNotFound {
                mount: mount.to_owned(),
                table: layout.names.clone(),
            },
            CorrelateError::ZeroTotal { oid } => CheckError::ZeroTotal {
                mount: mount.to_owned(),
                oid,
            },
            source => CheckError::Query {
                mount: mount.to_owned(),
                source,
            },
        }
    }
}

/// Runs the check described by `config` against `session`.
///
/// Thresholds are parsed before anything is sent to the agent.
pub fn run_check<S>(session: &mut S, config: &CheckConfig) -> Result<Report, CheckError>
where
    S: SnmpSession + ?Sized,
{
    let thresholds = Thresholds::parse(&config.warning, &config.critical)?;
    let layout = config.kind.layout();
    let target = SnmpValue::from(config.mount.as_str());
    let lookup = |err| CheckError::from_lookup(&config.mount, &layout, err);

    let value = match config.kind {
        CheckKind::Usage => fetch_percentage(
            session,
            &layout.names,
            &target,
            layout.trim,
            HR_STORAGE_USED_COLUMN,
            HR_STORAGE_SIZE_COLUMN,
        )
        .map(Metric::Real)
        .map_err(lookup)?,
        CheckKind::Disk => fetch_correlated_value(
            session,
            &layout.names,
            &target,
            layout.trim,
            DSK_PERCENT_COLUMN,
        )
        .map_err(lookup)?,
        CheckKind::Inodes => fetch_correlated_value(
            session,
            &layout.names,
            &target,
            layout.trim,
            DSK_PERCENT_NODE_COLUMN,
        )
        .map_err(lookup)?,
    };

    let verdict = thresholds.evaluate(value.as_f64());
    info!(mount = %config.mount, state = %verdict.state, "{}", verdict.message);

    let rendered = match value {
        Metric::Integer(n) => format!("{}%", n),
        Metric::Real(_) => value.to_string(),
    };
    let mut report = Report::new(verdict.state, &config.mount, &rendered);
    if config.perf_data {
        report = report.with_perf_data(
            PerfData::percentage(&config.mount, value).with_thresholds(&thresholds),
        );
    }
    Ok(report)
}

/// Every value in the name column of `layout`, in walk order.
pub fn list_names<S>(session: &mut S, layout: &TableLayout) -> Result<Vec<String>, CheckError>
where
    S: SnmpSession + ?Sized,
{
    let walk_error = |source| CheckError::Walk {
        table: layout.names.clone(),
        source,
    };
    session
        .walk(&layout.names)
        .map_err(walk_error)?
        .map(|row| row.map(|row| row.value.to_string()).map_err(walk_error))
        .collect()
}

/// An OK report naming the walked column, with one long-output line per name.
pub fn list_report<S>(session: &mut S, layout: &TableLayout) -> Result<Report, CheckError>
where
    S: SnmpSession + ?Sized,
{
    let names = list_names(session, layout)?;
    let context = format!("{} entries in", names.len());
    let report = Report::new(State::Ok, &context, &layout.names.to_string());
    Ok(report.with_long_output(names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DSK_PATH, HR_STORAGE_DESCR};
    use crate::session::memory::MemoryAgent;

    const HR_NAMES: &str = ".1.3.6.1.2.1.25.2.3.1.3";
    const HR_SIZE: &str = ".1.3.6.1.2.1.25.2.3.1.5";
    const HR_USED: &str = ".1.3.6.1.2.1.25.2.3.1.6";
    const DSK_NAMES: &str = ".1.3.6.1.4.1.2021.9.1.2";
    const DSK_PERCENT: &str = ".1.3.6.1.4.1.2021.9.1.9";
    const DSK_PERCENT_NODE: &str = ".1.3.6.1.4.1.2021.9.1.10";

    fn host() -> MemoryAgent {
        let descriptions = [(1, "Memory"), (31, "/"), (36, "/data"), (40, "/empty")];
        MemoryAgent::new()
            .with_column(HR_NAMES, descriptions)
            .with_column(HR_SIZE, [(1, 8000), (31, 1000), (36, 10000), (40, 0)])
            .with_column(HR_USED, [(1, 4000), (31, 250), (36, 9568), (40, 0)])
            .with_column(DSK_NAMES, [(1, "/"), (2, "/var")])
            .with_column(DSK_PERCENT, [(1, 42), (2, 93)])
            .with_column(DSK_PERCENT_NODE, [(1, 3), (2, 85)])
    }

    fn config(kind: CheckKind, mount: &str) -> CheckConfig {
        let mut config = CheckConfig::new("localhost", kind);
        config.mount = mount.to_owned();
        config
    }

    #[test]
    fn test_usage() {
        let report = run_check(&mut host(), &config(CheckKind::Usage, "/")).unwrap();
        assert_eq!(&report.to_nagios_string(), "OK: / 25.00");

        let report = run_check(&mut host(), &config(CheckKind::Usage, "/data")).unwrap();
        assert_eq!(&report.to_nagios_string(), "CRITICAL: /data 95.68");
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn test_disk_and_inodes() {
        let report = run_check(&mut host(), &config(CheckKind::Disk, "/")).unwrap();
        assert_eq!(&report.to_nagios_string(), "OK: / 42%");

        let report = run_check(&mut host(), &config(CheckKind::Disk, "/var")).unwrap();
        assert_eq!(&report.to_nagios_string(), "CRITICAL: /var 93%");

        let report = run_check(&mut host(), &config(CheckKind::Inodes, "/var")).unwrap();
        assert_eq!(&report.to_nagios_string(), "WARNING: /var 85%");
        assert_eq!(report.state(), State::Warning);
    }

    #[test]
    fn test_custom_thresholds() {
        let mut config = config(CheckKind::Usage, "/");
        config.warning = "30:".to_owned();
        config.critical = "20:".to_owned();
        let report = run_check(&mut host(), &config).unwrap();
        assert_eq!(&report.to_nagios_string(), "WARNING: / 25.00");
    }

    #[test]
    fn test_bad_threshold_skips_queries() {
        let mut agent = host();
        let mut config = config(CheckKind::Usage, "/");
        config.critical = "90:10".to_owned();
        let err = run_check(&mut agent, &config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "error parsing critical threshold \"90:10\": lower bound 90 is greater than upper bound 10"
        );
        assert_eq!(agent.steps(), 0);
        assert!(agent.gets.is_empty());
    }

    #[test]
    fn test_drive_not_found() {
        let err = run_check(&mut host(), &config(CheckKind::Usage, "/missing")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "couldn't find drive /missing in .1.3.6.1.2.1.25.2.3.1.3"
        );
    }

    #[test]
    fn test_zero_total_is_an_error() {
        let err = run_check(&mut host(), &config(CheckKind::Usage, "/empty")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "drive /empty reports a total size of 0 at .1.3.6.1.2.1.25.2.3.1.5.40"
        );
    }

    #[test]
    fn test_transport_error_is_included() {
        let mut agent = host().fail_walk_after(0, "request timed out");
        let err = run_check(&mut agent, &config(CheckKind::Disk, "/")).unwrap_err();
        assert_eq!(err.to_string(), "error querying drive /: request timed out");
    }

    #[test]
    fn test_perf_data() {
        let mut config = config(CheckKind::Disk, "/");
        config.perf_data = true;
        let report = run_check(&mut host(), &config).unwrap();
        assert_eq!(
            &report.to_nagios_string(),
            "OK: / 42% | /=42%;~:80;~:90;0;100"
        );
    }

    #[test]
    fn test_list_names() {
        let names = list_names(&mut host(), &TableLayout::ucd_disk()).unwrap();
        assert_eq!(names, vec!["/", "/var"]);

        let names = list_names(&mut host(), &TableLayout::host_resources()).unwrap();
        assert_eq!(names, vec!["Memory", "/", "/data", "/empty"]);

        assert_eq!(TableLayout::ucd_disk().names, Oid::from(DSK_PATH));
        assert_eq!(
            TableLayout::host_resources().names,
            Oid::from(HR_STORAGE_DESCR)
        );
    }

    #[test]
    fn test_list_report() {
        let report = list_report(&mut host(), &TableLayout::ucd_disk()).unwrap();
        assert_eq!(report.state(), State::Ok);
        assert_eq!(
            report.to_nagios_string(),
            "OK: 2 entries in .1.3.6.1.4.1.2021.9.1.2\n/\n/var"
        );
    }

    #[test]
    fn test_list_walk_error() {
        let mut agent = host().fail_walk_after(1, "request timed out");
        let err = list_names(&mut agent, &TableLayout::ucd_disk()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "error walking .1.3.6.1.4.1.2021.9.1.2: request timed out"
        );
    }
}
