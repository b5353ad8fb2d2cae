//! Cross-table lookups: find the row whose name column holds a value, then read another column
//! of the same row.
//!
//! SNMP tables share their row index across columns, so once the index of `/data` is known in
//! `dskPath` (`.1.3.6.1.4.1.2021.9.1.2.<index>`), its usage is at `dskPercent`
//! (`.1.3.6.1.4.1.2021.9.1.9.<index>`).

use std::fmt;

use tracing::{debug, warn};

use crate::oid::{Oid, OidError};
use crate::session::{SnmpSession, TableRow, TransportError};
use crate::value::{SnmpValue, ValueKindError};

#[derive(Debug, thiserror::Error)]
pub enum CorrelateError {
    #[error("no row matches \"{target}\"")]
    NotFound { target: String },
    #[error("no value found at {oid}")]
    EmptyResult { oid: Oid },
    #[error("total at {oid} is 0")]
    ZeroTotal { oid: Oid },
    #[error("unexpected value at {oid}: {source}")]
    Value {
        oid: Oid,
        #[source]
        source: ValueKindError,
    },
    #[error(transparent)]
    Oid(#[from] OidError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A numeric reading pulled from a single OID.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Integer(i64),
    Real(f64),
}

impl Metric {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Metric::Integer(n) => n as f64,
            Metric::Real(n) => n,
        }
    }
}

impl TryFrom<&SnmpValue> for Metric {
    type Error = ValueKindError;

    fn try_from(value: &SnmpValue) -> Result<Self, Self::Error> {
        match value.as_i64() {
            Ok(n) => Ok(Metric::Integer(n)),
            Err(_) => value.as_f64().map(Metric::Real),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Integer(n) => write!(f, "{}", n),
            Metric::Real(n) => write!(f, "{:.2}", n),
        }
    }
}

/// Returns the row index of the first row whose value equals `target`.
///
/// Stops pulling rows as soon as it has a match; the rest of `rows` is dropped, which cancels a
/// [`crate::TableWalk`].
pub fn find_row_index<I>(rows: I, target: &SnmpValue) -> Result<u32, CorrelateError>
where
    I: IntoIterator<Item = Result<TableRow, TransportError>>,
{
    for row in rows {
        let row = row?;
        if row.value != *target {
            continue;
        }
        match row.index() {
            Some(index) => {
                debug!(oid = %row.oid, index, "matched row");
                return Ok(index);
            }
            None => warn!(value = %row.value, "matching row has an empty OID, skipping"),
        }
    }
    Err(CorrelateError::NotFound {
        target: target.to_string(),
    })
}

/// Walks `base` and returns the index of the row holding `target`.
pub fn locate_row<S>(session: &mut S, base: &Oid, target: &SnmpValue) -> Result<u32, CorrelateError>
where
    S: SnmpSession + ?Sized,
{
    debug!(%base, %target, "searching table");
    let walk = session.walk(base)?;
    find_row_index(walk, target)
}

/// GETs `oid` and returns the first variable.
pub fn get_scalar<S>(session: &mut S, oid: &Oid) -> Result<SnmpValue, CorrelateError>
where
    S: SnmpSession + ?Sized,
{
    let bind = session
        .get(oid)?
        .into_iter()
        .next()
        .ok_or_else(|| CorrelateError::EmptyResult { oid: oid.clone() })?;
    debug!(%oid, value = %bind.value, "fetched");
    Ok(bind.value)
}

fn get_metric<S>(session: &mut S, oid: &Oid) -> Result<Metric, CorrelateError>
where
    S: SnmpSession + ?Sized,
{
    let value = get_scalar(session, oid)?;
    Metric::try_from(&value).map_err(|source| CorrelateError::Value {
        oid: oid.clone(),
        source,
    })
}

/// Finds the row of `target` below `base` and reads column `replacement` of that row, where the
/// column OID is `base` minus `trim` segments plus `replacement`.
pub fn fetch_correlated_value<S>(
    session: &mut S,
    base: &Oid,
    target: &SnmpValue,
    trim: usize,
    replacement: &str,
) -> Result<Metric, CorrelateError>
where
    S: SnmpSession + ?Sized,
{
    let index = locate_row(session, base, target)?;
    let oid = base.related(trim, replacement, index)?;
    get_metric(session, &oid)
}

/// Like [`fetch_correlated_value`] for two columns of the same row, returning
/// `part * 100 / total`.
pub fn fetch_percentage<S>(
    session: &mut S,
    base: &Oid,
    target: &SnmpValue,
    trim: usize,
    part_column: &str,
    total_column: &str,
) -> Result<f64, CorrelateError>
where
    S: SnmpSession + ?Sized,
{
    let index = locate_row(session, base, target)?;
    let total_oid = base.related(trim, total_column, index)?;
    let part_oid = base.related(trim, part_column, index)?;

    let total = get_metric(session, &total_oid)?;
    let part = get_metric(session, &part_oid)?;
    percent_of(part, total).ok_or(CorrelateError::ZeroTotal { oid: total_oid })
}

/// `part * 100 / total`, or `None` for a zero total.
pub fn percent_of(part: Metric, total: Metric) -> Option<f64> {
    let total = total.as_f64();
    if total == 0.0 {
        return None;
    }
    Some(part.as_f64() * 100.0 / total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::memory::MemoryAgent;

    const NAMES: &str = ".1.3.6.1.2.1.25.2.3.1.3";
    const SIZES: &str = ".1.3.6.1.2.1.25.2.3.1.5";
    const USED: &str = ".1.3.6.1.2.1.25.2.3.1.6";

    fn rows(items: &[(u32, &str)]) -> Vec<Result<TableRow, TransportError>> {
        let base: Oid = NAMES.parse().unwrap();
        items
            .iter()
            .map(|(index, name)| Ok(TableRow::new(base.child(*index), SnmpValue::from(*name))))
            .collect()
    }

    fn storage() -> MemoryAgent {
        MemoryAgent::new()
            .with_column(NAMES, [(1, "/boot"), (2, "/"), (5, "/data")])
            .with_column(SIZES, [(1, 100), (2, 1000), (5, 0)])
            .with_column(USED, [(1, 40), (2, 250), (5, 0)])
    }

    #[test]
    fn test_find_row_index() {
        let table = || rows(&[(1, "/boot"), (2, "/"), (5, "/data")]);
        assert_eq!(find_row_index(table(), &"/".into()).unwrap(), 2);
        assert_eq!(find_row_index(table(), &"/data".into()).unwrap(), 5);
        assert!(matches!(
            find_row_index(table(), &"/missing".into()),
            Err(CorrelateError::NotFound { target }) if target == "/missing"
        ));
    }

    #[test]
    fn test_first_match_wins() {
        let table = rows(&[(3, "/"), (4, "/")]);
        assert_eq!(find_row_index(table, &"/".into()).unwrap(), 3);
    }

    #[test]
    fn test_find_stops_consuming_after_match() {
        let mut pulled = 0;
        let table = rows(&[(1, "/boot"), (2, "/"), (5, "/data")]);
        let counting = table.into_iter().inspect(|_| pulled += 1);
        assert_eq!(find_row_index(counting, &"/".into()).unwrap(), 2);
        assert_eq!(pulled, 2);
    }

    #[test]
    fn test_find_propagates_transport_error() {
        let mut table = rows(&[(1, "/boot")]);
        table.push(Err(TransportError::Snmp("timeout".to_owned())));
        table.extend(rows(&[(2, "/")]));
        assert!(matches!(
            find_row_index(table, &"/".into()),
            Err(CorrelateError::Transport(TransportError::Snmp(_)))
        ));
    }

    #[test]
    fn test_walk_is_cancelled_after_match() {
        let mut agent = MemoryAgent::new()
            .with_column(NAMES, (1..=1000).map(|i| (i, format!("/mnt/{}", i))))
            .with_column(".1.3.6.1.2.1.25.2.3.1.4", (1..=1000).map(|i| (i, 4096)));
        let base: Oid = NAMES.parse().unwrap();

        assert_eq!(locate_row(&mut agent, &base, &"/mnt/3".into()).unwrap(), 3);
        assert!(
            agent.steps() <= 4,
            "walk kept going: {} rows",
            agent.steps()
        );
    }

    #[test]
    fn test_fetch_correlated_value() {
        let mut agent = storage();
        let base: Oid = NAMES.parse().unwrap();

        let size = fetch_correlated_value(&mut agent, &base, &"/".into(), 1, "5").unwrap();
        assert_eq!(size, Metric::Integer(1000));
        assert_eq!(
            agent.gets,
            vec![".1.3.6.1.2.1.25.2.3.1.5.2".parse().unwrap()]
        );

        let used = fetch_correlated_value(&mut agent, &base, &"/".into(), 1, ".6").unwrap();
        assert_eq!(used, Metric::Integer(250));
    }

    #[test]
    fn test_fetch_percentage() {
        let mut agent = storage();
        let base: Oid = NAMES.parse().unwrap();
        let percent = fetch_percentage(&mut agent, &base, &"/".into(), 1, "6", "5").unwrap();
        assert_eq!(percent, 25.0);

        let percent = fetch_percentage(&mut agent, &base, &"/boot".into(), 1, "6", "5").unwrap();
        assert_eq!(percent, 40.0);
    }

    #[test]
    fn test_zero_total() {
        let mut agent = storage();
        let base: Oid = NAMES.parse().unwrap();
        match fetch_percentage(&mut agent, &base, &"/data".into(), 1, "6", "5") {
            Err(CorrelateError::ZeroTotal { oid }) => {
                assert_eq!(oid.to_string(), ".1.3.6.1.2.1.25.2.3.1.5.5")
            }
            other => panic!("expected zero total, got {:?}", other),
        }
        assert_eq!(percent_of(Metric::Integer(5), Metric::Real(0.0)), None);
    }

    #[test]
    fn test_empty_result() {
        let mut agent = MemoryAgent::new().with_column(NAMES, [(7, "/var")]);
        let base: Oid = NAMES.parse().unwrap();
        match fetch_correlated_value(&mut agent, &base, &"/var".into(), 1, "5") {
            Err(CorrelateError::EmptyResult { oid }) => {
                assert_eq!(oid.to_string(), ".1.3.6.1.2.1.25.2.3.1.5.7")
            }
            other => panic!("expected empty result, got {:?}", other),
        }
    }

    #[test]
    fn test_not_found_skips_get() {
        let mut agent = storage();
        let base: Oid = NAMES.parse().unwrap();
        assert!(matches!(
            fetch_correlated_value(&mut agent, &base, &"/missing".into(), 1, "5"),
            Err(CorrelateError::NotFound { .. })
        ));
        assert!(agent.gets.is_empty());
    }

    #[test]
    fn test_non_numeric_column() {
        let mut agent = storage().with(".1.3.6.1.2.1.25.2.3.1.7.2", "oops");
        let base: Oid = NAMES.parse().unwrap();
        let err = fetch_correlated_value(&mut agent, &base, &"/".into(), 1, "7").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected value at .1.3.6.1.2.1.25.2.3.1.7.2: expected numeric value, got octet string"
        );
    }

    #[test]
    fn test_transport_error_passes_through() {
        let mut agent = storage().fail_gets("connection refused");
        let base: Oid = NAMES.parse().unwrap();
        let err = fetch_correlated_value(&mut agent, &base, &"/".into(), 1, "5").unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn test_metric_display() {
        assert_eq!(Metric::Integer(42).to_string(), "42");
        assert_eq!(Metric::Real(4.3211).to_string(), "4.32");
        assert_eq!(
            Metric::try_from(&SnmpValue::Counter64(u64::MAX))
                .unwrap()
                .as_f64(),
            u64::MAX as f64
        );
    }
}
