//! The two capabilities the checks need from an SNMP agent, and the cancellable table walk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel as channel;
use tracing::{debug, trace};

use crate::oid::Oid;
use crate::value::SnmpValue;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Snmp(String),
    #[error("agent returned error status {status} (index {index})")]
    Agent { status: u32, index: u32 },
    #[error("table walk producer panicked")]
    ProducerPanicked,
}

/// One row of a table walk: the full OID of the cell and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub oid: Oid,
    pub value: SnmpValue,
}

impl TableRow {
    pub fn new(oid: Oid, value: SnmpValue) -> TableRow {
        TableRow { oid, value }
    }

    /// The row index, i.e. the terminal segment of the cell OID.
    pub fn index(&self) -> Option<u32> {
        self.oid.last()
    }
}

/// A single variable binding of a GET response.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: SnmpValue,
}

/// Access to an SNMP agent.
pub trait SnmpSession {
    /// Starts walking the subtree below `base`. Rows arrive in OID order; dropping the returned
    /// walk stops it.
    fn walk(&mut self, base: &Oid) -> Result<TableWalk, TransportError>;

    /// Fetches a single OID. An empty result is not an error.
    fn get(&mut self, oid: &Oid) -> Result<Vec<VarBind>, TransportError>;
}

type WalkItem = Result<TableRow, TransportError>;

/// A table walk running on a producer thread.
///
/// Rows are handed over through a rendezvous channel, so the producer is never more than one
/// request ahead of the consumer. Dropping the walk (or calling [`TableWalk::cancel`]) flags the
/// producer, disconnects the channel and joins the thread.
pub struct TableWalk {
    rows: Option<channel::Receiver<WalkItem>>,
    cancelled: Arc<AtomicBool>,
    producer: Option<thread::JoinHandle<()>>,
}

impl TableWalk {
    /// Spawns a producer calling `next_row` until it returns `Ok(None)`, an error, or the walk
    /// is cancelled.
    pub fn spawn<F>(base: &Oid, mut next_row: F) -> Result<TableWalk, TransportError>
    where
        F: FnMut() -> Result<Option<TableRow>, TransportError> + Send + 'static,
    {
        let (tx, rx) = channel::bounded::<WalkItem>(0);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let base = base.clone();

        let producer = thread::Builder::new()
            .name("snmp-walk".to_owned())
            .spawn(move || {
                let mut steps = 0usize;
                while !flag.load(Ordering::Acquire) {
                    let item = match next_row() {
                        Ok(Some(row)) => Ok(row),
                        Ok(None) => {
                            debug!(%base, steps, "walk finished");
                            return;
                        }
                        Err(err) => Err(err),
                    };
                    let failed = item.is_err();
                    if tx.send(item).is_err() {
                        break;
                    }
                    if failed {
                        return;
                    }
                    steps += 1;
                    trace!(%base, steps, "row delivered");
                }
                debug!(%base, steps, "walk abandoned by consumer");
            })?;

        Ok(TableWalk {
            rows: Some(rx),
            cancelled,
            producer: Some(producer),
        })
    }

    /// Stops the producer and waits for it to exit.
    pub fn cancel(mut self) {
        let _ = self.shutdown();
    }

    fn shutdown(&mut self) -> thread::Result<()> {
        self.cancelled.store(true, Ordering::Release);
        drop(self.rows.take());
        match self.producer.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

impl Iterator for TableWalk {
    type Item = WalkItem;

    fn next(&mut self) -> Option<Self::Item> {
        let rows = self.rows.as_ref()?;
        match rows.recv() {
            Ok(item) => Some(item),
            // Disconnected: the producer has finished. A panic must not pass for a short table.
            Err(_) => match self.shutdown() {
                Ok(()) => None,
                Err(_) => Some(Err(TransportError::ProducerPanicked)),
            },
        }
    }
}

impl Drop for TableWalk {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// An in-process agent backed by a sorted map, for tests.
#[cfg(test)]
pub(crate) mod memory {
    use std::collections::BTreeMap;
    use std::ops::Bound;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{SnmpSession, TableRow, TableWalk, TransportError, VarBind};
    use crate::oid::Oid;
    use crate::value::SnmpValue;

    #[derive(Default)]
    pub(crate) struct MemoryAgent {
        tree: BTreeMap<Oid, SnmpValue>,
        steps: Arc<AtomicUsize>,
        walk_failure: Option<(usize, String)>,
        get_failure: Option<String>,
        pub(crate) gets: Vec<Oid>,
    }

    impl MemoryAgent {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with(mut self, oid: &str, value: impl Into<SnmpValue>) -> Self {
            self.tree.insert(oid.parse().unwrap(), value.into());
            self
        }

        /// Fill one column: `base.<index> = value` for each row.
        pub(crate) fn with_column<V: Into<SnmpValue>>(
            mut self,
            base: &str,
            rows: impl IntoIterator<Item = (u32, V)>,
        ) -> Self {
            let base: Oid = base.parse().unwrap();
            for (index, value) in rows {
                self.tree.insert(base.child(index), value.into());
            }
            self
        }

        /// Make walks fail once `rows` rows have been produced.
        pub(crate) fn fail_walk_after(mut self, rows: usize, message: &str) -> Self {
            self.walk_failure = Some((rows, message.to_owned()));
            self
        }

        pub(crate) fn fail_gets(mut self, message: &str) -> Self {
            self.get_failure = Some(message.to_owned());
            self
        }

        /// Rows produced by all walks so far.
        pub(crate) fn steps(&self) -> usize {
            self.steps.load(Ordering::SeqCst)
        }
    }

    impl SnmpSession for MemoryAgent {
        fn walk(&mut self, base: &Oid) -> Result<TableWalk, TransportError> {
            let tree = Arc::new(self.tree.clone());
            let steps = Arc::clone(&self.steps);
            let failure = self.walk_failure.clone();
            let subtree = base.clone();
            let mut cursor = base.clone();
            let mut produced = 0usize;

            TableWalk::spawn(base, move || {
                if let Some((after, message)) = &failure {
                    if produced >= *after {
                        return Err(TransportError::Snmp(message.clone()));
                    }
                }
                let next = tree
                    .range::<Oid, _>((Bound::Excluded(&cursor), Bound::Unbounded))
                    .next()
                    .map(|(oid, value)| (oid.clone(), value.clone()));
                match next {
                    Some((oid, value)) if oid.is_below(&subtree) => {
                        cursor = oid.clone();
                        produced += 1;
                        steps.fetch_add(1, Ordering::SeqCst);
                        Ok(Some(TableRow::new(oid, value)))
                    }
                    _ => Ok(None),
                }
            })
        }

        fn get(&mut self, oid: &Oid) -> Result<Vec<VarBind>, TransportError> {
            if let Some(message) = &self.get_failure {
                return Err(TransportError::Snmp(message.clone()));
            }
            self.gets.push(oid.clone());
            Ok(self
                .tree
                .get(oid)
                .map(|value| VarBind {
                    oid: oid.clone(),
                    value: value.clone(),
                })
                .into_iter()
                .collect())
        }
    }
}
