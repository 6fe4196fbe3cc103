//! Messages sent from the workers to the monitor.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use crate::size::{FileLen, Throughput};

/// Identifies the worker thread that sent an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub usize);

impl WorkerId {
    /// Returns the id of the pool thread calling this function,
    /// or 0 when called from outside a thread pool.
    pub fn current() -> WorkerId {
        WorkerId(rayon::current_thread_index().unwrap_or(0))
    }
}

impl Display for WorkerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(format!("#{}", self.0).as_str())
    }
}

/// A state change of a worker writing a file.
/// Events of a single worker are delivered in the order they were sent:
/// `Started`, any number of `Progress`, then `Completed` or `Error`.
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    Started {
        worker: WorkerId,
        path: PathBuf,
        len: FileLen,
    },
    Progress {
        worker: WorkerId,
        path: PathBuf,
        written: FileLen,
        len: FileLen,
        elapsed: Duration,
        speed: Throughput,
    },
    Completed {
        worker: WorkerId,
        path: PathBuf,
        len: FileLen,
        elapsed: Duration,
        speed: Throughput,
    },
    Error {
        worker: WorkerId,
        path: PathBuf,
        message: String,
    },
}
