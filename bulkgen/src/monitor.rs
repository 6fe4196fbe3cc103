//! Collecting progress events from the workers and reporting them to the user.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::event::{ProgressEvent, WorkerId};
use crate::log::{Log, LogExt};
use crate::progress::ProgressTracker;
use crate::size::{FileLen, Throughput};

/// What a worker is doing, as far as the monitor knows.
#[derive(Debug)]
struct WorkerState {
    path: PathBuf,
    len: FileLen,
    written: FileLen,
    speed: Throughput,
}

/// Final counters of a monitor run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonitorSummary {
    pub completed_files: usize,
    pub completed_len: FileLen,
    pub failed_files: usize,
    pub elapsed: Duration,
}

/// Consumes events of all workers and keeps overall statistics.
/// Errors are reported but never stop the monitor.
pub struct Monitor {
    total_files: usize,
    total_len: FileLen,
    workers: HashMap<WorkerId, WorkerState>,
    completed_files: usize,
    completed_len: FileLen,
    failed_files: usize,
    start: Instant,
    progress: Arc<dyn ProgressTracker>,
}

impl Monitor {
    pub fn new(
        total_files: usize,
        total_len: FileLen,
        progress: Arc<dyn ProgressTracker>,
    ) -> Monitor {
        Monitor {
            total_files,
            total_len,
            workers: HashMap::new(),
            completed_files: 0,
            completed_len: FileLen::ZERO,
            failed_files: 0,
            start: Instant::now(),
            progress,
        }
    }

    /// Percentage of the total size written by completed files.
    pub fn percent(&self) -> f64 {
        self.completed_len.percent_of(self.total_len)
    }

    pub fn completed_files(&self) -> usize {
        self.completed_files
    }

    pub fn is_done(&self) -> bool {
        self.completed_files >= self.total_files
    }

    /// Average rate of completed data since the monitor was created.
    pub fn throughput(&self) -> Throughput {
        Throughput::new(self.completed_len, self.start.elapsed())
    }

    /// Moves the progress bar by the bytes the worker wrote since its last event.
    fn advance(&mut self, worker: WorkerId, written: FileLen) {
        if let Some(state) = self.workers.get_mut(&worker) {
            let delta = written.saturating_sub(state.written);
            state.written = state.written.max(written);
            self.progress.inc(delta.0);
        } else {
            self.progress.inc(written.0);
        }
    }

    pub fn handle(&mut self, event: ProgressEvent, log: &dyn Log) {
        match event {
            ProgressEvent::Started { worker, path, len } => {
                log.info(format!(
                    "Worker {:>3} started {} ({})",
                    worker,
                    path.display(),
                    len
                ));
                self.workers.insert(
                    worker,
                    WorkerState {
                        path,
                        len,
                        written: FileLen::ZERO,
                        speed: Throughput::default(),
                    },
                );
            }
            ProgressEvent::Progress {
                worker,
                path,
                written,
                len,
                speed,
                ..
            } => {
                self.advance(worker, written);
                let state = self.workers.entry(worker).or_insert_with(|| WorkerState {
                    path,
                    len,
                    written,
                    speed,
                });
                state.speed = speed;
                log.info(format!(
                    "Worker {:>3}: {} - {:5.1}% ({:>10} / {:>10}) - {:>12}",
                    worker,
                    state.path.display(),
                    state.written.percent_of(state.len),
                    state.written,
                    state.len,
                    state.speed
                ));
            }
            ProgressEvent::Completed {
                worker,
                path,
                len,
                elapsed,
                speed,
            } => {
                self.advance(worker, len);
                self.workers.remove(&worker);
                self.completed_files += 1;
                self.completed_len += len;
                log.info(format!(
                    "Worker {:>3} finished {} in {:.2} s, {}",
                    worker,
                    path.display(),
                    elapsed.as_secs_f64(),
                    speed
                ));
                log.info(format!(
                    "Overall progress: {:5.1}% ({} / {}) - {}/h - completed {:4}/{:4} files",
                    self.percent(),
                    self.completed_len,
                    self.total_len,
                    self.throughput().per_hour(),
                    self.completed_files,
                    self.total_files
                ));
            }
            ProgressEvent::Error {
                worker, message, ..
            } => {
                self.workers.remove(&worker);
                self.failed_files += 1;
                log.err(format!("Worker {:>3}: {}", worker, message));
            }
        }
    }

    /// Processes events until all files are completed or all senders are gone.
    pub fn run(mut self, events: Receiver<ProgressEvent>, log: &dyn Log) -> MonitorSummary {
        while !self.is_done() {
            match events.recv() {
                Ok(event) => self.handle(event, log),
                Err(_) => break,
            }
        }
        self.summary()
    }

    pub fn summary(&self) -> MonitorSummary {
        MonitorSummary {
            completed_files: self.completed_files,
            completed_len: self.completed_len,
            failed_files: self.failed_files,
            elapsed: self.start.elapsed(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::log::test::MemLog;
    use crate::log::LogLevel;
    use crate::progress::ProgressBar;
    use std::sync::mpsc::channel;

    fn started(worker: usize, path: &str, len: u64) -> ProgressEvent {
        ProgressEvent::Started {
            worker: WorkerId(worker),
            path: PathBuf::from(path),
            len: FileLen(len),
        }
    }

    fn progress(worker: usize, path: &str, written: u64, len: u64) -> ProgressEvent {
        ProgressEvent::Progress {
            worker: WorkerId(worker),
            path: PathBuf::from(path),
            written: FileLen(written),
            len: FileLen(len),
            elapsed: Duration::from_secs(5),
            speed: Throughput::new(FileLen(written), Duration::from_secs(5)),
        }
    }

    fn completed(worker: usize, path: &str, len: u64) -> ProgressEvent {
        ProgressEvent::Completed {
            worker: WorkerId(worker),
            path: PathBuf::from(path),
            len: FileLen(len),
            elapsed: Duration::from_secs(1),
            speed: Throughput::new(FileLen(len), Duration::from_secs(1)),
        }
    }

    fn error(worker: usize, path: &str) -> ProgressEvent {
        ProgressEvent::Error {
            worker: WorkerId(worker),
            path: PathBuf::from(path),
            message: format!("Failed to create {path}: Permission denied"),
        }
    }

    #[test]
    fn percent_reaches_100_after_all_completed() {
        let log = MemLog::default();
        let pb = Arc::new(ProgressBar::new_hidden());
        let mut monitor = Monitor::new(2, FileLen(400), pb.clone());

        monitor.handle(started(0, "a.bin", 100), &log);
        monitor.handle(started(1, "b.bin", 300), &log);
        monitor.handle(progress(1, "b.bin", 150, 300), &log);
        assert_eq!(monitor.percent(), 0.0);
        assert_eq!(pb.position(), 150);

        monitor.handle(completed(0, "a.bin", 100), &log);
        assert_eq!(monitor.percent(), 25.0);
        assert!(!monitor.is_done());

        monitor.handle(completed(1, "b.bin", 300), &log);
        assert_eq!(monitor.percent(), 100.0);
        assert!(monitor.is_done());
        assert_eq!(monitor.completed_files(), 2);
        assert_eq!(pb.position(), 400);
        assert!(log.contains("completed    2/   2 files"));
    }

    #[test]
    fn error_does_not_count_as_completed() {
        let log = MemLog::default();
        let mut monitor = Monitor::new(2, FileLen(200), Arc::new(ProgressBar::new_hidden()));

        monitor.handle(started(0, "a.bin", 100), &log);
        monitor.handle(error(0, "a.bin"), &log);
        monitor.handle(started(0, "b.bin", 100), &log);
        monitor.handle(completed(0, "b.bin", 100), &log);

        let summary = monitor.summary();
        assert_eq!(summary.completed_files, 1);
        assert_eq!(summary.failed_files, 1);
        assert_eq!(summary.completed_len, FileLen(100));
        assert_eq!(monitor.percent(), 50.0);
        assert_eq!(log.count(LogLevel::Error), 1);
        assert!(log.contains("Permission denied"));
    }

    #[test]
    fn run_stops_when_all_files_completed() {
        let log = MemLog::default();
        let (tx, rx) = channel();
        tx.send(started(0, "a.bin", 10)).unwrap();
        tx.send(completed(0, "a.bin", 10)).unwrap();
        // the sender is kept alive, so only the completed count can end the loop
        let monitor = Monitor::new(1, FileLen(10), Arc::new(ProgressBar::new_hidden()));
        let summary = monitor.run(rx, &log);
        assert_eq!(summary.completed_files, 1);
        drop(tx);
    }

    #[test]
    fn run_stops_when_senders_hang_up() {
        let log = MemLog::default();
        let (tx, rx) = channel();
        tx.send(started(0, "a.bin", 10)).unwrap();
        tx.send(error(0, "a.bin")).unwrap();
        tx.send(started(1, "b.bin", 10)).unwrap();
        tx.send(completed(1, "b.bin", 10)).unwrap();
        drop(tx);
        let monitor = Monitor::new(2, FileLen(20), Arc::new(ProgressBar::new_hidden()));
        let summary = monitor.run(rx, &log);
        assert_eq!(summary.completed_files, 1);
        assert_eq!(summary.failed_files, 1);
    }

    #[test]
    fn events_of_different_workers_may_interleave() {
        let log = MemLog::default();
        let mut monitor = Monitor::new(3, FileLen(30), Arc::new(ProgressBar::new_hidden()));
        monitor.handle(started(0, "a.bin", 10), &log);
        monitor.handle(started(1, "b.bin", 10), &log);
        monitor.handle(completed(1, "b.bin", 10), &log);
        monitor.handle(started(1, "c.bin", 10), &log);
        monitor.handle(completed(0, "a.bin", 10), &log);
        monitor.handle(completed(1, "c.bin", 10), &log);
        assert!(monitor.is_done());
        assert_eq!(monitor.percent(), 100.0);
    }
}
