//! Logging and progress reporting.

use std::fmt::Display;
use std::sync::{Arc, Mutex, Weak};

use chrono::Local;
use console::style;

use crate::progress::{ProgressBar, ProgressTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Common interface for logging diagnostics and progress.
pub trait Log: Sync + Send {
    /// Clears any previous progress bar and installs a new progress bar
    /// expecting `len` bytes of work.
    fn progress_bar(&self, msg: &str, len: u64) -> Arc<dyn ProgressTracker>;

    /// Logs a message.
    fn log(&self, level: LogLevel, msg: String);
}

/// Additional convenience methods for logging.
pub trait LogExt {
    /// Logs an info message.
    fn info(&self, msg: impl Display);
    /// Logs an warning.
    fn warn(&self, msg: impl Display);
    /// Logs an error.
    fn err(&self, msg: impl Display);
}

impl<L: Log + ?Sized> LogExt for L {
    fn info(&self, msg: impl Display) {
        self.log(LogLevel::Info, msg.to_string())
    }

    fn warn(&self, msg: impl Display) {
        self.log(LogLevel::Warn, msg.to_string())
    }

    fn err(&self, msg: impl Display) {
        self.log(LogLevel::Error, msg.to_string())
    }
}

/// A logger that uses standard error stream to communicate with the user.
pub struct StdLog {
    program_name: String,
    progress_bar: Mutex<Weak<ProgressBar>>,
    pub no_progress: bool,
}

impl StdLog {
    pub fn new() -> StdLog {
        let program_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_owned());
        StdLog {
            progress_bar: Mutex::new(Weak::default()),
            program_name,
            no_progress: false,
        }
    }

    /// Clears any previous progress bar and installs a new bytes progress bar.
    pub fn bytes_progress_bar(&self, msg: &str, len: u64) -> Arc<ProgressBar> {
        if self.no_progress {
            return Arc::new(ProgressBar::new_hidden());
        }
        let mut current = self.progress_bar.lock().unwrap();
        if let Some(pb) = current.upgrade() {
            pb.finish_and_clear()
        }
        let result = Arc::new(ProgressBar::new_bytes_progress_bar(msg, len));
        *current = Arc::downgrade(&result);
        result
    }

    /// Prints a message to stderr.
    /// Does not interfere with progress bar.
    fn eprintln<I: Display>(&self, msg: I) {
        match self.progress_bar.lock().unwrap().upgrade() {
            Some(pb) if pb.is_visible() => pb.eprintln(format!("{msg}")),
            _ => eprintln!("{msg}"),
        }
    }

    const TIMESTAMP_FMT: &'static str = "[%Y-%m-%d %H:%M:%S.%3f]";
}

impl Log for StdLog {
    fn progress_bar(&self, msg: &str, len: u64) -> Arc<dyn ProgressTracker> {
        self.bytes_progress_bar(msg, len)
    }

    fn log(&self, level: LogLevel, msg: String) {
        let timestamp = Local::now();
        let level = match level {
            LogLevel::Info => style(" info:").for_stderr().green(),
            LogLevel::Warn => style("warn:").for_stderr().yellow(),
            LogLevel::Error => style("error:").for_stderr().red(),
        };
        let msg = format!(
            "{} {}: {} {}",
            style(timestamp.format(Self::TIMESTAMP_FMT))
                .for_stderr()
                .dim()
                .white(),
            style(&self.program_name).for_stderr().yellow(),
            level,
            msg
        );
        self.eprintln(msg);
    }
}

impl Default for StdLog {
    fn default() -> Self {
        StdLog::new()
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::progress::NoProgressBar;

    /// Collects log messages in memory, so tests can inspect what was reported.
    #[derive(Default)]
    pub struct MemLog {
        pub messages: Mutex<Vec<(LogLevel, String)>>,
    }

    impl MemLog {
        pub fn count(&self, level: LogLevel) -> usize {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _)| *l == level)
                .count()
        }

        pub fn contains(&self, fragment: &str) -> bool {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .any(|(_, m)| m.contains(fragment))
        }
    }

    impl Log for MemLog {
        fn progress_bar(&self, _msg: &str, _len: u64) -> Arc<dyn ProgressTracker> {
            Arc::new(NoProgressBar)
        }

        fn log(&self, level: LogLevel, msg: String) {
            self.messages.lock().unwrap().push((level, msg))
        }
    }

    #[test]
    fn log_ext_forwards_level() {
        let log = MemLog::default();
        log.info("one");
        log.warn("two");
        log.err("three");
        assert_eq!(log.count(LogLevel::Info), 1);
        assert_eq!(log.count(LogLevel::Warn), 1);
        assert_eq!(log.count(LogLevel::Error), 1);
        assert!(log.contains("three"));
    }

    #[test]
    fn hidden_progress_bar_when_progress_disabled() {
        let mut log = StdLog::new();
        log.no_progress = true;
        let pb = log.bytes_progress_bar("Writing", 100);
        assert!(!pb.is_visible());
    }
}
