//! Fast, concurrent, lockless progress bars.

use crate::size::FileLen;
use console::style;
use status_line::{Options, StatusLine};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

/// Common interface for components that can show progress of a task. E.g. progress bars.
pub trait ProgressTracker: Sync + Send {
    fn inc(&self, delta: u64);
}

/// A progress bar that doesn't display itself and does nothing.
pub struct NoProgressBar;

impl ProgressTracker for NoProgressBar {
    fn inc(&self, _delta: u64) {}
}

/// Keeps state of the progress bar and controls how it is rendered to a string
#[derive(Debug)]
struct Progress {
    msg: String,      // message shown before the progress bar
    value: AtomicU64, // number of bytes done so far
    max: u64,         // total number of bytes expected
    color: bool,
}

impl Progress {
    /// Draws the progress bar alone (without message and numbers)
    fn bar(&self, length: usize) -> String {
        let mut bar = "=".repeat(length);
        if !bar.is_empty() {
            bar.pop();
            bar.push('>');
        }
        bar.truncate(MAX_BAR_LEN);
        bar
    }
}

impl Default for Progress {
    fn default() -> Self {
        Progress {
            msg: "".to_owned(),
            value: AtomicU64::default(),
            max: 0,
            color: true,
        }
    }
}

const MAX_BAR_LEN: usize = 50;

impl Display for Progress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let value = self.value.load(Ordering::Relaxed).min(self.max);
        let value_str = FileLen(value).to_string();
        let max_str = FileLen(self.max).to_string();
        let percent = FileLen(value).percent_of(FileLen(self.max));
        let msg = if self.color {
            style(self.msg.clone()).for_stderr().cyan().bold()
        } else {
            style(self.msg.clone())
        };
        let bar_len = (MAX_BAR_LEN as u64 * value / self.max.max(1)) as usize;
        let bar = self.bar(bar_len);
        write!(
            f,
            "{msg:32}[{bar:MAX_BAR_LEN$}]{value_str:>14} / {max_str} ({percent:5.1}%)"
        )
    }
}

/// Console-based progress bar that renders to standard error.
pub struct ProgressBar {
    status_line: StatusLine<Progress>,
}

impl ProgressBar {
    /// Create a new preconfigured progress bar with given message.
    /// Displays progress in bytes.
    pub fn new_bytes_progress_bar(msg: &str, len: u64) -> ProgressBar {
        let progress = Progress {
            msg: msg.to_string(),
            max: len,
            ..Default::default()
        };
        ProgressBar {
            status_line: StatusLine::new(progress),
        }
    }

    /// Creates a new invisible progress bar.
    /// This is useful when you need to disable progress bar, but you need to pass an instance
    /// of a `ProgressBar` to something that expects it.
    pub fn new_hidden() -> ProgressBar {
        ProgressBar {
            status_line: StatusLine::with_options(
                Progress::default(),
                Options {
                    refresh_period: Default::default(),
                    initially_visible: false,
                    enable_ansi_escapes: false,
                },
            ),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.status_line.is_visible()
    }

    /// Prints a line above the bar without corrupting it.
    pub fn eprintln<I: AsRef<str>>(&self, msg: I) {
        let was_visible = self.status_line.is_visible();
        self.status_line.set_visible(false);
        eprintln!("{}", msg.as_ref());
        self.status_line.set_visible(was_visible);
    }

    pub fn position(&self) -> u64 {
        self.status_line.value.load(Ordering::Relaxed)
    }

    pub fn finish_and_clear(&self) {
        self.status_line.set_visible(false);
    }
}

impl ProgressTracker for ProgressBar {
    fn inc(&self, delta: u64) {
        self.status_line.value.fetch_add(delta, Ordering::Relaxed);
    }
}
