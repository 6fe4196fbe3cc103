//! Writing a single file filled with random data.

use std::fs::File;
use std::io;
use std::io::Write;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, SmallRng};
use rand::{RngCore, SeedableRng};

use crate::config::Config;
use crate::error::io_error_with_path;
use crate::event::{ProgressEvent, WorkerId};
use crate::plan::FileTask;
use crate::size::{FileLen, Throughput};

/// Controls how files are written.
#[derive(Clone, Copy, Debug)]
pub struct WriteOptions {
    /// Number of bytes passed to a single write call.
    pub chunk_size: usize,
    /// Minimum time between two progress events of the same file.
    pub report_interval: Duration,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            chunk_size: 512 * 1024,
            report_interval: Duration::from_secs(5),
        }
    }
}

impl From<&Config> for WriteOptions {
    fn from(config: &Config) -> Self {
        WriteOptions {
            chunk_size: usize::try_from(config.chunk_size.0).unwrap_or(usize::MAX),
            report_interval: config.report_interval(),
        }
    }
}

/// Summary of a successfully written file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WriteStats {
    pub len: FileLen,
    pub writes: usize,
    pub elapsed: Duration,
}

impl WriteStats {
    pub fn speed(&self) -> Throughput {
        Throughput::new(self.len, self.elapsed)
    }
}

/// Source of the file contents.
/// Starts with the operating system generator and permanently switches to a fast
/// non-cryptographic generator if the former ever fails.
pub enum RandomSource {
    Os,
    Fallback(SmallRng),
}

impl RandomSource {
    pub fn new() -> RandomSource {
        RandomSource::Os
    }

    fn fallback() -> RandomSource {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        let seed = nanos ^ ((std::process::id() as u64) << 32);
        RandomSource::Fallback(SmallRng::seed_from_u64(seed))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RandomSource::Fallback(_))
    }

    pub fn fill(&mut self, buf: &mut [u8]) {
        self.fill_from(&mut OsRng, buf)
    }

    /// Fills the buffer from `secure` until it fails once.
    fn fill_from(&mut self, secure: &mut impl RngCore, buf: &mut [u8]) {
        if let RandomSource::Os = self {
            if secure.try_fill_bytes(buf).is_ok() {
                return;
            }
            *self = Self::fallback();
        }
        if let RandomSource::Fallback(rng) = self {
            rng.fill_bytes(buf)
        }
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        RandomSource::new()
    }
}

/// Creates the file of the task and fills it with random data.
///
/// Sends `Started` before writing, `Progress` at most once per report interval,
/// and finally `Completed` or `Error`. On failure the error is also returned.
/// A partially written file is left in place.
pub fn write_random_file(
    task: &FileTask,
    opts: &WriteOptions,
    worker: WorkerId,
    events: &Sender<ProgressEvent>,
) -> io::Result<WriteStats> {
    let send = |event| {
        // the monitor may be gone already, that must not fail the write
        events.send(event).ok();
    };
    send(ProgressEvent::Started {
        worker,
        path: task.path.clone(),
        len: task.len,
    });

    match write_chunks(task, opts, &mut RandomSource::new(), |written, elapsed, speed| {
        send(ProgressEvent::Progress {
            worker,
            path: task.path.clone(),
            written,
            len: task.len,
            elapsed,
            speed,
        })
    }) {
        Ok(stats) => {
            send(ProgressEvent::Completed {
                worker,
                path: task.path.clone(),
                len: stats.len,
                elapsed: stats.elapsed,
                speed: stats.speed(),
            });
            Ok(stats)
        }
        Err(e) => {
            send(ProgressEvent::Error {
                worker,
                path: task.path.clone(),
                message: e.to_string(),
            });
            Err(e)
        }
    }
}

/// Writes the file chunk by chunk.
/// Calls `on_progress` with the bytes written so far, the time since start and
/// the throughput since the previous report, once per report interval.
fn write_chunks(
    task: &FileTask,
    opts: &WriteOptions,
    random: &mut RandomSource,
    mut on_progress: impl FnMut(FileLen, Duration, Throughput),
) -> io::Result<WriteStats> {
    let path = task.path.as_path();
    let mut file = File::create(path).map_err(|e| io_error_with_path(e, "create", path))?;

    let chunk_size = opts.chunk_size.max(1);
    let file_len = usize::try_from(task.len.0).unwrap_or(usize::MAX);
    let mut buf = vec![0u8; chunk_size.min(file_len)];
    let start = Instant::now();
    let mut last_report = start;
    let mut reported = FileLen::ZERO;
    let mut written = FileLen::ZERO;
    let mut writes = 0;

    while written < task.len {
        let n = (task.len - written).0.min(chunk_size as u64) as usize;
        let chunk = &mut buf[..n];
        random.fill(chunk);
        file.write_all(chunk).map_err(|e| io_error_with_path(e, "write", path))?;
        written += FileLen::from(n);
        writes += 1;

        let now = Instant::now();
        let since_report = now - last_report;
        if since_report >= opts.report_interval {
            on_progress(
                written,
                now - start,
                Throughput::new(written - reported, since_report),
            );
            last_report = now;
            reported = written;
        }
    }
    file.flush().map_err(|e| io_error_with_path(e, "flush", path))?;

    Ok(WriteStats {
        len: written,
        writes,
        elapsed: start.elapsed(),
    })
}
