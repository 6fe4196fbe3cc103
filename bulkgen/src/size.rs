//! Type-safe wrappers for data lengths and transfer rates.

use core::fmt;
use std::fmt::{Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use std::time::Duration;

use byte_unit::Byte;
use bytesize::ByteSize;

/// Represents length of data, in bytes.
/// Provides more type safety and nicer formatting over using a raw u64.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct FileLen(pub u64);

impl FileLen {
    pub const ZERO: FileLen = FileLen(0);

    pub const fn kib(n: u64) -> FileLen {
        FileLen(n * 1024)
    }

    pub const fn mib(n: u64) -> FileLen {
        FileLen(n * 1024 * 1024)
    }

    pub fn saturating_sub(self, rhs: FileLen) -> FileLen {
        FileLen(self.0.saturating_sub(rhs.0))
    }

    /// Returns `self` as a fraction of `total`, in percent.
    /// An empty total counts as fully done.
    pub fn percent_of(self, total: FileLen) -> f64 {
        if total.0 == 0 {
            100.0
        } else {
            self.0 as f64 / total.0 as f64 * 100.0
        }
    }
}

impl From<u64> for FileLen {
    fn from(l: u64) -> Self {
        FileLen(l)
    }
}

impl From<usize> for FileLen {
    fn from(l: usize) -> Self {
        FileLen(l as u64)
    }
}

impl From<FileLen> for u64 {
    fn from(l: FileLen) -> Self {
        l.0
    }
}

impl Add for FileLen {
    type Output = FileLen;
    fn add(self, rhs: Self) -> Self::Output {
        FileLen(self.0 + rhs.0)
    }
}

impl AddAssign for FileLen {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0
    }
}

impl Sub for FileLen {
    type Output = FileLen;
    fn sub(self, rhs: Self) -> Self::Output {
        FileLen(self.0 - rhs.0)
    }
}

impl Sum<FileLen> for FileLen {
    fn sum<I: Iterator<Item = FileLen>>(iter: I) -> Self {
        iter.fold(FileLen(0), |a, b| a + b)
    }
}

impl FromStr for FileLen {
    type Err = byte_unit::ByteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let b = Byte::from_str(s)?;
        Ok(FileLen(b.get_bytes() as u64))
    }
}

impl Display for FileLen {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(format!("{}", ByteSize(self.0)).as_str())
    }
}

/// Amount of data transferred in a period of time.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Throughput {
    pub len: FileLen,
    pub elapsed: Duration,
}

impl Throughput {
    pub fn new(len: FileLen, elapsed: Duration) -> Throughput {
        Throughput { len, elapsed }
    }

    /// Returns 0 if no time has passed yet.
    pub fn bytes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.len.0 as f64 / secs
        } else {
            0.0
        }
    }

    pub fn per_sec(&self) -> FileLen {
        FileLen(self.bytes_per_sec() as u64)
    }

    pub fn per_hour(&self) -> FileLen {
        FileLen((self.bytes_per_sec() * 3600.0) as u64)
    }
}

/// Formats as bytes per second.
impl Display for Throughput {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(format!("{}/s", self.per_sec()).as_str())
    }
}
