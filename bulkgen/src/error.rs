use std::fmt::{Display, Formatter};
use std::path::Path;
use std::{fmt, io};

/// Error reported by top-level bulkgen functions
#[derive(Debug)]
pub struct Error {
    pub message: String,
}

impl Error {
    pub fn new(msg: String) -> Error {
        Error { message: msg }
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::new(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::new(s.to_owned())
    }
}

/// Adds the operation and the path to the message of an I/O error.
/// Keeps the original error kind.
pub fn io_error_with_path(e: io::Error, action: &str, path: &Path) -> io::Error {
    io::Error::new(
        e.kind(),
        format!("Failed to {} {}: {}", action, path.display(), e),
    )
}
