//! Checking whether the target disk can hold the generated data.

use std::io;
use std::path::{Path, PathBuf};

use console::Term;
use sysinfo::Disks;

use crate::error::Error;
use crate::log::{Log, LogExt};
use crate::size::FileLen;

/// Decision made before starting to write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preflight {
    Proceed,
    Cancelled,
}

/// Returns the closest existing ancestor of `path`, made absolute.
fn existing_ancestor(path: &Path) -> io::Result<PathBuf> {
    let path = if path.is_relative() {
        std::env::current_dir()?.join(path)
    } else {
        path.to_path_buf()
    };
    path.ancestors()
        .find(|p| p.exists())
        .map(|p| p.canonicalize())
        .unwrap_or_else(|| {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("No existing ancestor of {}", path.display()),
            ))
        })
}

/// Among the given mount points, picks the one holding `path`.
/// Mount points nested deeper win over their parents.
fn find_mount<'a, I>(path: &Path, mounts: I) -> Option<FileLen>
where
    I: IntoIterator<Item = (&'a Path, FileLen)>,
{
    mounts
        .into_iter()
        .filter(|(mount_point, _)| path.starts_with(mount_point))
        .max_by_key(|(mount_point, _)| mount_point.components().count())
        .map(|(_, available)| available)
}

/// Returns the free space on the disk holding `path`.
/// The path doesn't need to exist yet.
pub fn available_space(path: &Path) -> io::Result<FileLen> {
    let path = existing_ancestor(path)?;
    let disks = Disks::new_with_refreshed_list();
    let mounts = disks
        .list()
        .iter()
        .map(|d| (d.mount_point(), FileLen(d.available_space())));
    find_mount(&path, mounts).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("No disk found for {}", path.display()),
        )
    })
}

/// Asks the user on the terminal whether to continue.
pub fn confirm_on_terminal() -> io::Result<bool> {
    let term = Term::stderr();
    term.write_str("Continue anyway? (y/n): ")?;
    let answer = term.read_line()?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Compares the space needed with the space available.
/// If there is not enough space, warns and asks for confirmation through `confirm`,
/// unless `assume_yes` is set. If the available space is unknown, warns and proceeds.
pub fn check_free_space(
    required: FileLen,
    available: io::Result<FileLen>,
    assume_yes: bool,
    log: &dyn Log,
    confirm: impl FnOnce() -> io::Result<bool>,
) -> Result<Preflight, Error> {
    let available = match available {
        Ok(available) => available,
        Err(e) => {
            log.warn(format!("Cannot check free disk space: {e}"));
            log.warn("Continuing, make sure there is enough free space");
            return Ok(Preflight::Proceed);
        }
    };
    if available >= required {
        return Ok(Preflight::Proceed);
    }

    log.warn("Not enough free disk space!");
    log.warn(format!("Required:  {required}"));
    log.warn(format!("Available: {available}"));
    if assume_yes {
        return Ok(Preflight::Proceed);
    }
    match confirm() {
        Ok(true) => Ok(Preflight::Proceed),
        Ok(false) => Ok(Preflight::Cancelled),
        Err(e) => Err(Error::new(format!("Failed to read the answer: {e}"))),
    }
}
