//! Splitting the requested amount of data into files and folders.

use std::path::{Path, PathBuf};

use rand::Rng;

use crate::config::Config;
use crate::size::FileLen;

/// A single file to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileTask {
    pub path: PathBuf,
    pub len: FileLen,
}

/// A directory holding a group of files, together with the size it was supposed to reach.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderPlan {
    pub path: PathBuf,
    pub target: FileLen,
    pub assigned: FileLen,
}

/// The outcome of planning: all the files to write, in order, and the folders they go to.
#[derive(Clone, Debug, Default)]
pub struct Plan {
    pub files: Vec<FileTask>,
    pub folders: Vec<FolderPlan>,
}

impl Plan {
    pub fn total_len(&self) -> FileLen {
        self.files.iter().map(|f| f.len).sum()
    }
}

/// Size limits and naming used by the planner.
#[derive(Clone, Debug)]
pub struct Layout {
    pub root: PathBuf,
    pub folder_prefix: String,
    pub file_prefix: String,
    pub total: FileLen,
    pub min_file: FileLen,
    pub max_file: FileLen,
    pub min_folder: FileLen,
    pub max_folder: FileLen,
}

impl From<&Config> for Layout {
    fn from(config: &Config) -> Self {
        Layout {
            root: config.root.clone(),
            folder_prefix: config.folder_prefix.clone(),
            file_prefix: config.file_prefix.clone(),
            total: config.total_size,
            min_file: config.min_file_size,
            max_file: config.max_file_size,
            min_folder: config.min_folder_size,
            max_folder: config.max_folder_size,
        }
    }
}

impl Layout {
    fn folder_path(&self, index: usize) -> PathBuf {
        self.root.join(format!("{}{:04}", self.folder_prefix, index))
    }

    fn file_path(&self, folder: &Path, index: usize) -> PathBuf {
        folder.join(format!("{}{:04}.bin", self.file_prefix, index))
    }

    fn new_folder(&self, index: usize, rng: &mut impl Rng) -> FolderPlan {
        let low = self.min_folder.min(self.max_folder);
        let high = self.min_folder.max(self.max_folder);
        FolderPlan {
            path: self.folder_path(index),
            target: FileLen(rng.gen_range(low.0..=high.0)),
            assigned: FileLen::ZERO,
        }
    }
}

/// Greedily assigns files of random sizes to folders of random target sizes
/// until exactly `layout.total` bytes are planned.
///
/// Every file gets a size from `[min_file, max_file]`, except the last one, which
/// takes whatever is left if that is less than `min_file`. A folder is closed as soon as
/// it reaches its target, or when it can no longer take a file of `min_file` bytes
/// while at least that many bytes remain to be planned. A folder with a target below
/// `min_file` still gets one file of `min_file` bytes. The last folder may end up below
/// `min_folder`. Files are never empty, even if `min_file` is zero.
///
/// Does not touch the file system.
pub fn plan_files(layout: &Layout, rng: &mut impl Rng) -> Plan {
    let mut files = Vec::new();
    let mut folders = Vec::new();
    let mut folder = layout.new_folder(0, rng);
    let mut planned = FileLen::ZERO;

    while planned < layout.total {
        let remaining = layout.total - planned;
        let folder_remaining = folder.target.saturating_sub(folder.assigned);
        let folder_full = folder.assigned >= folder.target
            || (folder_remaining < layout.min_file && remaining >= layout.min_file);
        if folder.assigned > FileLen::ZERO && folder_full {
            let next = layout.new_folder(folders.len() + 1, rng);
            folders.push(std::mem::replace(&mut folder, next));
        }

        let folder_remaining = folder.target.saturating_sub(folder.assigned);
        let len = if remaining < layout.min_file {
            remaining
        } else {
            let max_len = layout.max_file.min(folder_remaining).min(remaining);
            if max_len < layout.min_file {
                layout.min_file
            } else {
                FileLen(rng.gen_range(layout.min_file.0..=max_len.0))
            }
        };
        // a zero-length file would never make progress
        let len = len.max(FileLen(1)).min(remaining);

        let path = layout.file_path(&folder.path, files.len());
        folder.assigned += len;
        planned += len;
        files.push(FileTask { path, len });
    }
    folders.push(folder);

    Plan { files, folders }
}
