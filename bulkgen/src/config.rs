//! Main program configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::size::FileLen;

/// Parses a human-readable size, e.g. `512KiB`, `53MiB` or `1000`.
fn parse_len(s: &str) -> Result<FileLen, String> {
    s.parse::<FileLen>()
        .map_err(|e| format!("Invalid size {s}: {e}"))
}

const fn after_help() -> &'static str {
    "Files are laid out as <ROOT>/<FOLDER_PREFIX>NNNN/<FILE_PREFIX>MMMM.bin.\n\
     Sizes accept units, e.g. 1000, 64KB, 512KiB, 53MiB, 10GiB."
}

/// Generates a large set of random binary files spread over size-bounded folders
#[derive(clap::Parser, Clone, Debug)]
#[command(about, version, after_help = after_help(), max_term_width = 100)]
pub struct Config {
    /// Directory where the folders are created
    #[arg(default_value = ".", value_name = "ROOT")]
    pub root: PathBuf,

    /// Total size of all generated files
    #[arg(short = 't', long, value_name = "SIZE", value_parser = parse_len, default_value = "1GiB")]
    pub total_size: FileLen,

    /// Minimum size of a single file
    #[arg(long, value_name = "SIZE", value_parser = parse_len, default_value = "53MiB")]
    pub min_file_size: FileLen,

    /// Maximum size of a single file
    #[arg(long, value_name = "SIZE", value_parser = parse_len, default_value = "55MiB")]
    pub max_file_size: FileLen,

    /// Minimum target size of a folder
    #[arg(long, value_name = "SIZE", value_parser = parse_len, default_value = "400MiB")]
    pub min_folder_size: FileLen,

    /// Maximum target size of a folder
    #[arg(long, value_name = "SIZE", value_parser = parse_len, default_value = "800MiB")]
    pub max_folder_size: FileLen,

    /// Prefix of the folder names
    #[arg(long, value_name = "PREFIX", default_value = "dir_")]
    pub folder_prefix: String,

    /// Prefix of the file names
    #[arg(long, value_name = "PREFIX", default_value = "file_")]
    pub file_prefix: String,

    /// Upper limit on the number of files written concurrently.
    ///
    /// The actual number of workers is also limited by the number of CPU cores
    /// and by the number of files.
    #[arg(short = 'w', long, value_name = "COUNT", default_value = "16")]
    pub max_workers: usize,

    /// Size of a single write; bounds the memory used by each worker
    #[arg(long, value_name = "SIZE", value_parser = parse_len, default_value = "512KiB")]
    pub chunk_size: FileLen,

    /// How often each worker reports its progress, in seconds
    #[arg(long, value_name = "SECONDS", default_value = "5")]
    pub report_interval: u64,

    /// Seed of the random layout; the same seed gives the same files and folders
    #[arg(long, value_name = "NUMBER")]
    pub seed: Option<u64>,

    /// Don't ask for confirmation when the disk looks too small
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Override progress reporting, by default (=auto) only report when stderr is a terminal.
    /// Possible values: true, false, auto.
    #[arg(long, value_name = "VAL", require_equals = true,
          value_parser(["auto", "true", "false"]), default_value = "auto",
          hide_possible_values = true, hide_default_value = true)]
    pub progress: String,

    /// Don't show the progress bar, same as --progress=false
    #[arg(short('q'), long)]
    pub quiet: bool,
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        if self.total_size == FileLen::ZERO {
            return Err("The total size must be greater than zero.".to_owned());
        }
        if self.min_file_size == FileLen::ZERO {
            return Err("The minimum file size must be greater than zero.".to_owned());
        }
        if self.min_file_size > self.max_file_size {
            return Err(format!(
                "The minimum file size ({}) must not exceed the maximum file size ({}).",
                self.min_file_size, self.max_file_size
            ));
        }
        if self.min_folder_size > self.max_folder_size {
            return Err(format!(
                "The minimum folder size ({}) must not exceed the maximum folder size ({}).",
                self.min_folder_size, self.max_folder_size
            ));
        }
        if self.chunk_size == FileLen::ZERO {
            return Err("The chunk size must be greater than zero.".to_owned());
        }
        if self.max_workers == 0 {
            return Err("At least one worker is required.".to_owned());
        }
        Ok(())
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval)
    }

    /// Whether the progress bar should be displayed, given whether stderr is a terminal.
    pub fn show_progress(&self, is_term: bool) -> bool {
        if self.quiet {
            return false;
        }
        match self.progress.as_str() {
            "true" => true,
            "false" => false,
            _ => is_term,
        }
    }
}
