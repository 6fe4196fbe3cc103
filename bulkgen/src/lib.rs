pub mod config;
pub mod disk;
pub mod event;
pub mod log;
pub mod monitor;
pub mod plan;
pub mod progress;
pub mod size;
pub mod writer;

mod error;
mod generate;
mod util;

pub use config::Config;
pub use error::Error;
pub use event::{ProgressEvent, WorkerId};
pub use generate::{generate, worker_count, write_files, GenerateReport};
pub use plan::{plan_files, FileTask, FolderPlan, Layout, Plan};
pub use size::{FileLen, Throughput};
pub use writer::{write_random_file, WriteOptions, WriteStats};
