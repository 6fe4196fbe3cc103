//! Planning and writing all files in parallel.

use std::fs;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossbeam_utils::thread;
use rand::rngs::{OsRng, StdRng};
use rand::SeedableRng;
use rayon::ThreadPoolBuilder;

use crate::config::Config;
use crate::error::Error;
use crate::event::WorkerId;
use crate::log::{Log, LogExt};
use crate::monitor::{Monitor, MonitorSummary};
use crate::plan::{plan_files, Layout, Plan};
use crate::size::{FileLen, Throughput};
use crate::util::cpu_count;
use crate::writer::{write_random_file, WriteOptions};

/// Outcome of the whole run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerateReport {
    pub files: usize,
    pub folders: usize,
    pub failed: usize,
    pub written: FileLen,
    pub elapsed: Duration,
}

impl GenerateReport {
    pub fn throughput(&self) -> Throughput {
        Throughput::new(self.written, self.elapsed)
    }
}

/// Number of files written at the same time.
/// Never more than the number of cores, the configured ceiling or the number of files.
pub fn worker_count(max_workers: usize, file_count: usize) -> usize {
    cpu_count().min(max_workers).min(file_count).max(1)
}

/// Random generator deciding the sizes of files and folders.
fn planner_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(OsRng).unwrap_or_else(|_| {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default();
            StdRng::seed_from_u64(nanos)
        }),
    }
}

fn create_folders(plan: &Plan) -> Result<(), Error> {
    for folder in &plan.folders {
        fs::create_dir_all(&folder.path).map_err(|e| {
            format!("Failed to create folder {}: {}", folder.path.display(), e)
        })?;
    }
    Ok(())
}

/// Computes the plan, creates the folders and writes all files.
/// Files that fail are reported and counted, but don't stop the others.
pub fn generate(config: &Config, log: &dyn Log) -> Result<GenerateReport, Error> {
    log.info(format!("Target total size: {}", config.total_size));
    log.info(format!(
        "File size: {} to {}",
        config.min_file_size, config.max_file_size
    ));
    log.info(format!(
        "Folder size: {} to {}",
        config.min_folder_size, config.max_folder_size
    ));

    let mut rng = planner_rng(config.seed);
    let plan = plan_files(&Layout::from(config), &mut rng);
    for (i, folder) in plan.folders.iter().enumerate() {
        log.info(format!("Folder {:04} target size: {}", i, folder.target));
    }
    log.info(format!(
        "Will generate {} files in {} folders, total size: {}",
        plan.files.len(),
        plan.folders.len(),
        plan.total_len()
    ));

    create_folders(&plan)?;
    let workers = worker_count(config.max_workers, plan.files.len());
    let report = write_files(&plan, &WriteOptions::from(config), workers, log)?;

    log.info(format!(
        "Generated {} files in {} folders",
        report.files, report.folders
    ));
    log.info(format!("Total size: {}", report.written));
    log.info(format!("Elapsed time: {:.2} s", report.elapsed.as_secs_f64()));
    log.info(format!(
        "Average speed: {} ({}/h)",
        report.throughput(),
        report.throughput().per_hour()
    ));
    if report.failed > 0 {
        log.warn(format!("{} files could not be generated", report.failed));
    }
    Ok(report)
}

/// Writes all files of the plan on a pool of `workers` threads.
/// The folders must exist already.
///
/// Progress events of all workers are handled by a `Monitor` running in a background
/// thread. Results are collected in the order the files get finished.
pub fn write_files(
    plan: &Plan,
    opts: &WriteOptions,
    workers: usize,
    log: &dyn Log,
) -> Result<GenerateReport, Error> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("bulkgen-writer-{i}"))
        .build()
        .map_err(|e| format!("Failed to start worker threads: {e}"))?;
    log.info(format!("Using {workers} workers"));

    let total_len = plan.total_len();
    let progress = log.progress_bar("Writing files", total_len.0);
    let monitor = Monitor::new(plan.files.len(), total_len, progress.clone());
    let (event_tx, event_rx) = channel();
    let (result_tx, result_rx) = channel();
    let start = Instant::now();

    let mut completed = 0;
    let mut failed = 0;
    let mut written = FileLen::ZERO;

    let summary: MonitorSummary = thread::scope(|s| {
        let monitor = s.spawn(move |_| monitor.run(event_rx, log));

        for task in plan.files.iter().cloned() {
            let event_tx = event_tx.clone();
            let result_tx = result_tx.clone();
            let opts = *opts;
            pool.spawn_fifo(move || {
                let result = write_random_file(&task, &opts, WorkerId::current(), &event_tx);
                result_tx.send((task, result)).ok();
            });
        }
        // Once all tasks are done, all senders are gone and both receivers stop.
        drop(event_tx);
        drop(result_tx);

        while let Ok((task, result)) = result_rx.recv() {
            match result {
                Ok(stats) => {
                    completed += 1;
                    written += stats.len;
                }
                Err(e) => {
                    failed += 1;
                    log.err(format!("Failed to generate {}: {}", task.path.display(), e));
                }
            }
        }
        monitor.join()
    })
    .and_then(|r| r)
    .map_err(|_| Error::from("Progress monitor thread panicked"))?;
    drop(progress);

    if summary.completed_files != completed {
        log.warn(format!(
            "Progress monitor saw {} completed files, workers reported {}",
            summary.completed_files, completed
        ));
    }

    Ok(GenerateReport {
        files: completed,
        folders: plan.folders.len(),
        failed,
        written,
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::log::test::MemLog;
    use crate::log::LogLevel;
    use crate::plan::{FileTask, FolderPlan};
    use crate::util::test::with_dir;
    use clap::Parser;
    use std::path::Path;

    fn config(root: &Path, args: &[&str]) -> Config {
        let mut all = vec!["bulkgen", "--seed", "7", "-y"];
        all.extend_from_slice(args);
        all.push(root.to_str().unwrap());
        Config::try_parse_from(all).unwrap()
    }

    #[test]
    fn worker_count_is_bounded() {
        assert_eq!(worker_count(16, 0), 1);
        assert_eq!(worker_count(16, 1), 1);
        assert_eq!(worker_count(1, 100), 1);
        assert!(worker_count(16, 100) <= 16);
        assert!(worker_count(16, 100) <= cpu_count());
    }

    #[test]
    fn generates_planned_files() {
        with_dir("target/test/generate/planned", |root| {
            let config = config(
                root,
                &[
                    "--total-size=100000",
                    "--min-file-size=3000",
                    "--max-file-size=7000",
                    "--min-folder-size=10000",
                    "--max-folder-size=20000",
                    "--chunk-size=1000",
                    "--report-interval=0",
                ],
            );
            let log = MemLog::default();
            let report = generate(&config, &log).unwrap();

            let plan = plan_files(&Layout::from(&config), &mut planner_rng(Some(7)));
            assert_eq!(report.files, plan.files.len());
            assert_eq!(report.folders, plan.folders.len());
            assert_eq!(report.failed, 0);
            assert_eq!(report.written, FileLen(100000));

            let mut on_disk = FileLen::ZERO;
            for task in &plan.files {
                let len = fs::metadata(&task.path).unwrap().len();
                assert_eq!(FileLen(len), task.len);
                on_disk += FileLen(len);
            }
            assert_eq!(on_disk, FileLen(100000));
            assert!(root.join("dir_0000").join("file_0000.bin").is_file());
            assert_eq!(log.count(LogLevel::Error), 0);
            assert!(log.contains("Overall progress: 100.0%"));
        });
    }

    #[test]
    fn failed_file_does_not_stop_others() {
        with_dir("target/test/generate/failure", |root| {
            let folder = root.join("dir_0000");
            fs::create_dir_all(&folder).unwrap();
            let plan = Plan {
                files: vec![
                    FileTask {
                        path: folder.join("file_0000.bin"),
                        len: FileLen(1000),
                    },
                    FileTask {
                        path: root.join("missing").join("file_0001.bin"),
                        len: FileLen(1000),
                    },
                    FileTask {
                        path: folder.join("file_0002.bin"),
                        len: FileLen(1000),
                    },
                ],
                folders: vec![FolderPlan {
                    path: folder.clone(),
                    target: FileLen(3000),
                    assigned: FileLen(3000),
                }],
            };
            let log = MemLog::default();
            let report = write_files(&plan, &WriteOptions::default(), 2, &log).unwrap();

            assert_eq!(report.files, 2);
            assert_eq!(report.failed, 1);
            assert_eq!(report.written, FileLen(2000));
            assert!(folder.join("file_0000.bin").is_file());
            assert!(folder.join("file_0002.bin").is_file());
            // reported once by the monitor and once by the orchestrator
            assert_eq!(log.count(LogLevel::Error), 2);
            assert!(log.contains("file_0001.bin"));
        });
    }

    #[test]
    fn same_seed_gives_same_layout() {
        let layout = Layout {
            root: "root".into(),
            folder_prefix: "d".to_owned(),
            file_prefix: "f".to_owned(),
            total: FileLen(50000),
            min_file: FileLen(100),
            max_file: FileLen(1000),
            min_folder: FileLen(2000),
            max_folder: FileLen(4000),
        };
        let plan1 = plan_files(&layout, &mut planner_rng(Some(1)));
        let plan2 = plan_files(&layout, &mut planner_rng(Some(1)));
        assert_eq!(plan1.files, plan2.files);
    }
}
