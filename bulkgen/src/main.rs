use std::process::exit;

use clap::Parser;
use console::{style, Term};

use bulkgen::config::Config;
use bulkgen::disk::{available_space, check_free_space, confirm_on_terminal, Preflight};
use bulkgen::log::{LogExt, StdLog};
use bulkgen::{generate, Error};

fn run(config: &Config, log: &StdLog) -> Result<(), Error> {
    log.info("Generating random binary files");
    let preflight = check_free_space(
        config.total_size,
        available_space(&config.root),
        config.yes,
        log,
        confirm_on_terminal,
    )?;
    if preflight == Preflight::Cancelled {
        log.info("Operation cancelled");
        return Ok(());
    }

    let report = generate(config, log)?;
    log.info(format!(
        "Done! Generated {} files in {} folders, total size {}",
        report.files, report.folders, report.written
    ));
    Ok(())
}

fn main() {
    let config: Config = Config::parse();
    if let Err(e) = config.validate() {
        eprintln!("{} {}", style("error:").for_stderr().bold().red(), e);
        exit(1);
    }

    let mut log = StdLog::new();
    log.no_progress = !config.show_progress(Term::stderr().is_term());

    if let Err(e) = run(&config, &log) {
        if !e.message.is_empty() {
            log.err(e);
        }
        exit(1);
    }
}
