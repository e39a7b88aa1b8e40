// src/cli.rs
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use tracing::info;

use crate::{
    config::{options::log_file_from_env, ExtractorConfig, PayeConfig},
    core::HttpFetcher,
    log, paye, RunController,
};

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log file (defaults to $LOG_FILE or data/logs/zimra_extractors.log)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch HSN codes for every root, resuming from the progress file
    Hsn,
    /// Extract PAYE tax tables from PDFs
    Paye {
        /// Directory holding the source PDFs
        #[arg(long)]
        raw_dir: Option<PathBuf>,
        /// Directory for the generated CSVs
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let level = match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        let log_file = self.log_file.unwrap_or_else(log_file_from_env);
        log::init(&log_file, level).wrap_err("could not set up logging")?;

        match self.command {
            Command::Hsn => run_hsn(),
            Command::Paye { raw_dir, out_dir } => run_paye(raw_dir, out_dir),
        }
    }
}

fn run_hsn() -> Result<()> {
    let config = ExtractorConfig::from_env().wrap_err("HSN configuration")?;
    let fetcher = HttpFetcher::new(&config)?;
    let controller = RunController::new(config, fetcher)?;

    let summary = controller.run(None)?;
    info!(
        added = summary.rows_added,
        completed = summary.completed.len(),
        output = %controller.output_path().display(),
        "HSN run summary"
    );
    match summary.failure {
        Some(f) => Err(eyre!("stopped at root {}: {}", f.root, f.error)),
        None => Ok(()),
    }
}

fn run_paye(raw_dir: Option<PathBuf>, out_dir: Option<PathBuf>) -> Result<()> {
    let mut config = PayeConfig::default();
    if let Some(dir) = raw_dir {
        config.raw_dir = dir;
    }
    if let Some(dir) = out_dir {
        config.processed_dir = dir;
    }
    let written = paye::run(&config)
        .wrap_err_with(|| format!("PAYE extraction from {}", config.raw_dir.display()))?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
