// src/bin/cli.rs
use clap::Parser;
use zimra_extract::cli::Cli;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    // A missing .env is fine; the environment may already be set.
    let _ = dotenvy::dotenv();
    Cli::parse().run()
}
