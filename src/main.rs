use anyhow::Result;
use clap::Parser;
use jcz::commands::{self, Cli, Request};
use jcz::config::Settings;
use jcz::logger;
use std::process::ExitCode;

/// Entry point for the jcz CLI application.
/// Parses command-line arguments, validates them, then runs the batch.
fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load()?;
    let plan = commands::prepare(Request::new(cli, settings))?;
    commands::execute(plan)
}
