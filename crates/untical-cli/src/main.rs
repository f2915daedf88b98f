//! untical CLI entry point.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, debug};

use untical_core::tracing::{TracingConfig, init_tracing};
use untical_untis::UntisClient;

use crate::cli::Cli;
use crate::error::CliResult;

mod cli;
mod error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default().with_level(Level::WARN)
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = cli.resolve_config()?;
    let client = UntisClient::new(config)?;

    let feed = if cli.json {
        let document = client.clean_feed(cli.weeks, cli.date).await?;
        serde_json::to_string_pretty(&document)?
    } else {
        client.calendar_feed(cli.weeks, cli.date).await?
    };

    write_output(cli.output.as_deref(), &feed)
}

fn write_output(path: Option<&Path>, feed: &str) -> CliResult<()> {
    match path {
        Some(path) => {
            std::fs::write(path, feed)?;
            debug!(path = %path.display(), "feed written");
        }
        None => println!("{feed}"),
    }
    Ok(())
}
