//! pgcsv CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pgcsv::cli::Args;
use pgcsv::config::{self, ConnectionParams};
use pgcsv::{pipeline, ExportSummary, Result};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_filter().into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&args).await {
        Ok(summary) => {
            println!("Data exported to {}", summary.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<ExportSummary> {
    config::load_settings_file(&args.env_file)?;
    let params = ConnectionParams::from_env();
    info!(
        env_file = %args.env_file.display(),
        query = %args.query.display(),
        output = %args.output.display(),
        "starting export"
    );

    pipeline::run(&params, &args.export_options()).await
}
