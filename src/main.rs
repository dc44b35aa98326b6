mod batch;
mod cli;
mod config;
mod discovery;
mod http;
mod progress;
mod records;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use batch::BatchCoordinator;
use cli::Cli;
use progress::ProgressReporter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load env before parsing so .env can supply SERPAPI_KEY
    let _ = dotenv::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    let methods = records::load_records(&cli.input)
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;
    if methods.is_empty() {
        bail!("No valid API methods found in {}", cli.input.display());
    }
    info!(count = methods.len(), input = %cli.input.display(), "Loaded API methods");

    let config = cli.build_config();
    let coordinator = BatchCoordinator::from_config(&config)?;

    let reporter = ProgressReporter::new(methods.len())?;
    let report = coordinator.run(methods, &reporter).await;
    reporter.finish();

    let (csv_path, json_path) = records::save_results(&report.results, &cli.output)?;
    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "Results saved to {} and {}",
        csv_path.display(),
        json_path.display()
    );

    Ok(())
}
