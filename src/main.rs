use clap::Parser;
use tracing_subscriber::EnvFilter;

use chair_ping::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // stdout is reserved for the report.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    chair_ping::cli::run(cli, &mut std::io::stdout().lock()).await
}
