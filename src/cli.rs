use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::{DEFAULT_URL, RunnerConfig};
use crate::payload::{ChairUpdate, DEFAULT_CHAIR_ID};
use crate::runner::{Runner, report};

#[derive(Debug, Parser)]
#[command(name = "chair-ping")]
#[command(about = "Send a chair occupancy update to the chairs API and print the reply")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, env = "CHAIR_PING_URL", default_value = DEFAULT_URL, help = "Chairs endpoint")]
    pub url: String,

    #[arg(long, global = true, env = "CHAIR_PING_TIMEOUT_MS", help = "Request timeout in milliseconds (none by default)")]
    pub timeout_ms: Option<u64>,

    #[arg(long, global = true, env = "CHAIR_PING_API_KEY", hide_env_values = true, help = "Sent as the x-api-key header")]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "POST an occupancy update (the default)")]
    Update {
        #[arg(long, default_value = DEFAULT_CHAIR_ID)]
        chair: String,

        #[arg(long, help = "Report the chair as free instead of occupied")]
        vacant: bool,
    },

    #[command(about = "GET the stored chair state")]
    State,

    #[command(about = "GET /health on the same server")]
    Health,
}

impl Cli {
    pub fn runner_config(&self) -> RunnerConfig {
        let mut config = RunnerConfig::new(self.url.clone());
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        if let Some(api_key) = &self.api_key {
            config = config.with_api_key(api_key.clone());
        }
        config
    }
}

pub async fn run<W: Write>(cli: Cli, out: &mut W) -> anyhow::Result<()> {
    let runner = Runner::new(cli.runner_config());
    run_with(&runner, cli.command, out).await
}

/// Executes one command against `runner` and reports the response to `out`.
pub async fn run_with<W: Write>(
    runner: &Runner,
    command: Option<Commands>,
    out: &mut W,
) -> anyhow::Result<()> {
    let url = &runner.config().url;
    let response = match command.unwrap_or(Commands::Update {
        chair: DEFAULT_CHAIR_ID.to_string(),
        vacant: false,
    }) {
        Commands::Update { chair, vacant } => runner
            .update(&ChairUpdate::new(chair, !vacant))
            .await
            .with_context(|| format!("POST {url} failed"))?,
        Commands::State => runner
            .state()
            .await
            .with_context(|| format!("GET {url} failed"))?,
        Commands::Health => runner
            .health()
            .await
            .with_context(|| format!("health check against {url} failed"))?,
    };

    report(out, &response).context("failed to write report")?;
    Ok(())
}
