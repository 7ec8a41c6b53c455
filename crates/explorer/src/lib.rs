use anyhow::Context;
use clap::Parser;
use models::ExplorerConfig;
use std::path::Path;

mod command;
mod explore;
mod output;

pub use explore::{load_alerts, run, RunOptions, RunResult};
pub use output::{Output, OutputType};

/// Explore CRM accounts, their related records, and the alerts they trigger.
#[derive(Debug, Parser)]
#[clap(author, about, version)]
pub struct Cli {
    #[clap(subcommand)]
    cmd: Command,

    #[clap(flatten)]
    output: Output,
}

#[derive(Debug, clap::Subcommand)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Explore accounts and evaluate the configured alerts against them.
    ///
    /// Records are fetched from a remote instance, or from a local fixture
    /// document. The outcome of the run is written to stdout.
    Run(command::Run),
    /// Print the sanitized alert definitions of a configuration.
    ///
    /// Malformed alert components are dropped, and are logged at debug level
    /// (use RUST_LOG=debug to see them).
    Alerts(command::Alerts),
    /// Print the JSON schema of the explorer configuration.
    JsonSchema,
}

impl Cli {
    pub async fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Run(run) => run.run(&self.output).await,
            Command::Alerts(alerts) => alerts.run(&self.output),
            Command::JsonSchema => self.output.write(&schemars::schema_for!(ExplorerConfig)),
        }
    }
}

/// Load the explorer configuration at `path`.
pub fn load_config(path: &Path) -> anyhow::Result<ExplorerConfig> {
    let content =
        std::fs::read(path).with_context(|| format!("failed to read configuration {path:?}"))?;

    ExplorerConfig::from_slice(&content)
        .with_context(|| format!("failed to load configuration {path:?}"))
}
