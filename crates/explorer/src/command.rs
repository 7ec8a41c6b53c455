use super::{load_alerts, load_config, Output, RunOptions};
use anyhow::Context;
use fetcher::{FieldCache, FixtureStore, RecordStore};
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
#[clap(rename_all = "kebab-case")]
pub struct Run {
    /// Path to the explorer configuration, as YAML or JSON.
    #[clap(long)]
    config: PathBuf,
    /// Account identifiers, separated by whitespace, commas or semicolons.
    #[clap(long)]
    ids: Option<String>,
    /// Path to a file of account identifiers, separated as with --ids.
    #[clap(long)]
    ids_file: Option<PathBuf>,
    /// Path to a fixture document of records to explore,
    /// which is used instead of a remote instance.
    #[clap(long, conflicts_with = "instance_url")]
    fixture: Option<PathBuf>,
    /// Base URL of the remote instance to explore.
    #[clap(long)]
    instance_url: Option<url::Url>,
    /// Bearer access token of the remote instance.
    #[clap(long, env = "ACCOUNT_EXPLORER_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
    /// Maximum number of accounts to evaluate concurrently.
    #[clap(long, default_value_t = 8)]
    concurrency: usize,
    /// Deadline for fetching records, such as "90s" or "5m".
    #[clap(long, default_value = "5m")]
    timeout: humantime::Duration,
}

impl Run {
    pub async fn run(&self, output: &Output) -> anyhow::Result<()> {
        let Self {
            config,
            ids,
            ids_file,
            fixture,
            instance_url,
            access_token,
            concurrency,
            timeout,
        } = self;

        let config = load_config(config)?;
        let alerts = load_alerts(&config);

        if ids.is_none() && ids_file.is_none() {
            anyhow::bail!("one of --ids or --ids-file is required");
        }
        let mut text = ids.clone().unwrap_or_default();
        if let Some(path) = ids_file {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read account identifiers {path:?}"))?;
            text.push('\n');
            text.push_str(&content);
        }
        let account_ids = models::parse_account_ids(&text);

        let store: Box<dyn RecordStore> = match (fixture, instance_url) {
            (Some(path), _) => {
                let content = std::fs::read(path)
                    .with_context(|| format!("failed to read fixture {path:?}"))?;
                let store = FixtureStore::from_slice(&content)
                    .with_context(|| format!("failed to parse fixture {path:?}"))?;
                Box::new(store)
            }
            (None, Some(instance_url)) => {
                let Some(access_token) = access_token else {
                    anyhow::bail!("--access-token is required with --instance-url");
                };
                Box::new(salesforce::Client::new(
                    instance_url.clone(),
                    access_token.clone(),
                ))
            }
            (None, None) => anyhow::bail!("one of --fixture or --instance-url is required"),
        };

        let options = RunOptions {
            concurrency: *concurrency,
            timeout: (*timeout).into(),
        };
        let result = super::run(
            store.as_ref(),
            &FieldCache::new(),
            &config,
            alerts,
            &account_ids,
            &options,
        )
        .await?;

        output.write(&result)
    }
}

#[derive(Debug, clap::Args)]
#[clap(rename_all = "kebab-case")]
pub struct Alerts {
    /// Path to the explorer configuration, as YAML or JSON.
    #[clap(long)]
    config: PathBuf,
}

impl Alerts {
    pub fn run(&self, output: &Output) -> anyhow::Result<()> {
        let config = load_config(&self.config)?;
        output.write(&load_alerts(&config))
    }
}
