use anyhow::Context;
use fetcher::{FieldCache, RecordStore, Warnings};
use futures::{StreamExt, TryStreamExt};
use graph::Resolver;
use models::{AlertDefinition, ExplorerConfig};
use projection::{AccountPayload, ExplorerData, Layout, Triggered};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Tunables of a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum number of accounts which are evaluated concurrently.
    pub concurrency: usize,
    /// Deadline for fetching records from the remote store.
    pub timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout: Duration::from_secs(5 * 60),
        }
    }
}

/// RunResult is the outcome of exploring a set of accounts.
#[derive(serde::Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Sanitized account identifiers of the run, in request order.
    pub account_ids: Vec<String>,
    /// Identifiers of accounts which the remote store didn't return.
    pub missing_account_ids: Vec<String>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub data: ExplorerData,
}

/// Sanitize the alert definitions of `config`.
/// Malformed components are logged and dropped.
pub fn load_alerts(config: &ExplorerConfig) -> Vec<AlertDefinition> {
    let validation::Sanitized { alerts, errors } = validation::sanitize_alerts(&config.alerts);

    for err in errors {
        tracing::debug!(error = %err, "dropped malformed alert component");
    }
    alerts
}

/// Explore `account_ids`: fetch their records from `store`, resolve each
/// account's graph, evaluate `alerts` against it, and project the result.
///
/// Invalid account identifiers are dropped. Degraded entity types and
/// failed alert evaluations are reported as warnings of the result,
/// while failures of the remote store (or an expired timeout) fail the run.
#[tracing::instrument(skip_all, err, fields(accounts = account_ids.len(), alerts = alerts.len()))]
pub async fn run<S: AsRef<str>>(
    store: &dyn RecordStore,
    cache: &FieldCache,
    config: &ExplorerConfig,
    alerts: Vec<AlertDefinition>,
    account_ids: &[S],
    options: &RunOptions,
) -> anyhow::Result<RunResult> {
    let generated_at = chrono::Utc::now();
    let account_ids = models::sanitize_account_ids(account_ids);

    if account_ids.is_empty() {
        tracing::warn!("no valid account identifiers were provided");

        return Ok(RunResult {
            account_ids,
            missing_account_ids: Vec::new(),
            generated_at,
            data: ExplorerData {
                objects: Layout::new(config, &BTreeMap::new()).views(),
                alerts,
                ..Default::default()
            },
        });
    }

    let mut fetched = tokio::time::timeout(
        options.timeout,
        fetcher::fetch(store, cache, config, &account_ids),
    )
    .await
    .map_err(|_| {
        anyhow::anyhow!(
            "fetching account records timed out after {}",
            humantime::format_duration(options.timeout)
        )
    })?
    .context("failed to fetch account records")?;

    let layout = Layout::new(config, &fetched.plans);
    let warnings = Warnings::from(std::mem::take(&mut fetched.warnings));
    let missing_account_ids = std::mem::take(&mut fetched.missing_account_ids);
    let resolver = Resolver::new(config.registry(), fetched);

    let explorer = Arc::new(Explorer {
        resolver,
        layout,
        alerts,
        warnings,
    });

    let accounts: Vec<AccountPayload> = futures::stream::iter(account_ids.iter().cloned())
        .map(|account_id| {
            let explorer = explorer.clone();
            tokio::task::spawn_blocking(move || explorer.explore(&account_id))
        })
        .buffered(options.concurrency.max(1))
        .try_collect()
        .await
        .context("account evaluation task failed")?;

    let Explorer {
        resolver,
        layout,
        alerts,
        warnings,
    } = Arc::try_unwrap(explorer)
        .map_err(|_| anyhow::anyhow!("account evaluation tasks are still running"))?;

    let data = ExplorerData {
        accounts,
        objects: layout.views(),
        summary: projection::summary(&layout, resolver.pools()),
        alerts,
        warnings: warnings.into_inner(),
    };

    tracing::info!(
        accounts = data.accounts.len(),
        missing = missing_account_ids.len(),
        warnings = data.warnings.len(),
        "explored accounts"
    );

    Ok(RunResult {
        account_ids,
        missing_account_ids,
        generated_at,
        data,
    })
}

// Explorer is the shared, read-only state of a run's account evaluations.
// Only its warnings are written, with an insert-if-absent discipline.
struct Explorer {
    resolver: Resolver,
    layout: Layout,
    alerts: Vec<AlertDefinition>,
    warnings: Warnings,
}

impl Explorer {
    fn explore(&self, account_id: &str) -> AccountPayload {
        let graph = self.resolver.resolve(account_id);
        let mut payload = projection::render_account(&self.layout, &graph);

        let mut triggered = Vec::new();
        for alert in &self.alerts {
            match alerts::evaluate(alert, &graph) {
                Ok(outcome) if outcome.passed => {
                    triggered.push(Triggered::new(alert, outcome.matches));
                }
                Ok(_) => (),
                Err(err) => {
                    tracing::warn!(alert = %alert.id, account_id, error = %err, "failed to evaluate alert");
                    self.warnings
                        .insert(&format!("alert:{}", alert.id), format!("{}: {err}", alert.label));
                }
            }
        }
        projection::attach_alerts(&mut payload, triggered);

        payload
    }
}
