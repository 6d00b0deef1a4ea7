//! `churn-bench run`

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use churn_bench_client::ChurnClient;
use churn_bench_core::{Check, MetricsAggregator, OrchestratorBuilder, ScenarioSummary};

use super::RunArgs;

const PROGRESS_TICK: Duration = Duration::from_millis(100);

pub async fn execute(args: RunArgs) -> Result<()> {
    let (scenario, client_config) = args.resolve()?;

    let client = ChurnClient::for_scenario(&scenario, client_config)
        .context("failed to create protocol client")?;
    let total = scenario.total_iterations as u64;

    let orchestrator = OrchestratorBuilder::new()
        .config(scenario)
        .client(Arc::new(client))
        .build()
        .context("failed to build orchestrator")?;

    let progress = if args.no_progress {
        None
    } else {
        Some(spawn_progress(orchestrator.metrics(), total))
    };

    let result = orchestrator.run_with_signal_handling().await;

    if let Some((bar, handle)) = progress {
        handle.abort();
        bar.set_position(orchestrator.metrics().total());
        bar.finish_and_clear();
    }

    let summary = result.context("scenario failed")?;
    print_summary(&summary);

    if let Some(path) = &args.summary_json {
        let json = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Summary written");
    }

    Ok(())
}

fn spawn_progress(
    metrics: Arc<MetricsAggregator>,
    total: u64,
) -> (ProgressBar, tokio::task::JoinHandle<()>) {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let ticker = bar.clone();
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(PROGRESS_TICK);
        loop {
            interval.tick().await;
            let snapshot = metrics.snapshot();
            ticker.set_position(snapshot.total());
            ticker.set_message(format!(
                "admitted {} | full {} | unexpected {} | auth {}",
                snapshot.pool_is_not_full,
                snapshot.pool_is_full,
                snapshot.unexpected_response,
                snapshot.auth_failed
            ));
        }
    });

    (bar, handle)
}

fn print_summary(summary: &ScenarioSummary) {
    let elapsed = (summary.finished_at - summary.started_at)
        .to_std()
        .unwrap_or_default();

    println!();
    println!(
        "iterations: {}/{} in {:.2}s ({:.1}/s)",
        summary.metrics.total(),
        summary.budget,
        elapsed.as_secs_f64(),
        summary.workers.iterations_per_second
    );
    for (name, value) in summary.metrics.counters() {
        println!("  {name:.<24} {value}");
    }

    println!("checks:");
    for check in Check::ALL {
        if let Some(tally) = summary.metrics.check(check) {
            println!(
                "  {:.<24} {:.2}% ({} passed, {} failed)",
                tally.name,
                tally.pass_rate() * 100.0,
                tally.passes,
                tally.fails
            );
        }
    }

    if !summary.is_complete() {
        println!(
            "stopped early: {} of {} iterations not run",
            summary.budget as u64 - summary.metrics.total(),
            summary.budget
        );
    }
}
