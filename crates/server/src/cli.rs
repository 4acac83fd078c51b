//! CLI argument parsing and subcommand dispatch.

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use hostwatch_core::{ClassifiedMetric, Config, MetricKind, RiskEstimate};
use hostwatch_monitor::{Analyzer, MonitorRunner, SysinfoCollector};
use hostwatch_notify::AlertManager;
use hostwatch_predict::FailurePredictor;
use hostwatch_rules::{classify, score, HealthPolicy};
use hostwatch_storage::{NullSink, Persistence};

use crate::router::build_router;
use crate::shutdown;
use crate::state::AppState;

/// How long shutdown waits for queued log rows to reach disk.
const PERSISTENCE_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "hostwatch", version, about = "Host health monitor with failure-risk estimates and alerting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the monitoring loop and the read-only API (default)
    Serve,
    /// Run a single collect and analyze cycle and print the record as JSON
    Once,
    /// Estimate failure risk for the given metric values
    Predict(PredictArgs),
    /// Send a test notification through every configured channel
    TestAlert,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct PredictArgs {
    /// CPU usage, percent
    #[arg(long)]
    pub cpu: f64,
    /// RAM usage, percent
    #[arg(long)]
    pub ram: f64,
    /// Root disk usage, percent
    #[arg(long)]
    pub disk: f64,
    /// Combined network throughput, MB/s
    #[arg(long)]
    pub network: Option<f64>,
    /// Hottest sensor, °C
    #[arg(long)]
    pub temp: Option<f64>,
    #[arg(long)]
    pub processes: Option<u64>,
}

impl PredictArgs {
    fn values(&self) -> [(MetricKind, Option<f64>); 6] {
        [
            (MetricKind::Cpu, Some(self.cpu)),
            (MetricKind::Ram, Some(self.ram)),
            (MetricKind::Disk, Some(self.disk)),
            (MetricKind::Network, self.network),
            (MetricKind::Temperature, self.temp),
            (MetricKind::ProcessCount, self.processes.map(|p| p as f64)),
        ]
    }

    /// Classify the supplied values against `policy`; omitted metrics drop out.
    pub fn classify(&self, policy: &HealthPolicy) -> Vec<ClassifiedMetric> {
        self.values()
            .into_iter()
            .filter_map(|(kind, value)| classify(kind, value, &policy.spec.thresholds))
            .collect()
    }
}

#[derive(Serialize)]
struct PredictOutput {
    metrics: Vec<ClassifiedMetric>,
    health_score: u32,
    risk: RiskEstimate,
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Once => once(config).await,
        Command::Predict(args) => predict(&config, &args),
        Command::TestAlert => test_alert(&config).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.log_summary();

    let listener = if config.api.enabled {
        let addr = format!("{}:{}", config.api.host, config.api.port);
        let listener = TcpListener::bind(&addr).await?;
        info!("API listening on http://{}", addr);
        Some(listener)
    } else {
        info!("API disabled");
        None
    };

    let persistence = Persistence::from_config(&config.storage);
    let sink = persistence.sink();
    let analyzer = Analyzer::from_config(&config, sink.clone())?;
    let (runner, handle) =
        MonitorRunner::new(SysinfoCollector::new(), analyzer, sink, config.monitor.interval);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match shutdown::os_signal().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // Keep the sender alive: dropping it would stop the monitor.
                error!(error = %e, "failed to register signal handlers");
                std::future::pending::<()>().await;
            }
        }
    });

    let monitor = tokio::spawn(runner.run(shutdown_rx.clone()));

    if let Some(listener) = listener {
        let app = build_router(Arc::new(AppState::new(handle)));
        let mut stop = shutdown_rx;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop.wait_for(|stopped| *stopped).await;
            })
            .await?;
    }

    monitor.await?;
    persistence.close(PERSISTENCE_GRACE).await;
    info!("hostwatch stopped");
    Ok(())
}

async fn once(config: Config) -> anyhow::Result<()> {
    let persistence = Persistence::from_config(&config.storage);
    let sink = persistence.sink();
    let analyzer = Analyzer::from_config(&config, sink.clone())?;
    let (mut runner, _handle) =
        MonitorRunner::new(SysinfoCollector::new(), analyzer, sink, config.monitor.interval);

    let report = runner.run_cycle().await?;
    println!("{}", serde_json::to_string_pretty(&report.record)?);

    runner.flush().await;
    drop(runner);
    persistence.close(PERSISTENCE_GRACE).await;
    Ok(())
}

fn predict(config: &Config, args: &PredictArgs) -> anyhow::Result<()> {
    let policy = HealthPolicy::load_or_builtin(config.monitor.policy_path.as_deref())?;
    let metrics = args.classify(&policy);

    // Ad-hoc estimates stay out of the prediction log.
    let predictor = FailurePredictor::from_config(&config.prediction, Arc::new(NullSink));
    let output = PredictOutput {
        health_score: score(&metrics, &policy.spec.weights, policy.spec.score_range),
        risk: predictor.predict(&metrics),
        metrics,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn test_alert(config: &Config) -> anyhow::Result<()> {
    let alerts = AlertManager::from_config(&config.alerts)?;
    if !alerts.is_enabled() {
        warn!("alerts are disabled; sending the test anyway");
    }

    let results = alerts.send_test().await;
    if results.is_empty() {
        anyhow::bail!("no alert channels configured");
    }

    let mut failed = 0;
    for r in &results {
        match &r.error {
            None => println!("{:<10} ok      {}ms", r.channel, r.duration_ms),
            Some(e) => {
                failed += 1;
                println!("{:<10} FAILED  {}ms  {}", r.channel, r.duration_ms, e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} channels failed", failed, results.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostwatch_core::Severity;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hostwatch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_subcommand_means_serve() {
        assert!(parse(&[]).command.is_none());
    }

    #[test]
    fn parses_predict_flags() {
        let cli = parse(&["predict", "--cpu", "95", "--ram", "50", "--disk", "40", "--temp", "70"]);
        match cli.command {
            Some(Command::Predict(args)) => {
                assert_eq!(args.cpu, 95.0);
                assert_eq!(args.temp, Some(70.0));
                assert_eq!(args.network, None);
                assert_eq!(args.processes, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn predict_requires_core_metrics() {
        let err = Cli::try_parse_from(["hostwatch", "predict", "--cpu", "10"]);
        assert!(err.is_err());
    }

    #[test]
    fn parses_kebab_case_subcommand() {
        assert!(matches!(parse(&["test-alert"]).command, Some(Command::TestAlert)));
        assert!(matches!(parse(&["once"]).command, Some(Command::Once)));
    }

    #[test]
    fn predict_classifies_supplied_metrics_only() {
        let args = PredictArgs {
            cpu: 95.0,
            ram: 50.0,
            disk: 40.0,
            network: None,
            temp: Some(80.0),
            processes: None,
        };
        let metrics = args.classify(&HealthPolicy::builtin());
        let kinds: Vec<_> = metrics.iter().map(|m| m.metric).collect();
        assert_eq!(
            kinds,
            vec![MetricKind::Cpu, MetricKind::Ram, MetricKind::Disk, MetricKind::Temperature]
        );
        assert_eq!(metrics[0].tier, Severity::Critical);
        assert_eq!(metrics[3].tier, Severity::High);

        let risk = hostwatch_predict::rule_based_estimate(&metrics, 0.75);
        assert_eq!(risk.probability, 55);
    }
}
