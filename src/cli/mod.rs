//! CLI argument parsing and command dispatch

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use url::Url;

use churn_bench_client::ClientConfig;
use churn_bench_core::ScenarioConfig;

mod run;

#[derive(Parser)]
#[command(name = "churn-bench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Churn WebSocket connections against a backend
    Run(RunArgs),
    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Backend host[:port]; derives both endpoints
    #[arg(long, env = "BACKEND_HOSTNAME")]
    pub backend_hostname: Option<String>,

    /// Login endpoint (overrides the derived one)
    #[arg(long)]
    pub login_url: Option<Url>,

    /// WebSocket endpoint (overrides the derived one)
    #[arg(long)]
    pub ws_url: Option<Url>,

    /// Total iterations shared by all virtual users [default: 1000]
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Number of virtual users [default: 20]
    #[arg(long)]
    pub workers: Option<usize>,

    /// Global ceiling on iterations per second [default: 100]
    #[arg(long)]
    pub rps: Option<f64>,

    /// Iterations admitted back to back before pacing [default: 1]
    #[arg(long)]
    pub burst: Option<u32>,

    /// Password shared by every synthetic user [default: test]
    #[arg(long)]
    pub password: Option<String>,

    /// Handshake status meaning "pool is full" [default: 503]
    #[arg(long)]
    pub rejection_status: Option<u16>,

    /// Stop claiming new iterations after this many seconds
    #[arg(long)]
    pub max_duration_secs: Option<u64>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the final summary as JSON to this path
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Contents of a `--config` file
///
/// Scenario fields sit at the top level; network tuning goes under `client`.
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub scenario: ScenarioConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

impl ConfigFile {
    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Validate both halves of the file
    pub fn validate(&self) -> Result<()> {
        self.scenario
            .validate()
            .context("invalid scenario configuration")?;
        self.client
            .validate()
            .context("invalid client configuration")?;
        Ok(())
    }
}

impl RunArgs {
    /// Merge the config file (if any) with command-line overrides
    pub fn resolve(&self) -> Result<(ScenarioConfig, ClientConfig)> {
        let (mut scenario, client) = match &self.config {
            Some(path) => {
                let file = ConfigFile::load(path)?;
                (Some(file.scenario), file.client)
            }
            None => (None, ClientConfig::default()),
        };

        if let Some(host) = &self.backend_hostname {
            let derived = ScenarioConfig::for_backend(host)
                .with_context(|| format!("invalid backend hostname {host:?}"))?;
            scenario = Some(match scenario {
                Some(mut existing) => {
                    existing.login_url = derived.login_url;
                    existing.websocket_url = derived.websocket_url;
                    existing
                }
                None => derived,
            });
        }

        let mut scenario = match (scenario, &self.login_url, &self.ws_url) {
            (Some(existing), _, _) => existing,
            (None, Some(login), Some(ws)) => ScenarioConfig::new(login.clone(), ws.clone()),
            (None, _, _) => bail!(
                "no backend given: pass --backend-hostname (or BACKEND_HOSTNAME), \
                 --login-url with --ws-url, or --config"
            ),
        };

        if let Some(url) = &self.login_url {
            scenario.login_url = url.clone();
        }
        if let Some(url) = &self.ws_url {
            scenario.websocket_url = url.clone();
        }
        if let Some(iterations) = self.iterations {
            scenario.total_iterations = iterations;
        }
        if let Some(workers) = self.workers {
            scenario.workers = workers;
        }
        if let Some(rps) = self.rps {
            scenario.rate_per_second = rps;
        }
        if let Some(burst) = self.burst {
            scenario.burst = burst;
        }
        if let Some(password) = &self.password {
            scenario.password = password.clone();
        }
        if let Some(status) = self.rejection_status {
            scenario.rejection_status = status;
        }
        if let Some(secs) = self.max_duration_secs {
            scenario.max_duration = Some(Duration::from_secs(secs));
        }

        scenario.validate().context("invalid scenario configuration")?;
        client.validate().context("invalid client configuration")?;

        Ok((scenario, client))
    }
}

/// Execute the parsed command
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run::execute(args).await,
        Commands::Validate { config } => {
            let file = ConfigFile::load(&config)?;
            file.validate()?;
            println!(
                "{} is valid: {} iterations, {} workers, {} rps against {}",
                config.display(),
                file.scenario.total_iterations,
                file.scenario.workers,
                file.scenario.rate_per_second,
                file.scenario.websocket_url
            );
            Ok(())
        }
    }
}
