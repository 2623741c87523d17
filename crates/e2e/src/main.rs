//! Niffler E2E suite runner
//!
//! Exit codes: 0 when every scenario passed, 1 when any failed, 2 when the
//! suite could not be set up (configuration, frontend, browser).

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use niffler_common::Settings;
use niffler_e2e::health::wait_for_frontend;
use niffler_e2e::scenarios;
use niffler_e2e::{E2eResult, RunnerConfig, TestRunner, TestSuiteResult};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Run the Niffler end-to-end scenarios
#[derive(Parser)]
#[command(name = "niffler-e2e")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run only the named scenario (repeatable)
    #[arg(short, long = "scenario")]
    scenarios: Vec<String>,

    /// Run only scenarios carrying this tag
    #[arg(short, long, conflicts_with = "scenarios")]
    tag: Option<String>,

    /// List scenarios and exit
    #[arg(long)]
    list: bool,

    /// Directory for test-results.json
    #[arg(long, default_value = "test-results")]
    output_dir: PathBuf,

    /// Seconds to wait for the frontend to answer
    #[arg(long, default_value_t = 60)]
    probe_timeout: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    if cli.list {
        for scenario in scenarios::registry() {
            println!("{:<36} {}", scenario.name, scenario.tags.join(","));
        }
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(suite) if suite.success() => ExitCode::SUCCESS,
        Ok(suite) => {
            error!("{} of {} scenario(s) failed", suite.failed, suite.total);
            ExitCode::from(1)
        }
        Err(e) => {
            error!("Suite setup failed: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> E2eResult<TestSuiteResult> {
    let settings = Settings::from_env()?;
    let selected = scenarios::select(&cli.scenarios)?;

    wait_for_frontend(
        settings.frontend_url()?,
        Duration::from_secs(cli.probe_timeout),
    )
    .await?;

    let mut runner = TestRunner::with_config(RunnerConfig {
        settings,
        output_dir: cli.output_dir,
    });

    let outcome = match (&cli.tag, selected.is_empty()) {
        (Some(tag), _) => {
            info!("Running scenarios tagged {:?}", tag);
            runner.run_tagged(tag).await
        }
        (None, false) => runner.run_scenarios(&selected).await,
        (None, true) => runner.run_all().await,
    };

    if let Err(e) = runner.finish().await {
        warn!("Session cleanup failed: {}", e);
    }

    let suite = outcome?;
    runner.write_results(&suite)?;
    Ok(suite)
}
