//! rdfetch binary.
//!
//! Parses the identifier range from the command line, loads configuration,
//! wires the browser engine, CAPTCHA solver, and portal clients together,
//! and hands the run to the lookup orchestrator.

use anyhow::{Context, Result};
use clap::Parser;
use rdfetch_browser::{BrowserEngine, ChromiumRenderer, DocumentRenderer, EngineOptions};
use rdfetch_captcha::{CaptchaSolver, TwoCaptchaSolver};
use rdfetch_core::{AppConfig, CrashDate, RdRange};
use rdfetch_ledger::ResultLedger;
use rdfetch_pipeline::{LookupOrchestrator, PipelineTiming, RunReport};
use rdfetch_portal::{NewSiteClient, OldSiteClient, RecordCapture, RecordSearch};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Bulk crash-report retrieval across the new and legacy portals.
#[derive(Parser, Debug)]
#[command(name = "rdfetch")]
#[command(version, about, long_about = None)]
struct Args {
    /// Report identifier prefix (uppercase letters, e.g. JG)
    #[arg(long)]
    prefix: String,

    /// First numeric suffix of the range (inclusive)
    #[arg(long)]
    start: u32,

    /// Last numeric suffix of the range (inclusive)
    #[arg(long)]
    end: u32,

    /// Crash date submitted with every lookup, in MM-DD-YYYY form
    #[arg(long)]
    date: String,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many outer passes even if timeouts remain
    #[arg(long)]
    max_passes: Option<u32>,

    /// Run the browser with a visible window
    #[arg(long)]
    headful: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        AppConfig::load_with_env(args.config.as_deref()).context("failed to load configuration")?;
    if args.headful {
        config.browser.headless = false;
    }
    if args.max_passes.is_some() {
        config.run.max_passes = args.max_passes;
    }

    init_tracing(&config.output.log_path).context("failed to set up logging")?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        headless = config.browser.headless,
        log = %config.output.log_path.display(),
        "rdfetch starting"
    );

    // Everything that can be rejected is rejected before a browser launches.
    config.validate().context("configuration incomplete")?;
    let range = RdRange::new(&args.prefix, args.start, args.end)?;
    let date = CrashDate::new(&args.date)?;

    let report = run(&config, &range, &date).await?;
    info!(
        successful = %config.output.successful_path.display(),
        unsuccessful = %config.output.unsuccessful_path.display(),
        timed_out = %config.output.timed_out_path.display(),
        artifacts = %config.output.artifact_dir.display(),
        "results written"
    );

    if !report.converged {
        anyhow::bail!(
            "run stopped after {} passes without convergence",
            report.passes
        );
    }
    Ok(())
}

/// Wire the components together and execute one full run.
async fn run(config: &AppConfig, range: &RdRange, date: &CrashDate) -> Result<RunReport> {
    std::fs::create_dir_all(&config.output.artifact_dir)
        .context("failed to create artifact directory")?;

    let engine = Arc::new(BrowserEngine::new(EngineOptions {
        headless: config.browser.headless,
        window_width: config.browser.window_width,
        window_height: config.browser.window_height,
        request_timeout: Duration::from_secs(config.browser.request_timeout_secs),
    }));
    let solver: Arc<dyn CaptchaSolver> = Arc::new(TwoCaptchaSolver::new(
        &config.captcha.api_key,
        &config.captcha.service_url,
    )?);
    let renderer: Arc<dyn DocumentRenderer> = Arc::new(ChromiumRenderer::new(engine.clone()));

    let search: Arc<dyn RecordSearch> = Arc::new(NewSiteClient::new(
        engine.clone(),
        solver.clone(),
        &config.portals.new_site_url,
        &config.captcha.new_site_key,
    ));
    let capture: Arc<dyn RecordCapture> = Arc::new(OldSiteClient::new(
        engine.clone(),
        solver,
        renderer,
        &config.portals.old_site_url,
        &config.captcha.old_site_key,
        &config.output.artifact_dir,
    ));

    let ledger = ResultLedger::open(
        &config.output.successful_path,
        &config.output.unsuccessful_path,
        &config.output.timed_out_path,
    )
    .context("failed to open result ledger")?;

    let timing = PipelineTiming {
        max_passes: config.run.max_passes,
        ..PipelineTiming::default()
    };
    let mut orchestrator = LookupOrchestrator::new(search, capture, ledger, timing);

    // Shut the browser down even when the run errors out.
    let report = orchestrator.run(range, date).await;
    engine.shutdown().await;
    Ok(report?)
}

/// Send log lines to the console and append them to the diagnostic log file.
fn init_tracing(log_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file)
                .with_ansi(false),
        )
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_full_invocation() {
        let args = Args::parse_from([
            "rdfetch",
            "--prefix",
            "JG",
            "--start",
            "1",
            "--end",
            "500",
            "--date",
            "01-15-2024",
            "--max-passes",
            "3",
        ]);
        assert_eq!(args.prefix, "JG");
        assert_eq!(args.start, 1);
        assert_eq!(args.end, 500);
        assert_eq!(args.date, "01-15-2024");
        assert_eq!(args.max_passes, Some(3));
        assert!(!args.headful);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_args_require_range() {
        let result = Args::try_parse_from(["rdfetch", "--prefix", "JG"]);
        assert!(result.is_err());
    }
}
