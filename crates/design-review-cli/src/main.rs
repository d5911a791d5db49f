//! Design Review CLI
//!
//! The `design-review` command drives reviews through MCP tool servers for
//! the browser and the design tool.
//!
//! ## Commands
//!
//! - `run`: Review every page of a config file once
//! - `review`: Review a single URL
//! - `validate`: Compare an implemented element with its Figma node
//! - `monitor`: Re-review pages on their schedule until Ctrl-C

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use design_review_core::{
    render_review_markdown, AutomatedDesignReview, BridgeConfig, BrowserBridge, CategoryKind,
    DesignReviewConfig, McpBrowserBridge, McpDesignToolBridge, ReviewOptions,
};
use design_review_orchestrator::{
    write_report, DesignReviewOrchestrator, FigmaValidationPipeline, MonitoringScheduler,
    OrchestrationConfig, OrchestrationResult, OverallStatus, ValidationConfig,
};
use tokio::sync::watch;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "design-review")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Automated design review for web pages", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    bridges: BridgeArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BridgeArgs {
    /// Browser automation tool server
    #[arg(long, global = true, env = "DESIGN_REVIEW_BROWSER_URL", default_value = "http://127.0.0.1:3100")]
    browser_url: String,

    /// Design tool server
    #[arg(long, global = true, env = "DESIGN_REVIEW_DESIGN_URL", default_value = "http://127.0.0.1:3845")]
    design_url: String,

    /// Bearer token sent to both tool servers
    #[arg(long, global = true, env = "DESIGN_REVIEW_BRIDGE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Per-call timeout in seconds
    #[arg(long, global = true, default_value = "60")]
    timeout: u64,
}

impl BridgeArgs {
    fn config(&self) -> BridgeConfig {
        let config = BridgeConfig::new(&self.browser_url, &self.design_url).with_timeout(self.timeout);
        match &self.token {
            Some(token) => config.with_token(token),
            None => config,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Review every page in a config file once
    Run {
        /// Orchestration config (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Write the run report under this directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Send notifications to the configured channels
        #[arg(long)]
        notify: bool,
    },

    /// Review a single page
    Review {
        /// Page URL
        #[arg(long)]
        url: String,

        /// Page name used in the report
        #[arg(long, default_value = "page")]
        name: String,

        /// Category to skip (repeatable)
        #[arg(long, value_parser = parse_category)]
        skip: Vec<CategoryKind>,
    },

    /// Compare an implemented element with its Figma node
    Validate {
        /// Figma node id
        #[arg(long)]
        node: String,

        /// Page URL
        #[arg(long)]
        url: String,

        /// Element to compare
        #[arg(long, default_value = "body")]
        selector: String,

        /// Minimum visual similarity percentage
        #[arg(long, default_value = "95")]
        tolerance: f64,
    },

    /// Re-review pages on their schedule until Ctrl-C
    Monitor {
        /// Orchestration config (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn parse_category(name: &str) -> std::result::Result<CategoryKind, String> {
    CategoryKind::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = CategoryKind::ALL.iter().map(|k| k.name()).collect();
        format!("unknown category '{name}' (expected one of: {})", known.join(", "))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    design_review_core::telemetry::init_tracing(cli.json, level);

    let bridges = cli.bridges.config();
    match cli.command {
        Commands::Run {
            config,
            output,
            notify,
        } => cmd_run(&bridges, &config, output.as_deref(), notify).await,
        Commands::Review { url, name, skip } => cmd_review(&bridges, &url, &name, &skip).await,
        Commands::Validate {
            node,
            url,
            selector,
            tolerance,
        } => cmd_validate(&bridges, &node, &url, &selector, tolerance).await,
        Commands::Monitor { config } => cmd_monitor(&bridges, &config).await,
    }
}

fn load_config(path: &Path) -> Result<OrchestrationConfig> {
    OrchestrationConfig::load(path)
        .with_context(|| format!("Failed to load orchestration config: {:?}", path))
}

fn browser(bridges: &BridgeConfig) -> Result<Arc<McpBrowserBridge>> {
    let browser = McpBrowserBridge::new(bridges).context("Failed to create browser bridge")?;
    Ok(Arc::new(browser))
}

/// The orchestrator plus the browser it drives, so callers can close it.
fn orchestrator(bridges: &BridgeConfig) -> Result<(DesignReviewOrchestrator, Arc<McpBrowserBridge>)> {
    let browser = browser(bridges)?;
    let design = McpDesignToolBridge::new(bridges).context("Failed to create design tool bridge")?;
    let orchestrator =
        DesignReviewOrchestrator::new(browser.clone()).with_design_tool(Arc::new(design));
    Ok((orchestrator, browser))
}

async fn close_browser(browser: &dyn BrowserBridge) {
    if let Err(e) = browser.close().await {
        warn!(error = %e, "browser did not close cleanly");
    }
}

/// One orchestration run; the browser is released before returning.
async fn review_and_close(
    orchestrator: &DesignReviewOrchestrator,
    browser: &dyn BrowserBridge,
    config: &OrchestrationConfig,
) -> OrchestrationResult {
    let result = orchestrator.orchestrate_review(config).await;
    close_browser(browser).await;
    result
}

async fn cmd_run(bridges: &BridgeConfig, config_path: &Path, output: Option<&Path>, notify: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let (orchestrator, browser) = orchestrator(bridges)?;

    let result = review_and_close(&orchestrator, browser.as_ref(), &config).await;
    println!("{}", result.render_markdown());

    if let Some(dir) = output {
        let path = write_report(&result, dir)
            .with_context(|| format!("Failed to write report under {:?}", dir))?;
        info!(path = %path.display(), "report written");
    }
    if notify {
        let delivered = orchestrator.notify(&result, &config.notifications).await;
        info!(delivered, "notifications sent");
    }

    if result.overall_status == OverallStatus::Failed {
        anyhow::bail!(
            "Design review failed: {}/{} pages passed",
            result.passed_pages,
            result.total_pages
        );
    }
    Ok(())
}

async fn cmd_review(bridges: &BridgeConfig, url: &str, name: &str, skip: &[CategoryKind]) -> Result<()> {
    let browser = browser(bridges)?;
    let review = AutomatedDesignReview::new(browser.clone(), ReviewOptions::default());
    let config = DesignReviewConfig::new(url, name).without(skip);

    let result = review.review_design(&config).await;
    close_browser(browser.as_ref()).await;
    println!("{}", render_review_markdown(&result));

    if !result.passed {
        anyhow::bail!("{} scored {}/100", name, result.overall_score);
    }
    Ok(())
}

async fn cmd_validate(
    bridges: &BridgeConfig,
    node: &str,
    url: &str,
    selector: &str,
    tolerance: f64,
) -> Result<()> {
    let browser = browser(bridges)?;
    let design = McpDesignToolBridge::new(bridges).context("Failed to create design tool bridge")?;
    let pipeline = FigmaValidationPipeline::new(Arc::new(design), browser.clone());
    let config = ValidationConfig::new(node, url, selector).with_thresholds(
        tolerance,
        design_review_orchestrator::config::DEFAULT_TOKEN_COVERAGE_THRESHOLD,
    );

    let validation = pipeline.validate_implementation(&config).await;
    close_browser(browser.as_ref()).await;
    let validation = validation.with_context(|| format!("Failed to validate node {node}"))?;

    println!("{}", serde_json::to_string_pretty(&validation)?);
    if !validation.passed {
        anyhow::bail!(
            "Node {} does not match: similarity {:.1}%, token coverage {:.0}%",
            node,
            validation.visual.similarity,
            validation.token_validation.coverage * 100.0
        );
    }
    Ok(())
}

async fn cmd_monitor(bridges: &BridgeConfig, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let (orchestrator, browser) = orchestrator(bridges)?;
    let scheduler = Arc::new(MonitoringScheduler::new(Arc::new(orchestrator), config));

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C, stopping");
        }
    };
    monitor_until(Arc::clone(&scheduler), browser.as_ref(), ctrl_c).await?;

    println!(
        "Monitoring stopped after {} cycle(s), {} skipped",
        scheduler.cycles_completed(),
        scheduler.cycles_skipped()
    );
    Ok(())
}

/// Run the scheduler until `shutdown` resolves, let the current cycle
/// finish, then close the browser.
async fn monitor_until(
    scheduler: Arc<MonitoringScheduler>,
    browser: &dyn BrowserBridge,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(async move { scheduler.run(rx).await });

    shutdown.await;
    info!("shutdown requested, waiting for the current cycle");
    let _ = tx.send(true);
    let joined = task.await.context("Monitoring task panicked");
    close_browser(browser).await;
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use design_review_core::fakes::ScriptedBrowser;
    use design_review_core::{PageConfig, PagePriority, ReviewFrequency};

    #[test]
    fn test_cli_parses_run_with_global_flags() {
        let cli = Cli::try_parse_from([
            "design-review",
            "run",
            "--config",
            "pages.json",
            "--notify",
            "--verbose",
            "--token",
            "secret",
        ])
        .expect("parse");
        assert!(cli.verbose);
        let bridges = cli.bridges.config();
        assert_eq!(bridges.token.as_deref(), Some("secret"));
        assert_eq!(bridges.timeout_secs, 60);
        assert!(matches!(cli.command, Commands::Run { notify: true, output: None, .. }));
    }

    #[test]
    fn test_review_skip_parses_category_names() {
        let cli = Cli::try_parse_from([
            "design-review",
            "review",
            "--url",
            "https://example.com",
            "--skip",
            "performance",
            "--skip",
            "brand-consistency",
        ])
        .expect("parse");
        match cli.command {
            Commands::Review { skip, name, .. } => {
                assert_eq!(skip, vec![CategoryKind::Performance, CategoryKind::BrandConsistency]);
                assert_eq!(name, "page");
            }
            _ => panic!("expected review"),
        }
    }

    fn scripted_orchestrator() -> (DesignReviewOrchestrator, Arc<ScriptedBrowser>) {
        let browser = Arc::new(ScriptedBrowser::new().with_html("<h1>Home</h1>"));
        (DesignReviewOrchestrator::new(browser.clone()), browser)
    }

    fn one_page() -> OrchestrationConfig {
        OrchestrationConfig::new(vec![PageConfig::new(
            "home",
            "https://example.com",
            PagePriority::High,
            ReviewFrequency::Daily,
        )])
    }

    #[tokio::test]
    async fn test_run_closes_browser() {
        let (orchestrator, browser) = scripted_orchestrator();
        let result = review_and_close(&orchestrator, browser.as_ref(), &one_page()).await;
        assert_eq!(result.total_pages, 1);
        assert!(browser.is_closed());
    }

    #[tokio::test]
    async fn test_monitor_closes_browser_on_shutdown() {
        let (orchestrator, browser) = scripted_orchestrator();
        let scheduler = Arc::new(MonitoringScheduler::new(Arc::new(orchestrator), one_page()));
        monitor_until(Arc::clone(&scheduler), browser.as_ref(), async {})
            .await
            .expect("monitor");
        assert_eq!(scheduler.cycles_completed(), 0);
        assert!(browser.is_closed());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let err = parse_category("layout").expect_err("unknown");
        assert!(err.contains("accessibility"));
    }
}
