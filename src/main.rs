use cake_addin_audit::pipeline::{Orchestrator, RunContext, RunServices};
use cake_addin_audit::registry::NugetNormalizer;
use cake_addin_audit::snapshot::SnapshotStore;
use cake_addin_audit::{AuditOptions, GithubHost, VERSION};

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "cake-addin-audit",
    version,
    about = "Discovers Cake addins and audits their build metadata"
)]
struct CliArgs {
    /// GitHub API token (falls back to CAKE_AUDIT_GITHUB_TOKEN / GITHUB_TOKEN)
    #[arg(long)]
    github_token: Option<String>,

    /// GitHub login used when filing remediation issues and pull requests
    #[arg(long)]
    github_user: Option<String>,

    /// Working directory for snapshots, downloads and reports
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Delete the working directory first, forcing a full re-crawl
    #[arg(long)]
    clear_cache: bool,

    /// Maximum concurrent per-addin operations within a step
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-operation timeout in seconds
    #[arg(long)]
    op_timeout: Option<u64>,

    /// Cake version to audit against (defaults to the latest known)
    #[arg(long)]
    cake_version: Option<String>,

    /// File an issue for each addin with audit findings
    #[arg(long)]
    create_issues: bool,

    /// Additionally open pull requests upgrading stale Cake references
    #[arg(long)]
    submit_prs: bool,

    /// Skip the markdown report
    #[arg(long)]
    no_markdown_report: bool,

    /// Skip the spreadsheet (CSV) report
    #[arg(long)]
    no_spreadsheet_report: bool,

    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("cake-addin-audit v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("audit run failed: {e:#}");
        std::process::exit(1);
    }
}

fn options_from_args(args: &CliArgs) -> Result<AuditOptions> {
    let mut options = AuditOptions::default();

    if args.github_token.is_some() {
        options.github_token = args.github_token.clone();
    }
    if args.github_user.is_some() {
        options.github_user = args.github_user.clone();
    }
    if let Some(work_dir) = &args.work_dir {
        options.work_dir = work_dir.clone();
    }
    if let Some(concurrency) = args.concurrency {
        options.concurrency = concurrency;
    }
    if let Some(op_timeout) = args.op_timeout {
        options.op_timeout_secs = op_timeout;
    }
    if let Some(version) = &args.cake_version {
        options.select_cake_version(version)?;
    }
    options.clear_cache = args.clear_cache;
    options.create_issues = args.create_issues;
    options.submit_prs = args.submit_prs;
    options.markdown_report = !args.no_markdown_report;
    options.spreadsheet_report = !args.no_spreadsheet_report;

    options.validate()?;
    Ok(options)
}

async fn run(args: CliArgs) -> Result<()> {
    let options = options_from_args(&args)?;

    if options.clear_cache && options.work_dir.exists() {
        info!(path = %options.work_dir.display(), "clearing working directory");
        std::fs::remove_dir_all(&options.work_dir)
            .with_context(|| format!("failed to clear {}", options.work_dir.display()))?;
    }
    std::fs::create_dir_all(&options.work_dir)
        .with_context(|| format!("failed to create {}", options.work_dir.display()))?;

    let github = Arc::new(GithubHost::new(options.github_token.as_deref())?);
    let normalizer = Arc::new(NugetNormalizer::new()?);
    let store = SnapshotStore::new(options.snapshot_path());

    let mut context = RunContext::new(RunServices::new(options, github, normalizer));
    if let Some(addins) = store.load()? {
        info!(count = addins.len(), "resuming from snapshot");
        context.addins = addins;
        context.resumed = true;
    }

    Orchestrator::standard().run(&mut context, &store).await
}

fn init_logging_from_args(args: &CliArgs) {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let level = if let Some(level_str) = &args.log_level {
            parse_level(level_str)
        } else if args.verbose {
            Level::DEBUG
        } else if args.quiet {
            Level::ERROR
        } else {
            let level_str = env::var("CAKE_AUDIT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
            parse_level(&level_str)
        };

        let mut filter = EnvFilter::from_default_env();

        if env::var("RUST_LOG").is_err() {
            filter = filter
                .add_directive(
                    format!("cake_addin_audit={}", level)
                        .parse()
                        .expect("level directive is valid"),
                )
                .add_directive("hyper=warn".parse().expect("directive is valid"))
                .add_directive("reqwest=warn".parse().expect("directive is valid"));
        }

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    });
}

fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}
