use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use price_poster::scheduler::ctrl_c_shutdown;
use price_poster::{Config, Scheduler};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Posts crypto prices to a Telegram channel on a schedule
#[derive(Debug, Parser)]
#[command(name = "price-poster", version, about)]
struct Args {
    /// TOML config file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the state file location
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Log messages instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Run a single tick and exit
    #[arg(long)]
    once: bool,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env();
    if let Some(state_file) = &args.state_file {
        config.state_file = state_file.clone();
    }
    config.validate().context("validating config")?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_logging();

    let args = Args::parse();
    let config = load_config(&args)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(async {
        let shutdown = ctrl_c_shutdown().await;
        let mut scheduler =
            Scheduler::from_config(&config, args.dry_run).context("setting up scheduler")?;

        if args.once {
            let report = scheduler.tick(Utc::now()).await;
            scheduler.log_status(Utc::now());
            tracing::info!(
                posted = report.posted.len(),
                failed = report.publish_failed.len(),
                "Single tick finished"
            );
            return Ok(());
        }

        scheduler.run(shutdown).await;

        tracing::info!("Bot stopped by user");
        Ok::<(), anyhow::Error>(())
    })
}
