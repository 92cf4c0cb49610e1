mod di;

use chrono::{NaiveDate, Utc};
use clap::Parser;
use marketsync_application::{SyncConfig, SyncManager, SyncMode};
use shaku::HasComponent;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "marketsync")]
#[command(about = "Run a full freshness-maintenance pass over the market data store", long_about = None)]
struct Cli {
    /// Target date (YYYY-MM-DD); defaults to today.
    #[arg(short, long)]
    date: Option<String>,

    /// Comma-separated symbols; defaults to the built-in demo universe.
    #[arg(short, long)]
    symbols: Option<String>,

    /// Dispatch mode: sequential, parallel or pipelined.
    #[arg(short, long, default_value = "sequential")]
    mode: String,

    /// Skip the validation phase.
    #[arg(long)]
    no_validate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let target_date = match &cli.date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")?,
        None => Utc::now().date_naive(),
    };

    let mode = match cli.mode.as_str() {
        "sequential" => SyncMode::Sequential,
        "parallel" => SyncMode::BoundedParallel,
        "pipelined" => SyncMode::Pipelined,
        other => return Err(format!("unknown mode '{other}'").into()),
    };

    let config = SyncConfig {
        mode,
        enable_validation: !cli.no_validate,
        ..SyncConfig::default()
    };
    let symbols = di::parse_symbols(cli.symbols.as_deref());

    info!(%target_date, symbols = symbols.len(), "starting marketsync");

    let module = di::create_app_module(config, symbols);
    let manager: Arc<dyn SyncManager> = module.resolve();

    let report = manager.run_full_sync(target_date, None, None).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!(
        "\n{} of {} phases completed in {:.2}s",
        report.summary.successful_phases, report.summary.total_phases, report.duration_seconds
    );

    if report.summary.failed_phases > 0 {
        std::process::exit(1);
    }

    Ok(())
}
