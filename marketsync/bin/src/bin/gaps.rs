use chrono::NaiveDate;
use clap::Parser;
use marketsync_application::SyncManager;
use shaku::HasComponent;
use std::sync::Arc;

mod di {
    include!("../di.rs");
}

#[derive(Parser)]
#[command(name = "gaps")]
#[command(about = "Detect missing trading dates and repair small gaps", long_about = None)]
struct Cli {
    #[arg(short, long)]
    start_date: String,

    #[arg(short, long)]
    end_date: String,

    /// Comma-separated symbols; defaults to the built-in demo universe.
    #[arg(long)]
    symbols: Option<String>,

    /// Report only; never re-sync gap intervals.
    #[arg(long)]
    no_repair: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let start_date = NaiveDate::parse_from_str(&cli.start_date, "%Y-%m-%d")?;
    let end_date = NaiveDate::parse_from_str(&cli.end_date, "%Y-%m-%d")?;

    let config = marketsync_application::SyncConfig {
        auto_repair: !cli.no_repair,
        ..marketsync_application::SyncConfig::default()
    };
    let symbols = di::parse_symbols(cli.symbols.as_deref());

    let module = di::create_app_module(config, symbols);
    let manager: Arc<dyn SyncManager> = module.resolve();

    let (report, repair) = manager
        .detect_and_repair_gaps(start_date, end_date, None, None)
        .await?;

    println!(
        "Scanned {} symbols over {}: {} gaps",
        report.total_symbols, report.range, report.summary.total_gaps
    );

    for freq_gaps in &report.by_frequency {
        for gap in &freq_gaps.gaps {
            println!(
                "  {} [{}] {} ({} trading days, {})",
                gap.symbol(),
                gap.frequency(),
                gap.range(),
                gap.trading_days(),
                gap.severity().as_str()
            );
        }
        for unknown in &freq_gaps.unknown_symbols {
            println!("  {} [{}] state unknown: {}", unknown.symbol, unknown.frequency, unknown.message);
        }
    }

    if let Some(repair) = repair {
        println!(
            "\nRepair: {} attempted, {} repaired, {} failed, {} above the size cap",
            repair.attempted, repair.repaired, repair.failed, repair.skipped_too_large
        );
    }

    Ok(())
}
