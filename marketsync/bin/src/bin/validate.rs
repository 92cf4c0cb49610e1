use chrono::NaiveDate;
use clap::Parser;
use marketsync_application::SyncManager;
use shaku::HasComponent;
use std::sync::Arc;

mod di {
    include!("../di.rs");
}

#[derive(Parser)]
#[command(name = "validate")]
#[command(about = "Scan stored records for implausible values", long_about = None)]
struct Cli {
    #[arg(short, long)]
    start_date: String,

    #[arg(short, long)]
    end_date: String,

    /// Comma-separated symbols; defaults to the built-in demo universe.
    #[arg(long)]
    symbols: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let start_date = NaiveDate::parse_from_str(&cli.start_date, "%Y-%m-%d")?;
    let end_date = NaiveDate::parse_from_str(&cli.end_date, "%Y-%m-%d")?;

    let config = marketsync_application::SyncConfig::default();
    let symbols = di::parse_symbols(cli.symbols.as_deref());

    let module = di::create_app_module(config, symbols);
    let manager: Arc<dyn SyncManager> = module.resolve();

    let report = manager
        .run_validation(start_date, end_date, None, None)
        .await?;

    println!(
        "Validated {} records over {}: {} invalid ({:.2}% valid)",
        report.total_records,
        report.range,
        report.invalid_records,
        report.validation_rate * 100.0
    );

    for range in &report.issues {
        println!(
            "  {} [{}]: {} of {} records invalid",
            range.symbol, range.frequency, range.invalid_records, range.total_records
        );
        for issue in &range.issues {
            println!("    {} {}: {}", issue.date, issue.field, issue.reason);
        }
    }

    for failed in &report.failed_symbols {
        println!("  {} [{}] not validated: {}", failed.symbol, failed.frequency, failed.message);
    }

    Ok(())
}
