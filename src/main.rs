use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};

use multiline_splitter::config::Config;
use multiline_splitter::connector::HttpConnector;
use multiline_splitter::error::Result;
use multiline_splitter::logging;
use multiline_splitter::memory::InMemoryBase;
use multiline_splitter::pipeline::{SplitRun, SplitSummary};
use multiline_splitter::types::{BaseConnector, Selection};

#[derive(Parser)]
#[command(name = "multiline_splitter")]
#[command(about = "Splits multiline text from a base field into one record per line")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the connection config file
    #[arg(long, default_value = "splitter.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables of the configured base
    Tables,
    /// List the fields of one table
    Fields {
        /// Table id to inspect
        #[arg(long)]
        table: String,
    },
    /// Split the source field's text into records in the target field
    Run {
        #[arg(long)]
        source_table: String,
        #[arg(long)]
        source_field: String,
        #[arg(long)]
        target_table: String,
        #[arg(long)]
        target_field: String,
        /// Report the would-be record count without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the pipeline against a seeded in-memory base
    Demo,
}

fn print_summary(summary: &SplitSummary, dry_run: bool) {
    if dry_run {
        println!("\n📊 Dry run (nothing written):");
    } else {
        println!("\n📊 Split results:");
    }
    println!("   Source records: {}", summary.source_records);
    println!("   Skipped (empty): {}", summary.skipped_records);
    println!("   Records created: {}", summary.records_created);
    println!("   Duration: {:.2}s", summary.duration_secs);
}

async fn run_split(connector: &dyn BaseConnector, selection: Selection, dry_run: bool) -> Result<()> {
    let summary = if dry_run {
        SplitRun::dry_run(connector, &selection).await?
    } else {
        SplitRun::execute(connector, &selection).await?
    };
    print_summary(&summary, dry_run);
    Ok(())
}

/// Seeds a small in-memory base and splits it, to show the tool end to end
/// without a hosted base.
async fn run_demo() -> Result<()> {
    let base = InMemoryBase::new();
    let source_table = base.add_table("Notes");
    let source_field = base.add_field(&source_table, "Body");
    let target_table = base.add_table("Lines");
    let target_field = base.add_field(&target_table, "Text");

    base.seed_record(&source_table, &source_field, json!("milk\neggs\nbread"));
    base.seed_record(
        &source_table,
        &source_field,
        json!([
            {"type": "text", "text": "call dentist\n"},
            {"type": "text", "text": "renew passport"}
        ]),
    );
    base.seed_record(&source_table, &source_field, json!(""));

    let selection = Selection {
        source_table,
        source_field,
        target_table: target_table.clone(),
        target_field: target_field.clone(),
    };
    let summary = SplitRun::execute(&base, &selection).await?;
    print_summary(&summary, false);

    println!("\n   Created lines:");
    for value in base.field_values(&target_table, &target_field) {
        if let Some(text) = value.as_str() {
            println!("   - {text}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Tables => {
            let config = Config::load(&cli.config)?;
            let connector = HttpConnector::from_config(&config)?;
            let tables = connector.get_table_meta_list().await?;
            println!("📋 Tables ({}):", tables.len());
            for table in tables {
                println!("   {}  {}", table.id, table.name);
            }
        }
        Commands::Fields { table } => {
            let config = Config::load(&cli.config)?;
            let connector = HttpConnector::from_config(&config)?;
            let fields = connector.get_field_meta_list(&table).await?;
            println!("📋 Fields of {} ({}):", table, fields.len());
            for field in fields {
                println!("   {}  {}", field.id, field.name);
            }
        }
        Commands::Run {
            source_table,
            source_field,
            target_table,
            target_field,
            dry_run,
        } => {
            let config = Config::load(&cli.config)?;
            let connector = HttpConnector::from_config(&config)?;
            let selection = Selection {
                source_table,
                source_field,
                target_table,
                target_field,
            };
            info!("Starting split run");
            println!("🚀 Splitting multiline text...");
            if let Err(e) = run_split(&connector, selection, dry_run).await {
                error!("Split run failed: {}", e);
                println!("❌ Split run failed: {e}");
                std::process::exit(1);
            }
            println!("✅ Done");
        }
        Commands::Demo => {
            println!("🚀 Running demo against an in-memory base...");
            if let Err(e) = run_demo().await {
                error!("Demo failed: {}", e);
                println!("❌ Demo failed: {e}");
                std::process::exit(1);
            }
            println!("✅ Done");
        }
    }
    Ok(())
}
