use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use keyword_sentiment::aggregate::Aggregator;
use keyword_sentiment::config::AppConfig;
use keyword_sentiment::pipeline::ScoringPipeline;
use keyword_sentiment::server::{self, AppState};
use keyword_sentiment::storage::store_from_config;
use keyword_sentiment::weighting::WeightCalculator;

#[derive(Parser)]
#[command(
    name = "keyword_sentiment",
    version,
    about = "Keyword-weighted sentiment and magnitude scoring for document batches"
)]
struct Cli {
    /// Path to a TOML or JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one batch into per-column output tables
    Process {
        /// Batch name; the source table is <input_prefix>/<batch>.csv
        #[arg(long)]
        batch: String,
        /// Use the bundled lexicon classifier instead of the remote endpoint
        #[arg(long)]
        offline: bool,
    },
    /// Compile cross-period tables and charts for a processed batch
    Compile {
        #[arg(long)]
        batch: String,
    },
    /// Weigh one output table by keyword reference frequency
    Weigh {
        #[arg(long)]
        batch: String,
        /// Output artifact to weigh, e.g. "output_Q1 2023.csv"
        #[arg(long)]
        table: String,
    },
    /// Serve the batch endpoints over HTTP
    Serve {
        /// Listen address; overrides the configured host and port
        #[arg(long)]
        addr: Option<SocketAddr>,
        #[arg(long)]
        offline: bool,
    },
}

fn load_config(path: &Option<PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => Ok(AppConfig::load(path)?),
        None => Ok(AppConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Process { batch, offline } => {
            let store = store_from_config(&config)?;
            let pipeline = ScoringPipeline::from_config(&config, store, offline);
            let report = pipeline.process_batch(&batch).await?;

            println!("\nBatch: {}", report.batch);
            println!("{:<24} {:>8} {:>8}", "Period", "Rows", "Skipped");
            println!("{}", "-".repeat(42));
            for column in &report.columns {
                println!(
                    "{:<24} {:>8} {:>8}",
                    column.period,
                    column.rows,
                    column.skipped.len()
                );
            }
            println!("{}", "-".repeat(42));
            println!(
                "{:<24} {:>8} {:>8}",
                "Total",
                report.total_rows(),
                report.total_skipped()
            );
            for column in &report.columns {
                for skip in &column.skipped {
                    println!(
                        "  skipped '{}' chunk {}: {}",
                        skip.keyword, skip.chunk_index, skip.reason
                    );
                }
            }
        }
        Commands::Compile { batch } => {
            let store = store_from_config(&config)?;
            let aggregator = Aggregator::new(store, config.clone());
            let compiled = aggregator.compile_batch(&batch).await?;

            println!("\nBatch: {}", compiled.batch);
            println!("\nAverage sentiment by category:");
            print!("{:<24}", "Key Word Category");
            for period in &compiled.sentiment.periods {
                print!(" {:>14}", period);
            }
            println!();
            for category in compiled.sentiment.categories() {
                print!("{:<24}", category);
                for period in &compiled.sentiment.periods {
                    match compiled.sentiment.get(category, period) {
                        Some(mean) => print!(" {:>14.4}", mean),
                        None => print!(" {:>14}", "-"),
                    }
                }
                println!();
            }
            println!("\nArtifacts:");
            for key in &compiled.artifacts {
                println!("  {}", key);
            }
        }
        Commands::Weigh { batch, table } => {
            let store = store_from_config(&config)?;
            let calculator = WeightCalculator::new(store, config.clone());
            let outcome = calculator.weigh(&batch, &table).await?;

            println!(
                "\n{:<20} {:<20} {:>10} {:>10} {:>10}",
                "Key Word Category", "Keyword", "Sentiment", "Ratio", "Weighted"
            );
            for row in &outcome.rows {
                println!(
                    "{:<20} {:<20} {:>10.4} {:>10.4} {:>10.4}",
                    row.category, row.keyword, row.sentiment, row.ratio, row.weighted
                );
            }
            println!("\nOverall weighted sentiment: {:.4}", outcome.overall);
            println!("Written to: {}", outcome.artifact);
        }
        Commands::Serve { addr, offline } => {
            let addr = match addr {
                Some(addr) => addr,
                None => format!("{}:{}", config.server.host, config.server.port).parse()?,
            };
            let state = Arc::new(AppState::from_config(&config, offline)?);
            server::serve(state, addr).await?;
        }
    }

    Ok(())
}
