//! PriceHawk — entry point.

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use pricehawk::{analyze_page, Platform, ProductRecord, ProductStore, Winner};
use pricehawk_server::{
    resolve_db_path, ComparisonReport, ComparisonSession, FetchConfig, HttpFetcher, SqliteStore,
};

#[derive(Parser)]
#[command(
    name = "pricehawk",
    about = "Compare Flipkart and Amazon listings for the same product",
    version
)]
struct Cli {
    /// Path to the SQLite database.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Print machine-readable JSON instead of a summary.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, score, and compare one or two product pages.
    Compare {
        /// Flipkart product URL.
        #[arg(long)]
        flipkart: Option<String>,

        /// Amazon product URL.
        #[arg(long)]
        amazon: Option<String>,

        /// Do not write results to the database.
        #[arg(long)]
        no_save: bool,
    },

    /// Analyze a saved HTML page without fetching.
    Extract {
        /// HTML file to analyze.
        file: String,

        /// Marketplace the page came from (flipkart, amazon).
        #[arg(long)]
        platform: String,

        /// Original product URL (used for the product id).
        #[arg(long)]
        url: Option<String>,
    },

    /// Start the HTTP API.
    #[cfg(feature = "http")]
    Serve {
        /// Listen address (host:port).
        #[arg(long, default_value = "127.0.0.1:5000")]
        addr: String,
    },

    /// List recently stored products.
    Dashboard {
        /// Maximum number of products.
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   pricehawk completions bash > ~/.local/share/bash-completion/completions/pricehawk
    ///   pricehawk completions zsh > ~/.zfunc/_pricehawk
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compare {
            flipkart,
            amazon,
            no_save,
        } => {
            let config = FetchConfig::from_env();
            let stagger = config.stagger();
            let fetcher = Arc::new(HttpFetcher::new(config)?);
            let store: Option<Arc<dyn ProductStore>> = if no_save {
                None
            } else {
                let path = resolve_db_path(cli.db.as_deref());
                tracing::info!("Database: {path}");
                Some(Arc::new(SqliteStore::open(&path)?) as Arc<dyn ProductStore>)
            };

            let session = ComparisonSession::new(fetcher, store).with_stagger(stagger);
            let report = session
                .compare(flipkart.as_deref(), amazon.as_deref())
                .await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }

        Commands::Extract {
            file,
            platform,
            url,
        } => {
            let platform: Platform = platform.parse()?;
            let html = std::fs::read_to_string(&file)?;
            let url = url.unwrap_or_else(|| file.clone());
            let Some(record) = analyze_page(&html, platform, &url) else {
                eprintln!("No usable product found in {file}");
                std::process::exit(1);
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_record(&record);
            }
        }

        #[cfg(feature = "http")]
        Commands::Serve { addr } => {
            use pricehawk_server::api::{serve, AppState};

            let path = resolve_db_path(cli.db.as_deref());
            let dashboard = match SqliteStore::open(&path) {
                Ok(store) => {
                    tracing::info!("Database: {path}");
                    Some(Arc::new(store))
                }
                Err(e) => {
                    tracing::warn!("Database unavailable ({e}); results will not be stored");
                    None
                }
            };
            let config = FetchConfig::from_env();
            let stagger = config.stagger();
            let fetcher = Arc::new(HttpFetcher::new(config)?);
            let store = dashboard.clone().map(|s| s as Arc<dyn ProductStore>);
            let state = AppState {
                session: ComparisonSession::new(fetcher, store).with_stagger(stagger),
                dashboard,
            };
            serve(&addr, state).await?;
        }

        Commands::Dashboard { limit } => {
            let path = resolve_db_path(cli.db.as_deref());
            let store = SqliteStore::open(&path)?;
            let products = store.recent(limit)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&products)?);
            } else if products.is_empty() {
                println!("No products stored in {path}");
            } else {
                for p in &products {
                    println!(
                        "{:<9} {:>4}  {:<11} {}",
                        p.platform,
                        p.score.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
                        p.price.as_deref().unwrap_or("-"),
                        p.title.as_deref().unwrap_or("(untitled)"),
                    );
                }
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "pricehawk", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn print_record(record: &ProductRecord) {
    println!("[{}] {}", record.platform, record.title.as_deref().unwrap_or("(untitled)"));
    println!("  URL:    {}", record.source_url);
    if let Some(price) = &record.price {
        println!("  Price:  {price}");
    }
    if let Some(rating) = record.rating {
        println!("  Rating: {rating:.1}/5");
    }
    if let Some(score) = &record.score {
        println!("  Score:  {}/100 ({})", score.total, score.verdict);
        for reason in &score.reasons {
            println!("    - {reason}");
        }
    }
    println!("  Reviews harvested: {}", record.reviews.len());
}

fn print_report(report: &ComparisonReport) {
    let result = &report.result;
    for record in [&result.flipkart, &result.amazon].into_iter().flatten() {
        print_record(record);
        println!();
    }

    match result.winner {
        Winner::Flipkart => println!("Winner: Flipkart"),
        Winner::Amazon => println!("Winner: Amazon"),
        Winner::Tie => println!("Result: tie"),
        Winner::NoResult => println!("No usable product data on either side"),
    }
    if let Some(delta) = &result.price_difference {
        println!(
            "Cheaper on {} by ₹{:.2} ({}%)",
            delta.cheaper_on, delta.amount, delta.percentage
        );
    }
    println!("Comparison id: {}", report.comparison_id);
}
