use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};

use optionpro::api::{MarketDataProvider, YahooClient};
use optionpro::config::AppConfig;
use optionpro::notify::{build_email, deliver, notifier_from_env, Notifier};
use optionpro::schedule::{next_hour_boundary, run_tick};
use optionpro::synthetic::SyntheticMarket;
use optionpro::{Result, Scanner};

#[derive(Parser)]
#[command(name = "option-pro")]
#[command(about = "Hourly RSI-driven option idea scanner with email reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the ticker universe (comma separated)
    #[arg(short, long, global = true, value_delimiter = ',')]
    tickers: Option<Vec<String>>,

    /// Print the report instead of emailing it
    #[arg(long, global = true)]
    dry_run: bool,

    /// Use the seeded synthetic market instead of Yahoo Finance
    #[arg(long, global = true)]
    offline: bool,

    /// Seed for the synthetic market
    #[arg(long, global = true, default_value_t = 42)]
    seed: u64,

    /// Print the scan result as JSON instead of a report
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run one scan and send the report (default)
    Scan,

    /// Scan now and then at the top of every hour until Ctrl+C
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(tickers) = &cli.tickers {
        config = config.with_universe(tickers);
        config.validate()?;
    }

    let provider = build_provider(&cli, &config)?;
    let notifier = notifier_from_env(&config.email, cli.dry_run || cli.json);
    let scanner = Scanner::new(provider, config);

    match cli.command.unwrap_or(Commands::Scan) {
        Commands::Scan => run_once(&scanner, notifier.as_ref(), cli.json).await?,
        Commands::Watch => watch(&scanner, notifier.as_ref(), cli.json).await?,
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let default_filter = if verbose {
        "optionpro=debug,option_pro=debug"
    } else {
        "optionpro=info,option_pro=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_provider(cli: &Cli, config: &AppConfig) -> Result<Arc<dyn MarketDataProvider>> {
    if cli.offline {
        tracing::info!("Offline mode: synthetic market (seed {})", cli.seed);
        return Ok(Arc::new(SyntheticMarket::new(cli.seed, Utc::now())));
    }

    let client = YahooClient::with_base_url(&config.api.base_url, config.api.requests_per_minute)?;
    Ok(Arc::new(client))
}

async fn run_once(scanner: &Scanner, notifier: &dyn Notifier, json: bool) -> Result<()> {
    let config = scanner.config();
    tracing::info!("🚀 Running Option Pro on {} tickers", config.universe.len());

    let result = scanner.generate_ranked_ideas(&config.universe).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let body = build_email(&result, Utc::now());
    deliver(notifier, &config.email.subject, &body).await;
    Ok(())
}

async fn watch(scanner: &Scanner, notifier: &dyn Notifier, json: bool) -> Result<()> {
    tracing::info!("⏰ Watching: scans at the top of every hour. Press Ctrl+C to stop...");

    loop {
        run_tick(scanner.config().market_hours_only, Utc::now(), || {
            run_once(scanner, notifier, json)
        })
        .await;

        let wake = next_hour_boundary();
        tokio::select! {
            _ = tokio::time::sleep_until(wake) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("⚠️  Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    tracing::info!("👋 Option Pro stopped");
    Ok(())
}
