use std::sync::Arc;

use clap::Parser;
use revue_core::load_dashboard;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use revue_server::router::DashboardContext;
use revue_server::server;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "revue.toml")]
    config: String,

    /// CSV dataset; falls back to dataset.default_path
    #[arg(short, long)]
    dataset: Option<String>,

    /// Load the dataset, print key metrics and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let (config, table) = match load_dashboard(&args.config, args.dataset.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to start from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let dataset_path = args
        .dataset
        .clone()
        .unwrap_or_else(|| config.dataset.default_path.clone());
    tracing::info!(path = %dataset_path, reviews = table.len(), "Dataset ready");

    if args.check {
        let summary = table.summary(0);
        println!("✅ Dataset loaded: {}", dataset_path);
        println!("   reviews: {}", summary.total_reviews);
        println!("   apps:    {}", summary.app_count);
        if let Some(range) = summary.year_range_label {
            println!("   years:   {}", range);
        }
        return Ok(());
    }

    let context = Arc::new(DashboardContext::new(table, config.clone()));

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    if config.http.enabled {
        let http_context = context.clone();
        let http_shutdown = tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) =
                revue_server::http::start_http_server(http_context, http_shutdown).await
            {
                tracing::error!("HTTP server error: {}", e);
            }
        });
    }

    let socket_path = config.service.socket_path.clone();
    server::run_unix_server(&socket_path, context, tx.subscribe()).await?;

    Ok(())
}
