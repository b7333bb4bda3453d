use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};

use kanban_server::advice::OpenAiAdvisor;
use kanban_server::config::ServerConfig;
use kanban_server::RouterOptions;

#[derive(Parser)]
#[command(name = "kanban-server", about = "Kanban board API and client server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    config: ServerConfig,
}

#[derive(Subcommand)]
enum Commands {
    /// Check database connectivity and print a few sample tasks
    CheckDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::CheckDb) => check_db(&cli.config).await,
        None => run_server(cli.config).await,
    }
}

async fn check_db(config: &ServerConfig) -> Result<()> {
    let db_config = config.db_config();
    println!("Testing database connection ({})...", db_config.describe());
    let db = kanban_db::open(&db_config)
        .await
        .context("database connection failed")?;
    let report = kanban_db::connection_report(&*db)
        .await
        .context("database query failed")?;

    println!("Database connection successful");
    println!("Current time from database: {}", report.server_time);
    println!("Tasks table exists with {} records", report.task_count);
    if !report.sample.is_empty() {
        println!("Sample tasks:");
        for task in &report.sample {
            println!("  {}: {} ({})", task.id, task.title, task.status.as_str());
        }
    }
    Ok(())
}

async fn run_server(config: ServerConfig) -> Result<()> {
    let db = kanban_db::open(&config.db_config())
        .await
        .context("failed to open database")?;
    let advisor = Arc::new(
        OpenAiAdvisor::new(config.openai_api_key.clone(), &config.openai_base_url)
            .context("failed to build advice client")?,
    );

    let client_dir = config.client_dir.clone();
    if !client_dir.join("index.html").exists() {
        warn!(dir = %client_dir.display(), "client index.html not found; only the API will be useful");
    }

    let listener = TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("failed to bind {}", config.addr()))?;
    info!("Kanban board server running on port {}", config.port);
    info!("Serving static files from: {}", client_dir.display());
    info!("Environment: {:?}", config.mode);

    let options = RouterOptions {
        client_dir: Some(client_dir),
        dev_mode: config.dev_mode(),
    };
    kanban_server::serve(listener, db, advisor, options, shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("SIGTERM received, shutting down gracefully"),
                    _ = sigint.recv() => info!("SIGINT received, shutting down gracefully"),
                }
                return;
            }
            _ => warn!("failed to register signal handlers; falling back to ctrl-c"),
        }
    }
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("interrupt received, shutting down gracefully");
    }
}
