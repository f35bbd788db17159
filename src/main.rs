use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use myeongbu::coordinator::{RecordServer, ServiceConfig};
use myeongbu::store::PostgresStudentStore;

#[derive(Parser)]
#[command(
    name = "myeongbu",
    version,
    about = "Student record service with denormalized class and grade-level collections",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Bind address (host:port)
        #[arg(short, long)]
        bind: Option<String>,

        /// PostgreSQL connection string
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Create the record tables if they do not exist
    InitSchema {
        /// PostgreSQL connection string
        #[arg(long)]
        database_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    match cli.command {
        Commands::Serve { bind, database_url } => serve(bind, database_url).await,
        Commands::InitSchema { database_url } => init_schema(database_url).await,
    }
}

async fn serve(bind: Option<String>, database_url: Option<String>) -> Result<()> {
    let mut config = ServiceConfig::from_env()?;
    if let Some(bind) = bind {
        config.bind_address = bind.parse()?;
    }
    if let Some(url) = database_url {
        config.database_url = url;
    }

    let store = PostgresStudentStore::connect(&config.database_url, config.pool_size)?;
    store.init_schema().await?;
    tracing::info!("Connected to PostgreSQL");

    let server = RecordServer::new(config, Arc::new(store))?;
    println!("{}", server.info().display());

    server.start_with_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn init_schema(database_url: Option<String>) -> Result<()> {
    let mut config = ServiceConfig::from_env()?;
    if let Some(url) = database_url {
        config.database_url = url;
    }

    let store = PostgresStudentStore::connect(&config.database_url, config.pool_size)?;
    store.init_schema().await?;
    println!("Record schema initialized");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutdown signal received");
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("myeongbu=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("myeongbu=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
