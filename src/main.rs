use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use querylens::ai::{OracleClient, OracleConfig};
use querylens::server;

#[derive(Debug, Parser)]
#[command(name = "querylens-server", about = "Natural-language query API")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = OracleConfig::from_env()?;
    let oracle = Arc::new(OracleClient::new(config)?);

    let app = server::router(oracle);
    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!("querylens listening on {}", args.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
