//! Entry point for the Regime Engine binary.
//!
//! Running this binary starts an HTTP server exposing the comparison
//! engine.  See [`regime_engine::config`] for the environment variables
//! it reads; `RUST_LOG` controls log verbosity (default `info`).

use regime_engine::{api, config::ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    if let Err(err) = api::serve(config).await {
        tracing::error!("error running server: {err:#}");
        return Err(err);
    }
    Ok(())
}
