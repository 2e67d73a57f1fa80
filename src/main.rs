use anyhow::{Context, Result};
use clap::Parser;
use kpi_server_rs::{cli, config, openapi, routes, services, state};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

async fn bind_listener(addr: &str) -> Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Failed to bind kpi-server-rs listener on {addr}: port already in use. Stop the other service using this port or re-run with --port to choose another port.",
            );
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to bind kpi-server-rs listener on {addr}"))
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install ctrl-c handler: {err}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    if args.print_openapi {
        println!(
            "{}",
            serde_json::to_string_pretty(&openapi::openapi_json())?
        );
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = config::DashboardConfig::from_env()?;
    let http = reqwest::Client::new();
    let data = Arc::new(services::data_source::DataServiceClient::new(
        http, &config,
    ));

    let state = state::AppState {
        config: config.clone(),
        data,
    };

    // The dashboard frontend is served from a different origin.
    let app = routes::router(state).layer(CorsLayer::permissive());
    let addr = format!("{}:{}", args.host, args.port);
    let listener = bind_listener(&addr).await?;
    tracing::info!(%addr, "kpi-server-rs listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
