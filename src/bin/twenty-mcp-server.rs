// ABOUTME: Server binary: configuration loading, logging setup, and the HTTP listener
// ABOUTME: Refuses to start on broken security configuration; shuts down gracefully
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! Twenty MCP Server binary

use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use twenty_mcp_server::config::environment::ServerConfig;
use twenty_mcp_server::routes::{self, ServerResources};

/// Twenty CRM MCP server
#[derive(Debug, Parser)]
#[command(name = "twenty-mcp-server", version, about)]
struct Cli {
    /// Override the listen port from the environment
    #[arg(long)]
    port: Option<u16>,

    /// Validate configuration and exit without serving
    #[arg(long)]
    check_config: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("twenty_mcp_server=info,tower_http=info"));
    fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    // Configuration errors are fatal: never serve with broken security
    // settings.
    let mut config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration invalid; refusing to start");
            return ExitCode::FAILURE;
        }
    };
    if let Some(port) = cli.port {
        config.port = port;
    }

    if cli.check_config {
        info!("Configuration valid");
        return ExitCode::SUCCESS;
    }

    let port = config.port;
    let resources = match ServerResources::from_config(config) {
        Ok(resources) => resources,
        Err(e) => {
            error!(error = %e, "Failed to initialize server resources");
            return ExitCode::FAILURE;
        }
    };

    let app = routes::router(resources);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, %addr, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    info!(%addr, "Twenty MCP server listening");

    let serve = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = serve.await {
        error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}

/// Resolve on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
