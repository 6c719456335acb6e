/// MCP Server Entry Point
///
/// Reads the server configuration from environment variables, registers the
/// steps_to_miles tool, the greeting resource and the greet_user prompt, then
/// runs the selected transport until it finishes or the process is interrupted.
///
/// See `core::utils::ServerConfig` for the environment variables. Logging is
/// controlled by RUST_LOG (default: "info") and always goes to stderr.

mod core;
mod prompts;
mod resources;
mod tools;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::core::error::ServerError;
use crate::core::server::{self, AppState, McpServer};
use crate::core::utils::{self, ServerConfig, TransportMode};

/// Initialize tracing on stderr; stdout is reserved for JSON-RPC traffic.
fn init_tracing() {
    let filter = EnvFilter::new(utils::get_env_var("RUST_LOG", "info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

/// Resolves when the operator interrupts the process (Ctrl-C / SIGINT).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a handler the default disposition still terminates the process
        warn!(error = %e, "failed to install interrupt handler");
        std::future::pending::<()>().await;
    }
}

/// Run the configured transport(s) to completion.
async fn run(config: ServerConfig, server: McpServer) -> Result<(), ServerError> {
    match config.transport {
        TransportMode::Stdio => server::run_server_stdio(server).await?,
        TransportMode::Http => server::run_server_http(server, &config).await?,
        TransportMode::Both => {
            // STDIO in a background task, HTTP in the foreground
            let stdio_server = server.clone();
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(stdio_server).await {
                    error!(error = %e, "STDIO transport failed");
                }
            });

            let http_result = server::run_server_http(server, &config).await;

            // If HTTP server exits, abort STDIO task
            stdio_handle.abort();
            http_result?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let registry = match server::initialize_registry() {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %ServerError::from(e), "failed to register server features");
            std::process::exit(1);
        }
    };

    let server = McpServer::new(
        AppState {
            server_name: config.name.clone(),
            server_version: config.version.clone(),
        },
        registry,
    );

    info!(
        name = %config.name,
        version = %config.version,
        transport = config.transport.as_str(),
        "Starting MCP server"
    );

    let code = tokio::select! {
        result = run(config, server) => match result {
            Ok(()) => {
                info!("MCP server stopped");
                0
            }
            Err(e) => {
                error!(error = %e, "MCP server failed");
                1
            }
        },
        _ = shutdown_signal() => {
            info!("Interrupted, shutting down MCP server");
            0
        }
    };

    // Exit explicitly: a pending blocking read on stdin would otherwise keep
    // the runtime from shutting down.
    std::process::exit(code);
}
