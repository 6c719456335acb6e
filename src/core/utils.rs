/// Configuration and Environment Utilities
///
/// Server configuration is read once from environment variables at start-up.
/// Every variable has a default, so the server runs with no configuration at
/// all (stdio transport, named "Demo").

use crate::core::error::ServerError;

/// Transport used to exchange JSON-RPC messages with clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Newline-delimited JSON over stdin/stdout
    Stdio,
    /// JSON-RPC over HTTP POST
    Http,
    /// STDIO in the background, HTTP in the foreground
    Both,
}

impl TransportMode {
    /// Parse a transport name as given in `MCP_TRANSPORT_MODE`.
    pub fn parse(value: &str) -> Result<Self, ServerError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            "both" => Ok(Self::Both),
            _ => Err(ServerError::InvalidTransport(value.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Both => "both",
        }
    }
}

/// Server configuration.
///
/// Environment Variables:
/// - SERVER_NAME: Name of the server (default: "Demo")
/// - SERVER_VERSION: Version string (default: the crate version)
/// - MCP_TRANSPORT_MODE: "stdio", "http", or "both" (default: "stdio")
/// - HOST: Bind address for HTTP mode (default: "0.0.0.0")
/// - PORT: Port number for HTTP mode (default: 3000)
/// - WORKER_THREADS: HTTP worker count (default: CPU count, capped at 16)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub transport: TransportMode,
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// An unparsable PORT or WORKER_THREADS falls back to its default; an
    /// unknown transport mode is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let transport = TransportMode::parse(&get("MCP_TRANSPORT_MODE", "stdio"))?;
        let port = get("PORT", "3000").parse::<u16>().unwrap_or(3000);
        let workers = lookup("WORKER_THREADS")
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or_else(default_workers);

        Ok(Self {
            name: get("SERVER_NAME", "Demo"),
            version: get("SERVER_VERSION", env!("CARGO_PKG_VERSION")),
            transport,
            host: get("HOST", "0.0.0.0"),
            port,
            workers,
        })
    }

    /// Address the HTTP transport binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Defaults to CPU count but capped at 16 to avoid excessive context switching.
fn default_workers() -> usize {
    num_cpus::get().clamp(1, 16)
}

/// Get environment variable value with a default fallback.
///
/// # Arguments
/// * `key` - Environment variable name to look up
/// * `default` - Default value to return if the environment variable is not set
pub fn get_env_var(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
