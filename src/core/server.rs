/// MCP Server Implementation
///
/// This module contains the core MCP server implementation including:
/// - JSON-RPC 2.0 request/response structures
/// - Request dispatch for the MCP protocol methods (tools, resources, prompts)
/// - HTTP server setup with Actix Web
/// - STDIO server implementation for line-based communication
///
/// Both transports share a single `McpServer`, so a request produces the same
/// response whichever way it arrives.

use actix_web::{
    web, App, HttpServer, HttpResponse,
    middleware::{Compress, Logger, DefaultHeaders},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, error, info, warn};

use crate::core::error::{HandlerError, TemplateError};
use crate::core::registry::Registry;
use crate::core::utils::ServerConfig;
use crate::{prompts, resources, tools};

/// MCP protocol version reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
}

/// Server metadata reported in MCP initialize responses.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server name as reported in MCP initialize responses
    pub server_name: String,
    /// Server version string as reported in MCP initialize responses
    pub server_version: String,
}

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// All MCP requests follow the JSON-RPC 2.0 specification. The jsonrpc field
/// must be "2.0", id is optional (None for notifications), method specifies
/// the MCP method to call, and params contains method-specific parameters.
#[derive(Deserialize, Debug)]
pub struct MCPRequest {
    /// JSON-RPC version identifier, must be "2.0"
    pub jsonrpc: String,
    /// Request ID for correlating responses. None indicates a notification;
    /// an explicit `"id": null` is kept as `Some(Value::Null)` and answered.
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<Value>,
    /// MCP method name (e.g., "initialize", "tools/list", "tools/call")
    pub method: String,
    /// Method-specific parameters as JSON value
    #[serde(default)]
    pub params: Option<Value>,
}

/// Only called when the `id` key is present, so a null id stays distinct
/// from a missing one.
fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// JSON-RPC 2.0 response structure for MCP protocol.
///
/// Responses must include jsonrpc "2.0", the request id, and either a result
/// or an error. The error field is only present when an error occurred.
#[derive(Serialize, Debug)]
pub struct MCPResponse {
    /// JSON-RPC version identifier, always "2.0"
    pub jsonrpc: String,
    /// Request ID from the original request (null when it could not be read)
    pub id: Option<Value>,
    /// Response result, present when request succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error information, present when request failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

impl MCPResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, error: MCPError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 2.0 error structure.
#[derive(Serialize, Debug, PartialEq)]
pub struct MCPError {
    /// JSON-RPC error code (e.g., -32601 for method not found)
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl MCPError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_PARAMS, message)
    }
}

impl From<HandlerError> for MCPError {
    fn from(e: HandlerError) -> Self {
        Self::invalid_params(e.to_string())
    }
}

#[derive(Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Deserialize)]
struct ResourceReadParams {
    uri: String,
}

#[derive(Deserialize)]
struct PromptGetParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

/// Deserialize method params, reporting failures as JSON-RPC invalid params.
fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, MCPError> {
    let params = params.ok_or_else(|| MCPError::invalid_params("Invalid params"))?;
    serde_json::from_value(params).map_err(|e| MCPError::invalid_params(format!("Invalid params: {e}")))
}

/// Transport-independent MCP request dispatcher.
///
/// Cheap to clone: the registry is shared behind an `Arc` and is never
/// mutated after start-up.
#[derive(Clone)]
pub struct McpServer {
    state: AppState,
    registry: Arc<Registry>,
}

impl McpServer {
    pub fn new(state: AppState, registry: Arc<Registry>) -> Self {
        Self { state, registry }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Handle one raw JSON-RPC message.
    ///
    /// Returns `None` when no response must be sent (notifications).
    /// Malformed JSON yields a parse error with a null id; JSON that is not a
    /// request yields an invalid request error carrying whatever id it had.
    pub fn handle_message(&self, message: &str) -> Option<MCPResponse> {
        let value: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "failed to parse JSON-RPC message");
                return Some(MCPResponse::error(
                    None,
                    MCPError::new(error_codes::PARSE_ERROR, format!("Parse error: {e}")),
                ));
            }
        };

        let id = value.get("id").cloned();
        match serde_json::from_value::<MCPRequest>(value) {
            Ok(request) => self.handle_request(request),
            Err(e) => {
                warn!(error = %e, "invalid JSON-RPC request");
                Some(MCPResponse::error(
                    id,
                    MCPError::new(error_codes::INVALID_REQUEST, format!("Invalid request: {e}")),
                ))
            }
        }
    }

    /// Route a parsed request to the appropriate method handler.
    pub fn handle_request(&self, req: MCPRequest) -> Option<MCPResponse> {
        let Some(id) = req.id else {
            // Notifications are one-way messages that don't require responses
            self.handle_notification(&req.method);
            return None;
        };

        if req.jsonrpc != "2.0" {
            return Some(MCPResponse::error(
                Some(id),
                MCPError::new(
                    error_codes::INVALID_REQUEST,
                    format!("Unsupported JSON-RPC version: {}", req.jsonrpc),
                ),
            ));
        }

        debug!(method = %req.method, id = %id, "received request");
        let outcome = match req.method.as_str() {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.tools_list()),
            "tools/call" => self.tools_call(req.params),
            "resources/list" => Ok(json!({ "resources": [] })),
            "resources/templates/list" => Ok(self.resource_templates_list()),
            "resources/read" => self.resources_read(req.params),
            "prompts/list" => Ok(self.prompts_list()),
            "prompts/get" => self.prompts_get(req.params),
            _ => Err(MCPError::new(
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", req.method),
            )),
        };

        Some(match outcome {
            Ok(result) => MCPResponse::success(Some(id), result),
            Err(e) => {
                debug!(method = %req.method, code = e.code, message = %e.message, "request failed");
                MCPResponse::error(Some(id), e)
            }
        })
    }

    fn handle_notification(&self, method: &str) {
        match method {
            // Client has finished initialization - acknowledge silently
            "notifications/initialized" => debug!("client initialized"),
            // Every request completes synchronously, nothing to cancel
            "notifications/cancelled" => debug!("ignoring cancellation"),
            other => debug!(method = %other, "ignoring notification"),
        }
    }

    /// Handle MCP initialize method.
    ///
    /// The initialize method is the first method called by MCP clients to establish
    /// a connection. It returns the protocol version, server capabilities, and
    /// server information.
    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "subscribe": false, "listChanged": false },
                "prompts": { "listChanged": false }
            },
            "serverInfo": {
                "name": self.state.server_name,
                "version": self.state.server_version
            }
        })
    }

    fn tools_list(&self) -> Value {
        json!({ "tools": self.registry.tools })
    }

    /// Handle MCP tools/call method.
    ///
    /// Unknown tools and malformed params are protocol errors. A failing
    /// handler is reported inside the result with `isError: true` so the
    /// calling agent can see the message.
    fn tools_call(&self, params: Option<Value>) -> Result<Value, MCPError> {
        let params: ToolCallParams = parse_params(params)?;
        let handler = self
            .registry
            .tool_handler(&params.name)
            .ok_or_else(|| MCPError::invalid_params(format!("Unknown tool: {}", params.name)))?;

        // Arguments default to an empty object if not provided
        let arguments = match params.arguments {
            Value::Null => json!({}),
            other => other,
        };

        match handler(arguments) {
            Ok(result) => {
                let text = match &result {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Ok(json!({
                    "content": [{ "type": "text", "text": text }],
                    "structuredContent": { "result": result },
                    "isError": false
                }))
            }
            Err(e) => {
                warn!(tool = %params.name, error = %e, "tool execution failed");
                Ok(json!({
                    "content": [{ "type": "text", "text": format!("Error: {e}") }],
                    "isError": true
                }))
            }
        }
    }

    fn resource_templates_list(&self) -> Value {
        json!({ "resourceTemplates": self.registry.resource_templates() })
    }

    fn resources_read(&self, params: Option<Value>) -> Result<Value, MCPError> {
        let params: ResourceReadParams = parse_params(params)?;
        let content = self.registry.read_resource(&params.uri)?;
        Ok(json!({
            "contents": [{
                "uri": params.uri,
                "mimeType": content.mime_type,
                "text": content.text
            }]
        }))
    }

    fn prompts_list(&self) -> Value {
        json!({ "prompts": self.registry.prompts() })
    }

    fn prompts_get(&self, params: Option<Value>) -> Result<Value, MCPError> {
        let params: PromptGetParams = parse_params(params)?;
        let arguments = params.arguments.unwrap_or_default();
        let rendered = self.registry.get_prompt(&params.name, &arguments)?;
        Ok(json!({
            "description": rendered.description,
            "messages": [{
                "role": "user",
                "content": { "type": "text", "text": rendered.text }
            }]
        }))
    }
}

/// Initialize and register all tools, resources and prompts.
///
/// This function is called during server startup. Add new registrations here
/// following the pattern `module::register(&mut registry)`.
pub fn initialize_registry() -> Result<Arc<Registry>, TemplateError> {
    let mut registry = Registry::new();

    tools::steps_to_miles::register(&mut registry);
    resources::greeting::register(&mut registry)?;
    prompts::greet_user::register(&mut registry);

    Ok(Arc::new(registry))
}

/// Health check endpoint handler.
async fn health(server: web::Data<McpServer>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": server.state().server_name
    }))
}

/// MCP JSON-RPC request handler for HTTP mode.
///
/// The body is taken as raw text so malformed JSON gets a JSON-RPC parse
/// error instead of an HTTP 400. Notifications are acknowledged with 202.
async fn mcp_handler(server: web::Data<McpServer>, body: String) -> HttpResponse {
    match server.handle_message(&body) {
        Some(response) => HttpResponse::Ok().json(response),
        None => HttpResponse::Accepted().finish(),
    }
}

/// Register the MCP routes on an Actix app.
pub fn mcp_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/mcp", web::post().to(mcp_handler))
        .route("/", web::post().to(mcp_handler))
        .route("/", web::get().to(health));
}

/// Run the MCP server in HTTP mode.
///
/// Configures and starts an Actix Web HTTP server. Actix's own signal
/// handling is disabled: interruption is handled once, in `main`.
///
/// # Configuration
/// The server is configured with:
/// - Worker threads: from `ServerConfig::workers`
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive: 30 seconds
/// - Request timeout: 30 seconds
/// - Disconnect timeout: 2 seconds
/// - Shutdown timeout: 10 seconds
pub async fn run_server_http(server: McpServer, config: &ServerConfig) -> std::io::Result<()> {
    use std::time::Duration;

    let bind_addr = config.bind_addr();
    let server = web::Data::new(server);

    info!(
        bind = %bind_addr,
        workers = config.workers,
        "HTTP transport listening"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(server.clone())
            // Enable compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            // Add security headers to all responses
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block"))
            )
            // Format: %r = request line, %s = status, %Dms = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .configure(mcp_routes)
    })
    .workers(config.workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .disable_signals()
    .bind(&bind_addr)?
    .run()
    .await
}

/// Serve MCP over any line-oriented byte stream.
///
/// Reads JSON-RPC messages line by line and writes one response line per
/// request, flushing after each. Returns when the reader reaches EOF.
pub async fn serve_stdio<R, W>(server: &McpServer, reader: R, writer: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    // 8KB buffer size balances memory usage with I/O efficiency
    let mut reader = BufReader::with_capacity(8192, reader);
    let mut writer = BufWriter::with_capacity(8192, writer);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        // A line that is not UTF-8 cannot be JSON: answer it, keep serving
        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => server.handle_message(line.trim_end_matches(['\r', '\n'])),
            Err(e) => {
                warn!(error = %e, "received non UTF-8 line");
                Some(MCPResponse::error(
                    None,
                    MCPError::new(error_codes::PARSE_ERROR, format!("Parse error: {e}")),
                ))
            }
        };
        let Some(response) = response else {
            continue;
        };

        let response_json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "failed to serialize response");
                continue;
            }
        };

        // Each response must be on a single line followed by newline
        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    info!("stdin closed, STDIO transport finished");
    Ok(())
}

/// Run the MCP server in STDIO mode.
///
/// All logging goes to stderr to avoid interfering with the JSON-RPC
/// protocol stream on stdout.
pub async fn run_server_stdio(server: McpServer) -> std::io::Result<()> {
    info!("STDIO transport ready");
    serve_stdio(&server, tokio::io::stdin(), tokio::io::stdout()).await
}
