/// Core Server Framework Module
///
/// This module contains the core server implementation including:
/// - server.rs: MCP dispatch with HTTP and STDIO transports
/// - registry.rs: explicit registration of tools, resources and prompts
/// - uri_template.rs: matching of templated resource URIs
/// - error.rs: handler and server error types
/// - utils.rs: configuration and environment helpers

pub mod error;
pub mod registry;
pub mod server;
pub mod uri_template;
pub mod utils;
