/// Error Types
///
/// Errors raised while serving MCP requests. Handler errors are reported back
/// to the client (as tool-level errors or JSON-RPC errors), server errors end
/// the process.

use thiserror::Error;

/// Errors returned by tool, resource and prompt handlers.
#[derive(Debug, Error, PartialEq)]
pub enum HandlerError {
    /// A required argument was not supplied.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),
    /// An argument was supplied with the wrong type or shape.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
    /// No registered resource template matches the requested URI.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),
    /// No prompt is registered under the requested name.
    #[error("Unknown prompt: {0}")]
    UnknownPrompt(String),
}

/// Errors raised when a URI template cannot be parsed.
#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("unclosed placeholder in template '{0}'")]
    Unclosed(String),
    #[error("empty placeholder name in template '{0}'")]
    EmptyName(String),
    #[error("adjacent placeholders without a separator in template '{0}'")]
    AdjacentPlaceholders(String),
}

/// Errors that stop the server process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid transport mode '{0}': must be 'stdio', 'http', or 'both'")]
    InvalidTransport(String),
    #[error("invalid resource template: {0}")]
    Template(#[from] TemplateError),
}
