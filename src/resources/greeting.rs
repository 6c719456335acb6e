/// Greeting Resource
///
/// Serves `greeting://{name}`: a personalized greeting for whatever name
/// appears in the URI.

use std::collections::HashMap;

use crate::core::error::{HandlerError, TemplateError};
use crate::core::registry::{MCPResourceTemplate, Registry, ResourceHandler};

pub const URI_TEMPLATE: &str = "greeting://{name}";

/// Build the greeting text. The name is inserted verbatim, without escaping.
pub fn build_greeting(name: &str) -> String {
    format!("Hello, {name}!")
}

pub fn register(registry: &mut Registry) -> Result<(), TemplateError> {
    let definition = MCPResourceTemplate {
        uri_template: URI_TEMPLATE.to_string(),
        name: "get_greeting".to_string(),
        description: "Get a personalized greeting".to_string(),
        mime_type: "text/plain".to_string(),
    };

    let handler: ResourceHandler = Box::new(|params: &HashMap<String, String>| -> Result<String, HandlerError> {
        let name = params
            .get("name")
            .ok_or_else(|| HandlerError::MissingParameter("name".to_string()))?;
        Ok(build_greeting(name))
    });

    registry.register_resource_template(definition, handler)
}
