/// Tool, Resource and Prompt Registry
///
/// Everything the server exposes is registered here explicitly during
/// start-up. Each entry pairs the metadata returned by the `*/list` methods
/// with the handler invoked by `tools/call`, `resources/read` or `prompts/get`.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::core::error::{HandlerError, TemplateError};
use crate::core::uri_template::UriTemplate;

/// MCP tool definition structure.
///
/// Each tool must have a unique name, description, and JSON schema defining
/// its input parameters. This structure is serialized when listing tools.
#[derive(Serialize, Debug, Clone)]
pub struct MCPTool {
    /// Unique tool identifier (e.g., "steps_to_miles")
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema defining the tool's input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// MCP resource template definition, as listed by `resources/templates/list`.
#[derive(Serialize, Debug, Clone)]
pub struct MCPResourceTemplate {
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// A single argument accepted by a prompt.
#[derive(Serialize, Debug, Clone)]
pub struct MCPPromptArgument {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
}

/// MCP prompt definition, as listed by `prompts/list`.
#[derive(Serialize, Debug, Clone)]
pub struct MCPPrompt {
    pub name: String,
    pub description: String,
    pub arguments: Vec<MCPPromptArgument>,
}

/// Tool handler function type definition.
///
/// Tool handlers are boxed closures that take the JSON `arguments` object and
/// return either a JSON result or a handler error. The handler must be
/// Send + Sync to work across threads in the HTTP server.
pub type ToolHandler = Box<dyn Fn(Value) -> Result<Value, HandlerError> + Send + Sync>;

/// Resource handler: receives the parameters captured from the URI template.
pub type ResourceHandler =
    Box<dyn Fn(&HashMap<String, String>) -> Result<String, HandlerError> + Send + Sync>;

/// Prompt handler: receives the prompt arguments and renders the prompt text.
pub type PromptHandler =
    Box<dyn Fn(&Map<String, Value>) -> Result<String, HandlerError> + Send + Sync>;

struct ResourceEntry {
    definition: MCPResourceTemplate,
    template: UriTemplate,
    handler: ResourceHandler,
}

struct PromptEntry {
    definition: MCPPrompt,
    handler: PromptHandler,
}

/// Text produced by reading a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceContent {
    pub mime_type: String,
    pub text: String,
}

/// A rendered prompt, ready to be wrapped into a `prompts/get` response.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPrompt {
    pub description: String,
    pub text: String,
}

/// Registry of everything the server exposes.
///
/// Tools and prompts are keyed by name. Resource templates are kept in
/// registration order and the first matching template wins on `resources/read`.
#[derive(Default)]
pub struct Registry {
    /// List of all registered tools (for tools/list method)
    pub tools: Vec<MCPTool>,
    /// Map of tool names to their handler functions (for tools/call method)
    handlers: HashMap<String, ToolHandler>,
    resources: Vec<ResourceEntry>,
    prompts: Vec<PromptEntry>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool with the registry.
    ///
    /// This method adds the tool definition to the tools list and stores
    /// the handler function in the handlers map for later execution.
    ///
    /// # Arguments
    /// * `tool` - Tool definition with name, description, and input schema
    /// * `handler` - Function that executes the tool when called
    pub fn register_tool(&mut self, tool: MCPTool, handler: ToolHandler) {
        let name = tool.name.clone();
        tracing::debug!(tool = %name, "registered tool");
        self.tools.retain(|t| t.name != name);
        self.tools.push(tool);
        self.handlers.insert(name, handler);
    }

    /// Register a templated resource.
    ///
    /// Fails if the definition's `uri_template` cannot be parsed.
    pub fn register_resource_template(
        &mut self,
        definition: MCPResourceTemplate,
        handler: ResourceHandler,
    ) -> Result<(), TemplateError> {
        let template = UriTemplate::parse(&definition.uri_template)?;
        tracing::debug!(template = %template.as_str(), "registered resource template");
        self.resources.push(ResourceEntry {
            definition,
            template,
            handler,
        });
        Ok(())
    }

    /// Register a prompt. A later registration under the same name replaces
    /// the earlier one.
    pub fn register_prompt(&mut self, definition: MCPPrompt, handler: PromptHandler) {
        tracing::debug!(prompt = %definition.name, "registered prompt");
        self.prompts.retain(|p| p.definition.name != definition.name);
        self.prompts.push(PromptEntry {
            definition,
            handler,
        });
    }

    /// Look up a tool handler by name.
    pub fn tool_handler(&self, name: &str) -> Option<&ToolHandler> {
        self.handlers.get(name)
    }

    pub fn resource_templates(&self) -> Vec<&MCPResourceTemplate> {
        self.resources.iter().map(|r| &r.definition).collect()
    }

    pub fn prompts(&self) -> Vec<&MCPPrompt> {
        self.prompts.iter().map(|p| &p.definition).collect()
    }

    /// Read a resource by concrete URI.
    pub fn read_resource(&self, uri: &str) -> Result<ResourceContent, HandlerError> {
        for entry in &self.resources {
            if let Some(params) = entry.template.matches(uri) {
                let text = (entry.handler)(&params)?;
                return Ok(ResourceContent {
                    mime_type: entry.definition.mime_type.clone(),
                    text,
                });
            }
        }
        Err(HandlerError::UnknownResource(uri.to_string()))
    }

    /// Render a prompt after checking that every required argument is present.
    pub fn get_prompt(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<RenderedPrompt, HandlerError> {
        let entry = self
            .prompts
            .iter()
            .find(|p| p.definition.name == name)
            .ok_or_else(|| HandlerError::UnknownPrompt(name.to_string()))?;

        if let Some(missing) = entry
            .definition
            .arguments
            .iter()
            .find(|arg| arg.required && !arguments.contains_key(&arg.name))
        {
            return Err(HandlerError::MissingParameter(missing.name.clone()));
        }

        let text = (entry.handler)(arguments)?;
        Ok(RenderedPrompt {
            description: entry.definition.description.clone(),
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_tool() -> MCPTool {
        MCPTool {
            name: "echo".to_string(),
            description: "Echo".to_string(),
            input_schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn reregistering_a_tool_replaces_it() {
        let mut registry = Registry::new();
        registry.register_tool(echo_tool(), Box::new(|_: Value| Ok::<_, HandlerError>(json!(1))));
        registry.register_tool(echo_tool(), Box::new(|_: Value| Ok::<_, HandlerError>(json!(2))));

        assert_eq!(registry.tools.len(), 1);
        let handler = registry.tool_handler("echo").unwrap();
        assert_eq!(handler(json!({})).unwrap(), json!(2));
    }

    #[test]
    fn first_matching_resource_template_wins() {
        let mut registry = Registry::new();
        for (template, reply) in [("a://{x}", "first"), ("a://{y}", "second")] {
            registry
                .register_resource_template(
                    MCPResourceTemplate {
                        uri_template: template.to_string(),
                        name: template.to_string(),
                        description: String::new(),
                        mime_type: "text/plain".to_string(),
                    },
                    Box::new(move |_: &HashMap<String, String>| Ok::<_, HandlerError>(reply.to_string())),
                )
                .unwrap();
        }

        let content = registry.read_resource("a://z").unwrap();
        assert_eq!(content.text, "first");
        assert_eq!(
            registry.read_resource("b://z").unwrap_err(),
            HandlerError::UnknownResource("b://z".to_string())
        );
    }

    #[test]
    fn malformed_template_is_rejected() {
        let mut registry = Registry::new();
        let result = registry.register_resource_template(
            MCPResourceTemplate {
                uri_template: "bad://{".to_string(),
                name: "bad".to_string(),
                description: String::new(),
                mime_type: "text/plain".to_string(),
            },
            Box::new(|_: &HashMap<String, String>| Ok::<_, HandlerError>(String::new())),
        );
        assert!(result.is_err());
        assert!(registry.resource_templates().is_empty());
    }

    #[test]
    fn prompt_requires_declared_arguments() {
        let mut registry = Registry::new();
        registry.register_prompt(
            MCPPrompt {
                name: "p".to_string(),
                description: "d".to_string(),
                arguments: vec![MCPPromptArgument {
                    name: "who".to_string(),
                    description: None,
                    required: true,
                }],
            },
            Box::new(|args: &Map<String, Value>| {
                Ok::<_, HandlerError>(format!("hi {}", args["who"].as_str().unwrap_or("")))
            }),
        );

        assert_eq!(
            registry.get_prompt("p", &Map::new()).unwrap_err(),
            HandlerError::MissingParameter("who".to_string())
        );
        assert_eq!(
            registry.get_prompt("q", &Map::new()).unwrap_err(),
            HandlerError::UnknownPrompt("q".to_string())
        );

        let mut args = Map::new();
        args.insert("who".to_string(), json!("Ada"));
        let rendered = registry.get_prompt("p", &args).unwrap();
        assert_eq!(rendered.text, "hi Ada");
        assert_eq!(rendered.description, "d");
    }
}
