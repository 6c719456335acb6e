/// Greet User Prompt
///
/// Produces an instruction asking for a greeting in one of a few fixed
/// styles. Unknown styles are not an error; they fall back to `friendly`.

use serde_json::{Map, Value};

use crate::core::error::HandlerError;
use crate::core::registry::{MCPPrompt, MCPPromptArgument, PromptHandler, Registry};

/// Tone of the requested greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GreetingStyle {
    #[default]
    Friendly,
    Formal,
    Casual,
}

impl GreetingStyle {
    /// Look up a style by key. Keys are matched exactly.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "friendly" => Some(Self::Friendly),
            "formal" => Some(Self::Formal),
            "casual" => Some(Self::Casual),
            _ => None,
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Self::Friendly => "Please write a warm, friendly greeting",
            Self::Formal => "Please write a formal, professional greeting",
            Self::Casual => "Please write a casual, relaxed greeting",
        }
    }
}

/// Build the prompt text for `name`, falling back to the friendly style when
/// `style` is absent or unrecognized.
pub fn build_prompt(name: &str, style: Option<&str>) -> String {
    let style = style.and_then(GreetingStyle::from_key).unwrap_or_default();
    format!("{} for someone named {}.", style.instruction(), name)
}

fn string_argument<'a>(
    args: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a str>, HandlerError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(HandlerError::InvalidParameter {
            name: key.to_string(),
            reason: format!("expected a string, got {other}"),
        }),
    }
}

pub fn register(registry: &mut Registry) {
    let definition = MCPPrompt {
        name: "greet_user".to_string(),
        description: "Generate a greeting prompt".to_string(),
        arguments: vec![
            MCPPromptArgument {
                name: "name".to_string(),
                description: Some("Name of the person to greet".to_string()),
                required: true,
            },
            MCPPromptArgument {
                name: "style".to_string(),
                description: Some("One of friendly, formal or casual (default: friendly)".to_string()),
                required: false,
            },
        ],
    };

    let handler: PromptHandler = Box::new(|args: &Map<String, Value>| -> Result<String, HandlerError> {
        let name = string_argument(args, "name")?
            .ok_or_else(|| HandlerError::MissingParameter("name".to_string()))?;
        let style = string_argument(args, "style")?;
        Ok(build_prompt(name, style))
    });

    registry.register_prompt(definition, handler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formal_style() {
        assert_eq!(
            build_prompt("Ada", Some("formal")),
            "Please write a formal, professional greeting for someone named Ada."
        );
    }

    #[test]
    fn casual_style() {
        assert_eq!(
            build_prompt("Ada", Some("casual")),
            "Please write a casual, relaxed greeting for someone named Ada."
        );
    }

    #[test]
    fn missing_style_defaults_to_friendly() {
        assert_eq!(build_prompt("Ada", None), build_prompt("Ada", Some("friendly")));
        assert_eq!(
            build_prompt("Ada", None),
            "Please write a warm, friendly greeting for someone named Ada."
        );
    }

    #[test]
    fn unknown_style_falls_back_silently() {
        assert_eq!(build_prompt("Ada", Some("unknown-style")), build_prompt("Ada", None));
        assert_eq!(build_prompt("Ada", Some("FORMAL")), build_prompt("Ada", None));
    }

    #[test]
    fn handler_validates_argument_types() {
        let mut registry = Registry::new();
        register(&mut registry);

        let args = json!({"name": "Ada", "style": "casual"});
        let rendered = registry
            .get_prompt("greet_user", args.as_object().unwrap())
            .unwrap();
        assert_eq!(rendered.text, build_prompt("Ada", Some("casual")));

        let args = json!({"name": 42});
        assert!(matches!(
            registry.get_prompt("greet_user", args.as_object().unwrap()),
            Err(HandlerError::InvalidParameter { .. })
        ));
    }
}
