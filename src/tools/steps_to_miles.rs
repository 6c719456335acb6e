/// Steps to Miles Tool Implementation
///
/// Converts a step count into an approximate distance in miles, assuming a
/// fixed 2000 steps per mile.

use crate::core::error::HandlerError;
use crate::core::registry::{MCPTool, Registry, ToolHandler};
use serde_json::Value;

/// Steps taken to cover one mile.
pub const STEPS_PER_MILE: f64 = 2000.0;

/// Convert steps to miles.
///
/// No validation is performed: zero and negative counts convert like any
/// other integer.
pub fn convert_steps_to_miles(steps: i64) -> f64 {
    steps as f64 / STEPS_PER_MILE
}

/// Extract the integer `steps` argument from the tool call arguments.
///
/// Integral floats (`2000.0`) and numeric strings (`"2000"`) are coerced;
/// anything with a fractional part is rejected.
fn steps_argument(args: &Value) -> Result<i64, HandlerError> {
    let value = match args.get("steps") {
        None | Some(Value::Null) => return Err(HandlerError::MissingParameter("steps".to_string())),
        Some(value) => value,
    };

    let steps = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    steps.ok_or_else(|| HandlerError::InvalidParameter {
        name: "steps".to_string(),
        reason: format!("expected an integer, got {value}"),
    })
}

/// Register the steps_to_miles tool with the registry.
///
/// # Arguments
/// * `registry` - Mutable reference to the registry where the tool will be registered
pub fn register(registry: &mut Registry) {
    let tool = MCPTool {
        name: "steps_to_miles".to_string(),
        description: "Convert steps to miles. Takes the number of steps (integer) \
                      and returns the number of miles (float)."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "steps": {
                    "type": "integer",
                    "description": "Number of steps"
                }
            },
            "required": ["steps"]
        }),
    };

    let handler: ToolHandler = Box::new(|args: Value| -> Result<Value, HandlerError> {
        let steps = steps_argument(&args)?;
        Ok(serde_json::json!(convert_steps_to_miles(steps)))
    });

    registry.register_tool(tool, handler);
}
