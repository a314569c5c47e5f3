//! Prompt Renderer — executes a parsed template against a validated input.

use serde_json::Value;

use crate::flow::error::{Boundary, FlowError};
use crate::flow::schema::{FieldViolation, SchemaValidationError};
use crate::flow::template::{Instruction, Template};
use crate::flow::tool::ToolDispatcher;

/// Renders `template` with `input`, dispatching tool markers in order.
///
/// Rendering is deterministic for a given input and tool results. On a tool
/// failure the partially built prompt is discarded.
pub async fn render(
    flow: &str,
    template: &Template,
    input: &Value,
    tools: &ToolDispatcher<'_>,
) -> Result<String, FlowError> {
    let mut out = String::with_capacity(template.source().len());

    for instruction in template.instructions() {
        match instruction {
            Instruction::Text(text) => out.push_str(text),
            Instruction::Field(path) => push_value(&mut out, path.resolve(input)),
            Instruction::Item(_) => {
                // the parser only emits Item inside an Each body
            }
            Instruction::Each { field, body } => {
                let items = match field.resolve(input) {
                    None | Some(Value::Null) => &[][..],
                    Some(Value::Array(items)) => items.as_slice(),
                    Some(_) => {
                        return Err(FlowError::SchemaValidation {
                            boundary: Boundary::FlowInput {
                                flow: flow.to_string(),
                            },
                            source: SchemaValidationError {
                                violations: vec![FieldViolation {
                                    field: field.to_string(),
                                    expected: "array".to_string(),
                                    found: "non-array value".to_string(),
                                }],
                            },
                        });
                    }
                };
                for item in items {
                    for part in body {
                        match part {
                            Instruction::Text(text) => out.push_str(text),
                            Instruction::Field(path) => push_value(&mut out, path.resolve(input)),
                            Instruction::Item(path) => push_value(&mut out, path.resolve(item)),
                            Instruction::Each { .. } | Instruction::Tool(_) => {}
                        }
                    }
                }
            }
            Instruction::Tool(marker) => {
                let result = tools.dispatch(marker, input).await?;
                push_value(&mut out, Some(&result));
            }
        }
    }

    Ok(out)
}

/// Formats a resolved value for inlining. Absent values render as nothing.
fn push_value(out: &mut String, value: Option<&Value>) {
    match value {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) => out.push_str(s),
        Some(Value::Array(items)) => {
            let mut first = true;
            for item in items {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                push_value(out, Some(item));
            }
        }
        Some(other) => out.push_str(&other.to_string()),
    }
}
