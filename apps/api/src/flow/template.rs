//! Prompt template parsing.
//!
//! Templates are parsed once, when a flow is defined, into an ordered list of
//! [`Instruction`]s. The marker syntax is:
//!
//! - `{{path}}` — interpolate a field of the input (dotted paths allowed)
//! - `{{#each field}} ... {{/each}}` — repeat the body once per array element;
//!   `{{this}}` / `{{this.key}}` refer to the current element
//! - `{{@tool name arg=path ...}}` — invoke a declared tool and inline its result
//!
//! Text outside markers is kept byte-for-byte.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("unterminated marker starting at byte {offset}")]
    Unterminated { offset: usize },

    #[error("invalid field path '{path}' at byte {offset}")]
    InvalidPath { path: String, offset: usize },

    #[error("'{{{{/each}}}}' at byte {offset} has no matching '#each'")]
    UnmatchedClose { offset: usize },

    #[error("'#each {field}' is never closed")]
    UnclosedEach { field: String },

    #[error("nested '#each' at byte {offset} is not supported")]
    NestedEach { offset: usize },

    #[error("tool marker inside '#each' at byte {offset} is not supported")]
    ToolInsideEach { offset: usize },

    #[error("'this' used outside '#each' at byte {offset}")]
    ThisOutsideEach { offset: usize },

    #[error("malformed tool marker at byte {offset}: {reason}")]
    MalformedTool { offset: usize, reason: String },

    #[error("template references undeclared tool '{name}'")]
    UndeclaredTool { name: String },

    #[error("tool '{name}' is declared more than once")]
    DuplicateTool { name: String },
}

/// A dotted path into a JSON value. An empty path refers to the value itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    fn parse(raw: &str, offset: usize) -> Result<Self, TemplateError> {
        let invalid = || TemplateError::InvalidPath {
            path: raw.to_string(),
            offset,
        };
        if raw.is_empty() {
            return Err(invalid());
        }
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        let valid = segments.iter().all(|s| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if !valid {
            return Err(invalid());
        }
        Ok(Self(segments))
    }

    fn empty() -> Self {
        Self(Vec::new())
    }

    /// Walks the path through nested objects. `None` when any segment is absent.
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.0
            .iter()
            .try_fold(value, |current, segment| current.get(segment.as_str()))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A `{{@tool ...}}` marker: tool name plus argument-name → input-field mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolMarker {
    pub name: String,
    pub args: Vec<(String, FieldPath)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Verbatim template text.
    Text(String),
    /// Interpolation of an input field.
    Field(FieldPath),
    /// `this` (empty path) or `this.key` inside an `#each` body.
    Item(FieldPath),
    /// Iteration over an array field.
    Each {
        field: FieldPath,
        body: Vec<Instruction>,
    },
    /// Tool invocation whose result is inlined.
    Tool(ToolMarker),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    instructions: Vec<Instruction>,
}

struct OpenEach {
    field: FieldPath,
    body: Vec<Instruction>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut root: Vec<Instruction> = Vec::new();
        let mut open: Option<OpenEach> = None;
        let mut cursor = 0;

        while let Some(found) = source[cursor..].find(OPEN) {
            let start = cursor + found;
            emit_text(target(&mut root, &mut open), &source[cursor..start]);

            let inner_start = start + OPEN.len();
            let inner_len = source[inner_start..]
                .find(CLOSE)
                .ok_or(TemplateError::Unterminated { offset: start })?;
            let inner = source[inner_start..inner_start + inner_len].trim();
            cursor = inner_start + inner_len + CLOSE.len();

            if let Some(rest) = inner.strip_prefix("#each") {
                if open.is_some() {
                    return Err(TemplateError::NestedEach { offset: start });
                }
                if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                    return Err(TemplateError::InvalidPath {
                        path: inner.to_string(),
                        offset: start,
                    });
                }
                open = Some(OpenEach {
                    field: FieldPath::parse(rest.trim(), start)?,
                    body: Vec::new(),
                });
            } else if inner == "/each" {
                let block = open
                    .take()
                    .ok_or(TemplateError::UnmatchedClose { offset: start })?;
                root.push(Instruction::Each {
                    field: block.field,
                    body: block.body,
                });
            } else if let Some(rest) = inner.strip_prefix("@tool") {
                if open.is_some() {
                    return Err(TemplateError::ToolInsideEach { offset: start });
                }
                root.push(Instruction::Tool(parse_tool(rest, start)?));
            } else if inner == "this" || inner.starts_with("this.") {
                let Some(block) = open.as_mut() else {
                    return Err(TemplateError::ThisOutsideEach { offset: start });
                };
                let path = match inner.strip_prefix("this.") {
                    Some(rest) => FieldPath::parse(rest, start)?,
                    None => FieldPath::empty(),
                };
                block.body.push(Instruction::Item(path));
            } else {
                let path = FieldPath::parse(inner, start)?;
                target(&mut root, &mut open).push(Instruction::Field(path));
            }
        }

        if let Some(block) = open {
            return Err(TemplateError::UnclosedEach {
                field: block.field.to_string(),
            });
        }
        emit_text(&mut root, &source[cursor..]);

        Ok(Self {
            source: source.to_string(),
            instructions: root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Names of all tools referenced by the template, in marker order.
    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.instructions.iter().filter_map(|i| match i {
            Instruction::Tool(marker) => Some(marker.name.as_str()),
            _ => None,
        })
    }
}

fn target<'a>(root: &'a mut Vec<Instruction>, open: &'a mut Option<OpenEach>) -> &'a mut Vec<Instruction> {
    match open {
        Some(block) => &mut block.body,
        None => root,
    }
}

fn emit_text(out: &mut Vec<Instruction>, text: &str) {
    if !text.is_empty() {
        out.push(Instruction::Text(text.to_string()));
    }
}

fn parse_tool(rest: &str, offset: usize) -> Result<ToolMarker, TemplateError> {
    let malformed = |reason: &str| TemplateError::MalformedTool {
        offset,
        reason: reason.to_string(),
    };

    // "@toolfoo" is not a tool marker with name "foo"
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(malformed("expected whitespace after '@tool'"));
    }

    let mut tokens = rest.split_whitespace();
    let name = tokens.next().ok_or_else(|| malformed("missing tool name"))?;

    let mut args = Vec::new();
    for token in tokens {
        let (arg, path) = token
            .split_once('=')
            .ok_or_else(|| malformed(&format!("argument '{token}' is not of the form name=field")))?;
        if arg.is_empty() {
            return Err(malformed(&format!("argument '{token}' has an empty name")));
        }
        args.push((arg.to_string(), FieldPath::parse(path, offset)?));
    }

    Ok(ToolMarker {
        name: name.to_string(),
        args,
    })
}
