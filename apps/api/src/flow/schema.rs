//! Schema Validator — declarative shape descriptions checked at every flow boundary.
//!
//! A schema narrows a candidate `serde_json::Value` to the declared shape:
//! unknown object keys are dropped, absent optional fields are omitted, and every
//! offending field is reported in a single `SchemaValidationError`.
//! Field descriptions are advisory: they travel to the model in the shape hint
//! and are never enforced.

use std::fmt;

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Declarative description of a value's shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String,
    /// Any JSON number. Bounds are inclusive.
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Integer,
    Boolean,
    Array(Box<Schema>),
    Object(ObjectSchema),
}

/// A single named field of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    pub required: bool,
    pub description: Option<String>,
}

/// Ordered set of fields. Order is preserved in shape hints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<Field>,
}

/// One offending field found during validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    /// Dotted path, with `[i]` for array elements. `(root)` for the value itself.
    pub field: String,
    pub expected: String,
    pub found: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}': expected {}, found {}",
            self.field, self.expected, self.found
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", join_violations(.violations))]
pub struct SchemaValidationError {
    pub violations: Vec<FieldViolation>,
}

impl SchemaValidationError {
    /// Names of every offending field, in the order they were found.
    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

const ROOT: &str = "(root)";

impl Schema {
    pub fn number() -> Self {
        Schema::Number {
            min: None,
            max: None,
        }
    }

    pub fn bounded(min: f64, max: f64) -> Self {
        Schema::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn array_of(item: Schema) -> Self {
        Schema::Array(Box::new(item))
    }

    pub fn string_array() -> Self {
        Schema::array_of(Schema::String)
    }

    /// Validates `value` and returns it narrowed to this schema.
    pub fn validate(&self, value: &Value) -> Result<Value, SchemaValidationError> {
        let mut violations = Vec::new();
        let narrowed = check(self, value, "", &mut violations);
        match narrowed {
            Some(v) if violations.is_empty() => Ok(v),
            _ => Err(SchemaValidationError { violations }),
        }
    }

    /// Human-readable type name used in violation messages.
    pub fn type_name(&self) -> String {
        match self {
            Schema::String => "string".to_string(),
            Schema::Number { min, max } => match (min, max) {
                (None, None) => "number".to_string(),
                (Some(lo), Some(hi)) => format!("number in [{lo}, {hi}]"),
                (Some(lo), None) => format!("number >= {lo}"),
                (None, Some(hi)) => format!("number <= {hi}"),
            },
            Schema::Integer => "integer".to_string(),
            Schema::Boolean => "boolean".to_string(),
            Schema::Array(item) => format!("array<{}>", item.type_name()),
            Schema::Object(_) => "object".to_string(),
        }
    }

    /// JSON-Schema-like rendering, handed to the model as an output-shape hint.
    pub fn shape_hint(&self) -> Value {
        match self {
            Schema::String => json!({ "type": "string" }),
            Schema::Number { min, max } => {
                let mut hint = Map::new();
                hint.insert("type".into(), json!("number"));
                if let Some(lo) = min {
                    hint.insert("minimum".into(), json!(lo));
                }
                if let Some(hi) = max {
                    hint.insert("maximum".into(), json!(hi));
                }
                Value::Object(hint)
            }
            Schema::Integer => json!({ "type": "integer" }),
            Schema::Boolean => json!({ "type": "boolean" }),
            Schema::Array(item) => json!({ "type": "array", "items": item.shape_hint() }),
            Schema::Object(object) => object.shape_hint(),
        }
    }
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required field.
    pub fn required(self, name: &str, schema: Schema, description: &str) -> Self {
        self.push(name, schema, true, description)
    }

    /// Adds an optional field. Absent or `null` values are omitted after validation.
    pub fn optional(self, name: &str, schema: Schema, description: &str) -> Self {
        self.push(name, schema, false, description)
    }

    fn push(mut self, name: &str, schema: Schema, required: bool, description: &str) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            schema,
            required,
            description: (!description.is_empty()).then(|| description.to_string()),
        });
        self
    }

    pub fn validate(&self, value: &Value) -> Result<Value, SchemaValidationError> {
        let mut violations = Vec::new();
        let narrowed = check_object(self, value, "", &mut violations);
        match narrowed {
            Some(v) if violations.is_empty() => Ok(v),
            _ => Err(SchemaValidationError { violations }),
        }
    }

    pub fn shape_hint(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut hint = field.schema.shape_hint();
            if let (Some(description), Value::Object(map)) = (&field.description, &mut hint) {
                map.insert("description".into(), json!(description));
            }
            properties.insert(field.name.clone(), hint);
        }
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Schema::Object(object)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validation walk
// ────────────────────────────────────────────────────────────────────────────

fn check(schema: &Schema, value: &Value, path: &str, out: &mut Vec<FieldViolation>) -> Option<Value> {
    match schema {
        Schema::String => value.is_string().then(|| value.clone()).or_else(|| {
            out.push(violation(path, schema, value));
            None
        }),
        Schema::Number { min, max } => {
            let Some(n) = value.as_f64() else {
                out.push(violation(path, schema, value));
                return None;
            };
            let below = min.is_some_and(|lo| n < lo);
            let above = max.is_some_and(|hi| n > hi);
            if below || above {
                out.push(FieldViolation {
                    field: display_path(path),
                    expected: schema.type_name(),
                    found: n.to_string(),
                });
                return None;
            }
            Some(value.clone())
        }
        // signed 64-bit; larger integers are reported as a type mismatch
        Schema::Integer => {
            if value.is_i64() {
                Some(value.clone())
            } else {
                out.push(violation(path, schema, value));
                None
            }
        }
        Schema::Boolean => value.is_boolean().then(|| value.clone()).or_else(|| {
            out.push(violation(path, schema, value));
            None
        }),
        Schema::Array(item) => {
            let Some(items) = value.as_array() else {
                out.push(violation(path, schema, value));
                return None;
            };
            let before = out.len();
            let narrowed: Vec<Value> = items
                .iter()
                .enumerate()
                .filter_map(|(i, v)| check(item, v, &format!("{path}[{i}]"), out))
                .collect();
            (out.len() == before).then_some(Value::Array(narrowed))
        }
        Schema::Object(object) => check_object(object, value, path, out),
    }
}

fn check_object(
    object: &ObjectSchema,
    value: &Value,
    path: &str,
    out: &mut Vec<FieldViolation>,
) -> Option<Value> {
    let Some(map) = value.as_object() else {
        out.push(FieldViolation {
            field: display_path(path),
            expected: "object".to_string(),
            found: kind_of(value).to_string(),
        });
        return None;
    };

    let before = out.len();
    let mut narrowed = Map::new();
    for field in &object.fields {
        let field_path = if path.is_empty() {
            field.name.clone()
        } else {
            format!("{path}.{}", field.name)
        };
        match map.get(&field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    out.push(FieldViolation {
                        field: field_path,
                        expected: field.schema.type_name(),
                        found: "missing".to_string(),
                    });
                }
            }
            Some(v) => {
                if let Some(checked) = check(&field.schema, v, &field_path, out) {
                    narrowed.insert(field.name.clone(), checked);
                }
            }
        }
    }
    (out.len() == before).then_some(Value::Object(narrowed))
}

fn violation(path: &str, schema: &Schema, value: &Value) -> FieldViolation {
    FieldViolation {
        field: display_path(path),
        expected: schema.type_name(),
        found: kind_of(value).to_string(),
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        ROOT.to_string()
    } else {
        path.to_string()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
