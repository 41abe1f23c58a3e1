//! Declarative tool input schemas
//!
//! Each tool describes its arguments as a list of [`Field`]s. The same
//! description renders the JSON Schema advertised during discovery, and
//! arguments are validated against that same rendered schema.

use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema, ValidationError};
use serde_json::{json, Map, Value};

/// The accepted shape of a single value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// UTF-8 string with a character-count range
    String { min_len: usize, max_len: Option<usize> },
    /// Whole number greater than zero
    PositiveInteger,
    Boolean,
    Array {
        items: Box<FieldType>,
        min_items: usize,
        max_items: Option<usize>,
    },
    Object(Vec<Field>),
}

impl FieldType {
    pub fn string(min_len: usize, max_len: Option<usize>) -> Self {
        FieldType::String { min_len, max_len }
    }

    pub fn array(items: FieldType, min_items: usize, max_items: Option<usize>) -> Self {
        FieldType::Array {
            items: Box::new(items),
            min_items,
            max_items,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            FieldType::String { .. } => "string",
            FieldType::PositiveInteger => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Array { .. } => "array",
            FieldType::Object(_) => "object",
        }
    }

    fn to_json_schema(&self) -> Map<String, Value> {
        let mut schema = Map::new();
        schema.insert("type".into(), json!(self.type_name()));
        match self {
            FieldType::String { min_len, max_len } => {
                if *min_len > 0 {
                    schema.insert("minLength".into(), json!(min_len));
                }
                if let Some(max) = max_len {
                    schema.insert("maxLength".into(), json!(max));
                }
            }
            FieldType::PositiveInteger => {
                schema.insert("minimum".into(), json!(1));
            }
            FieldType::Boolean => {}
            FieldType::Array {
                items,
                min_items,
                max_items,
            } => {
                schema.insert("items".into(), Value::Object(items.to_json_schema()));
                if *min_items > 0 {
                    schema.insert("minItems".into(), json!(min_items));
                }
                if let Some(max) = max_items {
                    schema.insert("maxItems".into(), json!(max));
                }
            }
            FieldType::Object(fields) => {
                let (properties, required) = object_schema(fields);
                schema.insert("properties".into(), Value::Object(properties));
                schema.insert("required".into(), json!(required));
            }
        }
        schema
    }
}

/// A named argument
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldType,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, kind: FieldType, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind,
            required: true,
        }
    }

    pub fn optional(name: &'static str, kind: FieldType, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind,
            required: false,
        }
    }
}

/// Input contract of one tool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    pub fields: Vec<Field>,
}

impl InputSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Render as a JSON Schema object
    pub fn to_json_schema(&self) -> Map<String, Value> {
        let (properties, required) = object_schema(&self.fields);
        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        schema.insert("required".into(), json!(required));
        schema
    }

    /// Check `args` against the rendered schema, collecting all problems
    pub fn validate(&self, args: &Map<String, Value>) -> Result<(), ValidationErrors> {
        let schema = Value::Object(self.to_json_schema());
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema)
            .map_err(|e| ValidationErrors::single("", format!("invalid tool schema: {}", e)))?;

        let instance = Value::Object(args.clone());
        let result = compiled.validate(&instance);
        if let Err(errors) = result {
            return Err(ValidationErrors(errors.map(FieldIssue::from).collect()));
        }
        Ok(())
    }
}

/// One failing field: dotted path plus the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub path: String,
    pub reason: String,
}

impl FieldIssue {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

// Missing properties are reported against their parent object, so the
// property name is appended to keep the path pointing at the field itself.
impl From<ValidationError<'_>> for FieldIssue {
    fn from(error: ValidationError<'_>) -> Self {
        let mut segments: Vec<String> = error
            .instance_path
            .to_string()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        let reason = match &error.kind {
            ValidationErrorKind::Required { property } => {
                segments.push(property.as_str().unwrap_or_default().to_string());
                "Required".to_string()
            }
            _ => error.to_string(),
        };
        FieldIssue::new(&segments.join("."), reason)
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

/// Every issue found while validating one argument bag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
pub struct ValidationErrors(pub Vec<FieldIssue>);

impl ValidationErrors {
    pub fn single(path: &str, reason: impl Into<String>) -> Self {
        Self(vec![FieldIssue::new(path, reason)])
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.0
    }

    pub fn paths(&self) -> Vec<&str> {
        self.0.iter().map(|issue| issue.path.as_str()).collect()
    }
}

fn object_schema(fields: &[Field]) -> (Map<String, Value>, Vec<&'static str>) {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        let mut schema = field.kind.to_json_schema();
        schema.insert("description".into(), json!(field.description));
        properties.insert(field.name.to_string(), Value::Object(schema));
        if field.required {
            required.push(field.name);
        }
    }
    (properties, required)
}
