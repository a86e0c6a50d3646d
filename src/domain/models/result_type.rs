//! Result shapes.
//!
//! A task declares what its result must look like with a [`ResultType`]:
//! no result at all, a structural [`Shape`] that raw values are validated
//! and coerced against, or a fixed set of [`Labels`] of which exactly one
//! is chosen. An optional [`ResultValidator`] runs after the shape check.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::errors::{DomainResult, TaskError, ValidationError};

const ROOT_PATH: &str = "result";

/// Arguments handed to a [`CustomShape`] constructor.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeArgs {
    /// The raw value was a mapping; its entries are constructor arguments.
    Keyword(Map<String, Value>),
    /// Any other raw value, passed as the single argument.
    Positional(Value),
}

type ConstructorFn = dyn Fn(ShapeArgs) -> Result<Value, String> + Send + Sync;

/// A named shape with no JSON schema, built from raw values by a constructor.
#[derive(Clone)]
pub struct CustomShape {
    name: String,
    constructor: Arc<ConstructorFn>,
}

impl CustomShape {
    pub fn new<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(ShapeArgs) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            constructor: Arc::new(constructor),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build an instance from a raw value. Mappings become keyword
    /// arguments, everything else a single positional argument.
    pub fn construct(&self, raw: &Value) -> Result<Value, ValidationError> {
        let args = match raw {
            Value::Object(map) => ShapeArgs::Keyword(map.clone()),
            other => ShapeArgs::Positional(other.clone()),
        };
        (self.constructor)(args).map_err(|reason| ValidationError::Construction {
            shape: self.name.clone(),
            reason,
        })
    }
}

impl fmt::Debug for CustomShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomShape").field("name", &self.name).finish()
    }
}

impl PartialEq for CustomShape {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A field of an [`ObjectShape`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    pub name: String,
    pub shape: Shape,
    pub required: bool,
    pub description: Option<String>,
}

/// A structured object with named fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    pub name: Option<String>,
    pub fields: Vec<FieldShape>,
    pub allow_extra: bool,
}

impl ObjectShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Add a required field.
    pub fn field(mut self, name: impl Into<String>, shape: Shape) -> Self {
        self.fields.push(FieldShape {
            name: name.into(),
            shape,
            required: true,
            description: None,
        });
        self
    }

    /// Add a field that may be omitted.
    pub fn optional_field(mut self, name: impl Into<String>, shape: Shape) -> Self {
        self.fields.push(FieldShape {
            name: name.into(),
            shape,
            required: false,
            description: None,
        });
        self
    }

    /// Attach a description to the most recently added field.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.description = Some(description.into());
        }
        self
    }

    /// Keep unknown fields instead of rejecting them.
    pub fn allow_extra(mut self) -> Self {
        self.allow_extra = true;
        self
    }
}

/// Structural description of a result value.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Any,
    String,
    Integer,
    Number,
    Boolean,
    Null,
    List(Box<Shape>),
    Map(Box<Shape>),
    Optional(Box<Shape>),
    Object(ObjectShape),
    Custom(CustomShape),
}

impl Shape {
    pub fn list(item: Self) -> Self {
        Self::List(Box::new(item))
    }

    pub fn map(value: Self) -> Self {
        Self::Map(Box::new(value))
    }

    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Short type descriptor, used in fingerprints and prompts.
    pub fn descriptor(&self) -> String {
        match self {
            Self::Any => "Any".to_string(),
            Self::String => "str".to_string(),
            Self::Integer => "int".to_string(),
            Self::Number => "float".to_string(),
            Self::Boolean => "bool".to_string(),
            Self::Null => "None".to_string(),
            Self::List(item) => format!("list[{}]", item.descriptor()),
            Self::Map(value) => format!("dict[str, {}]", value.descriptor()),
            Self::Optional(inner) => format!("Optional[{}]", inner.descriptor()),
            Self::Object(object) => match &object.name {
                Some(name) => name.clone(),
                None => {
                    let fields = object
                        .fields
                        .iter()
                        .map(|f| format!("{}: {}", f.name, f.shape.descriptor()))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("object{{{fields}}}")
                }
            },
            Self::Custom(custom) => custom.name.clone(),
        }
    }

    /// JSON schema for this shape, or `None` when any part of it is a
    /// [`CustomShape`].
    pub fn json_schema(&self) -> Option<Value> {
        let schema = match self {
            Self::Any => json!({}),
            Self::String => json!({ "type": "string" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::Number => json!({ "type": "number" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Null => json!({ "type": "null" }),
            Self::List(item) => json!({ "type": "array", "items": item.json_schema()? }),
            Self::Map(value) => {
                json!({ "type": "object", "additionalProperties": value.json_schema()? })
            }
            Self::Optional(inner) => json!({ "anyOf": [inner.json_schema()?, { "type": "null" }] }),
            Self::Object(object) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for field in &object.fields {
                    let mut field_schema = field.shape.json_schema()?;
                    if let (Some(description), Value::Object(map)) =
                        (&field.description, &mut field_schema)
                    {
                        map.insert("description".to_string(), json!(description));
                    }
                    properties.insert(field.name.clone(), field_schema);
                    if field.required {
                        required.push(json!(field.name));
                    }
                }
                let mut schema = json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                    "additionalProperties": object.allow_extra,
                });
                if let (Some(name), Value::Object(map)) = (&object.name, &mut schema) {
                    map.insert("title".to_string(), json!(name));
                }
                schema
            }
            Self::Custom(_) => return None,
        };
        Some(schema)
    }

    /// Validate and coerce a raw value against this shape.
    pub fn validate(&self, raw: &Value) -> Result<Value, ValidationError> {
        self.validate_at(raw, ROOT_PATH)
    }

    fn validate_at(&self, raw: &Value, path: &str) -> Result<Value, ValidationError> {
        match self {
            Self::Any => Ok(raw.clone()),
            Self::Null => match raw {
                Value::Null => Ok(Value::Null),
                other => Err(mismatch(path, "null", other)),
            },
            Self::String => match raw {
                Value::String(_) => Ok(raw.clone()),
                other => Err(mismatch(path, "a string", other)),
            },
            Self::Integer => coerce_integer(raw).ok_or_else(|| mismatch(path, "an integer", raw)),
            Self::Number => coerce_number(raw).ok_or_else(|| mismatch(path, "a number", raw)),
            Self::Boolean => coerce_boolean(raw).ok_or_else(|| mismatch(path, "a boolean", raw)),
            Self::List(item) => match raw {
                Value::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| item.validate_at(v, &format!("{path}[{i}]")))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                other => Err(mismatch(path, "a list", other)),
            },
            Self::Map(value_shape) => match raw {
                Value::Object(entries) => {
                    let mut out = Map::new();
                    for (key, v) in entries {
                        let validated = value_shape.validate_at(v, &format!("{path}.{key}"))?;
                        out.insert(key.clone(), validated);
                    }
                    Ok(Value::Object(out))
                }
                other => Err(mismatch(path, "a mapping", other)),
            },
            Self::Optional(inner) => match raw {
                Value::Null => Ok(Value::Null),
                other => inner.validate_at(other, path),
            },
            Self::Object(object) => validate_object(object, raw, path),
            Self::Custom(custom) => custom.construct(raw),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

impl FromStr for Shape {
    type Err = String;

    /// Parse a type descriptor such as `int`, `list[str]` or
    /// `optional[dict[float]]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let lower = s.to_lowercase();
        if let Some(inner) = strip_generic(&lower, &["list", "array"]) {
            return Ok(Self::list(inner.parse()?));
        }
        if let Some(inner) = strip_generic(&lower, &["dict", "map"]) {
            let value = inner.strip_prefix("str,").unwrap_or(inner);
            return Ok(Self::map(value.parse()?));
        }
        if let Some(inner) = strip_generic(&lower, &["optional"]) {
            return Ok(Self::optional(inner.parse()?));
        }
        match lower.as_str() {
            "any" => Ok(Self::Any),
            "str" | "string" | "text" => Ok(Self::String),
            "int" | "integer" => Ok(Self::Integer),
            "float" | "number" => Ok(Self::Number),
            "bool" | "boolean" => Ok(Self::Boolean),
            "null" => Ok(Self::Null),
            _ => Err(format!("Unknown result type: {s}")),
        }
    }
}

fn strip_generic<'a>(s: &'a str, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| {
        s.strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('['))
            .and_then(|rest| rest.strip_suffix(']'))
            .map(str::trim)
    })
}

fn validate_object(object: &ObjectShape, raw: &Value, path: &str) -> Result<Value, ValidationError> {
    let Value::Object(entries) = raw else {
        return Err(mismatch(path, "an object", raw));
    };

    let mut out = Map::new();
    for field in &object.fields {
        let field_path = format!("{path}.{}", field.name);
        match entries.get(&field.name) {
            Some(value) => {
                out.insert(field.name.clone(), field.shape.validate_at(value, &field_path)?);
            }
            None if field.required => {
                return Err(ValidationError::MissingField { path: field_path });
            }
            None => {}
        }
    }

    for (key, value) in entries {
        if object.fields.iter().any(|f| &f.name == key) {
            continue;
        }
        if !object.allow_extra {
            return Err(ValidationError::UnknownField {
                path: format!("{path}.{key}"),
            });
        }
        out.insert(key.clone(), value.clone());
    }

    Ok(Value::Object(out))
}

fn coerce_integer(raw: &Value) -> Option<Value> {
    match raw {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(raw.clone()),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .and_then(|f| integral_f64_to_value(f)),
        Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integral_f64_to_value(f: f64) -> Option<Value> {
    // i64::MAX as f64 rounds up, so the upper bound is exclusive.
    if f >= -9_223_372_036_854_775_808.0 && f < 9_223_372_036_854_775_808.0 {
        Some(Value::from(f as i64))
    } else {
        None
    }
}

fn coerce_number(raw: &Value) -> Option<Value> {
    let f = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite())?,
        _ => return None,
    };
    serde_json::Number::from_f64(f).map(Value::Number)
}

fn coerce_boolean(raw: &Value) -> Option<Value> {
    match raw {
        Value::Bool(_) => Some(raw.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(Value::Bool(false)),
            Some(1) => Some(Value::Bool(true)),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn mismatch(path: &str, expected: &str, found: &Value) -> ValidationError {
    ValidationError::Mismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        found: describe_value(found),
    }
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) if s.chars().count() > 40 => {
            format!("string {:?}...", s.chars().take(40).collect::<String>())
        }
        Value::String(s) => format!("string {s:?}"),
        Value::Array(items) => format!("list of {} item(s)", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

/// An ordered, non-empty set of admissible result values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct Labels(Vec<Value>);

impl Labels {
    pub fn new<I, V>(options: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let options: Vec<Value> = options.into_iter().map(Into::into).collect();
        if options.is_empty() {
            return Err(TaskError::EmptyLabels);
        }
        Ok(Self(options))
    }

    pub fn options(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.0.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }
}

impl TryFrom<Vec<Value>> for Labels {
    type Error = TaskError;

    fn try_from(options: Vec<Value>) -> Result<Self, Self::Error> {
        Self::new(options)
    }
}

impl From<Labels> for Vec<Value> {
    fn from(labels: Labels) -> Self {
        labels.0
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|option| match option {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "Labels: {rendered}")
    }
}

/// The declared shape of a task's result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultType {
    /// The task produces no result.
    None,
    /// The result is validated structurally against a shape.
    Value(Shape),
    /// The result is one of a fixed set of options.
    Labels(Labels),
}

impl Default for ResultType {
    fn default() -> Self {
        Self::Value(Shape::String)
    }
}

impl From<Shape> for ResultType {
    fn from(shape: Shape) -> Self {
        Self::Value(shape)
    }
}

impl From<Labels> for ResultType {
    fn from(labels: Labels) -> Self {
        Self::Labels(labels)
    }
}

impl ResultType {
    /// Shorthand for an enumerated result type.
    pub fn labels<I, V>(options: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Labels::new(options).map(Self::Labels)
    }

    pub fn descriptor(&self) -> String {
        match self {
            Self::None => "None".to_string(),
            Self::Value(shape) => shape.descriptor(),
            Self::Labels(labels) => labels.to_string(),
        }
    }

    /// Schema advertised to agents. A shape without a schema renders as
    /// a placeholder string.
    pub fn schema(&self) -> Option<Value> {
        match self {
            Self::None => None,
            Self::Value(shape) => Some(
                shape
                    .json_schema()
                    .unwrap_or_else(|| json!("<schema could not be generated>")),
            ),
            Self::Labels(labels) => Some(json!({ "enum": labels.options() })),
        }
    }

    /// Reconcile a raw candidate (`Value::Null` when absent) with this
    /// result type.
    pub fn validate(&self, raw: Value) -> Result<Value, ValidationError> {
        match self {
            Self::None if raw.is_null() => Ok(Value::Null),
            Self::None => Err(ValidationError::UnexpectedResult(raw)),
            Self::Labels(labels) if labels.contains(&raw) => Ok(raw),
            Self::Labels(labels) => Err(ValidationError::InvalidOption {
                value: raw,
                options: labels.options().to_vec(),
            }),
            Self::Value(shape) => shape.validate(&raw),
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

type ValidatorFn = dyn Fn(Value) -> Result<Value, String> + Send + Sync;

/// Custom post-validation applied after the shape check. The returned
/// value replaces the result; an error message is shown to the agent.
#[derive(Clone)]
pub struct ResultValidator(Arc<ValidatorFn>);

impl ResultValidator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, value: Value) -> Result<Value, ValidationError> {
        (self.0)(value).map_err(ValidationError::Rejected)
    }
}

impl fmt::Debug for ResultValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResultValidator(..)")
    }
}
