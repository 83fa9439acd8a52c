//! Schema - Attribute descriptors for resources and data sources
//!
//! Every adapter publishes a [`ResourceSchema`]. The host uses it to validate
//! user input, substitute defaults, decide between update and replace, and
//! redact sensitive values.

use std::collections::HashMap;
use std::fmt;

use crate::resource::{ResourceData, Value};

/// Warnings and errors produced by a validator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Diagnostics {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            warnings: Vec::new(),
            errors: vec![message.into()],
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            warnings: vec![message.into()],
            errors: Vec::new(),
        }
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Validator signature; must be pure and total over its input
pub type ValidateFn = fn(&Value) -> Diagnostics;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: ValidateFn,
    },
    /// Ordered list
    List(Box<AttributeType>),
    /// Unordered set; equality ignores order
    Set(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
    /// Nested block, carried as a list of maps
    Block(HashMap<String, AttributeSchema>),
}

impl AttributeType {
    pub fn list(inner: AttributeType) -> Self {
        AttributeType::List(Box::new(inner))
    }

    pub fn set(inner: AttributeType) -> Self {
        AttributeType::Set(Box::new(inner))
    }

    pub fn string_set() -> Self {
        AttributeType::Set(Box::new(AttributeType::String))
    }

    pub fn string_map() -> Self {
        AttributeType::Map(Box::new(AttributeType::String))
    }

    pub fn enumeration(variants: &[&str]) -> Self {
        AttributeType::Enum(variants.iter().map(|v| v.to_string()).collect())
    }

    pub fn block(attributes: Vec<AttributeSchema>) -> Self {
        AttributeType::Block(
            attributes
                .into_iter()
                .map(|a| (a.name.clone(), a))
                .collect(),
        )
    }

    pub fn is_set(&self) -> bool {
        match self {
            AttributeType::Set(_) => true,
            AttributeType::Custom { base, .. } => base.is_set(),
            _ => false,
        }
    }

    /// Check if a value conforms to this type
    ///
    /// Validator warnings are appended to `warnings`; the first hard failure
    /// is returned as an error.
    pub fn validate(&self, value: &Value, warnings: &mut Vec<String>) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { base, validate, .. }, v) => {
                base.validate(v, warnings)?;
                let diags = validate(v);
                warnings.extend(diags.warnings);
                match diags.errors.into_iter().next() {
                    Some(message) => Err(TypeError::ValidationFailed { message }),
                    None => Ok(()),
                }
            }

            (AttributeType::List(inner) | AttributeType::Set(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner
                        .validate(item, warnings)
                        .map_err(|e| TypeError::ListItemError {
                            index: i,
                            inner: Box::new(e),
                        })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner
                        .validate(v, warnings)
                        .map_err(|e| TypeError::MapValueError {
                            key: k.clone(),
                            inner: Box::new(e),
                        })?;
                }
                Ok(())
            }

            (AttributeType::Block(attributes), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let Value::Map(map) = item else {
                        return Err(TypeError::ListItemError {
                            index: i,
                            inner: Box::new(TypeError::TypeMismatch {
                                expected: "Block".to_string(),
                                got: item.type_name(),
                            }),
                        });
                    };
                    validate_attributes(attributes, map, warnings).map_err(|mut errors| {
                        TypeError::ListItemError {
                            index: i,
                            inner: Box::new(errors.remove(0)),
                        }
                    })?;
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Set(inner) => format!("Set<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedOnly { name: String },

    #[error("\"{name}\": conflicts with {other}")]
    Conflict { name: String, other: String },

    #[error("Attribute '{name}' allows at most {max} item(s), got {got}")]
    TooManyItems { name: String, max: usize, got: usize },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Server-assigned; users may not set it unless also optional
    pub computed: bool,
    /// Computed attributes that users may also set
    pub optional: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// Any change forces destroy-then-create
    pub force_new: bool,
    /// Redacted in plan output
    pub sensitive: bool,
    /// Sibling attributes that must be empty when this one is set
    pub conflicts_with: Vec<String>,
    pub deprecated: Option<String>,
    /// Upper bound on list/set/block length
    pub max_items: Option<usize>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            optional: false,
            default: None,
            description: None,
            force_new: false,
            sensitive: false,
            conflicts_with: Vec::new(),
            deprecated: None,
            max_items: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Optional and computed: the server fills it when the user leaves it out
    pub fn optional_computed(mut self) -> Self {
        self.computed = true;
        self.optional = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn conflicts_with(mut self, others: &[&str]) -> Self {
        self.conflicts_with = others.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn deprecated(mut self, notice: impl Into<String>) -> Self {
        self.deprecated = Some(notice.into());
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Set-typed attributes compare without regard to order
    pub fn is_set(&self) -> bool {
        self.attr_type.is_set()
    }

    pub fn user_settable(&self) -> bool {
        !self.computed || self.optional
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.get(name)
    }

    /// Names of attributes whose change forces replacement
    pub fn force_new_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .attributes
            .values()
            .filter(|a| a.force_new)
            .map(|a| a.name.as_str())
            .collect();
        names.sort();
        names
    }

    /// Substitute scalar defaults for attributes the user left out
    pub fn apply_defaults(&self, data: &mut ResourceData) {
        for (name, schema) in &self.attributes {
            if let Some(default) = &schema.default
                && data.get(name).is_none()
            {
                data.set(name.clone(), default.clone());
            }
        }
    }

    /// Validate resource attributes
    ///
    /// Returns the collected warnings (deprecations, validator warnings) on
    /// success, or every error found.
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<Vec<String>, Vec<TypeError>> {
        let mut warnings = Vec::new();
        validate_attributes(&self.attributes, attributes, &mut warnings).map(|()| warnings)
    }
}

fn validate_attributes(
    schemas: &HashMap<String, AttributeSchema>,
    attributes: &HashMap<String, Value>,
    warnings: &mut Vec<String>,
) -> Result<(), Vec<TypeError>> {
    let mut errors = Vec::new();

    let mut names: Vec<&String> = schemas.keys().collect();
    names.sort();
    for name in names {
        let schema = &schemas[name];
        if schema.required && !attributes.contains_key(name) && schema.default.is_none() {
            errors.push(TypeError::MissingRequired { name: name.clone() });
        }
    }

    let mut keys: Vec<&String> = attributes.keys().collect();
    keys.sort();
    for name in keys {
        let value = &attributes[name];
        // host-only keys pass through
        let Some(schema) = schemas.get(name) else {
            continue;
        };

        if !schema.user_settable() && !value.is_empty() {
            errors.push(TypeError::ComputedOnly { name: name.clone() });
            continue;
        }

        if let Err(e) = schema.attr_type.validate(value, warnings) {
            errors.push(e);
        }

        if let (Some(max), Value::List(items)) = (schema.max_items, value)
            && items.len() > max
        {
            errors.push(TypeError::TooManyItems {
                name: name.clone(),
                max,
                got: items.len(),
            });
        }

        if value.is_empty() {
            continue;
        }

        if let Some(notice) = &schema.deprecated {
            warnings.push(format!("\"{}\": [DEPRECATED] {}", name, notice));
        }

        for other in &schema.conflicts_with {
            if attributes.get(other).is_some_and(|v| !v.is_empty()) {
                errors.push(TypeError::Conflict {
                    name: name.clone(),
                    other: other.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
