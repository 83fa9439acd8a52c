//! Resource - Attribute values and the attribute bag exchanged with the host
//!
//! The host framework hands every lifecycle call a [`ResourceData`] bag and
//! reads it back afterwards. Adapters use the typed accessors here instead of
//! poking at raw [`Value`]s.

use std::collections::HashMap;

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    /// Ordered sequence, also used for sets and nested blocks
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> &[Value] {
        match self {
            Value::List(items) => items,
            _ => &[],
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns true for "", [] and {}
    pub fn is_empty(&self) -> bool {
        match self {
            Value::String(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            Value::Int(_) | Value::Bool(_) => false,
        }
    }

    /// Set of strings as a sorted, de-duplicated sequence
    pub fn as_string_set(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .as_list()
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Set of integers as a sorted, de-duplicated sequence
    pub fn as_int_set(&self) -> Vec<i64> {
        let mut out: Vec<i64> = self.as_list().iter().filter_map(Value::as_int).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Ordered sequence of strings, preserving order and duplicates
    pub fn as_string_list(&self) -> Vec<String> {
        self.as_list()
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Map of opaque values with every value stringified
    pub fn as_string_map(&self) -> HashMap<String, String> {
        self.as_map()
            .map(|map| {
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_plain_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sequence of opaque maps, each stringified
    pub fn as_string_map_list(&self) -> Vec<HashMap<String, String>> {
        self.as_list().iter().map(Value::as_string_map).collect()
    }

    /// Render a scalar the way the wire expects it ("true", "8443", ...)
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::to_plain_string)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) => String::new(),
        }
    }

    /// Build a set value from strings; stored sorted so equality is order-insensitive
    pub fn string_set<I, S>(items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: Vec<String> = items.into_iter().map(Into::into).collect();
        items.sort();
        items.dedup();
        Value::List(items.into_iter().map(Value::String).collect())
    }

    /// Build an ordered list value from strings
    pub fn string_list<I, S>(items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::String(s.into())).collect())
    }

    /// Build a single-element nested block
    pub fn block(attributes: HashMap<String, Value>) -> Value {
        Value::List(vec![Value::Map(attributes)])
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

/// Attribute bag for one resource instance
///
/// Holds the identifier the host keys its state on plus the attribute map.
/// An empty identifier after a lifecycle call tells the host to drop the
/// resource from state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    attributes: HashMap<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            attributes: HashMap::new(),
        }
    }

    pub fn from_attributes(attributes: HashMap<String, Value>) -> Self {
        Self {
            id: None,
            attributes,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.id = if id.is_empty() { None } else { Some(id) };
    }

    /// Drop the identifier; the host removes the resource from state
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut HashMap<String, Value> {
        &mut self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// String attribute; absent reads as ""
    pub fn get_string(&self, key: &str) -> String {
        self.get_str(key).unwrap_or_default().to_string()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.attributes.get(key).and_then(Value::as_int)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(Value::as_bool)
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    pub fn get_string_set(&self, key: &str) -> Vec<String> {
        self.attributes
            .get(key)
            .map(Value::as_string_set)
            .unwrap_or_default()
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.attributes
            .get(key)
            .map(Value::as_string_list)
            .unwrap_or_default()
    }

    pub fn get_int_set(&self, key: &str) -> Vec<i64> {
        self.attributes
            .get(key)
            .map(Value::as_int_set)
            .unwrap_or_default()
    }

    pub fn get_string_map(&self, key: &str) -> HashMap<String, String> {
        self.attributes
            .get(key)
            .map(Value::as_string_map)
            .unwrap_or_default()
    }

    /// All elements of a nested block list
    pub fn get_blocks(&self, key: &str) -> Vec<&HashMap<String, Value>> {
        blocks(self.attributes.get(key))
    }

    /// First element of a nested block list (blocks capped at one item)
    pub fn get_block(&self, key: &str) -> Option<&HashMap<String, Value>> {
        self.get_blocks(key).into_iter().next()
    }
}

/// Elements of a nested block value; a bare map counts as a single block
pub fn blocks(value: Option<&Value>) -> Vec<&HashMap<String, Value>> {
    match value {
        Some(Value::List(items)) => items.iter().filter_map(Value::as_map).collect(),
        Some(Value::Map(map)) => vec![map],
        _ => Vec::new(),
    }
}

/// Typed reads from a nested block's attribute map
pub trait BlockExt {
    fn string(&self, key: &str) -> String;
    fn int(&self, key: &str) -> Option<i64>;
    fn boolean(&self, key: &str) -> Option<bool>;
    fn string_set(&self, key: &str) -> Vec<String>;
    fn int_set(&self, key: &str) -> Vec<i64>;
    fn nested(&self, key: &str) -> Vec<&HashMap<String, Value>>;
}

impl BlockExt for HashMap<String, Value> {
    fn string(&self, key: &str) -> String {
        self.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    fn boolean(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    fn string_set(&self, key: &str) -> Vec<String> {
        self.get(key).map(Value::as_string_set).unwrap_or_default()
    }

    fn int_set(&self, key: &str) -> Vec<i64> {
        self.get(key).map(Value::as_int_set).unwrap_or_default()
    }

    fn nested(&self, key: &str) -> Vec<&HashMap<String, Value>> {
        blocks(self.get(key))
    }
}
