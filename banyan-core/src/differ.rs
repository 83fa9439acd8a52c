//! Differ - Compare desired attributes with refreshed state
//!
//! Decides whether a resource needs creating, updating in place, replacing
//! (a force-new attribute changed), or nothing at all.

use std::collections::HashMap;

use crate::resource::{ResourceData, Value};
use crate::schema::{AttributeSchema, ResourceSchema};

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create,
    /// Resource exists with differences -> update in place
    Update { changed_attributes: Vec<String> },
    /// A force-new attribute changed -> destroy then create
    Replace {
        changed_attributes: Vec<String>,
        forced_by: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange,
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange)
    }
}

/// Compare desired attributes against the current (refreshed) bag
///
/// Attributes the user did not set and that the schema marks computed are
/// ignored, so server-filled values never show up as drift.
pub fn diff(
    schema: &ResourceSchema,
    desired: &HashMap<String, Value>,
    current: Option<&ResourceData>,
) -> Diff {
    let Some(current) = current.filter(|c| c.id().is_some()) else {
        return Diff::Create;
    };

    let changed = find_changed_attributes(schema, desired, current.attributes());
    if changed.is_empty() {
        return Diff::NoChange;
    }

    let forced_by: Vec<String> = changed
        .iter()
        .filter(|name| schema.get(name).is_some_and(|a| a.force_new))
        .cloned()
        .collect();

    if forced_by.is_empty() {
        Diff::Update {
            changed_attributes: changed,
        }
    } else {
        Diff::Replace {
            changed_attributes: changed,
            forced_by,
        }
    }
}

/// Find changed attributes between desired and current state
fn find_changed_attributes(
    schema: &ResourceSchema,
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (name, attr) in &schema.attributes {
        let wanted = desired.get(name).or(attr.default.as_ref());
        let Some(wanted) = wanted else {
            // Nothing declared: computed values are the server's business, and
            // an optional attribute left out only drifts if the server holds
            // something non-empty for it.
            if !attr.computed && current.get(name).is_some_and(|v| !v.is_empty()) {
                changed.push(name.clone());
            }
            continue;
        };

        if !values_equal(attr, Some(wanted), current.get(name)) {
            changed.push(name.clone());
        }
    }

    changed.sort();
    changed
}

fn values_equal(attr: &AttributeSchema, a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(v), None) | (None, Some(v)) => v.is_empty(),
        (Some(a), Some(b)) if attr.is_set() => set_equal(a, b),
        (Some(a), Some(b)) => {
            a == b || (a.is_empty() && b.is_empty()) || without_empty(a) == without_empty(b)
        }
    }
}

/// Nested blocks compare without their empty members
fn without_empty(value: &Value) -> Value {
    match value {
        Value::Map(map) => Value::Map(
            map.iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), without_empty(v)))
                .collect(),
        ),
        Value::List(items) => Value::List(items.iter().map(without_empty).collect()),
        other => other.clone(),
    }
}

fn set_equal(a: &Value, b: &Value) -> bool {
    let (a, b) = (a.as_list(), b.as_list());
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
}
