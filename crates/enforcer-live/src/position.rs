//! Positions inside an enforced value and the schemas governing them.

use std::fmt;
use std::sync::Arc;

use enforcer_core::Value;
use enforcer_schema::{resolve_partial, Definitions, Schema};

/// One step from a container to a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{i}"),
            Key::Name(name) => f.write_str(name),
        }
    }
}

/// Slash-delimited pointer for a key path; the root is `""`.
pub(crate) fn pointer(path: &[Key]) -> String {
    path.iter().map(|key| format!("/{key}")).collect()
}

pub(crate) fn member<'v>(container: &'v Value, key: &Key) -> Option<&'v Value> {
    match (container, key) {
        (Value::Array(items), Key::Index(i)) => items.get(*i),
        (Value::Object(map), Key::Name(name)) => map.get(name),
        _ => None,
    }
}

pub(crate) fn member_mut<'v>(container: &'v mut Value, key: &Key) -> Option<&'v mut Value> {
    match (container, key) {
        (Value::Array(items), Key::Index(i)) => items.get_mut(*i),
        (Value::Object(map), Key::Name(name)) => map.get_mut(name),
        _ => None,
    }
}

pub(crate) fn locate<'v>(root: &'v Value, path: &[Key]) -> Option<&'v Value> {
    path.iter().try_fold(root, member)
}

pub(crate) fn locate_mut<'v>(root: &'v mut Value, path: &[Key]) -> Option<&'v mut Value> {
    path.iter().try_fold(root, member_mut)
}

pub(crate) fn unconstrained() -> Arc<Schema> {
    Arc::new(Schema::any())
}

/// Leaf schemas jointly governing `value`.
pub(crate) fn leaves(schema: &Arc<Schema>, definitions: &Definitions, value: &Value) -> Vec<Arc<Schema>> {
    resolve_partial(schema, definitions, value).schemas
}

/// Schema governing the member `key` of `container`, which `schema` governs.
pub(crate) fn child_schema(
    schema: &Arc<Schema>,
    definitions: &Definitions,
    container: &Value,
    key: &Key,
) -> Arc<Schema> {
    let Some(schema) = definitions.follow(schema) else {
        return unconstrained();
    };
    match key {
        Key::Index(_) => schema.items.clone().unwrap_or_else(unconstrained),
        Key::Name(name) => {
            let leaves = leaves(schema, definitions, container);
            leaves
                .iter()
                .find_map(|leaf| leaf.properties.get(name))
                .or_else(|| leaves.iter().find_map(|leaf| leaf.additional_schema()))
                .cloned()
                .unwrap_or_else(unconstrained)
        }
    }
}

/// Schema governing the position `path` below `root`, or `None` when the
/// position does not exist.
pub(crate) fn schema_at(
    root_schema: &Arc<Schema>,
    definitions: &Definitions,
    root: &Value,
    path: &[Key],
) -> Option<Arc<Schema>> {
    let mut schema = Arc::clone(root_schema);
    let mut current = root;
    for key in path {
        schema = child_schema(&schema, definitions, current, key);
        current = member(current, key)?;
    }
    Some(schema)
}
