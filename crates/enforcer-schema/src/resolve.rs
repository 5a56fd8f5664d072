//! # Polymorphism Resolver
//!
//! Expands `allOf` chains, discriminator variant selection, and `$ref`
//! links into the flat list of leaf schemas whose constraints jointly
//! apply to a value.
//!
//! ## Algorithm
//!
//! Depth-first from the root schema with a visited set keyed by schema
//! identity (`Arc` pointer), so cyclic `allOf`/discriminator graphs
//! terminate and every leaf appears once.
//!
//! - `allOf`: each member is visited; the schema itself contributes
//!   nothing beyond its members.
//! - discriminator without `allOf`: the schema is a leaf (its own
//!   properties and bounds apply), and the variant named by
//!   `value[propertyName]` is looked up in the explicit mapping first,
//!   then in the definitions table, and visited.
//! - otherwise the schema is a leaf.

use std::collections::HashSet;
use std::sync::Arc;

use enforcer_core::{ErrorCode, ValidationError, Value};
use thiserror::Error;

use crate::definitions::Definitions;
use crate::schema::Schema;

/// A discriminator or link that could not be resolved.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HierarchyNotFound {
    #[error("discriminator property {property:?} is missing from the value")]
    MissingProperty { property: String },

    #[error("discriminator {property:?} value {variant:?} does not name a known schema")]
    UnknownVariant { property: String, variant: String },

    #[error("reference {name:?} does not name a known schema")]
    UnknownReference { name: String },
}

impl HierarchyNotFound {
    /// Report as an `HTNC` validation error at `path`.
    pub fn at(&self, path: &str) -> ValidationError {
        ValidationError::new(ErrorCode::Hierarchy, path, self.to_string())
    }
}

/// Leaf schemas plus whatever could not be resolved along the way.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub schemas: Vec<Arc<Schema>>,
    pub unresolved: Vec<HierarchyNotFound>,
}

/// Resolve the leaf schemas governing `value`, failing on the first
/// unresolvable hierarchy.
pub fn resolve(
    schema: &Arc<Schema>,
    definitions: &Definitions,
    value: &Value,
) -> Result<Vec<Arc<Schema>>, HierarchyNotFound> {
    let resolution = resolve_partial(schema, definitions, value);
    match resolution.unresolved.into_iter().next() {
        Some(missing) => Err(missing),
        None => Ok(resolution.schemas),
    }
}

/// Resolve as much as possible, collecting unresolvable hierarchies.
pub fn resolve_partial(schema: &Arc<Schema>, definitions: &Definitions, value: &Value) -> Resolution {
    let mut walk = Walk {
        definitions,
        value,
        visited: HashSet::new(),
        out: Resolution::default(),
    };
    walk.visit(schema);
    for missing in &walk.out.unresolved {
        tracing::debug!(error = %missing, "schema hierarchy not found");
    }
    walk.out
}

struct Walk<'a> {
    definitions: &'a Definitions,
    value: &'a Value,
    visited: HashSet<*const Schema>,
    out: Resolution,
}

impl Walk<'_> {
    fn visit(&mut self, schema: &Arc<Schema>) {
        let Some(schema) = self.definitions.follow(schema).cloned() else {
            self.out.unresolved.push(HierarchyNotFound::UnknownReference {
                name: schema.reference.clone().unwrap_or_default(),
            });
            return;
        };
        if !self.visited.insert(Arc::as_ptr(&schema)) {
            return;
        }

        if !schema.all_of.is_empty() {
            for member in &schema.all_of {
                self.visit(member);
            }
            return;
        }

        self.out.schemas.push(Arc::clone(&schema));

        if let Some(discriminator) = &schema.discriminator {
            let property = &discriminator.property_name;
            let Some(found) = self.value.get(property) else {
                self.out.unresolved.push(HierarchyNotFound::MissingProperty {
                    property: property.clone(),
                });
                return;
            };
            let variant = found.to_string();
            let target = discriminator
                .mapping
                .get(&variant)
                .and_then(|name| self.definitions.get(name))
                .or_else(|| self.definitions.get(&variant))
                .cloned();
            match target {
                Some(target) => self.visit(&target),
                None => self.out.unresolved.push(HierarchyNotFound::UnknownVariant {
                    property: property.clone(),
                    variant,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enforcer_core::Constraints;
    use serde_json::json;

    fn pets() -> Definitions {
        Definitions::prepare(
            &json!({
                "Pet": {
                    "type": "object",
                    "discriminator": "petType",
                    "required": ["petType"],
                    "properties": {"petType": {"type": "string"}}
                },
                "Dog": {
                    "allOf": [
                        {"$ref": "#/definitions/Pet"},
                        {"properties": {"packSize": {"type": "integer"}}}
                    ]
                },
                "Cat": {
                    "allOf": [
                        {"$ref": "#/definitions/Pet"},
                        {"properties": {"huntingSkill": {"type": "string"}}}
                    ]
                }
            }),
            &Constraints::all(),
        )
        .unwrap()
    }

    #[test]
    fn test_plain_schema_is_its_own_leaf() {
        let defs = Definitions::new();
        let schema = Arc::new(Schema::any());
        let leaves = resolve(&schema, &defs, &Value::Null).unwrap();
        assert_eq!(leaves.len(), 1);
        assert!(Arc::ptr_eq(&leaves[0], &schema));
    }

    #[test]
    fn test_discriminator_selects_variant() {
        let defs = pets();
        let pet = defs.get("Pet").unwrap().clone();
        let value = Value::from(json!({"petType": "Dog", "packSize": 3}));
        let leaves = resolve(&pet, &defs, &value).unwrap();
        // Pet itself, then Dog's own member; Pet is not repeated.
        assert_eq!(leaves.len(), 2);
        assert!(Arc::ptr_eq(&leaves[0], &pet));
        assert!(leaves[1].properties.contains_key("packSize"));
    }

    #[test]
    fn test_all_of_through_links() {
        let defs = pets();
        let cat = defs.get("Cat").unwrap().clone();
        let value = Value::from(json!({"petType": "Cat"}));
        let leaves = resolve(&cat, &defs, &value).unwrap();
        assert_eq!(leaves.len(), 2);
        assert!(leaves.iter().any(|s| s.properties.contains_key("huntingSkill")));
    }

    #[test]
    fn test_missing_discriminator_property() {
        let defs = pets();
        let pet = defs.get("Pet").unwrap().clone();
        let err = resolve(&pet, &defs, &Value::object()).unwrap_err();
        assert!(matches!(err, HierarchyNotFound::MissingProperty { .. }));
        assert_eq!(err.at("").code, ErrorCode::Hierarchy);
    }

    #[test]
    fn test_unknown_variant() {
        let defs = pets();
        let pet = defs.get("Pet").unwrap().clone();
        let value = Value::from(json!({"petType": "Lizard"}));
        let partial = resolve_partial(&pet, &defs, &value);
        assert_eq!(partial.schemas.len(), 1);
        assert!(matches!(
            partial.unresolved[0],
            HierarchyNotFound::UnknownVariant { ref variant, .. } if variant == "Lizard"
        ));
    }

    #[test]
    fn test_explicit_mapping_wins() {
        let defs = Definitions::prepare(
            &json!({
                "Base": {"discriminator": {"propertyName": "k", "mapping": {"a": "#/definitions/Alpha"}}},
                "Alpha": {"properties": {"alpha": {}}},
                "a": {"properties": {"wrong": {}}}
            }),
            &Constraints::all(),
        )
        .unwrap();
        let base = defs.get("Base").unwrap().clone();
        let leaves = resolve(&base, &defs, &Value::from(json!({"k": "a"}))).unwrap();
        assert!(leaves[1].properties.contains_key("alpha"));
    }

    #[test]
    fn test_cyclic_all_of_terminates_without_duplicates() {
        let defs = Definitions::prepare(
            &json!({
                "A": {"allOf": [{"$ref": "B"}, {"properties": {"a": {}}}]},
                "B": {"allOf": [{"$ref": "A"}, {"properties": {"b": {}}}]}
            }),
            &Constraints::all(),
        )
        .unwrap();
        let a = defs.get("A").unwrap().clone();
        let leaves = resolve(&a, &defs, &Value::object()).unwrap();
        assert_eq!(leaves.len(), 2);
    }
}
