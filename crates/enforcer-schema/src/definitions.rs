//! # Definitions Table
//!
//! Named schemas used for discriminator variant lookup and `$ref` links.
//! Built once and shared immutably.

use std::collections::BTreeMap;
use std::sync::Arc;

use enforcer_core::{Constraints, SchemaError};
use serde_json::Value as Json;

use crate::schema::{prepare, Schema};

/// Name to prepared schema.
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    schemas: BTreeMap<String, Arc<Schema>>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare every entry of a raw `definitions` (or
    /// `components/schemas`) object.
    pub fn prepare(raw: &Json, constraints: &Constraints) -> Result<Self, SchemaError> {
        let entries = raw.as_object().ok_or_else(|| SchemaError::NotAnObject {
            path: "#/definitions".to_string(),
        })?;
        let mut schemas = BTreeMap::new();
        for (name, raw_schema) in entries {
            let schema = prepare(raw_schema, constraints).map_err(|e| relocate(e, name))?;
            schemas.insert(name.clone(), schema);
        }
        tracing::debug!(count = schemas.len(), "definitions prepared");
        Ok(Self { schemas })
    }

    /// Register a prepared schema under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, schema: Arc<Schema>) {
        self.schemas.insert(name.into(), schema);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Follow `$ref` links from `schema` to the schema they designate.
    ///
    /// Returns `None` when a link names a missing definition or the links
    /// form a cycle that never reaches a concrete schema.
    pub fn follow<'a>(&'a self, schema: &'a Arc<Schema>) -> Option<&'a Arc<Schema>> {
        let mut current = schema;
        let mut hops = 0;
        while let Some(name) = &current.reference {
            if hops > self.schemas.len() {
                return None;
            }
            current = self.schemas.get(name)?;
            hops += 1;
        }
        Some(current)
    }
}

fn relocate(error: SchemaError, name: &str) -> SchemaError {
    let rebase = |path: String| path.replacen('#', &format!("#/definitions/{name}"), 1);
    match error {
        SchemaError::NotAnObject { path } => SchemaError::NotAnObject { path: rebase(path) },
        SchemaError::InvalidKeyword {
            path,
            keyword,
            reason,
        } => SchemaError::InvalidKeyword {
            path: rebase(path),
            keyword,
            reason,
        },
        SchemaError::InvalidPattern { path, reason } => SchemaError::InvalidPattern {
            path: rebase(path),
            reason,
        },
    }
}
