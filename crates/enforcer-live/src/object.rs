//! Object operations on a [`Handle`].
//!
//! Property bounds and `required` are checked against every leaf schema
//! the polymorphism resolver selects for the object's current value.

use std::sync::Arc;

use enforcer_core::{EnforcerError, ErrorCode, Map, Value};
use enforcer_schema::{validate, Schema};

use crate::handle::Handle;
use crate::position::{child_schema, leaves, Key};

impl Handle {
    fn object_frame(&self) -> Result<(Arc<Schema>, Value), EnforcerError> {
        let frame = self.frame()?;
        match frame.value {
            Value::Object(_) => Ok((frame.schema, frame.value)),
            other => Err(self.unsupported("an object", &other)),
        }
    }

    fn check_property_count(&self, governing: &[Arc<Schema>], count: usize) -> Result<(), EnforcerError> {
        for leaf in governing {
            if let Some(max) = leaf.max_properties.filter(|max| count > *max) {
                return Err(self.reject(
                    ErrorCode::Length,
                    &self.pointer(),
                    format!("The object has more properties than the allowed maximum: {max}"),
                ));
            }
            if let Some(min) = leaf.min_properties.filter(|min| count < *min) {
                return Err(self.reject(
                    ErrorCode::Length,
                    &self.pointer(),
                    format!("The object has fewer properties than the allowed minimum: {min}"),
                ));
            }
        }
        Ok(())
    }

    fn commit_object<R>(&self, op: impl FnOnce(&mut Map) -> R) -> Result<R, EnforcerError> {
        self.commit(|target| match target {
            Value::Object(map) => Ok(op(map)),
            other => Err(self.unsupported("an object", other)),
        })
    }

    pub(crate) fn set_property(&self, name: String, value: Value) -> Result<(), EnforcerError> {
        let (schema, current) = self.object_frame()?;
        let sub = child_schema(&schema, self.definitions(), &current, &Key::Name(name.clone()));
        let value = self.context().admit(&sub, value)?;
        let path = format!("{}/{name}", self.pointer());
        self.reject_all(validate::validate_at(&sub, self.definitions(), &path, &value))?;

        let count = current.as_object().map_or(0, Map::len);
        if current.get(&name).is_none() {
            let governing = leaves(&schema, self.definitions(), &current);
            self.check_property_count(&governing, count + 1)?;
        }
        self.commit_object(|map| {
            map.insert(name, value);
        })
    }

    /// Delete a property; returns its value when it was present.
    pub fn remove(&self, name: &str) -> Result<Option<Value>, EnforcerError> {
        let (schema, current) = self.object_frame()?;
        if current.get(name).is_none() {
            return Ok(None);
        }
        let governing = leaves(&schema, self.definitions(), &current);
        if governing.iter().any(|leaf| leaf.required.iter().any(|r| r == name)) {
            return Err(self.reject(
                ErrorCode::Required,
                &format!("{}/{name}", self.pointer()),
                format!("Missing required property: {name}"),
            ));
        }
        let count = current.as_object().map_or(0, Map::len);
        self.check_property_count(&governing, count - 1)?;
        self.commit_object(|map| map.remove(name))
    }
}
