//! The enforcement [`Handle`]: a position inside a shared, always-valid
//! root value.
//!
//! Every handle created from one `enforce` call shares the same root. A
//! handle stores only its key path, so the schema that governs it is
//! recomputed from the current root on every operation; replacing a
//! discriminator value therefore changes the rules for every handle below
//! it immediately.
//!
//! Mutations follow one protocol: prepare the incoming values (population,
//! then auto-format), run the cheap pre-checks that name the precise
//! failure, apply the change to a copy of the root, validate the whole
//! copy, and only then swap it in. A rejected mutation leaves the root
//! untouched.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use enforcer_core::{EnforcerConfig, EnforcerError, ErrorCode, Params, ValidationError, Value};
use enforcer_schema::{validate, Definitions, Schema};

use crate::incoming::Context;
use crate::position::{locate, locate_mut, member, pointer, schema_at, unconstrained, Key};

pub(crate) struct Shared {
    schema: Arc<Schema>,
    definitions: Arc<Definitions>,
    config: EnforcerConfig,
    params: Params,
    value: RefCell<Value>,
}

/// Snapshot of a handle's position: the governing schema (links
/// followed) and a copy of the value there.
pub(crate) struct Frame {
    pub schema: Arc<Schema>,
    pub value: Value,
}

/// A live view of an array, object, or scalar inside an enforced value.
///
/// Cloning a handle yields another view of the same position.
#[derive(Clone)]
pub struct Handle {
    shared: Rc<Shared>,
    path: Vec<Key>,
}

/// A member read through a handle: nested containers come back as handles,
/// scalars as values.
#[derive(Debug, Clone)]
pub enum Entry {
    Handle(Handle),
    Value(Value),
}

impl Entry {
    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Entry::Handle(handle) => Some(handle),
            Entry::Value(_) => None,
        }
    }

    /// The member's current value.
    pub fn to_value(&self) -> Result<Value, EnforcerError> {
        match self {
            Entry::Handle(handle) => handle.value(),
            Entry::Value(value) => Ok(value.clone()),
        }
    }
}

impl Handle {
    /// Validate `value` and wrap it as a new root.
    pub(crate) fn seal(
        schema: Arc<Schema>,
        definitions: Arc<Definitions>,
        config: EnforcerConfig,
        params: Params,
        value: Value,
    ) -> Result<Self, EnforcerError> {
        validate::assert(&schema, &definitions, &value)?;
        tracing::trace!(kind = value.type_name(), "value enforced");
        Ok(Self {
            shared: Rc::new(Shared {
                schema,
                definitions,
                config,
                params,
                value: RefCell::new(value),
            }),
            path: Vec::new(),
        })
    }

    /// A new, independent root governed by `schema` and sharing this
    /// handle's definitions, configuration, and parameters.
    pub(crate) fn derive_root(&self, schema: Arc<Schema>, value: Value) -> Result<Handle, EnforcerError> {
        Handle::seal(
            schema,
            Arc::clone(&self.shared.definitions),
            self.shared.config.clone(),
            self.shared.params.clone(),
            value,
        )
    }

    pub(crate) fn context(&self) -> Context<'_> {
        Context {
            definitions: &self.shared.definitions,
            config: &self.shared.config,
            params: &self.shared.params,
        }
    }

    pub(crate) fn definitions(&self) -> &Definitions {
        &self.shared.definitions
    }

    /// Slash-delimited position of this handle within its root.
    pub fn pointer(&self) -> String {
        pointer(&self.path)
    }

    pub fn config(&self) -> &EnforcerConfig {
        &self.shared.config
    }

    pub(crate) fn detached(&self) -> EnforcerError {
        EnforcerError::Detached { path: self.pointer() }
    }

    pub(crate) fn unsupported(&self, expected: &str, found: &Value) -> EnforcerError {
        EnforcerError::Unsupported(format!(
            "value at {:?} is {}, not {expected}",
            self.pointer(),
            found.type_name()
        ))
    }

    /// Record and build a rejection at `path`.
    pub(crate) fn reject(&self, code: ErrorCode, path: &str, message: String) -> EnforcerError {
        tracing::debug!(path, %code, "mutation rejected");
        ValidationError::new(code, path, message).into()
    }

    /// Turn collected failures of a prepared incoming value into a rejection.
    pub(crate) fn reject_all(&self, errors: Vec<ValidationError>) -> Result<(), EnforcerError> {
        match ValidationError::aggregate(errors) {
            Some(error) => {
                tracing::debug!(path = %error.path, code = %error.code, "mutation rejected");
                Err(error.into())
            }
            None => Ok(()),
        }
    }

    pub(crate) fn frame(&self) -> Result<Frame, EnforcerError> {
        let root = self.shared.value.borrow();
        let schema = schema_at(&self.shared.schema, &self.shared.definitions, &root, &self.path)
            .ok_or_else(|| self.detached())?;
        let value = locate(&root, &self.path).cloned().ok_or_else(|| self.detached())?;
        let schema = self
            .shared
            .definitions
            .follow(&schema)
            .cloned()
            .unwrap_or_else(unconstrained);
        Ok(Frame { schema, value })
    }

    /// Apply `op` to a copy of the value at this position, validate the
    /// whole root, then commit.
    pub(crate) fn commit<R>(
        &self,
        op: impl FnOnce(&mut Value) -> Result<R, EnforcerError>,
    ) -> Result<R, EnforcerError> {
        let mut tentative = self.shared.value.borrow().clone();
        let target = locate_mut(&mut tentative, &self.path).ok_or_else(|| self.detached())?;
        let out = op(target)?;
        if let Err(error) = validate::assert(&self.shared.schema, &self.shared.definitions, &tentative) {
            tracing::debug!(path = %error.path, code = %error.code, "mutation rejected by root schema");
            return Err(error.into());
        }
        *self.shared.value.borrow_mut() = tentative;
        tracing::trace!(path = %self.pointer(), "mutation committed");
        Ok(out)
    }

    fn descend(&self, key: Key) -> Handle {
        let mut path = self.path.clone();
        path.push(key);
        Handle {
            shared: Rc::clone(&self.shared),
            path,
        }
    }

    /// Snapshot of the current value at this position.
    pub fn value(&self) -> Result<Value, EnforcerError> {
        let root = self.shared.value.borrow();
        locate(&root, &self.path).cloned().ok_or_else(|| self.detached())
    }

    /// Number of items (arrays) or properties (objects).
    pub fn len(&self) -> Result<usize, EnforcerError> {
        match self.value()? {
            Value::Array(items) => Ok(items.len()),
            Value::Object(map) => Ok(map.len()),
            other => Err(self.unsupported("a container", &other)),
        }
    }

    pub fn is_empty(&self) -> Result<bool, EnforcerError> {
        Ok(self.len()? == 0)
    }

    /// Property names of an object, in map order.
    pub fn keys(&self) -> Result<Vec<String>, EnforcerError> {
        match self.value()? {
            Value::Object(map) => Ok(map.into_keys().collect()),
            other => Err(self.unsupported("an object", &other)),
        }
    }

    /// Read a member. Nested arrays and objects come back as handles.
    pub fn get(&self, key: impl Into<Key>) -> Result<Option<Entry>, EnforcerError> {
        let key = key.into();
        let root = self.shared.value.borrow();
        let here = locate(&root, &self.path).ok_or_else(|| self.detached())?;
        Ok(member(here, &key).map(|found| {
            if found.is_container() {
                Entry::Handle(self.descend(key.clone()))
            } else {
                Entry::Value(found.clone())
            }
        }))
    }

    /// Handle for a nested array or object.
    pub fn child(&self, key: impl Into<Key>) -> Result<Handle, EnforcerError> {
        let key = key.into();
        match self.get(key.clone())? {
            Some(Entry::Handle(handle)) => Ok(handle),
            Some(Entry::Value(found)) => Err(self.descend(key).unsupported("a container", &found)),
            None => Err(self.descend(key).detached()),
        }
    }

    /// Assign a member: an array index or an object property.
    pub fn set(&self, key: impl Into<Key>, value: Value) -> Result<&Self, EnforcerError> {
        match key.into() {
            Key::Index(index) => self.set_index(index, value)?,
            Key::Name(name) => self.set_property(name, value)?,
        }
        Ok(self)
    }

    /// Replace the whole value at this position.
    pub fn replace(&self, value: Value) -> Result<&Self, EnforcerError> {
        let frame = self.frame()?;
        let value = self.context().admit(&frame.schema, value)?;
        self.reject_all(validate::validate_at(&frame.schema, self.definitions(), &self.pointer(), &value))?;
        self.commit(|target| {
            *target = value;
            Ok(())
        })?;
        Ok(self)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.shared.value.borrow();
        f.debug_struct("Handle")
            .field("pointer", &self.pointer())
            .field("value", &locate(&root, &self.path))
            .finish()
    }
}
