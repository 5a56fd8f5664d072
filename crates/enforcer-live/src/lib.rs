//! # enforcer-live — Live Enforcement Layer
//!
//! Wraps a value so that every mutation made through the wrapper is
//! validated against its schema before it becomes visible.
//!
//! ## Guarantees
//!
//! - Every value reachable through a [`Handle`] satisfies the schema that
//!   governs its position, for the handle's entire lifetime.
//! - A rejected mutation is not observable: the root is unchanged and a
//!   typed [`EnforcerError`] is returned.
//! - Reading a nested array or object yields another handle over the same
//!   root, so the guarantee holds at any depth.
//!
//! ## Seeding
//!
//! Without an initial value the seed is derived by population (variables,
//! templates, defaults); an array or object schema that derives nothing is
//! seeded with an empty container. The seed, like a supplied initial
//! value, is auto-formatted (when enabled) and validated before a handle
//! is returned.
//!
//! ## Crate Policy
//!
//! - Handles are single-threaded (`Rc`/`RefCell`) and therefore `!Send`.
//!   Prepared schemas and definitions stay `Arc`-shared.
//! - Live enforcement prepares with the configured constraint switches;
//!   `validateAll` applies to batch validation only.

mod array;
mod handle;
mod incoming;
mod object;
mod position;

use std::sync::Arc;

use enforcer_core::{EnforcerConfig, EnforcerError, Kind, Params, Value};
use enforcer_schema::{populate, Definitions, Enforcer, Prepare, Schema};

pub use handle::{Entry, Handle};
pub use position::Key;

use incoming::Context;

/// Wrap `initial` (or a derived seed) in a live handle governed by `schema`.
pub fn enforce(
    schema: &Arc<Schema>,
    definitions: Arc<Definitions>,
    config: EnforcerConfig,
    params: Params,
    initial: Option<Value>,
) -> Result<Handle, EnforcerError> {
    let value = match initial {
        Some(value) => value,
        None => seed(schema, &definitions, &config, &params)?,
    };
    let context = Context {
        definitions: &definitions,
        config: &config,
        params: &params,
    };
    let value = context.auto_format(schema, value)?;
    Handle::seal(Arc::clone(schema), definitions, config, params, value)
}

fn seed(
    schema: &Arc<Schema>,
    definitions: &Definitions,
    config: &EnforcerConfig,
    params: &Params,
) -> Result<Value, EnforcerError> {
    if let Some(derived) = populate(schema, definitions, params, None, config).value {
        return Ok(derived);
    }
    let kind = definitions.follow(schema).map_or(Kind::Untyped, |s| s.kind);
    match kind {
        Kind::Array => Ok(Value::array()),
        Kind::Object => Ok(Value::object()),
        _ => Err(EnforcerError::Unsupported(format!(
            "no initial value was supplied and none can be derived for a {kind} schema"
        ))),
    }
}

/// Live enforcement through the [`Enforcer`] facade.
pub trait Enforce {
    /// Prepare `schema` and wrap `initial` (or a derived seed) in a handle.
    fn enforce(&self, schema: impl Prepare, initial: Option<Value>) -> Result<Handle, EnforcerError>;
}

impl Enforce for Enforcer {
    fn enforce(&self, schema: impl Prepare, initial: Option<Value>) -> Result<Handle, EnforcerError> {
        let schema = self.prepare(schema)?;
        enforce(
            &schema,
            Arc::clone(self.definitions()),
            self.config().clone(),
            self.params().clone(),
            initial,
        )
    }
}
