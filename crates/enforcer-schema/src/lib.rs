//! # enforcer-schema — Schema Preparation, Validation & Population
//!
//! Turns raw JSON-Schema-like descriptions (the schema dialect of
//! Swagger 2 / OpenAPI 3 documents) into immutable prepared schemas and
//! runs the three batch operations over them.
//!
//! ## Modules
//!
//! - [`schema`]: preparation of raw schemas, kind inference, constraint
//!   stripping, pattern compilation.
//! - [`definitions`]: the named-schema table used for discriminator lookup
//!   and `$ref` links.
//! - [`resolve`]: expansion of `allOf`/discriminator composition into leaf
//!   schemas, cycle-safe.
//! - [`validate`]: structural validation, either collecting every failure
//!   or asserting with an `MLTI` aggregate.
//! - [`template`]: `:name`, `{name}`, `{{name}}` placeholder substitution.
//! - [`populate`]: default/template population with the required gate.
//! - [`enforcer`]: the [`Enforcer`] facade bundling configuration,
//!   definitions, and parameters.
//!
//! ## Key Design Principles
//!
//! - Prepared schemas are `Arc`-shared and never mutated, so they are safe
//!   to use from many threads at once.
//! - A constraint switched off by configuration is absent from the
//!   prepared schema rather than skipped at validation time.
//! - Collecting never fails; it is empty exactly when asserting succeeds.
//!
//! ## Crate Policy
//!
//! - Depends only on `enforcer-core` internally.
//! - No I/O. Everything here is synchronous and deterministic.

pub mod definitions;
pub mod enforcer;
pub mod populate;
pub mod resolve;
pub mod schema;
pub mod template;
pub mod validate;

pub use definitions::Definitions;
pub use enforcer::Enforcer;
pub use populate::{populate, Population};
pub use resolve::{resolve, resolve_partial, HierarchyNotFound, Resolution};
pub use schema::{prepare, reference_name, Additional, Bound, Discriminator, Pattern, Prepare, Schema};
pub use template::{inject, inject_value};
pub use validate::{collect, validate_at};
