//! # enforcer-core — Foundational Types for the Schema Enforcer
//!
//! This crate is the leaf of the enforcer workspace. It defines the value
//! model every other crate validates, the scalar codecs behind the OpenAPI
//! `format` vocabulary, and the error and configuration types shared by the
//! validator, the population engine, and the live enforcement layer.
//!
//! ## Key Design Principles
//!
//! 1. **One value model.** [`Value`] extends JSON with byte sequences, dates,
//!    and UTC timestamps so parsed wire values and in-memory values share a
//!    single representation.
//!
//! 2. **Structural equality only.** [`same()`] is the one definition of
//!    "equal" used by `enum` and `uniqueItems` checks. `PartialEq` for
//!    [`Value`] delegates to it.
//!
//! 3. **Two codec modes.** Every format has a lenient `coerce` and a strict
//!    `parse`. Strict parsing distinguishes syntax (`FRMT`) from calendar
//!    (`DATE`) failures.
//!
//! 4. **Stable error codes.** [`ErrorCode`] carries the short codes callers
//!    match on (`TYPE`, `NMIN`, `MLTI`, ...). Messages may change; codes do not.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `enforcer-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod equality;
pub mod error;
pub mod format;
pub mod temporal;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use config::{Constraint, Constraints, EnforcerConfig, Injector, Replacement};
pub use equality::same;
pub use error::{EnforcerError, ErrorCode, FormatError, SchemaError, ValidationError};
pub use format::{coerce_for, Format, Kind};
pub use value::{Map, Params, Value};
