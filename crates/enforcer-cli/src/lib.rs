//! # enforcer-cli — Command-Line Front End
//!
//! Provides the `enforcer` binary: thin file-based glue over the schema,
//! live, and request-parameter crates.
//!
//! ## Subcommands
//!
//! - `enforcer validate`: Report every failure of a value against a schema.
//! - `enforcer populate`: Fill defaults, templates, and variables.
//! - `enforcer edit`: Apply assignments through a live handle, rejecting
//!   each one that would leave the value invalid.
//! - `enforcer parse`: Parse raw request parameters against their
//!   Swagger 2 declarations.
//!
//! ## Exit Codes
//!
//! `0` success, `1` the input failed validation, `2` operational error
//! (unreadable file, malformed schema).
//!
//! ```bash
//! enforcer validate --schema pet.yaml --value rex.json
//! enforcer validate --definitions petstore.yaml --definition Dog --value rex.json
//! enforcer -v --config enforcer.yaml populate --schema owner.yaml --param id=7
//! ```

pub mod document;
pub mod edit;
pub mod parse;
pub mod populate;
pub mod validate;

pub use document::{load_config, load_document, SchemaArgs};

/// Exit code for a value or request that failed validation.
pub const EXIT_INVALID: u8 = 1;

/// Exit code for an operational failure.
pub const EXIT_ERROR: u8 = 2;
