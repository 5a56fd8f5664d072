//! # enforcer-http — Request Parameter Boundary
//!
//! The seam between an HTTP framework and the enforcer. Callers hand over
//! request components that are already decoded (path variables matched,
//! query string split, headers collected, body deserialized); this crate
//! parses each declared parameter strictly and validates it.
//!
//! Routing, content negotiation, multipart and urlencoded decoding, and
//! transport all stay with the framework.
//!
//! ## Crate Policy
//!
//! - Parameter text is parsed strictly; lenient coercion is never applied
//!   to request input.
//! - All failures of a request are reported together, each with a path
//!   rooted at its component (`/query/<name>`, `/body/<name>/...`).

pub mod parameter;
pub mod request;

pub use parameter::{CollectionFormat, Location, Parameter};
pub use request::{parse_parameters, ParameterErrors, ParsedRequest, RequestParts};
