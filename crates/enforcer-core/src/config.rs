//! # Enforcer Configuration
//!
//! The option record shared by schema preparation, population, and live
//! enforcement. Loadable from JSON or YAML (camelCase keys); every field
//! is optional and falls back to its default.
//!
//! ## Defaults
//!
//! | option              | default     |
//! |---------------------|-------------|
//! | `constraints`       | all on except `minItems`, `minProperties`, `required` |
//! | `autoFormat`        | `false`     |
//! | `useDefaults`       | `true`      |
//! | `useTemplates`      | `true`      |
//! | `defaultsUseParams` | `true`      |
//! | `validateAll`       | `true`      |
//! | `replacement`       | `handlebar` |

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::Params;

/// A keyword that can be switched off during schema preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    MultipleOf,
    Maximum,
    Minimum,
    MaxLength,
    MinLength,
    Pattern,
    MaxItems,
    MinItems,
    UniqueItems,
    AdditionalProperties,
    MaxProperties,
    MinProperties,
    Required,
    Enum,
}

impl Constraint {
    pub const ALL: [Constraint; 14] = [
        Constraint::MultipleOf,
        Constraint::Maximum,
        Constraint::Minimum,
        Constraint::MaxLength,
        Constraint::MinLength,
        Constraint::Pattern,
        Constraint::MaxItems,
        Constraint::MinItems,
        Constraint::UniqueItems,
        Constraint::AdditionalProperties,
        Constraint::MaxProperties,
        Constraint::MinProperties,
        Constraint::Required,
        Constraint::Enum,
    ];

    /// The schema keyword this constraint governs.
    pub fn keyword(&self) -> &'static str {
        match self {
            Constraint::MultipleOf => "multipleOf",
            Constraint::Maximum => "maximum",
            Constraint::Minimum => "minimum",
            Constraint::MaxLength => "maxLength",
            Constraint::MinLength => "minLength",
            Constraint::Pattern => "pattern",
            Constraint::MaxItems => "maxItems",
            Constraint::MinItems => "minItems",
            Constraint::UniqueItems => "uniqueItems",
            Constraint::AdditionalProperties => "additionalProperties",
            Constraint::MaxProperties => "maxProperties",
            Constraint::MinProperties => "minProperties",
            Constraint::Required => "required",
            Constraint::Enum => "enum",
        }
    }
}

/// Which keywords are enforced. A disabled keyword is dropped from the
/// prepared schema entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Constraints {
    pub multiple_of: bool,
    pub maximum: bool,
    pub minimum: bool,
    pub max_length: bool,
    pub min_length: bool,
    pub pattern: bool,
    pub max_items: bool,
    pub min_items: bool,
    pub unique_items: bool,
    pub additional_properties: bool,
    pub max_properties: bool,
    pub min_properties: bool,
    pub required: bool,
    #[serde(rename = "enum")]
    pub enumeration: bool,
}

impl Default for Constraints {
    /// Constraints that could reject a partially built value are off.
    fn default() -> Self {
        Self {
            min_items: false,
            min_properties: false,
            required: false,
            ..Self::all()
        }
    }
}

impl Constraints {
    /// Every keyword enforced.
    pub fn all() -> Self {
        Self {
            multiple_of: true,
            maximum: true,
            minimum: true,
            max_length: true,
            min_length: true,
            pattern: true,
            max_items: true,
            min_items: true,
            unique_items: true,
            additional_properties: true,
            max_properties: true,
            min_properties: true,
            required: true,
            enumeration: true,
        }
    }

    pub fn enabled(&self, constraint: Constraint) -> bool {
        *self.slot(constraint)
    }

    /// Return a copy with `constraint` switched to `on`.
    pub fn with(mut self, constraint: Constraint, on: bool) -> Self {
        *self.slot_mut(constraint) = on;
        self
    }

    fn slot(&self, constraint: Constraint) -> &bool {
        match constraint {
            Constraint::MultipleOf => &self.multiple_of,
            Constraint::Maximum => &self.maximum,
            Constraint::Minimum => &self.minimum,
            Constraint::MaxLength => &self.max_length,
            Constraint::MinLength => &self.min_length,
            Constraint::Pattern => &self.pattern,
            Constraint::MaxItems => &self.max_items,
            Constraint::MinItems => &self.min_items,
            Constraint::UniqueItems => &self.unique_items,
            Constraint::AdditionalProperties => &self.additional_properties,
            Constraint::MaxProperties => &self.max_properties,
            Constraint::MinProperties => &self.min_properties,
            Constraint::Required => &self.required,
            Constraint::Enum => &self.enumeration,
        }
    }

    fn slot_mut(&mut self, constraint: Constraint) -> &mut bool {
        match constraint {
            Constraint::MultipleOf => &mut self.multiple_of,
            Constraint::Maximum => &mut self.maximum,
            Constraint::Minimum => &mut self.minimum,
            Constraint::MaxLength => &mut self.max_length,
            Constraint::MinLength => &mut self.min_length,
            Constraint::Pattern => &mut self.pattern,
            Constraint::MaxItems => &mut self.max_items,
            Constraint::MinItems => &mut self.min_items,
            Constraint::UniqueItems => &mut self.unique_items,
            Constraint::AdditionalProperties => &mut self.additional_properties,
            Constraint::MaxProperties => &mut self.max_properties,
            Constraint::MinProperties => &mut self.min_properties,
            Constraint::Required => &mut self.required,
            Constraint::Enum => &mut self.enumeration,
        }
    }
}

/// A caller-supplied template substitution: `(template, params) -> text`.
pub type Injector = Arc<dyn Fn(&str, &Params) -> String + Send + Sync>;

/// Placeholder syntax used by template and default injection.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Replacement {
    /// `:name`
    Colon,
    /// `{{name}}`
    DoubleHandlebar,
    /// `{name}`
    #[default]
    Handlebar,
    /// Caller-supplied substitution; cannot be loaded from a file.
    #[serde(skip)]
    Custom(Injector),
}

impl Replacement {
    pub fn custom(f: impl Fn(&str, &Params) -> String + Send + Sync + 'static) -> Self {
        Replacement::Custom(Arc::new(f))
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Colon => f.write_str("Colon"),
            Replacement::DoubleHandlebar => f.write_str("DoubleHandlebar"),
            Replacement::Handlebar => f.write_str("Handlebar"),
            Replacement::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Options for preparation, population, and live enforcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnforcerConfig {
    /// Keywords enforced during live enforcement.
    #[serde(alias = "enforce")]
    pub constraints: Constraints,
    /// Leniently convert values written through a live handle.
    pub auto_format: bool,
    /// Fill absent values from `default`.
    pub use_defaults: bool,
    /// Fill absent values from `x-template`.
    pub use_templates: bool,
    /// Run string defaults through placeholder injection.
    pub defaults_use_params: bool,
    /// Enforce every keyword during one-shot validation, regardless of
    /// `constraints`.
    pub validate_all: bool,
    pub replacement: Replacement,
}

impl Default for EnforcerConfig {
    fn default() -> Self {
        Self {
            constraints: Constraints::default(),
            auto_format: false,
            use_defaults: true,
            use_templates: true,
            defaults_use_params: true,
            validate_all: true,
            replacement: Replacement::default(),
        }
    }
}

impl EnforcerConfig {
    /// Constraints applied by one-shot validation.
    pub fn validation_constraints(&self) -> Constraints {
        if self.validate_all {
            Constraints::all()
        } else {
            self.constraints
        }
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_auto_format(mut self, on: bool) -> Self {
        self.auto_format = on;
        self
    }

    pub fn with_defaults(mut self, on: bool) -> Self {
        self.use_defaults = on;
        self
    }

    pub fn with_templates(mut self, on: bool) -> Self {
        self.use_templates = on;
        self
    }

    pub fn with_replacement(mut self, replacement: Replacement) -> Self {
        self.replacement = replacement;
        self
    }
}
