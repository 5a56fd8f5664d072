//! # Placeholder Injection
//!
//! Substitutes named parameters into template strings. Three placeholder
//! syntaxes are built in: `:name`, `{name}`, and `{{name}}`, with names
//! matching `[_$a-zA-Z][_$a-zA-Z0-9]*`. A placeholder naming a parameter
//! that is not supplied is left verbatim.

use std::sync::OnceLock;

use enforcer_core::{Params, Replacement, Value};
use regex::Regex;

fn colon_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i):([_$a-z][_$a-z0-9]*)").expect("colon placeholder regex must compile"))
}

fn double_handlebar_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\{\{([_$a-z][_$a-z0-9]*)\}\}")
            .expect("double handlebar placeholder regex must compile")
    })
}

fn handlebar_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\{([_$a-z][_$a-z0-9]*)\}").expect("handlebar placeholder regex must compile")
    })
}

fn substitute(re: &Regex, template: &str, params: &Params) -> String {
    re.replace_all(template, |caps: &regex::Captures<'_>| match params.get(&caps[1]) {
        Some(value) => value.to_string(),
        None => caps[0].to_string(),
    })
    .into_owned()
}

/// Substitute `params` into `template`.
pub fn inject(template: &str, params: &Params, replacement: &Replacement) -> String {
    match replacement {
        Replacement::Colon => substitute(colon_re(), template, params),
        Replacement::DoubleHandlebar => substitute(double_handlebar_re(), template, params),
        Replacement::Handlebar => substitute(handlebar_re(), template, params),
        Replacement::Custom(injector) => injector(template, params),
    }
}

/// Substitute into every string reachable from `value`.
pub fn inject_value(value: &Value, params: &Params, replacement: &Replacement) -> Value {
    match value {
        Value::String(text) => Value::String(inject(text, params, replacement)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| inject_value(item, params, replacement))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), inject_value(item, params, replacement)))
                .collect(),
        ),
        other => other.clone(),
    }
}
