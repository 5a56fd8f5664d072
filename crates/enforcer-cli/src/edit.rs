//! # Edit Subcommand
//!
//! Loads a value under live enforcement and applies assignments to it.
//! An assignment that would leave the value invalid is rejected and
//! reported; the others still apply. Assignments run in the order
//! `--set`, `--push`, `--remove`.
//!
//! Targets are JSON pointers (`/pets/0/name`); the empty pointer is the
//! root.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use enforcer_core::{EnforcerConfig, EnforcerError, Params, Value};
use enforcer_live::{Enforce, Handle, Key};

use crate::document::{literal, load_document, print_json, SchemaArgs};
use crate::EXIT_INVALID;

/// Arguments for the edit subcommand.
#[derive(Args, Debug)]
pub struct EditArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Starting value (JSON or YAML); omitted to seed from the schema.
    #[arg(long)]
    pub value: Option<PathBuf>,

    /// Assign POINTER=VALUE; VALUE is JSON or a bare string (repeatable).
    #[arg(long = "set", value_name = "POINTER=VALUE")]
    pub sets: Vec<String>,

    /// Append to the array at POINTER (repeatable).
    #[arg(long = "push", value_name = "POINTER=VALUE")]
    pub pushes: Vec<String>,

    /// Delete the property at POINTER (repeatable).
    #[arg(long = "remove", value_name = "POINTER")]
    pub removals: Vec<String>,
}

/// Outcome of an edit session.
#[derive(Debug)]
pub struct Edited {
    pub value: Value,
    pub rejected: Vec<(String, EnforcerError)>,
}

/// Execute the edit subcommand.
pub fn run_edit(args: &EditArgs, config: &EnforcerConfig) -> Result<u8> {
    let edited = match edit(args, config)? {
        Ok(edited) => edited,
        Err(error) => {
            println!("{error}");
            return Ok(EXIT_INVALID);
        }
    };
    for (operation, error) in &edited.rejected {
        tracing::warn!(operation = %operation, "assignment rejected");
        eprintln!("rejected {operation}: {error}");
    }
    print_json(&edited.value.to_json())?;
    Ok(if edited.rejected.is_empty() { 0 } else { EXIT_INVALID })
}

/// Run the session. The outer error is operational; the inner one is an
/// initial value the schema refuses.
pub fn edit(args: &EditArgs, config: &EnforcerConfig) -> Result<Result<Edited, EnforcerError>> {
    let enforcer = args.schema.enforcer(config, Params::new())?;
    let raw = args.schema.raw_schema(&enforcer)?;
    let initial = args.value.as_deref().map(load_document::<Value>).transpose()?;

    let root = match enforcer.enforce(&raw, initial) {
        Ok(root) => root,
        Err(EnforcerError::Schema(error)) => {
            return Err(error).context("failed to prepare schema");
        }
        Err(error) => return Ok(Err(error)),
    };

    let mut rejected = Vec::new();
    for operation in &args.sets {
        let (pointer, text) = split_assignment(operation)?;
        if let Err(error) = assign(&root, pointer, literal(text)) {
            rejected.push((format!("--set {operation}"), error));
        }
    }
    for operation in &args.pushes {
        let (pointer, text) = split_assignment(operation)?;
        let pushed = locate(&root, pointer).and_then(|(parent, last)| {
            let array = match last {
                Some(key) => parent.child(key)?,
                None => parent,
            };
            array.push([literal(text)])
        });
        if let Err(error) = pushed {
            rejected.push((format!("--push {operation}"), error));
        }
    }
    for pointer in &args.removals {
        let removed = locate(&root, pointer).and_then(|(parent, last)| match last {
            Some(Key::Name(name)) => parent.remove(&name).map(drop),
            _ => Err(EnforcerError::Unsupported(format!(
                "{pointer:?} does not name an object property"
            ))),
        });
        if let Err(error) = removed {
            rejected.push((format!("--remove {pointer}"), error));
        }
    }

    Ok(Ok(Edited {
        value: root.value()?,
        rejected,
    }))
}

fn split_assignment(operation: &str) -> Result<(&str, &str)> {
    operation
        .split_once('=')
        .with_context(|| format!("assignment {operation:?} is not POINTER=VALUE"))
}

fn assign(root: &Handle, pointer: &str, value: Value) -> Result<(), EnforcerError> {
    match locate(root, pointer)? {
        (parent, Some(key)) => parent.set(key, value).map(drop),
        (root, None) => root.replace(value).map(drop),
    }
}

/// The handle holding the pointer's final segment, and that segment.
fn locate(root: &Handle, pointer: &str) -> Result<(Handle, Option<Key>), EnforcerError> {
    let mut segments: Vec<&str> = pointer.split('/').skip(1).collect();
    let Some(last) = segments.pop() else {
        return Ok((root.clone(), None));
    };
    let mut parent = root.clone();
    for segment in segments {
        let key = key_for(&parent, segment)?;
        parent = parent.child(key)?;
    }
    let key = key_for(&parent, last)?;
    Ok((parent, Some(key)))
}

fn key_for(handle: &Handle, segment: &str) -> Result<Key, EnforcerError> {
    let segment = segment.replace("~1", "/").replace("~0", "~");
    match handle.value()? {
        Value::Array(_) => segment.parse::<usize>().map(Key::Index).map_err(|_| {
            EnforcerError::Unsupported(format!("{segment:?} is not an array index"))
        }),
        _ => Ok(Key::Name(segment)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enforcer_core::{Constraints, ErrorCode};
    use serde_json::json;

    fn strict() -> EnforcerConfig {
        EnforcerConfig::default().with_constraints(Constraints::all())
    }

    fn args(dir: &std::path::Path) -> EditArgs {
        let path = dir.join("team.yaml");
        std::fs::write(
            &path,
            r#"
type: object
required: [name]
properties:
  name: {type: string, minLength: 1}
  members:
    type: array
    uniqueItems: true
    items: {type: string}
"#,
        )
        .unwrap();
        let value = dir.join("team.json");
        std::fs::write(&value, r#"{"name": "core", "members": ["ada"]}"#).unwrap();
        EditArgs {
            schema: SchemaArgs {
                schema: Some(path),
                definition: None,
                definitions: None,
            },
            value: Some(value),
            sets: Vec::new(),
            pushes: Vec::new(),
            removals: Vec::new(),
        }
    }

    #[test]
    fn test_valid_assignments_apply() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path());
        args.sets = vec!["/members/0=grace".to_string(), "/name=infra".to_string()];
        args.pushes = vec!["/members=linus".to_string()];
        let edited = edit(&args, &strict()).unwrap().unwrap();
        assert!(edited.rejected.is_empty());
        assert_eq!(
            edited.value,
            Value::from(json!({"name": "infra", "members": ["grace", "linus"]}))
        );
    }

    #[test]
    fn test_invalid_assignments_rejected_individually() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path());
        args.sets = vec!["/name=".to_string(), "/members/5=x".to_string()];
        args.pushes = vec!["/members=ada".to_string(), "/members=bob".to_string()];
        args.removals = vec!["/name".to_string()];
        let edited = edit(&args, &strict()).unwrap().unwrap();

        let codes: Vec<_> = edited.rejected.iter().map(|(_, e)| e.code()).collect();
        assert_eq!(
            codes,
            vec![
                Some(ErrorCode::StringMin),
                Some(ErrorCode::Length),
                Some(ErrorCode::Unique),
                Some(ErrorCode::Required),
            ]
        );
        assert_eq!(
            edited.value,
            Value::from(json!({"name": "core", "members": ["ada", "bob"]}))
        );
        assert_eq!(run_edit(&args, &strict()).unwrap(), EXIT_INVALID);
    }

    #[test]
    fn test_invalid_initial_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path());
        let value = dir.path().join("bad.json");
        std::fs::write(&value, r#"{"name": 3}"#).unwrap();
        args.value = Some(value);
        let error = edit(&args, &strict()).unwrap().unwrap_err();
        assert_eq!(error.code(), Some(ErrorCode::Type));
    }

    #[test]
    fn test_root_pointer_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path());
        args.sets = vec![r#"={"name": "ops"}"#.to_string()];
        let edited = edit(&args, &strict()).unwrap().unwrap();
        assert_eq!(edited.value, Value::from(json!({"name": "ops"})));
    }
}
