//! Array operations on a [`Handle`].
//!
//! Growing operations admit every incoming item (population, auto-format,
//! validation against `items`, uniqueness against the siblings it will
//! live beside) and check the resulting length before touching the array.
//! Operations producing a new array (`concat`, `map`, `filter`, `slice`)
//! return a new, independent root governed by this array's schema; the
//! original is left as it was. `splice` hands back its removed items the
//! same way, under the array's item schema only.

use std::ops::{Bound, Range, RangeBounds};
use std::sync::Arc;

use enforcer_core::equality::contains;
use enforcer_core::{EnforcerError, ErrorCode, Kind, Value};
use enforcer_schema::{validate, Schema};

use crate::handle::Handle;
use crate::position::unconstrained;

struct ArrayFrame {
    schema: Arc<Schema>,
    items: Vec<Value>,
}

/// Clamp `range` to `0..len` the way slice-like operations expect.
fn clamp(range: impl RangeBounds<usize>, len: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    }
    .min(len);
    let end = match range.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    }
    .min(len)
    .max(start);
    start..end
}

impl Handle {
    fn array_frame(&self) -> Result<ArrayFrame, EnforcerError> {
        let frame = self.frame()?;
        match frame.value {
            Value::Array(items) => Ok(ArrayFrame {
                schema: frame.schema,
                items,
            }),
            other => Err(self.unsupported("an array", &other)),
        }
    }

    fn check_length(&self, schema: &Schema, length: usize) -> Result<(), EnforcerError> {
        if let Some(max) = schema.max_items {
            if length > max {
                return Err(self.reject(
                    ErrorCode::Length,
                    &self.pointer(),
                    format!("Array length {length} is greater than allowable maximum length {max}"),
                ));
            }
        }
        if let Some(min) = schema.min_items {
            if length < min {
                return Err(self.reject(
                    ErrorCode::Length,
                    &self.pointer(),
                    format!("Array length {length} is less than allowable minimum length {min}"),
                ));
            }
        }
        Ok(())
    }

    /// Prepare one incoming item destined for `index`.
    fn admit_item(
        &self,
        schema: &Schema,
        siblings: &[Value],
        value: Value,
        index: usize,
    ) -> Result<Value, EnforcerError> {
        let item_schema = schema.items.clone().unwrap_or_else(unconstrained);
        let value = self.context().admit(&item_schema, value)?;
        let path = format!("{}/{index}", self.pointer());
        self.reject_all(validate::validate_at(&item_schema, self.definitions(), &path, &value))?;
        if schema.unique_items && contains(siblings, &value) {
            return Err(self.reject(
                ErrorCode::Unique,
                &self.pointer(),
                format!("Array requires that all items be unique. Value is a duplicate: {value}"),
            ));
        }
        Ok(value)
    }

    fn admit_items(
        &self,
        schema: &Schema,
        siblings: &[Value],
        incoming: impl IntoIterator<Item = Value>,
        first_index: usize,
    ) -> Result<Vec<Value>, EnforcerError> {
        let mut seen = siblings.to_vec();
        let mut admitted = Vec::new();
        for (offset, item) in incoming.into_iter().enumerate() {
            let item = self.admit_item(schema, &seen, item, first_index + offset)?;
            seen.push(item.clone());
            admitted.push(item);
        }
        Ok(admitted)
    }

    fn commit_array<R>(&self, op: impl FnOnce(&mut Vec<Value>) -> R) -> Result<R, EnforcerError> {
        self.commit(|target| match target {
            Value::Array(items) => Ok(op(items)),
            other => Err(self.unsupported("an array", other)),
        })
    }

    pub(crate) fn set_index(&self, index: usize, value: Value) -> Result<(), EnforcerError> {
        let frame = self.array_frame()?;
        let length = frame.items.len();
        if index > length {
            return Err(EnforcerError::IndexOutOfBounds {
                index,
                length,
                path: self.pointer(),
            });
        }
        if index == length {
            self.check_length(&frame.schema, length + 1)?;
        }
        let siblings: Vec<Value> = frame
            .items
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, item)| item.clone())
            .collect();
        let value = self.admit_item(&frame.schema, &siblings, value, index)?;
        self.commit_array(|items| {
            if index == items.len() {
                items.push(value);
            } else {
                items[index] = value;
            }
        })
    }

    /// Append items; returns the new length.
    pub fn push(&self, values: impl IntoIterator<Item = Value>) -> Result<usize, EnforcerError> {
        let frame = self.array_frame()?;
        let length = frame.items.len();
        let admitted = self.admit_items(&frame.schema, &frame.items, values, length)?;
        self.check_length(&frame.schema, length + admitted.len())?;
        self.commit_array(|items| {
            items.extend(admitted);
            items.len()
        })
    }

    /// Prepend items; returns the new length.
    pub fn unshift(&self, values: impl IntoIterator<Item = Value>) -> Result<usize, EnforcerError> {
        let frame = self.array_frame()?;
        let admitted = self.admit_items(&frame.schema, &frame.items, values, 0)?;
        self.check_length(&frame.schema, frame.items.len() + admitted.len())?;
        self.commit_array(|items| {
            items.splice(0..0, admitted);
            items.len()
        })
    }

    /// Remove and return the last item.
    pub fn pop(&self) -> Result<Option<Value>, EnforcerError> {
        let frame = self.array_frame()?;
        if frame.items.is_empty() {
            return Ok(None);
        }
        self.check_length(&frame.schema, frame.items.len() - 1)?;
        self.commit_array(|items| items.pop())
    }

    /// Remove and return the first item.
    pub fn shift(&self) -> Result<Option<Value>, EnforcerError> {
        let frame = self.array_frame()?;
        if frame.items.is_empty() {
            return Ok(None);
        }
        self.check_length(&frame.schema, frame.items.len() - 1)?;
        self.commit_array(|items| Some(items.remove(0)))
    }

    /// Remove `delete_count` items at `start` and insert `values` in their
    /// place. The removed items come back as a new root governed only by
    /// this array's `items` and `uniqueItems`, so length bounds never
    /// reject it.
    pub fn splice(
        &self,
        start: usize,
        delete_count: usize,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<Handle, EnforcerError> {
        let frame = self.array_frame()?;
        let removed = clamp(start..start.saturating_add(delete_count), frame.items.len());
        let remaining: Vec<Value> = frame
            .items
            .iter()
            .enumerate()
            .filter(|(i, _)| !removed.contains(i))
            .map(|(_, item)| item.clone())
            .collect();
        let admitted = self.admit_items(&frame.schema, &remaining, values, removed.start)?;
        self.check_length(&frame.schema, remaining.len() + admitted.len())?;

        let spliced = Schema {
            kind: Kind::Array,
            items: frame.schema.items.clone(),
            unique_items: frame.schema.unique_items,
            ..Schema::any()
        };
        let out = self.derive_root(Arc::new(spliced), Value::Array(frame.items[removed.clone()].to_vec()))?;
        self.commit_array(|items| {
            items.splice(removed, admitted);
        })?;
        Ok(out)
    }

    /// Overwrite every slot in `range` with `value`.
    pub fn fill(&self, value: Value, range: impl RangeBounds<usize>) -> Result<&Self, EnforcerError> {
        let frame = self.array_frame()?;
        let slots = clamp(range, frame.items.len());
        if slots.is_empty() {
            return Ok(self);
        }
        let outside: Vec<Value> = frame
            .items
            .iter()
            .enumerate()
            .filter(|(i, _)| !slots.contains(i))
            .map(|(_, item)| item.clone())
            .collect();
        let value = self.admit_item(&frame.schema, &outside, value, slots.start)?;
        self.commit_array(|items| {
            for slot in &mut items[slots] {
                *slot = value.clone();
            }
        })?;
        Ok(self)
    }

    /// Copy the items in `source` to the positions starting at `target`,
    /// stopping at the end of the array.
    pub fn copy_within(&self, source: impl RangeBounds<usize>, target: usize) -> Result<&Self, EnforcerError> {
        let frame = self.array_frame()?;
        let length = frame.items.len();
        let source = clamp(source, length);
        if target >= length || source.is_empty() {
            return Ok(self);
        }
        let chunk: Vec<Value> = frame.items[source].to_vec();
        self.commit_array(|items| {
            for (slot, item) in items[target..].iter_mut().zip(chunk) {
                *slot = item;
            }
        })?;
        Ok(self)
    }

    /// A new root holding this array followed by `values`.
    pub fn concat(&self, values: impl IntoIterator<Item = Value>) -> Result<Handle, EnforcerError> {
        let frame = self.array_frame()?;
        let length = frame.items.len();
        let admitted = self.admit_items(&frame.schema, &frame.items, values, length)?;
        self.check_length(&frame.schema, length + admitted.len())?;
        let mut items = frame.items;
        items.extend(admitted);
        self.derive_root(frame.schema, Value::Array(items))
    }

    /// A new root holding `f` applied to every item.
    pub fn map(&self, mut f: impl FnMut(&Value, usize) -> Value) -> Result<Handle, EnforcerError> {
        let frame = self.array_frame()?;
        let item_schema = frame.schema.items.clone().unwrap_or_else(unconstrained);
        let context = self.context();
        let mapped = frame
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| context.admit(&item_schema, f(item, i)))
            .collect::<Result<Vec<_>, _>>()?;
        self.derive_root(frame.schema, Value::Array(mapped))
    }

    /// A new root holding the items for which `f` returns true.
    pub fn filter(&self, mut f: impl FnMut(&Value, usize) -> bool) -> Result<Handle, EnforcerError> {
        let frame = self.array_frame()?;
        let kept = frame
            .items
            .into_iter()
            .enumerate()
            .filter(|(i, item)| f(item, *i))
            .map(|(_, item)| item)
            .collect();
        self.derive_root(frame.schema, Value::Array(kept))
    }

    /// A new root holding the items in `range`.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Result<Handle, EnforcerError> {
        let frame = self.array_frame()?;
        let range = clamp(range, frame.items.len());
        let items = frame.items[range].to_vec();
        self.derive_root(frame.schema, Value::Array(items))
    }
}
