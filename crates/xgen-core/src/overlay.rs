//! Base overlay builder
//!
//! Writes literal values into a JSON document at field paths, creating the
//! objects and arrays on the way. Used to inject `overrideFields` into the
//! composed resource base.

use serde_json::{Map, Value};
use tracing::warn;

use crate::config::OverrideField;
use crate::path::{FieldPath, PathSegment, SegmentKind};

/// Apply every override field that carries a value, in order
pub fn apply_override_fields(base: &mut Value, fields: &[OverrideField]) {
    for field in fields {
        if let Some(value) = &field.value {
            set_field(base, &FieldPath::parse(&field.path), value.clone());
        }
    }
}

/// Arrays are never grown past this many elements
pub const MAX_ARRAY_LEN: usize = 1024;

/// Set `value` at `path`, creating intermediate containers
///
/// Array slots created on the way are empty objects. Arrays only ever
/// grow. A path indexing past `MAX_ARRAY_LEN` is skipped with a warning.
pub fn set_field(base: &mut Value, path: &FieldPath, value: Value) {
    let Some((last, parents)) = path.segments().split_last() else {
        *base = value;
        return;
    };

    if let Some(index) = path.iter().filter_map(PathSegment::index).find(|i| !addressable(*i)) {
        warn!(
            path = %path,
            index,
            limit = MAX_ARRAY_LEN,
            "Array index of override field is too large, skipping"
        );
        return;
    }

    let mut current = base;
    for segment in parents {
        current = descend(current, segment, path);
    }

    match last.kind {
        SegmentKind::Object => {
            object_mut(current, path).insert(last.name.clone(), value);
        }
        SegmentKind::Array { index } => {
            let items = array_of(current, &last.name, path);
            grow(items, index);
            items[index] = value;
        }
    }
}

fn addressable(index: usize) -> bool {
    index.checked_add(1).is_some_and(|len| len <= MAX_ARRAY_LEN)
}

fn descend<'a>(current: &'a mut Value, segment: &PathSegment, path: &FieldPath) -> &'a mut Value {
    match segment.kind {
        SegmentKind::Object => object_mut(current, path)
            .entry(segment.name.clone())
            .or_insert_with(|| Value::Object(Map::new())),
        SegmentKind::Array { index } => {
            let items = array_of(current, &segment.name, path);
            grow(items, index);
            &mut items[index]
        }
    }
}

/// The array addressed by an array segment: a named field, or `current`
/// itself for an unnamed index
fn array_of<'a>(current: &'a mut Value, name: &str, path: &FieldPath) -> &'a mut Vec<Value> {
    let target = if name.is_empty() {
        current
    } else {
        object_mut(current, path)
            .entry(name.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
    };
    array_mut(target, path)
}

/// Make `index` addressable, padding with empty objects
fn grow(items: &mut Vec<Value>, index: usize) {
    if items.len() <= index {
        items.resize(index + 1, Value::Object(Map::new()));
    }
}

fn object_mut<'a>(value: &'a mut Value, path: &FieldPath) -> &'a mut Map<String, Value> {
    if !value.is_object() {
        replace_scalar(value, Value::Object(Map::new()), path);
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was replaced by an object"),
    }
}

fn array_mut<'a>(value: &'a mut Value, path: &FieldPath) -> &'a mut Vec<Value> {
    if !value.is_array() {
        replace_scalar(value, Value::Array(Vec::new()), path);
    }
    match value {
        Value::Array(items) => items,
        _ => unreachable!("value was replaced by an array"),
    }
}

fn replace_scalar(value: &mut Value, container: Value, path: &FieldPath) {
    let placeholder = value.is_null() || value.as_object().is_some_and(Map::is_empty);
    if !placeholder {
        warn!(path = %path, found = %value, "Replacing value in the way of an override field");
    }
    *value = container;
}
