//! Enum remapping
//!
//! Claim fields can install a new enum (`newEnum`) or edit the managed
//! field's enum (`enum: [{value, type: add|remove|map, mapTo}]`). Edits
//! produce the claim enum plus a table of value rewrites that becomes a map
//! transform on the field's patch.

use std::collections::BTreeMap;

use serde_json::Value;
use xgen_core::{EnumValue, EnumValueType, SchemaProperty};

use crate::error::{GeneratorError, Result};
use crate::overrides::OverrideDefinition;

/// Rewrites from original enum values (in canonical string form) to the
/// values sent to the managed resource
///
/// Only explicit rewrites are recorded: removed and untouched values have
/// no entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumTransformTable {
    entries: BTreeMap<String, Value>,
}

impl EnumTransformTable {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    fn insert(&mut self, from: &Value, to: Value) {
        self.entries.insert(canonical_string(from), to);
    }
}

/// JSON rendering of a literal, without the quotes around strings
pub fn canonical_string(value: &Value) -> String {
    let rendered = value.to_string();
    match value {
        Value::String(_) => rendered[1..rendered.len() - 1].to_string(),
        _ => rendered,
    }
}

/// Apply the enum settings of `definition` to `schema`
///
/// Records the original enum and the transform table on the definition
/// when existing values are edited.
pub fn remap(schema: &mut SchemaProperty, definition: &mut OverrideDefinition) -> Result<()> {
    let Some(settings) = definition.declaration.override_settings.as_ref() else {
        return Ok(());
    };

    if let Some(new_enum) = &settings.new_enum {
        if schema.enum_values.is_some() {
            return Err(GeneratorError::NewEnumOnExistingEnum {
                claim_path: definition.claim_path.clone(),
            });
        }
        schema.enum_values = Some(new_enum.clone());
        return Ok(());
    }

    if let Some(edits) = &settings.enum_values {
        let Some(original) = schema.enum_values.take() else {
            return Err(GeneratorError::EditOnMissingEnum {
                claim_path: definition.claim_path.clone(),
            });
        };

        let (values, table) = apply_edits(&original, edits, &definition.claim_path)?;
        schema.enum_values = Some(values);
        definition.original_enum = Some(original);
        definition.enum_table = Some(table);
    }

    Ok(())
}

fn apply_edits(
    original: &[Value],
    edits: &[EnumValue],
    claim_path: &str,
) -> Result<(Vec<Value>, EnumTransformTable)> {
    let mut values = Vec::with_capacity(original.len() + edits.len());
    let mut table = EnumTransformTable::default();

    for value in original {
        match matching_edit(value, edits) {
            Some(edit) if edit.type_ == EnumValueType::Remove => {}
            Some(edit) if edit.type_ == EnumValueType::Map => {
                let target = edit.map_to.clone().ok_or_else(|| GeneratorError::MissingMapTarget {
                    claim_path: claim_path.to_string(),
                    value: canonical_string(value),
                })?;
                table.insert(value, target);
                values.push(value.clone());
            }
            _ => values.push(value.clone()),
        }
    }

    for edit in edits.iter().filter(|e| e.type_ == EnumValueType::Add) {
        values.push(edit.value.clone());
        if let Some(target) = &edit.map_to {
            table.insert(&edit.value, target.clone());
        }
    }

    Ok((values, table))
}

fn matching_edit<'a>(value: &Value, edits: &'a [EnumValue]) -> Option<&'a EnumValue> {
    edits.iter().find(|e| &e.value == value)
}

/// Pairs of the map transform emitted for an edited enum
///
/// Every value of the claim enum has a key, since a map transform rejects
/// keys it does not know: the table entries plus identity pairs for the
/// kept original values and the added values without a target.
pub fn transform_pairs(definition: &OverrideDefinition) -> Option<BTreeMap<String, Value>> {
    let original = definition.original_enum.as_ref()?;
    let table = definition.enum_table.as_ref()?;
    let edits = definition
        .declaration
        .override_settings
        .as_ref()
        .and_then(|s| s.enum_values.as_deref())
        .unwrap_or_default();

    let kept = original.iter().filter(|value| {
        matching_edit(value, edits).is_none_or(|e| e.type_ != EnumValueType::Remove)
    });
    let added = edits
        .iter()
        .filter(|e| e.type_ == EnumValueType::Add)
        .map(|e| &e.value);

    let mut pairs: BTreeMap<String, Value> = kept
        .chain(added)
        .map(|value| (canonical_string(value), value.clone()))
        .collect();
    pairs.extend(table.iter().map(|(k, v)| (k.clone(), v.clone())));

    Some(pairs)
}
