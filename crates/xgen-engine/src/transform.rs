//! Schema transformer
//!
//! Rewrites one section (`spec` or `status`) of the managed resource schema
//! into the claim schema:
//! 1. walk the managed schema, dropping ignored fields and lifting every
//!    field with an override out of its managed location
//! 2. insert each override at its claim path, applying enum settings
//! 3. rewrite validation rules that mention renamed fields

use std::collections::BTreeMap;

use tracing::{debug, warn};
use xgen_core::{FieldPath, PathSegment, SchemaProperty};

use crate::enums::remap;
use crate::error::{GeneratorError, Result};
use crate::overrides::{OverrideDefinition, OverrideIndex};

pub struct SchemaTransformer<'a> {
    index: &'a mut OverrideIndex,
}

impl<'a> SchemaTransformer<'a> {
    pub fn new(index: &'a mut OverrideIndex) -> Self {
        Self { index }
    }

    /// Build the claim schema of a section
    pub fn transform_section(
        &mut self,
        schema: &SchemaProperty,
        section: &str,
    ) -> Result<SchemaProperty> {
        let root = FieldPath::parse(section);
        let mut claim = self.transform(schema, &root);
        self.insert_definitions(&mut claim, section)?;
        rewrite_validations(&mut claim, self.index.definitions());
        Ok(claim)
    }

    /// Walk a managed schema node
    ///
    /// Non-object nodes are returned unchanged.
    pub fn transform(&mut self, schema: &SchemaProperty, path: &FieldPath) -> SchemaProperty {
        let mut result = schema.clone();
        if !schema.is_object() {
            return result;
        }

        for (key, child) in &schema.properties {
            let child_path = path.child(key);
            let managed_path = child_path.to_string();

            if self.index.is_ignored(&managed_path) {
                result.properties.remove(key);
                result.remove_required(key);
                continue;
            }

            if child.is_object() {
                let transformed = self.transform(child, &child_path);
                result.properties.insert(key.clone(), transformed);
            }

            if let Some(definition) = self.index.find_by_managed_path_mut(&managed_path) {
                debug!(
                    managed_path = %managed_path,
                    claim_path = %definition.claim_path,
                    "Lifting overridden field"
                );
                let current = result.properties.remove(key);
                if definition.schema.is_none() {
                    definition.schema = current;
                }
                if result.is_required(key) {
                    definition.required = true;
                    result.remove_required(key);
                }
            }
        }

        if self.index.is_ignored(&path.child("default").to_string()) {
            result.default = None;
        }

        result
    }

    /// Insert the section's published definitions at their claim paths
    fn insert_definitions(&mut self, claim: &mut SchemaProperty, section: &str) -> Result<()> {
        for definition in self.index.definitions_mut() {
            if definition.ignore_in_claim || definition.section() != Some(section) {
                continue;
            }

            let Some((_, below_section)) = definition.segments.segments().split_first() else {
                continue;
            };
            if below_section.is_empty() {
                warn!(
                    claim_path = %definition.claim_path,
                    "Cannot replace a whole section, skipping"
                );
                continue;
            }
            let below_section = below_section.to_vec();

            let mut schema = definition
                .schema
                .clone()
                .ok_or_else(|| GeneratorError::MissingSchema {
                    claim_path: definition.claim_path.clone(),
                })?;
            remap(&mut schema, definition)?;
            if let Some(description) = &definition.declaration.description {
                schema.description = Some(description.clone());
            }

            debug!(
                claim_path = %definition.claim_path,
                required = definition.required,
                "Inserting claim field"
            );
            insert_at(claim, &below_section, schema, definition);
        }
        Ok(())
    }
}

fn insert_at(
    node: &mut SchemaProperty,
    segments: &[PathSegment],
    schema: SchemaProperty,
    definition: &OverrideDefinition,
) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        node.properties.insert(first.name.clone(), schema);
        if definition.required {
            node.add_required(&first.name);
        }
        return;
    }

    if !node.is_object() {
        warn!(
            claim_path = %definition.claim_path,
            field = %first.name,
            "Parent of claim field is not an object, skipping"
        );
        return;
    }

    let child = node
        .properties
        .entry(first.name.clone())
        .or_insert_with(|| SchemaProperty::object(BTreeMap::new()));
    insert_at(child, rest, schema, definition);
}

/// Point top-level validation rules and messages at renamed claim fields
///
/// Rules address fields relative to `self`, so the leading `spec` of
/// both paths is replaced before rewriting.
fn rewrite_validations(claim: &mut SchemaProperty, definitions: &[OverrideDefinition]) {
    if claim.x_validations.is_empty() {
        return;
    }

    let renames: Vec<(&str, &str)> = definitions
        .iter()
        .filter_map(|d| {
            d.declaration
                .managed_path
                .as_deref()
                .map(|managed| (managed, d.declaration.claim_path.as_str()))
        })
        .collect();

    for validation in &mut claim.x_validations {
        for (managed, claim_path) in &renames {
            let from = managed.replacen("spec", "self", 1);
            let to = claim_path.replacen("spec", "self", 1);
            validation.rule = validation.rule.replace(&from, &to);
            validation.message = validation.message.replace(managed, claim_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use xgen_core::{OverrideField, OverrideFieldInClaim, OverrideSettings, ValidationRule};

    fn spec_schema() -> SchemaProperty {
        serde_json::from_value(json!({
            "type": "object",
            "required": ["forProvider"],
            "properties": {
                "forProvider": {
                    "type": "object",
                    "required": ["instanceSize", "region"],
                    "properties": {
                        "instanceSize": {"type": "string", "description": "Size of the instance"},
                        "region": {"type": "string"},
                        "acl": {"type": "string", "enum": ["private", "public-read"]},
                        "tags": {"type": "object", "additionalProperties": {"type": "string"}}
                    }
                },
                "internal": {"type": "string"},
                "providerConfigRef": {
                    "type": "object",
                    "default": {"name": "default"},
                    "properties": {"name": {"type": "string"}}
                },
                "deletionPolicy": {"type": "string", "default": "Delete"}
            }
        }))
        .unwrap()
    }

    fn transform(
        declarations: &[OverrideFieldInClaim],
        fields: &[OverrideField],
    ) -> Result<SchemaProperty> {
        let mut index = OverrideIndex::new(declarations, fields)?;
        SchemaTransformer::new(&mut index).transform_section(&spec_schema(), "spec")
    }

    fn rename(claim: &str, managed: &str) -> OverrideFieldInClaim {
        OverrideFieldInClaim {
            claim_path: claim.to_string(),
            managed_path: Some(managed.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_rename_moves_field_and_requiredness() {
        let claim =
            transform(&[rename("spec.size", "spec.forProvider.instanceSize")], &[]).unwrap();

        let for_provider = &claim.properties["forProvider"];
        assert!(!for_provider.properties.contains_key("instanceSize"));
        assert!(!for_provider.is_required("instanceSize"));
        assert!(for_provider.is_required("region"));

        let size = &claim.properties["size"];
        assert_eq!(size.description.as_deref(), Some("Size of the instance"));
        assert!(claim.is_required("size"));
    }

    #[test]
    fn test_static_ignore_and_default_clearing() {
        let claim = transform(&[], &[]).unwrap();
        assert!(!claim.properties["forProvider"].properties.contains_key("tags"));
        assert_eq!(claim.properties["providerConfigRef"].default, None);
        assert_eq!(claim.properties["deletionPolicy"].default, Some(json!("Delete")));
    }

    #[test]
    fn test_ignored_field_is_dropped_from_required() {
        let hidden = OverrideFieldInClaim {
            claim_path: "spec.forProvider.region".to_string(),
            ignore: true,
            ..Default::default()
        };
        let claim = transform(&[hidden], &[]).unwrap();
        let for_provider = &claim.properties["forProvider"];
        assert!(!for_provider.properties.contains_key("region"));
        assert!(!for_provider.is_required("region"));
    }

    #[test]
    fn test_override_field_paths_are_hidden() {
        let field = OverrideField {
            path: "spec.internal".to_string(),
            value: Some(json!("fixed")),
            ignore: true,
        };
        let claim = transform(&[], &[field]).unwrap();
        assert!(!claim.properties.contains_key("internal"));
    }

    #[test]
    fn test_new_field_needs_schema() {
        let err = transform(
            &[OverrideFieldInClaim {
                claim_path: "spec.parameters.owner".to_string(),
                ..Default::default()
            }],
            &[],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "schema must be given for new property: spec.parameters.owner");
    }

    #[test]
    fn test_new_field_creates_intermediate_objects() {
        let declaration = OverrideFieldInClaim {
            claim_path: "spec.parameters.owner".to_string(),
            description: Some("Team owning the bucket".to_string()),
            override_settings: Some(OverrideSettings {
                property: Some(SchemaProperty::string()),
                new_enum: Some(vec![json!("platform"), json!("data")]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let claim = transform(&[declaration], &[]).unwrap();

        let parameters = &claim.properties["parameters"];
        assert!(parameters.is_structured_object());
        let owner = &parameters.properties["owner"];
        assert_eq!(owner.description.as_deref(), Some("Team owning the bucket"));
        assert_eq!(owner.enum_values, Some(vec![json!("platform"), json!("data")]));
    }

    #[test]
    fn test_enum_edit_in_place() {
        let declaration = OverrideFieldInClaim {
            claim_path: "spec.forProvider.acl".to_string(),
            override_settings: Some(OverrideSettings {
                enum_values: Some(vec![xgen_core::EnumValue {
                    value: json!("public-read"),
                    type_: xgen_core::EnumValueType::Remove,
                    map_to: None,
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut index = OverrideIndex::new(&[declaration], &[]).unwrap();
        let claim = SchemaTransformer::new(&mut index)
            .transform_section(&spec_schema(), "spec")
            .unwrap();

        assert_eq!(
            claim.properties["forProvider"].properties["acl"].enum_values,
            Some(vec![json!("private")])
        );
        let definition = index.find_by_claim_path("spec.forProvider.acl").unwrap();
        assert_eq!(
            definition.original_enum,
            Some(vec![json!("private"), json!("public-read")])
        );
    }

    #[test]
    fn test_validation_rules_follow_renames() {
        let mut schema = spec_schema();
        schema.x_validations = vec![ValidationRule {
            rule: "!has(self.forProvider.instanceSize) || self.forProvider.instanceSize != ''"
                .to_string(),
            message: "spec.forProvider.instanceSize must not be empty".to_string(),
            ..Default::default()
        }];

        let mut index =
            OverrideIndex::new(&[rename("spec.size", "spec.forProvider.instanceSize")], &[])
                .unwrap();
        let claim = SchemaTransformer::new(&mut index)
            .transform_section(&schema, "spec")
            .unwrap();

        assert_eq!(claim.x_validations[0].rule, "!has(self.size) || self.size != ''");
        assert_eq!(claim.x_validations[0].message, "spec.size must not be empty");
    }

    #[test]
    fn test_transform_is_repeatable() {
        let mut index =
            OverrideIndex::new(&[rename("spec.size", "spec.forProvider.instanceSize")], &[])
                .unwrap();
        let first = SchemaTransformer::new(&mut index)
            .transform_section(&spec_schema(), "spec")
            .unwrap();
        let second = SchemaTransformer::new(&mut index)
            .transform_section(&spec_schema(), "spec")
            .unwrap();
        assert_eq!(first, second);
    }
}
