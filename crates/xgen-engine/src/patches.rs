//! Patch generator
//!
//! Walks a claim schema and emits one patch per leaf field, ordered by
//! source path. Objects with declared properties are walked; arrays,
//! scalars and free-form maps are copied whole.

use xgen_core::{FieldPath, Patch, PatchType, SchemaProperty, Transform};

use crate::enums::transform_pairs;
use crate::error::{GeneratorError, Result};
use crate::overrides::{OverrideDefinition, OverrideIndex};

pub struct PatchGenerator<'a> {
    index: &'a OverrideIndex,
}

impl<'a> PatchGenerator<'a> {
    pub fn new(index: &'a OverrideIndex) -> Self {
        Self { index }
    }

    /// Patches for every leaf of `schema`, sorted by source path
    ///
    /// Claim to managed patch sets also carry the patches of fields kept
    /// out of the claim.
    pub fn generate(
        &self,
        schema: &SchemaProperty,
        base_path: &str,
        direction: PatchType,
    ) -> Result<Vec<Patch>> {
        let mut patches = Vec::new();
        self.collect(schema, &FieldPath::parse(base_path), direction, &mut patches)?;

        if direction == PatchType::FromCompositeFieldPath {
            for definition in self.index.ignored_in_claim() {
                patches.extend(definition_patches(definition, direction)?);
            }
        }

        patches.sort_by(|a, b| a.source_path().cmp(b.source_path()));
        Ok(patches)
    }

    fn collect(
        &self,
        schema: &SchemaProperty,
        path: &FieldPath,
        direction: PatchType,
        patches: &mut Vec<Patch>,
    ) -> Result<()> {
        if schema.is_structured_object() {
            for (key, child) in &schema.properties {
                self.collect(child, &path.child(key), direction, patches)?;
            }
            return Ok(());
        }

        let claim_path = path.to_string();
        match self.index.find_by_claim_path(&claim_path) {
            Some(definition) => {
                let generated = definition_patches(definition, direction)?;
                if generated.is_empty() {
                    let managed_path = definition.managed_path.clone();
                    patches.push(Patch::copy(claim_path, managed_path, direction));
                } else {
                    patches.extend(generated);
                }
            }
            None => patches.push(Patch::copy(claim_path.clone(), claim_path, direction)),
        }
        Ok(())
    }
}

/// Patches a definition asks for; empty when the generic copy applies
fn definition_patches(
    definition: &OverrideDefinition,
    direction: PatchType,
) -> Result<Vec<Patch>> {
    if let Some(patches) = definition.explicit_patches() {
        return Ok(patches.to_vec());
    }

    if definition.has_enum_edits() {
        let pairs = transform_pairs(definition).ok_or_else(|| GeneratorError::UnresolvedEnum {
            claim_path: definition.claim_path.clone(),
        })?;
        return Ok(vec![
            Patch::copy(definition.claim_path.clone(), definition.managed_path.clone(), direction)
                .with_transform(Transform::map(pairs)),
        ]);
    }

    // Status patches read their source from the managed resource, where a
    // renamed field only exists under its managed path. The copy keeps the
    // claim path as source, so renamed status fields are not filled.
    if definition.replacement {
        return Ok(vec![Patch::copy(
            definition.claim_path.clone(),
            definition.managed_path.clone(),
            direction,
        )]);
    }

    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use xgen_core::{
        EnumValue, EnumValueType, OverrideFieldInClaim, OverrideSettings, TransformType,
    };

    use crate::transform::SchemaTransformer;

    fn claim_schema() -> SchemaProperty {
        serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "size": {"type": "string"},
                "forProvider": {
                    "type": "object",
                    "properties": {
                        "region": {"type": "string"},
                        "labels": {"type": "object", "additionalProperties": {"type": "string"}},
                        "rules": {
                            "type": "array",
                            "items": {"type": "object", "properties": {"id": {"type": "string"}}}
                        }
                    }
                }
            }
        }))
        .unwrap()
    }

    fn paths(patches: &[Patch]) -> Vec<(&str, &str)> {
        patches
            .iter()
            .map(|p| (p.source_path(), p.to_field_path.as_deref().unwrap_or_default()))
            .collect()
    }

    #[test]
    fn test_leaf_copies_sorted() {
        let index = OverrideIndex::new(&[], &[]).unwrap();
        let patches = PatchGenerator::new(&index)
            .generate(&claim_schema(), "spec", PatchType::FromCompositeFieldPath)
            .unwrap();

        assert_eq!(
            paths(&patches),
            vec![
                ("spec.forProvider.labels", "spec.forProvider.labels"),
                ("spec.forProvider.region", "spec.forProvider.region"),
                ("spec.forProvider.rules", "spec.forProvider.rules"),
                ("spec.size", "spec.size"),
            ]
        );
        assert!(patches.iter().all(|p| p.policy.is_some()));
    }

    #[test]
    fn test_rename_patch() {
        let index = OverrideIndex::new(
            &[OverrideFieldInClaim {
                claim_path: "spec.size".to_string(),
                managed_path: Some("spec.forProvider.instanceSize".to_string()),
                ..Default::default()
            }],
            &[],
        )
        .unwrap();
        let patches = PatchGenerator::new(&index)
            .generate(&claim_schema(), "spec", PatchType::FromCompositeFieldPath)
            .unwrap();

        let size = patches.iter().find(|p| p.source_path() == "spec.size").unwrap();
        assert_eq!(size.to_field_path.as_deref(), Some("spec.forProvider.instanceSize"));
        assert_eq!(size.patch_type, PatchType::FromCompositeFieldPath);
    }

    #[test]
    fn test_renamed_status_field_keeps_claim_path_as_source() {
        let index = OverrideIndex::new(
            &[OverrideFieldInClaim {
                claim_path: "status.endpoint".to_string(),
                managed_path: Some("status.atProvider.address".to_string()),
                ..Default::default()
            }],
            &[],
        )
        .unwrap();
        let status = SchemaProperty::object(BTreeMap::from([(
            "endpoint".to_string(),
            SchemaProperty::string(),
        )]));

        let patches = PatchGenerator::new(&index)
            .generate(&status, "status", PatchType::ToCompositeFieldPath)
            .unwrap();

        assert_eq!(paths(&patches), vec![("status.endpoint", "status.atProvider.address")]);
        assert_eq!(patches[0].patch_type, PatchType::ToCompositeFieldPath);
    }

    #[test]
    fn test_explicit_patches_replace_generated_one() {
        let custom = Patch::copy(
            "spec.size",
            "spec.forProvider.nodeType",
            PatchType::FromCompositeFieldPath,
        )
            .with_transform(Transform::format("db.%s"));
        let index = OverrideIndex::new(
            &[OverrideFieldInClaim {
                claim_path: "spec.size".to_string(),
                override_settings: Some(OverrideSettings {
                    patches: Some(vec![custom.clone()]),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            &[],
        )
        .unwrap();
        let patches = PatchGenerator::new(&index)
            .generate(&claim_schema(), "spec", PatchType::FromCompositeFieldPath)
            .unwrap();

        assert_eq!(patches.iter().filter(|p| p.source_path() == "spec.size").count(), 1);
        assert!(patches.contains(&custom));
    }

    #[test]
    fn test_ignored_definition_patches_only_towards_managed() {
        let hidden = OverrideFieldInClaim {
            claim_path: "spec.owner".to_string(),
            managed_path: Some("spec.forProvider.owner".to_string()),
            ignore: true,
            ..Default::default()
        };
        let index = OverrideIndex::new(&[hidden], &[]).unwrap();
        let generator = PatchGenerator::new(&index);

        let parameters = generator
            .generate(&claim_schema(), "spec", PatchType::FromCompositeFieldPath)
            .unwrap();
        assert!(parameters.iter().any(|p| p.source_path() == "spec.owner"));

        let status = generator
            .generate(&claim_schema(), "spec", PatchType::ToCompositeFieldPath)
            .unwrap();
        assert!(!status.iter().any(|p| p.source_path() == "spec.owner"));
    }

    #[test]
    fn test_enum_edit_emits_map_transform() {
        let declaration = OverrideFieldInClaim {
            claim_path: "spec.forProvider.region".to_string(),
            override_settings: Some(OverrideSettings {
                enum_values: Some(vec![
                    EnumValue {
                        value: json!("eu"),
                        type_: EnumValueType::Map,
                        map_to: Some(json!("eu-west-1")),
                    },
                    EnumValue {
                        value: json!("us"),
                        type_: EnumValueType::Add,
                        map_to: Some(json!("us-east-1")),
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let managed: SchemaProperty = serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "forProvider": {
                    "type": "object",
                    "properties": {"region": {"type": "string", "enum": ["eu", "ap-south-1"]}}
                }
            }
        }))
        .unwrap();

        let mut index = OverrideIndex::new(&[declaration], &[]).unwrap();
        let claim = SchemaTransformer::new(&mut index)
            .transform_section(&managed, "spec")
            .unwrap();
        let patches = PatchGenerator::new(&index)
            .generate(&claim, "spec", PatchType::FromCompositeFieldPath)
            .unwrap();

        assert_eq!(patches.len(), 1);
        let transform = &patches[0].transforms[0];
        assert_eq!(transform.type_, TransformType::Map);
        assert_eq!(
            transform.map.as_ref().unwrap(),
            &BTreeMap::from([
                ("ap-south-1".to_string(), json!("ap-south-1")),
                ("eu".to_string(), json!("eu-west-1")),
                ("us".to_string(), json!("us-east-1")),
            ])
        );
    }

    #[test]
    fn test_unresolved_enum_edit_fails() {
        let declaration = OverrideFieldInClaim {
            claim_path: "spec.size".to_string(),
            override_settings: Some(OverrideSettings {
                enum_values: Some(vec![EnumValue {
                    value: json!("small"),
                    type_: EnumValueType::Remove,
                    map_to: None,
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let index = OverrideIndex::new(&[declaration], &[]).unwrap();
        let err = PatchGenerator::new(&index)
            .generate(&claim_schema(), "spec", PatchType::FromCompositeFieldPath)
            .unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::UnresolvedEnum { claim_path } if claim_path == "spec.size"
        ));
    }

    fn schema_from(fields: &[(String, bool)]) -> SchemaProperty {
        let mut properties = BTreeMap::new();
        for (name, nested) in fields {
            let child = if *nested {
                let value = SchemaProperty::string();
                SchemaProperty::object(BTreeMap::from([("value".to_string(), value)]))
            } else {
                SchemaProperty::integer()
            };
            properties.insert(name.clone(), child);
        }
        SchemaProperty::object(properties)
    }

    proptest! {
        #[test]
        fn patch_order_ignores_field_insertion_order(
            fields in proptest::collection::vec(("[a-e]{1,3}", any::<bool>()), 1..12),
            seed in any::<u64>(),
        ) {
            let unique: BTreeMap<String, bool> = fields.into_iter().collect();
            let mut fields: Vec<(String, bool)> = unique.into_iter().collect();
            let forward = schema_from(&fields);
            let len = fields.len();
            fields.rotate_left((seed as usize) % len);
            fields.reverse();
            let shuffled = schema_from(&fields);

            let index = OverrideIndex::new(&[], &[]).unwrap();
            let generator = PatchGenerator::new(&index);
            let direction = PatchType::FromCompositeFieldPath;
            let a = generator.generate(&forward, "spec", direction).unwrap();
            let b = generator.generate(&shuffled, "spec", direction).unwrap();

            prop_assert_eq!(&a, &b);
            prop_assert!(a.windows(2).all(|w| w[0].source_path() <= w[1].source_path()));
        }
    }
}
