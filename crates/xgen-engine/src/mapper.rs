//! Claim mapper
//!
//! Owns the override index of one generation run. Build the claim schema
//! of a section before asking for its patch set: enum edits are resolved
//! while the schema is built.

use xgen_core::{
    OverrideField, OverrideFieldInClaim, Patch, PatchType, ResourceConfig, SchemaProperty,
};

use crate::error::Result;
use crate::overrides::OverrideIndex;
use crate::patches::PatchGenerator;
use crate::transform::SchemaTransformer;

#[derive(Debug, Clone)]
pub struct ClaimMapper {
    index: OverrideIndex,
}

impl ClaimMapper {
    pub fn new(
        declarations: &[OverrideFieldInClaim],
        override_fields: &[OverrideField],
    ) -> Result<Self> {
        Ok(Self {
            index: OverrideIndex::new(declarations, override_fields)?,
        })
    }

    pub fn from_config(config: &ResourceConfig) -> Result<Self> {
        Self::new(&config.override_fields_in_claim, &config.override_fields)
    }

    /// Claim schema of a managed schema section (`spec` or `status`)
    pub fn claim_schema(
        &mut self,
        managed: &SchemaProperty,
        section: &str,
    ) -> Result<SchemaProperty> {
        SchemaTransformer::new(&mut self.index).transform_section(managed, section)
    }

    /// Sorted patches between the claim and the managed resource
    pub fn patch_set(
        &self,
        claim: &SchemaProperty,
        section: &str,
        direction: PatchType,
    ) -> Result<Vec<Patch>> {
        PatchGenerator::new(&self.index).generate(claim, section, direction)
    }

    pub fn index(&self) -> &OverrideIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn managed_spec() -> SchemaProperty {
        serde_json::from_value(json!({
            "type": "object",
            "required": ["forProvider", "internal"],
            "properties": {
                "forProvider": {
                    "type": "object",
                    "properties": {
                        "instanceSize": {"type": "string"},
                        "engine": {"type": "string", "enum": ["a", "b", "c"]}
                    }
                },
                "internal": {"type": "string"}
            }
        }))
        .unwrap()
    }

    fn from_yaml(yaml: &str) -> Vec<OverrideFieldInClaim> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_rename_scenario() {
        let mut mapper = ClaimMapper::new(
            &from_yaml("- claimPath: spec.size\n  managedPath: spec.forProvider.instanceSize\n"),
            &[],
        )
        .unwrap();

        let claim = mapper.claim_schema(&managed_spec(), "spec").unwrap();
        assert!(claim.properties.contains_key("size"));
        assert!(!claim.properties["forProvider"].properties.contains_key("instanceSize"));

        let patches = mapper
            .patch_set(&claim, "spec", PatchType::FromCompositeFieldPath)
            .unwrap();
        let size = patches.iter().find(|p| p.source_path() == "spec.size").unwrap();
        assert_eq!(size.to_field_path.as_deref(), Some("spec.forProvider.instanceSize"));
    }

    #[test]
    fn test_ignore_scenario() {
        let mut mapper = ClaimMapper::new(
            &from_yaml("- claimPath: spec.internal\n  ignore: true\n"),
            &[],
        )
        .unwrap();

        let claim = mapper.claim_schema(&managed_spec(), "spec").unwrap();
        assert!(!claim.properties.contains_key("internal"));
        assert_eq!(claim.required, vec!["forProvider"]);

        let patches = mapper
            .patch_set(&claim, "spec", PatchType::FromCompositeFieldPath)
            .unwrap();
        assert!(patches.iter().all(|p| p.source_path() != "spec.internal"));
    }

    #[test]
    fn test_enum_edit_scenario() {
        let mut mapper = ClaimMapper::new(
            &from_yaml(
                r#"
- claimPath: spec.forProvider.engine
  overrideSettings:
    enum:
      - value: b
        type: remove
      - value: d
        type: add
"#,
            ),
            &[],
        )
        .unwrap();

        let claim = mapper.claim_schema(&managed_spec(), "spec").unwrap();
        assert_eq!(
            claim.properties["forProvider"].properties["engine"].enum_values,
            Some(vec![json!("a"), json!("c"), json!("d")])
        );

        let table = mapper
            .index()
            .find_by_claim_path("spec.forProvider.engine")
            .and_then(|d| d.enum_table.as_ref())
            .unwrap();
        assert!(table.get("a").is_none());
        assert!(table.get("b").is_none());
        assert!(table.get("c").is_none());

        let patches = mapper
            .patch_set(&claim, "spec", PatchType::FromCompositeFieldPath)
            .unwrap();
        let engine = patches
            .iter()
            .find(|p| p.source_path() == "spec.forProvider.engine")
            .unwrap();
        let pairs = engine.transforms[0].map.as_ref().unwrap();
        let keys: Vec<&str> = pairs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "c", "d"]);
        assert_eq!(pairs["d"], json!("d"));
    }
}
