//! Resource generator
//!
//! Produces the CompositeResourceDefinition and the Compositions of one
//! `generate.yaml` resource from its CRD.

use serde_json::Value;
use tracing::{debug, info};
use xgen_core::{
    CrdSchema, CrdVersionSchema, GeneratorConfig, Patch, PatchType, ResourceConfig, SchemaProperty,
};

use crate::error::{GeneratorError, Result};
use crate::mapper::ClaimMapper;

/// A rendered Composition with the name used for its output file
#[derive(Debug, Clone, PartialEq)]
pub struct NamedComposition {
    pub name: String,
    pub manifest: Value,
}

/// Everything generated for one resource
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedResource {
    pub definition: Value,
    pub compositions: Vec<NamedComposition>,
}

/// Claim schemas and patch sets of one resource
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimOutput {
    pub spec: SchemaProperty,
    pub status: SchemaProperty,
    pub parameters: Vec<Patch>,
    pub status_patches: Vec<Patch>,
}

pub struct Generator<'a> {
    pub(crate) config: &'a ResourceConfig,
    pub(crate) global: &'a GeneratorConfig,
    pub(crate) crd: &'a CrdSchema,
}

impl<'a> Generator<'a> {
    pub fn new(
        config: &'a ResourceConfig,
        global: &'a GeneratorConfig,
        crd: &'a CrdSchema,
    ) -> Self {
        Self { config, global, crd }
    }

    pub fn generate(&self) -> Result<GeneratedResource> {
        info!(kind = %self.config.name, group = %self.config.group, "Generating resource");

        let version = self.crd_version()?;
        let claim = self.claim()?;
        let definition = self.build_definition(version, &claim)?;
        let compositions = self.build_compositions(version, &claim)?;

        Ok(GeneratedResource {
            definition,
            compositions,
        })
    }

    /// Build claim schemas and patch sets
    pub fn claim(&self) -> Result<ClaimOutput> {
        let version = self.crd_version()?;
        let mut mapper = ClaimMapper::from_config(self.config)?;

        let spec = mapper.claim_schema(version.section("spec")?, "spec")?;
        let managed_status = version.section("status").cloned().unwrap_or_else(|_| {
            debug!(version = %version.name, "CRD has no status schema");
            SchemaProperty::object(Default::default())
        });
        let status = mapper.claim_schema(&managed_status, "status")?;

        let parameters = mapper.patch_set(&spec, "spec", PatchType::FromCompositeFieldPath)?;
        let status_patches = mapper.patch_set(&status, "status", PatchType::ToCompositeFieldPath)?;
        debug!(
            parameters = parameters.len(),
            status = status_patches.len(),
            "Generated patch sets"
        );

        Ok(ClaimOutput {
            spec,
            status,
            parameters,
            status_patches,
        })
    }

    pub(crate) fn crd_version(&self) -> Result<&'a CrdVersionSchema> {
        Ok(self.crd.version(&self.config.provider.crd.version)?)
    }

    /// Claim plural: configured plural, else the name with a `y` suffix
    /// turned into `ies` or an `s` appended
    pub fn plural(&self) -> String {
        if let Some(plural) = &self.config.plural {
            return plural.to_lowercase();
        }

        let name = self.config.name.to_lowercase();
        match name.strip_suffix('y') {
            Some(stem) => format!("{}ies", stem),
            None => format!("{}s", name),
        }
    }

    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.plural(), self.config.group)
    }

    pub(crate) fn expand_names(&self) -> bool {
        self.config.effective_expand_composition_name(self.global)
    }

    /// Composition name as published in the cluster
    pub fn composition_name(&self, name: &str) -> String {
        if self.expand_names() {
            format!("composite{}.{}", name, self.config.group)
        } else {
            name.to_string()
        }
    }

    pub(crate) fn default_composition_name(&self) -> Result<String> {
        let defaults: Vec<_> = self.config.compositions.iter().filter(|c| c.default).collect();
        match defaults.as_slice() {
            [composition] => Ok(self.composition_name(&composition.name)),
            _ => Err(GeneratorError::DefaultComposition {
                found: defaults.len(),
            }),
        }
    }

    pub(crate) fn categories(&self) -> Vec<String> {
        let group_label = self.config.group.split('.').next().unwrap_or_default();
        vec![
            "crossplane".to_string(),
            "composition".to_string(),
            group_label.to_string(),
        ]
    }
}
