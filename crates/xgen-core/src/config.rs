//! Generator configuration
//!
//! Two files drive a generation run:
//! - `generator.yaml` (`GeneratorConfig`): settings shared by every resource
//! - `generate.yaml` (`ResourceConfig`): one managed resource to publish as a claim
//!
//! Resource settings win over global ones; see the `effective_*` helpers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::patch::Patch;
use crate::schema::SchemaProperty;

/// Literal value injected into the composed resource base
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverrideField {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Hide the field from the claim instead of (or in addition to) setting it
    #[serde(default)]
    pub ignore: bool,
}

/// How one claim field relates to the managed resource
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideFieldInClaim {
    pub claim_path: String,
    /// Location on the managed resource, when it differs from `claim_path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_path: Option<String>,
    /// Keep the field off the claim; its patches still apply
    #[serde(default)]
    pub ignore: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_settings: Option<OverrideSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSettings {
    /// Replacement schema for the claim field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<SchemaProperty>,
    /// Patches used instead of the generated ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patches: Option<Vec<Patch>>,
    /// Edits of an existing enumeration
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<EnumValue>>,
    /// Enumeration for a field that has none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_enum: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumValueType {
    Add,
    Remove,
    Map,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub value: Value,
    #[serde(rename = "type")]
    pub type_: EnumValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_to: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub name: String,
    pub provider: String,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalProviderConfig {
    pub name: String,
    pub version: String,
    #[serde(rename = "baseURL", default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrdConfig {
    pub file: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub crd: CrdConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelConfig {
    /// Claim labels copied onto the managed resource
    #[serde(rename = "fromCRD", default, skip_serializing_if = "Vec::is_empty")]
    pub from_crd: Vec<String>,
    /// Labels set on every managed resource
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub common: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AutoReadyFunction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineFunction {
    pub name: String,
}

/// Extra composition function step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStep {
    pub step: String,
    pub function_ref: PipelineFunction,
    /// Expression over `tagProperty`/`tagType`; the step is skipped unless it holds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub input: BTreeMap<String, Value>,
    /// Place the step before the patch-and-transform step
    #[serde(default)]
    pub before: bool,
}

/// Global `generator.yaml`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    #[serde(default)]
    pub composition_identifier: String,
    #[serde(default)]
    pub provider: GlobalProviderConfig,
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand_composition_name: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_pipeline_steps: Option<Vec<PipelineStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_ready_function: Option<AutoReadyFunction>,
}

impl GeneratorConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Per-resource `generate.yaml`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    pub group: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_external_name: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_name: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_secret_keys: Option<Vec<String>>,
    #[serde(default)]
    pub compositions: Vec<Composition>,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub override_fields: Vec<OverrideField>,
    #[serde(default)]
    pub override_fields_in_claim: Vec<OverrideFieldInClaim>,
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_checks: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid_field_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand_composition_name: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_pipeline_steps: Option<Vec<PipelineStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_ready_function: Option<AutoReadyFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_and_transfrom_function: Option<String>,
}

impl ResourceConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn effective_expand_composition_name(&self, global: &GeneratorConfig) -> bool {
        self.expand_composition_name
            .or(global.expand_composition_name)
            .unwrap_or(false)
    }

    pub fn effective_pipeline_steps<'a>(
        &'a self,
        global: &'a GeneratorConfig,
    ) -> &'a [PipelineStep] {
        self.additional_pipeline_steps
            .as_deref()
            .or(global.additional_pipeline_steps.as_deref())
            .unwrap_or_default()
    }

    pub fn effective_auto_ready<'a>(
        &'a self,
        global: &'a GeneratorConfig,
    ) -> Option<&'a AutoReadyFunction> {
        self.auto_ready_function
            .as_ref()
            .or(global.auto_ready_function.as_ref())
    }

    /// Common labels: global first, resource entries overriding
    pub fn effective_common_labels(&self, global: &GeneratorConfig) -> BTreeMap<String, String> {
        let mut labels = global.labels.common.clone();
        labels.extend(self.labels.common.clone());
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GENERATE_YAML: &str = r#"
group: storage.example.cloud
name: Bucket
version: v1alpha1
provider:
  crd:
    file: crd.yaml
    version: v1beta1
compositions:
  - name: bucket-aws
    provider: aws
    default: true
connectionSecretKeys: [endpoint]
overrideFields:
  - path: spec.forProvider.forceDestroy
    value: true
  - path: spec.forProvider.objectLockEnabled
    ignore: true
overrideFieldsInClaim:
  - claimPath: spec.region
    managedPath: spec.forProvider.region
  - claimPath: spec.forProvider.acl
    overrideSettings:
      enum:
        - value: private
          type: remove
        - value: internal
          type: add
          mapTo: authenticated-read
additionalPipelineSteps:
  - step: tag-manager
    functionRef:
      name: function-tag-manager
    condition: tagType == "tags"
    input:
      property: "{tagProperty}"
"#;

    #[test]
    fn test_parse_resource_config() {
        let config = ResourceConfig::from_yaml(GENERATE_YAML).unwrap();

        assert_eq!(config.name, "Bucket");
        assert_eq!(config.provider.crd.version, "v1beta1");
        assert_eq!(config.override_fields[0].value, Some(json!(true)));
        assert!(config.override_fields[1].ignore);

        let rename = &config.override_fields_in_claim[0];
        assert_eq!(rename.managed_path.as_deref(), Some("spec.forProvider.region"));

        let enum_edit = config.override_fields_in_claim[1]
            .override_settings
            .as_ref()
            .and_then(|s| s.enum_values.as_ref())
            .unwrap();
        assert_eq!(enum_edit[0].type_, EnumValueType::Remove);
        assert_eq!(enum_edit[1].map_to, Some(json!("authenticated-read")));

        let step = &config.additional_pipeline_steps.as_ref().unwrap()[0];
        assert_eq!(step.condition.as_deref(), Some("tagType == \"tags\""));
        assert!(!step.before);
    }

    #[test]
    fn test_resource_settings_win_over_global() {
        let global = GeneratorConfig::from_yaml(
            r#"
compositionIdentifier: example.cloud
expandCompositionName: true
labels:
  common:
    team: platform
    tier: shared
"#,
        )
        .unwrap();

        let mut config = ResourceConfig::from_yaml(GENERATE_YAML).unwrap();
        assert!(config.effective_expand_composition_name(&global));
        assert_eq!(config.effective_pipeline_steps(&global).len(), 1);

        config.expand_composition_name = Some(false);
        config.labels.common.insert("tier".into(), "dedicated".into());
        assert!(!config.effective_expand_composition_name(&global));

        let labels = config.effective_common_labels(&global);
        assert_eq!(labels["team"], "platform");
        assert_eq!(labels["tier"], "dedicated");
    }
}
