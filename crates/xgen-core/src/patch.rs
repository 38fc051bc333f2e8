//! Patch rules exchanged with the patch-and-transform composition function
//!
//! These mirror the `pt.fn.crossplane.io/v1beta1` input types closely enough
//! to round-trip user supplied patches and to emit generated ones.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Patch type; for field copies this is also the direction of the patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PatchType {
    /// Claim (composite) to managed resource
    #[default]
    FromCompositeFieldPath,
    /// Managed resource back to the claim (composite)
    ToCompositeFieldPath,
    CombineFromComposite,
    CombineToComposite,
    FromEnvironmentFieldPath,
    ToEnvironmentFieldPath,
    /// Reference to a named patch set
    PatchSet,
}

/// What to do when the source field is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FromFieldPathPolicy {
    Optional,
    Required,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_field_path: Option<FromFieldPathPolicy>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PatchPolicy {
    pub fn optional() -> Self {
        Self {
            from_field_path: Some(FromFieldPathPolicy::Optional),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformType {
    Map,
    Match,
    Math,
    String,
    Convert,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StringTransform {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fmt: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A value transform applied between source and destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(rename = "type")]
    pub type_: TransformType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<StringTransform>,
    /// Settings of transform types the generator only passes through
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Transform {
    /// Map transform from canonical source strings to replacement values
    pub fn map(pairs: BTreeMap<String, Value>) -> Self {
        Self {
            type_: TransformType::Map,
            map: Some(pairs),
            string: None,
            extra: BTreeMap::new(),
        }
    }

    /// `Format` string transform (e.g. `%s-secret`)
    pub fn format(fmt: impl Into<String>) -> Self {
        Self {
            type_: TransformType::String,
            map: None,
            string: Some(StringTransform {
                type_: "Format".to_string(),
                fmt: Some(fmt.into()),
                extra: BTreeMap::new(),
            }),
            extra: BTreeMap::new(),
        }
    }
}

/// A single patch rule
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    #[serde(rename = "type", default)]
    pub patch_type: PatchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_field_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_field_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_set_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combine: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PatchPolicy>,
}

impl Patch {
    /// Copy a field, tolerating an absent source
    pub fn copy(
        from: impl Into<String>,
        to: impl Into<String>,
        patch_type: PatchType,
    ) -> Self {
        Self {
            patch_type,
            from_field_path: Some(from.into()),
            to_field_path: Some(to.into()),
            policy: Some(PatchPolicy::optional()),
            ..Default::default()
        }
    }

    /// Reference a named patch set
    pub fn patch_set(name: impl Into<String>) -> Self {
        Self {
            patch_type: PatchType::PatchSet,
            patch_set_name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Key the generated patch lists are ordered by
    pub fn source_path(&self) -> &str {
        self.from_field_path.as_deref().unwrap_or_default()
    }
}

/// A named, reusable list of patches
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatchSet {
    pub name: String,
    pub patches: Vec<Patch>,
}

impl PatchSet {
    pub fn new(name: impl Into<String>, patches: Vec<Patch>) -> Self {
        Self {
            name: name.into(),
            patches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_copy_patch_serializes_like_function_input() {
        let patch = Patch::copy(
            "spec.size",
            "spec.forProvider.instanceSize",
            PatchType::FromCompositeFieldPath,
        );

        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({
                "type": "FromCompositeFieldPath",
                "fromFieldPath": "spec.size",
                "toFieldPath": "spec.forProvider.instanceSize",
                "policy": {"fromFieldPath": "Optional"}
            })
        );
    }

    #[test]
    fn test_user_patch_with_foreign_transform_is_kept() {
        let yaml = r#"
type: CombineFromComposite
combine:
  variables:
    - fromFieldPath: spec.a
    - fromFieldPath: spec.b
  strategy: string
  string:
    fmt: "%s-%s"
toFieldPath: spec.forProvider.name
transforms:
  - type: math
    math:
      multiply: 2
"#;
        let patch: Patch = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(patch.patch_type, PatchType::CombineFromComposite);
        assert_eq!(patch.source_path(), "");
        assert_eq!(patch.transforms[0].type_, TransformType::Math);
        assert_eq!(
            patch.transforms[0].extra.get("math"),
            Some(&json!({"multiply": 2}))
        );
    }

    #[test]
    fn test_default_patch_type() {
        let patch: Patch =
            serde_yaml::from_str("fromFieldPath: spec.a\ntoFieldPath: spec.b\n").unwrap();
        assert_eq!(patch.patch_type, PatchType::FromCompositeFieldPath);
    }
}
