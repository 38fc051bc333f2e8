//! Composition assembly
//!
//! Each configured composition becomes a pipeline-mode Composition whose
//! patch-and-transform step composes a single managed resource.

use serde_json::{Map, Value, json};
use tracing::debug;
use xgen_core::{
    Composition, CrdVersionSchema, Patch, PatchSet, PatchType, PipelineStep, Transform,
    overlay::apply_override_fields,
};

use crate::condition::{ConditionData, evaluate_condition};
use crate::error::{GeneratorError, Result};
use crate::generator::{ClaimOutput, Generator, NamedComposition};

pub const COMPOSITION_API_VERSION: &str = "apiextensions.crossplane.io/v1";
pub const PATCH_AND_TRANSFORM_API_VERSION: &str = "pt.fn.crossplane.io/v1beta1";
pub const DEFAULT_PATCH_AND_TRANSFORM_FUNCTION: &str = "function-patch-and-transform";
pub const DEFAULT_AUTO_READY_FUNCTION: &str = "function-auto-ready";
pub const EXTERNAL_NAME_PATH: &str = "metadata.annotations[crossplane.io/external-name]";
pub const CONNECTION_SECRET_NAMESPACE: &str = "crossplane-system";

impl Generator<'_> {
    pub(crate) fn build_compositions(
        &self,
        version: &CrdVersionSchema,
        claim: &ClaimOutput,
    ) -> Result<Vec<NamedComposition>> {
        let patch_sets = self.patch_sets(claim);
        let pipeline_steps = self.additional_steps()?;

        self.config
            .compositions
            .iter()
            .map(|composition| -> Result<NamedComposition> {
                debug!(composition = %composition.name, "Building composition");
                Ok(NamedComposition {
                    name: composition.name.clone(),
                    manifest: self.build_composition(
                        composition,
                        version,
                        &patch_sets,
                        &pipeline_steps,
                    )?,
                })
            })
            .collect()
    }

    fn build_composition(
        &self,
        composition: &Composition,
        version: &CrdVersionSchema,
        patch_sets: &[PatchSet],
        additional: &[(bool, Value)],
    ) -> Result<Value> {
        let patch_and_transform = json!({
            "step": "patch-and-transform",
            "functionRef": {"name": self.patch_and_transform_function()},
            "input": {
                "apiVersion": PATCH_AND_TRANSFORM_API_VERSION,
                "kind": "Resources",
                "patchSets": serde_json::to_value(patch_sets)?,
                "resources": [self.composed_resource(version, patch_sets)?],
            }
        });

        let mut pipeline: Vec<Value> = additional
            .iter()
            .filter(|(before, _)| *before)
            .map(|(_, step)| step.clone())
            .collect();
        pipeline.push(patch_and_transform);
        pipeline.extend(
            additional
                .iter()
                .filter(|(before, _)| !*before)
                .map(|(_, step)| step.clone()),
        );
        if let Some(auto_ready) = self.auto_ready_step() {
            pipeline.push(auto_ready);
        }

        let mut labels = Map::new();
        labels.insert(
            format!("{}/provider", self.global.composition_identifier),
            json!(composition.provider),
        );

        let mut spec = json!({
            "compositeTypeRef": {
                "apiVersion": format!("{}/{}", self.config.group, self.config.version),
                "kind": format!("Composite{}", self.config.name),
            },
            "mode": "Pipeline",
            "pipeline": pipeline,
        });
        if self.config.connection_secret_keys.is_some() {
            spec["writeConnectionSecretsToNamespace"] = json!(CONNECTION_SECRET_NAMESPACE);
        }

        Ok(json!({
            "apiVersion": COMPOSITION_API_VERSION,
            "kind": "Composition",
            "metadata": {
                "name": self.composition_name(&composition.name),
                "labels": labels,
            },
            "spec": spec,
        }))
    }

    /// Named patch sets shared by every composition of the resource
    pub(crate) fn patch_sets(&self, claim: &ClaimOutput) -> Vec<PatchSet> {
        let mut sets = Vec::new();

        if self.config.patch_name != Some(false) {
            let to = if self.config.patch_external_name == Some(false) {
                "metadata.name"
            } else {
                EXTERNAL_NAME_PATH
            };
            sets.push(PatchSet::new(
                "Name",
                vec![Patch {
                    patch_type: PatchType::FromCompositeFieldPath,
                    from_field_path: Some("metadata.labels[crossplane.io/claim-name]".to_string()),
                    to_field_path: Some(to.to_string()),
                    ..Default::default()
                }],
            ));
        }

        sets.push(PatchSet::new(
            "External-Name",
            vec![Patch::copy(
                EXTERNAL_NAME_PATH,
                EXTERNAL_NAME_PATH,
                PatchType::FromCompositeFieldPath,
            )],
        ));
        sets.push(label_patch_set("Common", &self.global.labels.from_crd));
        sets.push(PatchSet::new("Parameters", claim.parameters.clone()));
        sets.push(PatchSet::new("Status", claim.status_patches.clone()));

        let labels = label_patch_set("Labels", &self.config.labels.from_crd);
        if !labels.patches.is_empty() {
            sets.push(labels);
        }

        sets
    }

    fn composed_resource(
        &self,
        version: &CrdVersionSchema,
        patch_sets: &[PatchSet],
    ) -> Result<Value> {
        let mut patches: Vec<Patch> =
            patch_sets.iter().map(|s| Patch::patch_set(&s.name)).collect();

        let uid_path = self.config.uid_field_path.clone().unwrap_or_else(|| {
            r#"metadata.annotations["crossplane.io/external-name"]"#.to_string()
        });
        patches.push(Patch::copy(uid_path, "status.uid", PatchType::ToCompositeFieldPath));
        patches.push(Patch::copy(
            "status.conditions",
            "status.observed.conditions",
            PatchType::ToCompositeFieldPath,
        ));

        let mut resource = Map::new();
        resource.insert(
            "name".to_string(),
            json!(self.config.resource_name.as_deref().unwrap_or(&self.crd.names.kind)),
        );
        resource.insert("base".to_string(), self.base(version));

        if let Some(keys) = &self.config.connection_secret_keys {
            patches.push(
                Patch::copy(
                    "metadata.uid",
                    "spec.writeConnectionSecretToRef.name",
                    PatchType::FromCompositeFieldPath,
                )
                .with_transform(Transform::format("%s-secret")),
            );
            let details: Vec<Value> = keys
                .iter()
                .map(|key| {
                    json!({
                        "name": key,
                        "type": "FromConnectionSecretKey",
                        "fromConnectionSecretKey": key,
                    })
                })
                .collect();
            resource.insert("connectionDetails".to_string(), Value::Array(details));
        }

        resource.insert("patches".to_string(), serde_json::to_value(patches)?);

        if self.config.readiness_checks == Some(false) {
            resource.insert("readinessChecks".to_string(), json!([{"type": "None"}]));
        }

        Ok(Value::Object(resource))
    }

    /// Base of the composed resource, with `overrideFields` applied
    pub(crate) fn base(&self, version: &CrdVersionSchema) -> Value {
        let mut spec = Map::new();
        let has_provider_config_ref = version
            .spec_schema()
            .is_some_and(|s| s.properties.contains_key("providerConfigRef"));
        if has_provider_config_ref {
            spec.insert("providerConfigRef".to_string(), json!({"name": "default"}));
        }
        if self.config.connection_secret_keys.is_some() {
            spec.insert(
                "writeConnectionSecretToRef".to_string(),
                json!({"namespace": CONNECTION_SECRET_NAMESPACE}),
            );
        }

        let mut metadata = Map::new();
        let labels = self.config.effective_common_labels(self.global);
        if !labels.is_empty() {
            metadata.insert("labels".to_string(), json!(labels));
        }

        let mut base = json!({
            "apiVersion": format!("{}/{}", self.crd.group, self.config.provider.crd.version),
            "kind": self.crd.names.kind,
            "metadata": metadata,
            "spec": spec,
        });
        apply_override_fields(&mut base, &self.config.override_fields);
        base
    }

    /// Rendered additional steps whose condition holds, flagged with
    /// whether they run before patch-and-transform
    fn additional_steps(&self) -> Result<Vec<(bool, Value)>> {
        let data = ConditionData {
            tag_property: self.config.tag_property.clone().unwrap_or_default(),
            tag_type: self.config.tag_type.clone().unwrap_or_default(),
        };

        let mut steps = Vec::new();
        for step in self.config.effective_pipeline_steps(self.global) {
            if step.condition.is_some() {
                let render = evaluate_condition(step.condition.as_deref(), &data).map_err(|source| {
                    GeneratorError::Condition {
                        step: step.step.clone(),
                        source,
                    }
                })?;
                if !render {
                    debug!(step = %step.step, "Condition is false, skipping step");
                    continue;
                }
            }
            steps.push((step.before, render_step(step, &data)));
        }
        Ok(steps)
    }

    fn auto_ready_step(&self) -> Option<Value> {
        let settings = self.config.effective_auto_ready(self.global);
        if settings.and_then(|s| s.generate) == Some(false) {
            return None;
        }

        let name = settings
            .and_then(|s| s.name.as_deref())
            .unwrap_or(DEFAULT_AUTO_READY_FUNCTION);
        Some(json!({
            "step": "automatically-detect-readiness",
            "functionRef": {"name": name},
        }))
    }

    fn patch_and_transform_function(&self) -> &str {
        self.config
            .patch_and_transfrom_function
            .as_deref()
            .unwrap_or(DEFAULT_PATCH_AND_TRANSFORM_FUNCTION)
    }
}

fn label_patch_set(name: &str, labels: &[String]) -> PatchSet {
    let patches = labels
        .iter()
        .map(|label| {
            let path = format!("metadata.labels['{}']", label);
            Patch::copy(path.clone(), path, PatchType::FromCompositeFieldPath)
        })
        .collect();
    PatchSet::new(name, patches)
}

fn render_step(step: &PipelineStep, data: &ConditionData) -> Value {
    let mut rendered = json!({
        "step": step.step,
        "functionRef": {"name": step.function_ref.name},
    });
    if !step.input.is_empty() {
        let input = Value::Object(step.input.clone().into_iter().collect());
        rendered["input"] = substitute(input, data);
    }
    rendered
}

/// Replace `{tagProperty}` and `{tagType}` in every key and string
fn substitute(value: Value, data: &ConditionData) -> Value {
    let replace = |s: &str| {
        s.replace("{tagProperty}", &data.tag_property)
            .replace("{tagType}", &data.tag_type)
    };

    match value {
        Value::String(s) => Value::String(replace(&s)),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| substitute(v, data)).collect())
        }
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (replace(&k), substitute(v, data)))
                .collect(),
        ),
        other => other,
    }
}
