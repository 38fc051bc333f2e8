//! CompositeResourceDefinition assembly

use serde_json::{Map, Value, json};
use xgen_core::{CrdVersionSchema, PrinterColumn, PropertyType, SchemaProperty};

use crate::error::Result;
use crate::generator::{ClaimOutput, Generator};

pub const XRD_API_VERSION: &str = "apiextensions.crossplane.io/v1";

impl Generator<'_> {
    pub(crate) fn build_definition(
        &self,
        version: &CrdVersionSchema,
        claim: &ClaimOutput,
    ) -> Result<Value> {
        let plural = self.plural();
        let status = self.published_status(&claim.status);

        let mut served = json!({
            "name": self.config.version,
            "referenceable": true,
            "served": true,
            "schema": {
                "openAPIV3Schema": {
                    "properties": {
                        "spec": serde_json::to_value(&claim.spec)?,
                        "status": serde_json::to_value(&status)?,
                    }
                }
            }
        });

        let columns = printer_columns(&version.printer_columns);
        if !columns.is_empty() {
            served["additionalPrinterColumns"] = serde_json::to_value(columns)?;
        }

        let mut spec = Map::new();
        spec.insert(
            "claimNames".to_string(),
            json!({"kind": self.config.name, "plural": plural}),
        );
        if let Some(keys) = &self.config.connection_secret_keys {
            spec.insert("connectionSecretKeys".to_string(), json!(keys));
        }
        spec.insert(
            "defaultCompositionRef".to_string(),
            json!({"name": self.default_composition_name()?}),
        );
        spec.insert("group".to_string(), json!(self.config.group));
        spec.insert(
            "names".to_string(),
            json!({
                "kind": format!("Composite{}", self.config.name),
                "plural": format!("composite{}", plural),
                "categories": self.categories(),
            }),
        );
        spec.insert("versions".to_string(), json!([served]));

        Ok(json!({
            "apiVersion": XRD_API_VERSION,
            "kind": "CompositeResourceDefinition",
            "metadata": {"name": format!("composite{}", self.fqdn())},
            "spec": spec,
        }))
    }

    /// Status claim schema plus the fields every composite reports
    fn published_status(&self, status: &SchemaProperty) -> SchemaProperty {
        let mut status = status.clone();

        status.properties.insert(
            "observed".to_string(),
            SchemaProperty {
                type_: Some(PropertyType::Object),
                description: Some(
                    "Freeform field containing information about the observed status."
                        .to_string(),
                ),
                x_preserve_unknown: Some(true),
                ..Default::default()
            },
        );
        status.properties.insert(
            "uid".to_string(),
            SchemaProperty {
                description: Some(format!(
                    "The unique ID of this {} resource reported by the provider",
                    self.config.name
                )),
                ..SchemaProperty::string()
            },
        );

        status
    }
}

/// Printer columns without the ones reading `.status.conditions`
fn printer_columns(columns: &[PrinterColumn]) -> Vec<&PrinterColumn> {
    columns
        .iter()
        .filter(|c| !c.json_path.starts_with(".status.conditions"))
        .collect()
}
