//! CRD YAML parser
//!
//! Parses CustomResourceDefinition manifests into `CrdSchema`. The envelope
//! (names, versions, printer columns) is read field by field; the
//! `openAPIV3Schema` of each version is deserialized into `SchemaProperty`.

use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::schema::{CrdNames, CrdSchema, CrdVersionSchema, PrinterColumn, SchemaProperty};

/// Parser for CRD YAML manifests
pub struct CrdParser;

impl CrdParser {
    /// Parse a CRD YAML manifest
    pub fn parse(yaml: &str) -> Result<CrdSchema> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::parse_value(&value)
    }

    /// Load and parse a CRD file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<CrdSchema> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse from a serde_json::Value
    pub fn parse_value(value: &Value) -> Result<CrdSchema> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("Missing 'kind' field"))?;

        if kind != "CustomResourceDefinition" {
            return Err(CoreError::invalid_crd(format!(
                "Expected CustomResourceDefinition, got {}",
                kind
            )));
        }

        let name = value
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("Missing 'metadata.name' field"))?
            .to_string();

        let spec = value
            .get("spec")
            .ok_or_else(|| CoreError::invalid_crd("Missing 'spec' field"))?;

        let group = spec
            .get("group")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("Missing 'spec.group' field"))?
            .to_string();

        let scope = spec
            .get("scope")
            .and_then(Value::as_str)
            .unwrap_or("Namespaced")
            .to_string();

        let names = Self::parse_names(spec.get("names"))?;
        let versions = Self::parse_versions(spec.get("versions"))?;

        Ok(CrdSchema {
            name,
            group,
            scope,
            names,
            versions,
        })
    }

    fn parse_names(names_value: Option<&Value>) -> Result<CrdNames> {
        let names =
            names_value.ok_or_else(|| CoreError::invalid_crd("Missing 'spec.names' field"))?;

        let kind = names
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("Missing 'spec.names.kind' field"))?
            .to_string();

        Ok(CrdNames {
            kind,
            plural: names
                .get("plural")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            singular: names
                .get("singular")
                .and_then(Value::as_str)
                .map(String::from),
            short_names: string_list(names.get("shortNames")),
            categories: string_list(names.get("categories")),
        })
    }

    fn parse_versions(versions_value: Option<&Value>) -> Result<Vec<CrdVersionSchema>> {
        let versions = versions_value
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::invalid_crd("Missing 'spec.versions' array"))?;

        versions.iter().map(Self::parse_version).collect()
    }

    fn parse_version(version: &Value) -> Result<CrdVersionSchema> {
        let name = version
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::invalid_crd("Version missing 'name' field"))?
            .to_string();

        let served = version
            .get("served")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let storage = version
            .get("storage")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let schema = version
            .get("schema")
            .and_then(|s| s.get("openAPIV3Schema"))
            .map(|s| serde_json::from_value::<SchemaProperty>(s.clone()))
            .transpose()?;

        let printer_columns = version
            .get("additionalPrinterColumns")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|c| serde_json::from_value::<PrinterColumn>(c.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Ok(CrdVersionSchema {
            name,
            served,
            storage,
            schema,
            printer_columns,
        })
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
