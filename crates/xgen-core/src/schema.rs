//! CRD schema representation
//!
//! Structured types for the parts of a CustomResourceDefinition the generator
//! reads. `SchemaProperty` models the OpenAPI v3 fields the claim mapper
//! interprets and carries every other attribute through untouched, so a
//! schema survives a parse/serialize cycle without loss.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{CoreError, Result};

/// A parsed CustomResourceDefinition
#[derive(Debug, Clone, PartialEq)]
pub struct CrdSchema {
    /// Full CRD name (e.g., "buckets.s3.aws.upbound.io")
    pub name: String,
    /// API group (e.g., "s3.aws.upbound.io")
    pub group: String,
    /// Resource scope as declared ("Namespaced" or "Cluster")
    pub scope: String,
    /// Resource names
    pub names: CrdNames,
    /// API versions with their schemas
    pub versions: Vec<CrdVersionSchema>,
}

impl CrdSchema {
    /// Look up a version by name
    pub fn version(&self, name: &str) -> Result<&CrdVersionSchema> {
        self.versions
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| CoreError::MissingVersion {
                version: name.to_string(),
            })
    }
}

/// CRD naming information
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrdNames {
    pub kind: String,
    pub plural: String,
    pub singular: Option<String>,
    pub short_names: Vec<String>,
    pub categories: Vec<String>,
}

/// A single API version of a CRD
#[derive(Debug, Clone, PartialEq)]
pub struct CrdVersionSchema {
    pub name: String,
    pub served: bool,
    pub storage: bool,
    /// Root `openAPIV3Schema`
    pub schema: Option<SchemaProperty>,
    pub printer_columns: Vec<PrinterColumn>,
}

impl CrdVersionSchema {
    /// Get a root section (`spec`, `status`) of the schema
    pub fn section(&self, name: &str) -> Result<&SchemaProperty> {
        self.schema
            .as_ref()
            .and_then(|s| s.properties.get(name))
            .ok_or_else(|| CoreError::MissingSection {
                version: self.name.clone(),
                section: name.to_string(),
            })
    }

    /// Get the root spec schema if present
    pub fn spec_schema(&self) -> Option<&SchemaProperty> {
        self.schema.as_ref().and_then(|s| s.properties.get("spec"))
    }
}

/// Printer column for kubectl output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub json_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

/// Schema for a single property
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaProperty {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<PropertyType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Allowed values
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// Nested object properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaProperty>,

    /// Required nested property names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Array item schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaProperty>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    /// CEL validation rules
    #[serde(
        rename = "x-kubernetes-validations",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub x_validations: Vec<ValidationRule>,

    #[serde(
        rename = "x-kubernetes-preserve-unknown-fields",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub x_preserve_unknown: Option<bool>,

    /// Attributes not interpreted by the generator (format, pattern, bounds, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SchemaProperty {
    pub fn string() -> Self {
        Self {
            type_: Some(PropertyType::String),
            ..Default::default()
        }
    }

    pub fn integer() -> Self {
        Self {
            type_: Some(PropertyType::Integer),
            ..Default::default()
        }
    }

    /// Create an object property with nested properties
    pub fn object(properties: BTreeMap<String, SchemaProperty>) -> Self {
        Self {
            type_: Some(PropertyType::Object),
            properties,
            ..Default::default()
        }
    }

    /// Create an array property with item schema
    pub fn array(items: SchemaProperty) -> Self {
        Self {
            type_: Some(PropertyType::Array),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn with_required(mut self, required: &[&str]) -> Self {
        self.required = required.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn is_object(&self) -> bool {
        self.type_ == Some(PropertyType::Object)
    }

    /// Objects whose fields are walked one by one (not free-form maps)
    pub fn is_structured_object(&self) -> bool {
        self.is_object() && self.additional_properties.is_none()
    }

    /// Get a nested property by path (dot-separated)
    pub fn get_nested(&self, path: &str) -> Option<&SchemaProperty> {
        let mut current = self;
        for part in path.split('.') {
            current = current.properties.get(part)?;
        }
        Some(current)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Drop a name from the required set
    pub fn remove_required(&mut self, name: &str) {
        self.required.retain(|r| r != name);
    }

    /// Add a name to the required set (once)
    pub fn add_required(&mut self, name: &str) {
        if !self.is_required(name) {
            self.required.push(name.to_string());
        }
    }
}

/// Property type in OpenAPI schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    /// Unknown or unspecified type
    Unknown(String),
}

impl PropertyType {
    /// Parse from string representation
    pub fn parse(s: &str) -> Self {
        match s {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for PropertyType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<PropertyType> for String {
    fn from(t: PropertyType) -> Self {
        t.to_string()
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Array => write!(f, "array"),
            Self::Object => write!(f, "object"),
            Self::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// Additional properties: either a flag or a schema for map values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaProperty>),
}

/// A `x-kubernetes-validations` entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub rule: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_property_nested() {
        let mut nested = BTreeMap::new();
        nested.insert("replicas".to_string(), SchemaProperty::integer());
        nested.insert("image".to_string(), SchemaProperty::string());

        let spec = SchemaProperty::object(nested).with_required(&["replicas"]);

        assert!(spec.is_structured_object());
        assert!(spec.is_required("replicas"));
        assert!(!spec.is_required("image"));
        assert!(spec.get_nested("replicas").is_some());
        assert!(spec.get_nested("nonexistent").is_none());
    }

    #[test]
    fn test_uninterpreted_attributes_survive() {
        let raw = json!({
            "type": "string",
            "format": "date-time",
            "maxLength": 63,
            "x-kubernetes-validations": [
                {
                    "rule": "self.size() > 0",
                    "message": "must not be empty",
                    "reason": "FieldValueInvalid"
                }
            ]
        });

        let prop: SchemaProperty = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(prop.type_, Some(PropertyType::String));
        assert_eq!(prop.extra.get("format"), Some(&json!("date-time")));
        assert_eq!(prop.x_validations[0].message, "must not be empty");

        assert_eq!(serde_json::to_value(&prop).unwrap(), raw);
    }

    #[test]
    fn test_additional_properties_forms() {
        let map: SchemaProperty = serde_json::from_value(json!({
            "type": "object",
            "additionalProperties": {"type": "string"}
        }))
        .unwrap();
        assert!(matches!(
            map.additional_properties,
            Some(AdditionalProperties::Schema(_))
        ));
        assert!(!map.is_structured_object());

        let flag: SchemaProperty = serde_json::from_value(json!({
            "type": "object",
            "additionalProperties": false
        }))
        .unwrap();
        assert_eq!(
            flag.additional_properties,
            Some(AdditionalProperties::Allowed(false))
        );
    }

    #[test]
    fn test_required_bookkeeping() {
        let mut prop = SchemaProperty::object(BTreeMap::new()).with_required(&["a", "b"]);
        prop.remove_required("a");
        prop.add_required("b");
        prop.add_required("c");
        assert_eq!(prop.required, vec!["b", "c"]);
    }
}
