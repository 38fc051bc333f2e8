//! xgen Core - data model for generating claims from managed resource CRDs
//!
//! This crate provides the foundational types used throughout xgen:
//! - `FieldPath`: tokenized field paths (`spec.tags[0].key`)
//! - `CrdSchema` / `SchemaProperty`: parsed CRD schemas
//! - `GeneratorConfig` / `ResourceConfig`: generator configuration
//! - `Patch` / `PatchSet`: patch-and-transform rules
//! - `overlay`: literal values injected into the composed resource base

pub mod config;
pub mod crd;
pub mod error;
pub mod overlay;
pub mod patch;
pub mod path;
pub mod schema;

pub use config::{
    AutoReadyFunction, Composition, CrdConfig, EnumValue, EnumValueType, GeneratorConfig,
    GlobalProviderConfig, LabelConfig, OverrideField, OverrideFieldInClaim, OverrideSettings,
    PipelineFunction, PipelineStep, ProviderConfig, ResourceConfig,
};
pub use crd::CrdParser;
pub use error::{CoreError, Result};
pub use patch::{
    FromFieldPathPolicy, Patch, PatchPolicy, PatchSet, PatchType, Transform, TransformType,
};
pub use path::{FieldPath, PathSegment, SegmentKind};
pub use schema::{
    AdditionalProperties, CrdNames, CrdSchema, CrdVersionSchema, PrinterColumn, PropertyType,
    SchemaProperty, ValidationRule,
};
