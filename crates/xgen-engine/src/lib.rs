//! xgen Engine - claim schema and patch generation
//!
//! This crate turns a managed resource CRD plus override configuration into:
//! - a claim schema (`ClaimMapper::claim_schema`)
//! - sorted patch sets between claim and managed resource (`ClaimMapper::patch_set`)
//! - the CompositeResourceDefinition and Compositions publishing the claim (`Generator`)
//!
//! Optional pipeline steps are gated by MiniJinja expressions (`evaluate_condition`).

pub mod composition;
pub mod condition;
pub mod enums;
pub mod error;
pub mod generator;
pub mod mapper;
pub mod overrides;
pub mod patches;
pub mod transform;
pub mod xrd;

pub use condition::{CONDITION_VARIABLES, ConditionData, evaluate_condition};
pub use enums::{EnumTransformTable, canonical_string};
pub use error::{ConditionError, GeneratorError, Result};
pub use generator::{ClaimOutput, GeneratedResource, Generator, NamedComposition};
pub use mapper::ClaimMapper;
pub use overrides::{OverrideDefinition, OverrideIndex, STATIC_IGNORED};
pub use patches::PatchGenerator;
pub use transform::SchemaTransformer;
