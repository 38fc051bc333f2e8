//! Override index
//!
//! Compiles `overrideFieldsInClaim` declarations into `OverrideDefinition`s
//! with path-keyed lookups by claim path and by managed path. Paths are
//! keyed in their re-joined form, so `labels["team"]` and `labels.team`
//! address the same field.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use xgen_core::{FieldPath, OverrideField, OverrideFieldInClaim, Patch, SchemaProperty};

use crate::enums::EnumTransformTable;
use crate::error::{GeneratorError, Result};

/// Managed fields never published in a claim
pub const STATIC_IGNORED: &[&str] = &[
    "status.conditions",
    "spec.writeConnectionSecretToRef",
    "spec.forProvider.tags",
    "spec.forProvider.tagSpecifications",
    "spec.forProvider.tagging",
    "spec.providerConfigRef.default",
    "spec.providerRef",
    "spec.publishConnectionDetailsTo.configRef.default",
];

/// Compiled form of one claim override
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideDefinition {
    pub claim_path: String,
    pub managed_path: String,
    /// Tokenized claim path
    pub segments: FieldPath,
    /// The claim field is published under a different path than the managed one
    pub replacement: bool,
    /// Schema inserted at the claim path
    pub schema: Option<SchemaProperty>,
    /// Enum of the field before edits were applied
    pub original_enum: Option<Vec<Value>>,
    pub enum_table: Option<EnumTransformTable>,
    pub ignore_in_claim: bool,
    /// The managed field was required
    pub required: bool,
    /// The raw declaration
    pub declaration: OverrideFieldInClaim,
}

impl OverrideDefinition {
    pub fn new(declaration: OverrideFieldInClaim) -> Self {
        let claim_path = canonical(&declaration.claim_path);
        let managed_path = declaration
            .managed_path
            .as_deref()
            .map(canonical)
            .unwrap_or_else(|| claim_path.clone());
        let schema = declaration
            .override_settings
            .as_ref()
            .and_then(|s| s.property.clone());

        Self {
            segments: FieldPath::parse(&declaration.claim_path),
            replacement: declaration.managed_path.is_some(),
            ignore_in_claim: declaration.ignore,
            claim_path,
            managed_path,
            schema,
            original_enum: None,
            enum_table: None,
            required: false,
            declaration,
        }
    }

    /// Patches declared verbatim
    pub fn explicit_patches(&self) -> Option<&[Patch]> {
        self.declaration
            .override_settings
            .as_ref()
            .and_then(|s| s.patches.as_deref())
    }

    /// Whether the declaration edits an existing enum
    pub fn has_enum_edits(&self) -> bool {
        self.declaration
            .override_settings
            .as_ref()
            .is_some_and(|s| s.enum_values.is_some())
    }

    /// First segment of the claim path (`spec` or `status`)
    pub fn section(&self) -> Option<&str> {
        self.segments.first().map(|s| s.name.as_str())
    }
}

/// Definitions with lookups by claim path and managed path
#[derive(Debug, Clone, Default)]
pub struct OverrideIndex {
    definitions: Vec<OverrideDefinition>,
    by_claim: HashMap<String, usize>,
    by_managed: HashMap<String, usize>,
    ignored: BTreeSet<String>,
}

impl OverrideIndex {
    /// Build the index for one generation run
    ///
    /// `override_fields` contribute their ignored paths to the ignore list.
    pub fn new(
        declarations: &[OverrideFieldInClaim],
        override_fields: &[OverrideField],
    ) -> Result<Self> {
        let mut index = Self {
            ignored: STATIC_IGNORED.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        };

        index.ignored.extend(
            override_fields
                .iter()
                .filter(|f| f.ignore)
                .map(|f| canonical(&f.path)),
        );

        for declaration in declarations {
            index.insert(OverrideDefinition::new(declaration.clone()))?;
        }

        Ok(index)
    }

    fn insert(&mut self, definition: OverrideDefinition) -> Result<()> {
        let position = self.definitions.len();

        if self.by_claim.contains_key(&definition.claim_path) {
            return Err(GeneratorError::DuplicateClaimPath {
                path: definition.claim_path,
            });
        }

        if definition.ignore_in_claim {
            self.ignored.insert(definition.claim_path.clone());
        } else {
            if let Some(&existing) = self.by_managed.get(&definition.managed_path) {
                return Err(GeneratorError::AliasedManagedPath {
                    managed_path: definition.managed_path,
                    first: self.definitions[existing].claim_path.clone(),
                    second: definition.claim_path,
                });
            }
            self.by_managed.insert(definition.managed_path.clone(), position);
        }

        self.by_claim.insert(definition.claim_path.clone(), position);
        self.definitions.push(definition);
        Ok(())
    }

    pub fn find_by_claim_path(&self, path: &str) -> Option<&OverrideDefinition> {
        self.by_claim.get(path).map(|&i| &self.definitions[i])
    }

    /// Published (not claim-ignored) definition for a managed path
    pub fn find_by_managed_path(&self, path: &str) -> Option<&OverrideDefinition> {
        self.by_managed.get(path).map(|&i| &self.definitions[i])
    }

    pub fn find_by_managed_path_mut(&mut self, path: &str) -> Option<&mut OverrideDefinition> {
        self.by_managed.get(path).map(|&i| &mut self.definitions[i])
    }

    /// Definitions kept out of the claim
    pub fn ignored_in_claim(&self) -> impl Iterator<Item = &OverrideDefinition> {
        self.definitions.iter().filter(|d| d.ignore_in_claim)
    }

    /// Definitions in declaration order
    pub fn definitions(&self) -> &[OverrideDefinition] {
        &self.definitions
    }

    pub fn definitions_mut(&mut self) -> &mut [OverrideDefinition] {
        &mut self.definitions
    }

    /// Whether a managed path is kept out of the claim
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored.contains(path)
    }
}

/// Re-joined form of a path, used as lookup key
pub fn canonical(path: &str) -> String {
    FieldPath::parse(path).to_string()
}
