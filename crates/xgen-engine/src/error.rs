//! Generator error types

use miette::Diagnostic;
use thiserror::Error;
use xgen_core::CoreError;

/// Main generator error type
///
/// Every configuration conflict names the offending path; a generation
/// run stops at the first one.
#[derive(Error, Debug, Diagnostic)]
pub enum GeneratorError {
    #[error("Claim path '{path}' is declared more than once")]
    #[diagnostic(
        code(xgen::config::duplicate_claim_path),
        help("merge the declarations into a single overrideFieldsInClaim entry")
    )]
    DuplicateClaimPath { path: String },

    #[error("Claim paths '{first}' and '{second}' both map to managed path '{managed_path}'")]
    #[diagnostic(
        code(xgen::config::aliased_managed_path),
        help("a managed field can only be published once in the claim")
    )]
    AliasedManagedPath {
        managed_path: String,
        first: String,
        second: String,
    },

    #[error("schema must be given for new property: {claim_path}")]
    #[diagnostic(
        code(xgen::config::missing_schema),
        help("set overrideSettings.property for fields that do not exist on the managed resource")
    )]
    MissingSchema { claim_path: String },

    #[error("Cannot set a new enum on '{claim_path}': the field already has one")]
    #[diagnostic(
        code(xgen::config::new_enum_on_existing),
        help("use overrideSettings.enum to edit an existing enum")
    )]
    NewEnumOnExistingEnum { claim_path: String },

    #[error("Cannot edit the enum of '{claim_path}': the field has none")]
    #[diagnostic(
        code(xgen::config::edit_missing_enum),
        help("use overrideSettings.newEnum to create an enum")
    )]
    EditOnMissingEnum { claim_path: String },

    #[error("Enum edits of '{claim_path}' were never applied to a schema")]
    #[diagnostic(
        code(xgen::config::unresolved_enum),
        help("enum edits need a field that is published in the claim schema")
    )]
    UnresolvedEnum { claim_path: String },

    #[error("Enum value '{value}' of '{claim_path}' is mapped without a target")]
    #[diagnostic(
        code(xgen::config::missing_map_target),
        help("set mapTo on every enum entry of type map")
    )]
    MissingMapTarget { claim_path: String, value: String },

    #[error("Expected exactly one default composition, found {found}")]
    #[diagnostic(
        code(xgen::config::default_composition),
        help("mark exactly one entry of 'compositions' with default: true")
    )]
    DefaultComposition { found: usize },

    #[error("Condition of pipeline step '{step}' could not be evaluated")]
    #[diagnostic(code(xgen::pipeline::condition))]
    Condition {
        step: String,
        #[source]
        #[diagnostic_source]
        source: ConditionError,
    },

    #[error(transparent)]
    #[diagnostic(code(xgen::core))]
    Core(#[from] CoreError),

    #[error("JSON error: {0}")]
    #[diagnostic(code(xgen::json))]
    Json(#[from] serde_json::Error),
}

impl GeneratorError {
    /// Whether the error comes from the generator configuration (as
    /// opposed to unreadable input)
    pub fn is_config_error(&self) -> bool {
        match self {
            Self::Core(CoreError::Io(_) | CoreError::YamlParse(_) | CoreError::JsonParse(_)) => {
                false
            }
            Self::Json(_) => false,
            _ => true,
        }
    }
}

/// Errors of the pipeline step condition
#[derive(Error, Debug, Diagnostic)]
pub enum ConditionError {
    #[error("Syntax error in condition '{expression}': {message}")]
    #[diagnostic(code(xgen::condition::syntax))]
    Syntax { expression: String, message: String },

    #[error("Unknown variable in condition '{expression}': {message}")]
    #[diagnostic(code(xgen::condition::unknown_variable))]
    UnknownVariable {
        expression: String,
        message: String,
        #[help]
        suggestion: Option<String>,
    },

    #[error("Condition '{expression}' must return a boolean, got {kind}")]
    #[diagnostic(
        code(xgen::condition::not_boolean),
        help("compare the variable, e.g. tagType == \"tags\"")
    )]
    NotBoolean { expression: String, kind: String },

    #[error("Failed to evaluate condition '{expression}': {message}")]
    #[diagnostic(code(xgen::condition::evaluation))]
    Evaluation { expression: String, message: String },
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
