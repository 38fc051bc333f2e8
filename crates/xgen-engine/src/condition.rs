//! Pipeline step conditions
//!
//! An additional pipeline step may carry a condition such as
//! `tagType == "tags"`. It is compiled as a MiniJinja expression over the
//! two variables `tagProperty` and `tagType`; the step is emitted only when
//! the expression yields `true`.

use minijinja::value::ValueKind;
use minijinja::{Environment, ErrorKind, UndefinedBehavior, context};

use crate::error::ConditionError;

/// Variables visible to a condition
pub const CONDITION_VARIABLES: &[&str] = &["tagProperty", "tagType"];

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Values bound to the condition variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionData {
    pub tag_property: String,
    pub tag_type: String,
}

/// Evaluate an optional step condition
///
/// A missing condition is `false`.
pub fn evaluate_condition(
    expression: Option<&str>,
    data: &ConditionData,
) -> Result<bool, ConditionError> {
    let Some(expression) = expression else {
        return Ok(false);
    };

    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    let compiled = env
        .compile_expression(expression)
        .map_err(|e| ConditionError::Syntax {
            expression: expression.to_string(),
            message: e.to_string(),
        })?;

    let mut unknown: Vec<String> = compiled
        .undeclared_variables(false)
        .into_iter()
        .filter(|name| !CONDITION_VARIABLES.contains(&name.as_str()))
        .collect();
    unknown.sort();
    if let Some(name) = unknown.first() {
        return Err(ConditionError::UnknownVariable {
            expression: expression.to_string(),
            message: format!("'{}' is not defined", name),
            suggestion: Some(suggest_variable(name)),
        });
    }

    let value = compiled
        .eval(context! {
            tagProperty => data.tag_property.as_str(),
            tagType => data.tag_type.as_str(),
        })
        .map_err(|e| match e.kind() {
            ErrorKind::UndefinedError => ConditionError::UnknownVariable {
                expression: expression.to_string(),
                message: e.to_string(),
                suggestion: None,
            },
            _ => ConditionError::Evaluation {
                expression: expression.to_string(),
                message: e.to_string(),
            },
        })?;

    if value.kind() != ValueKind::Bool {
        return Err(ConditionError::NotBoolean {
            expression: expression.to_string(),
            kind: value.kind().to_string(),
        });
    }

    Ok(value.is_true())
}

fn suggest_variable(name: &str) -> String {
    let closest = CONDITION_VARIABLES
        .iter()
        .map(|known| (strsim::levenshtein(name, known), known))
        .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
        .min_by_key(|(distance, _)| *distance);

    match closest {
        Some((_, known)) => format!(
            "Did you mean `{}`? Available: {}",
            known,
            CONDITION_VARIABLES.join(", ")
        ),
        None => format!("Available variables: {}", CONDITION_VARIABLES.join(", ")),
    }
}
