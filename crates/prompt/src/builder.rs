//! Prompt builder: renders definition templates with Handlebars.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde_json::Value;
use std::collections::HashMap;

/// Build a prompt from a definition and template variables.
///
/// Both the system and the user templates are rendered with the same
/// variables. HTML escaping is disabled since the output is plain text.
///
/// # Example
/// ```no_run
/// use docqa_prompt::{build_prompt, load_prompt, ANSWER_PROMPT_ID};
/// use serde_json::json;
/// use std::collections::HashMap;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(Path::new("."), ANSWER_PROMPT_ID)?;
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), json!("Who signed the lease?"));
/// vars.insert("context".to_string(), json!("The lease was signed by ..."));
///
/// let built = build_prompt(&def, &vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: &HashMap<String, Value>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("user", &definition.template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let user = handlebars
        .render("user", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    let system = match definition.system.as_deref() {
        Some(system) => {
            handlebars
                .register_template_string("system", system)
                .map_err(|e| {
                    AppError::Prompt(format!("Failed to register system template: {}", e))
                })?;
            Some(handlebars.render("system", variables).map_err(|e| {
                AppError::Prompt(format!("Failed to render system template: {}", e))
            })?)
        }
        None => None,
    };

    let mut resolved_variables: Vec<String> = variables.keys().cloned().collect();
    resolved_variables.sort();

    Ok(BuiltPrompt {
        system,
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            behavior: definition.behavior.clone(),
            resolved_variables,
        },
    })
}
