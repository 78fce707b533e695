//! Prompt loader for YAML prompt definitions.

use crate::types::PromptDefinition;
use docqa_core::{config::STATE_DIR, AppError, AppResult};
use std::path::{Path, PathBuf};

/// ID of the prompt used to answer document questions.
pub const ANSWER_PROMPT_ID: &str = "document.answer";

const BUILTIN_ANSWER_PROMPT: &str = r#"
id: document.answer
title: Answer a question from document context
apiVersion: "1.0"
behavior:
  temperature: 0.2
system: >-
  You are a document assistant. Your primary task is to answer the user's
  question based on the provided document context. The document may describe
  a person, finances, a project or any other topic.
template: |-
  Instructions:
  1. Read the document context carefully and use it as the main source of truth.
  2. If the context contains the answer, state it clearly and concisely.
  3. If the context is not sufficient, you may add general knowledge, but say which parts come from the document and which are inferred.
  4. If neither the document nor general knowledge is enough, reply: "I couldn't find relevant information in the document."
  {{#if lowConfidence}}

  Note: the retrieved passages may not directly answer this question. Be explicit about what the document does and does not state.
  {{/if}}

  ---
  Document context:
  {{context}}

  ---
  Question:
  {{question}}
"#;

/// Built-in prompt definitions, keyed by ID.
fn builtin(prompt_id: &str) -> Option<&'static str> {
    match prompt_id {
        ANSWER_PROMPT_ID => Some(BUILTIN_ANSWER_PROMPT),
        _ => None,
    }
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(STATE_DIR).join("prompts")
}

/// Load a prompt definition by ID.
///
/// Looks for `.docqa/prompts/<id>.yml` in the workspace first and falls back
/// to the built-in definition of the same ID.
///
/// # Example
/// ```no_run
/// use docqa_prompt::{load_prompt, ANSWER_PROMPT_ID};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), ANSWER_PROMPT_ID)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    let definition = if prompt_file.exists() {
        tracing::debug!("Loading prompt from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;

        serde_yaml::from_str::<PromptDefinition>(&contents).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to parse prompt YAML {:?}: {}",
                prompt_file, e
            ))
        })?
    } else if let Some(yaml) = builtin(prompt_id) {
        tracing::debug!("Using built-in prompt '{}'", prompt_id);
        serde_yaml::from_str::<PromptDefinition>(yaml)
            .map_err(|e| AppError::Prompt(format!("Invalid built-in prompt: {}", e)))?
    } else {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    };

    validate_prompt(&definition)?;

    tracing::debug!("Loaded prompt: {} ({})", definition.id, definition.title);
    Ok(definition)
}

/// List prompt IDs: built-ins plus the workspace's `.yml` files.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids = vec![ANSWER_PROMPT_ID.to_string()];
    let dir = prompts_dir(workspace_path);

    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !prompt_ids.iter().any(|id| id == stem) {
                        prompt_ids.push(stem.to_string());
                    }
                }
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if let Some(temperature) = def.behavior.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AppError::Prompt(format!(
                "Temperature out of range (0.0-2.0): {}",
                temperature
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_prompt(workspace: &Path, id: &str, yaml: &str) {
        let dir = prompts_dir(workspace);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}.yml", id)), yaml).unwrap();
    }

    #[test]
    fn test_builtin_answer_prompt() {
        let temp = TempDir::new().unwrap();
        let def = load_prompt(temp.path(), ANSWER_PROMPT_ID).unwrap();

        assert_eq!(def.id, ANSWER_PROMPT_ID);
        assert_eq!(def.behavior.temperature, Some(0.2));
        assert!(def.template.contains("{{context}}"));
        assert!(def.template.contains("{{question}}"));
    }

    #[test]
    fn test_workspace_prompt_overrides_builtin() {
        let temp = TempDir::new().unwrap();
        write_prompt(
            temp.path(),
            ANSWER_PROMPT_ID,
            "id: document.answer\ntitle: Terse\napiVersion: \"1.1\"\ntemplate: \"Q: {{question}}\"\n",
        );

        let def = load_prompt(temp.path(), ANSWER_PROMPT_ID).unwrap();
        assert_eq!(def.title, "Terse");
        assert!(def.system.is_none());
    }

    #[test]
    fn test_missing_prompt() {
        let temp = TempDir::new().unwrap();
        let result = load_prompt(temp.path(), "nope");
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_invalid_api_version() {
        let temp = TempDir::new().unwrap();
        write_prompt(
            temp.path(),
            "bad",
            "id: bad\ntitle: Bad\napiVersion: \"1\"\ntemplate: x\n",
        );
        let err = load_prompt(temp.path(), "bad").unwrap_err();
        assert!(err.to_string().contains("apiVersion"));
    }

    #[test]
    fn test_list_prompts() {
        let temp = TempDir::new().unwrap();
        write_prompt(
            temp.path(),
            "summary",
            "id: summary\ntitle: S\napiVersion: \"1.0\"\ntemplate: x\n",
        );

        let ids = list_prompts(temp.path()).unwrap();
        assert_eq!(ids, vec!["document.answer".to_string(), "summary".to_string()]);
    }
}
