//! Prompt system for docqa.
//!
//! Answer prompts are YAML definitions with Handlebars templates. A built-in
//! `document.answer` definition is used unless the workspace provides its own
//! under `.docqa/prompts/`.

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{list_prompts, load_prompt, ANSWER_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition};
