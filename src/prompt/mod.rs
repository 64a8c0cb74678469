//! Prompt assembly: persona rendering, variables and the chat template.

pub mod persona;
pub mod template;
pub mod variables;

pub use persona::{extract_placeholders, render_persona};
pub use template::{compose_messages, system_prompt, truncate_history, PromptParts, CURRENT_TIME_VARIABLE};
pub use variables::{merge_variables, variable_keywords};
