pub mod prompt;

pub use prompt::{NewPrompt, Prompt, PromptPatch};
