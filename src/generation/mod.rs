// file: src/generation/mod.rs
// description: prompt building, chat generation and answer assembly
// reference: internal module structure

pub mod answer;
pub mod message;
pub mod ollama;
pub mod prompt;

pub use answer::AnswerBuilder;
pub use message::{ChatMessage, ChatRole};
pub use ollama::{ChatGenerator, OllamaChatGenerator};
pub use prompt::{ChatPromptBuilder, DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT};
