// file: src/generation/prompt.rs
// description: chat prompt templates with {{variable}} placeholders
// reference: placeholder substitution over a list of chat messages

use super::message::ChatMessage;
use crate::error::{PipelineError, Result};
use crate::models::Document;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("PLACEHOLDER regex is valid");
}

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"Use the context provided below to generate a concise and accurate answer to the query.
If the context does not contain enough information to provide a reliable answer,
respond with: "I cannot answer this question with the context provided." and nothing else.

Example 1:
Query: I think I received an incorrect grade for my homework. Can I have someone review it again?
Answer: Provided that 5 days has not passed since the grade was posted, you can request a regrade on EdDiscussion by making a private post.

Example 2:
Query: Do you recommend I take CS 161 if I plan to go to grad school?
Answer: I cannot answer this question with the context provided.

Context:
{{documents}}
"#;

pub const DEFAULT_USER_PROMPT: &str = "Query: {{query}}\n\n Answer: ";

pub struct ChatPromptBuilder {
    template: Vec<ChatMessage>,
    required_variables: Vec<String>,
}

impl ChatPromptBuilder {
    pub fn new(template: Vec<ChatMessage>, required_variables: Vec<String>) -> Self {
        Self {
            template,
            required_variables,
        }
    }

    /// System prompt with the retrieved context followed by the user query.
    pub fn rag(system_prompt: Option<&str>) -> Self {
        Self::new(
            vec![
                ChatMessage::from_system(system_prompt.unwrap_or(DEFAULT_SYSTEM_PROMPT)),
                ChatMessage::from_user(DEFAULT_USER_PROMPT),
            ],
            vec!["query".to_string(), "documents".to_string()],
        )
    }

    /// Every placeholder name appearing in the template.
    pub fn variables(&self) -> BTreeSet<String> {
        self.template
            .iter()
            .flat_map(|message| PLACEHOLDER.captures_iter(&message.content))
            .map(|caps| caps[1].to_string())
            .collect()
    }

    pub fn render(&self, values: &HashMap<String, String>) -> Result<Vec<ChatMessage>> {
        let missing: Vec<&str> = self
            .required_variables
            .iter()
            .filter(|name| !values.contains_key(name.as_str()))
            .map(String::as_str)
            .collect();

        if !missing.is_empty() {
            return Err(PipelineError::Validation(format!(
                "Missing required prompt variables: {}",
                missing.join(", ")
            )));
        }

        Ok(self
            .template
            .iter()
            .map(|message| ChatMessage {
                role: message.role,
                content: PLACEHOLDER
                    .replace_all(&message.content, |caps: &Captures| {
                        match values.get(&caps[1]) {
                            Some(value) => value.clone(),
                            None => {
                                warn!("Prompt variable {} has no value", &caps[1]);
                                String::new()
                            }
                        }
                    })
                    .into_owned(),
            })
            .collect())
    }

    pub fn run(&self, query: &str, documents: &[Document]) -> Result<Vec<ChatMessage>> {
        let mut values = HashMap::new();
        values.insert("query".to_string(), query.to_string());
        values.insert("documents".to_string(), render_documents(documents));
        self.render(&values)
    }
}

pub fn render_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.content.trim())
        .collect::<Vec<_>>()
        .join("\n")
}
