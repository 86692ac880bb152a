// file: src/pipeline/graph.rs
// description: named components and port connections of each pipeline, rendered as Mermaid
// reference: https://mermaid.js.org/syntax/flowchart.html

use crate::error::{PipelineError, Result};
use std::collections::HashSet;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub kind: String,
}

/// `sender.port -> receiver.port`
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub sender: String,
    pub sender_port: String,
    pub receiver: String,
    pub receiver_port: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineGraph {
    pub name: String,
    pub components: Vec<Component>,
    pub connections: Vec<Connection>,
}

impl PipelineGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn component(mut self, name: &str, kind: &str) -> Self {
        self.components.push(Component {
            name: name.to_string(),
            kind: kind.to_string(),
        });
        self
    }

    /// Endpoints are written as `component.port`.
    pub fn connect(mut self, sender: &str, receiver: &str) -> Self {
        let (sender, sender_port) = split_endpoint(sender);
        let (receiver, receiver_port) = split_endpoint(receiver);
        self.connections.push(Connection {
            sender,
            sender_port,
            receiver,
            receiver_port,
        });
        self
    }

    /// Every connection endpoint must name a declared component.
    pub fn validate(&self) -> Result<()> {
        let names: HashSet<&str> = self.components.iter().map(|c| c.name.as_str()).collect();

        for connection in &self.connections {
            for endpoint in [&connection.sender, &connection.receiver] {
                if !names.contains(endpoint.as_str()) {
                    return Err(PipelineError::Config(format!(
                        "Pipeline '{}' connects unknown component '{}'",
                        self.name, endpoint
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD;\n");

        for component in &self.components {
            let _ = writeln!(
                out,
                "  {}[\"<b>{}</b><br><small><i>{}</i></small>\"]",
                component.name, component.name, component.kind
            );
        }
        for c in &self.connections {
            let _ = writeln!(
                out,
                "  {} -- \"{} -> {}\" --> {}",
                c.sender, c.sender_port, c.receiver_port, c.receiver
            );
        }
        out
    }
}

fn split_endpoint(endpoint: &str) -> (String, String) {
    match endpoint.split_once('.') {
        Some((component, port)) => (component.to_string(), port.to_string()),
        None => (endpoint.to_string(), String::new()),
    }
}

pub fn index_graph() -> PipelineGraph {
    PipelineGraph::new("index")
        .component("converter", "PdfConverter")
        .component("cleaner", "DocumentCleaner")
        .component("splitter", "DocumentSplitter")
        .component("embedder", "TextEmbedder")
        .component("writer", "InMemoryDocumentStore")
        .connect("converter.documents", "cleaner.documents")
        .connect("cleaner.documents", "splitter.documents")
        .connect("splitter.documents", "embedder.documents")
        .connect("embedder.documents", "writer.documents")
}

pub fn generate_graph() -> PipelineGraph {
    PipelineGraph::new("generate")
        .component("text_embedder", "TextEmbedder")
        .component("embedding_retriever", "EmbeddingRetriever")
        .component("bm25_retriever", "Bm25Retriever")
        .component("document_joiner", "DocumentJoiner")
        .component("ranker", "Ranker")
        .component("prompt_builder", "ChatPromptBuilder")
        .component("llm", "ChatGenerator")
        .component("answer_builder", "AnswerBuilder")
        .connect("text_embedder.embedding", "embedding_retriever.query_embedding")
        .connect("embedding_retriever.documents", "document_joiner.documents")
        .connect("bm25_retriever.documents", "document_joiner.documents")
        .connect("document_joiner.documents", "ranker.documents")
        .connect("ranker.documents", "prompt_builder.documents")
        .connect("ranker.documents", "answer_builder.documents")
        .connect("prompt_builder.prompt", "llm.messages")
        .connect("llm.replies", "answer_builder.replies")
}

pub fn evaluate_graph() -> PipelineGraph {
    PipelineGraph::new("evaluate")
        .component("reader", "JsonExporter")
        .component("evaluator", "FaithfulnessScorer")
        .component("report", "JsonExporter")
        .connect("reader.answers", "evaluator.predicted_answers")
        .connect("evaluator.results", "report.results")
}
