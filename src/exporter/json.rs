// file: src/exporter/json.rs
// description: json readers and writers for input queries, generated answers and evaluation reports

use crate::error::{PipelineError, Result};
use crate::models::{AnswerRecord, EvaluationReport, EvaluationResult, QueryRecord};
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    run_id: String,
    pretty: bool,
}

#[derive(Debug, Serialize)]
pub struct ExportManifest {
    pub run_id: String,
    pub exported_at: String,
    pub total_records: usize,
    pub path: PathBuf,
}

/// Column view over a generated answers file, one entry per record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedAnswerSet {
    pub queries: Vec<String>,
    /// Supporting document contents of each answer
    pub contexts: Vec<Vec<String>>,
    pub answers: Vec<String>,
    pub references: Vec<String>,
}

impl GeneratedAnswerSet {
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl From<Vec<AnswerRecord>> for GeneratedAnswerSet {
    fn from(records: Vec<AnswerRecord>) -> Self {
        let mut set = Self::default();
        for record in records {
            let generated = record.generated_answer;
            set.contexts.push(
                generated
                    .documents
                    .into_iter()
                    .map(|doc| doc.content)
                    .collect(),
            );
            set.queries.push(generated.query);
            set.answers.push(generated.data);
            set.references.push(record.reference_answer);
        }
        set
    }
}

impl JsonExporter {
    pub fn new(pretty: bool) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            pretty,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn read_input_json(path: &Path) -> Result<Vec<QueryRecord>> {
        let records: Vec<QueryRecord> = read_json(path)?;

        let unanswerable = records
            .iter()
            .filter(|r| r.question.trim().is_empty())
            .count();
        if unanswerable > 0 {
            warn!(
                "{} input records in {} have no question",
                unanswerable,
                path.display()
            );
        }

        info!("Loaded {} queries from {}", records.len(), path.display());
        Ok(records)
    }

    pub fn write_generated_answers(
        &self,
        path: &Path,
        records: &[AnswerRecord],
    ) -> Result<ExportManifest> {
        // embeddings are an index detail and would dominate the file size
        let records: Vec<AnswerRecord> = records
            .iter()
            .cloned()
            .map(|mut record| {
                for doc in &mut record.generated_answer.documents {
                    doc.embedding = None;
                }
                record
            })
            .collect();

        self.write_json(path, &records)?;

        let manifest = self.manifest(path, records.len());
        info!(
            "Wrote {} generated answers to {}",
            manifest.total_records,
            path.display()
        );
        Ok(manifest)
    }

    pub fn read_generated_answers(path: &Path) -> Result<GeneratedAnswerSet> {
        let records: Vec<AnswerRecord> = read_json(path)?;
        Ok(GeneratedAnswerSet::from(records))
    }

    pub fn write_evaluation_report(
        &self,
        path: &Path,
        results: Vec<EvaluationResult>,
        skipped: usize,
    ) -> Result<EvaluationReport> {
        let report = EvaluationReport {
            run_id: self.run_id.clone(),
            exported_at: Utc::now().to_rfc3339(),
            evaluated: results.len(),
            skipped,
            mean_score: EvaluationReport::mean_score(&results),
            results,
        };

        self.write_json(path, &report)?;
        info!(
            "Wrote {} evaluation results to {}",
            report.evaluated,
            path.display()
        );
        Ok(report)
    }

    fn manifest(&self, path: &Path, total_records: usize) -> ExportManifest {
        ExportManifest {
            run_id: self.run_id.clone(),
            exported_at: Utc::now().to_rfc3339(),
            total_records,
            path: path.to_path_buf(),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PipelineError::FileOperation {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        fs::write(path, json).map_err(|source| PipelineError::FileOperation {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|source| PipelineError::FileOperation {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, DocumentMeta, GeneratedAnswer};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn record(question: &str, answer: &str, docs: &[&str]) -> AnswerRecord {
        AnswerRecord {
            reference_answer: format!("ref: {}", answer),
            generated_answer: GeneratedAnswer {
                query: question.to_string(),
                data: answer.to_string(),
                documents: docs
                    .iter()
                    .map(|t| {
                        let mut doc = Document::new(t.to_string(), DocumentMeta::default());
                        doc.embedding = Some(vec![0.1, 0.2]);
                        doc
                    })
                    .collect(),
                meta: BTreeMap::new(),
            },
        }
    }

    #[test]
    fn test_read_input_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.json");
        fs::write(
            &path,
            r#"[{"question": "When is the midterm?", "answer": "March 3"}, {"question": "Is there a curve?"}]"#,
        )
        .unwrap();

        let records = JsonExporter::read_input_json(&path).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].answer, "March 3");
        assert_eq!(records[1].reference_answer(), None);
    }

    #[test]
    fn test_missing_input_is_file_error() {
        let err = JsonExporter::read_input_json(Path::new("/nonexistent/input.json")).unwrap_err();
        assert!(matches!(err, PipelineError::FileOperation { .. }));
    }

    #[test]
    fn test_generated_answers_written_and_read_back_as_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/generated_answers.json");
        let exporter = JsonExporter::new(true);

        let manifest = exporter
            .write_generated_answers(
                &path,
                &[
                    record("q1", "a1", &["ctx one", "ctx two"]),
                    record("q2", "a2", &[]),
                ],
            )
            .unwrap();
        assert_eq!(manifest.total_records, 2);
        assert_eq!(manifest.run_id, exporter.run_id());

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"answer\": \"ref: a1\""));
        assert!(!raw.contains("embedding"));

        let set = JsonExporter::read_generated_answers(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.queries, vec!["q1", "q2"]);
        assert_eq!(set.answers, vec!["a1", "a2"]);
        assert_eq!(set.references, vec!["ref: a1", "ref: a2"]);
        assert_eq!(
            set.contexts,
            vec![vec!["ctx one".to_string(), "ctx two".to_string()], vec![]]
        );
    }

    #[test]
    fn test_evaluation_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("evaluation_results.json");
        let exporter = JsonExporter::new(false);

        let results = vec![EvaluationResult {
            query: "q".to_string(),
            predicted_answer: "a".to_string(),
            score: 0.5,
            statements: vec!["s1".to_string(), "s2".to_string()],
            statement_scores: vec![1, 0],
        }];

        let report = exporter.write_evaluation_report(&path, results, 1).unwrap();
        assert_eq!(report.evaluated, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.mean_score, Some(0.5));

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["mean_score"], 0.5);
        assert_eq!(value["results"][0]["statement_scores"][1], 0);
        assert!(value["exported_at"].is_string());
    }
}
