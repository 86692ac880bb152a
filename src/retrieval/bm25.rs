// file: src/retrieval/bm25.rs
// description: BM25 Okapi lexical scoring over the document store contents
// reference: Robertson & Zaragoza, "The Probabilistic Relevance Framework: BM25 and Beyond"

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref TOKEN_PATTERN: Regex =
        Regex::new(r"(?u)\b\w\w+\b").expect("TOKEN_PATTERN regex is valid");
}

/// Lowercased word tokens of two or more characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct Bm25Parameters {
    /// Term frequency saturation
    pub k1: f32,
    /// Length normalization
    pub b: f32,
    /// Floor for non-positive IDF values, as a fraction of the average IDF
    pub epsilon: f32,
}

impl Default for Bm25Parameters {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct IndexedEntry {
    term_counts: HashMap<String, u32>,
    length: usize,
}

/// Positional BM25 index: entry `i` scores the document at store position `i`.
#[derive(Debug, Clone, Default)]
pub struct Bm25Index {
    params: Bm25Parameters,
    entries: Vec<IndexedEntry>,
    document_frequencies: HashMap<String, usize>,
    total_length: usize,
    avg_doc_length: f32,
}

impl Bm25Index {
    pub fn new(params: Bm25Parameters) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn build<'a>(params: Bm25Parameters, texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::new(params);
        for text in texts {
            index.add(text);
        }
        index
    }

    pub fn add(&mut self, text: &str) {
        let tokens = tokenize(text);
        let mut term_counts: HashMap<String, u32> = HashMap::new();
        for token in tokens.iter() {
            *term_counts.entry(token.clone()).or_insert(0) += 1;
        }
        for term in term_counts.keys() {
            *self.document_frequencies.entry(term.clone()).or_insert(0) += 1;
        }

        self.total_length += tokens.len();
        self.entries.push(IndexedEntry {
            term_counts,
            length: tokens.len(),
        });
        self.avg_doc_length = self.total_length as f32 / self.entries.len() as f32;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn idf_table(&self) -> HashMap<&str, f32> {
        let n = self.entries.len() as f32;
        let mut idf: HashMap<&str, f32> = self
            .document_frequencies
            .iter()
            .map(|(term, &df)| {
                let df = df as f32;
                (term.as_str(), ((n - df + 0.5) / (df + 0.5)).ln())
            })
            .collect();

        if idf.is_empty() {
            return idf;
        }

        let average = idf.values().sum::<f32>() / idf.len() as f32;
        let floor = if average > 0.0 {
            self.params.epsilon * average
        } else {
            self.params.epsilon
        };
        for value in idf.values_mut() {
            if *value <= 0.0 {
                *value = floor;
            }
        }
        idf
    }

    /// Scores every indexed entry against the query.
    pub fn scores(&self, query: &str) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.entries.len()];
        if self.entries.is_empty() {
            return scores;
        }

        let idf = self.idf_table();
        let Bm25Parameters { k1, b, .. } = self.params;
        let avg = self.avg_doc_length.max(f32::EPSILON);

        for token in tokenize(query) {
            let Some(&term_idf) = idf.get(token.as_str()) else {
                continue;
            };
            for (score, entry) in scores.iter_mut().zip(&self.entries) {
                let Some(&tf) = entry.term_counts.get(&token) else {
                    continue;
                };
                let tf = tf as f32;
                let norm = k1 * (1.0 - b + b * entry.length as f32 / avg);
                *score += term_idf * (tf * (k1 + 1.0)) / (tf + norm);
            }
        }

        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_single_chars() {
        assert_eq!(
            tokenize("A regrade, on EdDiscussion!"),
            vec!["regrade", "on", "eddiscussion"]
        );
    }

    #[test]
    fn test_matching_document_scores_highest() {
        let index = Bm25Index::build(
            Bm25Parameters::default(),
            [
                "Regrade requests must be filed within five days",
                "Office hours are held on Tuesdays",
                "Late homework loses ten percent per day",
            ],
        );

        let scores = index.scores("how do I request a regrade");
        assert!(scores[0] > scores[1]);
        assert!(scores[0] > scores[2]);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn test_common_terms_still_positive() {
        let index = Bm25Index::build(
            Bm25Parameters::default(),
            ["exam policy", "exam dates", "exam room"],
        );

        let scores = index.scores("exam");
        assert!(scores.iter().all(|&s| s > 0.0));
    }

    #[test]
    fn test_term_in_half_the_documents_still_matches() {
        let index = Bm25Index::build(
            Bm25Parameters::default(),
            ["midterm in Wheeler Hall", "final exam in May"],
        );

        let scores = index.scores("midterm");
        assert!(scores[0] > 0.0);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn test_average_length_tracks_inserts() {
        let mut index = Bm25Index::new(Bm25Parameters::default());
        index.add("one two");
        index.add("one two three four");
        assert_eq!(index.len(), 2);
        assert_eq!(index.avg_doc_length, 3.0);
    }

    #[test]
    fn test_empty_index() {
        let index = Bm25Index::default();
        assert!(index.is_empty());
        assert!(index.scores("anything").is_empty());
    }
}
