//! TF-IDF text vectorizer.
//!
//! Tokens are runs of two or more word characters, lowercased. Term
//! weights use raw counts times a smoothed inverse document frequency,
//! `ln((1 + n) / (1 + df)) + 1`, and every row is L2-normalised.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::stop_words::is_stop_word;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token pattern is a valid regex"));

#[derive(Debug, Clone, Default)]
pub struct TfIdfVectorizer {
    skip_stop_words: bool,
    /// term -> column, columns in alphabetical term order
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    /// Vectorizer that drops English stop words
    pub fn english() -> Self {
        Self {
            skip_stop_words: true,
            ..Self::default()
        }
    }

    /// Vectorizer that keeps every token
    pub fn keep_all_words() -> Self {
        Self::default()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn tokenize(&self, document: &str) -> Vec<String> {
        let lowered = document.to_lowercase();
        TOKEN_PATTERN
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|token| !(self.skip_stop_words && is_stop_word(token)))
            .map(str::to_string)
            .collect()
    }

    /// Learns the vocabulary and document frequencies
    pub fn fit(&mut self, documents: &[String]) {
        let tokenized: Vec<BTreeSet<String>> = documents
            .iter()
            .map(|doc| self.tokenize(doc).into_iter().collect())
            .collect();

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for terms in &tokenized {
            for term in terms {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() && !documents.is_empty() {
            warn!(documents = documents.len(), "Empty vocabulary; every description vectorizes to zero");
        }

        let n = documents.len() as f64;
        self.vocabulary = document_frequency
            .keys()
            .enumerate()
            .map(|(column, term)| (term.clone(), column))
            .collect();
        self.idf = document_frequency
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
    }

    /// One dense row per document over the fitted vocabulary.
    /// Unknown terms are ignored.
    pub fn transform(&self, documents: &[String]) -> Vec<Vec<f64>> {
        documents
            .iter()
            .map(|doc| {
                let mut row = vec![0.0; self.vocabulary.len()];
                for token in self.tokenize(doc) {
                    if let Some(&column) = self.vocabulary.get(&token) {
                        row[column] += 1.0;
                    }
                }
                for (value, idf) in row.iter_mut().zip(&self.idf) {
                    *value *= idf;
                }
                normalize(&mut row);
                row
            })
            .collect()
    }

    pub fn fit_transform(&mut self, documents: &[String]) -> Vec<Vec<f64>> {
        self.fit(documents);
        self.transform(documents)
    }
}

fn normalize(row: &mut [f64]) {
    let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in row.iter_mut() {
            *value /= norm;
        }
    }
}
