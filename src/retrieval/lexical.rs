//! Lexical relevance scoring (BM25 over descriptor text)
//!
//! Corpus statistics are computed per retrieval pass from the catalog
//! snapshot, so scores are deterministic for a fixed snapshot and query.

use std::collections::HashMap;

const K1: f64 = 1.2;
const B: f64 = 0.75;

/// Lowercase alphanumeric tokens, minimum length 2.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(str::to_string)
        .collect()
}

/// BM25 index over the tokenized descriptor texts of one catalog snapshot.
pub struct LexicalIndex {
    docs: Vec<Vec<String>>,
    doc_freq: HashMap<String, usize>,
    avg_len: f64,
}

impl LexicalIndex {
    /// Build an index from pre-tokenized documents.
    pub fn build(docs: Vec<Vec<String>>) -> Self {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in &docs {
            let mut seen: Vec<&String> = Vec::new();
            for token in doc {
                if !seen.contains(&token) {
                    seen.push(token);
                    *doc_freq.entry(token.clone()).or_insert(0) += 1;
                }
            }
        }

        let total_len: usize = docs.iter().map(|d| d.len()).sum();
        let avg_len = if docs.is_empty() {
            0.0
        } else {
            total_len as f64 / docs.len() as f64
        };

        Self { docs, doc_freq, avg_len }
    }

    /// BM25 score of document `idx` against the query tokens.
    pub fn score(&self, idx: usize, query: &[String]) -> f64 {
        let Some(doc) = self.docs.get(idx) else {
            return 0.0;
        };
        if doc.is_empty() || query.is_empty() {
            return 0.0;
        }

        let n = self.docs.len() as f64;
        let doc_len = doc.len() as f64;
        let mut score = 0.0;

        for term in query {
            let tf = doc.iter().filter(|t| *t == term).count() as f64;
            if tf == 0.0 {
                continue;
            }
            let df = *self.doc_freq.get(term).unwrap_or(&0) as f64;
            let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
            let norm = tf * (K1 + 1.0) / (tf + K1 * (1.0 - B + B * doc_len / self.avg_len));
            score += idf * norm;
        }

        score
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
