//! Event Vectorizer
//!
//! Turns an event's non-time fields into a TF-IDF weighted, L2-normalised
//! vector over a fixed vocabulary. The vocabulary order is the model's
//! feature layout; its CRC32 is stored in the model header so a model is never
//! scored against a different layout.

use std::collections::HashMap;

use crc32fast::Hasher;
use ndarray::Array1;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::logic::event::fields::is_time_key;
use crate::logic::event::LogEvent;

/// Word tokens of two or more characters
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("static token regex"));

/// Text form of an event: `key:value` pairs, time fields dropped
pub fn event_text(event: &LogEvent) -> String {
    event
        .iter()
        .filter(|(k, v)| !v.trim().is_empty() && !is_time_key(k))
        .map(|(k, v)| format!("{}:{}", k, v.trim()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-cased word tokens of an event
pub fn tokenize(event: &LogEvent) -> Vec<String> {
    let text = event_text(event).to_lowercase();
    TOKEN_RE
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// CRC32 of the vocabulary in index order
pub fn vocabulary_hash(vocabulary: &[String]) -> u32 {
    let mut hasher = Hasher::new();
    for token in vocabulary {
        hasher.update(token.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize()
}

#[derive(Debug, Clone)]
pub struct Vectorizer {
    index: HashMap<String, usize>,
    idf: Array1<f32>,
}

impl Vectorizer {
    /// `idf` must have one entry per vocabulary token
    pub fn new(vocabulary: &[String], idf: Vec<f32>) -> Self {
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, token)| (token.clone(), i))
            .collect();
        Self {
            index,
            idf: Array1::from(idf),
        }
    }

    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    /// Unknown tokens are ignored; an event with no known token is the zero vector
    pub fn transform(&self, event: &LogEvent) -> Array1<f32> {
        let mut vector = Array1::<f32>::zeros(self.dimension());
        for token in tokenize(event) {
            if let Some(&i) = self.index.get(&token) {
                vector[i] += 1.0;
            }
        }
        vector *= &self.idf;

        let norm = vector.dot(&vector).sqrt();
        if norm > 0.0 {
            vector /= norm;
        }
        vector
    }
}
