//! Token Model - trained forwarding classifier
//!
//! Logistic model over TF-IDF token vectors, exported by the training
//! pipeline as JSON. Loading verifies:
//! - the optional `<model>.sha256` sidecar (file integrity)
//! - the vocabulary CRC32 in the header (feature layout compatibility)
//! - vector lengths (vocabulary / idf / weights)

use std::path::{Path, PathBuf};

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::vectorizer::{vocabulary_hash, Vectorizer};
use super::{ForwardClassifier, Prediction};
use crate::error::ModelError;
use crate::logic::event::LogEvent;

// ============================================================================
// MODEL FILE
// ============================================================================

/// On-disk model layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    #[serde(default = "default_model_type")]
    pub model_type: String,
    pub vocabulary: Vec<String>,
    pub idf: Vec<f32>,
    pub weights: Vec<f32>,
    pub bias: f32,
    /// CRC32 of the vocabulary, checked at load when present
    #[serde(default)]
    pub vocabulary_hash: Option<u32>,
}

fn default_model_type() -> String {
    "logistic".to_string()
}

// ============================================================================
// TOKEN MODEL
// ============================================================================

#[derive(Debug, Clone)]
pub struct TokenModel {
    source: Option<PathBuf>,
    vectorizer: Vectorizer,
    weights: Array1<f32>,
    bias: f32,
}

impl TokenModel {
    /// Load and verify a model file
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        log::info!("Loading forwarding model from: {}", path.display());

        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)?;
        verify_checksum(path, &bytes)?;

        let file: ModelFile = serde_json::from_slice(&bytes)?;
        let mut model = Self::from_model_file(file)?;
        model.source = Some(path.to_path_buf());

        log::info!("Forwarding model loaded ({} features)", model.vectorizer.dimension());
        Ok(model)
    }

    pub fn from_model_file(file: ModelFile) -> Result<Self, ModelError> {
        let n = file.vocabulary.len();
        if file.idf.len() != n || file.weights.len() != n {
            return Err(ModelError::Invalid(format!(
                "vocabulary has {} tokens but idf has {} and weights {}",
                n,
                file.idf.len(),
                file.weights.len()
            )));
        }

        if let Some(expected) = file.vocabulary_hash {
            let actual = vocabulary_hash(&file.vocabulary);
            if expected != actual {
                return Err(ModelError::VocabularyMismatch { expected, actual });
            }
        }

        Ok(Self {
            source: None,
            vectorizer: Vectorizer::new(&file.vocabulary, file.idf),
            weights: Array1::from(file.weights),
            bias: file.bias,
        })
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Probability that the event must be forwarded
    pub fn score(&self, event: &LogEvent) -> f32 {
        let x = self.vectorizer.transform(event);
        sigmoid(self.weights.dot(&x) + self.bias)
    }
}

impl ForwardClassifier for TokenModel {
    fn name(&self) -> &str {
        "token-model"
    }

    fn predict(&self, events: &[LogEvent]) -> Vec<Prediction> {
        events
            .iter()
            .map(|event| Prediction::binary(self.score(event)))
            .collect()
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

/// Compare against `<model>.sha256` when the sidecar exists
fn verify_checksum(path: &Path, bytes: &[u8]) -> Result<(), ModelError> {
    let mut sidecar = path.as_os_str().to_owned();
    sidecar.push(".sha256");
    let sidecar = PathBuf::from(sidecar);
    if !sidecar.exists() {
        log::debug!("No checksum sidecar for {}", path.display());
        return Ok(());
    }

    let expected = std::fs::read_to_string(&sidecar)?
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let actual = hex::encode(Sha256::digest(bytes));

    if expected != actual {
        return Err(ModelError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}
