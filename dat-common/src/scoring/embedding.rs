//! Word-vector DAT engine
//!
//! Scores a word list as the mean pairwise cosine distance between the word
//! embeddings, scaled by 100. Only the first `minimum` unique valid words take
//! part, so every row is compared on the same number of words.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use super::{Score, Scorer, ScoringError};
use crate::{Error, Result};

/// Embedding-backed scorer loaded from a GloVe-style text file
#[derive(Debug, Clone)]
pub struct EmbeddingScorer {
    vectors: HashMap<String, Vec<f32>>,
}

impl EmbeddingScorer {
    /// Load vectors for the words listed in `dictionary_path`
    ///
    /// The vectors file holds one `word v1 v2 ...` line per word; lines for
    /// words outside the dictionary are skipped without being parsed.
    pub fn load(vectors_path: &Path, dictionary_path: &Path) -> Result<Self> {
        let dictionary: HashSet<String> = std::fs::read_to_string(dictionary_path)
            .map_err(|e| {
                Error::Config(format!(
                    "Cannot read dictionary {}: {}",
                    dictionary_path.display(),
                    e
                ))
            })?
            .lines()
            .map(str::trim)
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect();

        let file = File::open(vectors_path).map_err(|e| {
            Error::Config(format!(
                "Cannot open word vectors {}: {}",
                vectors_path.display(),
                e
            ))
        })?;

        let mut vectors = HashMap::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            let mut tokens = line.trim_end().split(' ');
            let Some(word) = tokens.next() else {
                continue;
            };
            if !dictionary.contains(word) {
                continue;
            }
            let values = tokens
                .map(|token| token.trim().parse::<f32>())
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| Error::Config(format!("Invalid vector for '{}': {}", word, e)))?;
            vectors.insert(word.to_string(), values);
        }

        info!(
            dictionary_words = dictionary.len(),
            vectors = vectors.len(),
            path = %vectors_path.display(),
            "Word vectors loaded"
        );

        Ok(Self { vectors })
    }

    pub fn from_vectors(vectors: HashMap<String, Vec<f32>>) -> Self {
        Self { vectors }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectors.len()
    }

    /// Normalize a raw cell into a known vocabulary word
    ///
    /// Keeps ASCII letters, hyphens and spaces, lowercases, and tries the
    /// hyphenated and concatenated spellings of multi-word entries.
    pub fn validate(&self, word: &str) -> Option<String> {
        let clean: String = word
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || *c == '-' || *c == ' ')
            .collect::<String>()
            .trim()
            .to_lowercase();

        if clean.chars().count() <= 1 {
            return None;
        }

        let mut candidates = Vec::with_capacity(2);
        if clean.contains(' ') {
            candidates.push(clean.split_whitespace().collect::<Vec<_>>().join("-"));
            candidates.push(clean.split_whitespace().collect::<String>());
        } else if clean.contains('-') {
            candidates.push(clean.replace('-', ""));
            candidates.insert(0, clean);
        } else {
            candidates.push(clean);
        }

        candidates
            .into_iter()
            .find(|candidate| self.vectors.contains_key(candidate))
    }

    /// Cosine distance between two vocabulary words
    fn distance(&self, first: &str, second: &str) -> std::result::Result<f64, ScoringError> {
        let a = self.vector(first)?;
        let b = self.vector(second)?;

        let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
        let norm_a = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
        let norm_b = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

        if norm_a == 0.0 {
            return Err(ScoringError::DegenerateVector(first.to_string()));
        }
        if norm_b == 0.0 {
            return Err(ScoringError::DegenerateVector(second.to_string()));
        }

        Ok(1.0 - dot / (norm_a * norm_b))
    }

    fn vector(&self, word: &str) -> std::result::Result<&[f32], ScoringError> {
        self.vectors
            .get(word)
            .map(Vec::as_slice)
            .ok_or_else(|| ScoringError::Engine(format!("no vector for '{}'", word)))
    }
}

impl Scorer for EmbeddingScorer {
    fn name(&self) -> &str {
        "embedding"
    }

    fn score(&self, words: &[String], minimum: usize) -> std::result::Result<Score, ScoringError> {
        let mut uniques: Vec<String> = Vec::new();
        for word in words {
            if let Some(valid) = self.validate(word) {
                if !uniques.contains(&valid) {
                    uniques.push(valid);
                }
            }
        }

        if uniques.len() < minimum {
            return Ok(Score::Insufficient);
        }
        let subset = &uniques[..minimum];

        let mut distances = Vec::new();
        for (i, first) in subset.iter().enumerate() {
            for second in &subset[i + 1..] {
                distances.push(self.distance(first, second)?);
            }
        }

        if distances.is_empty() {
            return Err(ScoringError::TooFewWords);
        }

        let mean = distances.iter().sum::<f64>() / distances.len() as f64;
        Ok(Score::Numeric(mean * 100.0))
    }
}
