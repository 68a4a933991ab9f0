//! Deterministic scorers for tests and smoke runs

use super::{Score, Scorer, ScoringError};

/// Always returns the same numeric score
#[derive(Debug, Clone, Copy)]
pub struct FixedScorer {
    value: f64,
}

impl FixedScorer {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Scorer for FixedScorer {
    fn name(&self) -> &str {
        "fixed"
    }

    fn score(&self, _words: &[String], _minimum: usize) -> Result<Score, ScoringError> {
        Ok(Score::Numeric(self.value))
    }
}

/// Delegates every call to a closure
pub struct FnScorer<F> {
    f: F,
}

impl<F> FnScorer<F>
where
    F: Fn(&[String], usize) -> Result<Score, ScoringError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Scorer for FnScorer<F>
where
    F: Fn(&[String], usize) -> Result<Score, ScoringError> + Send + Sync,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn score(&self, words: &[String], minimum: usize) -> Result<Score, ScoringError> {
        (self.f)(words, minimum)
    }
}
