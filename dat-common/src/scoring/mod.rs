//! Scoring capability and per-row outcomes
//!
//! The scoring engine is consumed through the [`Scorer`] trait: given the
//! words of one row and a minimum count it yields a numeric score or signals
//! that there are not enough usable words. Engines are injected as
//! `Arc<dyn Scorer>`; the workflow never knows which one it is talking to.

pub mod embedding;
pub mod rows;
pub mod stub;

use std::fmt;

use thiserror::Error;

pub use embedding::EmbeddingScorer;
pub use rows::{RowScorer, ScoringLimits};
pub use stub::{FixedScorer, FnScorer};

/// Rendered score for rows whose word list is too short
pub const NOT_ENOUGH_WORDS: &str = "not enough words";

/// Successful result of a scoring call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Numeric(f64),
    /// Fewer usable words than the requested minimum
    Insufficient,
}

/// Error signalled by a scoring engine for one word list
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("at least two words are required to compute a distance")]
    TooFewWords,

    #[error("zero-length vector for word '{0}'")]
    DegenerateVector(String),

    #[error("{0}")]
    Engine(String),
}

/// The external scoring capability
pub trait Scorer: Send + Sync {
    /// Engine name for logs and diagnostics
    fn name(&self) -> &str;

    fn score(&self, words: &[String], minimum: usize) -> Result<Score, ScoringError>;
}

/// Outcome recorded for one scored row
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Numeric(f64),
    Insufficient,
    Failure(String),
}

impl ScoreOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ScoreOutcome::Failure(_))
    }
}

impl From<Result<Score, ScoringError>> for ScoreOutcome {
    fn from(result: Result<Score, ScoringError>) -> Self {
        match result {
            Ok(Score::Numeric(value)) => ScoreOutcome::Numeric(value),
            Ok(Score::Insufficient) => ScoreOutcome::Insufficient,
            Err(e) => ScoreOutcome::Failure(e.to_string()),
        }
    }
}

impl fmt::Display for ScoreOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreOutcome::Numeric(value) => f.write_str(&render_float(*value)),
            ScoreOutcome::Insufficient => f.write_str(NOT_ENOUGH_WORDS),
            ScoreOutcome::Failure(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// Shortest round-trip decimal form of a score
///
/// Whole numbers keep a fractional part ("1.0"), exponents are signed and at
/// least two digits ("1e-05", "1e+16"), and NaN renders as "nan".
fn render_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let repr = format!("{:?}", value);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => repr,
    }
}
