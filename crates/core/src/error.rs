//! Error taxonomy for the scoring and routing pipeline
//!
//! Every stage has its own error type. None of them ever reaches a
//! real-time caller: the orchestrator converts each into a documented
//! fallback and logs it with the request fingerprint.

use thiserror::Error;

/// One signal category could not be computed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Non-finite value in field '{field}'")]
    NonFinite { field: String },

    #[error("Conversation timestamps out of order at turn {index}")]
    UnorderedTimestamps { index: usize },

    #[error("Category '{category}' failed: {message}")]
    Category { category: String, message: String },

    #[error("Extraction worker failed: {0}")]
    Worker(String),
}

/// Segment classification failed; callers degrade to `general`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("Invalid budget value: {0}")]
    InvalidBudget(f64),

    #[error("Rule '{rule}' is invalid: {message}")]
    InvalidRule { rule: String, message: String },
}

/// A scoring model could not produce a result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Segment model '{segment}' failed: {message}")]
    SegmentModel { segment: String, message: String },

    #[error("Non-finite raw score from model '{model}'")]
    NonFiniteScore { model: String },

    #[error("Feature '{0}' is not known to the model")]
    UnknownFeature(String),

    #[error("Weight vector length {weights} does not match feature length {features}")]
    ShapeMismatch { weights: usize, features: usize },
}

/// Agent selection failed; callers receive the fallback sentinel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("No eligible agents among {total} candidates")]
    NoEligibleAgents { total: usize },

    #[error("Agent '{agent_id}' has invalid statistics: {message}")]
    InvalidAgent { agent_id: String, message: String },

    #[error("Agent directory unavailable: {0}")]
    Directory(String),
}

/// Orchestrator-level failure; callers receive the emergency result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Pipeline timed out after {0}ms")]
    Timeout(u64),

    #[error("Stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    #[error("Worker task failed: {0}")]
    Join(String),

    #[error("Orchestrator is shut down")]
    ShutDown,
}

/// Cache substrate failure; always treated as a miss.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("Cache operation timed out after {0}ms")]
    Timeout(u64),

    #[error("Cache serialization failed: {0}")]
    Serialization(String),

    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Lead or conversation store failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Lead '{0}' not found")]
    NotFound(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Aggregate error for the crate family
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtractionError::NonFinite {
            field: "budget".to_string(),
        };
        assert_eq!(err.to_string(), "Non-finite value in field 'budget'");

        let err: Error = CacheError::Timeout(20).into();
        assert_eq!(err.to_string(), "Cache operation timed out after 20ms");
    }

    #[test]
    fn test_routing_error_wraps() {
        let err: Error = RoutingError::NoEligibleAgents { total: 3 }.into();
        assert!(matches!(err, Error::Routing(_)));
    }
}
