//! Stage outcomes
//!
//! Stages never return errors to the orchestrator. They return the value
//! they managed to produce and say whether it is degraded.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage, used to attribute degradations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fingerprint,
    Cache,
    Extraction,
    Classification,
    Scoring,
    Routing,
    Pipeline,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fingerprint => "fingerprint",
            Stage::Cache => "cache",
            Stage::Extraction => "extraction",
            Stage::Classification => "classification",
            Stage::Scoring => "scoring",
            Stage::Routing => "routing",
            Stage::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one stage
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Complete(T),
    Degraded { value: T, stage: Stage, cause: String },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, stage: Stage, cause: impl Into<String>) -> Self {
        Outcome::Degraded {
            value,
            stage,
            cause: cause.into(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Complete(v) => v,
            Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Complete(v) => v,
            Outcome::Degraded { value, .. } => value,
        }
    }

    /// Stage and cause when degraded
    pub fn degradation(&self) -> Option<(Stage, &str)> {
        match self {
            Outcome::Complete(_) => None,
            Outcome::Degraded { stage, cause, .. } => Some((*stage, cause.as_str())),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Complete(v) => Outcome::Complete(f(v)),
            Outcome::Degraded {
                value,
                stage,
                cause,
            } => Outcome::Degraded {
                value: f(value),
                stage,
                cause,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let ok = Outcome::Complete(3);
        assert!(!ok.is_degraded());
        assert_eq!(*ok.value(), 3);

        let bad = Outcome::degraded(1, Stage::Extraction, "engagement failed");
        assert!(bad.is_degraded());
        assert_eq!(
            bad.degradation(),
            Some((Stage::Extraction, "engagement failed"))
        );
        assert_eq!(bad.map(|v| v * 10).into_value(), 10);
    }
}
