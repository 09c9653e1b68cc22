//! Configuration management for lead scoring and routing
//!
//! Supports loading configuration from:
//! - YAML files (config/default.yaml, config/{env}.yaml)
//! - Environment variables (LEAD_INTEL__ prefix)
//! - A versioned scoring model file (weights, lexicons, segment models)
//!
//! Every section has compiled defaults, so a missing file never prevents
//! startup; invalid values are rejected by `validate()`.

pub mod constants;
pub mod extraction;
pub mod routing;
pub mod scoring;
pub mod segments;
pub mod settings;

pub use extraction::{
    default_lexicon, DecayWindow, ExtractionConfig, LexiconEntry, MarketBand, MatchMode,
    PhraseValue, Saturation, StageLexicon,
};
pub use routing::{
    EscalationConfig, HybridWeightTable, HybridWeights, PerformanceConfig, PriorityTable,
    RoutingConfidenceConfig, RoutingConfig, SpecializationConfig,
};
pub use scoring::{
    default_base_weights, BonusRule, BoostRule, ConditionMode, ConfidenceConfig, FeatureWeight,
    IntentBonusConfig, Knot, NormalizationConfig, ScoringConfig, SegmentModelConfig,
    SegmentSignalConfig, SignalCondition, TierBands, TierConfig,
};
pub use segments::{SegmentRule, SegmentRulesConfig};
pub use settings::{
    load_settings, load_settings_from, BatchSettings, CacheSettings, MonitorSettings,
    ObservabilityConfig, PipelineSettings, RuntimeEnvironment, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
