//! Core traits and types for lead scoring and routing
//!
//! This crate provides foundational types used across all other crates:
//! - Lead, conversation and agent data types
//! - The fixed signal schema and segment labels
//! - Score and routing result types
//! - Error taxonomy and stage outcomes
//! - Content fingerprints
//! - Collaborator traits (stores, agent directory, KV cache, clock)

pub mod conversation;
pub mod error;
pub mod fingerprint;
pub mod lead;
pub mod outcome;
pub mod routing;
pub mod score;
pub mod segment;
pub mod signals;
pub mod traits;

pub use conversation::{lead_text, ConversationTurn, Speaker};
pub use error::{
    CacheError, ClassificationError, Error, ExtractionError, PipelineError, Result, RoutingError,
    ScoringError, StoreError,
};
pub use fingerprint::{feature_fingerprint, lead_key_prefix, request_fingerprint};
pub use lead::{coerce_value, CoercedValue, EngagementCounters, LeadRecord, MAX_EXTRAS};
pub use outcome::{Outcome, Stage};
pub use routing::{
    AgentProfile, AgentStats, BackupAgent, LeadPriority, PriceRange, RoutingRecommendation,
    RoutingStrategy, FALLBACK_AGENT_ID, FALLBACK_CONFIDENCE,
};
pub use score::{
    FactorContribution, ScoreResult, Tier, EMERGENCY_MODEL_VERSION, MAX_CONFIDENCE,
    MIN_CONFIDENCE,
};
pub use segment::Segment;
pub use signals::{
    linear_decay, unit, Feature, SegmentSignal, SegmentSignals, SignalCategory, SignalName,
    SignalVector, SEGMENT_SIGNAL_COUNT, SIGNAL_COUNT,
};

pub use traits::{
    AgentDirectory, Clock, ConversationStore, FixedClock, KvCache, LeadStore, SystemClock,
};
