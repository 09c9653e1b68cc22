//! Inference engine for lead scoring and routing
//!
//! Wires the synchronous scoring crates into an async service:
//! - `InferenceOrchestrator`: real-time, batch and background entry points
//! - `BatchEngine`: bounded fan-out and one matrix product per model
//! - `ResultCache` / `FeatureCache`: TTL caches in front of the pipeline
//! - `PerformanceMonitor`: rolling latency and cache statistics
//! - In-memory stores and agent directory for tests and local runs

pub mod batch;
pub mod cache;
pub mod memory;
pub mod monitor;
pub mod orchestrator;
pub mod request;

pub use batch::{BatchEngine, BatchFailure, BatchOutcome};
pub use cache::{FeatureCache, InMemoryKvCache, ResultCache, TtlLruCache};
pub use memory::{InMemoryAgentDirectory, InMemoryConversationStore, InMemoryLeadStore};
pub use monitor::{PerformanceMonitor, PerformanceReport};
pub use orchestrator::{InferenceOrchestrator, OrchestratorBuilder};
pub use request::{Degradation, InferenceMode, InferenceOutcome, ScoreRequest};
