//! Centralized constants
//!
//! Single source of truth for default values used across the workspace.

/// Latency targets and timeouts (milliseconds)
pub mod timing {
    /// p95 target for single-lead calls
    pub const P95_TARGET_MS: f64 = 100.0;

    /// Hard ceiling for the real-time miss path before falling back
    pub const PIPELINE_TIMEOUT_MS: u64 = 250;

    /// Ceiling for any single cache round-trip
    pub const CACHE_TIMEOUT_MS: u64 = 20;

    /// Ceiling for one batch item
    pub const BATCH_ITEM_TIMEOUT_MS: u64 = 2_000;
}

/// Cache sizing and lifetimes
pub mod cache {
    pub const RESULT_TTL_SECS: u64 = 300;
    pub const RESULT_CAPACITY: usize = 10_000;
    pub const FEATURE_TTL_SECS: u64 = 900;
    pub const FEATURE_CAPACITY: usize = 5_000;
}

/// Batch mode limits
pub mod batch {
    pub const FAST_MAX_LEADS: usize = 10;
    pub const BULK_MAX_LEADS: usize = 100;
    pub const FAST_WORKERS: usize = 5;
    pub const BULK_WORKERS: usize = 10;
    pub const BACKGROUND_WORKERS: usize = 4;
}

/// Monitor defaults
pub mod monitor {
    pub const WINDOW_SIZE: usize = 1_000;
    pub const CACHE_HIT_FLOOR: f64 = 0.05;
}

/// Model identity
pub mod model {
    pub const BASE_VERSION: &str = "2.1";
    pub const SEGMENT_VERSION: &str = "1.0";

    /// Hard ceiling on any segment multiplicative boost
    pub const MAX_BOOST: f64 = 1.15;

    /// Ceiling on the intent bonus added to the raw score
    pub const INTENT_BONUS_CAP: f64 = 0.25;

    /// Confidence multiplier applied on the degraded path
    pub const FALLBACK_CONFIDENCE_PENALTY: f64 = 0.7;
}

/// Observability defaults
pub mod observability {
    pub const LOG_LEVEL: &str = "info";
    pub const METRICS_ADDR: &str = "0.0.0.0:9100";
}
