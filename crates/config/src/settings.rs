//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{batch, cache, monitor, observability, timing};
use crate::{ConfigError, RoutingConfig, ScoringConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation
    #[default]
    Development,
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub batch: BatchSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub monitor: MonitorSettings,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Versioned scoring model file; compiled defaults when absent
    #[serde(default)]
    pub scoring_config_path: Option<String>,

    /// Agent roster loaded by the service binary
    #[serde(default)]
    pub agents_path: Option<String>,

    /// NDJSON score requests replayed through the background mode at startup
    #[serde(default)]
    pub warmup_path: Option<String>,
}

/// Real-time pipeline limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub p95_target_ms: f64,
    pub pipeline_timeout_ms: u64,
    pub cache_timeout_ms: u64,
    pub result_ttl_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            p95_target_ms: timing::P95_TARGET_MS,
            pipeline_timeout_ms: timing::PIPELINE_TIMEOUT_MS,
            cache_timeout_ms: timing::CACHE_TIMEOUT_MS,
            result_ttl_secs: cache::RESULT_TTL_SECS,
        }
    }
}

/// Batch mode limits and worker counts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub fast_max_leads: usize,
    pub bulk_max_leads: usize,
    pub fast_workers: usize,
    pub bulk_workers: usize,
    pub background_workers: usize,
    pub item_timeout_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            fast_max_leads: batch::FAST_MAX_LEADS,
            bulk_max_leads: batch::BULK_MAX_LEADS,
            fast_workers: batch::FAST_WORKERS,
            bulk_workers: batch::BULK_WORKERS,
            background_workers: batch::BACKGROUND_WORKERS,
            item_timeout_ms: timing::BATCH_ITEM_TIMEOUT_MS,
        }
    }
}

/// Cache capacities and lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub result_capacity: usize,
    pub feature_capacity: usize,
    pub feature_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            result_capacity: cache::RESULT_CAPACITY,
            feature_capacity: cache::FEATURE_CAPACITY,
            feature_ttl_secs: cache::FEATURE_TTL_SECS,
        }
    }
}

/// Performance monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub window_size: usize,
    pub cache_hit_floor: f64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            window_size: monitor::WINDOW_SIZE,
            cache_hit_floor: monitor::CACHE_HIT_FLOOR,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_json: bool,
    pub metrics_enabled: bool,
    pub metrics_addr: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: observability::LOG_LEVEL.to_string(),
            log_json: false,
            metrics_enabled: true,
            metrics_addr: observability::METRICS_ADDR.to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_pipeline()?;
        self.validate_batch()?;
        self.validate_cache()?;
        self.validate_monitor()?;
        self.routing.validate()?;
        Ok(())
    }

    fn validate_pipeline(&self) -> Result<(), ConfigError> {
        let p = &self.pipeline;
        if p.p95_target_ms <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.p95_target_ms".to_string(),
                message: "Must be positive".to_string(),
            });
        }
        if p.cache_timeout_ms == 0 || p.cache_timeout_ms >= p.pipeline_timeout_ms {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.cache_timeout_ms".to_string(),
                message: format!(
                    "Must be between 1 and pipeline_timeout_ms ({}), got {}",
                    p.pipeline_timeout_ms, p.cache_timeout_ms
                ),
            });
        }
        if p.result_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.result_ttl_secs".to_string(),
                message: "TTL must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    fn validate_batch(&self) -> Result<(), ConfigError> {
        let b = &self.batch;
        for (field, value) in [
            ("batch.fast_workers", b.fast_workers),
            ("batch.bulk_workers", b.bulk_workers),
            ("batch.background_workers", b.background_workers),
            ("batch.fast_max_leads", b.fast_max_leads),
            ("batch.bulk_max_leads", b.bulk_max_leads),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Must be at least 1".to_string(),
                });
            }
        }
        if b.fast_max_leads > b.bulk_max_leads {
            return Err(ConfigError::InvalidValue {
                field: "batch.fast_max_leads".to_string(),
                message: "Must not exceed bulk_max_leads".to_string(),
            });
        }
        Ok(())
    }

    fn validate_cache(&self) -> Result<(), ConfigError> {
        if self.cache.result_capacity == 0 || self.cache.feature_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache".to_string(),
                message: "Capacities must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn validate_monitor(&self) -> Result<(), ConfigError> {
        if self.monitor.window_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.window_size".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }
        if !(0.0..1.0).contains(&self.monitor.cache_hit_floor) {
            return Err(ConfigError::InvalidValue {
                field: "monitor.cache_hit_floor".to_string(),
                message: format!(
                    "Must be in [0.0, 1.0), got {}",
                    self.monitor.cache_hit_floor
                ),
            });
        }
        Ok(())
    }

    /// Scoring configuration from `scoring_config_path`, or compiled defaults
    pub fn scoring_config(&self) -> Result<ScoringConfig, ConfigError> {
        match &self.scoring_config_path {
            Some(path) => ScoringConfig::load(path),
            None => Ok(ScoringConfig::default()),
        }
    }
}

/// Load settings from files and environment
///
/// Priority: `LEAD_INTEL__*` env vars > config/{env}.yaml > config/default.yaml > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("LEAD_INTEL")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

/// Load settings from one explicit file, without environment overrides
pub fn load_settings_from(path: &str) -> Result<Settings, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name(path))
        .build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}
