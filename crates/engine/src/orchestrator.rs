//! Inference orchestrator
//!
//! Entry point for every scoring request. The real-time path is:
//!
//! ```text
//! fingerprint ─► result cache ─hit─► cached outcome
//!                     │miss
//!                     ▼
//!   extraction (blocking pool) ∥ classification
//!                     ▼
//!              scoring core ─► agent router ─► result cache
//! ```
//!
//! The miss path runs under a deadline. Any failure or timeout is answered
//! with the base model over structured fields only, and if even that
//! cannot run, with the fixed emergency result. Callers never see an error.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use lead_intel_config::{ScoringConfig, Settings};
use lead_intel_core::{
    AgentDirectory, Clock, ConversationStore, ConversationTurn, KvCache, LeadRecord, LeadStore,
    Outcome, PipelineError, RoutingError, RoutingRecommendation, RoutingStrategy, ScoreResult,
    Segment, SignalVector, Stage, StoreError, SystemClock,
};
use lead_intel_routing::{lead_priority, AgentRouter};
use lead_intel_scoring::{BuildError, LeadScorer};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::batch::{cached_signals, BatchEngine, BatchOutcome};
use crate::cache::{FeatureCache, InMemoryKvCache, ResultCache};
use crate::memory::{InMemoryAgentDirectory, InMemoryConversationStore, InMemoryLeadStore};
use crate::monitor::{PerformanceMonitor, PerformanceReport};
use crate::request::{Degradation, InferenceMode, InferenceOutcome, ScoreRequest};

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn note<T>(degradations: &mut Vec<Degradation>, outcome: &Outcome<T>) {
    if let Some((stage, cause)) = outcome.degradation() {
        degradations.push(Degradation {
            stage,
            cause: cause.to_string(),
        });
    }
}

/// Wires collaborators into an `InferenceOrchestrator`.
///
/// Anything not supplied gets an in-memory implementation.
pub struct OrchestratorBuilder {
    settings: Settings,
    scoring: ScoringConfig,
    leads: Option<Arc<dyn LeadStore>>,
    conversations: Option<Arc<dyn ConversationStore>>,
    agents: Option<Arc<dyn AgentDirectory>>,
    kv_cache: Option<Arc<dyn KvCache>>,
    clock: Option<Arc<dyn Clock>>,
}

impl OrchestratorBuilder {
    pub fn new(settings: Settings, scoring: ScoringConfig) -> Self {
        Self {
            settings,
            scoring,
            leads: None,
            conversations: None,
            agents: None,
            kv_cache: None,
            clock: None,
        }
    }

    pub fn lead_store(mut self, store: Arc<dyn LeadStore>) -> Self {
        self.leads = Some(store);
        self
    }

    pub fn conversation_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.conversations = Some(store);
        self
    }

    pub fn agent_directory(mut self, directory: Arc<dyn AgentDirectory>) -> Self {
        self.agents = Some(directory);
        self
    }

    pub fn kv_cache(mut self, cache: Arc<dyn KvCache>) -> Self {
        self.kv_cache = Some(cache);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<InferenceOrchestrator, BuildError> {
        self.settings.validate()?;
        let settings = self.settings;
        let scorer = Arc::new(LeadScorer::new(&self.scoring)?);

        let result_ttl = Duration::from_secs(settings.pipeline.result_ttl_secs);
        let kv_cache = self.kv_cache.unwrap_or_else(|| {
            Arc::new(InMemoryKvCache::new(settings.cache.result_capacity, result_ttl))
        });
        let results = ResultCache::new(
            kv_cache,
            result_ttl,
            Duration::from_millis(settings.pipeline.cache_timeout_ms),
        );
        let features = Arc::new(FeatureCache::new(
            settings.cache.feature_capacity,
            Duration::from_secs(settings.cache.feature_ttl_secs),
        ));
        let batch = BatchEngine::new(
            scorer.clone(),
            features.clone(),
            Duration::from_millis(settings.batch.item_timeout_ms),
        );

        tracing::info!(
            base_model = %scorer.core.base_model().label(),
            segment_models = self.scoring.segment_models.len(),
            strategy = %settings.routing.default_strategy,
            "Inference orchestrator ready"
        );

        Ok(InferenceOrchestrator {
            router: AgentRouter::new(settings.routing.clone()),
            monitor: Arc::new(PerformanceMonitor::from_settings(
                &settings.monitor,
                &settings.pipeline,
            )),
            leads: self
                .leads
                .unwrap_or_else(|| Arc::new(InMemoryLeadStore::new())),
            conversations: self
                .conversations
                .unwrap_or_else(|| Arc::new(InMemoryConversationStore::new())),
            agents: self
                .agents
                .unwrap_or_else(|| Arc::new(InMemoryAgentDirectory::default())),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            settings,
            scorer,
            features,
            results,
            batch,
            shut_down: AtomicBool::new(false),
        })
    }
}

pub struct InferenceOrchestrator {
    settings: Settings,
    scorer: Arc<LeadScorer>,
    router: AgentRouter,
    features: Arc<FeatureCache>,
    results: ResultCache,
    batch: BatchEngine,
    monitor: Arc<PerformanceMonitor>,
    leads: Arc<dyn LeadStore>,
    conversations: Arc<dyn ConversationStore>,
    agents: Arc<dyn AgentDirectory>,
    clock: Arc<dyn Clock>,
    shut_down: AtomicBool,
}

impl InferenceOrchestrator {
    pub fn builder(settings: Settings, scoring: ScoringConfig) -> OrchestratorBuilder {
        OrchestratorBuilder::new(settings, scoring)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scorer(&self) -> &LeadScorer {
        &self.scorer
    }

    pub fn monitor(&self) -> Arc<PerformanceMonitor> {
        self.monitor.clone()
    }

    pub fn feature_cache(&self) -> &FeatureCache {
        &self.features
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Score one lead on the real-time path
    pub async fn score(
        &self,
        lead_id: &str,
        mut lead: LeadRecord,
        conversation: Vec<ConversationTurn>,
    ) -> ScoreResult {
        if lead.id != lead_id {
            if !lead.id.is_empty() {
                tracing::warn!(lead_id = %lead_id, record_id = %lead.id, "Lead record id differs, using the requested id");
            }
            lead.id = lead_id.to_string();
        }
        self.infer(ScoreRequest::new(lead, conversation), InferenceMode::RealTime)
            .await
            .score
    }

    /// Score, classify and route one lead
    pub async fn infer(&self, request: ScoreRequest, mode: InferenceMode) -> InferenceOutcome {
        self.execute(request, mode, mode == InferenceMode::RealTime)
            .await
            .0
    }

    /// Run one request; the flag says whether the outcome went to the cache
    async fn execute(
        &self,
        request: ScoreRequest,
        mode: InferenceMode,
        store: bool,
    ) -> (InferenceOutcome, bool) {
        let start = Instant::now();
        let fingerprint = request.fingerprint();

        if self.is_shut_down() {
            tracing::warn!(fingerprint = %fingerprint, "Request after shutdown, returning emergency result");
            self.monitor.record_error(Stage::Pipeline);
            let mut outcome = InferenceOutcome::emergency(
                &request.lead.id,
                &fingerprint,
                Stage::Pipeline,
                PipelineError::ShutDown.to_string(),
            );
            outcome.score.latency_ms = elapsed_ms(start);
            self.monitor
                .record(outcome.score.latency_ms, false, &outcome.score.model_version, true);
            return (outcome, false);
        }

        if mode == InferenceMode::RealTime {
            if let Some(mut cached) = self.results.get(&fingerprint).await {
                let latency = elapsed_ms(start);
                cached.score.cache_hit = true;
                cached.score.latency_ms = latency;
                self.monitor
                    .record(latency, true, &cached.score.model_version, false);
                tracing::debug!(fingerprint = %fingerprint, latency_ms = latency, "Result cache hit");
                return (cached, false);
            }
        }

        let now = self.clock.now();
        let pipeline = self.run_pipeline(&request, &fingerprint, now);
        let result = match self.budget(mode) {
            Some(budget) => tokio::time::timeout(budget, pipeline)
                .await
                .unwrap_or_else(|_| Err(PipelineError::Timeout(budget.as_millis() as u64))),
            None => pipeline.await,
        };

        let (mut outcome, completed) = match result {
            Ok(outcome) => (outcome, true),
            Err(e) => (self.fallback(&request, &fingerprint, now, &e), false),
        };

        for degradation in &outcome.degradations {
            tracing::warn!(
                fingerprint = %fingerprint,
                stage = %degradation.stage,
                cause = %degradation.cause,
                mode = %mode,
                "Inference degraded"
            );
            self.monitor.record_error(degradation.stage);
        }

        let latency = elapsed_ms(start);
        outcome.score.latency_ms = latency;
        self.monitor.record(
            latency,
            false,
            &outcome.score.model_version,
            outcome.is_degraded(),
        );

        // degraded outcomes are served but never cached
        let cacheable = completed && outcome.degradations.is_empty();
        let stored = store && cacheable && self.results.put(&fingerprint, &outcome).await;
        tracing::debug!(
            fingerprint = %fingerprint,
            score = outcome.score.score,
            tier = %outcome.score.tier,
            agent = %outcome.routing.agent_id,
            latency_ms = latency,
            "Inference complete"
        );
        (outcome, stored)
    }

    fn budget(&self, mode: InferenceMode) -> Option<Duration> {
        match mode {
            InferenceMode::RealTime => Some(Duration::from_millis(
                self.settings.pipeline.pipeline_timeout_ms,
            )),
            InferenceMode::BatchFast | InferenceMode::BatchBulk => {
                Some(Duration::from_millis(self.settings.batch.item_timeout_ms))
            },
            InferenceMode::Background => None,
        }
    }

    async fn run_pipeline(
        &self,
        request: &ScoreRequest,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<InferenceOutcome, PipelineError> {
        let extraction = {
            let scorer = self.scorer.clone();
            let features = self.features.clone();
            let lead = request.lead.clone();
            let conversation = request.conversation.clone();
            tokio::task::spawn_blocking(move || {
                cached_signals(&scorer, &features, &lead, &conversation, now)
            })
        };
        let classification = async {
            self.scorer
                .classifier
                .classify_detailed(&request.lead, &request.conversation)
        };
        let (signals, segment) = tokio::join!(extraction, classification);
        let signals = signals.map_err(|e| PipelineError::Join(e.to_string()))?;

        let mut degradations = Vec::new();
        note(&mut degradations, &signals);
        note(&mut degradations, &segment);

        let scored = self.scorer.core.score(
            &request.lead,
            &request.conversation,
            signals.value(),
            *segment.value(),
            signals.is_degraded(),
        );
        note(&mut degradations, &scored);
        let mut score = scored.into_value();
        if score.is_emergency() {
            return Err(PipelineError::Stage {
                stage: Stage::Scoring.to_string(),
                message: "no model could score the lead".to_string(),
            });
        }
        score.fingerprint = fingerprint.to_string();

        let signals = signals.into_value();
        let routing = self.route(&request.lead, &score, &signals, None).await;
        note(&mut degradations, &routing);

        Ok(InferenceOutcome {
            lead_id: request.lead.id.clone(),
            fingerprint: fingerprint.to_string(),
            score,
            signals,
            routing: routing.into_value(),
            degradations,
        })
    }

    /// Base model over structured fields, or the emergency result
    fn fallback(
        &self,
        request: &ScoreRequest,
        fingerprint: &str,
        now: DateTime<Utc>,
        cause: &PipelineError,
    ) -> InferenceOutcome {
        let signals = self.scorer.extractor.extract_minimal(&request.lead, now);
        let scored = self
            .scorer
            .core
            .score(&request.lead, &[], &signals, Segment::General, true);

        let mut score = scored.into_value();
        if score.is_emergency() {
            tracing::error!(fingerprint = %fingerprint, error = %cause, "Fallback scoring failed, returning emergency result");
            return InferenceOutcome::emergency(
                &request.lead.id,
                fingerprint,
                Stage::Pipeline,
                cause.to_string(),
            );
        }
        score.fingerprint = fingerprint.to_string();

        let priority = lead_priority(score.score, &signals, self.router.config());
        let routing = self.router.sentinel(
            priority,
            self.router.config().default_strategy,
            format!("pipeline fallback: {}", cause),
        );

        InferenceOutcome {
            lead_id: request.lead.id.clone(),
            fingerprint: fingerprint.to_string(),
            score,
            signals,
            routing,
            degradations: vec![Degradation {
                stage: Stage::Pipeline,
                cause: cause.to_string(),
            }],
        }
    }

    async fn route(
        &self,
        lead: &LeadRecord,
        score: &ScoreResult,
        signals: &SignalVector,
        strategy: Option<RoutingStrategy>,
    ) -> Outcome<RoutingRecommendation> {
        match self.agents.snapshot().await {
            Ok(agents) => self
                .router
                .recommend_detailed(lead, score, signals, &agents, strategy),
            Err(e) => {
                let priority = lead_priority(score.score, signals, self.router.config());
                let strategy = strategy.unwrap_or(self.router.config().default_strategy);
                Outcome::degraded(
                    self.router.sentinel(priority, strategy, e.to_string()),
                    Stage::Routing,
                    e.to_string(),
                )
            },
        }
    }

    /// Routing for an already scored lead
    pub async fn recommend_routing(
        &self,
        lead_id: &str,
        score: &ScoreResult,
        signals: &SignalVector,
        lead: &LeadRecord,
        strategy: Option<RoutingStrategy>,
    ) -> RoutingRecommendation {
        let outcome = self.route(lead, score, signals, strategy).await;
        if let Some((stage, cause)) = outcome.degradation() {
            tracing::warn!(lead_id = %lead_id, stage = %stage, cause = %cause, "Routing degraded");
            self.monitor.record_error(stage);
        }
        outcome.into_value()
    }

    /// Score many leads in mode-sized chunks, preserving input order
    pub async fn score_batch(&self, requests: Vec<ScoreRequest>, mode: InferenceMode) -> BatchOutcome {
        if self.is_shut_down() {
            tracing::warn!(count = requests.len(), "Batch after shutdown, returning emergency results");
            let mut outcome = BatchOutcome::empty();
            for (index, request) in requests.iter().enumerate() {
                outcome.results.push(ScoreResult::emergency(request.fingerprint()));
                outcome.failures.push(crate::batch::BatchFailure {
                    index,
                    lead_id: request.lead.id.clone(),
                    cause: PipelineError::ShutDown.to_string(),
                });
            }
            outcome.failed = outcome.failures.len();
            return outcome;
        }

        let mode = match mode {
            InferenceMode::RealTime => InferenceMode::BatchFast,
            other => other,
        };
        let chunk_size = mode.chunk_size(&self.settings.batch).max(1);
        let workers = mode.workers(&self.settings.batch);
        let total = requests.len();
        let now = self.clock.now();
        let start = Instant::now();

        let mut outcome = BatchOutcome::empty();
        let mut remaining = requests.into_iter().peekable();
        while remaining.peek().is_some() {
            let chunk: Vec<ScoreRequest> = remaining.by_ref().take(chunk_size).collect();
            outcome.extend(self.batch.score_batch(chunk, workers, now).await);
        }

        let failed: HashSet<usize> = outcome.failures.iter().map(|f| f.index).collect();
        for _ in &failed {
            self.monitor.record_error(Stage::Pipeline);
        }
        for (index, result) in outcome.results.iter().enumerate() {
            self.monitor.record(
                result.latency_ms,
                false,
                &result.model_version,
                failed.contains(&index),
            );
        }

        tracing::info!(
            mode = %mode,
            total,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            chunks = total.div_ceil(chunk_size),
            elapsed_ms = elapsed_ms(start),
            "Batch scored"
        );
        outcome
    }

    /// Pre-compute and cache outcomes in the background mode.
    ///
    /// Returns how many outcomes were stored.
    pub async fn warm_cache(&self, samples: Vec<ScoreRequest>) -> usize {
        let workers = InferenceMode::Background.workers(&self.settings.batch).max(1);
        let total = samples.len();
        let stored = stream::iter(samples)
            .map(|request| self.execute(request, InferenceMode::Background, true))
            .buffer_unordered(workers)
            .filter(|(_, stored)| futures::future::ready(*stored))
            .count()
            .await;
        tracing::info!(total, stored, "Cache warm-up finished");
        stored
    }

    /// Load a lead and its history from the stores and score it
    pub async fn score_by_id(&self, lead_id: &str) -> Result<InferenceOutcome, StoreError> {
        let lead = self.leads.get_lead(lead_id).await?;
        let conversation = match self.conversations.get_history(lead_id).await {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!(lead_id = %lead_id, error = %e, "Conversation unavailable, scoring profile only");
                Vec::new()
            },
        };
        Ok(self
            .infer(ScoreRequest::new(lead, conversation), InferenceMode::RealTime)
            .await)
    }

    /// Drop every cached outcome of one lead
    pub async fn invalidate_lead(&self, lead_id: &str) -> usize {
        match self.results.invalidate_lead(lead_id).await {
            Ok(removed) => {
                tracing::debug!(lead_id = %lead_id, removed, "Lead invalidated");
                removed
            },
            Err(e) => {
                tracing::warn!(lead_id = %lead_id, error = %e, "Cache invalidation failed");
                self.monitor.record_error(Stage::Cache);
                0
            },
        }
    }

    /// Tell the directory a recommendation was acted on
    pub async fn commit_assignment(
        &self,
        lead_id: &str,
        recommendation: &RoutingRecommendation,
    ) -> Result<(), RoutingError> {
        if recommendation.is_fallback {
            tracing::debug!(lead_id = %lead_id, "Fallback recommendation, nothing to commit");
            return Ok(());
        }
        self.agents
            .record_assignment(&recommendation.agent_id, lead_id)
            .await?;
        tracing::info!(
            lead_id = %lead_id,
            agent_id = %recommendation.agent_id,
            priority = %recommendation.priority,
            "Lead assigned"
        );
        Ok(())
    }

    pub fn performance_metrics(&self) -> PerformanceReport {
        self.monitor.report()
    }

    /// Stop accepting work; later calls get emergency results
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let report = self.monitor.report();
        tracing::info!(
            total_requests = report.total_requests,
            p95_ms = report.p95_ms,
            cache_hit_rate = report.cache_hit_rate,
            "Inference orchestrator shut down"
        );
    }
}
