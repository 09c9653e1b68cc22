//! Batch scoring
//!
//! Extraction and classification fan out over a bounded set of blocking
//! workers. Prepared rows are then grouped by model and each group is
//! scored with a single matrix-vector product, followed by array-wide
//! bonus, boost and curve. Per-row bonus and boost values come from the
//! same `ScoringCore` functions the scalar path uses, so both paths agree
//! element-wise.

use chrono::{DateTime, Utc};
use lead_intel_core::{
    feature_fingerprint, ConversationTurn, LeadRecord, Outcome, PipelineError, ScoreResult,
    ScoringError, SignalVector,
};
use lead_intel_scoring::{LeadScorer, LinearModel, ModelKey, PreparedScore};
use ndarray::{Array1, Array2, ArrayView1};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cache::FeatureCache;
use crate::request::ScoreRequest;

/// One item that could not be scored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub index: usize,
    pub lead_id: String,
    pub cause: String,
}

/// Results in input order; failed items hold the emergency result
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub results: Vec<ScoreResult>,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
        }
    }

    /// Append another chunk, shifting its failure indices
    pub fn extend(&mut self, other: BatchOutcome) {
        let offset = self.results.len();
        self.results.extend(other.results);
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.failures
            .extend(other.failures.into_iter().map(|mut f| {
                f.index += offset;
                f
            }));
    }
}

/// Signals for a lead, consulting the feature cache first.
///
/// Only complete extractions are cached, so a degraded result is retried
/// on the next request.
pub(crate) fn cached_signals(
    scorer: &LeadScorer,
    features: &FeatureCache,
    lead: &LeadRecord,
    conversation: &[ConversationTurn],
    now: DateTime<Utc>,
) -> Outcome<SignalVector> {
    let key = feature_fingerprint(lead, conversation);
    if let Some(signals) = features.get(&key) {
        tracing::trace!(lead_id = %lead.id, "Feature cache hit");
        return Outcome::Complete(signals);
    }
    let outcome = scorer.extractor.extract_detailed(lead, conversation, now);
    if !outcome.is_degraded() {
        features.insert(key, outcome.value().clone());
    }
    outcome
}

fn prepare_item(
    scorer: &LeadScorer,
    features: &FeatureCache,
    request: &ScoreRequest,
    now: DateTime<Utc>,
) -> Outcome<PreparedScore> {
    let signals = cached_signals(scorer, features, &request.lead, &request.conversation, now);
    let segment = scorer
        .classifier
        .classify_detailed(&request.lead, &request.conversation);
    scorer.core.prepare(
        &request.lead,
        &request.conversation,
        signals.value(),
        *segment.value(),
        signals.is_degraded(),
    )
}

/// `rows · weights` for one model
fn group_dot(model: &LinearModel, rows: &[&[f64]]) -> Result<Array1<f64>, ScoringError> {
    let width = model.weights().len();
    let mut flat = Vec::with_capacity(rows.len() * width);
    for row in rows {
        if row.len() != width {
            return Err(ScoringError::ShapeMismatch {
                weights: width,
                features: row.len(),
            });
        }
        flat.extend_from_slice(row);
    }
    let matrix = Array2::from_shape_vec((rows.len(), width), flat).map_err(|_| {
        ScoringError::ShapeMismatch {
            weights: width,
            features: rows.first().map(|r| r.len()).unwrap_or(0),
        }
    })?;
    Ok(matrix.dot(&ArrayView1::from(model.weights())))
}

#[derive(Debug, Clone)]
pub struct BatchEngine {
    scorer: Arc<LeadScorer>,
    features: Arc<FeatureCache>,
    item_timeout: Duration,
}

impl BatchEngine {
    pub fn new(scorer: Arc<LeadScorer>, features: Arc<FeatureCache>, item_timeout: Duration) -> Self {
        Self {
            scorer,
            features,
            item_timeout,
        }
    }

    /// Score every request with at most `workers` extractions in flight
    pub async fn score_batch(
        &self,
        requests: Vec<ScoreRequest>,
        workers: usize,
        now: DateTime<Utc>,
    ) -> BatchOutcome {
        if requests.is_empty() {
            return BatchOutcome::empty();
        }
        let start = Instant::now();
        let total = requests.len();
        let identities: Vec<(String, String)> = requests
            .iter()
            .map(|r| (r.lead.id.clone(), r.fingerprint()))
            .collect();

        let prepared = self.prepare_all(requests, workers, now).await;

        let mut failures = Vec::new();
        let mut rows: Vec<Option<PreparedScore>> = Vec::with_capacity(total);
        let mut groups: HashMap<ModelKey, Vec<usize>> = HashMap::new();
        for (index, slot) in prepared.into_iter().enumerate() {
            let fail = |cause: String| BatchFailure {
                index,
                lead_id: identities[index].0.clone(),
                cause,
            };
            match slot {
                Some(Ok(outcome)) => {
                    if let Some((stage, cause)) = outcome.degradation() {
                        tracing::debug!(
                            fingerprint = %identities[index].1,
                            stage = %stage,
                            cause = %cause,
                            "Batch item degraded"
                        );
                    }
                    let prepared = outcome.into_value();
                    groups.entry(prepared.model_key).or_default().push(index);
                    rows.push(Some(prepared));
                },
                Some(Err(e)) => {
                    failures.push(fail(e.to_string()));
                    rows.push(None);
                },
                None => {
                    failures.push(fail("batch task did not complete".to_string()));
                    rows.push(None);
                },
            }
        }

        let core = &self.scorer.core;
        let mut results: Vec<Option<ScoreResult>> = vec![None; total];
        for (key, indices) in groups {
            let model = core.model(key);
            let group_rows: Vec<&[f64]> = indices
                .iter()
                .filter_map(|i| rows[*i].as_ref().map(|p| p.row.as_slice()))
                .collect();

            let dots = match group_dot(model, &group_rows) {
                Ok(dots) => dots,
                Err(e) => {
                    tracing::error!(model = %model.label(), error = %e, "Batch matrix product failed");
                    failures.extend(indices.iter().map(|&index| BatchFailure {
                        index,
                        lead_id: identities[index].0.clone(),
                        cause: e.to_string(),
                    }));
                    continue;
                },
            };

            let group: Vec<(usize, &PreparedScore)> = indices
                .iter()
                .filter_map(|&i| rows[i].as_ref().map(|p| (i, p)))
                .collect();
            let bonus: Array1<f64> = group
                .iter()
                .map(|(_, p)| core.calibration().intent_bonus(&p.signals))
                .collect();
            let boost: Array1<f64> = group.iter().map(|(_, p)| core.boost(p)).collect();
            let raw = (&dots + &bonus) * &boost;
            let scores = raw.mapv(|r| core.calibration().normalize(r));

            for (position, &(index, prepared)) in group.iter().enumerate() {
                if !dots[position].is_finite() {
                    let e = ScoringError::NonFiniteScore {
                        model: model.label().to_string(),
                    };
                    failures.push(BatchFailure {
                        index,
                        lead_id: identities[index].0.clone(),
                        cause: e.to_string(),
                    });
                    continue;
                }
                let mut result = core.assemble(
                    prepared,
                    scores[position],
                    raw[position],
                    bonus[position],
                    boost[position],
                );
                result.fingerprint = identities[index].1.clone();
                results[index] = Some(result);
            }
        }

        let per_item_ms = start.elapsed().as_secs_f64() * 1000.0 / total as f64;
        let results: Vec<ScoreResult> = results
            .into_iter()
            .zip(&identities)
            .map(|(result, (_, fingerprint))| {
                let mut result = result.unwrap_or_else(|| ScoreResult::emergency(fingerprint.as_str()));
                result.latency_ms = per_item_ms;
                result
            })
            .collect();

        failures.sort_by_key(|f| f.index);
        for failure in &failures {
            tracing::warn!(
                index = failure.index,
                lead_id = %failure.lead_id,
                cause = %failure.cause,
                "Batch item failed, emergency result used"
            );
        }

        BatchOutcome {
            succeeded: total - failures.len(),
            failed: failures.len(),
            results,
            failures,
        }
    }

    /// Run extraction, classification and model resolution per item.
    ///
    /// Slot `i` holds item `i`; a slot stays `None` only when its task was
    /// aborted or panicked.
    async fn prepare_all(
        &self,
        requests: Vec<ScoreRequest>,
        workers: usize,
        now: DateTime<Utc>,
    ) -> Vec<Option<Result<Outcome<PreparedScore>, PipelineError>>> {
        let total = requests.len();
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut tasks = JoinSet::new();

        for (index, request) in requests.into_iter().enumerate() {
            let semaphore = semaphore.clone();
            let scorer = self.scorer.clone();
            let features = self.features.clone();
            let timeout = self.item_timeout;

            tasks.spawn(async move {
                let result = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| PipelineError::Join(e.to_string()))?;
                    let work = tokio::task::spawn_blocking(move || {
                        prepare_item(&scorer, &features, &request, now)
                    });
                    match tokio::time::timeout(timeout, work).await {
                        Ok(Ok(prepared)) => Ok(prepared),
                        Ok(Err(e)) => Err(PipelineError::Join(e.to_string())),
                        Err(_) => Err(PipelineError::Timeout(timeout.as_millis() as u64)),
                    }
                }
                .await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<Result<Outcome<PreparedScore>, PipelineError>>> =
            (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "Batch task panicked"),
            }
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lead_intel_config::ScoringConfig;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn engine() -> BatchEngine {
        let scorer = Arc::new(LeadScorer::new(&ScoringConfig::default()).unwrap());
        let features = Arc::new(FeatureCache::new(100, Duration::from_secs(900)));
        BatchEngine::new(scorer, features, Duration::from_secs(2))
    }

    fn request(id: &str, budget: f64) -> ScoreRequest {
        let lead = LeadRecord::new(id)
            .with_budget(budget)
            .with_source("referral")
            .with_timeline("3_months");
        let turns = vec![ConversationTurn::lead("We are pre-approved and want to move soon", now())];
        ScoreRequest::new(lead, turns)
    }

    #[tokio::test]
    async fn test_batch_matches_scalar() {
        let engine = engine();
        let requests: Vec<ScoreRequest> = (0..12)
            .map(|i| request(&format!("lead-{}", i), 150_000.0 + 250_000.0 * i as f64))
            .collect();

        let batch = engine.score_batch(requests.clone(), 3, now()).await;
        assert_eq!(batch.succeeded, 12);
        assert_eq!(batch.failed, 0);

        let scorer = LeadScorer::new(&ScoringConfig::default()).unwrap();
        for (request, result) in requests.iter().zip(&batch.results) {
            let scalar = scorer
                .score(&request.lead, &request.conversation, now())
                .into_value();
            assert!((scalar.score - result.score).abs() < 1e-6);
            assert!((scalar.raw_score - result.raw_score).abs() < 1e-9);
            assert_eq!(scalar.intent_bonus, result.intent_bonus);
            assert_eq!(scalar.boost, result.boost);
            assert_eq!(scalar.tier, result.tier);
            assert_eq!(scalar.model_version, result.model_version);
            assert_eq!(result.fingerprint, request.fingerprint());
        }
    }

    #[tokio::test]
    async fn test_failed_item_isolated() {
        let engine = engine();
        let mut broken = request("broken", 300_000.0);
        broken.conversation = vec![
            ConversationTurn::agent("Hi", now()),
            ConversationTurn::lead("hello", now() - chrono::Duration::hours(1)),
        ];
        let requests = vec![request("ok-1", 300_000.0), broken, request("ok-2", 500_000.0)];

        let outcome = engine.score_batch(requests, 2, now()).await;
        assert_eq!(outcome.results.len(), 3);
        // a defaulted category degrades the item but still scores it
        assert_eq!(outcome.succeeded, 3);
        assert!(outcome.results[1].model_version.ends_with("+fallback"));
        assert!(!outcome.results[0].is_emergency());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let outcome = engine().score_batch(Vec::new(), 4, now()).await;
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.succeeded, 0);
    }

    #[test]
    fn test_group_dot_checks_width() {
        let model = LinearModel::new("m", &lead_intel_config::default_base_weights());
        let short = [1.0, 2.0];
        assert!(group_dot(&model, &[&short]).is_err());
        let ones = vec![1.0; model.weights().len()];
        let dots = group_dot(&model, &[&ones, &ones]).unwrap();
        assert!((dots[0] - 1.0).abs() < 1e-9);
        assert_eq!(dots.len(), 2);
    }

    #[test]
    fn test_extend_shifts_indices() {
        let mut first = BatchOutcome {
            results: vec![ScoreResult::emergency("a")],
            succeeded: 0,
            failed: 1,
            failures: vec![BatchFailure {
                index: 0,
                lead_id: "a".to_string(),
                cause: "x".to_string(),
            }],
        };
        let second = first.clone();
        first.extend(second);
        assert_eq!(first.results.len(), 2);
        assert_eq!(first.failures[1].index, 1);
        assert_eq!(first.failed, 2);
    }
}
