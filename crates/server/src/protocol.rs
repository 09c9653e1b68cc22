//! Line protocol
//!
//! Each input line is one JSON object with an `op` field:
//!
//! ```text
//! {"op":"score", "lead":{...}, "conversation":[...]}          -> InferenceOutcome
//! {"op":"batch", "mode":"batch_bulk", "requests":[...]}       -> BatchOutcome
//! {"op":"score_by_id", "lead_id":"..."}                       -> InferenceOutcome
//! {"op":"route", "lead":{...}, "score":{...}, "signals":{...}} -> RoutingRecommendation
//! {"op":"invalidate", "lead_id":"..."}                        -> {"removed": n}
//! {"op":"commit", "lead_id":"...", "recommendation":{...}}    -> {}
//! {"op":"warm", "samples":[...]}                              -> {"stored": n}
//! {"op":"metrics"}                                            -> PerformanceReport
//! ```
//!
//! An optional `id` is echoed back; one is generated when absent.

use lead_intel_core::{
    LeadRecord, RoutingRecommendation, RoutingStrategy, ScoreResult, SignalVector,
};
use lead_intel_engine::{InferenceMode, InferenceOrchestrator, ScoreRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Score {
        #[serde(flatten)]
        request: ScoreRequest,
        #[serde(default)]
        mode: InferenceMode,
    },
    Batch {
        requests: Vec<ScoreRequest>,
        #[serde(default = "default_batch_mode")]
        mode: InferenceMode,
    },
    ScoreById {
        lead_id: String,
    },
    Route {
        lead: LeadRecord,
        score: ScoreResult,
        signals: SignalVector,
        #[serde(default)]
        strategy: Option<RoutingStrategy>,
    },
    Invalidate {
        lead_id: String,
    },
    Commit {
        lead_id: String,
        recommendation: RoutingRecommendation,
    },
    Warm {
        samples: Vec<ScoreRequest>,
    },
    Metrics,
}

fn default_batch_mode() -> InferenceMode {
    InferenceMode::BatchBulk
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Score { .. } => "score",
            Command::Batch { .. } => "batch",
            Command::ScoreById { .. } => "score_by_id",
            Command::Route { .. } => "route",
            Command::Invalidate { .. } => "invalidate",
            Command::Commit { .. } => "commit",
            Command::Warm { .. } => "warm",
            Command::Metrics => "metrics",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    id: Option<String>,
    #[serde(flatten)]
    command: serde_json::Map<String, Value>,
}

/// One response line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    fn success(id: String, op: &str, result: Value) -> Self {
        Self {
            id,
            ok: true,
            op: Some(op.to_string()),
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: String, op: Option<&str>, error: impl Into<String>) -> Self {
        Self {
            id,
            ok: false,
            op: op.map(str::to_string),
            result: None,
            error: Some(error.into()),
        }
    }

    /// Serialized response without a trailing newline
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"id":{:?},"ok":false,"error":"unserializable response: {}"}}"#, self.id, e)
        })
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

/// Parse and execute one input line
pub async fn handle_line(orchestrator: &InferenceOrchestrator, line: &str) -> Response {
    let envelope: Envelope = match serde_json::from_str(line) {
        Ok(envelope) => envelope,
        Err(e) => {
            return Response::failure(
                uuid::Uuid::new_v4().to_string(),
                None,
                format!("invalid JSON: {}", e),
            )
        },
    };
    let id = envelope
        .id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let command: Command = match serde_json::from_value(Value::Object(envelope.command)) {
        Ok(command) => command,
        Err(e) => return Response::failure(id, None, format!("invalid command: {}", e)),
    };
    let op = command.name();

    let span = tracing::debug_span!("command", request_id = %id, op);
    match execute(orchestrator, command).instrument(span).await {
        Ok(result) => Response::success(id, op, result),
        Err(error) => {
            tracing::warn!(request_id = %id, op, error = %error, "Command failed");
            Response::failure(id, Some(op), error)
        },
    }
}

async fn execute(orchestrator: &InferenceOrchestrator, command: Command) -> Result<Value, String> {
    match command {
        Command::Score { request, mode } => to_value(&orchestrator.infer(request, mode).await),
        Command::Batch { requests, mode } => {
            to_value(&orchestrator.score_batch(requests, mode).await)
        },
        Command::ScoreById { lead_id } => {
            let outcome = orchestrator
                .score_by_id(&lead_id)
                .await
                .map_err(|e| e.to_string())?;
            to_value(&outcome)
        },
        Command::Route {
            lead,
            score,
            signals,
            strategy,
        } => {
            let recommendation = orchestrator
                .recommend_routing(&lead.id, &score, &signals, &lead, strategy)
                .await;
            to_value(&recommendation)
        },
        Command::Invalidate { lead_id } => {
            let removed = orchestrator.invalidate_lead(&lead_id).await;
            Ok(serde_json::json!({ "removed": removed }))
        },
        Command::Commit {
            lead_id,
            recommendation,
        } => {
            orchestrator
                .commit_assignment(&lead_id, &recommendation)
                .await
                .map_err(|e| e.to_string())?;
            Ok(serde_json::json!({}))
        },
        Command::Warm { samples } => {
            let stored = orchestrator.warm_cache(samples).await;
            Ok(serde_json::json!({ "stored": stored }))
        },
        Command::Metrics => to_value(&orchestrator.performance_metrics()),
    }
}
