//! Lead scoring service
//!
//! Wires configuration, collaborators and the inference orchestrator into
//! a long-running process. Requests arrive as newline-delimited JSON
//! commands; every command produces exactly one JSON response line.

pub mod protocol;
pub mod telemetry;

pub use protocol::{handle_line, Command, Response};
pub use telemetry::init_metrics;

use lead_intel_config::Settings;
use lead_intel_core::AgentProfile;
use lead_intel_engine::{InMemoryAgentDirectory, InferenceOrchestrator, ScoreRequest};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] lead_intel_config::ConfigError),

    #[error("Failed to build scoring pipeline: {0}")]
    Build(#[from] lead_intel_scoring::BuildError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {message}")]
    Json { path: String, message: String },

    #[error("Metrics exporter error: {0}")]
    Metrics(String),
}

fn read_file(path: &Path) -> Result<String, ServerError> {
    std::fs::read_to_string(path).map_err(|source| ServerError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Agent roster from a JSON array of profiles
pub fn load_agents(path: impl AsRef<Path>) -> Result<Vec<AgentProfile>, ServerError> {
    let path = path.as_ref();
    let raw = read_file(path)?;
    serde_json::from_str(&raw).map_err(|e| ServerError::Json {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Score requests from an NDJSON file; blank lines are skipped and bad
/// lines are logged and dropped
pub fn load_warmup_samples(path: impl AsRef<Path>) -> Result<Vec<ScoreRequest>, ServerError> {
    let path = path.as_ref();
    let raw = read_file(path)?;
    let mut samples = Vec::new();
    for (number, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ScoreRequest>(line) {
            Ok(request) => samples.push(request),
            Err(e) => tracing::warn!(
                path = %path.display(),
                line = number + 1,
                error = %e,
                "Skipping invalid warm-up sample"
            ),
        }
    }
    Ok(samples)
}

/// Build the orchestrator described by `settings`
///
/// A missing or unreadable agent roster is not fatal: routing then answers
/// with the unassigned queue until the roster is fixed.
pub fn build_orchestrator(settings: &Settings) -> Result<InferenceOrchestrator, ServerError> {
    let scoring = settings.scoring_config()?;

    let agents = match &settings.agents_path {
        Some(path) => match load_agents(path) {
            Ok(agents) => {
                tracing::info!(path = %path, count = agents.len(), "Loaded agent roster");
                agents
            },
            Err(e) => {
                tracing::warn!(error = %e, "Agent roster unavailable, routing to unassigned queue");
                Vec::new()
            },
        },
        None => {
            tracing::warn!("No agent roster configured, routing to unassigned queue");
            Vec::new()
        },
    };

    let orchestrator = InferenceOrchestrator::builder(settings.clone(), scoring)
        .agent_directory(Arc::new(InMemoryAgentDirectory::new(agents)))
        .build()?;
    Ok(orchestrator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_agents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "a1", "capacity": 10, "specializations": ["luxury"]}},
                {{"id": "a2", "capacity": 5, "current_load": 5}}]"#
        )
        .unwrap();
        let agents = load_agents(file.path()).unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].specializations, vec!["luxury".to_string()]);
        assert!(!agents[1].is_eligible());
    }

    #[test]
    fn test_load_agents_errors() {
        assert!(matches!(
            load_agents("/nonexistent/agents.json"),
            Err(ServerError::Io { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(load_agents(file.path()), Err(ServerError::Json { .. })));
    }

    #[test]
    fn test_warmup_skips_bad_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"lead": {{"id": "a"}}}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "garbage").unwrap();
        writeln!(file, r#"{{"lead": {{"id": "b", "budget": 300000}}, "conversation": []}}"#).unwrap();
        let samples = load_warmup_samples(file.path()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].lead.budget, Some(300_000.0));
    }

    #[tokio::test]
    async fn test_build_without_roster() {
        let orchestrator = build_orchestrator(&Settings::default()).unwrap();
        assert!(!orchestrator.is_shut_down());
    }
}
