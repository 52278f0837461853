use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::GenerativeService;
use crate::models::{clamp_versions, Document, Persona, PipelineRequest, StyleConfig};
use crate::pipeline::{run_one, PipelineConfig};
use crate::stages::{Stage, StageFailure};

/// Every version of a request failed
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("all {attempted} versions failed")]
    TotalFailure {
        attempted: usize,
        failures: Vec<VersionFailure>,
    },
}

impl GenerationError {
    pub fn status_code(&self) -> u16 {
        match self {
            GenerationError::TotalFailure { .. } => 502,
        }
    }
}

/// Why one version produced no document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionFailure {
    /// Position of the version in the request, from 0
    pub version: usize,
    pub stage: Stage,
    pub reason: String,
}

/// Result of a single version run
#[derive(Debug)]
pub struct VersionOutcome {
    pub version: usize,
    pub persona: Persona,
    pub result: Result<Document, StageFailure>,
}

/// Per-version results of a generation, in request order
#[derive(Debug)]
pub struct GenerationReport {
    pub outcomes: Vec<VersionOutcome>,
}

impl GenerationReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Complete documents produced by successful versions
    pub fn documents(&self) -> Vec<Document> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .filter(|d| d.is_complete())
            .cloned()
            .collect()
    }

    /// Versions that failed or produced an incomplete document
    pub fn failures(&self) -> Vec<VersionFailure> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.result {
                Err(failure) => Some(VersionFailure {
                    version: outcome.version,
                    stage: failure.stage,
                    reason: failure.cause.to_string(),
                }),
                Ok(document) if !document.is_complete() => Some(VersionFailure {
                    version: outcome.version,
                    stage: Stage::Validate,
                    reason: "empty subject or body".to_string(),
                }),
                Ok(_) => None,
            })
            .collect()
    }

    /// Surviving documents, or a total failure when there are none
    pub fn into_result(self) -> Result<Vec<Document>, GenerationError> {
        let documents = self.documents();
        if documents.is_empty() {
            return Err(GenerationError::TotalFailure {
                attempted: self.attempted(),
                failures: self.failures(),
            });
        }
        Ok(documents)
    }
}

/// Style variants for `requested` versions of `base`: one per persona in the
/// rotation, clamped to the version limit.
pub fn style_variants(base: &StyleConfig, requested: usize) -> Vec<StyleConfig> {
    (0..clamp_versions(requested))
        .map(|index| base.with_persona(Persona::for_version(index)))
        .collect()
}

/// Generate one document per style variant, concurrently.
///
/// Failed versions are dropped; the call succeeds as long as one version survives.
pub async fn run_all(
    client: &dyn GenerativeService,
    base_request: &PipelineRequest,
    variants: &[StyleConfig],
    config: &PipelineConfig,
) -> Result<Vec<Document>, GenerationError> {
    run_all_detailed(client, base_request, variants, config)
        .await
        .into_result()
}

/// Like [`run_all`], but keeps the outcome of every version
pub async fn run_all_detailed(
    client: &dyn GenerativeService,
    base_request: &PipelineRequest,
    variants: &[StyleConfig],
    config: &PipelineConfig,
) -> GenerationReport {
    let requests: Vec<PipelineRequest> = if variants.is_empty() {
        vec![base_request.clone()]
    } else {
        variants
            .iter()
            .take(clamp_versions(config.max_versions))
            .map(|style| base_request.with_style(style.clone()))
            .collect()
    };

    if variants.len() > requests.len() {
        warn!(
            "{} versions requested, running {}",
            variants.len(),
            requests.len()
        );
    }
    info!("Generating {} versions", requests.len());

    let results = join_all(requests.iter().map(|r| run_one(client, r, config))).await;

    let outcomes: Vec<VersionOutcome> = requests
        .iter()
        .zip(results)
        .enumerate()
        .map(|(version, (request, result))| {
            if let Err(failure) = &result {
                warn!(
                    "Version {} ({}) dropped: {}",
                    version,
                    request.style.persona.as_str(),
                    failure
                );
            }
            VersionOutcome {
                version,
                persona: request.style.persona,
                result,
            }
        })
        .collect();

    let report = GenerationReport { outcomes };
    info!(
        "{} of {} versions succeeded",
        report.documents().len(),
        report.attempted()
    );
    report
}
