pub mod draft;
pub mod length_adjust;
pub mod localize;
pub mod validate;

pub use draft::*;
pub use length_adjust::*;
pub use localize::*;
pub use validate::*;

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{DecodeError, GenerativeService, LlmError};
use crate::models::{Document, PipelineRequest};
use crate::pipeline::PipelineConfig;

/// The generation stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Draft,
    LengthAdjust,
    Localize,
    Validate,
}

/// What happens to a run when a stage fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The version is abandoned
    Hard,
    /// The stage input is passed on unchanged
    Soft,
}

impl Stage {
    /// Stages that rewrite an existing draft, in order
    pub const REFINEMENTS: [Stage; 3] = [Stage::LengthAdjust, Stage::Localize, Stage::Validate];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Draft => "draft",
            Stage::LengthAdjust => "length_adjust",
            Stage::Localize => "localize",
            Stage::Validate => "validate",
        }
    }

    /// Validation is best effort; every other stage is required
    pub fn failure_policy(&self) -> FailurePolicy {
        match self {
            Stage::Validate => FailurePolicy::Soft,
            Stage::Draft | Stage::LengthAdjust | Stage::Localize => FailurePolicy::Hard,
        }
    }

    /// Sampling temperature: higher where variety helps, lower where fidelity matters
    pub fn temperature(&self) -> f64 {
        match self {
            Stage::Draft => 0.45,
            Stage::LengthAdjust => 0.3,
            Stage::Localize => 0.15,
            Stage::Validate => 0.1,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a stage produced no document
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Upstream(#[from] LlmError),
    #[error("malformed output: {0}")]
    Decode(#[from] DecodeError),
    /// Well-formed output that breaks the stage's own guarantee
    #[error("contract violation: {0}")]
    ContractViolation(String),
}

impl StageError {
    /// Short machine-readable reason
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::Upstream(LlmError::Timeout) => "timeout",
            StageError::Upstream(LlmError::EmptyResponse) => "empty_response",
            StageError::Upstream(_) => "upstream",
            StageError::Decode(_) => "decode",
            StageError::ContractViolation(_) => "contract_violation",
        }
    }
}

/// A stage error attributed to the stage that raised it
#[derive(Debug, Error)]
#[error("{stage} stage failed: {cause}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub cause: StageError,
}

impl StageFailure {
    pub fn new(stage: Stage, cause: StageError) -> Self {
        Self { stage, cause }
    }
}

/// Result of a refinement stage that succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage produced a new document
    Rewritten(Document),
    /// The stage had nothing to do; its input stands
    Unchanged,
}

impl StageOutcome {
    pub fn apply(self, input: Document) -> Document {
        match self {
            StageOutcome::Rewritten(document) => document,
            StageOutcome::Unchanged => input,
        }
    }
}

/// Run one refinement stage over `document`, applying the stage's failure policy.
///
/// A hard failure is returned attributed to the stage. A soft failure is logged
/// and the input document is returned as is.
pub async fn run_refinement(
    stage: Stage,
    client: &dyn GenerativeService,
    document: Document,
    request: &PipelineRequest,
    config: &PipelineConfig,
) -> Result<Document, StageFailure> {
    let result = match stage {
        Stage::LengthAdjust => execute_length_adjust(client, &document, request, config).await,
        Stage::Localize => execute_localize(client, &document, request, config).await,
        Stage::Validate => execute_validate(client, &document, request, config).await,
        Stage::Draft => {
            return Err(StageFailure::new(
                stage,
                StageError::ContractViolation("draft is not a refinement stage".to_string()),
            ));
        }
    };

    match result {
        Ok(StageOutcome::Rewritten(rewritten)) => {
            info!("{}: rewritten", stage);
            Ok(rewritten)
        }
        Ok(StageOutcome::Unchanged) => {
            info!("{}: unchanged", stage);
            Ok(document)
        }
        Err(cause) => match stage.failure_policy() {
            FailurePolicy::Hard => Err(StageFailure::new(stage, cause)),
            FailurePolicy::Soft => {
                warn!("{} failed ({}), keeping input: {}", stage, cause.kind(), cause);
                Ok(document)
            }
        },
    }
}
