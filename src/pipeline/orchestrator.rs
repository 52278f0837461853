use tracing::info;

use crate::llm::GenerativeService;
use crate::models::{Document, PipelineRequest};
use crate::pipeline::PipelineConfig;
use crate::stages::{execute_draft, run_refinement, Stage, StageFailure};

/// Run one version through every stage in order.
///
/// The first hard failure ends the run and is returned with the stage that
/// raised it. Soft failures are absorbed by the stage. Nothing is retried.
pub async fn run_one(
    client: &dyn GenerativeService,
    request: &PipelineRequest,
    config: &PipelineConfig,
) -> Result<Document, StageFailure> {
    let persona = request.style.persona.as_str();
    info!("[{}] draft", persona);

    let mut document = execute_draft(client, request, config)
        .await
        .map_err(|cause| StageFailure::new(Stage::Draft, cause))?;

    for stage in Stage::REFINEMENTS {
        info!("[{}] {}", persona, stage);
        document = run_refinement(stage, client, document, request, config).await?;
    }

    Ok(document)
}
