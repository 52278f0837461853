use tracing::{debug, info};

use crate::llm::{
    decode_document, localize_system_prompt, localize_user_prompt, CompletionRequest,
    GenerativeService,
};
use crate::models::{Document, PipelineRequest};
use crate::pipeline::PipelineConfig;
use crate::stages::{Stage, StageError, StageOutcome};

/// Execute the localization stage: adapt greeting, closing, and vocabulary to
/// the recipient's region.
///
/// Regions without a profile (unknown or unspecified) are a no-op and make no call.
pub async fn execute_localize(
    client: &dyn GenerativeService,
    document: &Document,
    request: &PipelineRequest,
    config: &PipelineConfig,
) -> Result<StageOutcome, StageError> {
    let Some(region) = request.style.region.profile() else {
        debug!("localize: no profile for region {}", request.style.region.label());
        return Ok(StageOutcome::Unchanged);
    };

    let completion = CompletionRequest {
        label: Stage::Localize.name(),
        model: config.primary_model.clone(),
        temperature: Stage::Localize.temperature(),
        system_prompt: localize_system_prompt(region),
        user_prompt: localize_user_prompt(document, region),
        structured_output: true,
    };

    let raw = client.invoke(&completion).await?;
    let localized = decode_document(&raw)?;

    info!("localize: adapted for {}", region);
    Ok(StageOutcome::Rewritten(localized))
}
