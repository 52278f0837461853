use tracing::info;

use crate::llm::{
    decode_corrected, validate_system_prompt, validate_user_prompt, CompletionRequest,
    GenerativeService,
};
use crate::models::{target_register, Document, PipelineRequest, RegisterScan};
use crate::pipeline::PipelineConfig;
use crate::stages::{Stage, StageError, StageOutcome};

/// Execute the validation stage: normalize mixed tú/usted register and fix
/// phrasing that is out of place for the region.
///
/// The target register is the configured preference, or the one that already
/// dominates the document when the preference is `auto`. A corrected document
/// that still addresses the reader in the other register is rejected. Callers
/// apply the soft failure policy, so any error here keeps the input.
pub async fn execute_validate(
    client: &dyn GenerativeService,
    document: &Document,
    request: &PipelineRequest,
    config: &PipelineConfig,
) -> Result<StageOutcome, StageError> {
    let style = &request.style;
    let target = target_register(style.formality, document);

    let completion = CompletionRequest {
        label: Stage::Validate.name(),
        model: config.validator_model.clone(),
        temperature: Stage::Validate.temperature(),
        system_prompt: validate_system_prompt(target, &style.region),
        user_prompt: validate_user_prompt(document, style.formality, &style.region),
        structured_output: true,
    };

    let raw = client.invoke(&completion).await?;
    let corrected = decode_corrected(&raw)?;

    let scan = RegisterScan::of_document(&corrected.document);
    if !scan.conforms_to(target) {
        return Err(StageError::ContractViolation(format!(
            "register still mixed ({} formal, {} informal markers, target {:?})",
            scan.formal, scan.informal, target
        )));
    }

    if corrected.document == *document {
        return Ok(StageOutcome::Unchanged);
    }

    for correction in &corrected.corrections {
        info!("validate: {}", correction);
    }
    Ok(StageOutcome::Rewritten(corrected.document))
}
