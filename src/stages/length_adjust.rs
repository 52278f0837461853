use tracing::{debug, info};

use crate::llm::{
    decode_document, length_system_prompt, length_user_prompt, CompletionRequest,
    GenerativeService,
};
use crate::models::{Document, PipelineRequest};
use crate::pipeline::PipelineConfig;
use crate::stages::{Stage, StageError, StageOutcome};

/// Execute the length stage: bring the body's content lines into the band of
/// the requested length tier.
///
/// A body already inside the band is left alone without calling the service.
/// A rewrite that still falls outside the band is rejected.
pub async fn execute_length_adjust(
    client: &dyn GenerativeService,
    document: &Document,
    request: &PipelineRequest,
    config: &PipelineConfig,
) -> Result<StageOutcome, StageError> {
    let length = request.style.length;
    let (min, max) = length.line_band();
    let current = document.content_lines();

    if length.accepts(current) {
        debug!("length_adjust: {} lines already within {}-{}", current, min, max);
        return Ok(StageOutcome::Unchanged);
    }

    let completion = CompletionRequest {
        label: Stage::LengthAdjust.name(),
        model: config.primary_model.clone(),
        temperature: Stage::LengthAdjust.temperature(),
        system_prompt: length_system_prompt(length),
        user_prompt: length_user_prompt(document, length),
        structured_output: true,
    };

    let raw = client.invoke(&completion).await?;
    let adjusted = decode_document(&raw)?;
    let lines = adjusted.content_lines();

    if !length.accepts(lines) {
        return Err(StageError::ContractViolation(format!(
            "{} content lines, expected {}-{} for {}",
            lines,
            min,
            max,
            length.as_str()
        )));
    }

    info!("length_adjust: {} -> {} content lines", current, lines);
    Ok(StageOutcome::Rewritten(adjusted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::fake::{body_with_lines, json_doc, request_with, ScriptedService};
    use crate::models::{LengthTier, StyleConfig};

    fn style(length: LengthTier) -> StyleConfig {
        StyleConfig {
            length,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_within_band_skips_service() {
        let service = ScriptedService::new(|_| panic!("service must not be called"));
        let request = request_with(style(LengthTier::Brief));
        let document = Document::new("Pedido", body_with_lines(4));

        let outcome = execute_length_adjust(&service, &document, &request, &PipelineConfig::default())
            .await
            .unwrap();

        assert_eq!(outcome, StageOutcome::Unchanged);
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_brief_output_has_at_most_five_lines() {
        let service = ScriptedService::new(|_| Ok(json_doc("Pedido", &body_with_lines(5))));
        let request = request_with(style(LengthTier::Brief));
        let document = Document::new("Pedido", body_with_lines(9));

        let outcome = execute_length_adjust(&service, &document, &request, &PipelineConfig::default())
            .await
            .unwrap();

        match outcome {
            StageOutcome::Rewritten(doc) => assert!(doc.content_lines() <= 5),
            StageOutcome::Unchanged => panic!("expected a rewrite"),
        }
        assert_eq!(service.calls_labelled("length_adjust"), 1);
    }

    #[tokio::test]
    async fn test_complete_output_has_at_least_twelve_lines() {
        let service = ScriptedService::new(|_| Ok(json_doc("Pedido", &body_with_lines(14))));
        let request = request_with(style(LengthTier::Complete));
        let document = Document::new("Pedido", body_with_lines(4));

        let outcome = execute_length_adjust(&service, &document, &request, &PipelineConfig::default())
            .await
            .unwrap();

        let adjusted = outcome.apply(document);
        assert!(adjusted.content_lines() >= 12);
    }

    #[tokio::test]
    async fn test_rewrite_outside_band_is_rejected() {
        // still too long for brief
        let service = ScriptedService::new(|_| Ok(json_doc("Pedido", &body_with_lines(8))));
        let request = request_with(style(LengthTier::Brief));
        let document = Document::new("Pedido", body_with_lines(9));

        let err = execute_length_adjust(&service, &document, &request, &PipelineConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, StageError::ContractViolation(_)));
    }

    #[tokio::test]
    async fn test_malformed_rewrite_is_an_error() {
        let service = ScriptedService::new(|_| Ok("Asunto: Pedido".to_string()));
        let request = request_with(style(LengthTier::Complete));
        let document = Document::new("Pedido", body_with_lines(2));

        let err = execute_length_adjust(&service, &document, &request, &PipelineConfig::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "decode");
    }
}
