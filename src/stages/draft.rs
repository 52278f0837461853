use tracing::info;

use crate::llm::{
    decode_document, draft_system_prompt, draft_user_prompt, CompletionRequest, GenerativeService,
};
use crate::models::{Document, PipelineRequest};
use crate::pipeline::PipelineConfig;
use crate::stages::{Stage, StageError};

/// Execute the drafting stage: produce the first subject and body for `request`.
///
/// The persona of the request's style biases phrasing; tone and formality
/// preference are passed through as hard requirements.
pub async fn execute_draft(
    client: &dyn GenerativeService,
    request: &PipelineRequest,
    config: &PipelineConfig,
) -> Result<Document, StageError> {
    let completion = CompletionRequest {
        label: Stage::Draft.name(),
        model: config.primary_model.clone(),
        temperature: Stage::Draft.temperature(),
        system_prompt: draft_system_prompt(request.style.tone, request.style.persona),
        user_prompt: draft_user_prompt(request),
        structured_output: true,
    };

    let raw = client.invoke(&completion).await?;
    let document = decode_document(&raw)?;

    info!(
        "draft ({}): {} content lines",
        request.style.persona.as_str(),
        document.content_lines()
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::fake::{json_doc, request_with, ScriptedService};
    use crate::llm::{persona_directive, LlmError};
    use crate::models::{Persona, StyleConfig};

    #[tokio::test]
    async fn test_draft_decodes_document() {
        let service = ScriptedService::new(|_| Ok(json_doc("Entrega", "Hola:\nLlega el lunes.")));
        let request = request_with(StyleConfig::default());

        let document = execute_draft(&service, &request, &PipelineConfig::default())
            .await
            .unwrap();

        assert_eq!(document, Document::new("Entrega", "Hola:\nLlega el lunes."));
        let calls = service.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].structured_output);
        assert_eq!(calls[0].model, PipelineConfig::default().primary_model);
    }

    #[tokio::test]
    async fn test_draft_uses_persona_of_style() {
        let service = ScriptedService::new(|_| Ok(json_doc("S", "B")));
        let request = request_with(StyleConfig::default().with_persona(Persona::Formal));

        execute_draft(&service, &request, &PipelineConfig::default())
            .await
            .unwrap();

        assert!(service.calls()[0]
            .system_prompt
            .contains(persona_directive(Persona::Formal)));
    }

    #[tokio::test]
    async fn test_draft_errors_propagate() {
        let service = ScriptedService::new(|_| Err(LlmError::EmptyResponse));
        let request = request_with(StyleConfig::default());
        let err = execute_draft(&service, &request, &PipelineConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "empty_response");

        let service = ScriptedService::new(|_| Ok(r#"{"subject": "S"}"#.to_string()));
        let err = execute_draft(&service, &request, &PipelineConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Decode(_)));
    }
}
