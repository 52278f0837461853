//! Scripted stand-in for the generative service used by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use crate::llm::{ByteStream, CompletionRequest, GenerativeService, LlmError};
use crate::models::{PipelineRequest, StyleConfig};

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync>;

pub(crate) struct ScriptedService {
    responder: Responder,
    stream: Mutex<Option<Result<ByteStream, LlmError>>>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedService {
    pub(crate) fn new(
        responder: impl Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            stream: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Service whose stream yields `chunks` after accepting the request
    pub(crate) fn streaming(chunks: Vec<Result<Bytes, LlmError>>) -> Self {
        Self::with_stream(futures::stream::iter(chunks).boxed())
    }

    /// Service whose stream is `stream` itself
    pub(crate) fn with_stream(stream: ByteStream) -> Self {
        let service = Self::new(|_| Err(LlmError::EmptyResponse));
        *service.stream.lock().unwrap() = Some(Ok(stream));
        service
    }

    /// Service that rejects the streaming request up front
    pub(crate) fn rejecting_stream(error: LlmError) -> Self {
        let service = Self::new(|_| Err(LlmError::EmptyResponse));
        *service.stream.lock().unwrap() = Some(Err(error));
        service
    }

    pub(crate) fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_labelled(&self, label: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.label == label)
            .count()
    }
}

#[async_trait]
impl GenerativeService for ScriptedService {
    async fn invoke(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }

    async fn open_stream(&self, request: &CompletionRequest) -> Result<ByteStream, LlmError> {
        self.calls.lock().unwrap().push(request.clone());
        match self.stream.lock().unwrap().take() {
            Some(Ok(stream)) => Ok(stream),
            Some(Err(error)) => Err(error),
            None => Err(LlmError::EmptyResponse),
        }
    }
}

/// JSON subject/body output as a stage would receive it
pub(crate) fn json_doc(subject: &str, body: &str) -> String {
    serde_json::json!({ "subject": subject, "body": body }).to_string()
}

/// JSON subject/body/corrections output
pub(crate) fn json_corrected(subject: &str, body: &str, corrections: &[&str]) -> String {
    serde_json::json!({ "subject": subject, "body": body, "corrections": corrections }).to_string()
}

/// A body with `n` content lines between a salutation and a closing
pub(crate) fn body_with_lines(n: usize) -> String {
    let mut body = String::from("Estimado Sr. Gómez:\n\n");
    for i in 1..=n {
        body.push_str(&format!("Línea de contenido número {i}.\n"));
    }
    body.push_str("\nAtentamente,\nLucía");
    body
}

/// A valid request carrying `style`
pub(crate) fn request_with(style: StyleConfig) -> PipelineRequest {
    PipelineRequest {
        style,
        instruction: "Confirmar la entrega del pedido 4512".to_string(),
        sender_name: "Lucía".to_string(),
        recipient_name: "Sr. Gómez".to_string(),
        sender_role: None,
        recipient_role: Some("cliente".to_string()),
        original_message: None,
    }
}
