use futures::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::llm::{
    stream_system_prompt, stream_user_prompt, ByteStream, CompletionRequest, GenerativeService,
    LlmError, SseDecoder, SseRecord,
};
use crate::models::PipelineRequest;
use crate::pipeline::PipelineConfig;

/// Events delivered to the consumer of a streamed generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Chunk { text: String },
    Error { message: String },
    Done,
}

const STREAM_TEMPERATURE: f64 = 0.4;
const EVENT_BUFFER: usize = 32;

/// Start a streamed plain-text generation.
///
/// Returns once the service has accepted the request; a rejection is returned
/// as an error and no events are produced. Chunks are relayed by a background
/// task as they are decoded. Dropping the receiver cancels the generation and
/// closes the upstream connection.
pub async fn generate_stream(
    client: &dyn GenerativeService,
    request: &PipelineRequest,
    config: &PipelineConfig,
) -> Result<mpsc::Receiver<StreamEvent>, LlmError> {
    let completion = CompletionRequest {
        label: "stream",
        model: config.primary_model.clone(),
        temperature: STREAM_TEMPERATURE,
        system_prompt: stream_system_prompt(&request.recipient_name, &request.sender_name),
        user_prompt: stream_user_prompt(request),
        structured_output: false,
    };

    let stream = client.open_stream(&completion).await?;
    info!("stream: accepted by upstream");

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    tokio::spawn(relay(stream, tx));
    Ok(rx)
}

/// Consumer went away; stop relaying
struct Abandoned;

struct Relay {
    tx: mpsc::Sender<StreamEvent>,
    produced_text: bool,
}

impl Relay {
    async fn send(&self, event: StreamEvent) -> Result<(), Abandoned> {
        self.tx.send(event).await.map_err(|_| Abandoned)
    }

    async fn chunk(&mut self, text: String) -> Result<(), Abandoned> {
        if !text.trim().is_empty() {
            self.produced_text = true;
        }
        self.send(StreamEvent::Chunk { text }).await
    }

    async fn forward(&mut self, record: SseRecord) -> Result<(), Abandoned> {
        match record {
            SseRecord::Delta(text) => self.chunk(text).await,
            SseRecord::Done => Ok(()),
        }
    }
}

/// Owns the upstream stream until every exit path drops it.
async fn relay(stream: ByteStream, tx: mpsc::Sender<StreamEvent>) {
    let mut relay = Relay {
        tx,
        produced_text: false,
    };
    if relay_records(stream, &mut relay).await.is_err() {
        debug!("stream: consumer dropped, upstream closed");
    }
}

async fn relay_records(mut stream: ByteStream, relay: &mut Relay) -> Result<(), Abandoned> {
    let mut decoder = SseDecoder::new();

    loop {
        // a consumer can leave while upstream is silent; watch both
        let item = tokio::select! {
            _ = relay.tx.closed() => return Err(Abandoned),
            item = stream.next() => item,
        };
        let Some(item) = item else { break };

        let bytes = match item {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("stream: upstream fault: {}", e);
                return relay
                    .send(StreamEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
            }
        };

        for record in decoder.push(&bytes) {
            relay.forward(record).await?;
        }
        if decoder.is_finished() {
            break;
        }
    }
    // release the upstream connection before the final events
    drop(stream);

    if let Some(record) = decoder.finish() {
        relay.forward(record).await?;
    }

    if !relay.produced_text {
        warn!("stream: ended without content");
        relay
            .send(StreamEvent::Error {
                message: "generation produced no content".to_string(),
            })
            .await?;
    }
    relay.send(StreamEvent::Done).await
}
