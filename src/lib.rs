pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use io::{load_request, read_text, write_sse_event, ErrorOutput, GenerationOutput, HumanEmails};
pub use llm::{GenerativeService, LlmError, OpenAiClient, OpenAiConfig};
pub use models::{Document, EmailRequest, PipelineRequest, StyleConfig, ValidationError};
pub use pipeline::{
    generate_stream, run_all, run_all_detailed, run_one, style_variants, GenerationError,
    GenerationReport, PipelineConfig, StreamEvent,
};
pub use stages::{Stage, StageError, StageFailure};
