pub mod fanout;
pub mod orchestrator;
pub mod streaming;

pub use fanout::*;
pub use orchestrator::*;
pub use streaming::*;

use crate::llm::{OpenAiConfig, DEFAULT_PRIMARY_MODEL, DEFAULT_VALIDATOR_MODEL};
use crate::models::MAX_VERSIONS;

/// Configuration shared by every run of a generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Model for drafting, length adjustment, localization, and streaming
    pub primary_model: String,
    /// Model for the validation pass
    pub validator_model: String,
    /// Upper bound on concurrent versions per request
    pub max_versions: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            validator_model: DEFAULT_VALIDATOR_MODEL.to_string(),
            max_versions: MAX_VERSIONS,
        }
    }
}

impl From<&OpenAiConfig> for PipelineConfig {
    fn from(config: &OpenAiConfig) -> Self {
        Self {
            primary_model: config.primary_model.clone(),
            validator_model: config.validator_model.clone(),
            ..Default::default()
        }
    }
}
