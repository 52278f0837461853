use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Formality, LengthTier, Mode, Persona, RegionSetting, StyleConfig, Tone};

/// Upper bound on versions generated for one request
pub const MAX_VERSIONS: usize = 3;

/// Caller input rejected before any generation happens
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

impl ValidationError {
    pub fn status_code(&self) -> u16 {
        400
    }
}

/// Formality as sent by callers: a bare string or `{ "preference": "..." }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FormalityInput {
    Plain(String),
    Detailed {
        #[serde(default)]
        preference: Option<String>,
    },
}

impl FormalityInput {
    fn preference(&self) -> Option<&str> {
        match self {
            FormalityInput::Plain(s) => Some(s),
            FormalityInput::Detailed { preference } => preference.as_deref(),
        }
    }
}

/// Raw email request before normalization. Every field is optional here;
/// [`EmailRequest::normalize`] decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default, alias = "originalEmail")]
    pub original_message: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default, alias = "clientName")]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub sender_role: Option<String>,
    #[serde(default)]
    pub recipient_role: Option<String>,
    #[serde(default, alias = "recipientRegion")]
    pub region: Option<String>,
    #[serde(default)]
    pub formality: Option<FormalityInput>,
    #[serde(default)]
    pub formalidad: Option<FormalityInput>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub length: Option<String>,
    /// Number or numeric string; anything else counts as 1
    #[serde(default)]
    pub versions: Option<serde_json::Value>,
}

/// Immutable input to a single pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRequest {
    pub style: StyleConfig,
    pub instruction: String,
    pub sender_name: String,
    pub recipient_name: String,
    pub sender_role: Option<String>,
    pub recipient_role: Option<String>,
    /// Present when `style.mode` is `Reply`
    pub original_message: Option<String>,
}

impl PipelineRequest {
    /// Same content with a different style
    pub fn with_style(&self, style: StyleConfig) -> Self {
        Self {
            style,
            ..self.clone()
        }
    }
}

/// Output of normalization: the base request and how many versions to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub request: PipelineRequest,
    pub versions: usize,
}

fn clean(field: &Option<String>) -> String {
    field.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn clean_optional(field: &Option<String>) -> Option<String> {
    Some(clean(field)).filter(|s| !s.is_empty())
}

/// Clamp a requested version count into `1..=MAX_VERSIONS`
pub fn clamp_versions(requested: usize) -> usize {
    requested.clamp(1, MAX_VERSIONS)
}

fn parse_versions(value: Option<&serde_json::Value>) -> usize {
    let requested = match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(1),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u64>().unwrap_or(1),
        _ => 1,
    };
    clamp_versions(usize::try_from(requested).unwrap_or(MAX_VERSIONS))
}

impl EmailRequest {
    /// Load a request from a JSON file
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Trim, default, and validate the request.
    ///
    /// Instruction, sender, and recipient are required; so is the original
    /// message in reply mode. Style fields never fail: unknown values take
    /// their defaults.
    pub fn normalize(&self) -> Result<NormalizedRequest, ValidationError> {
        let mode = self.mode.as_deref().map(Mode::parse_lenient).unwrap_or_default();
        let instruction = clean(&self.instruction);
        let sender_name = clean(&self.sender_name);
        let recipient_name = clean(&self.recipient_name);
        let original_message = clean_optional(&self.original_message);

        if instruction.is_empty() {
            return Err(ValidationError::MissingField("instruction"));
        }
        if sender_name.is_empty() {
            return Err(ValidationError::MissingField("senderName"));
        }
        if recipient_name.is_empty() {
            return Err(ValidationError::MissingField("recipientName"));
        }
        if mode == Mode::Reply && original_message.is_none() {
            return Err(ValidationError::MissingField("originalMessage"));
        }

        let formality = self
            .formalidad
            .as_ref()
            .or(self.formality.as_ref())
            .and_then(FormalityInput::preference)
            .map(Formality::parse_lenient)
            .unwrap_or_default();

        let style = StyleConfig {
            mode,
            formality,
            tone: self.tone.as_deref().map(Tone::parse_lenient).unwrap_or_default(),
            length: self
                .length
                .as_deref()
                .map(LengthTier::parse_lenient)
                .unwrap_or_default(),
            region: self
                .region
                .as_deref()
                .map(RegionSetting::parse)
                .unwrap_or_default(),
            persona: Persona::default(),
        };

        Ok(NormalizedRequest {
            request: PipelineRequest {
                style,
                instruction,
                sender_name,
                recipient_name,
                sender_role: clean_optional(&self.sender_role),
                recipient_role: clean_optional(&self.recipient_role),
                original_message: if mode == Mode::Reply {
                    original_message
                } else {
                    None
                },
            },
            versions: parse_versions(self.versions.as_ref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;

    fn minimal() -> EmailRequest {
        EmailRequest {
            instruction: Some("  Pedir el presupuesto actualizado ".to_string()),
            sender_name: Some("Lucía".to_string()),
            recipient_name: Some("Sr. Gómez".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_trims_and_defaults() {
        let normalized = minimal().normalize().unwrap();
        assert_eq!(normalized.request.instruction, "Pedir el presupuesto actualizado");
        assert_eq!(normalized.request.style, StyleConfig::default());
        assert_eq!(normalized.versions, 1);
        assert!(normalized.request.original_message.is_none());
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let mut request = minimal();
        request.sender_name = Some("   ".to_string());
        assert_eq!(
            request.normalize(),
            Err(ValidationError::MissingField("senderName"))
        );

        let mut reply = minimal();
        reply.mode = Some("reply".to_string());
        assert_eq!(
            reply.normalize(),
            Err(ValidationError::MissingField("originalMessage"))
        );
    }

    #[test]
    fn test_parse_original_field_names() {
        let json = r#"{
            "mode": "reply",
            "instruction": "Confirmar la reunión",
            "originalEmail": "¿Podemos vernos el martes?",
            "senderName": "Ana",
            "clientName": "Carlos",
            "recipientRegion": "méxico",
            "formalidad": {"preference": "usted"},
            "tone": "cordial",
            "versions": "7"
        }"#;

        let normalized = EmailRequest::from_json(json).unwrap().normalize().unwrap();
        let style = &normalized.request.style;
        assert_eq!(style.mode, Mode::Reply);
        assert_eq!(style.formality, Formality::Formal);
        assert_eq!(style.tone, Tone::Warm);
        assert_eq!(style.region, RegionSetting::Known(Region::Mexico));
        assert_eq!(normalized.request.recipient_name, "Carlos");
        assert_eq!(
            normalized.request.original_message.as_deref(),
            Some("¿Podemos vernos el martes?")
        );
        assert_eq!(normalized.versions, MAX_VERSIONS);
    }

    #[test]
    fn test_versions_are_clamped() {
        let mut request = minimal();
        request.versions = Some(serde_json::json!(0));
        assert_eq!(request.normalize().unwrap().versions, 1);

        request.versions = Some(serde_json::json!("many"));
        assert_eq!(request.normalize().unwrap().versions, 1);

        request.versions = Some(serde_json::json!(2));
        assert_eq!(request.normalize().unwrap().versions, 2);
    }

    #[test]
    fn test_formality_plain_string() {
        let mut request = minimal();
        request.formality = Some(FormalityInput::Plain("tú".to_string()));
        assert_eq!(
            request.normalize().unwrap().request.style.formality,
            Formality::Informal
        );
    }
}
