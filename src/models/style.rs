use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether the email starts a conversation or answers a received message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Compose,
    Reply,
}

impl Mode {
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "reply" | "responder" | "respuesta" => Mode::Reply,
            _ => Mode::Compose,
        }
    }
}

/// Requested second-person register
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    /// Let the writer infer it from roles and context, formal when unsure
    #[default]
    Auto,
    /// tú throughout
    Informal,
    /// usted throughout
    Formal,
}

impl Formality {
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "informal" | "tu" | "tú" | "tutear" => Formality::Informal,
            "formal" | "usted" => Formality::Formal,
            _ => Formality::Auto,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Formality::Auto => "auto",
            Formality::Informal => "informal",
            Formality::Formal => "formal",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Neutral,
    Warm,
    Firm,
    Urgent,
}

impl Tone {
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "warm" | "cordial" => Tone::Warm,
            "firm" | "firme" => Tone::Firm,
            "urgent" | "urgente" => Tone::Urgent,
            _ => Tone::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Neutral => "neutral",
            Tone::Warm => "warm",
            Tone::Firm => "firm",
            Tone::Urgent => "urgent",
        }
    }
}

/// Target body length, measured in content lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthTier {
    Brief,
    #[default]
    Detailed,
    Complete,
}

impl LengthTier {
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "brief" | "breve" | "short" | "corto" => LengthTier::Brief,
            "complete" | "completo" | "long" | "largo" => LengthTier::Complete,
            _ => LengthTier::Detailed,
        }
    }

    /// Inclusive band of content lines (salutation and closing excluded)
    pub fn line_band(&self) -> (usize, usize) {
        match self {
            LengthTier::Brief => (3, 5),
            LengthTier::Detailed => (6, 10),
            LengthTier::Complete => (12, 18),
        }
    }

    pub fn accepts(&self, content_lines: usize) -> bool {
        let (min, max) = self.line_band();
        (min..=max).contains(&content_lines)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthTier::Brief => "brief",
            LengthTier::Detailed => "detailed",
            LengthTier::Complete => "complete",
        }
    }
}

/// Regions with a localization profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    Spain,
    Mexico,
    Argentina,
    Chile,
    Colombia,
}

impl Region {
    pub fn lookup(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "spain" | "españa" | "espana" | "es" => Some(Region::Spain),
            "mexico" | "méxico" | "mx" => Some(Region::Mexico),
            "argentina" | "ar" => Some(Region::Argentina),
            "chile" | "cl" => Some(Region::Chile),
            "colombia" | "co" => Some(Region::Colombia),
            _ => None,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::Spain => "Spain",
            Region::Mexico => "Mexico",
            Region::Argentina => "Argentina",
            Region::Chile => "Chile",
            Region::Colombia => "Colombia",
        };
        f.write_str(name)
    }
}

/// Recipient region after normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum RegionSetting {
    #[default]
    Unspecified,
    Known(Region),
    /// Passed through as given; no localization profile applies
    Unknown(String),
}

impl RegionSetting {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return RegionSetting::Unspecified;
        }
        match Region::lookup(trimmed) {
            Some(region) => RegionSetting::Known(region),
            None => RegionSetting::Unknown(trimmed.to_string()),
        }
    }

    pub fn profile(&self) -> Option<Region> {
        match self {
            RegionSetting::Known(region) => Some(*region),
            _ => None,
        }
    }

    /// Human-readable label for prompts
    pub fn label(&self) -> String {
        match self {
            RegionSetting::Unspecified => "unspecified".to_string(),
            RegionSetting::Known(region) => region.to_string(),
            RegionSetting::Unknown(raw) => raw.clone(),
        }
    }
}

/// Writing approach that differentiates versions of the same request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    #[default]
    Direct,
    Empathetic,
    Formal,
}

/// Personas handed out to versions in order
pub const PERSONA_ROTATION: [Persona; 3] = [Persona::Direct, Persona::Empathetic, Persona::Formal];

impl Persona {
    /// Persona for the version at `index`, `Direct` past the end of the rotation
    pub fn for_version(index: usize) -> Self {
        PERSONA_ROTATION.get(index).copied().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Direct => "direct",
            Persona::Empathetic => "empathetic",
            Persona::Formal => "formal",
        }
    }
}

/// Generation parameters for one version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub mode: Mode,
    pub formality: Formality,
    pub tone: Tone,
    pub length: LengthTier,
    pub region: RegionSetting,
    pub persona: Persona,
}

impl StyleConfig {
    pub fn with_persona(&self, persona: Persona) -> Self {
        Self {
            persona,
            ..self.clone()
        }
    }
}
