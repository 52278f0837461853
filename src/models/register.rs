use serde::Serialize;

use crate::models::{Document, Formality};

/// Second-person register of a Spanish text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Register {
    /// usted
    Formal,
    /// tú / vos
    Informal,
}

/// Words that only occur when addressing the reader as usted
const FORMAL_MARKERS: &[&str] = &["usted", "ustedes"];

/// Object and possessive forms that carry the usted register in a letter
/// (le agradezco, su pedido). They also name third parties, so they weigh on
/// which register dominates but never disqualify an informal text on their own.
const FORMAL_FORMS: &[&str] = &["le", "les", "su", "sus", "suyo", "suya"];

/// Words that only occur when addressing the reader as tú or vos
const INFORMAL_MARKERS: &[&str] = &[
    "tú", "te", "ti", "contigo", "tu", "tus", "tuyo", "tuya", "tienes", "puedes", "quieres",
    "necesitas", "sabes", "podrías", "vos", "tenés", "podés", "querés", "sabés", "necesitás",
];

/// Marker counts found in a text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterScan {
    /// Every usted marker, explicit or not
    pub formal: usize,
    /// Explicit `usted` / `ustedes` only
    pub explicit_formal: usize,
    pub informal: usize,
}

impl RegisterScan {
    pub fn of_text(text: &str) -> Self {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        let mut scan = RegisterScan::default();
        for word in &words {
            if FORMAL_MARKERS.contains(&word.as_str()) {
                scan.formal += 1;
                scan.explicit_formal += 1;
            } else if FORMAL_FORMS.contains(&word.as_str()) {
                scan.formal += 1;
            } else if INFORMAL_MARKERS.contains(&word.as_str()) {
                scan.informal += 1;
            }
        }
        scan
    }

    pub fn of_document(document: &Document) -> Self {
        let subject = Self::of_text(&document.subject);
        let body = Self::of_text(&document.body);
        Self {
            formal: subject.formal + body.formal,
            explicit_formal: subject.explicit_formal + body.explicit_formal,
            informal: subject.informal + body.informal,
        }
    }

    pub fn is_mixed(&self) -> bool {
        self.formal > 0 && self.informal > 0
    }

    /// Register with more markers; formal on a tie
    pub fn dominant(&self) -> Register {
        if self.informal > self.formal {
            Register::Informal
        } else {
            Register::Formal
        }
    }

    /// Whether the text carries no marker of the register opposite to `target`
    pub fn conforms_to(&self, target: Register) -> bool {
        match target {
            Register::Formal => self.informal == 0,
            Register::Informal => self.explicit_formal == 0,
        }
    }
}

/// Register a document must end up in after validation.
///
/// An explicit preference wins; `Auto` follows whatever dominates the text already.
pub fn target_register(preference: Formality, document: &Document) -> Register {
    match preference {
        Formality::Formal => Register::Formal,
        Formality::Informal => Register::Informal,
        Formality::Auto => RegisterScan::of_document(document).dominant(),
    }
}
