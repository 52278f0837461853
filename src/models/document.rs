use serde::{Deserialize, Serialize};

/// Subject/body pair threaded through the generation stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub subject: String,
    pub body: String,
}

impl Document {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Both fields carry visible text
    pub fn is_complete(&self) -> bool {
        !self.subject.trim().is_empty() && !self.body.trim().is_empty()
    }

    /// Number of content lines in the body (see [`content_line_count`])
    pub fn content_lines(&self) -> usize {
        content_line_count(&self.body)
    }
}

/// A document returned by the validator together with the changes it reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectedDocument {
    pub document: Document,
    pub corrections: Vec<String>,
}

/// Opening words that mark a salutation line
const SALUTATIONS: &[&str] = &[
    "hola",
    "estimado",
    "estimada",
    "estimados",
    "estimadas",
    "buenos días",
    "buenos dias",
    "buenas tardes",
    "buenas noches",
    "buen día",
    "buen dia",
    "querido",
    "querida",
    "apreciado",
    "apreciada",
    "cordial saludo",
    "junto con saludar",
];

/// Closing formulas; the closing line and everything after it (signature) is not content
const CLOSINGS: &[&str] = &[
    "atentamente",
    "saludos",
    "un saludo",
    "un cordial saludo",
    "cordialmente",
    "quedo atento",
    "quedo atenta",
    "quedamos atentos",
    "quedo a sus órdenes",
    "quedo a su disposición",
    "quedo a disposición",
    "quedamos a su disposición",
    "un abrazo",
    "gracias,",
    "muchas gracias,",
];

/// Count the lines of body content, excluding the salutation and the closing block.
///
/// Blank lines are ignored. The first non-blank line is treated as a salutation
/// when it starts with a greeting word, or when it is short and ends with `:` or `,`.
/// The closing block starts at the last line opening with a closing formula.
pub fn content_line_count(body: &str) -> usize {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let start = match lines.first() {
        Some(first) if is_salutation(first) => 1,
        _ => 0,
    };

    let end = lines
        .iter()
        .enumerate()
        .skip(start)
        .rev()
        .find(|(_, l)| is_closing(l))
        .map(|(i, _)| i)
        .unwrap_or(lines.len());

    end.saturating_sub(start)
}

fn is_salutation(line: &str) -> bool {
    let lower = line.to_lowercase();
    if SALUTATIONS.iter().any(|s| lower.starts_with(s)) {
        return true;
    }
    (lower.ends_with(':') || lower.ends_with(',')) && lower.chars().count() <= 40
}

fn is_closing(line: &str) -> bool {
    let lower = line.to_lowercase();
    CLOSINGS.iter().any(|c| lower.starts_with(c))
}
