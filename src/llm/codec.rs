use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{CorrectedDocument, Document};

/// Structured shape a stage expects back from the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractShape {
    /// `{ "subject": string, "body": string }`
    SubjectBody,
    /// `{ "subject": string, "body": string, "corrections": [string] }`
    SubjectBodyCorrections,
}

/// Successfully decoded output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Document(Document),
    Corrected(CorrectedDocument),
}

impl Decoded {
    pub fn into_document(self) -> Document {
        match self {
            Decoded::Document(document) => document,
            Decoded::Corrected(corrected) => corrected.document,
        }
    }
}

/// Output that does not match the expected shape
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("output is not valid JSON: {0}")]
    Malformed(String),
    #[error("output is not a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` has the wrong type")]
    WrongType(&'static str),
    #[error("field `{0}` is empty")]
    EmptyField(&'static str),
}

/// Decode raw stage output against `shape`.
///
/// Parsing is strict: anything short of the complete shape is an error, never a
/// partially filled document. String fields are trimmed; content is not judged.
pub fn decode(raw: &str, shape: ContractShape) -> Result<Decoded, DecodeError> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let object = value.as_object().ok_or(DecodeError::NotAnObject)?;

    let document = Document {
        subject: required_text(object, "subject")?,
        body: required_text(object, "body")?,
    };

    match shape {
        ContractShape::SubjectBody => Ok(Decoded::Document(document)),
        ContractShape::SubjectBodyCorrections => {
            let corrections = required_string_list(object, "corrections")?;
            Ok(Decoded::Corrected(CorrectedDocument {
                document,
                corrections,
            }))
        }
    }
}

pub fn decode_document(raw: &str) -> Result<Document, DecodeError> {
    decode(raw, ContractShape::SubjectBody).map(Decoded::into_document)
}

pub fn decode_corrected(raw: &str) -> Result<CorrectedDocument, DecodeError> {
    match decode(raw, ContractShape::SubjectBodyCorrections)? {
        Decoded::Corrected(corrected) => Ok(corrected),
        Decoded::Document(document) => Ok(CorrectedDocument {
            document,
            corrections: Vec::new(),
        }),
    }
}

fn required_text(object: &Map<String, Value>, field: &'static str) -> Result<String, DecodeError> {
    let text = object
        .get(field)
        .ok_or(DecodeError::MissingField(field))?
        .as_str()
        .ok_or(DecodeError::WrongType(field))?
        .trim();

    if text.is_empty() {
        return Err(DecodeError::EmptyField(field));
    }
    Ok(text.to_string())
}

fn required_string_list(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Vec<String>, DecodeError> {
    object
        .get(field)
        .ok_or(DecodeError::MissingField(field))?
        .as_array()
        .ok_or(DecodeError::WrongType(field))?
        .iter()
        .map(|item| {
            item.as_str()
                .map(|s| s.trim().to_string())
                .ok_or(DecodeError::WrongType(field))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_subject_body() {
        let doc = decode_document(r#"{"subject": " Reunión ", "body": "Hola, Ana:\nNos vemos."}"#)
            .unwrap();
        assert_eq!(doc.subject, "Reunión");
        assert_eq!(doc.body, "Hola, Ana:\nNos vemos.");
    }

    #[test]
    fn test_decode_with_corrections() {
        let raw = r#"{"subject": "S", "body": "B", "corrections": ["tú → usted"]}"#;
        let corrected = decode_corrected(raw).unwrap();
        assert_eq!(corrected.corrections, vec!["tú → usted".to_string()]);
        assert_eq!(corrected.document, Document::new("S", "B"));
    }

    #[test]
    fn test_decode_failures_are_classified() {
        assert!(matches!(
            decode_document("Asunto: hola"),
            Err(DecodeError::Malformed(_))
        ));
        assert_eq!(decode_document(r#"["a"]"#), Err(DecodeError::NotAnObject));
        assert_eq!(
            decode_document(r#"{"subject": "S"}"#),
            Err(DecodeError::MissingField("body"))
        );
        assert_eq!(
            decode_document(r#"{"subject": 3, "body": "B"}"#),
            Err(DecodeError::WrongType("subject"))
        );
        assert_eq!(
            decode_document(r#"{"subject": "S", "body": "   "}"#),
            Err(DecodeError::EmptyField("body"))
        );
    }

    #[test]
    fn test_corrections_are_required_for_that_shape() {
        let raw = r#"{"subject": "S", "body": "B"}"#;
        assert_eq!(
            decode_corrected(raw),
            Err(DecodeError::MissingField("corrections"))
        );
        assert!(decode_document(raw).is_ok());

        let wrong = r#"{"subject": "S", "body": "B", "corrections": [1]}"#;
        assert_eq!(
            decode_corrected(wrong),
            Err(DecodeError::WrongType("corrections"))
        );
    }
}
