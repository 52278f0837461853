use std::path::Path;

use anyhow::{Context, Result};

use crate::models::EmailRequest;

/// Load a JSON request file
pub fn load_request(path: &Path) -> Result<EmailRequest> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    parse_request_json(&content)
}

pub fn parse_request_json(json: &str) -> Result<EmailRequest> {
    EmailRequest::from_json(json).context("Failed to parse request JSON")
}

/// Read a plain-text file, such as the message being replied to
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_request_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"instruction": "Pedir presupuesto", "senderName": "Ana", "recipientName": "Luis", "tone": "firme"}}"#
        )
        .unwrap();

        let request = load_request(file.path()).unwrap();

        assert_eq!(request.instruction.as_deref(), Some("Pedir presupuesto"));
        assert_eq!(request.tone.as_deref(), Some("firme"));
        assert!(request.normalize().is_ok());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_request(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn test_read_original_message() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Hola Ana,\n¿Me mandas el presupuesto?\nLuis").unwrap();

        let text = read_text(file.path()).unwrap();
        assert!(text.starts_with("Hola Ana,\n"));

        let dir = tempfile::tempdir().unwrap();
        let err = read_text(&dir.path().join("missing.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = parse_request_json("{not json").unwrap_err();
        assert!(err.to_string().contains("Failed to parse request JSON"));
    }
}
