use serde::Deserialize;
use tracing::warn;

/// One decoded record from a streamed completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseRecord {
    /// Visible text delta
    Delta(String),
    /// `data: [DONE]` terminator
    Done,
}

/// Incremental decoder for `data:`-framed completion streams.
///
/// Bytes are buffered until a full line is available, so records and UTF-8
/// sequences split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the terminator record has been seen
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed a chunk and return every record completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseRecord> {
        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.finished {
                continue;
            }
            if let Some(record) = parse_line(&String::from_utf8_lossy(&line)) {
                if record == SseRecord::Done {
                    self.finished = true;
                }
                records.push(record);
            }
        }
        records
    }

    /// Decode whatever remains once the stream has ended without a final newline
    pub fn finish(&mut self) -> Option<SseRecord> {
        if self.finished || self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        let record = parse_line(&String::from_utf8_lossy(&line));
        if record == Some(SseRecord::Done) {
            self.finished = true;
        }
        record
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

fn parse_line(line: &str) -> Option<SseRecord> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data == "[DONE]" {
        return Some(SseRecord::Done);
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta)
            .and_then(|d| d.content)
            .filter(|text| !text.is_empty())
            .map(SseRecord::Delta),
        Err(e) => {
            warn!("Skipping unparseable stream record: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": text}}]})
        )
    }

    #[test]
    fn test_decodes_complete_records() {
        let mut decoder = SseDecoder::new();
        let input = format!("{}{}data: [DONE]\n\n", frame("Hola"), frame(", mundo"));
        let records = decoder.push(input.as_bytes());

        assert_eq!(
            records,
            vec![
                SseRecord::Delta("Hola".to_string()),
                SseRecord::Delta(", mundo".to_string()),
                SseRecord::Done,
            ]
        );
        assert!(decoder.is_finished());
    }

    #[test]
    fn test_record_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let full = frame("añadir");
        let bytes = full.as_bytes();
        // split inside the two-byte "ñ"
        let split = full.find('ñ').unwrap() + 1;

        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(
            decoder.push(&bytes[split..]),
            vec![SseRecord::Delta("añadir".to_string())]
        );
    }

    #[test]
    fn test_ignores_comments_roles_and_garbage() {
        let mut decoder = SseDecoder::new();
        let input = ":\n\ndata: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\ndata: {oops\n\n";
        assert!(decoder.push(input.as_bytes()).is_empty());
    }

    #[test]
    fn test_records_after_done_are_dropped() {
        let mut decoder = SseDecoder::new();
        let input = format!("data: [DONE]\n{}", frame("tarde"));
        assert_eq!(decoder.push(input.as_bytes()), vec![SseRecord::Done]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        let partial = frame("fin");
        let unterminated = partial.trim_end();
        assert!(decoder.push(unterminated.as_bytes()).is_empty());
        assert_eq!(decoder.finish(), Some(SseRecord::Delta("fin".to_string())));
        assert_eq!(decoder.finish(), None);
    }
}
