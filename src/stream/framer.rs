/// Splits a chunked byte stream into complete lines.
///
/// Whatever follows the last `\n` is held until the next chunk. A multi-byte
/// UTF-8 sequence split across two chunks is held back too, so a chunk
/// boundary never produces replacement characters.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: String,
    partial_utf8: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut bytes = std::mem::take(&mut self.partial_utf8);
        bytes.extend_from_slice(chunk);

        let valid_up_to = match std::str::from_utf8(&bytes) {
            Ok(_) => bytes.len(),
            Err(error) if error.error_len().is_none() => error.valid_up_to(),
            Err(_) => {
                // Invalid (not merely truncated) input: decode lossily and move on.
                let text = String::from_utf8_lossy(&bytes).into_owned();
                return self.push(&text);
            }
        };

        self.partial_utf8 = bytes.split_off(valid_up_to);
        let text = String::from_utf8_lossy(&bytes);
        self.push(&text)
    }

    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);
        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);
        complete
            .split_terminator('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect()
    }

    /// Returns the unterminated tail, if any, and resets the framer.
    pub fn finish(&mut self) -> Option<String> {
        if !self.partial_utf8.is_empty() {
            let tail = String::from_utf8_lossy(&std::mem::take(&mut self.partial_utf8)).into_owned();
            self.pending.push_str(&tail);
        }
        let tail = std::mem::take(&mut self.pending);
        let tail = tail.strip_suffix('\r').unwrap_or(&tail).to_string();
        (!tail.is_empty()).then_some(tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holds_partial_line_until_terminated() {
        let mut framer = LineFramer::new();
        assert!(framer.push("data: {\"type\":\"RUN_ST").is_empty());
        assert_eq!(
            framer.push("ARTED\"}\n"),
            vec!["data: {\"type\":\"RUN_STARTED\"}".to_string()]
        );
        assert_eq!(framer.finish(), None);
    }

    #[test]
    fn test_emits_multiple_lines_and_keeps_blank_ones() {
        let mut framer = LineFramer::new();
        let lines = framer.push("a\r\n\nb\nc");
        assert_eq!(lines, vec!["a".to_string(), String::new(), "b".to_string()]);
        assert_eq!(framer.finish(), Some("c".to_string()));
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let mut framer = LineFramer::new();
        let bytes = "data: 你好\n".as_bytes();
        let split = "data: 你".len() - 1;
        assert!(framer.push_bytes(&bytes[..split]).is_empty());
        assert_eq!(framer.push_bytes(&bytes[split..]), vec!["data: 你好".to_string()]);
    }
}
