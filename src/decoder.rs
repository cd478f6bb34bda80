//! Incremental line decoding for the response body.
//!
//! Chunks from the network do not have to end on a line boundary, and a
//! multi-byte UTF-8 sequence may be split between two chunks. Bytes are
//! buffered until a newline arrives, then the whole line is decoded.

use tracing::trace;

#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            lines.push(decode_line(&self.buffer[start..end]));
            start = end + 1;
        }
        self.buffer.drain(..start);

        if !self.buffer.is_empty() {
            trace!("Buffering {} bytes of partial line", self.buffer.len());
        }
        lines
    }

    /// Flush whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = decode_line(&self.buffer);
        self.buffer.clear();
        Some(line)
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_lines_per_chunk() {
        let mut decoder = LineDecoder::new();
        let first = decoder.push(b"data:{\"type\":\"progress\",\"message\":\"A\"}\n");
        let second = decoder.push(b"data:{\"type\":\"report\",\"message\":\"B\"}\n");
        assert_eq!(first, vec![r#"data:{"type":"progress","message":"A"}"#]);
        assert_eq!(second, vec![r#"data:{"type":"report","message":"B"}"#]);
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"data:{\"type\":\"pro").is_empty());
        let lines = decoder.push(b"gress\",\"message\":\"A\"}\n\n");
        assert_eq!(lines, vec![r#"data:{"type":"progress","message":"A"}"#, ""]);
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let text = "data:é\n".as_bytes();
        // 'é' is two bytes; split between them.
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(&text[..6]).is_empty());
        assert_eq!(decoder.push(&text[6..]), vec!["data:é"]);
    }

    #[test]
    fn test_crlf_and_trailing_line() {
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.push(b"a\r\nb"), vec!["a"]);
        assert_eq!(decoder.finish(), Some("b".to_string()));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_escaped_newline_is_not_a_separator() {
        let mut decoder = LineDecoder::new();
        let body = br#"data: {"type":"progress","message":"A"}\n\ndata: {"type":"report","message":"B"}\n\n"#;
        assert!(decoder.push(body).is_empty());
        let line = decoder.finish().unwrap();
        assert!(line.ends_with(r"\n\n"));
        assert_eq!(line.len(), body.len());
    }
}
