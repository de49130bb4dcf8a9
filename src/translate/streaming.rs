//! Line-oriented SSE reframing for streamed upstream responses.
//!
//! The [`SseReframer`] takes raw upstream chunks in arrival order and yields
//! complete `<line>\n\n` frames. Network chunk boundaries can fall anywhere,
//! including inside a line or inside a multi-byte character, so the
//! unterminated tail is carried over to the next chunk.
//!
//! Usage:
//!   let mut reframer = SseReframer::new();
//!   for chunk in upstream_chunks {
//!       for frame in reframer.push(&chunk) {
//!           // write frame
//!       }
//!   }
//!   for frame in reframer.finish() {
//!       // write frame; the last one is always `data: [DONE]\n\n`
//!   }

/// Terminal frame sent after every stream.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

#[derive(Debug, Default)]
pub struct SseReframer {
    carry: Vec<u8>,
}

impl SseReframer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one upstream chunk, returning the frames it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.carry.extend_from_slice(chunk);

        let Some(last_newline) = self.carry.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let rest = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, rest);

        complete
            .split(|b| *b == b'\n')
            .filter_map(|line| frame_line(&String::from_utf8_lossy(line)))
            .collect()
    }

    /// Flush the carry buffer and close the stream.
    pub fn finish(self) -> Vec<String> {
        let tail = String::from_utf8_lossy(&self.carry);
        let tail = tail.trim();

        let mut frames = Vec::with_capacity(2);
        if !tail.is_empty() && !is_done_marker(tail) {
            if tail.starts_with("data:") {
                frames.push(format!("{tail}\n\n"));
            } else {
                frames.push(format!("data: {tail}\n\n"));
            }
        }
        frames.push(DONE_FRAME.to_string());
        frames
    }

    /// Bytes received but not yet terminated by a newline.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}

fn frame_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || is_done_marker(line) {
        return None;
    }
    Some(format!("{line}\n\n"))
}

/// Upstream's own terminator; the reframer emits exactly one in `finish`.
fn is_done_marker(line: &str) -> bool {
    line.strip_prefix("data:")
        .is_some_and(|rest| rest.trim() == "[DONE]")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(chunks: &[&[u8]]) -> Vec<String> {
        let mut reframer = SseReframer::new();
        let mut frames = Vec::new();
        for chunk in chunks {
            frames.extend(reframer.push(chunk));
        }
        frames.extend(reframer.finish());
        frames
    }

    #[test]
    fn test_two_chunks_two_frames() {
        let frames = run(&[b"data: {\"a\":1}\n", b"data: {\"b\":2}\n"]);
        assert_eq!(
            frames,
            vec![
                "data: {\"a\":1}\n\n".to_string(),
                "data: {\"b\":2}\n\n".to_string(),
                DONE_FRAME.to_string(),
            ]
        );
    }

    #[test]
    fn test_split_line_reassembled() {
        let frames = run(&[b"data: {\"a\":1}\ndat", b"a: X\n"]);
        assert_eq!(
            frames,
            vec![
                "data: {\"a\":1}\n\n".to_string(),
                "data: X\n\n".to_string(),
                DONE_FRAME.to_string(),
            ]
        );
    }

    #[test]
    fn test_partial_chunk_emits_nothing_yet() {
        let mut reframer = SseReframer::new();
        assert!(reframer.push(b"data: {\"x\"").is_empty());
        assert_eq!(reframer.pending(), 10);
        assert_eq!(reframer.push(b":1}\n"), vec!["data: {\"x\":1}\n\n".to_string()]);
        assert_eq!(reframer.pending(), 0);
    }

    #[test]
    fn test_blank_lines_dropped_and_reframed() {
        let frames = run(&[b"data: one\n\n\r\n  \ndata: two\n\n"]);
        assert_eq!(
            frames,
            vec![
                "data: one\n\n".to_string(),
                "data: two\n\n".to_string(),
                DONE_FRAME.to_string(),
            ]
        );
    }

    #[test]
    fn test_lines_are_trimmed() {
        let frames = run(&[b"  data: padded  \r\n"]);
        assert_eq!(frames[0], "data: padded\n\n");
    }

    #[test]
    fn test_non_data_lines_pass_through() {
        let frames = run(&[b": keep-alive\nevent: ping\n"]);
        assert_eq!(frames[0], ": keep-alive\n\n");
        assert_eq!(frames[1], "event: ping\n\n");
    }

    #[test]
    fn test_tail_without_newline_is_flushed() {
        let frames = run(&[b"data: a\n{\"tail\":true}"]);
        assert_eq!(
            frames,
            vec![
                "data: a\n\n".to_string(),
                "data: {\"tail\":true}\n\n".to_string(),
                DONE_FRAME.to_string(),
            ]
        );
    }

    #[test]
    fn test_tail_with_data_prefix_not_doubled() {
        let frames = run(&[b"data: {\"tail\":true}"]);
        assert_eq!(frames[0], "data: {\"tail\":true}\n\n");
    }

    #[test]
    fn test_single_done_frame() {
        let frames = run(&[b"data: x\n\ndata: [DONE]\n\n"]);
        assert_eq!(frames, vec!["data: x\n\n".to_string(), DONE_FRAME.to_string()]);

        let frames = run(&[b"data: x\n\ndata: [DONE]"]);
        assert_eq!(frames, vec!["data: x\n\n".to_string(), DONE_FRAME.to_string()]);
    }

    #[test]
    fn test_empty_stream_still_done() {
        assert_eq!(run(&[]), vec![DONE_FRAME.to_string()]);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let line = "data: {\"content\":\"héllo\"}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let frames = run(&[&line[..split], &line[split..]]);
        assert_eq!(frames[0], "data: {\"content\":\"héllo\"}\n\n");
    }

    #[test]
    fn test_order_preserved_across_many_chunks() {
        let body: String = (0..50).map(|i| format!("data: {i}\n\n")).collect();
        let chunks: Vec<&[u8]> = body.as_bytes().chunks(7).collect();
        let frames = run(&chunks);

        assert_eq!(frames.len(), 51);
        for (i, frame) in frames.iter().take(50).enumerate() {
            assert_eq!(frame, &format!("data: {i}\n\n"));
        }
        assert_eq!(frames[50], DONE_FRAME);
    }
}
