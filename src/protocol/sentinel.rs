//! Sentinel-mode response delimiting.
//!
//! Interactive engines do not frame their replies. A reply is every line up
//! to and including the first one that contains a [`Marker`]. Two more
//! conditions stop the read: the stream closing, and the line cap, which
//! bounds the wait on an engine that prints without ever prompting.
//! Neither is an error here; the caller decides what they mean.

use super::reply::{Marker, Transcript, TranscriptEnd};
use crate::process::EngineIo;
use crate::Result;

/// Read lines from `io` until a marker, EOF, or `line_cap` lines.
pub async fn accumulate(io: &mut dyn EngineIo, line_cap: usize) -> Result<Transcript> {
    let mut text = String::new();
    let mut lines = 0;

    while lines < line_cap {
        let Some(line) = io.read_line().await? else {
            tracing::debug!(lines, "engine output closed before a marker");
            return Ok(Transcript {
                text,
                lines,
                end: TranscriptEnd::Eof,
            });
        };

        text.push_str(&line);
        text.push('\n');
        lines += 1;

        if let Some(marker) = Marker::find(&line) {
            tracing::trace!(lines, marker = marker.phrase(), "reply complete");
            return Ok(Transcript {
                text,
                lines,
                end: TranscriptEnd::Marker(marker),
            });
        }
    }

    tracing::warn!(line_cap, "engine reply hit the line cap without a marker");
    Ok(Transcript {
        text,
        lines,
        end: TranscriptEnd::LineCap,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use super::*;

    /// Replays fixed lines, then either EOF or an endless filler line.
    struct ScriptedIo {
        lines: VecDeque<String>,
        filler: Option<String>,
        reads: usize,
    }

    impl ScriptedIo {
        fn new(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|l| l.to_string()).collect(),
                filler: None,
                reads: 0,
            }
        }

        fn endless(filler: &str) -> Self {
            Self {
                lines: VecDeque::new(),
                filler: Some(filler.to_string()),
                reads: 0,
            }
        }
    }

    #[async_trait]
    impl EngineIo for ScriptedIo {
        async fn write_line(&mut self, _line: &str) -> Result<()> {
            Ok(())
        }

        async fn read_line(&mut self) -> Result<Option<String>> {
            self.reads += 1;
            Ok(self.lines.pop_front().or_else(|| self.filler.clone()))
        }

        fn is_alive(&mut self) -> bool {
            true
        }

        async fn terminate(&mut self) {}
    }

    #[tokio::test]
    async fn stops_at_move_prompt() {
        let mut io = ScriptedIo::new(&[
            "  a b c d e f g h",
            "8 r n b q k b n r",
            "Your move: ",
            "never read",
        ]);

        let transcript = accumulate(&mut io, 500).await.unwrap();
        assert_eq!(transcript.end, TranscriptEnd::Marker(Marker::YourMove));
        assert_eq!(transcript.lines, 3);
        assert_eq!(
            transcript.text,
            "  a b c d e f g h\n8 r n b q k b n r\nYour move: \n"
        );
        assert_eq!(io.reads, 3);
    }

    #[tokio::test]
    async fn stops_at_game_over() {
        let mut io = ScriptedIo::new(&["Engine plays d8h4", "Checkmate! Black wins."]);

        let transcript = accumulate(&mut io, 500).await.unwrap();
        assert_eq!(transcript.end, TranscriptEnd::Marker(Marker::Checkmate));
        assert!(transcript.is_game_over());
    }

    #[tokio::test]
    async fn eof_returns_output_so_far() {
        let mut io = ScriptedIo::new(&["partial board"]);

        let transcript = accumulate(&mut io, 500).await.unwrap();
        assert_eq!(transcript.end, TranscriptEnd::Eof);
        assert_eq!(transcript.text, "partial board\n");
        assert_eq!(transcript.lines, 1);
    }

    #[tokio::test]
    async fn endless_output_is_capped() {
        let mut io = ScriptedIo::endless("thinking...");

        let transcript = accumulate(&mut io, 500).await.unwrap();
        assert_eq!(transcript.end, TranscriptEnd::LineCap);
        assert_eq!(transcript.lines, 500);
        assert_eq!(io.reads, 500);
    }

    #[tokio::test]
    async fn marker_on_last_allowed_line_counts() {
        let mut io = ScriptedIo::new(&["one", "two", "Your move"]);

        let transcript = accumulate(&mut io, 3).await.unwrap();
        assert_eq!(transcript.end, TranscriptEnd::Marker(Marker::YourMove));
    }
}
