//! Engine replies.

use std::fmt;

use serde_json::{json, Value};

/// A terminal phrase that ends a sentinel-mode reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// The engine waits for the next human move.
    YourMove,
    Checkmate,
    Stalemate,
    /// The engine is shutting down.
    Goodbye,
}

impl Marker {
    /// Checked in this order, so game-over phrases win over the prompt.
    pub const ALL: [Marker; 4] = [
        Marker::Checkmate,
        Marker::Stalemate,
        Marker::Goodbye,
        Marker::YourMove,
    ];

    /// The substring recognized in engine output.
    pub fn phrase(&self) -> &'static str {
        match self {
            Marker::YourMove => "Your move",
            Marker::Checkmate => "Checkmate",
            Marker::Stalemate => "Stalemate",
            Marker::Goodbye => "Goodbye",
        }
    }

    /// Find the first marker contained in `line`.
    pub fn find(line: &str) -> Option<Marker> {
        Self::ALL
            .into_iter()
            .find(|marker| line.contains(marker.phrase()))
    }

    /// Whether this marker ends the game.
    pub fn is_game_over(&self) -> bool {
        !matches!(self, Marker::YourMove)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Marker::YourMove => "your_move",
            Marker::Checkmate => "checkmate",
            Marker::Stalemate => "stalemate",
            Marker::Goodbye => "goodbye",
        }
    }
}

/// Why sentinel accumulation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptEnd {
    /// A line contained a terminal marker.
    Marker(Marker),
    /// The output stream closed.
    Eof,
    /// The line cap was reached without a marker.
    LineCap,
}

impl TranscriptEnd {
    /// Short machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptEnd::Marker(marker) => marker.as_str(),
            TranscriptEnd::Eof => "eof",
            TranscriptEnd::LineCap => "line_cap",
        }
    }
}

impl fmt::Display for TranscriptEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text accumulated from a sentinel-mode exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    /// Every line read, in order, each followed by `\n`.
    pub text: String,
    /// Number of lines read.
    pub lines: usize,
    /// Which condition ended the read.
    pub end: TranscriptEnd,
}

impl Transcript {
    /// Whether the engine announced the end of the game.
    pub fn is_game_over(&self) -> bool {
        matches!(self.end, TranscriptEnd::Marker(marker) if marker.is_game_over())
    }

    /// Whether the stream closed during this exchange.
    pub fn hit_eof(&self) -> bool {
        self.end == TranscriptEnd::Eof
    }
}

/// A complete reply from the engine. Never partially decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineReply {
    /// A decoded structured-mode object, passed through untouched.
    Json(Value),
    /// Accumulated sentinel-mode text.
    Transcript(Transcript),
}

impl EngineReply {
    /// The structured payload, if this is a structured reply.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            EngineReply::Json(value) => Some(value),
            EngineReply::Transcript(_) => None,
        }
    }

    /// The transcript, if this is a sentinel reply.
    pub fn as_transcript(&self) -> Option<&Transcript> {
        match self {
            EngineReply::Json(_) => None,
            EngineReply::Transcript(transcript) => Some(transcript),
        }
    }

    /// Render for an HTTP caller.
    ///
    /// Structured replies are returned as-is; transcripts become
    /// `{"text", "end", "game_over"}`.
    pub fn to_payload(&self) -> Value {
        match self {
            EngineReply::Json(value) => value.clone(),
            EngineReply::Transcript(t) => json!({
                "text": t.text,
                "end": t.end.as_str(),
                "game_over": t.is_game_over(),
            }),
        }
    }
}
