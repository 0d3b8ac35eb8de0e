//! Request/reply framing over an engine's stdio.

use serde_json::Value;

use super::command::Command;
use super::reply::EngineReply;
use super::sentinel::accumulate;
use crate::config::{BridgeConfig, ProtocolMode};
use crate::error::ProtocolFailure;
use crate::process::EngineIo;
use crate::{Error, Result};

/// One request/reply exchange strategy, fixed for the life of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// One JSON line out, exactly one JSON line back.
    Structured,
    /// One text token out, lines back until a marker, EOF, or `line_cap`.
    Sentinel { line_cap: usize },
}

impl Codec {
    /// Create the codec for `mode`.
    pub fn new(mode: ProtocolMode, line_cap: usize) -> Self {
        match mode {
            ProtocolMode::Structured => Codec::Structured,
            ProtocolMode::Sentinel => Codec::Sentinel { line_cap },
        }
    }

    /// Create the codec described by a bridge configuration.
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.protocol(), config.line_cap())
    }

    /// The protocol this codec speaks.
    pub fn mode(&self) -> ProtocolMode {
        match self {
            Codec::Structured => ProtocolMode::Structured,
            Codec::Sentinel { .. } => ProtocolMode::Sentinel,
        }
    }

    /// Send `command` and read its complete reply.
    pub async fn send(&self, io: &mut dyn EngineIo, command: &Command) -> Result<EngineReply> {
        let line = command.encode(self.mode())?;
        tracing::debug!(mode = %self.mode(), line = %line, "sending command");
        io.write_line(&line).await?;

        match *self {
            Codec::Structured => {
                let Some(raw) = io.read_line().await? else {
                    return Err(Error::EngineTerminated {
                        exit_code: io.exit_code(),
                    });
                };
                decode_reply(&raw).map(EngineReply::Json)
            }
            Codec::Sentinel { line_cap } => accumulate(io, line_cap)
                .await
                .map(EngineReply::Transcript),
        }
    }
}

/// Decode one structured-mode reply line.
pub fn decode_reply(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Err(Error::Protocol {
            reason: ProtocolFailure::NoOutput,
            raw: raw.to_string(),
        });
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(value) if value.is_object() => Ok(value),
        Ok(_) => Err(Error::malformed(raw)),
        Err(e) => {
            tracing::debug!(column = e.column(), "undecodable engine reply: {}", e);
            Err(Error::malformed(raw))
        }
    }
}
