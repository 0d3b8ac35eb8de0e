//! Outbound engine commands.

use serde::{Deserialize, Serialize};

use crate::config::{ProtocolMode, Side};
use crate::{Error, Result};

/// An instruction sent to the engine.
///
/// In structured mode this serializes to one JSON object tagged by `cmd`:
///
/// ```
/// use engine_bridge::config::Side;
/// use engine_bridge::protocol::Command;
///
/// let line = Command::new_game(Side::White).to_json_line().unwrap();
/// assert_eq!(line, r#"{"cmd":"new-game","human_color":"w"}"#);
/// ```
///
/// In sentinel mode it is a bare token: the side character or the move text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum Command {
    /// Start a game with the human playing `human_color`.
    NewGame { human_color: Side },
    /// Play a move such as `e2e4` or `e7e8q`.
    Move {
        #[serde(rename = "move")]
        token: String,
    },
}

impl Command {
    /// Create a new-game command.
    pub fn new_game(side: Side) -> Self {
        Command::NewGame { human_color: side }
    }

    /// Create a move command, rejecting tokens that cannot travel as one line.
    pub fn play(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::InvalidCommand("move must not be empty".into()));
        }
        if token.contains(['\n', '\r']) {
            return Err(Error::InvalidCommand(format!(
                "move must be a single line: {token:?}"
            )));
        }
        Ok(Command::Move {
            token: token.to_string(),
        })
    }

    /// Encode as one JSON line.
    pub fn to_json_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidCommand(e.to_string()))
    }

    /// Encode as a sentinel-mode text token.
    pub fn to_text_line(&self) -> &str {
        match self {
            Command::NewGame { human_color } => human_color.as_token(),
            Command::Move { token } => token,
        }
    }

    /// Encode for the given protocol.
    pub fn encode(&self, mode: ProtocolMode) -> Result<String> {
        match mode {
            ProtocolMode::Structured => self.to_json_line(),
            ProtocolMode::Sentinel => Ok(self.to_text_line().to_string()),
        }
    }
}
