//! Type-safe configuration options for the engine bridge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Which stdio protocol the engine speaks for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolMode {
    /// One JSON object per line in each direction (`--protocol`).
    #[default]
    Structured,
    /// Free text; replies end at a recognized terminal phrase.
    Sentinel,
}

impl fmt::Display for ProtocolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolMode::Structured => write!(f, "structured"),
            ProtocolMode::Sentinel => write!(f, "sentinel"),
        }
    }
}

impl FromStr for ProtocolMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "structured" | "protocol" | "json" => Ok(ProtocolMode::Structured),
            "sentinel" | "interactive" | "text" => Ok(ProtocolMode::Sentinel),
            other => Err(Error::InvalidConfig(format!(
                "unknown protocol mode {other:?} (expected structured or sentinel)"
            ))),
        }
    }
}

/// The side the human plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Side {
    #[default]
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl Side {
    /// The single-character token the engine expects.
    pub fn as_token(&self) -> &'static str {
        match self {
            Side::White => "w",
            Side::Black => "b",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "w" | "white" => Ok(Side::White),
            "b" | "black" => Ok(Side::Black),
            other => Err(Error::InvalidCommand(format!(
                "unknown side {other:?} (expected w or b)"
            ))),
        }
    }
}
