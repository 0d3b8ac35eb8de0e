//! Line protocols spoken with the engine.
//!
//! The engine runs in exactly one of two modes per session:
//!
//! - **Structured** (`--protocol`): one JSON object per line each way.
//!   Requests are [`Command`]s; replies are opaque JSON objects.
//! - **Sentinel** (no flag): plain text. The first line sent is the human's
//!   side (`w`/`b`), then raw move tokens. A reply is every line up to one
//!   containing a [`Marker`] ("Your move", "Checkmate", "Stalemate", "Goodbye").
//!
//! [`Codec`] hides the difference behind a single `send`.
//!
//! # Example
//!
//! ```
//! use engine_bridge::protocol::{decode_reply, Marker};
//!
//! let reply = decode_reply(r#"{"event":"move","status":"ongoing"}"#).unwrap();
//! assert_eq!(reply["status"], "ongoing");
//!
//! assert_eq!(Marker::find("Checkmate! White wins."), Some(Marker::Checkmate));
//! ```

mod codec;
mod command;
mod reply;
mod sentinel;

pub use codec::{decode_reply, Codec};
pub use command::Command;
pub use reply::{EngineReply, Marker, Transcript, TranscriptEnd};
pub use sentinel::accumulate;
