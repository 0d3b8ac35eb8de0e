//! # engine_bridge
//!
//! Async bridge between HTTP callers and a line-oriented chess engine
//! subprocess.
//!
//! This library provides:
//! - One global game session, serialized behind a single lock
//! - Two stdio protocols: JSON lines, or free text ending at sentinel phrases
//! - One-shot self-test and node-count runs outside the session
//! - An axum router exposing all of the above
//!
//! ## Quick Start
//!
//! ```ignore
//! use engine_bridge::{BridgeConfig, SessionManager, Side, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let sessions = SessionManager::new(BridgeConfig::from_env()?);
//!     let opening = sessions.new_game(Side::White).await?;
//!     println!("{}", opening.to_payload());
//!     Ok(())
//! }
//! ```
//!
//! ## Sentinel Mode
//!
//! ```ignore
//! use engine_bridge::{BridgeConfig, ProtocolMode, SessionManager, Side};
//!
//! let config = BridgeConfig::builder()
//!     .engine_path("./target/release/chess")
//!     .protocol(ProtocolMode::Sentinel)
//!     .build()?;
//! let sessions = SessionManager::new(config);
//!
//! sessions.new_game(Side::Black).await?;
//! let reply = sessions.submit_move("e7e5").await?;
//! if let Some(transcript) = reply.as_transcript() {
//!     print!("{}", transcript.text);
//! }
//! ```
//!
//! ## Batch Runs
//!
//! ```ignore
//! use std::sync::Arc;
//! use engine_bridge::{BatchRunner, BridgeConfig};
//!
//! let runner = BatchRunner::new(Arc::new(BridgeConfig::from_env()?));
//! let nodes = runner.run_node_count(3).await?;
//! assert_eq!(nodes, 8902);
//! ```

pub mod batch;
pub mod config;
mod error;
pub mod http;
pub mod process;
pub mod protocol;
mod session;

pub use error::{Error, ProtocolFailure, Result};

// Re-export the main entry points at crate root
pub use batch::{BatchRunner, SelfTestReport};
pub use session::{Liveness, SessionManager, SessionStatus};

// Re-export commonly used config types at crate root
pub use config::{BridgeConfig, BridgeConfigBuilder, ProtocolMode, Side};

// Re-export commonly used protocol types at crate root
pub use protocol::{Codec, Command, EngineReply, Marker, Transcript, TranscriptEnd};

// Re-export commonly used process types at crate root
pub use process::{EngineIo, EngineLauncher, EngineProcess, ProcessLauncher};
