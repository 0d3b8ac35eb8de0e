//! Process management for the engine binary.
//!
//! This module owns the engine subprocess and its pipes. A persistent session
//! keeps one child alive and talks to it line by line; batch invocations spawn
//! short-lived children of their own (see [`crate::batch`]).
//!
//! # Architecture
//!
//! ```text
//! engine_bridge                       engine binary
//! ┌──────────────┐                   ┌─────────────┐
//! │ EngineProcess│───stdin (lines)──▶│             │
//! │  LineReader ◀┼──stdout───────────│             │
//! │             ◀┼──stderr───────────│             │
//! └──────────────┘                   └─────────────┘
//! ```
//!
//! Both output pipes feed one [`LineReader`], so callers see a single combined
//! stream. EOF is reported once both pipes have closed.
//!
//! The [`EngineIo`] and [`EngineLauncher`] traits are the seams the session
//! layer is written against, so tests can drive it with in-memory engines.

mod io;
mod spawn;

use async_trait::async_trait;

use crate::config::ProtocolMode;
use crate::Result;

pub use io::{LineReader, LineWriter};
pub use spawn::{build_args, EngineProcess, Invocation, ProcessLauncher};
pub(crate) use spawn::{build_command, spawn_error};

/// Capacity of the channel joining stdout and stderr.
pub const MERGED_CHANNEL_CAPACITY: usize = 256;

/// Line-oriented access to a running engine.
#[async_trait]
pub trait EngineIo: Send {
    /// Write `line` plus a newline and flush.
    ///
    /// Fails with [`Error::Write`](crate::Error::Write) if the pipe is closed.
    async fn write_line(&mut self, line: &str) -> Result<()>;

    /// Read the next line without its terminator.
    ///
    /// Returns `Ok(None)` once the output stream has closed.
    async fn read_line(&mut self) -> Result<Option<String>>;

    /// Non-blocking liveness check; never consumes output.
    fn is_alive(&mut self) -> bool;

    /// Stop the engine. Idempotent and infallible.
    async fn terminate(&mut self);

    /// OS process id, if there is one.
    fn pid(&self) -> Option<u32> {
        None
    }

    /// Exit code, if the engine has exited and reported one.
    fn exit_code(&mut self) -> Option<i32> {
        None
    }
}

/// Starts engines for new sessions.
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    /// Spawn a fresh engine speaking `mode`.
    async fn launch(&self, mode: ProtocolMode) -> Result<Box<dyn EngineIo>>;
}
