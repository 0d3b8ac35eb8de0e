//! The single global engine session.
//!
//! This module provides [`SessionManager`], the one source of truth for
//! whether a game is in progress. It owns at most one engine process and
//! serializes every interaction with it behind a single lock.
//!
//! # Example
//!
//! ```ignore
//! use engine_bridge::{BridgeConfig, SessionManager, Side, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let sessions = SessionManager::new(BridgeConfig::from_env()?);
//!
//!     let opening = sessions.new_game(Side::White).await?;
//!     println!("{}", opening.to_payload());
//!
//!     let reply = sessions.submit_move("e2e4").await?;
//!     println!("{}", reply.to_payload());
//!
//!     sessions.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::{BridgeConfig, ProtocolMode, Side};
use crate::process::{EngineIo, EngineLauncher, ProcessLauncher};
use crate::protocol::{Codec, Command, EngineReply, Transcript};
use crate::{Error, Result};

/// Lifecycle of the engine behind a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    /// Spawned, opening exchange not yet complete.
    Starting,
    /// Ready for moves.
    Running,
    /// The engine closed its output.
    Exited,
}

/// A snapshot of the session for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    /// Whether a game is in progress.
    pub active: bool,
    /// Protocol spoken with the engine.
    pub mode: ProtocolMode,
    /// Engine lifecycle, when a game is in progress.
    pub liveness: Option<Liveness>,
    /// Engine process id, when known.
    pub pid: Option<u32>,
    /// Moves accepted in the current game.
    pub moves: u32,
}

/// The running engine and what it has said so far.
struct EngineSession {
    io: Box<dyn EngineIo>,
    liveness: Liveness,
    transcript: String,
    moves: u32,
}

impl EngineSession {
    fn new(io: Box<dyn EngineIo>) -> Self {
        Self {
            io,
            liveness: Liveness::Starting,
            transcript: String::new(),
            moves: 0,
        }
    }

    /// Record a completed exchange. Moves are counted once the engine is
    /// running, unless it exited before finishing its answer.
    fn observe(&mut self, reply: &EngineReply) {
        let answered = match reply {
            EngineReply::Json(_) => true,
            EngineReply::Transcript(t) => {
                self.transcript.push_str(&t.text);
                !t.hit_eof()
            }
        };

        if self.liveness != Liveness::Starting && answered {
            self.moves += 1;
        }
        self.liveness = if answered {
            Liveness::Running
        } else {
            Liveness::Exited
        };
    }

    /// Checked before every exchange, never cached.
    fn is_live(&mut self) -> bool {
        self.liveness != Liveness::Exited && self.io.is_alive()
    }
}

/// Owner of the single engine session.
///
/// # Thread Safety
///
/// `SessionManager` is `Send + Sync` and is meant to be shared behind an
/// `Arc`. [`new_game`](Self::new_game), [`submit_move`](Self::submit_move)
/// and [`shutdown`](Self::shutdown) each run on their own task that holds
/// the lock until the engine has answered. Dropping the returned future
/// stops the wait, not the exchange, so no two exchanges ever interleave
/// on the engine's pipes.
///
/// There is no timeout: a hung engine blocks its caller, and everyone
/// queued behind it, until it answers or exits.
pub struct SessionManager {
    launcher: Arc<dyn EngineLauncher>,
    codec: Codec,
    state: Arc<Mutex<Option<EngineSession>>>,
}

impl SessionManager {
    /// Create a manager that spawns the configured engine binary.
    pub fn new(config: BridgeConfig) -> Self {
        let codec = Codec::from_config(&config);
        let launcher = ProcessLauncher::new(Arc::new(config));
        Self::with_launcher(Arc::new(launcher), codec)
    }

    /// Create a manager with a custom launcher.
    pub fn with_launcher(launcher: Arc<dyn EngineLauncher>, codec: Codec) -> Self {
        Self {
            launcher,
            codec,
            state: Arc::new(Mutex::new(None)),
        }
    }

    /// The protocol this manager speaks.
    pub fn mode(&self) -> ProtocolMode {
        self.codec.mode()
    }

    /// Start a fresh game, replacing any game in progress.
    ///
    /// Returns the opening reply: the structured acknowledgement, or the
    /// initial board and prompt text. On any failure the manager is left
    /// with no session.
    pub async fn new_game(&self, side: Side) -> Result<EngineReply> {
        let launcher = self.launcher.clone();
        let codec = self.codec;
        let state = self.state.clone();

        detach(async move {
            let mut state = state.lock_owned().await;
            clear(&mut state, "replaced by a new game").await;

            let io = launcher.launch(codec.mode()).await?;
            let mut session = EngineSession::new(io);
            tracing::info!(pid = ?session.io.pid(), %side, mode = %codec.mode(), "starting game");

            let reply = match opening(codec, &mut session, side).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!("opening exchange failed: {}", e);
                    session.io.terminate().await;
                    return Err(e);
                }
            };

            session.observe(&reply);
            *state = Some(session);
            Ok(reply)
        })
        .await
    }

    /// Play one move in the current game.
    ///
    /// Fails with [`Error::NoActiveSession`] when no game is in progress.
    /// If the engine has died, the session is cleared and
    /// [`Error::EngineTerminated`] is returned without sending anything.
    /// Write failures and termination mid-exchange also clear the session;
    /// protocol errors leave it in place.
    pub async fn submit_move(&self, token: &str) -> Result<EngineReply> {
        let codec = self.codec;
        let state = self.state.clone();
        let token = token.to_string();

        detach(async move {
            let mut state = state.lock_owned().await;
            let session = state.as_mut().ok_or(Error::NoActiveSession)?;
            let command = Command::play(&token)?;

            if !session.is_live() {
                let exit_code = session.io.exit_code();
                clear(&mut state, "engine found dead").await;
                return Err(Error::EngineTerminated { exit_code });
            }

            match codec.send(session.io.as_mut(), &command).await {
                Ok(reply) => {
                    session.observe(&reply);
                    Ok(reply)
                }
                Err(e) if e.is_session_fatal() => {
                    clear(&mut state, "engine lost mid-exchange").await;
                    Err(e)
                }
                Err(e) => {
                    tracing::warn!("move {} failed: {}", token, e);
                    Err(e)
                }
            }
        })
        .await
    }

    /// End the game in progress, if any. Idempotent.
    pub async fn shutdown(&self) {
        let state = self.state.clone();
        let done = detach(async move {
            let mut state = state.lock_owned().await;
            clear(&mut state, "shutdown requested").await;
            Ok(())
        })
        .await;

        if let Err(e) = done {
            tracing::error!("shutdown failed: {}", e);
        }
    }

    /// Whether a game is in progress.
    pub async fn is_active(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Describe the current session without touching the engine.
    pub async fn status(&self) -> SessionStatus {
        let state = self.state.lock().await;
        match state.as_ref() {
            Some(session) => SessionStatus {
                active: true,
                mode: self.codec.mode(),
                liveness: Some(session.liveness),
                pid: session.io.pid(),
                moves: session.moves,
            },
            None => SessionStatus {
                active: false,
                mode: self.codec.mode(),
                liveness: None,
                pid: None,
                moves: 0,
            },
        }
    }

    /// Everything the engine has printed this game (sentinel mode only).
    pub async fn transcript(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.as_ref().map(|session| session.transcript.clone())
    }
}

/// Run an exchange to completion even if the caller stops waiting.
async fn detach<T>(exchange: impl Future<Output = Result<T>> + Send + 'static) -> Result<T>
where
    T: Send + 'static,
{
    match tokio::spawn(exchange).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(Error::Io(std::io::Error::other(e))),
    }
}

async fn opening(codec: Codec, session: &mut EngineSession, side: Side) -> Result<EngineReply> {
    let reply = codec
        .send(session.io.as_mut(), &Command::new_game(side))
        .await?;

    if let EngineReply::Transcript(Transcript { lines: 0, .. }) = &reply {
        return Err(Error::EngineTerminated {
            exit_code: session.io.exit_code(),
        });
    }
    Ok(reply)
}

async fn clear(state: &mut Option<EngineSession>, reason: &str) {
    if let Some(mut session) = state.take() {
        tracing::info!(pid = ?session.io.pid(), moves = session.moves, reason, "ending game");
        session.io.terminate().await;
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
