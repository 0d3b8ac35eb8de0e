use std::fmt;

/// Why a structured-mode reply could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFailure {
    /// The engine answered with an empty line.
    NoOutput,
    /// The line was not a JSON object.
    Malformed,
}

impl fmt::Display for ProtocolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolFailure::NoOutput => write!(f, "no output"),
            ProtocolFailure::Malformed => write!(f, "malformed"),
        }
    }
}

/// Errors that can occur when driving the engine.
///
/// Errors are organized by category:
/// - Configuration errors: detected at `build()` time
/// - Spawn errors: the engine binary could not be started
/// - Session errors: the engine died or misbehaved mid-exchange
/// - Batch errors: one-shot invocations failed or printed garbage
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    // -------------------------------------------------------------------------
    // Configuration and caller errors
    // -------------------------------------------------------------------------
    /// Invalid configuration provided to builder.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A command that cannot be framed as a single line.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A move was submitted while no game is in progress.
    #[error("no active game, start a new game first")]
    NoActiveSession,

    // -------------------------------------------------------------------------
    // Spawn errors
    // -------------------------------------------------------------------------
    /// Engine binary not found at the configured path.
    #[error("engine binary not found at {path}")]
    EngineNotFound { path: String },

    /// Failed to spawn the engine subprocess.
    #[error("failed to spawn engine {path}: {source}")]
    ProcessSpawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Session errors
    // -------------------------------------------------------------------------
    /// Writing to the engine stdin failed (pipe closed or process gone).
    #[error("failed to write to engine: {0}")]
    Write(#[source] std::io::Error),

    /// The engine exited or closed its output while a reply was expected.
    #[error("engine terminated{}", exit_suffix(.exit_code))]
    EngineTerminated { exit_code: Option<i32> },

    /// The engine replied with something that is not a usable message.
    #[error("protocol error ({reason}): {raw:?}")]
    Protocol { reason: ProtocolFailure, raw: String },

    // -------------------------------------------------------------------------
    // Batch errors
    // -------------------------------------------------------------------------
    /// A batch invocation printed output that could not be parsed.
    #[error("unexpected engine output: {output:?}")]
    UnexpectedOutput { output: String },

    /// A batch invocation exited with a non-zero status.
    #[error("engine error{}: {output}", exit_suffix(.exit_code))]
    EngineError {
        exit_code: Option<i32>,
        output: String,
    },

    /// Other local IO failures.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),
}

/// A specialized Result type for engine bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" (exit code {code})"),
        None => String::new(),
    }
}

impl Error {
    /// Create a malformed-reply error carrying the offending line.
    pub fn malformed(raw: &str) -> Self {
        Self::Protocol {
            reason: ProtocolFailure::Malformed,
            raw: raw.chars().take(200).collect(),
        }
    }

    /// Create an IO error.
    pub fn io(source: std::io::Error) -> Self {
        Self::Io(source)
    }

    /// Check if this error means the engine could not be started at all.
    pub fn is_engine_unavailable(&self) -> bool {
        matches!(self, Error::EngineNotFound { .. } | Error::ProcessSpawn { .. })
    }

    /// Check if this error ends the current session.
    ///
    /// The process is gone or its pipes are broken, so the caller must start
    /// a new game. Protocol errors are not fatal: the engine may still be alive.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Error::Write(_) | Error::EngineTerminated { .. })
    }

    /// Check if the caller, not the engine, is at fault.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Error::NoActiveSession | Error::InvalidCommand(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
