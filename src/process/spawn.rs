//! Process spawning and lifecycle management.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::process::{Child, ChildStdin, Command};

use super::io::{LineReader, LineWriter};
use super::{EngineIo, EngineLauncher};
use crate::config::{BridgeConfig, ProtocolMode};
use crate::{Error, Result};

/// What an engine invocation is for; decides the mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// A persistent session speaking the given protocol.
    Session(ProtocolMode),
    /// One-shot self-test run (`--run-tests`).
    SelfTest,
    /// One-shot fixed-depth node count (`--perft <depth>`).
    NodeCount(u32),
}

/// A running engine process with a combined stdout+stderr line stream.
///
/// # Cancellation
///
/// Dropping an `EngineProcess` will kill the subprocess if it's still running.
pub struct EngineProcess {
    child: Child,
    writer: Option<LineWriter<ChildStdin>>,
    reader: LineReader,
    pid: Option<u32>,
    exit_code: Option<i32>,
    exited: bool,
    terminated: bool,
    grace: Duration,
}

impl EngineProcess {
    /// Spawn the engine for a persistent session speaking `mode`.
    pub async fn spawn(config: &BridgeConfig, mode: ProtocolMode) -> Result<Self> {
        let mut cmd = build_command(config, Invocation::Session(mode));
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| spawn_error(config, e))?;

        let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        let pipes: Vec<Box<dyn AsyncRead + Unpin + Send>> =
            vec![Box::new(stdout), Box::new(stderr)];
        let pid = child.id();

        tracing::debug!(pid = ?pid, %mode, engine = %config.engine_display(), "spawned engine");

        Ok(Self {
            child,
            writer: Some(LineWriter::new(stdin)),
            reader: LineReader::merged(pipes),
            pid,
            exit_code: None,
            exited: false,
            terminated: false,
            grace: config.terminate_grace(),
        })
    }

    fn record_exit(&mut self, status: ExitStatus) {
        self.exited = true;
        self.exit_code = status.code();
        tracing::debug!(pid = ?self.pid, code = ?self.exit_code, "engine exited");
    }

    /// Ask the engine to stop. Falls back to a kill when signalling fails.
    fn request_stop(&mut self) {
        if let Some(pid) = self.pid {
            if send_sigterm(pid) {
                return;
            }
        }

        if let Err(e) = self.child.start_kill() {
            tracing::debug!(pid = ?self.pid, "kill failed: {}", e);
        }
    }
}

/// Returns true when the engine was signalled or is already gone.
#[cfg(unix)]
fn send_sigterm(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) => {
            tracing::debug!(pid, "sent SIGTERM to engine");
            true
        }
        Err(Errno::ESRCH) => {
            tracing::debug!(pid, "engine already gone");
            true
        }
        Err(e) => {
            tracing::warn!(pid, "SIGTERM failed, killing engine: {}", e);
            false
        }
    }
}

#[cfg(not(unix))]
fn send_sigterm(_pid: u32) -> bool {
    false
}

#[async_trait]
impl EngineIo for EngineProcess {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        match self.writer.as_mut() {
            Some(writer) => {
                tracing::trace!(pid = ?self.pid, line, "-> engine");
                writer.write_line(line).await
            }
            None => Err(Error::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "engine stdin is closed",
            ))),
        }
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        let line = self.reader.read_line().await?;
        if let Some(ref text) = line {
            tracing::trace!(pid = ?self.pid, line = %text, "<- engine");
        }
        Ok(line)
    }

    fn is_alive(&mut self) -> bool {
        if self.exited {
            return false;
        }
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                self.record_exit(status);
                false
            }
            Err(e) => {
                tracing::debug!(pid = ?self.pid, "liveness check failed: {}", e);
                false
            }
        }
    }

    async fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        // Closing stdin lets a well-behaved engine exit on its own.
        self.writer = None;

        if !self.is_alive() {
            return;
        }

        self.request_stop();

        match tokio::time::timeout(self.grace, self.child.wait()).await {
            Ok(Ok(status)) => self.record_exit(status),
            Ok(Err(e)) => tracing::debug!(pid = ?self.pid, "wait failed: {}", e),
            Err(_) => {
                tracing::warn!(
                    pid = ?self.pid,
                    "engine ignored termination for {:?}, killing",
                    self.grace
                );
                match self.child.kill().await {
                    Ok(()) => self.exited = true,
                    Err(e) => tracing::debug!(pid = ?self.pid, "kill failed: {}", e),
                }
            }
        }
    }

    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn exit_code(&mut self) -> Option<i32> {
        if !self.exited {
            self.is_alive();
        }
        self.exit_code
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        if !self.exited {
            let _ = self.child.start_kill();
        }
    }
}

/// Spawns [`EngineProcess`]es from a shared configuration.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    config: Arc<BridgeConfig>,
}

impl ProcessLauncher {
    /// Create a launcher for the configured engine binary.
    pub fn new(config: Arc<BridgeConfig>) -> Self {
        Self { config }
    }

    /// Get a reference to the underlying config.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

#[async_trait]
impl EngineLauncher for ProcessLauncher {
    async fn launch(&self, mode: ProtocolMode) -> Result<Box<dyn EngineIo>> {
        let process = EngineProcess::spawn(&self.config, mode).await?;
        Ok(Box::new(process))
    }
}

/// Build a tokio Command from the config.
pub(crate) fn build_command(config: &BridgeConfig, invocation: Invocation) -> Command {
    let mut cmd = Command::new(&config.engine_path);

    if let Some(ref dir) = config.working_directory {
        cmd.current_dir(dir);
    }

    if !config.inherit_env {
        cmd.env_clear();
    }

    for (key, value) in &config.env_vars {
        cmd.env(key, value);
    }

    cmd.args(build_args(config, invocation));
    cmd
}

/// Build engine arguments: configured prefix first, then the mode flags.
pub fn build_args(config: &BridgeConfig, invocation: Invocation) -> Vec<String> {
    let mut args = config.engine_args.clone();

    match invocation {
        Invocation::Session(ProtocolMode::Structured) => args.push("--protocol".to_string()),
        Invocation::Session(ProtocolMode::Sentinel) => {}
        Invocation::SelfTest => args.push("--run-tests".to_string()),
        Invocation::NodeCount(depth) => {
            args.push("--perft".to_string());
            args.push(depth.to_string());
        }
    }

    args
}

/// Classify a spawn failure.
pub(crate) fn spawn_error(config: &BridgeConfig, e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::EngineNotFound {
            path: config.engine_display(),
        }
    } else {
        Error::ProcessSpawn {
            path: config.engine_display(),
            source: e,
        }
    }
}

fn missing_pipe(name: &str) -> Error {
    Error::io(std::io::Error::other(format!("engine {name} was not captured")))
}
