//! One-shot engine invocations.
//!
//! [`BatchRunner`] runs the engine binary to completion for work that needs
//! no game state: the built-in self-test suite and fixed-depth node counts.
//! Each call spawns its own short-lived process and never touches the
//! session lock, so batch runs may overlap with a game and with each other.

use std::process::{Output, Stdio};
use std::sync::Arc;

use serde::Serialize;

use crate::config::BridgeConfig;
use crate::process::{build_command, spawn_error, Invocation};
use crate::{Error, Result};

/// Outcome of a self-test run.
///
/// A failing suite is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelfTestReport {
    /// Exit code, or `None` when the engine was killed by a signal.
    pub exit_code: Option<i32>,
    /// Stdout followed by stderr.
    pub output: String,
}

impl SelfTestReport {
    /// Whether every test passed.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs stateless engine invocations.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    config: Arc<BridgeConfig>,
}

impl BatchRunner {
    /// Create a runner for the configured engine binary.
    pub fn new(config: Arc<BridgeConfig>) -> Self {
        Self { config }
    }

    /// Run the engine's self-test suite (`--run-tests`).
    ///
    /// Only spawn failures are errors; a non-zero exit is reported in the
    /// returned [`SelfTestReport`].
    pub async fn run_self_tests(&self) -> Result<SelfTestReport> {
        let output = self.run(Invocation::SelfTest).await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        let report = SelfTestReport {
            exit_code: output.status.code(),
            output: combined,
        };
        tracing::info!(exit_code = ?report.exit_code, success = report.success(), "self-tests finished");
        Ok(report)
    }

    /// Count leaf nodes to `depth` (`--perft <depth>`).
    ///
    /// Fails with [`Error::EngineError`] on a non-zero exit and
    /// [`Error::UnexpectedOutput`] when the last line of stdout is not a count.
    pub async fn run_node_count(&self, depth: u32) -> Result<u64> {
        let output = self.run(Invocation::NodeCount(depth)).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::EngineError {
                exit_code: output.status.code(),
                output: failure_output(&stderr, &stdout),
            });
        }

        let nodes = parse_node_count(&stdout)?;
        tracing::info!(depth, nodes, "node count finished");
        Ok(nodes)
    }

    async fn run(&self, invocation: Invocation) -> Result<Output> {
        let mut cmd = build_command(&self.config, invocation);
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);

        tracing::debug!(?invocation, engine = %self.config.engine_display(), "running engine");
        cmd.output().await.map_err(|e| spawn_error(&self.config, e))
    }
}

/// Parse the final line of `--perft` output.
pub fn parse_node_count(stdout: &str) -> Result<u64> {
    let last = stdout
        .trim()
        .lines()
        .last()
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| Error::UnexpectedOutput {
            output: stdout.to_string(),
        })?;

    last.trim().parse().map_err(|_| Error::UnexpectedOutput {
        output: last.to_string(),
    })
}

fn failure_output(stderr: &str, stdout: &str) -> String {
    [stderr, stdout]
        .into_iter()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("no output")
        .to_string()
}
