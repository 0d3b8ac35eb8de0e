//! Bridge configuration and builder.
//!
//! # Example
//!
//! ```
//! use engine_bridge::config::{BridgeConfig, ProtocolMode};
//!
//! let config = BridgeConfig::builder()
//!     .engine_path("/usr/local/bin/chess")
//!     .protocol(ProtocolMode::Sentinel)
//!     .line_cap(200)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.protocol(), ProtocolMode::Sentinel);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::options::ProtocolMode;
use crate::{Error, Result};

/// Environment variable overriding the engine binary path.
pub const ENV_ENGINE_PATH: &str = "CHESS_ENGINE_PATH";

/// Environment variable overriding the protocol mode.
pub const ENV_ENGINE_PROTOCOL: &str = "CHESS_ENGINE_PROTOCOL";

/// Where the engine binary is installed when nothing else is configured.
pub const DEFAULT_ENGINE_PATH: &str = "/usr/local/bin/chess";

/// Maximum lines consumed by one sentinel-mode exchange.
pub const DEFAULT_LINE_CAP: usize = 500;

/// How long a terminated engine gets to exit before it is killed.
pub const DEFAULT_TERMINATE_GRACE: Duration = Duration::from_millis(500);

/// Configuration for driving the engine binary.
///
/// Use [`BridgeConfig::builder()`] to create a new configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub(crate) engine_path: PathBuf,
    pub(crate) engine_args: Vec<String>,
    pub(crate) protocol: ProtocolMode,
    pub(crate) line_cap: usize,
    pub(crate) terminate_grace: Duration,
    pub(crate) working_directory: Option<PathBuf>,
    pub(crate) env_vars: HashMap<String, String>,
    pub(crate) inherit_env: bool,
}

impl BridgeConfig {
    /// Create a new builder for BridgeConfig.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Build a configuration from defaults and environment overrides only.
    pub fn from_env() -> Result<Self> {
        Self::builder().build()
    }

    /// Path of the engine binary.
    pub fn engine_path(&self) -> &Path {
        &self.engine_path
    }

    /// Arguments placed before the mode flags on every invocation.
    pub fn engine_args(&self) -> &[String] {
        &self.engine_args
    }

    /// Protocol spoken by persistent sessions.
    pub fn protocol(&self) -> ProtocolMode {
        self.protocol
    }

    /// Line cap for sentinel accumulation.
    pub fn line_cap(&self) -> usize {
        self.line_cap
    }

    /// Grace period between the polite and the forced stop.
    pub fn terminate_grace(&self) -> Duration {
        self.terminate_grace
    }

    /// Working directory for engine processes, if set.
    pub fn working_directory(&self) -> Option<&PathBuf> {
        self.working_directory.as_ref()
    }

    /// Engine path as it appears in error messages.
    pub(crate) fn engine_display(&self) -> String {
        self.engine_path.display().to_string()
    }
}

/// Builder for [`BridgeConfig`].
///
/// Unset values fall back to the environment, then to the built-in defaults.
#[derive(Debug, Clone)]
pub struct BridgeConfigBuilder {
    engine_path: Option<PathBuf>,
    engine_args: Vec<String>,
    protocol: Option<ProtocolMode>,
    line_cap: usize,
    terminate_grace: Duration,
    working_directory: Option<PathBuf>,
    env_vars: HashMap<String, String>,
    inherit_env: bool,
}

impl Default for BridgeConfigBuilder {
    fn default() -> Self {
        Self {
            engine_path: None,
            engine_args: Vec::new(),
            protocol: None,
            line_cap: DEFAULT_LINE_CAP,
            terminate_grace: DEFAULT_TERMINATE_GRACE,
            working_directory: None,
            env_vars: HashMap::new(),
            inherit_env: true,
        }
    }
}

impl BridgeConfigBuilder {
    // -------------------------------------------------------------------------
    // Engine binary
    // -------------------------------------------------------------------------

    /// Path to the engine binary (default: `$CHESS_ENGINE_PATH`, then `/usr/local/bin/chess`).
    pub fn engine_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.engine_path = Some(path.into());
        self
    }

    /// Arguments passed before the mode flags on every invocation.
    pub fn engine_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.engine_args = args.into_iter().map(Into::into).collect();
        self
    }

    // -------------------------------------------------------------------------
    // Session protocol
    // -------------------------------------------------------------------------

    /// Protocol for persistent sessions (default: `$CHESS_ENGINE_PROTOCOL`, then structured).
    pub fn protocol(mut self, mode: ProtocolMode) -> Self {
        self.protocol = Some(mode);
        self
    }

    /// Maximum lines read per sentinel-mode exchange.
    pub fn line_cap(mut self, cap: usize) -> Self {
        self.line_cap = cap;
        self
    }

    /// Grace period between SIGTERM and kill when stopping the engine.
    pub fn terminate_grace(mut self, grace: Duration) -> Self {
        self.terminate_grace = grace;
        self
    }

    // -------------------------------------------------------------------------
    // Process options
    // -------------------------------------------------------------------------

    /// Working directory for engine processes.
    pub fn working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(path.into());
        self
    }

    /// Add/override environment variable for engine processes.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Don't inherit parent environment (default: inherit).
    pub fn inherit_env(mut self, inherit: bool) -> Self {
        self.inherit_env = inherit;
        self
    }

    // -------------------------------------------------------------------------
    // Build
    // -------------------------------------------------------------------------

    /// Build the configuration, reading overrides from the process environment.
    ///
    /// This validates:
    /// - The engine path is not empty
    /// - The line cap is positive
    /// - A protocol override names a known mode
    /// - The working directory exists if set
    ///
    /// Note: engine existence is checked lazily at spawn time.
    pub fn build(self) -> Result<BridgeConfig> {
        self.build_with_env(|key| std::env::var(key).ok())
    }

    pub(crate) fn build_with_env<F>(self, lookup: F) -> Result<BridgeConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let engine_path = self
            .engine_path
            .or_else(|| lookup(ENV_ENGINE_PATH).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE_PATH));

        if engine_path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("engine path must not be empty".into()));
        }

        let protocol = match self.protocol {
            Some(mode) => mode,
            None => match lookup(ENV_ENGINE_PROTOCOL) {
                Some(raw) => raw.parse()?,
                None => ProtocolMode::default(),
            },
        };

        if self.line_cap == 0 {
            return Err(Error::InvalidConfig("line_cap must be positive".into()));
        }

        if let Some(ref dir) = self.working_directory {
            if !dir.exists() {
                return Err(Error::InvalidConfig(format!(
                    "working directory does not exist: {}",
                    dir.display()
                )));
            }
        }

        Ok(BridgeConfig {
            engine_path,
            engine_args: self.engine_args,
            protocol,
            line_cap: self.line_cap,
            terminate_grace: self.terminate_grace,
            working_directory: self.working_directory,
            env_vars: self.env_vars,
            inherit_env: self.inherit_env,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_environment() {
        let config = BridgeConfig::builder().build_with_env(no_env).unwrap();

        assert_eq!(config.engine_path(), Path::new(DEFAULT_ENGINE_PATH));
        assert_eq!(config.protocol(), ProtocolMode::Structured);
        assert_eq!(config.line_cap(), 500);
        assert_eq!(config.terminate_grace(), DEFAULT_TERMINATE_GRACE);
        assert!(config.engine_args().is_empty());
        assert!(config.inherit_env);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = BridgeConfig::builder()
            .build_with_env(|key| match key {
                ENV_ENGINE_PATH => Some("/opt/engine/chess".into()),
                ENV_ENGINE_PROTOCOL => Some("interactive".into()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.engine_path(), Path::new("/opt/engine/chess"));
        assert_eq!(config.protocol(), ProtocolMode::Sentinel);
    }

    #[test]
    fn explicit_values_beat_environment() {
        let config = BridgeConfig::builder()
            .engine_path("/bin/chess")
            .protocol(ProtocolMode::Structured)
            .build_with_env(|key| match key {
                ENV_ENGINE_PATH => Some("/opt/engine/chess".into()),
                ENV_ENGINE_PROTOCOL => Some("sentinel".into()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.engine_path(), Path::new("/bin/chess"));
        assert_eq!(config.protocol(), ProtocolMode::Structured);
    }

    #[test]
    fn invalid_protocol_override() {
        let result = BridgeConfig::builder().build_with_env(|key| {
            (key == ENV_ENGINE_PROTOCOL).then(|| "uci".to_string())
        });

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn empty_engine_path_rejected() {
        let result = BridgeConfig::builder().engine_path("").build_with_env(no_env);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_line_cap_rejected() {
        let result = BridgeConfig::builder().line_cap(0).build_with_env(no_env);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn invalid_working_directory() {
        let result = BridgeConfig::builder()
            .working_directory("/nonexistent/path/that/does/not/exist")
            .build_with_env(no_env);

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn engine_args_and_env() {
        let config = BridgeConfig::builder()
            .engine_args(["-c", "exit 0"])
            .env("ENGINE_THREADS", "1")
            .inherit_env(false)
            .build_with_env(no_env)
            .unwrap();

        assert_eq!(config.engine_args(), ["-c".to_string(), "exit 0".to_string()]);
        assert_eq!(config.env_vars.get("ENGINE_THREADS"), Some(&"1".to_string()));
        assert!(!config.inherit_env);
    }

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BridgeConfig>();
        assert_send_sync::<BridgeConfigBuilder>();
    }
}
