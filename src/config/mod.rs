//! Configuration for the engine bridge.
//!
//! This module provides:
//!
//! - [`BridgeConfig`] and [`BridgeConfigBuilder`] for locating and driving the engine
//! - Type-safe options like [`ProtocolMode`] and [`Side`]
//!
//! # Example
//!
//! ```ignore
//! use engine_bridge::config::{BridgeConfig, ProtocolMode};
//!
//! // Defaults plus CHESS_ENGINE_PATH / CHESS_ENGINE_PROTOCOL overrides
//! let config = BridgeConfig::from_env()?;
//!
//! // Explicit
//! let config = BridgeConfig::builder()
//!     .engine_path("./target/release/chess")
//!     .protocol(ProtocolMode::Structured)
//!     .build()?;
//! ```

pub mod builder;
pub mod options;

pub use builder::{
    BridgeConfig, BridgeConfigBuilder, DEFAULT_ENGINE_PATH, DEFAULT_LINE_CAP,
    DEFAULT_TERMINATE_GRACE, ENV_ENGINE_PATH, ENV_ENGINE_PROTOCOL,
};
pub use options::{ProtocolMode, Side};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_exports_accessible() {
        let _: ProtocolMode = ProtocolMode::Sentinel;
        let _: Side = Side::Black;
        let _: usize = DEFAULT_LINE_CAP;
        let _: &str = ENV_ENGINE_PATH;
    }

    #[test]
    fn builder_accessible() {
        let _ = BridgeConfig::builder();
    }
}
