//! Configuration module for the chatclick runtime.
//!
//! Layered loading (defaults, files, environment) with figment, plus
//! validation of the values the dispatcher and logging rely on.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, PROFILE_VAR, load_config, load_config_from_file};
pub use schema::{
    ChatclickConfig, DispatchConfig, DispatchSpans, InteractiveConfig, LogFormat, LogLevel,
    LogOutput, LoggingConfig, ReplyConfig,
};
pub use validation::validate_config;
