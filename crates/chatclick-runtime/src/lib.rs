//! Chatclick Runtime - configuration, logging and routing for chatclick.
//!
//! This crate provides:
//! - Layered configuration with figment ([`ConfigLoader`], [`ChatclickConfig`])
//! - Logging setup on top of `tracing-subscriber` ([`LoggingBuilder`])
//! - Routing of slash commands to their trees ([`CommandApp`], [`SlashCommand`])
//!
//! ```ignore
//! use chatclick_runtime::{CommandApp, ConfigLoader, SlashCommand, logging};
//!
//! let config = ConfigLoader::new().load()?;
//! logging::init_from_config(&config.logging);
//!
//! let app = CommandApp::from_config(&config).command(click_tree)?;
//! app.handle(SlashCommand::new("/click", "ping", "U123"), reply).await?;
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::{CommandApp, SlashCommand};
pub use config::{
    ChatclickConfig, ConfigError, ConfigLoader, ConfigResult, DispatchSpans, LoggingConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
