//! # Chatclick
//!
//! Command-line style slash commands for chat platforms.
//!
//! ## Overview
//!
//! Chatclick lets a chat bot expose commands the way a CLI would: nested
//! groups, options, positionals, `--help` and `--version`, and friendly usage
//! errors. The chat platform only has to deliver the command text and the
//! caller's id, and provide a way to send replies.
//!
//! ```text
//! ┌──────────────┐     ┌────────────┐     ┌────────────┐     ┌──────────┐
//! │ SlashCommand │────▶│ CommandApp │────▶│ Dispatcher │────▶│ Handler  │
//! │ (/click ...) │     │ (by root)  │     │ (per tree) │     │ (async)  │
//! └──────────────┘     └────────────┘     └────────────┘     └──────────┘
//!                                               │
//!                                               └──▶ help / version / usage error
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chatclick::prelude::*;
//!
//! async fn ping(ctx: Arc<InvocationContext>) -> String {
//!     format!("Hiya {}.  Ping back at you :eyes:", ctx.identity().mention())
//! }
//!
//! let config = ConfigLoader::new().load()?;
//! chatclick::runtime::logging::init_from_config(&config.logging);
//!
//! let ping_tree = CommandTreeBuilder::command("/ping", CommandSpec::new().handler(ping))?.build()?;
//! let app = CommandApp::from_config(&config).command(ping_tree)?;
//! app.handle(SlashCommand::new("/ping", "", "U123"), reply).await?;
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use chatclick_core as core;
pub use chatclick_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use chatclick::prelude::*;
/// ```
pub mod prelude {
    // Tree building and handlers
    pub use chatclick_core::prelude::*;

    // Runtime entry points
    pub use chatclick_runtime::{
        ChatclickConfig, CommandApp, ConfigLoader, LoggingBuilder, SlashCommand,
    };
}
