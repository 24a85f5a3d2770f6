//! Runtime error types.

use chatclick_core::{DispatchError, RegistrationError};
use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur while routing requests through a [`CommandApp`](crate::CommandApp).
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No tree is registered for the slash command.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Two trees share a root name.
    #[error("Command already registered: {0}")]
    DuplicateCommand(String),

    /// A tree failed to build.
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// The dispatcher rejected the request.
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
