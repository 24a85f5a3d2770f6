//! Error types for chatclick.
//!
//! Registration failures are fatal and only happen while the command tree is
//! being built. Dispatch failures are configuration problems surfaced to the
//! calling collaborator. [`UsageError`] is recovered by the dispatcher itself
//! and turned into a chat reply.

use thiserror::Error;

/// Errors raised while building a command tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A sibling with the same name already exists under the parent.
    #[error("duplicate command name '{name}' under '{parent}'")]
    DuplicateName {
        /// `node_id` of the parent group.
        parent: String,
        /// The colliding name.
        name: String,
    },

    /// The command name is empty or contains characters that break tokenizing.
    #[error("invalid command name '{0}'")]
    InvalidName(String),

    /// Two options on one node share a declaration.
    #[error("duplicate option '{decl}' on '{node_id}'")]
    DuplicateOption {
        /// The node carrying both options.
        node_id: String,
        /// The colliding declaration, e.g. `--name`.
        decl: String,
    },

    /// An option declaration does not start with `-`.
    #[error("invalid option declaration '{decl}' on '{node_id}'")]
    InvalidOption {
        /// The node carrying the option.
        node_id: String,
        /// The offending declaration.
        decl: String,
    },

    /// A leaf command was registered without a handler.
    #[error("command '{0}' has no handler")]
    MissingHandler(String),

    /// Children can only be added below groups.
    #[error("'{0}' is a command, not a group")]
    ParentNotGroup(String),

    /// The parent handle does not belong to this builder.
    #[error("unknown parent node")]
    UnknownParent,

    /// An interactive handler targets a node that was never registered.
    #[error("no command registered with id '{0}'")]
    UnknownNode(String),

    /// A second interactive handler was registered for the same node.
    #[error("interactive handler already registered for '{0}'")]
    DuplicateInteractive(String),
}

/// Errors surfaced to the caller of [`Dispatcher::dispatch`](crate::Dispatcher::dispatch).
///
/// Usage errors are never returned here; they are answered in chat.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The invocation carried no (or an empty) identity.
    #[error("invocation is missing the caller identity")]
    MissingIdentity,

    /// The invocation carried no reply capability.
    #[error("invocation is missing a reply capability")]
    MissingReply,

    /// The reply capability failed while the dispatcher was answering.
    #[error(transparent)]
    Reply(#[from] ReplyError),
}

/// Errors returned by a [`Reply`](crate::Reply) implementation.
#[derive(Debug, Clone, Error)]
pub enum ReplyError {
    /// The reply channel has been closed by the collaborator.
    #[error("reply channel closed")]
    Closed,

    /// The payload could not be encoded for the transport.
    #[error("failed to encode reply: {0}")]
    Encode(String),

    /// Any transport-specific failure.
    #[error("failed to send reply: {0}")]
    Send(String),
}

impl From<serde_json::Error> for ReplyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

/// A failure to resolve user text against a command node.
///
/// Carries the offending node, the message shown to the user, and the tokens
/// that were being resolved when the failure happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UsageError {
    /// `node_id` of the node that rejected the input.
    pub node_id: String,
    /// Human-readable message, e.g. `Missing option '--name'.`
    pub message: String,
    /// The tokens handed to the resolver for that node.
    pub tokens: Vec<String>,
}

impl UsageError {
    pub(crate) fn new(node_id: &str, message: impl Into<String>, tokens: &[String]) -> Self {
        Self {
            node_id: node_id.to_string(),
            message: message.into(),
            tokens: tokens.to_vec(),
        }
    }
}

/// Result type for tree registration.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Result type for dispatch.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for reply sends.
pub type ReplyResult<T> = Result<T, ReplyError>;
