//! # Chatclick Core
//!
//! Command-line style commands for chat platforms.
//!
//! A slash command such as `/click goodbye --name Alice` arrives as plain
//! text plus the identity of whoever typed it. This crate turns that text into
//! a call of the right async handler:
//!
//! - **Tokenizer**: shell-like splitting with a whitespace fallback ([`tokenize`])
//! - **Command Tree**: groups and commands with options and positionals
//!   ([`CommandTreeBuilder`], [`CommandTree`])
//! - **Resolver**: per-node argument resolution with click-style errors
//!   ([`resolve`])
//! - **Invocation Context**: isolated per-dispatch state handed to handlers
//!   ([`InvocationContext`])
//! - **Dispatcher**: the async walk from text to handler ([`Dispatcher`])
//! - **Translator**: usage errors, help and version as chat payloads
//!   ([`Translator`])
//! - **Interactive Registry**: button-style triggers addressed by `node_id`
//!   ([`InteractiveRegistry`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use chatclick_core::prelude::*;
//!
//! async fn ping(ctx: Arc<InvocationContext>) -> String {
//!     format!("Hiya {}.  Ping back at you :eyes:", ctx.identity().mention())
//! }
//!
//! let tree = CommandTreeBuilder::command("/ping", CommandSpec::new().version("0.1.0").handler(ping))?
//!     .build()?;
//! let dispatcher = Dispatcher::new(tree);
//!
//! let reply = MemoryReply::shared();
//! dispatcher.dispatch("", "U123", reply.clone()).await?;
//! ```

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod interactive;
pub mod reply;
pub mod resolver;
pub mod split;
pub mod translate;
pub mod tree;

pub use context::{Identity, InvocationContext, ResolvedArgs};
pub use dispatcher::{DispatchOptions, Dispatcher, InteractiveOutcome, Invocation, Outcome};
pub use error::{
    DispatchError, DispatchResult, RegistrationError, RegistrationResult, ReplyError,
    ReplyResult, UsageError,
};
pub use handler::{BoxedHandler, Handler, HandlerResponse, into_handler};
pub use interactive::{
    BoxedInteractiveHandler, InteractiveContext, InteractiveHandler, InteractiveRegistry,
};
pub use reply::{Attachment, BoxedReply, MemoryReply, Reply, ReplyPayload};
pub use resolver::{Resolution, resolve};
pub use split::tokenize;
pub use translate::Translator;
pub use tree::{
    ArgValue, CommandNode, CommandSpec, CommandTree, CommandTreeBuilder, EagerKind, NodeHandle,
    NodeKind, OptionSpec, PositionalSpec, render_help,
};

/// Everything needed to build a tree and write handlers.
pub mod prelude {
    pub use std::sync::Arc;

    pub use crate::{
        ArgValue, Attachment, BoxedReply, CommandSpec, CommandTreeBuilder, DispatchOptions,
        Dispatcher, Identity, InteractiveContext, InvocationContext, MemoryReply, OptionSpec,
        Outcome, PositionalSpec, Reply, ReplyPayload,
    };
}
