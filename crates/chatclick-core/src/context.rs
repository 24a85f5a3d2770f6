//! Per-invocation state.
//!
//! - [`Identity`] — the opaque caller handle supplied by the collaborator.
//! - [`InvocationContext`] — everything one dispatch knows: who asked, how to
//!   answer, the raw text and its tokens, the nodes walked, and the resolved
//!   arguments.
//!
//! A fresh `InvocationContext` is created for every dispatch and handed to the
//! handler as an explicit `Arc<InvocationContext>`. Nothing stores it in a
//! global, thread-local or task-local slot, so concurrent invocations that
//! interleave at `.await` points can never observe each other's state.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ReplyResult;
use crate::reply::{BoxedReply, ReplyPayload};
use crate::tree::ArgValue;

/// Resolved option and positional values keyed by name.
pub type ResolvedArgs = BTreeMap<String, ArgValue>;

/// The caller of an invocation, typically a chat user id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wraps a caller id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw caller id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the id is empty or only whitespace.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// A chat mention of the caller, e.g. `<@U123>`.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Identity {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Isolated state of one dispatch.
pub struct InvocationContext {
    identity: Identity,
    reply: BoxedReply,
    raw_text: String,
    tokens: Vec<String>,
    path: Vec<String>,
    args: ResolvedArgs,
}

impl InvocationContext {
    pub(crate) fn new(
        identity: Identity,
        reply: BoxedReply,
        raw_text: String,
        tokens: Vec<String>,
    ) -> Self {
        Self {
            identity,
            reply,
            raw_text,
            tokens,
            path: Vec::new(),
            args: ResolvedArgs::new(),
        }
    }

    /// Records that the walk passed through `node_id` and merges its arguments.
    ///
    /// Arguments of deeper nodes replace same-named arguments of their parents.
    pub(crate) fn enter(&mut self, node_id: &str, args: ResolvedArgs) {
        self.path.push(node_id.to_string());
        self.args.extend(args);
    }

    /// Who sent the command.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The reply capability for this invocation.
    pub fn reply_handle(&self) -> &BoxedReply {
        &self.reply
    }

    /// Sends a reply to whoever sent the command.
    pub async fn say(&self, payload: impl Into<ReplyPayload>) -> ReplyResult<()> {
        self.reply.send(payload.into()).await
    }

    /// The text exactly as received.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// The tokens produced from [`raw_text`](Self::raw_text).
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// `node_id`s of every node walked, root first.
    pub fn resolved_path(&self) -> &[String] {
        &self.path
    }

    /// `node_id` of the node whose handler is running.
    pub fn node_id(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    /// All resolved arguments.
    pub fn args(&self) -> &ResolvedArgs {
        &self.args
    }

    /// A resolved argument by name.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.args.get(name)
    }

    /// A text argument by name.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgValue::as_str)
    }

    /// A flag by name; absent flags read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(ArgValue::as_flag).unwrap_or(false)
    }
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("identity", &self.identity)
            .field("raw_text", &self.raw_text)
            .field("path", &self.path)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
