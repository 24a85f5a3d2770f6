//! Interactive (out-of-band) dispatch.
//!
//! Some triggers do not arrive as command text: a button pressed on a message
//! produced by `/click goodbye` should run logic tied to that command without
//! re-parsing anything. Such handlers are registered by `node_id` while the
//! tree is built and looked up directly afterwards.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::context::Identity;
use crate::error::ReplyResult;
use crate::handler::HandlerResponse;
use crate::reply::{BoxedReply, ReplyPayload};

/// State handed to an interactive handler.
pub struct InteractiveContext {
    node_id: String,
    identity: Identity,
    reply: BoxedReply,
    payload: Value,
}

impl InteractiveContext {
    pub(crate) fn new(node_id: &str, identity: Identity, reply: BoxedReply, payload: Value) -> Self {
        Self {
            node_id: node_id.to_string(),
            identity,
            reply,
            payload,
        }
    }

    /// The node the trigger refers to.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Who pressed the button.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The reply capability for this trigger.
    pub fn reply_handle(&self) -> &BoxedReply {
        &self.reply
    }

    /// Sends a reply to whoever triggered the action.
    pub async fn say(&self, payload: impl Into<ReplyPayload>) -> ReplyResult<()> {
        self.reply.send(payload.into()).await
    }

    /// Platform-specific data that came with the trigger (`Value::Null` if none).
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

impl fmt::Debug for InteractiveContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractiveContext")
            .field("node_id", &self.node_id)
            .field("identity", &self.identity)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

/// A handler for interactive triggers.
pub trait InteractiveHandler: Send + Sync + 'static {
    /// Runs the handler to completion, including its reply side effects.
    fn call(&self, ctx: InteractiveContext) -> BoxFuture<'static, ()>;
}

impl<F, Fut, Res> InteractiveHandler for F
where
    F: Fn(Arc<InteractiveContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: HandlerResponse,
{
    fn call(&self, ctx: InteractiveContext) -> BoxFuture<'static, ()> {
        let ctx = Arc::new(ctx);
        let fut = (self)(Arc::clone(&ctx));
        async move {
            let res = fut.await;
            res.respond(ctx.reply_handle()).await;
        }
        .boxed()
    }
}

/// A type-erased interactive handler.
pub type BoxedInteractiveHandler = Arc<dyn InteractiveHandler>;

/// `node_id` → handler, at most one handler per id.
///
/// Filled by [`CommandTreeBuilder`](crate::CommandTreeBuilder) and read-only
/// once the tree is built.
#[derive(Default, Clone)]
pub struct InteractiveRegistry {
    handlers: HashMap<String, BoxedInteractiveHandler>,
}

impl InteractiveRegistry {
    /// Inserts a handler; returns `false` if the id already had one.
    pub(crate) fn insert(&mut self, node_id: String, handler: BoxedInteractiveHandler) -> bool {
        if self.handlers.contains_key(&node_id) {
            return false;
        }
        self.handlers.insert(node_id, handler);
        true
    }

    /// Looks up the handler for `node_id`.
    pub fn get(&self, node_id: &str) -> Option<&BoxedInteractiveHandler> {
        self.handlers.get(node_id)
    }

    /// Returns `true` if a handler exists for `node_id`.
    pub fn contains(&self, node_id: &str) -> bool {
        self.handlers.contains_key(node_id)
    }

    /// Iterates over registered ids.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for InteractiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::MemoryReply;

    async fn echo_node(ctx: Arc<InteractiveContext>) -> String {
        format!("{} pressed {}", ctx.identity().mention(), ctx.node_id())
    }

    #[test]
    fn test_insert_rejects_second_handler() {
        let mut registry = InteractiveRegistry::default();
        assert!(registry.insert("/click.goodbye".into(), Arc::new(echo_node)));
        assert!(!registry.insert("/click.goodbye".into(), Arc::new(echo_node)));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("/click.goodbye"));
    }

    #[test]
    fn test_handler_replies_through_context() {
        let mut registry = InteractiveRegistry::default();
        registry.insert("/click.goodbye".into(), Arc::new(echo_node));

        let memory = MemoryReply::shared();
        let ctx = InteractiveContext::new(
            "/click.goodbye",
            Identity::new("U7"),
            memory.clone(),
            Value::Null,
        );
        let handler = registry.get("/click.goodbye").unwrap();
        tokio_test::block_on(handler.call(ctx));

        assert_eq!(memory.sent()[0].text, "<@U7> pressed /click.goodbye");
    }
}
