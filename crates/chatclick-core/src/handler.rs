//! Command handlers.
//!
//! A handler is any async function taking the invocation's context:
//!
//! ```rust,ignore
//! async fn goodbye(ctx: Arc<InvocationContext>) -> String {
//!     format!("Goodbye {}!", ctx.arg("name").unwrap_or("stranger"))
//! }
//! ```
//!
//! Whatever the handler returns is turned into replies through
//! [`HandlerResponse`]: `()` sends nothing, strings and [`ReplyPayload`]s are
//! sent through the invocation's reply capability, `Option` sends only on
//! `Some`, and `Result` sends on `Ok` and logs on `Err`.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::error;

use crate::context::InvocationContext;
use crate::reply::{BoxedReply, ReplyPayload};

// ============================================================================
// HandlerResponse
// ============================================================================

/// A trait for types that can be returned from handlers.
#[async_trait]
pub trait HandlerResponse: Send + 'static {
    /// Performs the reply side effects for this value.
    async fn respond(self, reply: &BoxedReply);
}

/// Implementation for `()` - no response needed.
#[async_trait]
impl HandlerResponse for () {
    async fn respond(self, _reply: &BoxedReply) {}
}

/// Implementation for `String` - sends it as a plain text reply.
#[async_trait]
impl HandlerResponse for String {
    async fn respond(self, reply: &BoxedReply) {
        ReplyPayload::text(self).respond(reply).await;
    }
}

#[async_trait]
impl HandlerResponse for &'static str {
    async fn respond(self, reply: &BoxedReply) {
        ReplyPayload::text(self).respond(reply).await;
    }
}

#[async_trait]
impl HandlerResponse for ReplyPayload {
    async fn respond(self, reply: &BoxedReply) {
        if let Err(e) = reply.send(self).await {
            error!("Failed to send reply: {e}");
        }
    }
}

/// Implementation for `Option<T>` where T implements HandlerResponse.
///
/// On Some, the inner value's response is handled. On None, no action is taken.
#[async_trait]
impl<T: HandlerResponse> HandlerResponse for Option<T> {
    async fn respond(self, reply: &BoxedReply) {
        if let Some(t) = self {
            t.respond(reply).await;
        }
    }
}

/// Implementation for `Result<T, E>` where T implements HandlerResponse.
///
/// On Ok, the inner value's response is handled. On Err, the error is logged.
#[async_trait]
impl<T: HandlerResponse, E: std::fmt::Display + Send + 'static> HandlerResponse for Result<T, E> {
    async fn respond(self, reply: &BoxedReply) {
        match self {
            Ok(t) => t.respond(reply).await,
            Err(e) => {
                error!("Handler error: {e}");
            }
        }
    }
}

// ============================================================================
// Handler
// ============================================================================

/// A command handler.
///
/// Implemented for every `Fn(Arc<InvocationContext>) -> impl Future` whose
/// output implements [`HandlerResponse`]. The context is owned by this one
/// invocation; it is never visible to any other.
pub trait Handler: Send + Sync + 'static {
    /// Runs the handler to completion, including its reply side effects.
    fn call(&self, ctx: Arc<InvocationContext>) -> BoxFuture<'static, ()>;
}

impl<F, Fut, Res> Handler for F
where
    F: Fn(Arc<InvocationContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: HandlerResponse,
{
    fn call(&self, ctx: Arc<InvocationContext>) -> BoxFuture<'static, ()> {
        let fut = (self)(Arc::clone(&ctx));
        async move {
            let res = fut.await;
            res.respond(ctx.reply_handle()).await;
        }
        .boxed()
    }
}

/// A type-erased handler stored in the command tree.
pub type BoxedHandler = Arc<dyn Handler>;

/// Converts a handler function into a [`BoxedHandler`].
pub fn into_handler<H: Handler>(handler: H) -> BoxedHandler {
    Arc::new(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::MemoryReply;

    fn recorder() -> (Arc<MemoryReply>, BoxedReply) {
        let memory = MemoryReply::shared();
        let reply: BoxedReply = memory.clone();
        (memory, reply)
    }

    #[tokio::test]
    async fn test_unit_sends_nothing() {
        let (memory, reply) = recorder();
        ().respond(&reply).await;
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_string_sends_text() {
        let (memory, reply) = recorder();
        "pong".to_string().respond(&reply).await;
        assert_eq!(memory.sent()[0].text, "pong");
    }

    #[tokio::test]
    async fn test_option_and_result() {
        let (memory, reply) = recorder();
        None::<String>.respond(&reply).await;
        Some("yes").respond(&reply).await;
        Err::<String, _>("boom").respond(&reply).await;
        Ok::<_, String>("ok").respond(&reply).await;

        let texts: Vec<_> = memory.sent().into_iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["yes", "ok"]);
    }
}
