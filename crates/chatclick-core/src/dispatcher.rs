//! The async dispatcher.
//!
//! A [`Dispatcher`] owns a frozen [`CommandTree`] and turns `(text, identity,
//! reply)` triples into handler invocations:
//!
//! 1. The identity and reply capability are checked and a fresh
//!    [`InvocationContext`] is created.
//! 2. The text is tokenized and the tree is walked one node at a time with
//!    [`resolve`].
//! 3. The walk ends in exactly one of four ways: an eager option answers with
//!    help or version, a usage error is translated into a chat reply, a
//!    handler is awaited, or a group without a handler is acknowledged.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new(tree);
//! let outcome = dispatcher.dispatch("goodbye --name Alice", "U123", reply).await?;
//! ```
//!
//! Every call gets its own context, so any number of dispatches may run
//! concurrently on the same dispatcher.

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tower::Service;
use tracing::{Instrument, debug, error, info_span, warn};

use crate::context::{Identity, InvocationContext};
use crate::error::{DispatchError, DispatchResult, UsageError};
use crate::interactive::InteractiveContext;
use crate::reply::{BoxedReply, ReplyPayload};
use crate::resolver::{Resolution, resolve};
use crate::split::tokenize;
use crate::translate::Translator;
use crate::tree::{CommandNode, CommandTree, EagerKind};

// ============================================================================
// Options and requests
// ============================================================================

/// Tunables for the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Sent when a group without a handler is invoked without a subcommand.
    /// `{command}` is replaced by the group's command path. `None` stays
    /// silent.
    pub fallback_reply: Option<String>,

    /// Sent when an interactive trigger has no handler. `None` stays silent.
    pub interactive_miss_reply: Option<String>,
}

impl DispatchOptions {
    /// Creates the default (silent) options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fallback reply for handler-less groups.
    pub fn fallback_reply(mut self, text: impl Into<String>) -> Self {
        self.fallback_reply = Some(text.into());
        self
    }

    /// Sets the reply for interactive triggers without a handler.
    pub fn interactive_miss_reply(mut self, text: impl Into<String>) -> Self {
        self.interactive_miss_reply = Some(text.into());
        self
    }
}

/// One request to the dispatcher.
///
/// Identity and reply are optional here so that collaborators forwarding
/// incomplete requests get a [`DispatchError`] instead of a panic.
#[derive(Clone, Default)]
pub struct Invocation {
    /// The text after the root command name.
    pub text: String,
    /// Who sent the command.
    pub identity: Option<Identity>,
    /// How to answer.
    pub reply: Option<BoxedReply>,
}

impl Invocation {
    /// Creates an invocation with text only.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            identity: None,
            reply: None,
        }
    }

    /// Sets the caller identity.
    pub fn identity(mut self, identity: impl Into<Identity>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Sets the reply capability.
    pub fn reply(mut self, reply: BoxedReply) -> Self {
        self.reply = Some(reply);
        self
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("text", &self.text)
            .field("identity", &self.identity)
            .field("has_reply", &self.reply.is_some())
            .finish()
    }
}

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The handler of `node_id` ran to completion.
    Invoked {
        /// The node whose handler ran.
        node_id: String,
    },
    /// An eager option was answered; no handler ran.
    EagerExit {
        /// The node that owned the eager option.
        node_id: String,
        /// Which eager option.
        kind: EagerKind,
    },
    /// The input was rejected and the user was told why.
    UsageError {
        /// The node that rejected the input.
        node_id: String,
        /// The message that was sent.
        message: String,
    },
    /// A group without a handler was invoked without a subcommand.
    Acknowledged {
        /// The group.
        node_id: String,
    },
}

impl Outcome {
    /// The node the dispatch ended at.
    pub fn node_id(&self) -> &str {
        match self {
            Self::Invoked { node_id }
            | Self::EagerExit { node_id, .. }
            | Self::UsageError { node_id, .. }
            | Self::Acknowledged { node_id } => node_id,
        }
    }
}

/// How an interactive dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractiveOutcome {
    /// The handler for `node_id` ran.
    Handled {
        /// The trigger's node.
        node_id: String,
    },
    /// No handler was registered for `node_id`.
    Miss {
        /// The trigger's node.
        node_id: String,
    },
}

// ============================================================================
// Dispatcher
// ============================================================================

enum State<'a> {
    Walking {
        node: &'a Arc<CommandNode>,
        offset: usize,
    },
    EagerExit {
        node: &'a Arc<CommandNode>,
        kind: EagerKind,
    },
    UsageError {
        node: &'a Arc<CommandNode>,
        error: UsageError,
    },
    Invoke {
        node: &'a Arc<CommandNode>,
    },
}

/// Routes text to handlers in a [`CommandTree`].
///
/// Cheap to clone; clones share the tree.
#[derive(Clone)]
pub struct Dispatcher {
    tree: Arc<CommandTree>,
    options: Arc<DispatchOptions>,
    translator: Arc<Translator>,
}

impl Dispatcher {
    /// Creates a dispatcher with default options.
    pub fn new(tree: Arc<CommandTree>) -> Self {
        Self {
            tree,
            options: Arc::new(DispatchOptions::default()),
            translator: Arc::new(Translator::default()),
        }
    }

    /// Replaces the dispatch options (builder pattern).
    pub fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = Arc::new(options);
        self
    }

    /// Replaces the reply translator (builder pattern).
    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = Arc::new(translator);
        self
    }

    /// The tree this dispatcher routes into.
    pub fn tree(&self) -> &Arc<CommandTree> {
        &self.tree
    }

    /// The options in effect.
    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Dispatches `text` on behalf of `identity`, answering through `reply`.
    pub async fn dispatch(
        &self,
        text: impl Into<String>,
        identity: impl Into<Identity>,
        reply: BoxedReply,
    ) -> DispatchResult<Outcome> {
        self.run(Invocation::new(text).identity(identity).reply(reply))
            .await
    }

    /// Dispatches a prepared [`Invocation`].
    pub async fn run(&self, invocation: Invocation) -> DispatchResult<Outcome> {
        let Invocation {
            text,
            identity,
            reply,
        } = invocation;

        let identity = identity
            .filter(|id| !id.is_empty())
            .ok_or(DispatchError::MissingIdentity)?;
        let reply = reply.ok_or(DispatchError::MissingReply)?;

        let span = info_span!("dispatch", command = %self.tree.name(), identity = %identity);
        self.walk(text, identity, reply).instrument(span).await
    }

    async fn walk(
        &self,
        text: String,
        identity: Identity,
        reply: BoxedReply,
    ) -> DispatchResult<Outcome> {
        let tokens = tokenize(&text);
        debug!(?tokens, "Tokenized command text");

        let mut ctx = InvocationContext::new(identity, reply, text, tokens.clone());
        let mut state = State::Walking {
            node: self.tree.root(),
            offset: 0,
        };

        loop {
            state = match state {
                State::Walking { node, offset } => match resolve(node, &tokens[offset..]) {
                    Ok(Resolution::Eager(kind)) => State::EagerExit { node, kind },
                    Ok(Resolution::Descend {
                        args,
                        child,
                        consumed,
                    }) => {
                        ctx.enter(node.node_id(), args);
                        State::Walking {
                            node: child,
                            offset: offset + consumed,
                        }
                    }
                    Ok(Resolution::Complete(args)) => {
                        ctx.enter(node.node_id(), args);
                        State::Invoke { node }
                    }
                    Err(error) => State::UsageError { node, error },
                },

                State::EagerExit { node, kind } => {
                    debug!(node_id = node.node_id(), %kind, "Eager option, skipping handler");
                    let payload = match kind {
                        EagerKind::Help => self.translator.help(node),
                        EagerKind::Version => self.translator.version(node, self.tree.name()),
                    };
                    self.send(&ctx, payload).await?;
                    return Ok(Outcome::EagerExit {
                        node_id: node.node_id().to_string(),
                        kind,
                    });
                }

                State::UsageError { node, error } => {
                    warn!(node_id = %error.node_id, "Usage error: {error}");
                    let command = format!("{} {}", self.tree.name(), ctx.raw_text());
                    let payload = self.translator.translate(
                        node,
                        command.trim(),
                        ctx.identity(),
                        &error.message,
                    );
                    self.send(&ctx, payload).await?;
                    return Ok(Outcome::UsageError {
                        node_id: error.node_id,
                        message: error.message,
                    });
                }

                State::Invoke { node } => {
                    let node_id = node.node_id().to_string();
                    let Some(handler) = node.handler() else {
                        debug!(node_id = %node_id, "Group invoked without a subcommand");
                        if let Some(fallback) = &self.options.fallback_reply {
                            let text = fallback.replace("{command}", node.command_path());
                            self.send(&ctx, ReplyPayload::text(text)).await?;
                        }
                        return Ok(Outcome::Acknowledged { node_id });
                    };

                    debug!(node_id = %node_id, "Invoking handler");
                    handler.call(Arc::new(ctx)).await;
                    return Ok(Outcome::Invoked { node_id });
                }
            };
        }
    }

    async fn send(&self, ctx: &InvocationContext, payload: ReplyPayload) -> DispatchResult<()> {
        ctx.say(payload).await.map_err(|e| {
            error!("Failed to send reply: {e}");
            DispatchError::from(e)
        })
    }

    /// Runs the interactive handler registered for `node_id`.
    pub async fn dispatch_interactive(
        &self,
        node_id: &str,
        identity: impl Into<Identity>,
        reply: BoxedReply,
    ) -> DispatchResult<InteractiveOutcome> {
        self.dispatch_interactive_with(node_id, identity, reply, Value::Null)
            .await
    }

    /// Like [`dispatch_interactive`](Self::dispatch_interactive), passing the
    /// trigger's platform payload on to the handler.
    pub async fn dispatch_interactive_with(
        &self,
        node_id: &str,
        identity: impl Into<Identity>,
        reply: BoxedReply,
        payload: Value,
    ) -> DispatchResult<InteractiveOutcome> {
        let identity = identity.into();
        if identity.is_empty() {
            return Err(DispatchError::MissingIdentity);
        }

        let span = info_span!("interactive", node_id, identity = %identity);
        async move {
            let Some(handler) = self.tree.interactive().get(node_id) else {
                warn!("No handler for command option '{node_id}'");
                if let Some(text) = &self.options.interactive_miss_reply {
                    reply
                        .send(ReplyPayload::text(text.clone()))
                        .await
                        .inspect_err(|e| error!("Failed to send reply: {e}"))?;
                }
                return Ok(InteractiveOutcome::Miss {
                    node_id: node_id.to_string(),
                });
            };

            handler
                .call(InteractiveContext::new(node_id, identity, reply, payload))
                .await;
            Ok(InteractiveOutcome::Handled {
                node_id: node_id.to_string(),
            })
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("command", &self.tree.name())
            .field("nodes", &self.tree.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Service<Invocation> for Dispatcher {
    type Response = Outcome;
    type Error = DispatchError;
    type Future = BoxFuture<'static, Result<Outcome, DispatchError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, invocation: Invocation) -> Self::Future {
        let this = self.clone();
        async move { this.run(invocation).await }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tower::ServiceExt;

    use super::*;
    use crate::reply::MemoryReply;
    use crate::tree::{CommandSpec, CommandTreeBuilder, OptionSpec};

    async fn ping(ctx: Arc<InvocationContext>) -> String {
        tokio::task::yield_now().await;
        format!("{} click-pong", ctx.identity().mention())
    }

    async fn goodbye(ctx: Arc<InvocationContext>) -> String {
        format!("Goodbye {}!", ctx.arg("name").unwrap_or_default())
    }

    async fn confirm(ctx: Arc<InteractiveContext>) -> String {
        format!("{} confirmed", ctx.identity().mention())
    }

    fn click_tree() -> Arc<CommandTree> {
        click_tree_counting(Arc::new(AtomicUsize::new(0)))
    }

    fn click_tree_counting(root_calls: Arc<AtomicUsize>) -> Arc<CommandTree> {
        let click_root = move |_ctx: Arc<InvocationContext>| {
            let root_calls = Arc::clone(&root_calls);
            async move {
                root_calls.fetch_add(1, Ordering::SeqCst);
                "`/click` command invoked without any commands or options."
            }
        };
        let mut builder = CommandTreeBuilder::group(
            "/click",
            CommandSpec::new()
                .about("This is the Clicker /click command group")
                .version("0.1.0")
                .handler(click_root),
        )
        .unwrap();
        let root = builder.root();
        builder
            .register_command("ping", root, CommandSpec::new().handler(ping))
            .unwrap();
        builder
            .register_command(
                "goodbye",
                root,
                CommandSpec::new()
                    .about("Say goodbye")
                    .option(OptionSpec::value("--name").required())
                    .handler(goodbye),
            )
            .unwrap();
        builder
            .register_group("admin", root, CommandSpec::new())
            .unwrap();
        builder
            .register_interactive("/click.goodbye", confirm)
            .unwrap();
        builder.build().unwrap()
    }

    fn recorder() -> (Arc<MemoryReply>, BoxedReply) {
        let memory = MemoryReply::shared();
        let reply: BoxedReply = memory.clone();
        (memory, reply)
    }

    #[tokio::test]
    async fn test_invokes_leaf_with_resolved_args() {
        let dispatcher = Dispatcher::new(click_tree());
        let (memory, reply) = recorder();

        let outcome = dispatcher
            .dispatch("goodbye --name Alice", "U1", reply)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Invoked {
                node_id: "/click.goodbye".into()
            }
        );
        assert_eq!(memory.sent()[0].text, "Goodbye Alice!");
    }

    #[tokio::test]
    async fn test_usage_error_is_replied_not_raised() {
        let dispatcher = Dispatcher::new(click_tree());
        let (memory, reply) = recorder();

        let outcome = dispatcher.dispatch("goodbye", "U1", reply).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::UsageError {
                node_id: "/click.goodbye".into(),
                message: "Missing option '--name'.".into(),
            }
        );
        let sent = memory.sent();
        assert_eq!(sent.len(), 1);
        let attachments = &sent[0].attachments;
        assert_eq!(attachments.len(), 3);
        assert_eq!(attachments[0].text, "```/click goodbye```");
        assert!(attachments[1].text.contains("Missing option '--name'."));
        assert!(attachments[2].text.contains("Usage: /click goodbye [OPTIONS]"));
    }

    #[tokio::test]
    async fn test_version_never_runs_root_handler() {
        let root_calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(click_tree_counting(Arc::clone(&root_calls)));

        for text in ["--version", "--version ping", "--version goodbye --bogus"] {
            let (memory, reply) = recorder();
            let outcome = dispatcher.dispatch(text, "U1", reply).await.unwrap();
            assert_eq!(
                outcome,
                Outcome::EagerExit {
                    node_id: "/click".into(),
                    kind: EagerKind::Version,
                }
            );
            assert_eq!(memory.sent()[0].text, "```/click, version 0.1.0```");
        }

        assert_eq!(root_calls.load(Ordering::SeqCst), 0);

        let (_memory, reply) = recorder();
        dispatcher.dispatch("", "U1", reply).await.unwrap();
        assert_eq!(root_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_help_on_subcommand() {
        let dispatcher = Dispatcher::new(click_tree());
        let (memory, reply) = recorder();

        let outcome = dispatcher
            .dispatch("goodbye --help", "U1", reply)
            .await
            .unwrap();

        assert_eq!(outcome.node_id(), "/click.goodbye");
        let text = &memory.sent()[0].text;
        assert!(text.starts_with("*Command help:*\n```Usage: /click goodbye [OPTIONS]"));
    }

    #[tokio::test]
    async fn test_group_handler_runs_without_subcommand() {
        let dispatcher = Dispatcher::new(click_tree());
        let (memory, reply) = recorder();

        let outcome = dispatcher.dispatch("", "U1", reply).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Invoked {
                node_id: "/click".into()
            }
        );
        assert_eq!(
            memory.sent()[0].text,
            "`/click` command invoked without any commands or options."
        );
    }

    #[tokio::test]
    async fn test_handlerless_group_fallback() {
        let (memory, reply) = recorder();
        let outcome = Dispatcher::new(click_tree())
            .dispatch("admin", "U1", reply)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Acknowledged {
                node_id: "/click.admin".into()
            }
        );
        assert!(memory.is_empty());

        let (memory, reply) = recorder();
        Dispatcher::new(click_tree())
            .with_options(DispatchOptions::new().fallback_reply("`{command}` needs a subcommand."))
            .dispatch("admin", "U1", reply)
            .await
            .unwrap();
        assert_eq!(memory.sent()[0].text, "`/click admin` needs a subcommand.");
    }

    #[tokio::test]
    async fn test_missing_identity_or_reply() {
        let dispatcher = Dispatcher::new(click_tree());
        let (memory, reply) = recorder();

        let err = dispatcher.dispatch("ping", "  ", reply).await.unwrap_err();
        assert!(matches!(err, DispatchError::MissingIdentity));

        let err = dispatcher
            .run(Invocation::new("ping").identity("U1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::MissingReply));

        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_invocations_are_isolated() {
        let dispatcher = Dispatcher::new(click_tree());

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    let (memory, reply) = recorder();
                    let user = format!("U{i}");
                    dispatcher.dispatch("ping", user.as_str(), reply).await.unwrap();
                    (user, memory.take())
                })
            })
            .collect();

        for task in tasks {
            let (user, sent) = task.await.unwrap();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].text, format!("<@{user}> click-pong"));
        }
    }

    #[tokio::test]
    async fn test_dispatch_is_repeatable() {
        let dispatcher = Dispatcher::new(click_tree());

        let (first_memory, reply) = recorder();
        let first = dispatcher.dispatch("goodbye", "U1", reply).await.unwrap();
        let (second_memory, reply) = recorder();
        let second = dispatcher.dispatch("goodbye", "U1", reply).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first_memory.sent(), second_memory.sent());
    }

    #[tokio::test]
    async fn test_tower_service() {
        let (memory, reply) = recorder();
        let outcome = Dispatcher::new(click_tree())
            .oneshot(Invocation::new("ping").identity("U9").reply(reply))
            .await
            .unwrap();

        assert_eq!(outcome.node_id(), "/click.ping");
        assert_eq!(memory.sent()[0].text, "<@U9> click-pong");
    }

    #[tokio::test]
    async fn test_interactive_hit_and_miss() {
        let dispatcher = Dispatcher::new(click_tree())
            .with_options(DispatchOptions::new().interactive_miss_reply("Nothing to do."));

        let (memory, reply) = recorder();
        let outcome = dispatcher
            .dispatch_interactive("/click.goodbye", "U3", reply)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            InteractiveOutcome::Handled {
                node_id: "/click.goodbye".into()
            }
        );
        assert_eq!(memory.sent()[0].text, "<@U3> confirmed");

        let (memory, reply) = recorder();
        let outcome = dispatcher
            .dispatch_interactive("/click.ping", "U3", reply)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            InteractiveOutcome::Miss {
                node_id: "/click.ping".into()
            }
        );
        assert_eq!(memory.sent()[0].text, "Nothing to do.");
    }

    #[tokio::test]
    async fn test_interactive_miss_is_silent_by_default() {
        let (memory, reply) = recorder();
        let outcome = Dispatcher::new(click_tree())
            .dispatch_interactive("/click.nothing", "U3", reply)
            .await
            .unwrap();
        assert!(matches!(outcome, InteractiveOutcome::Miss { .. }));
        assert!(memory.is_empty());
    }
}
