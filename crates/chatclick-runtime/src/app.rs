//! Routing of slash commands to their trees.
//!
//! A chat platform delivers every slash command to the same endpoint with the
//! command name (`/click`), the text after it and the caller's id.
//! [`CommandApp`] keeps one [`Dispatcher`] per registered tree and forwards
//! each request to the right one.
//!
//! ```rust,ignore
//! let config = ConfigLoader::new().load()?;
//! let app = CommandApp::from_config(&config)
//!     .command(click_tree)?
//!     .command(ping_tree)?;
//!
//! let request: SlashCommand = serde_json::from_value(form)?;
//! app.handle(request, reply).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chatclick_core::{
    BoxedReply, CommandTree, DispatchOptions, Dispatcher, Identity, InteractiveOutcome, Outcome,
    Translator,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ChatclickConfig;
use crate::error::{RuntimeError, RuntimeResult};

/// A slash-command request as delivered by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCommand {
    /// The command name including the slash, e.g. `/click`.
    pub command: String,
    /// Everything the user typed after the command name.
    #[serde(default)]
    pub text: String,
    /// The caller.
    pub user_id: String,
}

impl SlashCommand {
    /// Creates a request.
    pub fn new(
        command: impl Into<String>,
        text: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            text: text.into(),
            user_id: user_id.into(),
        }
    }

    /// Splits a full line such as `/click goodbye --name Alice` into command
    /// and text.
    pub fn parse_line(line: &str, user_id: impl Into<String>) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (command, text) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(command, text)| (command, text.trim_start()));
        Some(Self::new(command, text, user_id))
    }
}

/// Holds every registered command tree and routes requests between them.
#[derive(Debug, Clone, Default)]
pub struct CommandApp {
    dispatchers: HashMap<String, Dispatcher>,
    options: DispatchOptions,
    translator: Translator,
}

impl CommandApp {
    /// Creates an app with default dispatch options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an app whose dispatchers follow `config`.
    pub fn from_config(config: &ChatclickConfig) -> Self {
        Self {
            dispatchers: HashMap::new(),
            options: config.dispatch_options(),
            translator: config.translator(),
        }
    }

    /// Registers a tree (builder pattern).
    pub fn command(mut self, tree: Arc<CommandTree>) -> RuntimeResult<Self> {
        self.add_command(tree)?;
        Ok(self)
    }

    /// Registers a tree under its root name.
    pub fn add_command(&mut self, tree: Arc<CommandTree>) -> RuntimeResult<()> {
        let name = tree.name().to_string();
        if self.dispatchers.contains_key(&name) {
            return Err(RuntimeError::DuplicateCommand(name));
        }
        let dispatcher = Dispatcher::new(tree)
            .with_options(self.options.clone())
            .with_translator(self.translator.clone());
        info!(command = %name, "Registered command");
        self.dispatchers.insert(name, dispatcher);
        Ok(())
    }

    /// The dispatcher for a slash command.
    pub fn dispatcher(&self, command: &str) -> Option<&Dispatcher> {
        self.dispatchers.get(command)
    }

    /// Names of all registered commands, sorted.
    pub fn commands(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.dispatchers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Routes a slash command to its tree.
    pub async fn handle(&self, request: SlashCommand, reply: BoxedReply) -> RuntimeResult<Outcome> {
        let dispatcher = self.dispatchers.get(&request.command).ok_or_else(|| {
            warn!(command = %request.command, "Unknown command");
            RuntimeError::UnknownCommand(request.command.clone())
        })?;
        debug!(command = %request.command, text = %request.text, "Routing slash command");
        Ok(dispatcher
            .dispatch(request.text, request.user_id, reply)
            .await?)
    }

    /// Routes an interactive trigger by the root segment of `node_id`.
    pub async fn handle_interactive(
        &self,
        node_id: &str,
        identity: impl Into<Identity>,
        reply: BoxedReply,
        payload: Value,
    ) -> RuntimeResult<InteractiveOutcome> {
        let root = node_id.split('.').next().unwrap_or(node_id);
        let dispatcher = self
            .dispatchers
            .get(root)
            .ok_or_else(|| RuntimeError::UnknownCommand(root.to_string()))?;
        Ok(dispatcher
            .dispatch_interactive_with(node_id, identity, reply, payload)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use chatclick_core::prelude::*;

    use super::*;

    async fn ping(ctx: Arc<InvocationContext>) -> String {
        format!("Hiya {}.  Ping back at you :eyes:", ctx.identity().mention())
    }

    async fn click_ping(_ctx: Arc<InvocationContext>) -> &'static str {
        ":eyes: click-pong"
    }

    async fn pressed(ctx: Arc<InteractiveContext>) -> String {
        format!("pressed {}", ctx.payload()["value"].as_str().unwrap_or("?"))
    }

    fn trees() -> (Arc<CommandTree>, Arc<CommandTree>) {
        let mut click = CommandTreeBuilder::group("/click", CommandSpec::new()).unwrap();
        let root = click.root();
        click
            .register_command("ping", root, CommandSpec::new().handler(click_ping))
            .unwrap();
        click.register_interactive("/click.ping", pressed).unwrap();
        let ping_tree =
            CommandTreeBuilder::command("/ping", CommandSpec::new().handler(ping)).unwrap();
        (click.build().unwrap(), ping_tree.build().unwrap())
    }

    fn app(config: &ChatclickConfig) -> CommandApp {
        let (click, ping) = trees();
        CommandApp::from_config(config)
            .command(click)
            .unwrap()
            .command(ping)
            .unwrap()
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            SlashCommand::parse_line("  /click goodbye  --name Alice ", "U1"),
            Some(SlashCommand::new("/click", "goodbye  --name Alice", "U1"))
        );
        assert_eq!(
            SlashCommand::parse_line("/ping", "U1"),
            Some(SlashCommand::new("/ping", "", "U1"))
        );
        assert_eq!(SlashCommand::parse_line("   ", "U1"), None);
    }

    #[test]
    fn test_slash_command_from_form_fields() {
        let request: SlashCommand = serde_json::from_value(serde_json::json!({
            "command": "/click",
            "user_id": "U1",
        }))
        .unwrap();
        assert_eq!(request.text, "");
    }

    #[tokio::test]
    async fn test_routes_by_command() {
        let app = app(&ChatclickConfig::default());
        assert_eq!(app.commands(), vec!["/click", "/ping"]);

        let memory = MemoryReply::shared();
        let outcome = app
            .handle(SlashCommand::new("/ping", "", "U5"), memory.clone())
            .await
            .unwrap();
        assert_eq!(outcome.node_id(), "/ping");
        assert_eq!(
            memory.take()[0].text,
            "Hiya <@U5>.  Ping back at you :eyes:"
        );

        app.handle(SlashCommand::new("/click", "ping", "U5"), memory.clone())
            .await
            .unwrap();
        assert_eq!(memory.take()[0].text, ":eyes: click-pong");
    }

    #[tokio::test]
    async fn test_unknown_and_duplicate_commands() {
        let app = app(&ChatclickConfig::default());
        let err = app
            .handle(SlashCommand::new("/nope", "", "U5"), MemoryReply::shared())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownCommand(name) if name == "/nope"));

        let (click, _) = trees();
        let err = app.command(click).unwrap_err();
        assert!(matches!(err, RuntimeError::DuplicateCommand(_)));
    }

    #[tokio::test]
    async fn test_config_reaches_dispatcher() {
        let mut config = ChatclickConfig::default();
        config.dispatch.fallback_reply = Some("`{command}` needs more".into());
        config.reply.error_color = "#123456".into();
        let app = app(&config);

        let memory = MemoryReply::shared();
        app.handle(SlashCommand::new("/click", "", "U1"), memory.clone())
            .await
            .unwrap();
        assert_eq!(memory.take()[0].text, "`/click` needs more");

        app.handle(SlashCommand::new("/click", "pong", "U1"), memory.clone())
            .await
            .unwrap();
        let sent = memory.take();
        assert_eq!(sent[0].attachments[0].color.as_deref(), Some("#123456"));
        assert_eq!(sent[0].attachments[1].text, "```No such command 'pong'.```");
    }

    #[tokio::test]
    async fn test_interactive_routing() {
        let app = app(&ChatclickConfig::default());
        let memory = MemoryReply::shared();

        let outcome = app
            .handle_interactive(
                "/click.ping",
                "U2",
                memory.clone(),
                serde_json::json!({ "value": "yes" }),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, InteractiveOutcome::Handled { .. }));
        assert_eq!(memory.take()[0].text, "pressed yes");

        let err = app
            .handle_interactive("/other.x", "U2", memory.clone(), Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownCommand(_)));
    }
}
