//! Clicker Demo
//!
//! Registers the `/click` group and the `/ping` command, then reads slash
//! commands from stdin and prints every reply as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package clicker -- --user U123
//! /click ping
//! /click goodbye --name Alice
//! /click --version
//! /ping --help
//! !/click.goodbye {"action": "confirm"}
//! ```
//!
//! Lines starting with `!` simulate a button press: the first word is the
//! `node_id`, the rest is an optional JSON payload.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chatclick::core::{CommandTree, ReplyResult};
use chatclick::prelude::*;
use chatclick::runtime::logging;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(version, about = "Drive chatclick commands from the terminal")]
struct Cli {
    /// Configuration file (defaults to chatclick.toml in the usual places).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile.
    #[arg(short, long)]
    profile: Option<String>,

    /// Caller id used for every command.
    #[arg(short, long, default_value = "U0CLICKER")]
    user: String,
}

// ============================================================================
// Reply capability
// ============================================================================

/// Prints payloads to stdout as pretty JSON.
struct ConsoleReply;

#[async_trait]
impl Reply for ConsoleReply {
    async fn send(&self, payload: ReplyPayload) -> ReplyResult<()> {
        println!("{}", serde_json::to_string_pretty(&payload)?);
        Ok(())
    }
}

// ============================================================================
// /click
// ============================================================================

async fn click(_ctx: Arc<InvocationContext>) -> &'static str {
    "`/click` command invoked without any commands or options."
}

async fn click_ping(_ctx: Arc<InvocationContext>) -> &'static str {
    ":eyes: click-pong"
}

async fn click_goodbye(ctx: Arc<InvocationContext>) -> ReplyPayload {
    let name = ctx.arg("name").unwrap_or("stranger");
    let mut text = format!("Goodbye {name}!");
    if ctx.flag("wave") {
        text.push_str(" :wave:");
    }
    ReplyPayload::text(text).attachment(
        Attachment::new("Press *Confirm* to really leave.", "Confirm goodbye")
            .pretext(format!("Requested by {}", ctx.identity().mention())),
    )
}

async fn confirm_goodbye(ctx: Arc<InteractiveContext>) -> String {
    let action = ctx.payload()["action"].as_str().unwrap_or("confirm");
    format!("{} pressed *{action}* on goodbye.", ctx.identity().mention())
}

fn click_tree() -> Result<Arc<CommandTree>> {
    let mut builder = CommandTreeBuilder::group(
        "/click",
        CommandSpec::new()
            .about("This is the Clicker /click command group")
            .version("0.1.0")
            .handler(click),
    )?;
    let root = builder.root();

    builder.register_command(
        "ping",
        root,
        CommandSpec::new().about("Click ping").handler(click_ping),
    )?;
    builder.register_command(
        "goodbye",
        root,
        CommandSpec::new()
            .about("Say goodbye to someone")
            .option(
                OptionSpec::value("--name")
                    .short("-n")
                    .required()
                    .help("Who to say goodbye to"),
            )
            .option(OptionSpec::flag("--wave").help("Add a wave"))
            .handler(click_goodbye),
    )?;
    builder.register_interactive("/click.goodbye", confirm_goodbye)?;

    Ok(builder.build()?)
}

// ============================================================================
// /ping
// ============================================================================

async fn ping(ctx: Arc<InvocationContext>) -> String {
    format!("Hiya {}.  Ping back at you :eyes:", ctx.identity().mention())
}

fn ping_tree() -> Result<Arc<CommandTree>> {
    let builder = CommandTreeBuilder::command(
        "/ping",
        CommandSpec::new()
            .about("Ping the bot")
            .version("0.1.0")
            .handler(ping),
    )?;
    Ok(builder.build()?)
}

// ============================================================================
// Main
// ============================================================================

async fn handle_line(app: &CommandApp, user: &str, line: &str) -> Result<()> {
    let reply: BoxedReply = Arc::new(ConsoleReply);

    if let Some(trigger) = line.strip_prefix('!') {
        let (node_id, payload) = trigger
            .trim()
            .split_once(char::is_whitespace)
            .unwrap_or((trigger.trim(), ""));
        let payload = if payload.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(payload).context("interactive payload is not valid JSON")?
        };
        let outcome = app
            .handle_interactive(node_id, user, reply, payload)
            .await?;
        info!(?outcome, "Interactive trigger handled");
        return Ok(());
    }

    let Some(request) = SlashCommand::parse_line(line, user) else {
        return Ok(());
    };
    let outcome = app.handle(request, reply).await?;
    info!(?outcome, "Command handled");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(profile) = &cli.profile {
        loader = loader.profile(profile);
    }
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    let config = loader.load().context("failed to load configuration")?;
    logging::init_from_config(&config.logging);

    let app = CommandApp::from_config(&config)
        .command(click_tree()?)?
        .command(ping_tree()?)?;
    info!(commands = ?app.commands(), user = %cli.user, "Clicker ready, reading commands from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Err(e) = handle_line(&app, &cli.user, &line).await {
            error!("{e:#}");
        }
    }

    Ok(())
}
