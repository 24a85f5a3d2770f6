//! Argument resolution for a single tree node.
//!
//! [`resolve`] looks at the tokens that follow a node's name and decides what
//! happens at that level of the walk:
//!
//! 1. Eager options (`--help`, `--version`) are searched first. If one is
//!    present everything else at this level is ignored, including tokens that
//!    would otherwise be errors.
//! 2. Tokens are consumed left to right. `--` ends option parsing,
//!    `--long=value` is accepted for value options, and positionals are
//!    filled in declaration order.
//! 3. On a group, a bare token naming a child selects it, even when a
//!    positional slot is still free. Other bare tokens fill positionals, and
//!    once those run out they are reported as unknown commands.
//! 4. Absent options take their default; absent flags resolve to `false`;
//!    missing required options and arguments are usage errors.

use std::sync::Arc;

use crate::context::ResolvedArgs;
use crate::error::UsageError;
use crate::tree::{ArgValue, CommandNode, EagerKind};

/// What the resolver decided for one node.
#[derive(Debug)]
pub enum Resolution<'a> {
    /// An eager option was found; nothing below this node runs.
    Eager(EagerKind),
    /// A child was selected. The walk continues with `child` and the tokens
    /// after the first `consumed` ones.
    Descend {
        /// Arguments resolved for this node.
        args: ResolvedArgs,
        /// The selected child.
        child: &'a Arc<CommandNode>,
        /// Number of tokens used by this node, child name included.
        consumed: usize,
    },
    /// The walk ends at this node.
    Complete(ResolvedArgs),
}

/// Resolves `tokens` against `node`.
pub fn resolve<'a>(
    node: &'a CommandNode,
    tokens: &[String],
) -> Result<Resolution<'a>, UsageError> {
    if let Some(kind) = find_eager(node, tokens) {
        return Ok(Resolution::Eager(kind));
    }

    let usage = |message: String| UsageError::new(node.node_id(), message, tokens);

    let mut args = ResolvedArgs::new();
    let mut extras: Vec<&str> = Vec::new();
    let mut filled = 0;
    let mut options_done = false;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;

        if !options_done && token == "--" {
            options_done = true;
            continue;
        }

        if !options_done && is_option_token(token) {
            let (decl, inline) = split_inline(token);
            let option = node
                .find_option(decl)
                .ok_or_else(|| usage(format!("No such option: {decl}")))?;

            if option.takes_value() {
                let value = match inline {
                    Some(value) => value.to_string(),
                    None => {
                        let value = tokens
                            .get(i)
                            .ok_or_else(|| usage(format!("Option '{decl}' requires an argument.")))?;
                        i += 1;
                        value.clone()
                    }
                };
                args.insert(option.name().to_string(), ArgValue::Text(value));
            } else {
                if inline.is_some() {
                    return Err(usage(format!("Option '{decl}' does not take a value.")));
                }
                args.insert(option.name().to_string(), ArgValue::Flag(true));
            }
            continue;
        }

        if let Some(child) = node.child(token) {
            finalize(node, &mut args, tokens)?;
            return Ok(Resolution::Descend {
                args,
                child,
                consumed: i,
            });
        }

        if let Some(positional) = node.positionals().get(filled) {
            args.insert(positional.name().to_string(), ArgValue::Text(token.clone()));
            filled += 1;
            continue;
        }

        if node.is_group() {
            return Err(usage(format!("No such command '{token}'.")));
        }

        extras.push(token);
    }

    match extras.as_slice() {
        [] => {}
        [one] => return Err(usage(format!("Got unexpected extra argument ({one})"))),
        many => {
            return Err(usage(format!(
                "Got unexpected extra arguments ({})",
                many.join(" ")
            )));
        }
    }

    finalize(node, &mut args, tokens)?;
    Ok(Resolution::Complete(args))
}

/// Looks for an eager option among the tokens that belong to `node`.
///
/// Follows the same slot rules as the main pass so that a `--help` meant for
/// a child is not picked up by its parent.
fn find_eager(node: &CommandNode, tokens: &[String]) -> Option<EagerKind> {
    let mut filled = 0;
    let mut iter = tokens.iter();
    while let Some(token) = iter.next() {
        if token == "--" {
            return None;
        }
        if is_option_token(token) {
            let (decl, inline) = split_inline(token);
            match node.find_option(decl) {
                Some(option) if inline.is_none() && option.eager().is_some() => {
                    return option.eager();
                }
                Some(option) if inline.is_none() && option.takes_value() => {
                    iter.next();
                }
                _ => {}
            }
            continue;
        }
        if node.child(token).is_some() {
            return None;
        }
        if filled < node.positionals().len() {
            filled += 1;
            continue;
        }
        if node.is_group() {
            return None;
        }
    }
    None
}

/// Applies defaults and checks required parameters.
fn finalize(node: &CommandNode, args: &mut ResolvedArgs, tokens: &[String]) -> Result<(), UsageError> {
    for option in node.options() {
        if option.eager().is_some() || args.contains_key(option.name()) {
            continue;
        }
        let value = if let Some(default) = option.default_text() {
            ArgValue::Text(default.to_string())
        } else if option.is_required() {
            return Err(UsageError::new(
                node.node_id(),
                format!("Missing option {}.", option.error_hint()),
                tokens,
            ));
        } else if option.takes_value() {
            continue;
        } else {
            ArgValue::Flag(false)
        };
        args.insert(option.name().to_string(), value);
    }

    for positional in node.positionals() {
        if args.contains_key(positional.name()) {
            continue;
        }
        if let Some(default) = positional.default_text() {
            args.insert(
                positional.name().to_string(),
                ArgValue::Text(default.to_string()),
            );
        } else if positional.is_required() {
            return Err(UsageError::new(
                node.node_id(),
                format!("Missing argument '{}'.", positional.metavar()),
                tokens,
            ));
        }
    }
    Ok(())
}

/// Returns `true` for tokens that look like options. Negative numbers and a
/// lone `-` are treated as values.
fn is_option_token(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && token.parse::<f64>().is_err()
}

/// Splits `--long=value` into its declaration and inline value.
fn split_inline(token: &str) -> (&str, Option<&str>) {
    if token.starts_with("--") {
        if let Some((decl, value)) = token.split_once('=') {
            return (decl, Some(value));
        }
    }
    (token, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InvocationContext;
    use crate::tree::{CommandSpec, CommandTree, CommandTreeBuilder, OptionSpec, PositionalSpec};

    async fn noop(_ctx: Arc<InvocationContext>) {}

    fn tree() -> Arc<CommandTree> {
        let mut builder = CommandTreeBuilder::group(
            "/click",
            CommandSpec::new()
                .version("0.1.0")
                .option(OptionSpec::flag("--debug")),
        )
        .unwrap();
        let root = builder.root();
        builder
            .register_command("ping", root, CommandSpec::new().handler(noop))
            .unwrap();
        builder
            .register_command(
                "goodbye",
                root,
                CommandSpec::new()
                    .option(OptionSpec::value("--name").short("-n").required())
                    .option(OptionSpec::value("--greeting").default_value("Goodbye"))
                    .option(OptionSpec::flag("--loud"))
                    .handler(noop),
            )
            .unwrap();
        builder
            .register_command(
                "echo",
                root,
                CommandSpec::new()
                    .argument(PositionalSpec::required("word"))
                    .argument(PositionalSpec::optional("times").default_value("1"))
                    .handler(noop),
            )
            .unwrap();
        builder.build().unwrap()
    }

    fn tokens(text: &str) -> Vec<String> {
        crate::split::tokenize(text)
    }

    fn complete(node: &CommandNode, text: &str) -> ResolvedArgs {
        match resolve(node, &tokens(text)).unwrap() {
            Resolution::Complete(args) => args,
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    fn error(node: &CommandNode, text: &str) -> String {
        resolve(node, &tokens(text)).unwrap_err().message
    }

    #[test]
    fn test_descend_into_child() {
        let tree = tree();
        match resolve(tree.root(), &tokens("--debug ping extra")).unwrap() {
            Resolution::Descend {
                args,
                child,
                consumed,
            } => {
                assert_eq!(child.node_id(), "/click.ping");
                assert_eq!(consumed, 2);
                assert_eq!(args.get("debug"), Some(&ArgValue::Flag(true)));
            }
            other => panic!("expected Descend, got {other:?}"),
        }
    }

    #[test]
    fn test_option_forms() {
        let tree = tree();
        let goodbye = tree.get("/click.goodbye").unwrap();

        let args = complete(goodbye, "--name Alice");
        assert_eq!(args.get("name"), Some(&ArgValue::Text("Alice".into())));
        assert_eq!(args.get("greeting"), Some(&ArgValue::Text("Goodbye".into())));
        assert_eq!(args.get("loud"), Some(&ArgValue::Flag(false)));

        let args = complete(goodbye, "--name=Bob -n Carol --loud");
        assert_eq!(args.get("name"), Some(&ArgValue::Text("Carol".into())));
        assert_eq!(args.get("loud"), Some(&ArgValue::Flag(true)));

        let args = complete(goodbye, "--name -1");
        assert_eq!(args.get("name"), Some(&ArgValue::Text("-1".into())));
    }

    #[test]
    fn test_option_errors() {
        let tree = tree();
        let goodbye = tree.get("/click.goodbye").unwrap();

        assert_eq!(error(goodbye, ""), "Missing option '--name' / '-n'.");
        assert_eq!(error(goodbye, "--name"), "Option '--name' requires an argument.");
        assert_eq!(error(goodbye, "--nam x"), "No such option: --nam");
        assert_eq!(
            error(goodbye, "--name x --loud=yes"),
            "Option '--loud' does not take a value."
        );
        assert_eq!(
            error(goodbye, "--name x Alice"),
            "Got unexpected extra argument (Alice)"
        );
        assert_eq!(
            error(goodbye, "--name x a b"),
            "Got unexpected extra arguments (a b)"
        );

        let err = resolve(goodbye, &tokens("--bogus")).unwrap_err();
        assert_eq!(err.node_id, "/click.goodbye");
        assert_eq!(err.tokens, vec!["--bogus"]);
    }

    #[test]
    fn test_positionals() {
        let tree = tree();
        let echo = tree.get("/click.echo").unwrap();

        let args = complete(echo, "hello");
        assert_eq!(args.get("word"), Some(&ArgValue::Text("hello".into())));
        assert_eq!(args.get("times"), Some(&ArgValue::Text("1".into())));

        let args = complete(echo, "-- --literal 3");
        assert_eq!(args.get("word"), Some(&ArgValue::Text("--literal".into())));
        assert_eq!(args.get("times"), Some(&ArgValue::Text("3".into())));

        assert_eq!(error(echo, ""), "Missing argument 'WORD'.");
    }

    #[test]
    fn test_unknown_subcommand() {
        let tree = tree();
        assert_eq!(error(tree.root(), "pong"), "No such command 'pong'.");
    }

    #[test]
    fn test_child_name_beats_free_positional() {
        let mut builder = CommandTreeBuilder::group(
            "/click",
            CommandSpec::new().argument(PositionalSpec::optional("target")),
        )
        .unwrap();
        let root = builder.root();
        builder
            .register_command("ping", root, CommandSpec::new().handler(noop))
            .unwrap();
        let tree = builder.build().unwrap();

        match resolve(tree.root(), &tokens("ping")).unwrap() {
            Resolution::Descend { child, consumed, .. } => {
                assert_eq!(child.node_id(), "/click.ping");
                assert_eq!(consumed, 1);
            }
            other => panic!("expected Descend, got {other:?}"),
        }

        match resolve(tree.root(), &tokens("bob ping")).unwrap() {
            Resolution::Descend { args, child, .. } => {
                assert_eq!(child.node_id(), "/click.ping");
                assert_eq!(args.get("target"), Some(&ArgValue::Text("bob".into())));
            }
            other => panic!("expected Descend, got {other:?}"),
        }

        let args = complete(tree.root(), "bob");
        assert_eq!(args.get("target"), Some(&ArgValue::Text("bob".into())));
        assert_eq!(error(tree.root(), "bob pong"), "No such command 'pong'.");

        // `--help` after the child name still belongs to the child.
        assert!(matches!(
            resolve(tree.root(), &tokens("ping --help")).unwrap(),
            Resolution::Descend { .. }
        ));
    }

    #[test]
    fn test_group_without_subcommand_completes() {
        let tree = tree();
        let args = complete(tree.root(), "");
        assert_eq!(args.get("debug"), Some(&ArgValue::Flag(false)));
    }

    #[test]
    fn test_eager_wins_over_everything() {
        let tree = tree();
        let root = tree.root();
        for text in ["--version", "--version ping", "--bogus --version", "--debug --help"] {
            assert!(
                matches!(
                    resolve(root, &tokens(text)).unwrap(),
                    Resolution::Eager(_)
                ),
                "{text}"
            );
        }
        assert!(matches!(
            resolve(root, &tokens("--help")).unwrap(),
            Resolution::Eager(EagerKind::Help)
        ));
    }

    #[test]
    fn test_eager_scoped_to_node() {
        let tree = tree();
        // `--help` after the child name belongs to the child.
        assert!(matches!(
            resolve(tree.root(), &tokens("ping --help")).unwrap(),
            Resolution::Descend { .. }
        ));
        // Commands without a version do not accept `--version`.
        let ping = tree.get("/click.ping").unwrap();
        assert_eq!(error(ping, "--version"), "No such option: --version");
        // A value option swallows what looks like an eager flag.
        let goodbye = tree.get("/click.goodbye").unwrap();
        let args = complete(goodbye, "--name --help");
        assert_eq!(args.get("name"), Some(&ArgValue::Text("--help".into())));
    }
}
