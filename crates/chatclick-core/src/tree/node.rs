//! The frozen command tree.
//!
//! A [`CommandTree`] is produced once by
//! [`CommandTreeBuilder::build`](super::CommandTreeBuilder::build) and is
//! never mutated afterwards. It is shared between every in-flight invocation
//! behind an `Arc`, so reads need no locking.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use super::option::{OptionSpec, PositionalSpec};
use crate::handler::BoxedHandler;
use crate::interactive::InteractiveRegistry;

/// Whether a node groups subcommands or runs a handler.
pub enum NodeKind {
    /// A node with children and an optional fallback handler that runs when
    /// no child is selected.
    Group {
        /// Children keyed by name. Ordered so help output is stable.
        children: BTreeMap<String, Arc<CommandNode>>,
        /// Runs when the group is invoked without a subcommand.
        handler: Option<BoxedHandler>,
    },
    /// A command with a handler and no children.
    Leaf {
        /// The command's handler.
        handler: BoxedHandler,
    },
}

/// One addressable command or group.
pub struct CommandNode {
    pub(crate) name: String,
    pub(crate) node_id: String,
    pub(crate) command_path: String,
    pub(crate) about: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) version_prog_name: Option<String>,
    pub(crate) version_message: Option<String>,
    pub(crate) options: Vec<OptionSpec>,
    pub(crate) positionals: Vec<PositionalSpec>,
    pub(crate) kind: NodeKind,
}

impl CommandNode {
    /// The token matched at this level of the tree.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted path from the root, e.g. `/click.goodbye`.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Space-separated names from the root, e.g. `/click goodbye`.
    pub fn command_path(&self) -> &str {
        &self.command_path
    }

    /// The description shown in help output.
    pub fn about(&self) -> Option<&str> {
        self.about.as_deref()
    }

    /// First line of the description, used in the parent's command list.
    pub fn short_help(&self) -> &str {
        self.about
            .as_deref()
            .and_then(|about| about.lines().map(str::trim).find(|l| !l.is_empty()))
            .unwrap_or("")
    }

    /// The version reported by `--version`, if the node exposes one.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Program name override for the `--version` reply.
    pub fn version_prog_name(&self) -> Option<&str> {
        self.version_prog_name.as_deref()
    }

    /// Template override for the `--version` reply.
    pub fn version_message(&self) -> Option<&str> {
        self.version_message.as_deref()
    }

    /// All options, including the automatic `--help` and `--version`.
    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    /// Positional arguments in order.
    pub fn positionals(&self) -> &[PositionalSpec] {
        &self.positionals
    }

    /// The node's kind.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns `true` for group nodes.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group { .. })
    }

    /// Looks up an option by any of its declarations.
    pub fn find_option(&self, decl: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|opt| opt.matches(decl))
    }

    /// Looks up a direct child by name. Always `None` for leaves.
    pub fn child(&self, name: &str) -> Option<&Arc<CommandNode>> {
        match &self.kind {
            NodeKind::Group { children, .. } => children.get(name),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Iterates over direct children in name order.
    pub fn children(&self) -> impl Iterator<Item = &Arc<CommandNode>> {
        let children = match &self.kind {
            NodeKind::Group { children, .. } => Some(children.values()),
            NodeKind::Leaf { .. } => None,
        };
        children.into_iter().flatten()
    }

    /// The handler to run when this node is the end of the walk.
    pub fn handler(&self) -> Option<&BoxedHandler> {
        match &self.kind {
            NodeKind::Group { handler, .. } => handler.as_ref(),
            NodeKind::Leaf { handler } => Some(handler),
        }
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("node_id", &self.node_id)
            .field("is_group", &self.is_group())
            .field("options", &self.options.len())
            .field("positionals", &self.positionals.len())
            .field(
                "children",
                &self.children().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// An immutable command tree plus its interactive handlers.
pub struct CommandTree {
    pub(crate) root: Arc<CommandNode>,
    pub(crate) index: HashMap<String, Arc<CommandNode>>,
    pub(crate) interactive: InteractiveRegistry,
}

impl CommandTree {
    /// The root node; its name is the command users type, e.g. `/click`.
    pub fn root(&self) -> &Arc<CommandNode> {
        &self.root
    }

    /// The root node's name.
    pub fn name(&self) -> &str {
        self.root.name()
    }

    /// Looks up any node by its `node_id`.
    pub fn get(&self, node_id: &str) -> Option<&Arc<CommandNode>> {
        self.index.get(node_id)
    }

    /// Returns the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// A tree always has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates over every `node_id` in the tree.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// The interactive handlers registered for this tree.
    pub fn interactive(&self) -> &InteractiveRegistry {
        &self.interactive
    }
}

impl fmt::Debug for CommandTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTree")
            .field("root", &self.root)
            .field("nodes", &self.index.len())
            .field("interactive", &self.interactive.len())
            .finish()
    }
}
