//! Registration API for command trees.
//!
//! Trees are built once at boot with a [`CommandTreeBuilder`] and frozen with
//! [`build`](CommandTreeBuilder::build):
//!
//! ```rust,ignore
//! let mut builder = CommandTreeBuilder::group(
//!     "/click",
//!     CommandSpec::new()
//!         .about("This is the Clicker /click command group")
//!         .version("0.1.0")
//!         .handler(click_root),
//! )?;
//! let root = builder.root();
//! builder.register_command("ping", root, CommandSpec::new().about("Click ping").handler(ping))?;
//! builder.register_command(
//!     "goodbye",
//!     root,
//!     CommandSpec::new()
//!         .option(OptionSpec::value("--name").required())
//!         .handler(goodbye),
//! )?;
//! let tree = builder.build()?;
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::node::{CommandNode, CommandTree, NodeKind};
use super::option::{OptionSpec, PositionalSpec};
use crate::error::{RegistrationError, RegistrationResult};
use crate::handler::{BoxedHandler, Handler, into_handler};
use crate::interactive::{InteractiveHandler, InteractiveRegistry};

/// Everything about a node except its name and place in the tree.
#[derive(Default)]
pub struct CommandSpec {
    about: Option<String>,
    version: Option<String>,
    version_prog_name: Option<String>,
    version_message: Option<String>,
    options: Vec<OptionSpec>,
    positionals: Vec<PositionalSpec>,
    handler: Option<BoxedHandler>,
}

impl CommandSpec {
    /// Creates an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the description shown in help output.
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Exposes an eager `--version` option reporting `version`.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Overrides the program name in the `--version` reply. Defaults to the
    /// root command's name.
    pub fn version_prog_name(mut self, prog_name: impl Into<String>) -> Self {
        self.version_prog_name = Some(prog_name.into());
        self
    }

    /// Overrides the `--version` reply template. `{prog}` and `{version}` are
    /// substituted; the default is `{prog}, version {version}`.
    pub fn version_message(mut self, message: impl Into<String>) -> Self {
        self.version_message = Some(message.into());
        self
    }

    /// Adds a named option.
    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    /// Adds a positional argument.
    pub fn argument(mut self, positional: PositionalSpec) -> Self {
        self.positionals.push(positional);
        self
    }

    /// Sets the handler. Required for commands, optional for groups.
    pub fn handler<H: Handler>(mut self, handler: H) -> Self {
        self.handler = Some(into_handler(handler));
        self
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("about", &self.about)
            .field("version", &self.version)
            .field("options", &self.options)
            .field("positionals", &self.positionals)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// Handle to a node registered in a [`CommandTreeBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

struct PendingNode {
    name: String,
    node_id: String,
    command_path: String,
    is_group: bool,
    spec: CommandSpec,
    children: Vec<usize>,
}

/// Builds an immutable [`CommandTree`].
///
/// Every method that can fail does so with a [`RegistrationError`]; these are
/// boot-time errors and should abort startup.
pub struct CommandTreeBuilder {
    nodes: Vec<PendingNode>,
    ids: HashSet<String>,
    interactive: InteractiveRegistry,
    interactive_targets: Vec<String>,
}

impl CommandTreeBuilder {
    /// Starts a tree whose root is a group, e.g. `/click`.
    pub fn group(name: impl Into<String>, spec: CommandSpec) -> RegistrationResult<Self> {
        Self::with_root(name.into(), spec, true)
    }

    /// Starts a tree whose root is a single command, e.g. `/ping`.
    pub fn command(name: impl Into<String>, spec: CommandSpec) -> RegistrationResult<Self> {
        Self::with_root(name.into(), spec, false)
    }

    fn with_root(name: String, spec: CommandSpec, is_group: bool) -> RegistrationResult<Self> {
        let mut builder = Self {
            nodes: Vec::new(),
            ids: HashSet::new(),
            interactive: InteractiveRegistry::default(),
            interactive_targets: Vec::new(),
        };
        builder.push(None, name, spec, is_group)?;
        Ok(builder)
    }

    /// The root node.
    pub fn root(&self) -> NodeHandle {
        NodeHandle(0)
    }

    /// The `node_id` assigned to a registered node.
    pub fn node_id(&self, handle: NodeHandle) -> Option<&str> {
        self.nodes.get(handle.0).map(|n| n.node_id.as_str())
    }

    /// Registers a group below `parent`.
    pub fn register_group(
        &mut self,
        name: impl Into<String>,
        parent: NodeHandle,
        spec: CommandSpec,
    ) -> RegistrationResult<NodeHandle> {
        self.push(Some(parent), name.into(), spec, true)
    }

    /// Registers a command below `parent`. `spec` must carry a handler.
    pub fn register_command(
        &mut self,
        name: impl Into<String>,
        parent: NodeHandle,
        spec: CommandSpec,
    ) -> RegistrationResult<NodeHandle> {
        self.push(Some(parent), name.into(), spec, false)
    }

    /// Registers the interactive handler for `node_id`.
    ///
    /// The node may be registered before or after this call; it must exist by
    /// the time [`build`](Self::build) runs.
    pub fn register_interactive<H: InteractiveHandler>(
        &mut self,
        node_id: impl Into<String>,
        handler: H,
    ) -> RegistrationResult<()> {
        let node_id = node_id.into();
        if !self.interactive.insert(node_id.clone(), Arc::new(handler)) {
            return Err(RegistrationError::DuplicateInteractive(node_id));
        }
        self.interactive_targets.push(node_id);
        Ok(())
    }

    fn push(
        &mut self,
        parent: Option<NodeHandle>,
        name: String,
        spec: CommandSpec,
        is_group: bool,
    ) -> RegistrationResult<NodeHandle> {
        validate_name(&name)?;

        let (node_id, command_path) = match parent {
            None => (name.clone(), name.clone()),
            Some(NodeHandle(idx)) => {
                let parent = self.nodes.get(idx).ok_or(RegistrationError::UnknownParent)?;
                if !parent.is_group {
                    return Err(RegistrationError::ParentNotGroup(parent.node_id.clone()));
                }
                if parent
                    .children
                    .iter()
                    .any(|&child| self.nodes[child].name == name)
                {
                    return Err(RegistrationError::DuplicateName {
                        parent: parent.node_id.clone(),
                        name,
                    });
                }
                (
                    format!("{}.{}", parent.node_id, name),
                    format!("{} {}", parent.command_path, name),
                )
            }
        };

        if !is_group && spec.handler.is_none() {
            return Err(RegistrationError::MissingHandler(node_id));
        }
        validate_options(&node_id, &spec)?;

        // Names cannot contain dots, so a sibling check already implies this.
        if !self.ids.insert(node_id.clone()) {
            return Err(RegistrationError::DuplicateName {
                parent: parent
                    .and_then(|p| self.node_id(p))
                    .unwrap_or_default()
                    .to_string(),
                name,
            });
        }

        debug!(node_id = %node_id, is_group, "Registered command node");

        let idx = self.nodes.len();
        self.nodes.push(PendingNode {
            name,
            node_id,
            command_path,
            is_group,
            spec,
            children: Vec::new(),
        });
        if let Some(NodeHandle(parent)) = parent {
            self.nodes[parent].children.push(idx);
        }
        Ok(NodeHandle(idx))
    }

    /// Freezes the tree.
    pub fn build(mut self) -> RegistrationResult<Arc<CommandTree>> {
        if let Some(missing) = self
            .interactive_targets
            .iter()
            .find(|id| !self.ids.contains(*id))
        {
            return Err(RegistrationError::UnknownNode(missing.clone()));
        }

        let mut slots: Vec<Option<PendingNode>> = self.nodes.drain(..).map(Some).collect();
        let mut index = HashMap::with_capacity(slots.len());
        let root = freeze(0, &mut slots, &mut index);

        debug!(
            root = %root.node_id,
            nodes = index.len(),
            interactive = self.interactive.len(),
            "Command tree built"
        );

        Ok(Arc::new(CommandTree {
            root,
            index,
            interactive: self.interactive,
        }))
    }
}

/// Converts pending node `idx` and its subtree into frozen nodes, bottom-up.
fn freeze(
    idx: usize,
    slots: &mut [Option<PendingNode>],
    index: &mut HashMap<String, Arc<CommandNode>>,
) -> Arc<CommandNode> {
    let pending = slots[idx]
        .take()
        .unwrap_or_else(|| unreachable!("node {idx} frozen twice"));

    let CommandSpec {
        about,
        version,
        version_prog_name,
        version_message,
        mut options,
        positionals,
        handler,
    } = pending.spec;

    if version.is_some() {
        options.push(OptionSpec::version_option());
    }
    options.push(OptionSpec::help_option());

    let kind = match (pending.is_group, handler) {
        (true, handler) => {
            let children = pending
                .children
                .iter()
                .map(|&child| {
                    let node = freeze(child, slots, index);
                    (node.name.clone(), node)
                })
                .collect::<BTreeMap<_, _>>();
            NodeKind::Group { children, handler }
        }
        (false, Some(handler)) => NodeKind::Leaf { handler },
        (false, None) => unreachable!("commands are checked for a handler at registration"),
    };

    let node = Arc::new(CommandNode {
        name: pending.name,
        node_id: pending.node_id,
        command_path: pending.command_path,
        about,
        version,
        version_prog_name,
        version_message,
        options,
        positionals,
        kind,
    });
    index.insert(node.node_id.clone(), Arc::clone(&node));
    node
}

fn validate_name(name: &str) -> RegistrationResult<()> {
    if name.is_empty()
        || name.starts_with('-')
        || name.contains('.')
        || name.chars().any(char::is_whitespace)
    {
        return Err(RegistrationError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn validate_options(node_id: &str, spec: &CommandSpec) -> RegistrationResult<()> {
    let mut seen: HashSet<&str> = HashSet::from(["--help"]);
    if spec.version.is_some() {
        seen.insert("--version");
    }

    for decl in spec.options.iter().flat_map(|opt| opt.decls()) {
        if decl.len() < 2 || !decl.starts_with('-') || decl.contains('=') {
            return Err(RegistrationError::InvalidOption {
                node_id: node_id.to_string(),
                decl: decl.clone(),
            });
        }
        if !seen.insert(decl.as_str()) {
            return Err(RegistrationError::DuplicateOption {
                node_id: node_id.to_string(),
                decl: decl.clone(),
            });
        }
    }
    Ok(())
}
