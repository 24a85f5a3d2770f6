//! Command tree: nodes, option specs, registration and help rendering.

mod builder;
mod help;
mod node;
mod option;

pub use builder::{CommandSpec, CommandTreeBuilder, NodeHandle};
pub use help::render_help;
pub use node::{CommandNode, CommandTree, NodeKind};
pub use option::{ArgValue, EagerKind, OptionSpec, PositionalSpec};
