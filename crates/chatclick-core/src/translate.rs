//! Turns resolution outcomes into chat payloads.

use crate::context::Identity;
use crate::reply::{Attachment, ReplyPayload};
use crate::tree::{CommandNode, render_help};

/// Default side-bar colour of the first usage-error attachment.
pub const DEFAULT_ERROR_COLOR: &str = "#FF0000";

/// Default pretext of the help attachment.
pub const DEFAULT_HELP_PRETEXT: &str = "Command help";

/// Default `--version` template.
pub const DEFAULT_VERSION_MESSAGE: &str = "{prog}, version {version}";

/// Formats usage errors, help and version replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translator {
    error_color: String,
    help_pretext: String,
}

impl Default for Translator {
    fn default() -> Self {
        Self {
            error_color: DEFAULT_ERROR_COLOR.to_string(),
            help_pretext: DEFAULT_HELP_PRETEXT.to_string(),
        }
    }
}

impl Translator {
    /// Creates a translator with the default colour and pretext.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the side-bar colour of the error attachment.
    pub fn error_color(mut self, color: impl Into<String>) -> Self {
        self.error_color = color.into();
        self
    }

    /// Overrides the pretext of the help attachment.
    pub fn help_pretext(mut self, pretext: impl Into<String>) -> Self {
        self.help_pretext = pretext.into();
        self
    }

    /// Builds the three-attachment usage-error reply.
    ///
    /// `command` is the echoed command line, root name included; `node` is the
    /// node that rejected the input and whose help is attached.
    pub fn translate(
        &self,
        node: &CommandNode,
        command: &str,
        identity: &Identity,
        errmsg: &str,
    ) -> ReplyPayload {
        let help = render_help(node);
        ReplyPayload::default()
            .attachment(
                Attachment::new(format!("```{command}```"), command)
                    .pretext(format!(
                        "Hi {}, I could not run your command",
                        identity.mention()
                    ))
                    .color(&self.error_color),
            )
            .attachment(Attachment::new(format!("```{errmsg}```"), errmsg))
            .attachment(
                Attachment::new(format!("```{help}```"), help).pretext(&self.help_pretext),
            )
    }

    /// Builds the reply for `--help`.
    pub fn help(&self, node: &CommandNode) -> ReplyPayload {
        ReplyPayload::text(format!("*Command help:*\n```{}```", render_help(node)))
    }

    /// Builds the reply for `--version` on `node`. `default_prog` is used
    /// unless the node overrides the program name.
    pub fn version(&self, node: &CommandNode, default_prog: &str) -> ReplyPayload {
        let prog = node.version_prog_name().unwrap_or(default_prog);
        let text = node
            .version_message()
            .unwrap_or(DEFAULT_VERSION_MESSAGE)
            .replace("{prog}", prog)
            .replace("{version}", node.version().unwrap_or_default());
        ReplyPayload::text(format!("```{text}```"))
    }
}
