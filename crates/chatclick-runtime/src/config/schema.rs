//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chatclick_core::{DispatchOptions, Translator};
use chatclick_core::translate::{DEFAULT_ERROR_COLOR, DEFAULT_HELP_PRETEXT};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ChatclickConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Dispatcher behaviour.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Formatting of usage-error and help replies.
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Interactive trigger behaviour.
    #[serde(default)]
    pub interactive: InteractiveConfig,
}

impl ChatclickConfig {
    /// The dispatcher options described by this configuration.
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            fallback_reply: self.dispatch.fallback_reply.clone(),
            interactive_miss_reply: self.interactive.miss_reply.clone(),
        }
    }

    /// The reply translator described by this configuration.
    pub fn translator(&self) -> Translator {
        Translator::new()
            .error_color(&self.reply.error_color)
            .help_pretext(&self.reply.help_pretext)
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The level as used in filter directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Requires `file_path`.
    File,
}

/// How much of each `dispatch` span's lifecycle is logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchSpans {
    /// Only events emitted inside the span.
    #[default]
    Off,
    /// One line when a dispatch starts and one, with timings, when it ends.
    Lifecycle,
    /// Every enter and exit as well. Dispatch spans are re-entered at each
    /// poll, so this is noisy for handlers that await often.
    Full,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file for `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,

    #[serde(default)]
    pub dispatch_spans: DispatchSpans,

    /// Per-module levels, e.g. `chatclick_core = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,
}

// =============================================================================
// Dispatch
// =============================================================================

/// Dispatcher configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Reply for groups invoked without a subcommand that have no handler of
    /// their own. `{command}` expands to the group's command path.
    #[serde(default)]
    pub fallback_reply: Option<String>,
}

/// Reply formatting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyConfig {
    /// Side-bar colour of the usage-error attachment.
    #[serde(default = "default_error_color")]
    pub error_color: String,

    /// Pretext of the help attachment.
    #[serde(default = "default_help_pretext")]
    pub help_pretext: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            error_color: default_error_color(),
            help_pretext: default_help_pretext(),
        }
    }
}

fn default_error_color() -> String {
    DEFAULT_ERROR_COLOR.to_string()
}

fn default_help_pretext() -> String {
    DEFAULT_HELP_PRETEXT.to_string()
}

/// Interactive trigger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveConfig {
    /// Reply sent when a trigger has no handler. Silent when unset.
    #[serde(default)]
    pub miss_reply: Option<String>,
}
