//! Subscriber setup.
//!
//! The dispatcher does its logging inside a `dispatch` span that records the
//! command text and the caller, and every line logged while a command runs
//! (handler output included) is attached to that span.
//! [`DispatchSpans`] decides whether the span's own open and close are logged
//! as well, which is the cheapest way to get per-command timings:
//!
//! ```text
//! INFO dispatch{command="goodbye --name Alice" identity=U1}: new
//! INFO dispatch{command="goodbye --name Alice" identity=U1}: close time.busy=212µs time.idle=48µs
//! ```
//!
//! ```rust,ignore
//! let config = chatclick_runtime::config::load_config()?;
//! chatclick_runtime::logging::init_from_config(&config.logging);
//!
//! // or by hand
//! LoggingBuilder::new()
//!     .directive("chatclick_core=debug")
//!     .dispatch_spans(DispatchSpans::Lifecycle)
//!     .init();
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{DispatchSpans, LogFormat, LogLevel, LogOutput, LoggingConfig};

const DEFAULT_LOG_FILE: &str = "chatclick.log";

/// Installs the global subscriber described by `config`.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    LoggingBuilder::from_config(config).init();
}

/// Builds the global `tracing` subscriber.
#[derive(Debug, Default)]
pub struct LoggingBuilder {
    level: LogLevel,
    directives: Vec<String>,
    dispatch_spans: DispatchSpans,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
    file_location: bool,
}

impl LoggingBuilder {
    /// Info level, compact lines on stdout, no span events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrors a [`LoggingConfig`]; `filters` become directives.
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            level: config.level,
            directives: config
                .filters
                .iter()
                .map(|(target, level)| format!("{target}={level}"))
                .collect(),
            dispatch_spans: config.dispatch_spans,
            format: config.format,
            output: config.output,
            file_path: config.file_path.clone(),
            file_location: config.file_location,
        }
    }

    /// Sets the base level. `RUST_LOG` still wins when set.
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Adds a filter directive such as `chatclick_core=debug`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn dispatch_spans(mut self, spans: DispatchSpans) -> Self {
        self.dispatch_spans = spans;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Log file used with [`LogOutput::File`]; defaults to `chatclick.log`.
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Adds source file and line to every event.
    pub fn file_location(mut self, enabled: bool) -> Self {
        self.file_location = enabled;
        self
    }

    /// Installs the subscriber, ignoring an already installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.filter();
        tracing_subscriber::registry()
            .with(self.fmt_layer())
            .with(filter)
            .try_init()
    }

    fn filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()));
        for directive in &self.directives {
            match directive.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(e) => eprintln!("Ignoring log filter {directive:?}: {e}"),
            }
        }
        filter
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_writer(self.writer())
            .with_span_events(span_events(self.dispatch_spans))
            .with_file(self.file_location)
            .with_line_number(self.file_location);

        match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
            // Without `json-log`, json is logged in the full format.
            _ => layer.boxed(),
        }
    }

    fn writer(&self) -> BoxMakeWriter {
        match self.output {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogOutput::File => {
                let path = self
                    .file_path
                    .as_deref()
                    .unwrap_or(Path::new(DEFAULT_LOG_FILE));
                let (dir, name) = split_log_path(path);
                BoxMakeWriter::new(tracing_appender::rolling::never(dir, name))
            }
        }
    }
}

fn span_events(spans: DispatchSpans) -> FmtSpan {
    match spans {
        DispatchSpans::Off => FmtSpan::NONE,
        DispatchSpans::Lifecycle => FmtSpan::NEW | FmtSpan::CLOSE,
        DispatchSpans::Full => FmtSpan::FULL,
    }
}

/// Splits a log path into the directory and file name the appender wants.
fn split_log_path(path: &Path) -> (&Path, &OsStr) {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .unwrap_or(OsStr::new(DEFAULT_LOG_FILE));
    (dir, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = LoggingConfig::default();
        config.level = LogLevel::Debug;
        config.file_location = true;
        config.dispatch_spans = DispatchSpans::Lifecycle;
        config.filters.insert("chatclick_core".into(), LogLevel::Trace);
        config.filters.insert("hyper".into(), LogLevel::Warn);

        let builder = LoggingBuilder::from_config(&config);
        assert_eq!(builder.level, LogLevel::Debug);
        assert!(builder.file_location);
        assert_eq!(builder.dispatch_spans, DispatchSpans::Lifecycle);
        assert_eq!(builder.directives, vec!["chatclick_core=trace", "hyper=warn"]);
    }

    #[test]
    fn test_dispatch_span_events() {
        assert_eq!(span_events(DispatchSpans::Off), FmtSpan::NONE);
        assert_eq!(
            span_events(DispatchSpans::Lifecycle),
            FmtSpan::NEW | FmtSpan::CLOSE
        );
        assert_eq!(span_events(DispatchSpans::Full), FmtSpan::FULL);
    }

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("logs/bot.log"));
        assert_eq!(dir, Path::new("logs"));
        assert_eq!(name, "bot.log");

        let (dir, name) = split_log_path(Path::new("bot.log"));
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "bot.log");
    }

    #[test]
    fn test_dispatch_spans_names() {
        let config: LoggingConfig =
            serde_json::from_value(serde_json::json!({ "dispatch_spans": "lifecycle" })).unwrap();
        assert_eq!(config.dispatch_spans, DispatchSpans::Lifecycle);
        assert_eq!(LoggingConfig::default().dispatch_spans, DispatchSpans::Off);
    }
}
