//! Option and positional-argument specifications.

use std::fmt;

/// Which eager behaviour an option triggers.
///
/// Eager options are looked for before anything else on a node; when one is
/// present the rest of the input for that node is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EagerKind {
    /// Reply with the node's help text.
    Help,
    /// Reply with the program version.
    Version,
}

impl fmt::Display for EagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => f.write_str("help"),
            Self::Version => f.write_str("version"),
        }
    }
}

/// A resolved argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// Value of a value-taking option or a positional argument.
    Text(String),
    /// State of a flag option.
    Flag(bool),
}

impl ArgValue {
    /// Returns the text value, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Flag(_) => None,
        }
    }

    /// Returns the flag state, if this is a flag.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            Self::Text(_) => None,
        }
    }
}

/// Specification of one named option.
///
/// ```rust,ignore
/// let name = OptionSpec::value("--name").short("-n").required().help("Who to greet");
/// let loud = OptionSpec::flag("--loud");
/// ```
#[derive(Debug, Clone)]
pub struct OptionSpec {
    name: String,
    decls: Vec<String>,
    takes_value: bool,
    default: Option<String>,
    required: bool,
    eager: Option<EagerKind>,
    help: Option<String>,
    metavar: Option<String>,
}

impl OptionSpec {
    /// Creates a value-taking option, e.g. `--name VALUE`.
    pub fn value(decl: impl Into<String>) -> Self {
        Self::with_decl(decl.into(), true)
    }

    /// Creates a boolean flag, e.g. `--verbose`.
    pub fn flag(decl: impl Into<String>) -> Self {
        Self::with_decl(decl.into(), false)
    }

    pub(crate) fn help_option() -> Self {
        let mut spec = Self::flag("--help").help("Show this message and exit.");
        spec.eager = Some(EagerKind::Help);
        spec
    }

    pub(crate) fn version_option() -> Self {
        let mut spec = Self::flag("--version").help("Show the version and exit.");
        spec.eager = Some(EagerKind::Version);
        spec
    }

    fn with_decl(decl: String, takes_value: bool) -> Self {
        Self {
            name: dest_name(&decl),
            decls: vec![decl],
            takes_value,
            default: None,
            required: false,
            eager: None,
            help: None,
            metavar: None,
        }
    }

    /// Adds a short declaration such as `-n`.
    pub fn short(self, decl: impl Into<String>) -> Self {
        self.alias(decl)
    }

    /// Adds another declaration for the same option.
    pub fn alias(mut self, decl: impl Into<String>) -> Self {
        self.decls.push(decl.into());
        self
    }

    /// Overrides the key under which the value is stored.
    ///
    /// Defaults to the first declaration without dashes, with inner dashes
    /// turned into underscores (`--dry-run` → `dry_run`).
    pub fn dest(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Marks the option as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the value used when the option is absent.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the help line shown in the options table.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Sets the placeholder shown in help for the option's value.
    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    /// The key under which the resolved value is stored.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All declarations, in registration order.
    pub fn decls(&self) -> &[String] {
        &self.decls
    }

    /// Returns `true` if the option consumes a value.
    pub fn takes_value(&self) -> bool {
        self.takes_value
    }

    /// Returns `true` if the option must be given.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The default value, if any.
    pub fn default_text(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// The eager behaviour, if this is an eager option.
    pub fn eager(&self) -> Option<EagerKind> {
        self.eager
    }

    /// The help line, if any.
    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Placeholder shown in help for the value.
    pub fn metavar_text(&self) -> &str {
        self.metavar.as_deref().unwrap_or("TEXT")
    }

    /// Returns `true` if `decl` names this option.
    pub fn matches(&self, decl: &str) -> bool {
        self.decls.iter().any(|d| d == decl)
    }

    /// The declarations formatted for error messages: `'-n' / '--name'`.
    pub(crate) fn error_hint(&self) -> String {
        self.decls
            .iter()
            .map(|d| format!("'{d}'"))
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

fn dest_name(decl: &str) -> String {
    decl.trim_start_matches('-').replace('-', "_")
}

/// Specification of one positional argument.
#[derive(Debug, Clone)]
pub struct PositionalSpec {
    name: String,
    required: bool,
    default: Option<String>,
    help: Option<String>,
}

impl PositionalSpec {
    /// Creates a required positional argument.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            default: None,
            help: None,
        }
    }

    /// Creates an optional positional argument.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    /// Sets the value used when the argument is absent.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the help line.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// The key under which the value is stored.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the argument must be given.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The default value, if any.
    pub fn default_text(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// The help line, if any.
    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Upper-case name as shown in usage lines and errors.
    pub fn metavar(&self) -> String {
        self.name.to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dest_name_from_long_decl() {
        assert_eq!(OptionSpec::value("--name").name(), "name");
        assert_eq!(OptionSpec::flag("--dry-run").name(), "dry_run");
        assert_eq!(OptionSpec::flag("-v").name(), "v");
    }

    #[test]
    fn test_dest_override() {
        let spec = OptionSpec::value("-n").dest("name");
        assert_eq!(spec.name(), "name");
        assert!(spec.matches("-n"));
    }

    #[test]
    fn test_error_hint_lists_all_decls() {
        let spec = OptionSpec::value("-n").alias("--name");
        assert_eq!(spec.error_hint(), "'-n' / '--name'");
    }

    #[test]
    fn test_builtin_eager_options() {
        assert_eq!(OptionSpec::help_option().eager(), Some(EagerKind::Help));
        assert_eq!(OptionSpec::version_option().eager(), Some(EagerKind::Version));
        assert!(!OptionSpec::help_option().takes_value());
    }

    #[test]
    fn test_positional_metavar() {
        let arg = PositionalSpec::optional("target");
        assert_eq!(arg.metavar(), "TARGET");
        assert!(!arg.is_required());
    }
}
