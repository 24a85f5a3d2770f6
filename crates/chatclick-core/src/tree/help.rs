//! Help text rendering.

use std::fmt::Write;

use super::node::CommandNode;

/// Renders the help text for `node`.
///
/// ```text
/// Usage: /click goodbye [OPTIONS]
///
///   Say goodbye to someone.
///
/// Options:
///   -n, --name TEXT  Who to say goodbye to  [required]
///   --help           Show this message and exit.
/// ```
pub fn render_help(node: &CommandNode) -> String {
    let mut out = String::new();

    let _ = write!(out, "Usage: {} [OPTIONS]", node.command_path());
    for positional in node.positionals() {
        if positional.is_required() {
            let _ = write!(out, " {}", positional.metavar());
        } else {
            let _ = write!(out, " [{}]", positional.metavar());
        }
    }
    if node.is_group() {
        out.push_str(" COMMAND [ARGS]...");
    }
    out.push('\n');

    if let Some(about) = node.about() {
        out.push('\n');
        for line in about.lines() {
            if line.trim().is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(out, "  {}", line.trim());
            }
        }
    }

    let options: Vec<(String, String)> = node
        .options()
        .iter()
        .map(|opt| {
            let mut left = opt.decls().join(", ");
            if opt.takes_value() {
                left.push(' ');
                left.push_str(opt.metavar_text());
            }
            let mut right = opt.help_text().unwrap_or_default().to_string();
            if let Some(default) = opt.default_text() {
                push_marker(&mut right, &format!("[default: {default}]"));
            }
            if opt.is_required() {
                push_marker(&mut right, "[required]");
            }
            (left, right)
        })
        .collect();
    write_table(&mut out, "Options", &options);

    let commands: Vec<(String, String)> = node
        .children()
        .map(|child| (child.name().to_string(), child.short_help().to_string()))
        .collect();
    write_table(&mut out, "Commands", &commands);

    out.trim_end().to_string()
}

fn push_marker(text: &mut String, marker: &str) {
    if !text.is_empty() {
        text.push_str("  ");
    }
    text.push_str(marker);
}

fn write_table(out: &mut String, title: &str, rows: &[(String, String)]) {
    if rows.is_empty() {
        return;
    }
    let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
    let _ = writeln!(out, "\n{title}:");
    for (left, right) in rows {
        if right.is_empty() {
            let _ = writeln!(out, "  {left}");
        } else {
            let _ = writeln!(out, "  {left:<width$}  {right}");
        }
    }
}
