//! Shell-like tokenizing of chat text.

/// Splits chat text into shell-like tokens.
///
/// Handles:
/// - Whitespace-separated arguments (spaces, tabs and newlines)
/// - Quoted strings (single and double quotes)
/// - Escape sequences within double quotes
///
/// An explicitly quoted empty string (`""`) becomes an empty token. Input with
/// an unterminated quote or a dangling escape falls back to plain whitespace
/// splitting, so untrusted text never causes an error.
pub fn tokenize(input: &str) -> Vec<String> {
    shell_split(input).unwrap_or_else(|| {
        input
            .split_whitespace()
            .map(ToString::to_string)
            .collect()
    })
}

/// Strict shell splitting. Returns `None` on malformed quoting.
fn shell_split(input: &str) -> Option<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escape_next = false;

    for ch in input.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_double_quote => {
                escape_next = true;
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                in_token = true;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
                in_token = true;
            }
            c if c.is_whitespace() && !in_single_quote && !in_double_quote => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            _ => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if in_single_quote || in_double_quote || escape_next {
        return None;
    }

    if in_token {
        args.push(current);
    }

    Some(args)
}
