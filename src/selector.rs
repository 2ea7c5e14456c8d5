//! Selector segmentation and rewriting
//!
//! Walks raw selector text, surfacing every class/id component plus
//! `:global(...)` and `:external(...)` constructs to a caller-supplied
//! visitor. The same walker drives symbol extraction (visitor records
//! names) and linking (visitor returns scoped replacements).

use crate::parser::lexer::{is_ident_char, is_ident_start};
use crate::Result;

/// A component surfaced while walking a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelEvent<'a> {
    /// `.name`; `global` is true inside a `:global(...)` wrapper.
    Class { name: &'a str, global: bool },
    /// `#name`; `global` is true inside a `:global(...)` wrapper.
    Id { name: &'a str, global: bool },
    /// `:external( args )` - the raw argument text, untrimmed.
    External { args: &'a str },
}

/// Structural problems found while walking a selector.
#[derive(Debug)]
pub enum RewriteError {
    /// `:global()` with nothing inside.
    EmptyGlobal,
    /// Unbalanced parentheses or brackets.
    Unbalanced,
    /// The visitor itself failed (unresolved external, etc).
    Visitor(crate::Error),
}

impl From<crate::Error> for RewriteError {
    fn from(err: crate::Error) -> Self {
        RewriteError::Visitor(err)
    }
}

/// Walk `selector`, invoking `visit` for every class, id, and
/// `:external(...)`. The visitor returns a replacement (`Some`) or leaves
/// the component untouched (`None`). `:global(...)` wrappers are unwrapped
/// in the returned text; their contents are surfaced with `global: true`.
pub fn rewrite<F>(selector: &str, visit: &mut F) -> std::result::Result<String, RewriteError>
where
    F: FnMut(SelEvent<'_>) -> Result<Option<String>>,
{
    let chars: Vec<char> = selector.chars().collect();
    let mut pos = 0;
    process(&chars, &mut pos, false, visit)
}

fn process<F>(
    chars: &[char],
    pos: &mut usize,
    in_global: bool,
    visit: &mut F,
) -> std::result::Result<String, RewriteError>
where
    F: FnMut(SelEvent<'_>) -> Result<Option<String>>,
{
    let mut out = String::new();

    while *pos < chars.len() {
        let ch = chars[*pos];

        match ch {
            '"' | '\'' => copy_string(chars, pos, &mut out),
            '\\' => {
                out.push(chars[*pos]);
                *pos += 1;
                if *pos < chars.len() {
                    out.push(chars[*pos]);
                    *pos += 1;
                }
            }
            '[' => copy_brackets(chars, pos, &mut out)?,
            '.' | '#' if *pos + 1 < chars.len() && is_ident_start(chars[*pos + 1]) => {
                *pos += 1;
                let name = take_ident(chars, pos);
                let event = if ch == '.' {
                    SelEvent::Class {
                        name: &name,
                        global: in_global,
                    }
                } else {
                    SelEvent::Id {
                        name: &name,
                        global: in_global,
                    }
                };
                let replacement = visit(event)?;
                out.push(ch);
                out.push_str(replacement.as_deref().unwrap_or(&name));
            }
            ':' => {
                // `::before` - copy the element pseudo verbatim
                if *pos + 1 < chars.len() && chars[*pos + 1] == ':' {
                    out.push(':');
                    out.push(':');
                    *pos += 2;
                    let name = take_ident(chars, pos);
                    out.push_str(&name);
                    continue;
                }

                *pos += 1;
                let name = take_ident(chars, pos);
                let has_args = *pos < chars.len() && chars[*pos] == '(';

                match (name.as_str(), has_args) {
                    ("global", true) => {
                        let args = take_balanced(chars, pos)?;
                        if args.trim().is_empty() {
                            return Err(RewriteError::EmptyGlobal);
                        }
                        let inner: Vec<char> = args.trim().chars().collect();
                        let mut inner_pos = 0;
                        out.push_str(&process(&inner, &mut inner_pos, true, visit)?);
                    }
                    ("external", true) => {
                        let args = take_balanced(chars, pos)?;
                        match visit(SelEvent::External { args: &args })? {
                            Some(replacement) => out.push_str(&replacement),
                            None => {
                                out.push_str(":external(");
                                out.push_str(&args);
                                out.push(')');
                            }
                        }
                    }
                    (_, true) => {
                        // `:not(.a)` and friends - contents scope normally
                        let args = take_balanced(chars, pos)?;
                        let inner: Vec<char> = args.chars().collect();
                        let mut inner_pos = 0;
                        out.push(':');
                        out.push_str(&name);
                        out.push('(');
                        out.push_str(&process(&inner, &mut inner_pos, in_global, visit)?);
                        out.push(')');
                    }
                    (_, false) => {
                        out.push(':');
                        out.push_str(&name);
                    }
                }
            }
            _ => {
                out.push(ch);
                *pos += 1;
            }
        }
    }

    Ok(out)
}

fn take_ident(chars: &[char], pos: &mut usize) -> String {
    let mut name = String::new();
    while *pos < chars.len() && is_ident_char(chars[*pos]) {
        name.push(chars[*pos]);
        *pos += 1;
    }
    name
}

/// Consume a balanced `( ... )` group, returning the inner text.
/// Assumes the cursor is on the opening paren.
fn take_balanced(chars: &[char], pos: &mut usize) -> std::result::Result<String, RewriteError> {
    *pos += 1; // '('
    let mut depth = 1usize;
    let mut inner = String::new();

    while *pos < chars.len() {
        let ch = chars[*pos];
        match ch {
            '"' | '\'' => copy_string(chars, pos, &mut inner),
            '(' => {
                depth += 1;
                inner.push(ch);
                *pos += 1;
            }
            ')' => {
                depth -= 1;
                *pos += 1;
                if depth == 0 {
                    return Ok(inner);
                }
                inner.push(ch);
            }
            _ => {
                inner.push(ch);
                *pos += 1;
            }
        }
    }

    Err(RewriteError::Unbalanced)
}

fn copy_string(chars: &[char], pos: &mut usize, out: &mut String) {
    let quote = chars[*pos];
    out.push(quote);
    *pos += 1;
    while *pos < chars.len() {
        let ch = chars[*pos];
        out.push(ch);
        *pos += 1;
        if ch == '\\' {
            if *pos < chars.len() {
                out.push(chars[*pos]);
                *pos += 1;
            }
            continue;
        }
        if ch == quote {
            break;
        }
    }
}

fn copy_brackets(
    chars: &[char],
    pos: &mut usize,
    out: &mut String,
) -> std::result::Result<(), RewriteError> {
    out.push('[');
    *pos += 1;
    while *pos < chars.len() {
        match chars[*pos] {
            '"' | '\'' => copy_string(chars, pos, out),
            ']' => {
                out.push(']');
                *pos += 1;
                return Ok(());
            }
            ch => {
                out.push(ch);
                *pos += 1;
            }
        }
    }
    Err(RewriteError::Unbalanced)
}

/// Split a selector list on top-level commas.
pub fn split_selectors(selector: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let chars: Vec<char> = selector.chars().collect();
    let mut pos = 0;

    while pos < chars.len() {
        match chars[pos] {
            '"' | '\'' => copy_string(&chars, &mut pos, &mut current),
            '(' | '[' => {
                depth += 1;
                current.push(chars[pos]);
                pos += 1;
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(chars[pos]);
                pos += 1;
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
                pos += 1;
            }
            ch => {
                current.push(ch);
                pos += 1;
            }
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// If `selector` is exactly one bare class (`.name`), return the name.
pub fn simple_class(selector: &str) -> Option<&str> {
    let rest = selector.trim().strip_prefix('.')?;
    if !rest.is_empty() && rest.chars().all(is_ident_char) {
        Some(rest)
    } else {
        None
    }
}
