//! Minimal CSS parser - rules, at-rules, declarations, comments
//!
//! Just enough grammar for the linker: selectors stay raw text (the
//! [`crate::selector`] module segments them later), declaration values stay
//! raw text (value substitution is textual). Every node keeps its source
//! position for error reporting and source maps.

pub mod ast;
pub mod lexer;

pub use ast::{AtRule, Comment, Declaration, Item, Pos, Printed, Rule, RuleItem, Stylesheet};

use crate::{Error, Result};
use lexer::Cursor;
use std::path::Path;

/// Parse CSS source into a [`Stylesheet`].
pub fn parse(file: &Path, input: &str) -> Result<Stylesheet> {
    let mut cur = Cursor::new(input);
    let items = parse_items(&mut cur, file, false)?;
    Ok(Stylesheet { items })
}

fn syntax(file: &Path, pos: Pos, detail: impl Into<String>) -> Error {
    Error::Syntax {
        file: file.to_path_buf(),
        line: pos.line,
        detail: detail.into(),
    }
}

fn parse_items(cur: &mut Cursor, file: &Path, in_block: bool) -> Result<Vec<Item>> {
    let mut items = Vec::new();

    loop {
        cur.skip_whitespace();

        if cur.is_eof() {
            if in_block {
                return Err(syntax(file, cur.position(), "unclosed block"));
            }
            return Ok(items);
        }

        if cur.starts_with("/*") {
            let pos = cur.position();
            let text = cur.consume_comment();
            items.push(Item::Comment(Comment { text, pos }));
            continue;
        }

        match cur.peek() {
            Some('}') => {
                if in_block {
                    cur.bump();
                    return Ok(items);
                }
                return Err(syntax(file, cur.position(), "unexpected \"}\""));
            }
            Some('@') => items.push(Item::AtRule(parse_at_rule(cur, file)?)),
            _ => items.push(Item::Rule(parse_rule(cur, file)?)),
        }
    }
}

fn parse_at_rule(cur: &mut Cursor, file: &Path) -> Result<AtRule> {
    let pos = cur.position();
    cur.bump(); // '@'

    let name = cur.consume_ident();
    if name.is_empty() {
        return Err(syntax(file, pos, "expected at-rule name after \"@\""));
    }

    let mut params = String::new();
    loop {
        cur.skip_comment_into_space(&mut params);
        match cur.peek() {
            None => {
                // Statement at-rule terminated by EOF.
                return Ok(AtRule {
                    name,
                    params: collapse_ws(&params),
                    block: None,
                    pos,
                });
            }
            Some(';') => {
                cur.bump();
                return Ok(AtRule {
                    name,
                    params: collapse_ws(&params),
                    block: None,
                    pos,
                });
            }
            Some('{') => {
                cur.bump();
                let block = parse_items(cur, file, true)?;
                return Ok(AtRule {
                    name,
                    params: collapse_ws(&params),
                    block: Some(block),
                    pos,
                });
            }
            Some('"') | Some('\'') => params.push_str(&cur.consume_string()),
            Some('}') => return Err(syntax(file, cur.position(), "unexpected \"}\" in at-rule")),
            Some(_) => params.push(cur.bump().unwrap()),
        }
    }
}

fn parse_rule(cur: &mut Cursor, file: &Path) -> Result<Rule> {
    let pos = cur.position();
    let mut selector = String::new();

    loop {
        cur.skip_comment_into_space(&mut selector);
        match cur.peek() {
            None => return Err(syntax(file, pos, "expected \"{\" after selector")),
            Some('{') => {
                cur.bump();
                break;
            }
            Some(';') | Some('}') => {
                return Err(syntax(file, cur.position(), "expected \"{\" after selector"));
            }
            Some('"') | Some('\'') => selector.push_str(&cur.consume_string()),
            Some(_) => selector.push(cur.bump().unwrap()),
        }
    }

    let selector = collapse_ws(&selector);
    if selector.is_empty() {
        return Err(syntax(file, pos, "empty selector"));
    }

    let mut items = Vec::new();
    loop {
        cur.skip_whitespace();

        if cur.starts_with("/*") {
            let cpos = cur.position();
            let text = cur.consume_comment();
            items.push(RuleItem::Comment(Comment { text, pos: cpos }));
            continue;
        }

        match cur.peek() {
            None => return Err(syntax(file, pos, "unclosed rule block")),
            Some('}') => {
                cur.bump();
                // Keyframe step blocks parse as rules nested in the at-rule
                // block, so a '{' here means malformed nesting.
                return Ok(Rule {
                    selector,
                    items,
                    pos,
                });
            }
            Some(';') => {
                cur.bump(); // stray semicolon
            }
            Some('{') => {
                return Err(syntax(file, cur.position(), "unexpected \"{\" in declaration block"));
            }
            _ => items.push(RuleItem::Decl(parse_declaration(cur, file)?)),
        }
    }
}

fn parse_declaration(cur: &mut Cursor, file: &Path) -> Result<Declaration> {
    let pos = cur.position();

    let mut prop = String::new();
    loop {
        match cur.peek() {
            None | Some(';') | Some('}') | Some('{') => {
                return Err(syntax(file, pos, "expected \":\" in declaration"));
            }
            Some(':') => {
                cur.bump();
                break;
            }
            Some(_) => prop.push(cur.bump().unwrap()),
        }
    }

    let prop = collapse_ws(&prop);
    if prop.is_empty() {
        return Err(syntax(file, pos, "empty property name"));
    }

    let mut value = String::new();
    let mut depth = 0usize;
    loop {
        cur.skip_comment_into_space(&mut value);
        match cur.peek() {
            None => break,
            Some(';') if depth == 0 => {
                cur.bump();
                break;
            }
            Some('}') if depth == 0 => break,
            Some('(') => {
                depth += 1;
                value.push(cur.bump().unwrap());
            }
            Some(')') => {
                depth = depth.saturating_sub(1);
                value.push(cur.bump().unwrap());
            }
            Some('"') | Some('\'') => value.push_str(&cur.consume_string()),
            Some(_) => value.push(cur.bump().unwrap()),
        }
    }

    Ok(Declaration {
        prop,
        value: collapse_ws(&value),
        pos,
    })
}

impl Cursor {
    /// Skip a comment if the cursor sits on one, leaving a single space in
    /// `out` so token boundaries survive (`a/**/b` stays two tokens).
    fn skip_comment_into_space(&mut self, out: &mut String) {
        while self.starts_with("/*") {
            self.consume_comment();
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
        }
    }
}

/// Collapse whitespace runs into single spaces, preserving quoted strings.
pub fn collapse_ws(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '"' || ch == '\'' {
            out.push(ch);
            for inner in chars.by_ref() {
                out.push(inner);
                if inner == ch {
                    break;
                }
            }
            continue;
        }

        if ch.is_whitespace() {
            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }
            if !out.is_empty() && chars.peek().is_some() {
                out.push(' ');
            }
            continue;
        }

        out.push(ch);
    }

    out.trim().to_string()
}
