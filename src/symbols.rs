//! Per-file symbol extraction
//!
//! One pass over a parsed stylesheet collects everything the linker needs:
//! local class/id/keyframe declarations, global selector names, `@value`
//! statements, `composes` declarations, and `:external(...)` references.
//! Extraction is purely local - no cross-file knowledge, no renaming.

use crate::parser::ast::{AtRule, Item, Pos, Rule, Stylesheet};
use crate::parser::lexer::is_ident_char;
use crate::selector::{self, RewriteError, SelEvent};
use crate::{Error, Result};
use std::collections::HashSet;
use std::path::Path;

/// Everything declared or referenced by one file.
#[derive(Debug, Clone, Default)]
pub struct FileSymbols {
    /// Local class names, first-declaration order.
    pub classes: Vec<String>,
    /// Local id names, first-declaration order.
    pub ids: Vec<String>,
    /// `@keyframes` names, first-declaration order.
    pub keyframes: Vec<String>,
    /// Names declared through `:global(...)`, first-appearance order.
    pub globals: Vec<String>,
    /// `@value` statements in document order.
    pub values: Vec<ValueDef>,
    /// `composes` declarations in document order.
    pub composes: Vec<ComposesDecl>,
    /// `:external(...)` references in document order.
    pub externals: Vec<ExternalRef>,
}

/// A single `@value` statement.
#[derive(Debug, Clone)]
pub struct ValueDef {
    pub name: String,
    pub kind: ValueDefKind,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub enum ValueDefKind {
    /// `@value name: literal;`
    Literal(String),
    /// `@value name from "./other.css";`
    Import { request: String },
    /// `@value * as ns from "./other.css";`
    Namespace { request: String },
}

/// One `composes:` declaration attached to its owning local class.
#[derive(Debug, Clone)]
pub struct ComposesDecl {
    pub owner: String,
    pub targets: Vec<ComposesTarget>,
    /// Resolved request string when the declaration has a `from` clause.
    pub from: Option<String>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposesTarget {
    /// Plain name, resolved locally or against the `from` file's exports.
    Name(String),
    /// `global(name)` - an unscoped name with no file ownership.
    Global(String),
}

/// One `:external(names from "./file.css")` reference.
#[derive(Debug, Clone)]
pub struct ExternalRef {
    /// The raw argument text, used to pair the reference back up with the
    /// selector occurrence it came from.
    pub args: String,
    pub names: Vec<String>,
    pub request: String,
    pub pos: Pos,
}

/// A cross-file reference discovered during extraction.
#[derive(Debug, Clone)]
pub struct DependencyRef {
    pub request: String,
    pub kind: crate::EdgeKind,
    pub pos: Pos,
}

impl FileSymbols {
    /// Every cross-file request, in document order: value imports first
    /// (they are needed to resolve the rest), then composes, then externals.
    pub fn dependency_refs(&self) -> Vec<DependencyRef> {
        let mut refs = Vec::new();

        for value in &self.values {
            let request = match &value.kind {
                ValueDefKind::Import { request } | ValueDefKind::Namespace { request } => request,
                ValueDefKind::Literal(_) => continue,
            };
            refs.push(DependencyRef {
                request: request.clone(),
                kind: crate::EdgeKind::Value,
                pos: value.pos,
            });
        }

        for decl in &self.composes {
            if let Some(from) = &decl.from {
                refs.push(DependencyRef {
                    request: from.clone(),
                    kind: crate::EdgeKind::Composes,
                    pos: decl.pos,
                });
            }
        }

        for ext in &self.externals {
            refs.push(DependencyRef {
                request: ext.request.clone(),
                kind: crate::EdgeKind::External,
                pos: ext.pos,
            });
        }

        refs
    }

    fn note_class(&mut self, name: &str) {
        if !self.classes.iter().any(|c| c == name) {
            self.classes.push(name.to_string());
        }
    }

    fn note_id(&mut self, name: &str) {
        if !self.ids.iter().any(|c| c == name) {
            self.ids.push(name.to_string());
        }
    }

    fn note_global(&mut self, name: &str) {
        if !self.globals.iter().any(|c| c == name) {
            self.globals.push(name.to_string());
        }
    }

    /// Literal value of a locally-defined `@value`, if any.
    fn local_literal(&self, name: &str) -> Option<&str> {
        self.values.iter().rev().find_map(|v| match &v.kind {
            ValueDefKind::Literal(lit) if v.name == name => Some(lit.as_str()),
            _ => None,
        })
    }
}

/// Extract the symbol table of a parsed file.
pub fn extract(file: &Path, sheet: &Stylesheet) -> Result<FileSymbols> {
    let mut symbols = FileSymbols::default();

    extract_items(file, &sheet.items, &mut symbols)?;

    // The same bare name cannot be both local and global, in either order.
    let locals: HashSet<&String> = symbols.classes.iter().chain(symbols.ids.iter()).collect();
    let mut collisions: Vec<&String> = symbols
        .globals
        .iter()
        .filter(|g| locals.contains(g))
        .collect();
    collisions.sort();
    if let Some(name) = collisions.first() {
        return Err(Error::GlobalLocalCollision {
            name: (*name).clone(),
        });
    }

    Ok(symbols)
}

fn extract_items(file: &Path, items: &[Item], symbols: &mut FileSymbols) -> Result<()> {
    for item in items {
        match item {
            Item::Rule(rule) => extract_rule(file, rule, symbols)?,
            Item::AtRule(at) => {
                if at.name == "value" {
                    extract_value(file, at, symbols)?;
                } else if at.is_keyframes() {
                    let name = at.params.split_whitespace().next().unwrap_or_default();
                    if !name.is_empty() && !symbols.keyframes.iter().any(|k| k == name) {
                        symbols.keyframes.push(name.to_string());
                    }
                } else if let Some(block) = &at.block {
                    // @media and friends nest normal rules
                    extract_items(file, block, symbols)?;
                }
            }
            Item::Comment(_) => {}
        }
    }
    Ok(())
}

fn extract_rule(file: &Path, rule: &Rule, symbols: &mut FileSymbols) -> Result<()> {
    // Selector pass: record locals/globals, validate :global/:external shape.
    let mut externals: Vec<(String, Pos)> = Vec::new();
    let walk = selector::rewrite(&rule.selector, &mut |event| {
        match event {
            SelEvent::Class { name, global } => {
                if global {
                    symbols.note_global(name);
                } else {
                    symbols.note_class(name);
                }
            }
            SelEvent::Id { name, global } => {
                if global {
                    symbols.note_global(name);
                } else {
                    symbols.note_id(name);
                }
            }
            SelEvent::External { args } => externals.push((args.to_string(), rule.pos)),
        }
        Ok(None)
    });

    match walk {
        Ok(_) => {}
        Err(RewriteError::EmptyGlobal) => {
            return Err(Error::EmptyGlobal {
                file: file.to_path_buf(),
            });
        }
        Err(RewriteError::Unbalanced) => {
            return Err(Error::Syntax {
                file: file.to_path_buf(),
                line: rule.pos.line,
                detail: format!("unbalanced selector \"{}\"", rule.selector),
            });
        }
        Err(RewriteError::Visitor(err)) => return Err(err),
    }

    for (args, pos) in externals {
        symbols.externals.push(parse_external(file, &args, pos, symbols)?);
    }

    // Declaration pass: composes shape + targets.
    let mut seen_other_decl = false;
    for decl in rule.decls() {
        if decl.prop != "composes" {
            seen_other_decl = true;
            continue;
        }

        if seen_other_decl {
            return Err(Error::ComposesNotFirst {
                file: file.to_path_buf(),
            });
        }

        let owner = selector::simple_class(&rule.selector).ok_or_else(|| {
            Error::ComposesComplexSelector {
                selector: rule.selector.clone(),
            }
        })?;

        symbols.composes.push(parse_composes(
            file,
            owner,
            &decl.value,
            decl.pos,
            symbols,
        )?);
    }

    Ok(())
}

fn syntax(file: &Path, pos: Pos, detail: impl Into<String>) -> Error {
    Error::Syntax {
        file: file.to_path_buf(),
        line: pos.line,
        detail: detail.into(),
    }
}

/// `@value` grammar:
/// `name: literal` | `a, b from SRC` | `* as ns from SRC`
fn extract_value(file: &Path, at: &AtRule, symbols: &mut FileSymbols) -> Result<()> {
    let params = at.params.trim();

    if let Some(rest) = params.strip_prefix('*') {
        let rest = rest.trim();
        let Some(rest) = rest.strip_prefix("as ") else {
            return Err(syntax(file, at.pos, "expected \"as\" in @value namespace"));
        };
        let (ns, from) = split_from(rest.trim());
        let Some(from) = from else {
            return Err(syntax(file, at.pos, "expected \"from\" in @value namespace"));
        };
        let ns = ns.trim();
        if !is_ident(ns) {
            return Err(syntax(file, at.pos, "invalid @value namespace name"));
        }
        let request = resolve_source(file, &from, at.pos, symbols)?;
        symbols.values.push(ValueDef {
            name: ns.to_string(),
            kind: ValueDefKind::Namespace { request },
            pos: at.pos,
        });
        return Ok(());
    }

    // `name: literal` - the colon must come before any `from` clause.
    let (head, from) = split_from(params);
    if from.is_none() {
        if let Some((name, literal)) = params.split_once(':') {
            let name = name.trim();
            if !is_ident(name) {
                return Err(syntax(file, at.pos, "invalid @value name"));
            }
            symbols.values.push(ValueDef {
                name: name.to_string(),
                kind: ValueDefKind::Literal(literal.trim().to_string()),
                pos: at.pos,
            });
            return Ok(());
        }
        return Err(syntax(file, at.pos, "expected \":\" or \"from\" in @value"));
    }

    let request = resolve_source(file, &from.unwrap(), at.pos, symbols)?;
    for name in selector::split_selectors(&head) {
        let name = name.trim();
        if !is_ident(name) {
            return Err(syntax(file, at.pos, format!("invalid @value name \"{}\"", name)));
        }
        symbols.values.push(ValueDef {
            name: name.to_string(),
            kind: ValueDefKind::Import {
                request: request.clone(),
            },
            pos: at.pos,
        });
    }

    Ok(())
}

/// `composes` grammar: `name[, name]* [from SRC]` where each name may be
/// `global(name)`.
fn parse_composes(
    file: &Path,
    owner: &str,
    value: &str,
    pos: Pos,
    symbols: &FileSymbols,
) -> Result<ComposesDecl> {
    let (head, from) = split_from(value);

    let mut targets = Vec::new();
    for part in selector::split_selectors(&head) {
        let part = part.trim();
        if let Some(inner) = part.strip_prefix("global(").and_then(|p| p.strip_suffix(')')) {
            let inner = inner.trim();
            if !is_ident(inner) {
                return Err(syntax(file, pos, format!("invalid global() reference \"{}\"", inner)));
            }
            targets.push(ComposesTarget::Global(inner.to_string()));
        } else if is_ident(part) {
            targets.push(ComposesTarget::Name(part.to_string()));
        } else {
            return Err(syntax(file, pos, format!("invalid composes reference \"{}\"", part)));
        }
    }

    if targets.is_empty() {
        return Err(syntax(file, pos, "composes requires at least one name"));
    }

    let from = match from {
        Some(source) => Some(resolve_source(file, &source, pos, symbols)?),
        None => None,
    };

    Ok(ComposesDecl {
        owner: owner.to_string(),
        targets,
        from,
        pos,
    })
}

/// `:external(a, b from SRC)` - the `from` clause is mandatory.
fn parse_external(
    file: &Path,
    args: &str,
    pos: Pos,
    symbols: &FileSymbols,
) -> Result<ExternalRef> {
    let (head, from) = split_from(args.trim());
    let Some(from) = from else {
        return Err(Error::ExternalMissingFrom {
            file: file.to_path_buf(),
        });
    };

    let mut names = Vec::new();
    for part in selector::split_selectors(&head) {
        let part = part.trim();
        if !is_ident(part) {
            return Err(syntax(file, pos, format!("invalid external reference \"{}\"", part)));
        }
        names.push(part.to_string());
    }
    if names.is_empty() {
        return Err(syntax(file, pos, "external requires at least one name"));
    }

    let request = resolve_source(file, &from, pos, symbols)?;
    Ok(ExternalRef {
        args: args.to_string(),
        names,
        request,
        pos,
    })
}

/// Turn a `from` source token into a request string. Quoted strings are
/// unquoted; bare identifiers must name a local `@value` holding a quoted
/// path (`@value simple: "./simple.css"; composes: x from simple`).
fn resolve_source(file: &Path, source: &str, pos: Pos, symbols: &FileSymbols) -> Result<String> {
    let source = source.trim();

    if let Some(unquoted) = unquote(source) {
        return Ok(unquoted);
    }

    if is_ident(source) {
        let Some(literal) = symbols.local_literal(source) else {
            return Err(Error::InvalidValue {
                detail: source.to_string(),
            });
        };
        if let Some(unquoted) = unquote(literal.trim()) {
            return Ok(unquoted);
        }
        return Err(Error::InvalidValue {
            detail: source.to_string(),
        });
    }

    Err(syntax(
        file,
        pos,
        format!("Expected source but \"{}\" found", source.chars().next().unwrap_or(' ')),
    ))
}

/// Split `text` on the first top-level `from` token.
fn split_from(text: &str) -> (String, Option<String>) {
    let chars: Vec<char> = text.chars().collect();
    let mut pos = 0;
    let mut depth = 0usize;

    while pos < chars.len() {
        match chars[pos] {
            '"' | '\'' => {
                let quote = chars[pos];
                pos += 1;
                while pos < chars.len() {
                    if chars[pos] == '\\' {
                        pos += 2;
                        continue;
                    }
                    if chars[pos] == quote {
                        pos += 1;
                        break;
                    }
                    pos += 1;
                }
            }
            '(' => {
                depth += 1;
                pos += 1;
            }
            ')' => {
                depth = depth.saturating_sub(1);
                pos += 1;
            }
            c if is_ident_char(c) => {
                let start = pos;
                while pos < chars.len() && is_ident_char(chars[pos]) {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().collect();
                if depth == 0 && word == "from" {
                    let head: String = chars[..start].iter().collect();
                    let tail: String = chars[pos..].iter().collect();
                    return (head.trim().to_string(), Some(tail.trim().to_string()));
                }
            }
            _ => pos += 1,
        }
    }

    (text.trim().to_string(), None)
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_ident_char) && !s.starts_with(|c: char| c.is_ascii_digit())
}

fn unquote(s: &str) -> Option<String> {
    let mut chars = s.chars();
    let first = chars.next()?;
    if (first == '"' || first == '\'') && s.len() >= 2 && s.ends_with(first) {
        return Some(s[1..s.len() - 1].to_string());
    }
    None
}
