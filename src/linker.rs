//! Symbol & composition resolver
//!
//! Takes one file's parsed stylesheet plus its extracted symbols, resolves
//! every cross-reference against already-linked dependencies, renames local
//! symbols through the namer, rewrites the AST, and produces the file's
//! export table.
//!
//! Resolution order inside a file:
//! 1. `@value` environment (locals, imports, namespaces, in document order)
//! 2. export table (own scoped name first, then composed names)
//! 3. AST rewrite (value substitution, selector scoping, keyframe renames,
//!    `:external` replacement, compose-only rule pruning)

use crate::namer::{NameCache, Namer};
use crate::parser::ast::{Item, Rule, RuleItem, Stylesheet};
use crate::parser::lexer::is_ident_char;
use crate::selector::{self, RewriteError, SelEvent};
use crate::symbols::{ComposesTarget, FileSymbols, ValueDefKind};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// The linked view of a dependency: what the current file may reference.
#[derive(Debug, Clone, Default)]
pub struct DepExports {
    /// Original selector name -> ordered scoped identifier list.
    pub exports: BTreeMap<String, Vec<String>>,
    /// Exported `@value` name -> resolved literal.
    pub values: BTreeMap<String, String>,
}

/// Result of linking one file.
#[derive(Debug, Clone)]
pub struct Linked {
    pub sheet: Stylesheet,
    pub exports: BTreeMap<String, Vec<String>>,
    pub values: BTreeMap<String, String>,
}

/// Link one file against its resolved dependencies.
///
/// `resolved` maps raw request strings (as written in the source) to the
/// absolute paths the resolver chain produced; `deps` holds the linked
/// exports of every file reachable through those paths.
pub fn link(
    file: &Path,
    sheet: Stylesheet,
    symbols: &FileSymbols,
    resolved: &HashMap<String, PathBuf>,
    deps: &BTreeMap<PathBuf, DepExports>,
    namer: &Namer,
    cache: &mut NameCache,
) -> Result<Linked> {
    let dep_of = |request: &str| lookup_dep(file, resolved, deps, request);

    // 1. Value environment.
    let mut env: BTreeMap<String, String> = BTreeMap::new();
    let mut exported_values: BTreeMap<String, String> = BTreeMap::new();

    for def in &symbols.values {
        match &def.kind {
            ValueDefKind::Literal(literal) => {
                let resolved_literal = substitute_idents(literal, &env);
                env.insert(def.name.clone(), resolved_literal.clone());
                exported_values.insert(def.name.clone(), resolved_literal);
            }
            ValueDefKind::Import { request } => {
                let dep = dep_of(request)?;
                let Some(value) = dep.values.get(&def.name) else {
                    return Err(Error::InvalidValue {
                        detail: def.name.clone(),
                    });
                };
                env.insert(def.name.clone(), value.clone());
                // Imported values re-export through this file.
                exported_values.insert(def.name.clone(), value.clone());
            }
            ValueDefKind::Namespace { request } => {
                let dep = dep_of(request)?;
                for (name, value) in &dep.values {
                    env.insert(format!("{}.{}", def.name, name), value.clone());
                }
            }
        }
    }

    // 2. Export table.
    let exports = build_exports(file, symbols, &dep_of, namer, cache)?;

    // 3. AST rewrite.
    let mut rewriter = Rewriter {
        file,
        symbols,
        env: &env,
        dep_of: &dep_of,
        namer,
        cache,
    };
    let mut items = sheet.items;
    rewriter.rewrite_items(&mut items, false)?;

    Ok(Linked {
        sheet: Stylesheet { items },
        exports,
        values: exported_values,
    })
}

fn lookup_dep<'d>(
    file: &Path,
    resolved: &HashMap<String, PathBuf>,
    deps: &'d BTreeMap<PathBuf, DepExports>,
    request: &str,
) -> Result<&'d DepExports> {
    let missing = || Error::UnableToLocate {
        request: request.to_string(),
        from: file.to_path_buf(),
    };
    let path = resolved.get(request).ok_or_else(missing)?;
    deps.get(path).ok_or_else(missing)
}

/// Export entries: own scoped name first, then every composed name in
/// declaration order, deduplicated. Local composition is transitive and
/// must be acyclic.
fn build_exports<'d>(
    file: &Path,
    symbols: &FileSymbols,
    dep_of: &impl Fn(&str) -> Result<&'d DepExports>,
    namer: &Namer,
    cache: &mut NameCache,
) -> Result<BTreeMap<String, Vec<String>>> {
    let mut exports: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut memo: HashMap<String, Vec<String>> = HashMap::new();

    let locals: Vec<&String> = symbols.classes.iter().chain(symbols.ids.iter()).collect();
    for name in &locals {
        let mut visiting = HashSet::new();
        let entry = resolve_local(
            file, name, symbols, dep_of, namer, cache, &mut memo, &mut visiting,
        )?;
        exports.insert((*name).clone(), entry);
    }

    // Global selectors pass through unscoped, but still appear in the
    // export table so downstream consumers can reference them.
    for name in &symbols.globals {
        exports
            .entry(name.clone())
            .or_insert_with(|| vec![name.clone()]);
    }

    Ok(exports)
}

#[allow(clippy::too_many_arguments)]
fn resolve_local<'d>(
    file: &Path,
    name: &str,
    symbols: &FileSymbols,
    dep_of: &impl Fn(&str) -> Result<&'d DepExports>,
    namer: &Namer,
    cache: &mut NameCache,
    memo: &mut HashMap<String, Vec<String>>,
    visiting: &mut HashSet<String>,
) -> Result<Vec<String>> {
    if let Some(entry) = memo.get(name) {
        return Ok(entry.clone());
    }
    if !visiting.insert(name.to_string()) {
        return Err(Error::CircularReference {
            from: file.to_path_buf(),
            to: file.to_path_buf(),
        });
    }

    let mut entry = vec![cache.scoped(namer, file, name)];

    for decl in symbols.composes.iter().filter(|d| d.owner == name) {
        for target in &decl.targets {
            match target {
                ComposesTarget::Global(global) => entry.push(global.clone()),
                ComposesTarget::Name(target_name) => match &decl.from {
                    Some(request) => {
                        let dep = dep_of(request)?;
                        let Some(list) = dep.exports.get(target_name) else {
                            return Err(Error::InvalidComposesReference {
                                name: target_name.clone(),
                            });
                        };
                        entry.extend(list.iter().cloned());
                    }
                    None => {
                        let is_local = symbols.classes.iter().any(|c| c == target_name)
                            || symbols.ids.iter().any(|c| c == target_name);
                        if is_local {
                            entry.extend(resolve_local(
                                file,
                                target_name,
                                symbols,
                                dep_of,
                                namer,
                                cache,
                                memo,
                                visiting,
                            )?);
                        } else if symbols.globals.iter().any(|g| g == target_name) {
                            entry.push(target_name.clone());
                        } else {
                            return Err(Error::InvalidComposesReference {
                                name: target_name.clone(),
                            });
                        }
                    }
                },
            }
        }
    }

    visiting.remove(name);
    let entry = dedup_preserving_order(entry);
    memo.insert(name.to_string(), entry.clone());
    Ok(entry)
}

pub(crate) fn dedup_preserving_order(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

struct Rewriter<'a> {
    file: &'a Path,
    symbols: &'a FileSymbols,
    env: &'a BTreeMap<String, String>,
    dep_of: &'a dyn Fn(&str) -> Result<&'a DepExports>,
    namer: &'a Namer,
    cache: &'a mut NameCache,
}

impl<'a> Rewriter<'a> {
    fn rewrite_items(&mut self, items: &mut Vec<Item>, in_keyframes: bool) -> Result<()> {
        let mut index = 0;
        while index < items.len() {
            let remove = match &mut items[index] {
                Item::Rule(rule) => self.rewrite_rule(rule, in_keyframes)?,
                Item::AtRule(at) => {
                    if at.name == "value" {
                        true
                    } else if at.is_keyframes() {
                        at.params = self.rewrite_keyframes_params(&at.params);
                        if let Some(block) = &mut at.block {
                            self.rewrite_items(block, true)?;
                        }
                        false
                    } else {
                        at.params = substitute_idents(&at.params, self.env);
                        if let Some(block) = &mut at.block {
                            self.rewrite_items(block, in_keyframes)?;
                        }
                        false
                    }
                }
                Item::Comment(_) => false,
            };

            if remove {
                items.remove(index);
            } else {
                index += 1;
            }
        }
        Ok(())
    }

    /// Returns true when the rule should be pruned from the output.
    fn rewrite_rule(&mut self, rule: &mut Rule, in_keyframes: bool) -> Result<bool> {
        // Keyframe steps (`from`, `50%`) keep their selectors.
        if !in_keyframes {
            rule.selector = self.rewrite_selector(&rule.selector)?;
        }

        let mut had_composes = false;
        rule.items.retain_mut(|item| match item {
            RuleItem::Decl(decl) => {
                if decl.prop == "composes" {
                    had_composes = true;
                    return false;
                }
                decl.value = substitute_idents(&decl.value, self.env);
                true
            }
            RuleItem::Comment(_) => true,
        });

        // Animation renames run after value substitution so a value that
        // expands to a keyframe name still gets scoped.
        if !self.symbols.keyframes.is_empty() {
            let mut map = BTreeMap::new();
            for name in self.symbols.keyframes.clone() {
                let scoped = self.cache.scoped(self.namer, self.file, &name);
                map.insert(name, scoped);
            }

            for item in &mut rule.items {
                if let RuleItem::Decl(decl) = item {
                    if is_animation_prop(&decl.prop) {
                        decl.value = substitute_idents(&decl.value, &map);
                    }
                }
            }
        }

        // A rule that only composed carries no styling of its own; the
        // relationship lives on in the export table.
        let no_decls = rule.decls().next().is_none();
        Ok(had_composes && no_decls)
    }

    fn rewrite_selector(&mut self, sel: &str) -> Result<String> {
        let result = selector::rewrite(sel, &mut |event| match event {
            SelEvent::Class { name, global } | SelEvent::Id { name, global } => {
                if global {
                    Ok(None)
                } else {
                    Ok(Some(self.cache.scoped(self.namer, self.file, name)))
                }
            }
            SelEvent::External { args } => Ok(Some(self.resolve_external(args)?)),
        });

        match result {
            Ok(rewritten) => Ok(rewritten),
            Err(RewriteError::EmptyGlobal) => Err(Error::EmptyGlobal {
                file: self.file.to_path_buf(),
            }),
            Err(RewriteError::Unbalanced) => Err(Error::Syntax {
                file: self.file.to_path_buf(),
                line: 0,
                detail: format!("unbalanced selector \"{}\"", sel),
            }),
            Err(RewriteError::Visitor(err)) => Err(err),
        }
    }

    /// Replace `:external(names from "./file")` with the target file's
    /// scoped class selector(s). Value identifiers substitute first.
    fn resolve_external(&self, args: &str) -> Result<String> {
        // Extraction walked the same selectors, so every occurrence has a
        // matching reference keyed by its raw argument text.
        let Some(ext) = self.symbols.externals.iter().find(|ext| ext.args == args) else {
            return Err(Error::ExternalMissingFrom {
                file: self.file.to_path_buf(),
            });
        };

        let dep = (self.dep_of)(&ext.request)?;
        let mut out = String::new();
        for name in &ext.names {
            let effective = self.env.get(name).map(String::as_str).unwrap_or(name);
            let Some(list) = dep.exports.get(effective) else {
                return Err(Error::InvalidExternalReference {
                    name: effective.to_string(),
                });
            };
            out.push('.');
            out.push_str(&list[0]);
        }
        Ok(out)
    }

    fn rewrite_keyframes_params(&mut self, params: &str) -> String {
        let mut parts = params.split_whitespace();
        let Some(name) = parts.next() else {
            return params.to_string();
        };
        let scoped = self.cache.scoped(self.namer, self.file, name);
        let rest: Vec<&str> = parts.collect();
        if rest.is_empty() {
            scoped
        } else {
            format!("{} {}", scoped, rest.join(" "))
        }
    }
}

/// Vendor-prefix-aware `animation` / `animation-name` detection.
fn is_animation_prop(prop: &str) -> bool {
    let base = if prop.starts_with('-') {
        match prop[1..].find('-') {
            Some(idx) => &prop[idx + 2..],
            None => prop,
        }
    } else {
        prop
    };
    base == "animation" || base == "animation-name"
}

/// Replace identifier tokens (including dotted `ns.name` tokens) found in
/// `map`, leaving every other character untouched. Quoted strings are
/// copied verbatim. Purely textual, no coercion.
pub fn substitute_idents(text: &str, map: &BTreeMap<String, String>) -> String {
    if map.is_empty() {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];

        if ch == '"' || ch == '\'' {
            let quote = ch;
            out.push(ch);
            pos += 1;
            while pos < chars.len() {
                let inner = chars[pos];
                out.push(inner);
                pos += 1;
                if inner == '\\' {
                    if pos < chars.len() {
                        out.push(chars[pos]);
                        pos += 1;
                    }
                    continue;
                }
                if inner == quote {
                    break;
                }
            }
            continue;
        }

        if is_ident_char(ch) || ch == '.' {
            let start = pos;
            while pos < chars.len() && (is_ident_char(chars[pos]) || chars[pos] == '.') {
                pos += 1;
            }
            let token: String = chars[start..pos].iter().collect();
            match map.get(&token) {
                Some(replacement) => out.push_str(replacement),
                None => out.push_str(&token),
            }
            continue;
        }

        out.push(ch);
        pos += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use crate::symbols;

    fn link_single(css: &str) -> Linked {
        try_link_single(css).unwrap()
    }

    fn try_link_single(css: &str) -> Result<Linked> {
        let file = PathBuf::from("/test.css");
        let sheet = parser::parse(&file, css)?;
        let syms = symbols::extract(&file, &sheet)?;
        let mut cache = NameCache::new();
        link(
            &file,
            sheet,
            &syms,
            &HashMap::new(),
            &BTreeMap::new(),
            &Namer::Custom(std::sync::Arc::new(|_, name| format!("s_{}", name))),
            &mut cache,
        )
    }

    #[test]
    fn exports_own_name_then_composed() {
        let linked = link_single(".a { color: red; }\n.b { composes: a; }");
        assert_eq!(
            linked.exports.get("b").unwrap(),
            &vec!["s_b".to_string(), "s_a".to_string()]
        );
    }

    #[test]
    fn transitive_composition() {
        let linked = link_single(
            ".c { color: red; }\n.b { composes: c; }\n.a {\n  composes: b;\n  color: blue;\n}",
        );
        assert_eq!(
            linked.exports.get("a").unwrap(),
            &vec!["s_a".to_string(), "s_b".to_string(), "s_c".to_string()]
        );
    }

    #[test]
    fn compose_only_rules_pruned_but_exported() {
        let linked = link_single(".booga { color: red }\n.fooga { composes: booga }\n.fooga:hover { color: blue }");
        let css = linked.sheet.print().css;
        assert!(css.contains(".s_booga"));
        assert!(!css.contains(".s_fooga {\n"));
        assert!(css.contains(".s_fooga:hover"));
        assert_eq!(
            linked.exports.get("fooga").unwrap(),
            &vec!["s_fooga".to_string(), "s_booga".to_string()]
        );
    }

    #[test]
    fn missing_local_target_rejected() {
        let err = try_link_single(".a { composes: b; }").unwrap_err();
        assert!(err.to_string().contains("Invalid composes reference"));
    }

    #[test]
    fn global_composition_uses_raw_name() {
        let linked = link_single(".a { composes: global(b); }");
        assert_eq!(
            linked.exports.get("a").unwrap(),
            &vec!["s_a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn value_substitution_in_decls() {
        let linked = link_single("@value a: red;\n.x { color: a; }");
        let css = linked.sheet.print().css;
        assert!(css.contains("color: red;"));
        assert!(!css.contains("@value"));
        assert_eq!(linked.values.get("a").unwrap(), "red");
    }

    #[test]
    fn value_substitution_respects_boundaries() {
        let linked = link_single("@value o: one;\n.x { background: one; }");
        let css = linked.sheet.print().css;
        // `o` must not replace inside `one`
        assert!(css.contains("background: one;"));
    }

    #[test]
    fn value_composition_in_literals() {
        let linked = link_single("@value base: 4px;\n@value double: base base;\n.x { padding: double; }");
        let css = linked.sheet.print().css;
        assert!(css.contains("padding: 4px 4px;"));
    }

    #[test]
    fn keyframes_and_animation_renamed_together() {
        let linked = link_single("@keyframes a { }\n.b { animation: a; }");
        let css = linked.sheet.print().css;
        assert!(css.contains("@keyframes s_a"));
        assert!(css.contains("animation: s_a;"));
    }

    #[test]
    fn multiple_animations_rewritten() {
        let linked = link_single(
            "@keyframes a { }\n@keyframes b { }\n.c { animation: a 10s linear, b 0.2s infinite; }",
        );
        let css = linked.sheet.print().css;
        assert!(css.contains("animation: s_a 10s linear, s_b 0.2s infinite;"));
    }

    #[test]
    fn unknown_animation_names_left_alone() {
        let linked = link_single(".a { animation: a; }\n.b { animation-name: b; }");
        let css = linked.sheet.print().css;
        assert!(css.contains("animation: a;"));
        assert!(css.contains("animation-name: b;"));
    }

    #[test]
    fn prefixed_keyframes_renamed() {
        let linked = link_single("@-webkit-keyframes a { }\n.b { animation: a; }");
        let css = linked.sheet.print().css;
        assert!(css.contains("@-webkit-keyframes s_a"));
        assert!(css.contains("animation: s_a;"));
    }

    #[test]
    fn animation_name_property_rewritten() {
        let linked = link_single("@keyframes a { }\n.b { animation-name: a; }");
        assert!(linked.sheet.print().css.contains("animation-name: s_a;"));
    }

    #[test]
    fn globals_stay_unscoped() {
        let linked = link_single(":global(.g1) { color: red; }\n.b :global(.g2) { color: blue; }");
        let css = linked.sheet.print().css;
        assert!(css.contains(".g1 {"));
        assert!(css.contains(".s_b .g2 {"));
        assert_eq!(linked.exports.get("g1").unwrap(), &vec!["g1".to_string()]);
    }

    #[test]
    fn cross_file_composition() {
        let file = PathBuf::from("/a.css");
        let css = ".x { composes: y from \"./b.css\"; color: red; }";
        let sheet = parser::parse(&file, css).unwrap();
        let syms = symbols::extract(&file, &sheet).unwrap();

        let mut resolved = HashMap::new();
        resolved.insert("./b.css".to_string(), PathBuf::from("/b.css"));

        let mut deps = BTreeMap::new();
        deps.insert(
            PathBuf::from("/b.css"),
            DepExports {
                exports: BTreeMap::from([("y".to_string(), vec!["s_y".to_string()])]),
                values: BTreeMap::new(),
            },
        );

        let mut cache = NameCache::new();
        let linked = link(
            &file,
            sheet,
            &syms,
            &resolved,
            &deps,
            &Namer::Custom(std::sync::Arc::new(|_, name| format!("s_{}", name))),
            &mut cache,
        )
        .unwrap();

        assert_eq!(
            linked.exports.get("x").unwrap(),
            &vec!["s_x".to_string(), "s_y".to_string()]
        );
    }

    #[test]
    fn cross_file_missing_name_rejected() {
        let file = PathBuf::from("/a.css");
        let css = ".x { composes: nope from \"./b.css\"; }";
        let sheet = parser::parse(&file, css).unwrap();
        let syms = symbols::extract(&file, &sheet).unwrap();

        let mut resolved = HashMap::new();
        resolved.insert("./b.css".to_string(), PathBuf::from("/b.css"));
        let mut deps = BTreeMap::new();
        deps.insert(PathBuf::from("/b.css"), DepExports::default());

        let mut cache = NameCache::new();
        let err = link(
            &file,
            sheet,
            &syms,
            &resolved,
            &deps,
            &Namer::Default,
            &mut cache,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidComposesReference { name } if name == "nope"));
    }

    #[test]
    fn external_replaced_with_scoped_selector() {
        let file = PathBuf::from("/a.css");
        let css = ":external(y from \"./b.css\") { color: red; }";
        let sheet = parser::parse(&file, css).unwrap();
        let syms = symbols::extract(&file, &sheet).unwrap();

        let mut resolved = HashMap::new();
        resolved.insert("./b.css".to_string(), PathBuf::from("/b.css"));
        let mut deps = BTreeMap::new();
        deps.insert(
            PathBuf::from("/b.css"),
            DepExports {
                exports: BTreeMap::from([("y".to_string(), vec!["s_y".to_string()])]),
                values: BTreeMap::new(),
            },
        );

        let mut cache = NameCache::new();
        let linked = link(
            &file,
            sheet,
            &syms,
            &resolved,
            &deps,
            &Namer::Default,
            &mut cache,
        )
        .unwrap();
        assert!(linked.sheet.print().css.contains(".s_y {"));
    }

    #[test]
    fn external_unknown_name_rejected() {
        let file = PathBuf::from("/a.css");
        let css = ":external(nopenopenope from \"./b.css\") { color: red; }";
        let sheet = parser::parse(&file, css).unwrap();
        let syms = symbols::extract(&file, &sheet).unwrap();

        let mut resolved = HashMap::new();
        resolved.insert("./b.css".to_string(), PathBuf::from("/b.css"));
        let mut deps = BTreeMap::new();
        deps.insert(PathBuf::from("/b.css"), DepExports::default());

        let mut cache = NameCache::new();
        let err = link(
            &file,
            sheet,
            &syms,
            &resolved,
            &deps,
            &Namer::Default,
            &mut cache,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid external reference: nopenopenope"));
    }

    #[test]
    fn externals_with_same_name_resolve_per_file() {
        let file = PathBuf::from("/a.css");
        let css = ":external(x from \"./b.css\") { margin: 1px; }\n\
                   :external(x from \"./c.css\") { margin: 2px; }";
        let sheet = parser::parse(&file, css).unwrap();
        let syms = symbols::extract(&file, &sheet).unwrap();

        let mut resolved = HashMap::new();
        resolved.insert("./b.css".to_string(), PathBuf::from("/b.css"));
        resolved.insert("./c.css".to_string(), PathBuf::from("/c.css"));
        let mut deps = BTreeMap::new();
        deps.insert(
            PathBuf::from("/b.css"),
            DepExports {
                exports: BTreeMap::from([("x".to_string(), vec!["b_x".to_string()])]),
                values: BTreeMap::new(),
            },
        );
        deps.insert(
            PathBuf::from("/c.css"),
            DepExports {
                exports: BTreeMap::from([("x".to_string(), vec!["c_x".to_string()])]),
                values: BTreeMap::new(),
            },
        );

        let mut cache = NameCache::new();
        let linked = link(
            &file,
            sheet,
            &syms,
            &resolved,
            &deps,
            &Namer::Default,
            &mut cache,
        )
        .unwrap();

        let css = linked.sheet.print().css;
        assert!(css.contains(".b_x {\n    margin: 1px;"));
        assert!(css.contains(".c_x {\n    margin: 2px;"));
    }

    #[test]
    fn external_name_substitutes_values() {
        let file = PathBuf::from("/a.css");
        let css = "@value alias: y;\n:external(alias from \"./b.css\") { color: red; }";
        let sheet = parser::parse(&file, css).unwrap();
        let syms = symbols::extract(&file, &sheet).unwrap();

        let mut resolved = HashMap::new();
        resolved.insert("./b.css".to_string(), PathBuf::from("/b.css"));
        let mut deps = BTreeMap::new();
        deps.insert(
            PathBuf::from("/b.css"),
            DepExports {
                exports: BTreeMap::from([("y".to_string(), vec!["s_y".to_string()])]),
                values: BTreeMap::new(),
            },
        );

        let mut cache = NameCache::new();
        let linked = link(
            &file,
            sheet,
            &syms,
            &resolved,
            &deps,
            &Namer::Default,
            &mut cache,
        )
        .unwrap();
        assert!(linked.sheet.print().css.contains(".s_y {"));
    }

    #[test]
    fn animation_prop_detection() {
        assert!(is_animation_prop("animation"));
        assert!(is_animation_prop("animation-name"));
        assert!(is_animation_prop("-webkit-animation"));
        assert!(is_animation_prop("-moz-animation-name"));
        assert!(!is_animation_prop("animation-duration"));
        assert!(!is_animation_prop("background"));
    }

    #[test]
    fn namespace_values_substituted() {
        let file = PathBuf::from("/a.css");
        let css = "@value * as colors from \"./colors.css\";\n.x { color: colors.primary; }";
        let sheet = parser::parse(&file, css).unwrap();
        let syms = symbols::extract(&file, &sheet).unwrap();

        let mut resolved = HashMap::new();
        resolved.insert("./colors.css".to_string(), PathBuf::from("/colors.css"));
        let mut deps = BTreeMap::new();
        deps.insert(
            PathBuf::from("/colors.css"),
            DepExports {
                exports: BTreeMap::new(),
                values: BTreeMap::from([("primary".to_string(), "blue".to_string())]),
            },
        );

        let mut cache = NameCache::new();
        let linked = link(
            &file,
            sheet,
            &syms,
            &resolved,
            &deps,
            &Namer::Default,
            &mut cache,
        )
        .unwrap();
        assert!(linked.sheet.print().css.contains("color: blue;"));
    }
}
