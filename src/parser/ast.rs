//! Stylesheet AST - rules, at-rules, declarations, comments
//!
//! Nodes carry a [`Pos`] so later passes can report errors against the
//! original source and the printer can emit line-accurate source maps.

/// Source position of a node. `line` is 1-indexed; 0 means "synthesized".
///
/// `src` is the index of the owning source file. The parser always emits 0;
/// the output assembler rewrites it when merging multiple files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
    pub src: u32,
}

impl Pos {
    pub const NONE: Pos = Pos {
        line: 0,
        column: 0,
        src: 0,
    };

    pub fn new(line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            src: 0,
        }
    }

    /// True when the node was synthesized rather than parsed.
    pub fn is_none(&self) -> bool {
        self.line == 0
    }
}

/// A parsed stylesheet: an ordered list of top-level items.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub items: Vec<Item>,
}

/// A top-level (or block-nested) stylesheet item.
#[derive(Debug, Clone)]
pub enum Item {
    Rule(Rule),
    AtRule(AtRule),
    Comment(Comment),
}

impl Item {
    pub fn pos(&self) -> Pos {
        match self {
            Item::Rule(r) => r.pos,
            Item::AtRule(a) => a.pos,
            Item::Comment(c) => c.pos,
        }
    }

    pub fn pos_mut(&mut self) -> &mut Pos {
        match self {
            Item::Rule(r) => &mut r.pos,
            Item::AtRule(a) => &mut a.pos,
            Item::Comment(c) => &mut c.pos,
        }
    }
}

/// A style rule: selector text plus a declaration block.
#[derive(Debug, Clone)]
pub struct Rule {
    pub selector: String,
    pub items: Vec<RuleItem>,
    pub pos: Pos,
}

impl Rule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            items: Vec::new(),
            pos: Pos::NONE,
        }
    }

    /// Declarations only, skipping interleaved comments.
    pub fn decls(&self) -> impl Iterator<Item = &Declaration> {
        self.items.iter().filter_map(|item| match item {
            RuleItem::Decl(d) => Some(d),
            RuleItem::Comment(_) => None,
        })
    }
}

/// A declaration or comment inside a rule block.
#[derive(Debug, Clone)]
pub enum RuleItem {
    Decl(Declaration),
    Comment(Comment),
}

/// A single `property: value` declaration.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub prop: String,
    pub value: String,
    pub pos: Pos,
}

/// An at-rule. `block` is `None` for statement form (`@value x: y;`),
/// `Some` for block form (`@media`, `@keyframes`, ...).
#[derive(Debug, Clone)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    pub block: Option<Vec<Item>>,
    pub pos: Pos,
}

impl AtRule {
    /// `@keyframes` / vendor-prefixed `@-webkit-keyframes` and friends.
    pub fn is_keyframes(&self) -> bool {
        self.name == "keyframes"
            || (self.name.starts_with('-') && self.name.ends_with("-keyframes"))
    }
}

/// A comment, stored with its delimiters (`/* ... */`).
#[derive(Debug, Clone)]
pub struct Comment {
    pub text: String,
    pub pos: Pos,
}

/// Printed CSS plus one source-position entry per output line.
#[derive(Debug, Clone, Default)]
pub struct Printed {
    pub css: String,
    /// `(src, line)` of the node that produced each output line, if any.
    pub lines: Vec<Option<(u32, u32)>>,
}

impl Stylesheet {
    /// Render the stylesheet with 4-space indentation, one declaration per
    /// line. Output is fully determined by the AST, never by input spacing.
    pub fn print(&self) -> Printed {
        let mut out = Printed::default();
        print_items(&self.items, 0, &mut out);
        out
    }
}

fn push_line(out: &mut Printed, depth: usize, text: &str, pos: Pos) {
    for _ in 0..depth {
        out.css.push_str("    ");
    }
    out.css.push_str(text);
    out.css.push('\n');
    out.lines.push(if pos.is_none() {
        None
    } else {
        Some((pos.src, pos.line))
    });
}

fn print_items(items: &[Item], depth: usize, out: &mut Printed) {
    for item in items {
        match item {
            Item::Rule(rule) => {
                if rule.items.is_empty() {
                    push_line(out, depth, &format!("{} {{ }}", rule.selector), rule.pos);
                    continue;
                }

                push_line(out, depth, &format!("{} {{", rule.selector), rule.pos);
                for ri in &rule.items {
                    match ri {
                        RuleItem::Decl(d) => {
                            push_line(
                                out,
                                depth + 1,
                                &format!("{}: {};", d.prop, d.value),
                                d.pos,
                            );
                        }
                        RuleItem::Comment(c) => push_line(out, depth + 1, &c.text, c.pos),
                    }
                }
                push_line(out, depth, "}", Pos::NONE);
            }
            Item::AtRule(at) => {
                let header = if at.params.is_empty() {
                    format!("@{}", at.name)
                } else {
                    format!("@{} {}", at.name, at.params)
                };

                match &at.block {
                    Some(block) => {
                        push_line(out, depth, &format!("{} {{", header), at.pos);
                        print_items(block, depth + 1, out);
                        push_line(out, depth, "}", Pos::NONE);
                    }
                    None => push_line(out, depth, &format!("{};", header), at.pos),
                }
            }
            Item::Comment(c) => push_line(out, depth, &c.text, c.pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_rule_with_decls() {
        let mut rule = Rule::new(".a");
        rule.items.push(RuleItem::Decl(Declaration {
            prop: "color".into(),
            value: "red".into(),
            pos: Pos::new(1, 6),
        }));

        let sheet = Stylesheet {
            items: vec![Item::Rule(rule)],
        };

        assert_eq!(sheet.print().css, ".a {\n    color: red;\n}\n");
    }

    #[test]
    fn prints_empty_rule_inline() {
        let sheet = Stylesheet {
            items: vec![Item::Rule(Rule::new(".a"))],
        };

        assert_eq!(sheet.print().css, ".a { }\n");
    }

    #[test]
    fn tracks_line_positions() {
        let mut rule = Rule::new(".a");
        rule.pos = Pos::new(3, 1);
        rule.items.push(RuleItem::Decl(Declaration {
            prop: "color".into(),
            value: "red".into(),
            pos: Pos::new(4, 5),
        }));

        let sheet = Stylesheet {
            items: vec![Item::Rule(rule)],
        };

        let printed = sheet.print();
        assert_eq!(printed.lines[0], Some((0, 3)));
        assert_eq!(printed.lines[1], Some((0, 4)));
        assert_eq!(printed.lines[2], None); // closing brace
    }
}
