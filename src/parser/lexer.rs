//! Character cursor over CSS source with line/column tracking.

use super::ast::Pos;

/// A position-tracking cursor over the input characters.
pub struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Cursor {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    pub fn position(&self) -> Pos {
        Pos::new(self.line, self.column)
    }

    pub fn bump(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// True when the next characters are exactly `s`.
    pub fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, ch)| self.peek_at(i) == Some(ch))
    }

    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Consume a `/* ... */` comment including delimiters. Assumes the
    /// cursor sits on the opening slash. Unterminated comments run to EOF.
    pub fn consume_comment(&mut self) -> String {
        let mut text = String::new();
        text.push(self.bump().unwrap_or('/'));
        text.push(self.bump().unwrap_or('*'));
        while !self.is_eof() {
            if self.starts_with("*/") {
                text.push(self.bump().unwrap_or('*'));
                text.push(self.bump().unwrap_or('/'));
                break;
            }
            if let Some(ch) = self.bump() {
                text.push(ch);
            }
        }
        text
    }

    /// Consume a quoted string including its quotes. Assumes the cursor
    /// sits on the opening quote.
    pub fn consume_string(&mut self) -> String {
        let quote = self.bump().unwrap_or('"');
        let mut text = String::new();
        text.push(quote);
        while let Some(ch) = self.bump() {
            text.push(ch);
            if ch == '\\' {
                if let Some(escaped) = self.bump() {
                    text.push(escaped);
                }
                continue;
            }
            if ch == quote {
                break;
            }
        }
        text
    }

    /// Consume a CSS identifier (`[A-Za-z0-9_-]+`, non-ASCII allowed).
    pub fn consume_ident(&mut self) -> String {
        let mut name = String::new();
        while matches!(self.peek(), Some(c) if is_ident_char(c)) {
            name.push(self.bump().unwrap());
        }
        name
    }
}

/// Characters that may appear in a CSS identifier.
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

/// Characters that may start a CSS identifier.
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}
