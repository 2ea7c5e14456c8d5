//! Source map v3 generation.
//!
//! The output assembler produces one `(src, line)` entry per emitted CSS
//! line; this module turns that into the standard JSON map format with
//! base64 VLQ mappings. Column tracking is line-granular: every mapped
//! output line points at column 0 of the originating source line.

use serde::Serialize;
use std::path::Path;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// A source map v3 document, serialized as-is.
#[derive(Debug, Clone, Serialize)]
pub struct SourceMap {
    pub version: u32,
    pub file: String,
    pub sources: Vec<String>,
    #[serde(rename = "sourcesContent", skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> String {
        // SourceMap has no non-string map keys, serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// `/*# sourceMappingURL=... */` trailer with the map embedded as a
    /// base64 data URI.
    pub fn inline_comment(&self) -> String {
        let encoded = base64_encode(self.to_json().as_bytes());
        format!(
            "/*# sourceMappingURL=data:application/json;base64,{} */",
            encoded
        )
    }
}

/// Accumulates per-line mappings during output assembly.
#[derive(Debug, Default)]
pub struct MapBuilder {
    sources: Vec<String>,
    contents: Vec<String>,
    segments: Vec<Option<(u32, u32)>>,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source file, returning its index. Paths are recorded
    /// relative to `cwd` when possible.
    pub fn add_source(&mut self, cwd: &Path, path: &Path, content: &str) -> u32 {
        let display = path
            .strip_prefix(cwd)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        self.sources.push(display);
        self.contents.push(content.to_string());
        (self.sources.len() - 1) as u32
    }

    /// One entry per output line: `Some((src_index, source_line))` for lines
    /// that trace back to an input, `None` for synthesized lines.
    /// `source_line` is 1-indexed.
    pub fn push_line(&mut self, mapping: Option<(u32, u32)>) {
        self.segments.push(mapping);
    }

    pub fn build(self, file: &str, embed_contents: bool) -> SourceMap {
        let mappings = encode_mappings(&self.segments);
        SourceMap {
            version: 3,
            file: file.to_string(),
            sources: self.sources,
            sources_content: embed_contents.then_some(self.contents),
            names: Vec::new(),
            mappings,
        }
    }
}

/// Encode line-granular mappings. Fields are relative to the previous
/// segment, per the v3 format.
fn encode_mappings(segments: &[Option<(u32, u32)>]) -> String {
    let mut out = String::new();
    let mut prev_src: i64 = 0;
    let mut prev_line: i64 = 0;

    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            out.push(';');
        }
        let Some((src, line)) = segment else {
            continue;
        };
        let src = *src as i64;
        let line = (*line as i64) - 1; // the format is 0-indexed

        encode_vlq(&mut out, 0); // generated column
        encode_vlq(&mut out, src - prev_src);
        encode_vlq(&mut out, line - prev_line);
        encode_vlq(&mut out, 0); // source column

        prev_src = src;
        prev_line = line;
    }

    out
}

fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq = if value < 0 {
        (((-value) as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = (vlq & 0x1f) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0x20;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

fn base64_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;

        out.push(BASE64[(triple >> 18) as usize & 0x3f] as char);
        out.push(BASE64[(triple >> 12) as usize & 0x3f] as char);
        out.push(if chunk.len() > 1 {
            BASE64[(triple >> 6) as usize & 0x3f] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            BASE64[triple as usize & 0x3f] as char
        } else {
            '='
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn vlq_known_values() {
        let mut s = String::new();
        encode_vlq(&mut s, 0);
        assert_eq!(s, "A");

        let mut s = String::new();
        encode_vlq(&mut s, 1);
        assert_eq!(s, "C");

        let mut s = String::new();
        encode_vlq(&mut s, -1);
        assert_eq!(s, "D");

        let mut s = String::new();
        encode_vlq(&mut s, 16);
        assert_eq!(s, "gB");
    }

    #[test]
    fn base64_padding() {
        assert_eq!(base64_encode(b"a"), "YQ==");
        assert_eq!(base64_encode(b"ab"), "YWI=");
        assert_eq!(base64_encode(b"abc"), "YWJj");
    }

    #[test]
    fn mappings_skip_unmapped_lines() {
        // line 0 maps to source 0 line 1, line 1 synthesized, line 2 maps on.
        let encoded = encode_mappings(&[Some((0, 1)), None, Some((0, 2))]);
        assert_eq!(encoded, "AAAA;;AACA");
    }

    #[test]
    fn builder_relative_source_paths() {
        let mut builder = MapBuilder::new();
        let idx = builder.add_source(
            &PathBuf::from("/project"),
            &PathBuf::from("/project/css/a.css"),
            ".a { }",
        );
        assert_eq!(idx, 0);
        let map = builder.build("out.css", true);
        assert_eq!(map.sources, vec!["css/a.css".to_string()]);
        assert_eq!(map.sources_content.unwrap(), vec![".a { }".to_string()]);
        assert_eq!(map.version, 3);
    }

    #[test]
    fn inline_comment_is_data_uri() {
        let map = MapBuilder::new().build("out.css", false);
        let comment = map.inline_comment();
        assert!(comment.starts_with("/*# sourceMappingURL=data:application/json;base64,"));
        assert!(comment.ends_with(" */"));
    }
}
