//! Source map (revision 3) generation.
//!
//! The emitter records a mapping every time it starts a statement or prints
//! an identifier/literal; this module turns those records into the VLQ
//! `mappings` string and renders the whole map either as JSON or as the
//! inline `//# sourceMappingURL=data:...` comment appended to emitted output.
//!
//! Everything here is hand-rolled on purpose: the format is tiny and stable,
//! and keeping the encoder next to its decoder makes the round-trip testable
//! without fixtures.

/// Base64 VLQ encoding used by the `mappings` field.
pub mod vlq {
    const BASE64_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    const CONTINUATION_BIT: u32 = 0x20;
    const DIGIT_MASK: u32 = 0x1f;

    /// Encode a signed value as a base64 VLQ string.
    pub fn encode(value: i32) -> String {
        let mut out = String::new();
        encode_into(value, &mut out);
        out
    }

    /// Encode a signed value, appending to `out`.
    pub fn encode_into(value: i32, out: &mut String) {
        // Sign goes in the least significant bit.
        let mut vlq: u32 = if value < 0 {
            ((value.unsigned_abs()) << 1) | 1
        } else {
            (value as u32) << 1
        };
        loop {
            let mut digit = vlq & DIGIT_MASK;
            vlq >>= 5;
            if vlq > 0 {
                digit |= CONTINUATION_BIT;
            }
            out.push(BASE64_CHARS[digit as usize] as char);
            if vlq == 0 {
                break;
            }
        }
    }

    /// Decode one VLQ value from the front of `input`.
    ///
    /// Returns the value and the number of characters consumed, or `None`
    /// when `input` is empty or contains a non-base64 character.
    pub fn decode(input: &str) -> Option<(i32, usize)> {
        let mut result: u32 = 0;
        let mut shift = 0;
        for (i, byte) in input.bytes().enumerate() {
            let digit = BASE64_CHARS.iter().position(|&c| c == byte)? as u32;
            result |= (digit & DIGIT_MASK) << shift;
            if digit & CONTINUATION_BIT == 0 {
                let value = if result & 1 == 1 {
                    -((result >> 1) as i32)
                } else {
                    (result >> 1) as i32
                };
                return Some((value, i + 1));
            }
            shift += 5;
        }
        None
    }
}

/// Standard base64 with padding, used for the inline data URI.
pub fn base64_encode(bytes: &[u8]) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;
        out.push(CHARS[(triple >> 18) as usize & 0x3f] as char);
        out.push(CHARS[(triple >> 12) as usize & 0x3f] as char);
        if chunk.len() > 1 {
            out.push(CHARS[(triple >> 6) as usize & 0x3f] as char);
        } else {
            out.push('=');
        }
        if chunk.len() > 2 {
            out.push(CHARS[triple as usize & 0x3f] as char);
        } else {
            out.push('=');
        }
    }
    out
}

/// Escape a string for embedding in a JSON string literal.
pub fn escape_json(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

/// One recorded mapping from a generated position to an original position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mapping {
    generated_line: u32,
    generated_column: u32,
    source_index: u32,
    original_line: u32,
    original_column: u32,
}

/// Accumulates mappings and renders a revision 3 source map.
#[derive(Debug, Clone)]
pub struct SourceMapGenerator {
    file: String,
    sources: Vec<String>,
    mappings: Vec<Mapping>,
}

impl SourceMapGenerator {
    pub fn new(file: String) -> Self {
        Self {
            file,
            sources: Vec::new(),
            mappings: Vec::new(),
        }
    }

    /// Register a source file, returning its index for `add_simple_mapping`.
    pub fn add_source(&mut self, source: String) -> u32 {
        if let Some(idx) = self.sources.iter().position(|s| *s == source) {
            return idx as u32;
        }
        self.sources.push(source);
        (self.sources.len() - 1) as u32
    }

    /// Record a generated-to-original position pair (all 0-based).
    pub fn add_simple_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_index: u32,
        original_line: u32,
        original_column: u32,
    ) {
        self.mappings.push(Mapping {
            generated_line,
            generated_column,
            source_index,
            original_line,
            original_column,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Encode all recorded mappings as the semicolon/comma VLQ string.
    pub fn serialize_mappings(&self) -> String {
        let mut mappings = self.mappings.clone();
        mappings.sort_by_key(|m| (m.generated_line, m.generated_column));
        mappings.dedup();

        let mut out = String::new();
        let mut current_line = 0u32;
        let mut prev_generated_column = 0i32;
        let mut prev_source_index = 0i32;
        let mut prev_original_line = 0i32;
        let mut prev_original_column = 0i32;
        let mut first_on_line = true;

        for m in &mappings {
            while current_line < m.generated_line {
                out.push(';');
                current_line += 1;
                prev_generated_column = 0;
                first_on_line = true;
            }
            if !first_on_line {
                out.push(',');
            }
            first_on_line = false;

            vlq::encode_into(m.generated_column as i32 - prev_generated_column, &mut out);
            prev_generated_column = m.generated_column as i32;

            vlq::encode_into(m.source_index as i32 - prev_source_index, &mut out);
            prev_source_index = m.source_index as i32;

            vlq::encode_into(m.original_line as i32 - prev_original_line, &mut out);
            prev_original_line = m.original_line as i32;

            vlq::encode_into(m.original_column as i32 - prev_original_column, &mut out);
            prev_original_column = m.original_column as i32;
        }
        out
    }

    /// Render the map as a revision 3 JSON document.
    pub fn to_json(&self) -> String {
        let sources = self
            .sources
            .iter()
            .map(|s| format!("\"{}\"", escape_json(s)))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{{\"version\":3,\"file\":\"{}\",\"sources\":[{}],\"names\":[],\"mappings\":\"{}\"}}",
            escape_json(&self.file),
            sources,
            self.serialize_mappings()
        )
    }

    /// Render the map as an inline `sourceMappingURL` comment.
    pub fn to_inline_comment(&self) -> String {
        format!(
            "//# sourceMappingURL=data:application/json;base64,{}",
            base64_encode(self.to_json().as_bytes())
        )
    }
}
