//! Lexical context analysis.
//!
//! Context-aware rules only count a match when it lands in real code, not
//! inside a comment or string literal. Full parsing is out of scope; a
//! single left-to-right pass replaces comment and literal spans with spaces
//! of equal byte length, so every offset into the original content has the
//! same meaning in the stripped copy.

/// Source families recognized by the analyzer. Everything else bypasses
/// context analysis entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFamily {
    /// `//` and `/* */` comments; `'`, `"`, and backtick literals.
    CLike,
    /// `#` comments; `'`/`"` strings and their triple-quoted forms.
    Indentation,
}

impl SourceFamily {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "ts" | "jsx" | "tsx" | "mjs" | "cjs" => Some(Self::CLike),
            "py" | "pyi" => Some(Self::Indentation),
            _ => None,
        }
    }

    /// Replace comments and string literals (delimiters included) with
    /// spaces. Newlines inside spans are preserved so line structure and
    /// byte offsets survive.
    pub fn strip(self, content: &str) -> String {
        let mut out = content.as_bytes().to_vec();
        match self {
            Self::CLike => strip_c_like(content.as_bytes(), &mut out),
            Self::Indentation => strip_indentation(content.as_bytes(), &mut out),
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

/// Whether the byte at `offset` was inside a comment or string literal.
///
/// Computed as `stripped[offset] == ' ' && content[offset] != ' '`: the
/// stripping pass blanked it, and it was not blank to begin with. Offsets
/// past the end of the content report `false`.
pub fn is_in_comment_or_string(content: &str, offset: usize, ext: &str) -> bool {
    let Some(family) = SourceFamily::from_extension(ext) else {
        return false;
    };
    let stripped = family.strip(content);
    is_masked(content, &stripped, offset)
}

/// The offset check against a pre-computed stripped copy. The engine strips
/// once per evaluation and reuses the copy across every context-aware rule.
pub fn is_masked(content: &str, stripped: &str, offset: usize) -> bool {
    match (stripped.as_bytes().get(offset), content.as_bytes().get(offset)) {
        (Some(&s), Some(&c)) => s == b' ' && c != b' ',
        _ => false,
    }
}

fn blank(out: &mut [u8], index: usize) {
    if out[index] != b'\n' {
        out[index] = b' ';
    }
}

/// Blank a quoted span starting at the opening delimiter. Honors backslash
/// escapes. When `spans_lines` is false the span is abandoned at a raw
/// newline (an unterminated single-line literal). Returns the index of the
/// first byte after the span.
fn blank_quoted(bytes: &[u8], out: &mut [u8], start: usize, quote: u8, spans_lines: bool) -> usize {
    blank(out, start);
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => {
                blank(out, i);
                blank(out, i + 1);
                i += 2;
            }
            b if b == quote => {
                blank(out, i);
                return i + 1;
            }
            b'\n' if !spans_lines => return i,
            _ => {
                blank(out, i);
                i += 1;
            }
        }
    }
    bytes.len()
}

/// Blank a triple-quoted span (`"""` or `'''`) starting at its first quote.
fn blank_triple_quoted(bytes: &[u8], out: &mut [u8], start: usize, quote: u8) -> usize {
    for offset in 0..3 {
        blank(out, start + offset);
    }
    let mut i = start + 3;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            blank(out, i);
            blank(out, i + 1);
            i += 2;
            continue;
        }
        if bytes[i] == quote && bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote)
        {
            for offset in 0..3 {
                blank(out, i + offset);
            }
            return i + 3;
        }
        blank(out, i);
        i += 1;
    }
    bytes.len()
}

/// Blank from `start` to the end of the line (newline excluded).
fn blank_line_from(bytes: &[u8], out: &mut [u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && bytes[i] != b'\n' {
        blank(out, i);
        i += 1;
    }
    i
}

fn strip_c_like(bytes: &[u8], out: &mut [u8]) {
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'`' => i = blank_quoted(bytes, out, i, b'`', true),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                blank(out, i);
                blank(out, i + 1);
                let mut j = i + 2;
                loop {
                    if j >= bytes.len() {
                        i = bytes.len();
                        break;
                    }
                    if bytes[j] == b'*' && bytes.get(j + 1) == Some(&b'/') {
                        blank(out, j);
                        blank(out, j + 1);
                        i = j + 2;
                        break;
                    }
                    blank(out, j);
                    j += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = blank_line_from(bytes, out, i),
            b'"' => i = blank_quoted(bytes, out, i, b'"', false),
            b'\'' => i = blank_quoted(bytes, out, i, b'\'', false),
            _ => i += 1,
        }
    }
}

fn strip_indentation(bytes: &[u8], out: &mut [u8]) {
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'')
                if bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote) =>
            {
                i = blank_triple_quoted(bytes, out, i, quote);
            }
            b'#' => i = blank_line_from(bytes, out, i),
            b'"' => i = blank_quoted(bytes, out, i, b'"', false),
            b'\'' => i = blank_quoted(bytes, out, i, b'\'', false),
            _ => i += 1,
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
