//! Source text handling: line-ending normalization, offset to position
//! translation, and the caret diagnostics every error is rendered with.

use std::fmt;

/// Position in source text (line and character, both 0-indexed).
///
/// Rendered 1-indexed for humans via `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, character {}", self.line + 1, self.character + 1)
    }
}

/// Owns the program text with `\r\n` and lone `\r` normalized to `\n`, plus a
/// precomputed table of line start offsets for cheap position lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    text: String,
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(raw: &str) -> Self {
        let text = normalize_line_endings(raw);

        let mut line_starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }

        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Translate a byte offset into a (line, character) position.
    pub fn position_at(&self, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next_line) => next_line - 1,
        };
        let start = self.line_starts[line];
        let character = self.text[start..offset].chars().count();
        Position::new(line as u32, character as u32)
    }

    /// The full text of a line, without its trailing newline.
    pub fn line(&self, line: u32) -> &str {
        let Some(&start) = self.line_starts.get(line as usize) else {
            return "";
        };
        let end = match self.line_starts.get(line as usize + 1) {
            Some(&next_start) => next_start - 1,
            None => self.text.len(),
        };
        &self.text[start..end]
    }

    /// Render the line containing `position` with a caret pointing at the
    /// offending column:
    ///
    /// ```text
    /// var x = missing;
    /// ________^
    /// ```
    pub fn annotate(&self, position: Position) -> String {
        format!(
            "{}\n{}^",
            self.line(position.line),
            "_".repeat(position.character as usize)
        )
    }
}

fn normalize_line_endings(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            text.push('\n');
        } else {
            text.push(ch);
        }
    }
    text
}
