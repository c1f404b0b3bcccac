//! The token type flowing through the analysis pipeline.

/// A normalized unit of text with its source span.
///
/// Offsets are byte offsets into the analyzed text. Within one stream,
/// `start_offset` never decreases and `end_offset >= start_offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Term text.
    pub text: String,
    /// Byte offset of the first byte of the source span.
    pub start_offset: usize,
    /// Byte offset one past the last byte of the source span.
    pub end_offset: usize,
    /// Distance in positions from the previous token. Zero places the token
    /// in the same slot as its predecessor.
    pub position_increment: u32,
}

impl Token {
    /// Creates a token that advances the position by one.
    pub fn new(text: impl Into<String>, start_offset: usize, end_offset: usize) -> Self {
        Self {
            text: text.into(),
            start_offset,
            end_offset,
            position_increment: 1,
        }
    }

    /// Returns the token with a different position increment.
    pub fn with_increment(mut self, position_increment: u32) -> Self {
        self.position_increment = position_increment;
        self
    }

    /// Length of the term text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
