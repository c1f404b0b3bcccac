//! Tokenizers: the first stage of every analysis chain.

use crate::token::Token;

/// Punctuation that ends a word in running text.
///
/// `.`, `-` and `_` are not separators: identifiers such as `java.util.List`
/// and `max-width` are split later by the filters.
const SEPARATORS: &[char] = &[
    '(', ')', '[', ']', '{', '}', '<', '>', '"', '\'', '`', ',', ';', ':', '!', '?', '=', '+',
    '*', '/', '\\', '|', '&', '^', '%', '#', '~', '@', '$',
];

/// Characters trimmed from both ends of a word.
const TRIM: &[char] = &['.', '-'];

/// Splits text at whitespace and sentence punctuation.
///
/// Leading and trailing dots and hyphens are trimmed, so a sentence-ending
/// period is not part of the last word.
#[derive(Debug, Clone)]
pub struct StandardTokenizer<'a> {
    /// Text being tokenized.
    text: &'a str,
    /// Byte position of the next unread character.
    cursor: usize,
}

impl<'a> StandardTokenizer<'a> {
    /// Creates a tokenizer over the given text.
    pub fn new(text: &'a str) -> Self {
        Self { text, cursor: 0 }
    }

    /// Returns true if `ch` ends a word.
    fn is_separator(ch: char) -> bool {
        ch.is_whitespace() || ch.is_control() || SEPARATORS.contains(&ch)
    }
}

impl Iterator for StandardTokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while self.cursor < self.text.len() {
            let rest = &self.text[self.cursor..];
            let skipped = rest
                .find(|ch: char| !Self::is_separator(ch))
                .unwrap_or(rest.len());
            let start = self.cursor + skipped;
            let word_len = self.text[start..]
                .find(Self::is_separator)
                .unwrap_or(self.text.len() - start);
            let end = start + word_len;
            self.cursor = end;

            let word = &self.text[start..end];
            let trimmed_start = word.trim_start_matches(TRIM);
            let trimmed = trimmed_start.trim_end_matches(TRIM);
            if trimmed.is_empty() {
                continue;
            }

            let from = start + (word.len() - trimmed_start.len());
            return Some(Token::new(trimmed, from, from + trimmed.len()));
        }
        None
    }
}

/// Emits the whole input as a single token.
///
/// Used for metadata fields, which are matched atomically.
#[derive(Debug, Clone)]
pub struct KeywordTokenizer<'a> {
    /// Remaining input; taken on first use.
    text: Option<&'a str>,
}

impl<'a> KeywordTokenizer<'a> {
    /// Creates a tokenizer over the given text.
    pub fn new(text: &'a str) -> Self {
        Self { text: Some(text) }
    }
}

impl Iterator for KeywordTokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let text = self.text.take()?;
        if text.is_empty() {
            return None;
        }
        Some(Token::new(text, 0, text.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<String> {
        StandardTokenizer::new(text).map(|t| t.text).collect()
    }

    #[test]
    fn splits_on_whitespace_and_punctuation() {
        assert_eq!(
            texts("fn main() { println!(\"hi\"); }"),
            vec!["fn", "main", "println", "hi"]
        );
    }

    #[test]
    fn keeps_dotted_and_hyphenated_words() {
        assert_eq!(
            texts("import java.util.List; max-width"),
            vec!["import", "java.util.List", "max-width"]
        );
    }

    #[test]
    fn trims_sentence_punctuation() {
        assert_eq!(texts("The end. --flag"), vec!["The", "end", "flag"]);
    }

    #[test]
    fn offsets_point_at_source() {
        let text = "  alpha (beta.)";
        for token in StandardTokenizer::new(text) {
            assert_eq!(&text[token.start_offset..token.end_offset], token.text);
        }
    }

    #[test]
    fn multibyte_text() {
        let text = "größe über";
        let tokens: Vec<_> = StandardTokenizer::new(text).collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].text, "über");
        assert_eq!(&text[tokens[1].start_offset..tokens[1].end_offset], "über");
    }

    #[test]
    fn empty_and_separator_only_input() {
        assert!(texts("").is_empty());
        assert!(texts(" ... ( ) ").is_empty());
    }

    #[test]
    fn keyword_emits_whole_input() {
        let tokens: Vec<_> = KeywordTokenizer::new("src/main.rs").collect();
        assert_eq!(tokens, vec![Token::new("src/main.rs", 0, 11)]);
        assert_eq!(KeywordTokenizer::new("").count(), 0);
    }
}
