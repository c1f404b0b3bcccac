//! Bridge from the scour analysis pipeline to Tantivy's tokenizer API.
//!
//! The tokenizer registered under [`SCOUR_TOKENIZER`] runs the indexing analyzer over
//! `contents` and turns position increments into absolute positions, so split siblings
//! share a position and phrase queries see the same slots the query side produces.

use std::vec;

use scour_analysis::{Analyzer, FieldName};
use tantivy::tokenizer::{TextAnalyzer, Token, TokenStream, Tokenizer};

/// Name of the custom tokenizer registered with Tantivy.
pub const SCOUR_TOKENIZER: &str = "scour_code";

/// Tantivy tokenizer backed by a scour [`Analyzer`].
#[derive(Debug, Clone, Copy)]
pub struct ScourTokenizer {
    /// Analyzer applied to every text value.
    analyzer: Analyzer,
}

impl ScourTokenizer {
    /// Wraps an analyzer.
    pub fn new(analyzer: Analyzer) -> Self {
        Self { analyzer }
    }
}

impl Tokenizer for ScourTokenizer {
    type TokenStream<'a> = ScourTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        let mut position: Option<usize> = None;
        let tokens: Vec<Token> = self
            .analyzer
            .token_stream(&FieldName::contents(), text)
            .map(|token| {
                let increment = token.position_increment as usize;
                let next = match position {
                    Some(previous) => previous + increment,
                    None => increment.saturating_sub(1),
                };
                position = Some(next);
                Token {
                    offset_from: token.start_offset,
                    offset_to: token.end_offset,
                    position: next,
                    text: token.text,
                    position_length: 1,
                }
            })
            .collect();

        ScourTokenStream {
            tokens: tokens.into_iter(),
            token: Token::default(),
        }
    }
}

/// Pre-analyzed tokens handed to Tantivy one at a time.
pub struct ScourTokenStream {
    /// Tokens not yet emitted.
    tokens: vec::IntoIter<Token>,
    /// Current token.
    token: Token,
}

impl TokenStream for ScourTokenStream {
    fn advance(&mut self) -> bool {
        match self.tokens.next() {
            Some(token) => {
                self.token = token;
                true
            }
            None => false,
        }
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }
}

/// Builds the Tantivy text analyzer for `contents`.
pub fn build_analyzer(analyzer: Analyzer) -> TextAnalyzer {
    TextAnalyzer::builder(ScourTokenizer::new(analyzer)).build()
}

#[cfg(test)]
mod test {
    use std::iter;

    use super::*;

    /// Collects `(text, position)` pairs from the analyzer.
    fn positions(text: &str) -> Vec<(String, usize)> {
        let mut analyzer = build_analyzer(Analyzer::indexing());
        let mut stream = analyzer.token_stream(text);
        iter::from_fn(|| stream.next().map(|t| (t.text.clone(), t.position))).collect()
    }

    #[test]
    fn splits_and_lowercases_identifiers() {
        let tokens: Vec<String> = positions("parseXmlDocument(doc)")
            .into_iter()
            .map(|(text, _)| text)
            .collect();
        assert_eq!(tokens, vec!["parse", "xml", "document", "doc"]);
    }

    #[test]
    fn split_siblings_share_a_position() {
        assert_eq!(
            positions("com.example.Foo next"),
            vec![
                ("com".to_string(), 0),
                ("example".to_string(), 0),
                ("foo".to_string(), 0),
                ("next".to_string(), 1),
            ]
        );
    }

    #[test]
    fn offsets_point_into_source() {
        let text = "fooBar baz";
        let mut analyzer = build_analyzer(Analyzer::indexing());
        let mut stream = analyzer.token_stream(text);
        let mut spans = Vec::new();
        while stream.advance() {
            let token = stream.token();
            spans.push(&text[token.offset_from..token.offset_to]);
        }
        assert_eq!(spans, vec!["foo", "Bar", "baz"]);
    }

    #[test]
    fn empty_text_has_no_tokens() {
        assert!(positions("  ").is_empty());
    }
}
