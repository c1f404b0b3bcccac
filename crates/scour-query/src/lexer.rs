//! Query lexer.
//!
//! Splits a query string into [`Token`]s. Words run until whitespace or one of
//! `( ) " ^`; everything else a word contains (wildcards, a `~N` suffix,
//! `::` paths, inner hyphens) is left for later stages to interpret.

use crate::error::LexError;

/// A token in the query language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A bare word. Wildcards (`*`, `?`) and a fuzzy suffix (`~`, `~N`) are
    /// kept in the text.
    Term(String),

    /// The text between a pair of double quotes.
    Phrase(String),

    /// `OR`.
    Or,

    /// `AND`.
    And,

    /// Negation: a `-` prefix or `NOT`.
    Not,

    /// Required prefix (`+`). Clauses are required by default.
    Required,

    /// `(`.
    LParen,

    /// `)`.
    RParen,

    /// `name:` in front of a value; holds `name`.
    FieldPrefix(String),

    /// `^factor` after a clause.
    Boost(f32),
}

/// Byte-offset scanner over the query text.
struct Scanner<'a> {
    /// Query text.
    input: &'a str,
    /// Byte offset of the next unread character.
    offset: usize,
}

impl<'a> Scanner<'a> {
    /// Starts scanning at the beginning of `input`.
    fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    /// The unread character at the cursor.
    fn peek(&self) -> Option<char> {
        self.input[self.offset..].chars().next()
    }

    /// Consumes one character.
    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        Some(ch)
    }

    /// Consumes characters while `keep` holds.
    fn bump_while(&mut self, mut keep: impl FnMut(char) -> bool) {
        while self.peek().is_some_and(&mut keep) {
            self.bump();
        }
    }

    /// Builds an error anchored at byte `offset`.
    fn error(&self, message: impl Into<String>, offset: usize) -> LexError {
        LexError::new(message, offset, self.input)
    }

    /// Scans the rest of the input.
    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.bump_while(char::is_whitespace);
            let Some(ch) = self.peek() else {
                return Ok(tokens);
            };
            let token = match ch {
                '"' => self.phrase()?,
                '^' => self.boost()?,
                '(' | ')' | '-' | '+' => {
                    self.bump();
                    match ch {
                        '(' => Token::LParen,
                        ')' => Token::RParen,
                        '-' => Token::Not,
                        _ => Token::Required,
                    }
                }
                _ => match self.word()? {
                    Some(token) => token,
                    None => continue,
                },
            };
            tokens.push(token);
        }
    }

    /// `"..."`. The quotes are dropped and the content kept verbatim.
    fn phrase(&mut self) -> Result<Token, LexError> {
        let open = self.offset;
        self.bump();
        let start = self.offset;
        self.bump_while(|ch| ch != '"');
        if self.peek().is_none() {
            return Err(self.error("unclosed quote", open));
        }
        let content = self.input[start..self.offset].to_string();
        self.bump();
        Ok(Token::Phrase(content))
    }

    /// A word, an operator keyword or a field prefix.
    ///
    /// A single colon closes a field name; `::` stays inside the word. A colon
    /// with nothing in front of it is skipped, and `None` is returned when that
    /// leaves the word empty.
    fn word(&mut self) -> Result<Option<Token>, LexError> {
        let mut word = String::new();
        while let Some(ch) = self.peek() {
            match ch {
                '[' | ']' | '{' | '}' => {
                    return Err(self.error("range queries are not supported", self.offset));
                }
                '(' | ')' | '"' | '^' => break,
                ':' => {
                    self.bump();
                    if self.peek() == Some(':') {
                        self.bump();
                        word.push_str("::");
                    } else if !word.is_empty() {
                        return Ok(Some(Token::FieldPrefix(word)));
                    }
                }
                ch if ch.is_whitespace() => break,
                ch => {
                    self.bump();
                    word.push(ch);
                }
            }
        }
        Ok(match word.as_str() {
            "" => None,
            "OR" => Some(Token::Or),
            "AND" => Some(Token::And),
            "NOT" => Some(Token::Not),
            _ => Some(Token::Term(word)),
        })
    }

    /// `^N` or `^N.N`.
    fn boost(&mut self) -> Result<Token, LexError> {
        let caret = self.offset;
        self.bump();
        let start = self.offset;
        let mut seen_dot = false;
        self.bump_while(|ch| {
            let dot = ch == '.' && !seen_dot;
            seen_dot |= dot;
            ch.is_ascii_digit() || dot
        });
        let number = &self.input[start..self.offset];
        if number.is_empty() {
            return Err(self.error("expected number after '^'", caret));
        }
        number
            .parse::<f32>()
            .map(Token::Boost)
            .map_err(|_| self.error(format!("invalid boost value: {number}"), caret))
    }
}

/// Splits a query string into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Scanner::new(input).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str) -> Token {
        Token::Term(text.into())
    }

    fn lex(input: &str) -> Vec<Token> {
        tokenize(input).unwrap()
    }

    #[test]
    fn whitespace_only() {
        assert!(lex("").is_empty());
        assert!(lex(" \n\t").is_empty());
    }

    #[test]
    fn words_and_phrases() {
        assert_eq!(lex("parse  xml"), vec![word("parse"), word("xml")]);
        assert_eq!(
            lex("\"void  main\" x"),
            vec![Token::Phrase("void  main".into()), word("x")]
        );
        assert_eq!(lex("größe"), vec![word("größe")]);
    }

    #[test]
    fn unclosed_quote_points_at_the_quote() {
        let err = tokenize("foo \"hello world").unwrap_err();
        assert_eq!(err.position, 4);
        assert!(err.message.contains("unclosed"));
    }

    #[test]
    fn keywords_are_upper_case_only() {
        assert_eq!(
            lex("a OR b AND NOT c"),
            vec![word("a"), Token::Or, word("b"), Token::And, Token::Not, word("c")]
        );
        assert_eq!(lex("this or that"), vec![word("this"), word("or"), word("that")]);
    }

    #[test]
    fn sign_prefixes() {
        assert_eq!(
            lex("+parse -deprecated"),
            vec![Token::Required, word("parse"), Token::Not, word("deprecated")]
        );
        assert_eq!(lex("max-width"), vec![word("max-width")]);
    }

    #[test]
    fn colons() {
        assert_eq!(
            lex("ext:java proj:\"My Project\""),
            vec![
                Token::FieldPrefix("ext".into()),
                word("java"),
                Token::FieldPrefix("proj".into()),
                Token::Phrase("My Project".into()),
            ]
        );
        assert_eq!(lex("std::io"), vec![word("std::io")]);
        assert_eq!(lex(": foo"), vec![word("foo")]);
    }

    #[test]
    fn wildcards_and_fuzzy_suffix_stay_in_the_word() {
        assert_eq!(
            lex("pars* te?t foo~ bar~1"),
            vec![word("pars*"), word("te?t"), word("foo~"), word("bar~1")]
        );
    }

    #[test]
    fn range_brackets_are_rejected() {
        let err = tokenize("modified:[1 TO 2]").unwrap_err();
        assert!(err.message.contains("range"));
        assert_eq!(err.position, 9);
        assert!(tokenize("foo{").is_err());
        assert!(tokenize("}").is_err());
    }

    #[test]
    fn boosts() {
        assert_eq!(
            lex("(parse read)^2.5"),
            vec![Token::LParen, word("parse"), word("read"), Token::RParen, Token::Boost(2.5)]
        );
        assert!(tokenize("rust^").unwrap_err().message.contains("expected number"));
        assert!(tokenize("rust^abc").is_err());
        assert_eq!(lex("a^1.5.2"), vec![word("a"), Token::Boost(1.5), word(".2")]);
    }
}
