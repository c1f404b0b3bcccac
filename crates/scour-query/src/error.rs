//! Error types for query syntax.
//!
//! Interactive searches never surface these; the searcher sanitizes the query
//! and retries instead. They carry a location so hosts that do show them can
//! point at the offending spot.

use std::{error::Error, fmt};

/// A query string the lexer could not split into tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// What went wrong.
    pub message: String,
    /// Byte offset into `input`.
    pub position: usize,
    /// The query being lexed.
    pub input: String,
}

impl LexError {
    /// Creates a lexer error at byte `position` of `input`.
    pub fn new(message: impl Into<String>, position: usize, input: &str) -> Self {
        Self {
            message: message.into(),
            position,
            input: input.to_string(),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.position)
    }
}

impl Error for LexError {}

/// A token sequence that does not form a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong.
    pub message: String,
    /// Index of the offending token; `None` at end of input.
    pub token_index: Option<usize>,
}

impl ParseError {
    /// Creates a parse error at `token_index`.
    pub fn new(message: impl Into<String>, token_index: Option<usize>) -> Self {
        Self {
            message: message.into(),
            token_index,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_index {
            Some(index) => write!(f, "{} at token {index}", self.message),
            None => write!(f, "{} at end of query", self.message),
        }
    }
}

impl Error for ParseError {}

/// Where in the query an error was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// While lexing, at a byte offset.
    Lex {
        /// Byte offset into the query.
        position: usize,
    },
    /// While parsing, at a token index.
    Parse {
        /// Token index, `None` at end of input.
        token_index: Option<usize>,
    },
}

/// Message fragments mapped to a hint for the user.
const HINTS: &[(&str, &str)] = &[
    ("unclosed quote", "add a closing quote (\") to complete the phrase"),
    ("closing parenthesis", "add a closing parenthesis ) to match the opening one"),
    ("range", "use modified:<n>d to restrict by modification time"),
    ("OR", "operators need expressions on both sides, e.g. 'parse OR read'"),
    ("AND", "operators need expressions on both sides, e.g. 'parse AND read'"),
];

/// A query that could not be turned into a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    /// Where the error was detected.
    pub kind: QueryErrorKind,
    /// The query text, once known.
    pub query: Option<String>,
    /// What went wrong.
    message: String,
}

impl QueryError {
    /// A lexer error at byte `position` of `query`.
    pub fn lex(message: impl Into<String>, position: usize, query: impl Into<String>) -> Self {
        Self {
            kind: QueryErrorKind::Lex { position },
            query: Some(query.into()),
            message: message.into(),
        }
    }

    /// A parser error at `token_index`, not yet tied to a query string.
    pub fn parse(message: impl Into<String>, token_index: Option<usize>) -> Self {
        Self {
            kind: QueryErrorKind::Parse { token_index },
            query: None,
            message: message.into(),
        }
    }

    /// Attaches the query text.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// The bare message, without location or hint.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// A fix for common mistakes.
    pub fn suggestion(&self) -> Option<&'static str> {
        HINTS
            .iter()
            .find(|(needle, _)| self.message.contains(needle))
            .map(|&(_, hint)| hint)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query syntax error: {}", self.message)?;
        if let Some(query) = &self.query {
            write!(f, "\n  {query}")?;
            if let QueryErrorKind::Lex { position } = self.kind {
                write!(f, "\n  {}^", " ".repeat(position.min(query.len())))?;
            }
        }
        if let Some(hint) = self.suggestion() {
            write!(f, "\nhint: {hint}")?;
        }
        Ok(())
    }
}

impl Error for QueryError {}

impl From<LexError> for QueryError {
    fn from(err: LexError) -> Self {
        Self::lex(err.message, err.position, err.input)
    }
}

impl From<ParseError> for QueryError {
    fn from(err: ParseError) -> Self {
        Self::parse(err.message, err.token_index)
    }
}
