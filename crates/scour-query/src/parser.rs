//! Query parser.
//!
//! A recursive descent over the lexer's tokens. Each grammar rule is one method
//! on [`Parser`]; the rules are listed from loosest to tightest binding:
//!
//! ```text
//! query       → disjunction
//! disjunction → conjunction ("OR" conjunction)*
//! conjunction → clause (("AND")? clause)*
//! clause      → ("-" | "NOT") clause | "+" clause | atom
//! atom        → (TERM | PHRASE | scoped | group) BOOST?
//! scoped      → FIELD_PREFIX (TERM | PHRASE | group)
//! group       → "(" disjunction ")"
//! ```
//!
//! Adjacent clauses are joined with AND; `OR` must be spelled out.

use std::mem;

use crate::{
    error::{ParseError, QueryError},
    expr::QueryExpr,
    lexer::{Token, tokenize},
};

/// Cursor over a token stream.
struct Parser {
    /// Tokens produced by the lexer.
    tokens: Vec<Token>,
    /// Index of the next unconsumed token.
    cursor: usize,
}

impl Parser {
    /// Starts a parse at the first token.
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }

    /// Consumes the whole stream. An empty stream is an empty query.
    fn finish(mut self) -> Result<Option<QueryExpr>, ParseError> {
        if self.tokens.is_empty() {
            return Ok(None);
        }
        let expr = self.disjunction()?;
        match self.current() {
            Some(token) => Err(self.error(format!("unexpected token: {token:?}"))),
            None => Ok(Some(expr)),
        }
    }

    /// `conjunction ("OR" conjunction)*`
    fn disjunction(&mut self) -> Result<QueryExpr, ParseError> {
        let mut alternatives = vec![self.conjunction()?];
        while self.eat(&Token::Or) {
            alternatives.push(self.conjunction()?);
        }
        Ok(QueryExpr::or(alternatives))
    }

    /// `clause (("AND")? clause)*`
    fn conjunction(&mut self) -> Result<QueryExpr, ParseError> {
        let mut clauses = vec![self.clause()?];
        loop {
            let explicit = self.eat(&Token::And);
            if !self.at_clause_start() {
                if explicit {
                    return Err(self.error("unexpected AND (needs expression after it)"));
                }
                break;
            }
            clauses.push(self.clause()?);
        }
        Ok(QueryExpr::and(clauses))
    }

    /// Whether the next token can begin a clause.
    fn at_clause_start(&self) -> bool {
        matches!(
            self.current(),
            Some(
                Token::Term(_)
                    | Token::Phrase(_)
                    | Token::FieldPrefix(_)
                    | Token::LParen
                    | Token::Not
                    | Token::Required
            )
        )
    }

    /// Prefix operators. `+` is the default occurrence and leaves no trace.
    fn clause(&mut self) -> Result<QueryExpr, ParseError> {
        if self.eat(&Token::Not) {
            return Ok(QueryExpr::Not(Box::new(self.clause()?)));
        }
        if self.eat(&Token::Required) {
            return self.clause();
        }
        self.atom()
    }

    /// A term, phrase, field scope or group, with an optional trailing boost.
    fn atom(&mut self) -> Result<QueryExpr, ParseError> {
        let expr = match self.current().cloned() {
            Some(Token::Term(_) | Token::Phrase(_)) => self.leaf()?,
            Some(Token::FieldPrefix(name)) => {
                self.bump();
                self.scoped(name)?
            }
            Some(Token::LParen) => self.group("expected closing parenthesis")?,
            Some(Token::RParen) => return Err(self.error("unexpected closing parenthesis")),
            Some(Token::Or) => return Err(self.dangling("OR")),
            Some(Token::And) => return Err(self.dangling("AND")),
            Some(Token::Boost(_)) => return Err(self.dangling("boost")),
            Some(Token::Not | Token::Required) => return Err(self.error("unexpected operator")),
            None => return Err(ParseError::new("unexpected end of query", None)),
        };
        Ok(self.boosted(expr))
    }

    /// Wraps `expr` in a boost when a `^factor` follows it.
    fn boosted(&mut self, expr: QueryExpr) -> QueryExpr {
        match self.current() {
            Some(&Token::Boost(factor)) => {
                self.bump();
                QueryExpr::boost(expr, factor)
            }
            _ => expr,
        }
    }

    /// The value of `name:`, which must be a term, a phrase or a group.
    fn scoped(&mut self, name: String) -> Result<QueryExpr, ParseError> {
        let expr = match self.current() {
            Some(Token::Term(_) | Token::Phrase(_)) => self.leaf()?,
            Some(Token::LParen) => {
                self.group("expected closing parenthesis after field expression")?
            }
            _ => {
                return Err(self.error(format!(
                    "expected term, phrase, or group after '{name}:'"
                )));
            }
        };
        Ok(QueryExpr::Field {
            name,
            expr: Box::new(expr),
        })
    }

    /// Consumes a term or phrase token.
    fn leaf(&mut self) -> Result<QueryExpr, ParseError> {
        let expr = match self.current() {
            Some(Token::Term(text)) => QueryExpr::Term(text.clone()),
            Some(Token::Phrase(text)) => {
                let words: Vec<String> = text.split_whitespace().map(String::from).collect();
                if words.is_empty() {
                    return Err(self.error("empty phrase"));
                }
                QueryExpr::Phrase(words)
            }
            _ => return Err(self.error("expected term or phrase")),
        };
        self.bump();
        Ok(expr)
    }

    /// `"(" disjunction ")"`, reporting `unclosed` when the `)` is missing.
    fn group(&mut self, unclosed: &str) -> Result<QueryExpr, ParseError> {
        self.bump();
        let inner = self.disjunction()?;
        if !self.eat(&Token::RParen) {
            return Err(self.error(unclosed));
        }
        Ok(inner)
    }

    /// The next unconsumed token.
    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    /// Consumes the next token if it has the same kind as `kind`.
    fn eat(&mut self, kind: &Token) -> bool {
        let matched = self
            .current()
            .is_some_and(|token| mem::discriminant(token) == mem::discriminant(kind));
        if matched {
            self.bump();
        }
        matched
    }

    /// Moves past the next token.
    fn bump(&mut self) {
        self.cursor = (self.cursor + 1).min(self.tokens.len());
    }

    /// An error at the cursor.
    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, Some(self.cursor))
    }

    /// An infix operator with nothing on its left.
    fn dangling(&self, operator: &str) -> ParseError {
        self.error(format!("unexpected {operator} (needs expression before it)"))
    }
}

/// Parses a query string into a syntax tree.
///
/// Blank input yields `Ok(None)`.
pub fn parse(input: &str) -> Result<Option<QueryExpr>, QueryError> {
    let tokens = tokenize(input)?;
    Parser::new(tokens)
        .finish()
        .map_err(|err| QueryError::from(err).with_query(input))
}
