//! Query parsing, construction and rewriting for scour.
//!
//! A search string goes through three stages before it reaches the index:
//!
//! 1. **Parsing** into a syntax tree ([`QueryExpr`]):
//!    - **Terms**: `parser` - words that must appear
//!    - **Phrases**: `"open file"` - exact sequences
//!    - **Negation**: `-test`, `NOT test` - terms that must NOT appear
//!    - **OR / AND**: `read OR write` - alternatives, explicit conjunction
//!    - **Grouping**: `(a b) OR (c d)` - precedence control
//!    - **Fields**: `ext:java`, `proj:core`, `modified:week`, `dir:/ws/src`
//!    - **Wildcards and fuzzy**: `pars*`, `p?rse`, `parse~1`
//!    - **Boosting**: `parser^2.5` - adjust term importance
//! 2. **Construction** of an analyzed [`Query`] by [`QueryBuilder`]: an exact
//!    form, a split form, or both combined.
//! 3. **Rewriting** by the ordered passes in [`rewrite`].
//!
//! # Example
//!
//! ```
//! use scour_query::{PASS_ORDER, QueryBuilder, RewriteContext, rewrite};
//!
//! let query = QueryBuilder::new().build("ext:JAVA parseXml", false).unwrap().unwrap();
//! let rewritten = rewrite(&query, &PASS_ORDER, &RewriteContext::default());
//! assert!(rewritten.to_string().contains("ext:java"));
//! ```

#![warn(missing_docs)]

mod ast;
mod build;
mod error;
mod expr;
mod lexer;
mod lower;
mod parser;
pub mod rewrite;
mod search_query;

pub use ast::{BooleanQuery, Clause, DEFAULT_FUZZY_DISTANCE, Occur, Query};
pub use build::{EXACT_BOOST, QueryBuilder};
pub use error::{LexError, ParseError, QueryError, QueryErrorKind};
pub use expr::QueryExpr;
pub use lexer::{Token, tokenize};
pub use lower::Lowering;
pub use parser::parse;
pub use rewrite::{
    NoWorkingSets, PASS_ORDER, Pass, QueryRewriter, RewriteContext, WorkingSets, rewrite,
    rewrite_traced,
};
pub use search_query::{CancelFlag, SearchQuery};
