//! Field model and text analysis for scour.
//!
//! Turns raw text into the normalized tokens stored in (and looked up from) the
//! inverted index:
//!
//! - **Fields**: the closed set of channels every indexed file is split into
//! - **Tokens**: text plus byte offsets and a position increment
//! - **Filters**: composable iterator stages (word, dot and camel-case splitting,
//!   length bounds, lowercasing)
//! - **Analyzers**: the fixed chains used for indexing, querying, literal input
//!   and keyword fields
//!
//! # Example
//!
//! ```
//! use scour_analysis::{Analyzer, Field, FieldName};
//!
//! let analyzer = Analyzer::indexing();
//! let terms: Vec<String> = analyzer
//!     .token_stream(&FieldName::Doc(Field::Contents), "parseXmlDocument(doc)")
//!     .map(|t| t.text)
//!     .collect();
//! assert_eq!(terms, vec!["parse", "xml", "document", "doc"]);
//! ```

#![warn(missing_docs)]

mod analyzer;
mod error;
mod field;
mod filter;
mod token;
mod tokenizer;

pub use analyzer::{
    Analyzer, AnalyzerKind, DEFAULT_MIN_WORD_LENGTH, MAX_WORD_LENGTH, extract_text_terms,
};
pub use error::FieldError;
pub use field::{Field, FieldName, NO_VALUE};
pub use filter::{
    CamelCaseSplitter, DotSplitter, LengthFilter, LowerCaseFilter, SplitFilter, TermSplitter,
    TokenFilterExt, WordSplitter,
};
pub use token::Token;
pub use tokenizer::{KeywordTokenizer, StandardTokenizer};
