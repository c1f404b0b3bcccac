//! Compilation of rewritten query trees into Tantivy queries.
//!
//! Prefix, wildcard and fuzzy nodes are expanded against the term dictionaries of the
//! searched snapshot, so a compiled query is only valid for the searcher it was built with.

mod compile;

pub use compile::{CompiledQuery, QueryCompiler};
