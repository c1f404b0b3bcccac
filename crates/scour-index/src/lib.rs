//! Tantivy-based index for scour.
//!
//! This crate owns everything between a file on disk and a ranked search result:
//! - Document conversion from file metadata and content sources
//! - Index creation, writing, deletion and optimization under a retry harness
//! - Code-aware analysis shared by indexing and querying
//! - Searching with exact, split and fuzzy fallbacks, autocompletion and match counts
//!
//! Writers and searchers share an [`IndexContext`] so both sides analyse text the same
//! way, and an [`IndexGeneration`] so searchers notice commits.
//!
//! # Example
//!
//! ```no_run
//! use scour_config::{IndexSettings, SearchSettings};
//! use scour_index::{FileMetadata, IndexContext, IndexLocation, Indexer, Searcher};
//! use scour_query::SearchQuery;
//!
//! let location = IndexLocation::on_disk("./index");
//! let context = IndexContext::default();
//! let indexer = Indexer::new(location.clone(), context.clone(), IndexSettings::default())?;
//!
//! let metadata = FileMetadata::new("/ws/core/src/Parser.java", "core", 0);
//! indexer.index_file_with_retry("class XmlParser {}", &metadata)?;
//!
//! let generation = indexer.generation();
//! let mut searcher = Searcher::new(location, context, generation, SearchSettings::default());
//! if let Some(result) = searcher.search(&mut SearchQuery::new("XmlParser"))? {
//!     for doc in &result {
//!         println!("{} ({:?} matches)", doc.file_path(), doc.match_count());
//!     }
//! }
//! # Ok::<(), scour_index::IndexError>(())
//! ```

#![warn(missing_docs)]

mod analyzer;
mod context;
mod document;
mod error;
mod events;
mod indexer;
mod location;
mod query;
mod result;
mod retry;
mod schema;
mod search;
mod writer;

pub use analyzer::{SCOUR_TOKENIZER, ScourTokenStream, ScourTokenizer, build_analyzer};
pub use context::{IndexContext, OpenMode};
pub use document::{ContentSource, FileMetadata, IndexedDocument};
pub use error::{FailureKind, IndexError};
pub use events::{IndexCallback, IndexEvent, IndexGeneration};
pub use indexer::{IndexStats, Indexer};
pub use location::IndexLocation;
pub use result::{ResultDoc, SearchResult};
pub use retry::{FailurePolicy, RetryPolicy, run_with_retry};
pub use schema::IndexSchema;
pub use search::Searcher;
pub use writer::IndexWriter;
