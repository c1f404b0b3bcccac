//! Index lifecycle.
//!
//! The [`Indexer`] owns the writing side of an index: it clears stale locks on startup,
//! runs every write under the retry harness and tells searchers when to drop their
//! readers. Each file is its own unit of work, so one failing file never aborts a batch.

use std::sync::Arc;

use scour_config::IndexSettings;
use tantivy::{IndexReader, ReloadPolicy};
use tracing::{debug, info, warn};

use crate::{
    IndexError,
    context::{IndexContext, OpenMode},
    document::{ContentSource, FileMetadata},
    events::{IndexCallback, IndexEvent, IndexGeneration},
    location::IndexLocation,
    retry::{RetryPolicy, run_with_retry},
    writer::IndexWriter,
};

/// Outcome of a batch indexing run.
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    /// Number of files indexed.
    pub indexed: usize,
    /// Files that could not be indexed (file path, error message).
    pub failed: Vec<(String, String)>,
}

impl IndexStats {
    /// Returns true if every file was indexed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Manages writes to one index.
pub struct Indexer {
    /// Where the index lives.
    location: IndexLocation,
    /// Schema and analysis shared with searchers.
    context: IndexContext,
    /// Writer heap, merge and retry settings.
    settings: IndexSettings,
    /// Retry behaviour for writes.
    retry: RetryPolicy,
    /// Commit counter shared with searchers.
    generation: IndexGeneration,
    /// Receives update and reset notifications.
    callback: Arc<IndexCallback>,
}

impl Indexer {
    /// Creates an indexer, clearing a writer lock left behind by a crashed process.
    ///
    /// A lock held by a live writer is logged and left alone.
    pub fn new(
        location: IndexLocation,
        context: IndexContext,
        settings: IndexSettings,
    ) -> Result<Self, IndexError> {
        if location.exists()? {
            match location.release_stale_lock() {
                Ok(()) => {}
                Err(IndexError::Locked(message)) => {
                    let path = location.display_path();
                    warn!(location = %path.display(), %message, "index is locked");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(Self {
            retry: RetryPolicy::from_settings(&settings),
            location,
            context,
            settings,
            generation: IndexGeneration::new(),
            callback: Arc::new(IndexCallback::default()),
        })
    }

    /// Shares a generation counter with searchers.
    pub fn with_generation(mut self, generation: IndexGeneration) -> Self {
        self.generation = generation;
        self
    }

    /// Sets the receiver of update and reset notifications.
    pub fn with_callback(mut self, callback: IndexCallback) -> Self {
        self.callback = Arc::new(callback);
        self
    }

    /// Overrides the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Generation counter to hand to searchers.
    pub fn generation(&self) -> IndexGeneration {
        self.generation.clone()
    }

    /// Where the index lives.
    pub fn location(&self) -> &IndexLocation {
        &self.location
    }

    /// Schema and analysis configuration.
    pub fn context(&self) -> &IndexContext {
        &self.context
    }

    /// Returns true if the index exists and holds at least one document.
    pub fn is_indexed(&self) -> Result<bool, IndexError> {
        if !self.location.exists()? {
            return Ok(false);
        }
        Ok(self.reader()?.searcher().num_docs() > 0)
    }

    /// Returns true if the index can be opened for reading.
    pub fn is_readable(&self) -> bool {
        self.reader().is_ok()
    }

    /// Opens a writer that shares this indexer's generation and callback.
    ///
    /// With `create` the index starts empty.
    pub fn open_writer(&self, create: bool) -> Result<IndexWriter, IndexError> {
        Ok(
            IndexWriter::open(&self.location, &self.context, create, &self.settings)?
                .with_generation(self.generation.clone())
                .with_callback(Arc::clone(&self.callback)),
        )
    }

    /// Indexes one file, replacing any earlier version of it.
    pub fn index_file_with_retry(
        &self,
        source: &(impl ContentSource + ?Sized),
        metadata: &FileMetadata,
    ) -> Result<(), IndexError> {
        self.with_retry_harness(|attempt| {
            debug!(path = %metadata.path, attempt, "indexing file");
            let mut writer = self.open_writer(false)?;
            writer.delete_document(&metadata.path);
            writer.add_file(source, metadata)?;
            writer.close()
        })
    }

    /// Removes one file from the index.
    pub fn delete_file(&self, path: &str) -> Result<(), IndexError> {
        self.with_retry_harness(|_| {
            let mut writer = self.open_writer(false)?;
            writer.delete_document(path);
            writer.close()
        })
    }

    /// Deletes the whole index and its storage files.
    ///
    /// Searchers are told to drop their readers before the first attempt.
    pub fn delete_index(&self) -> Result<(), IndexError> {
        self.invalidate();
        self.with_retry_harness(|_| {
            let mut writer = self.open_writer(true)?;
            writer.delete_all()?;
            writer.commit()?;
            writer.collect_garbage()?;
            writer.close()?;
            self.location.purge()
        })?;
        info!(location = %self.location.display_path().display(), "index deleted");
        Ok(())
    }

    /// Merges the index into a single segment.
    pub fn optimize_index(&self) -> Result<(), IndexError> {
        self.with_retry_harness(|_| {
            let mut writer = self.open_writer(false)?;
            writer.force_merge()?;
            writer.collect_garbage()?;
            writer.close()
        })
    }

    /// Indexes every file of a batch, each under its own retry scope.
    ///
    /// Failures are logged and recorded; the batch continues with the next file.
    pub fn index_batch<S: ContentSource>(
        &self,
        files: impl IntoIterator<Item = (S, FileMetadata)>,
    ) -> IndexStats {
        let mut stats = IndexStats::default();
        for (source, metadata) in files {
            match self.index_file_with_retry(&source, &metadata) {
                Ok(()) => stats.indexed += 1,
                Err(err) => {
                    warn!(path = %metadata.path, error = %err, "failed to index file");
                    stats.failed.push((metadata.path, err.to_string()));
                }
            }
        }
        info!(
            indexed = stats.indexed,
            failed = stats.failed.len(),
            "batch indexing complete"
        );
        stats
    }

    /// Tells searchers to drop their readers.
    fn invalidate(&self) {
        let generation = self.generation.bump();
        debug!(generation, "index readers invalidated");
        self.callback.notify(IndexEvent::Reset);
    }

    /// Runs `work` under the retry policy, invalidating readers after transient failures.
    fn with_retry_harness<T>(
        &self,
        work: impl FnMut(u32) -> Result<T, IndexError>,
    ) -> Result<T, IndexError> {
        run_with_retry(&self.retry, work, |_| self.invalidate())
    }

    /// Opens a reader on the existing index.
    fn reader(&self) -> Result<IndexReader, IndexError> {
        let index = self.context.open_index(&self.location, OpenMode::Existing)?;
        Ok(index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use tempfile::TempDir;

    use super::*;

    fn indexer(location: IndexLocation) -> Indexer {
        Indexer::new(location, IndexContext::default(), IndexSettings::default())
            .unwrap()
            .with_retry(RetryPolicy::new(3, Duration::ZERO))
    }

    fn meta(path: &str) -> FileMetadata {
        FileMetadata::new(path, "core", 0)
    }

    #[test]
    fn fresh_index_is_not_indexed() {
        let indexer = indexer(IndexLocation::in_memory());
        assert!(!indexer.is_indexed().unwrap());
        assert!(!indexer.is_readable());

        indexer.open_writer(true).unwrap().close().unwrap();
        assert!(indexer.is_readable());
        assert!(!indexer.is_indexed().unwrap());
    }

    #[test]
    fn indexing_a_file_makes_the_index_indexed() {
        let indexer = indexer(IndexLocation::in_memory());
        indexer
            .index_file_with_retry("fn main() {}", &meta("/core/main.rs"))
            .unwrap();
        assert!(indexer.is_indexed().unwrap());
    }

    #[test]
    fn reindexing_replaces_the_document() {
        let indexer = indexer(IndexLocation::in_memory());
        indexer.index_file_with_retry("one", &meta("/core/a.rs")).unwrap();
        indexer.index_file_with_retry("two", &meta("/core/a.rs")).unwrap();
        let writer = indexer.open_writer(false).unwrap();
        assert_eq!(writer.num_docs().unwrap(), 1);
    }

    #[test]
    fn delete_file_removes_only_that_file() {
        let indexer = indexer(IndexLocation::in_memory());
        indexer.index_file_with_retry("a", &meta("/core/a.rs")).unwrap();
        indexer.index_file_with_retry("b", &meta("/core/b.rs")).unwrap();
        indexer.delete_file("/core/a.rs").unwrap();
        assert_eq!(indexer.open_writer(false).unwrap().num_docs().unwrap(), 1);
    }

    #[test]
    fn delete_index_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let indexer = indexer(IndexLocation::on_disk(temp.path().join("index")));
        indexer.index_file_with_retry("a", &meta("/core/a.rs")).unwrap();

        indexer.delete_index().unwrap();
        assert!(!indexer.is_indexed().unwrap());
        assert_eq!(fs::read_dir(temp.path().join("index")).unwrap().count(), 0);

        indexer.delete_index().unwrap();
        assert!(!indexer.is_indexed().unwrap());
    }

    #[test]
    fn delete_index_resets_before_writing() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let indexer = indexer(IndexLocation::in_memory()).with_callback(IndexCallback::new(
            move |event| sink.lock().unwrap().push(event),
        ));
        let before = indexer.generation().current();

        indexer.delete_index().unwrap();
        let events = events.lock().unwrap();
        assert_eq!(events.first(), Some(&IndexEvent::Reset));
        assert!(events.contains(&IndexEvent::Updated));
        assert!(indexer.generation().current() > before);
    }

    #[test]
    fn locked_index_fails_after_retries() {
        let indexer = indexer(IndexLocation::in_memory());
        let _held = indexer.open_writer(false).unwrap();
        let generation = indexer.generation().current();

        let err = indexer
            .index_file_with_retry("a", &meta("/core/a.rs"))
            .unwrap_err();
        assert!(matches!(err, IndexError::Locked(_)));
        assert_eq!(indexer.generation().current(), generation + 3);
    }

    #[test]
    fn batch_continues_past_failures() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.rs");
        fs::write(&good, "fn good() {}").unwrap();
        let missing = temp.path().join("missing.rs");

        let indexer = indexer(IndexLocation::in_memory());
        let stats = indexer.index_batch(vec![
            (missing.clone(), meta("/core/missing.rs")),
            (good, meta("/core/good.rs")),
        ]);
        assert_eq!(stats.indexed, 1);
        assert_eq!(stats.failed.len(), 1);
        assert_eq!(stats.failed[0].0, "/core/missing.rs");
        assert!(!stats.is_success());
    }

    #[test]
    fn optimize_merges_segments() {
        let indexer = indexer(IndexLocation::in_memory());
        for name in ["a", "b", "c"] {
            indexer
                .index_file_with_retry(name, &meta(&format!("/core/{name}.rs")))
                .unwrap();
        }
        indexer.optimize_index().unwrap();
        let index = indexer
            .context()
            .open_index(indexer.location(), OpenMode::Existing)
            .unwrap();
        assert_eq!(index.searchable_segment_ids().unwrap().len(), 1);
    }

    #[test]
    fn stale_lock_is_cleared_on_startup() {
        let temp = TempDir::new().unwrap();
        let location = IndexLocation::on_disk(temp.path());
        indexer(location.clone())
            .index_file_with_retry("a", &meta("/core/a.rs"))
            .unwrap();
        fs::write(temp.path().join(".tantivy-writer.lock"), b"").unwrap();

        let indexer = indexer(location);
        indexer.index_file_with_retry("b", &meta("/core/b.rs")).unwrap();
        assert!(indexer.is_indexed().unwrap());
    }
}
