//! Index writer: the single owner of the mutable index.

use std::sync::Arc;

use scour_config::IndexSettings;
use tantivy::{
    Index, IndexReader, IndexWriter as TantivyIndexWriter, ReloadPolicy, Term,
    indexer::LogMergePolicy,
};
use tracing::debug;

use crate::{
    IndexError,
    context::{IndexContext, OpenMode},
    document::{ContentSource, FileMetadata, IndexedDocument},
    events::{IndexCallback, IndexEvent, IndexGeneration},
    location::IndexLocation,
    schema::IndexSchema,
};

/// Writes documents to the index.
///
/// Holding a writer holds the index's exclusive writer lock. Every commit advances the
/// shared [`IndexGeneration`] and sends [`IndexEvent::Updated`].
pub struct IndexWriter {
    /// The Tantivy index.
    index: Index,
    /// The underlying Tantivy writer.
    writer: TantivyIndexWriter,
    /// Schema with field handles.
    schema: IndexSchema,
    /// Advanced on every commit.
    generation: IndexGeneration,
    /// Receives commit notifications.
    callback: Arc<IndexCallback>,
}

impl IndexWriter {
    /// Opens a writer on `location`, creating the index if there is none.
    ///
    /// With `create` every existing document is deleted; the deletion takes effect on the
    /// next commit.
    pub fn open(
        location: &IndexLocation,
        context: &IndexContext,
        create: bool,
        settings: &IndexSettings,
    ) -> Result<Self, IndexError> {
        let index = context.open_index(location, OpenMode::OpenOrCreate)?;
        let writer: TantivyIndexWriter = index.writer(settings.writer_heap_size)?;
        if create {
            writer.delete_all_documents()?;
        }

        let mut merge_policy = LogMergePolicy::default();
        merge_policy.set_min_num_segments(settings.merge_min_segments);
        writer.set_merge_policy(Box::new(merge_policy));

        debug!(location = %location.display_path().display(), create, "opened index writer");
        Ok(Self {
            index,
            writer,
            schema: context.schema().clone(),
            generation: IndexGeneration::new(),
            callback: Arc::new(IndexCallback::default()),
        })
    }

    /// Shares a generation counter with searchers.
    pub fn with_generation(mut self, generation: IndexGeneration) -> Self {
        self.generation = generation;
        self
    }

    /// Sets the commit notification receiver.
    pub fn with_callback(mut self, callback: Arc<IndexCallback>) -> Self {
        self.callback = callback;
        self
    }

    /// Stages a document. It becomes visible after [`commit`](Self::commit).
    pub fn add_document(&mut self, doc: &IndexedDocument) -> Result<(), IndexError> {
        self.writer.add_document(doc.to_tantivy(&self.schema))?;
        Ok(())
    }

    /// Reads `source` and stages it as the document for `metadata`.
    pub fn add_file(
        &mut self,
        source: &(impl ContentSource + ?Sized),
        metadata: &FileMetadata,
    ) -> Result<(), IndexError> {
        let contents = source.read_text()?;
        self.add_document(&IndexedDocument::from_file(metadata, contents))
    }

    /// Stages deletion of the document stored under `path`.
    pub fn delete_document(&mut self, path: &str) {
        self.writer
            .delete_term(Term::from_field_text(self.schema.file, path));
    }

    /// Stages deletion of every document.
    pub fn delete_all(&mut self) -> Result<(), IndexError> {
        self.writer.delete_all_documents()?;
        Ok(())
    }

    /// Commits staged changes and notifies listeners.
    pub fn commit(&mut self) -> Result<(), IndexError> {
        self.writer.commit().map_err(IndexError::commit)?;
        let generation = self.generation.bump();
        debug!(generation, "index committed");
        self.callback.notify(IndexEvent::Updated);
        Ok(())
    }

    /// Discards staged changes.
    pub fn rollback(&mut self) -> Result<(), IndexError> {
        self.writer.rollback().map_err(IndexError::commit)?;
        Ok(())
    }

    /// Merges every committed segment into one.
    pub fn force_merge(&mut self) -> Result<(), IndexError> {
        let segments = self.index.searchable_segment_ids()?;
        if segments.len() > 1 {
            debug!(segments = segments.len(), "merging segments");
            self.writer.merge(&segments).wait()?;
        }
        Ok(())
    }

    /// Removes files no longer referenced by the index.
    pub fn collect_garbage(&self) -> Result<(), IndexError> {
        self.writer.garbage_collect_files().wait()?;
        Ok(())
    }

    /// Commits, waits for background merges and releases the writer lock.
    pub fn close(mut self) -> Result<(), IndexError> {
        self.commit()?;
        self.writer.wait_merging_threads()?;
        Ok(())
    }

    /// Returns the number of committed documents.
    pub fn num_docs(&self) -> Result<u64, IndexError> {
        let reader: IndexReader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(reader.searcher().num_docs())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use tempfile::TempDir;

    use super::*;

    fn open(location: &IndexLocation, create: bool) -> IndexWriter {
        IndexWriter::open(
            location,
            &IndexContext::default(),
            create,
            &IndexSettings::default(),
        )
        .unwrap()
    }

    fn doc(path: &str) -> IndexedDocument {
        IndexedDocument::from_file(&FileMetadata::new(path, "core", 0), "fn main() {}")
    }

    #[test]
    fn creates_index_on_disk() {
        let temp = TempDir::new().unwrap();
        let location = IndexLocation::on_disk(temp.path());
        let writer = open(&location, false);
        assert!(temp.path().join("meta.json").exists());
        drop(writer);
    }

    #[test]
    fn adds_and_commits_documents() {
        let location = IndexLocation::in_memory();
        let mut writer = open(&location, false);
        writer.add_document(&doc("/core/a.rs")).unwrap();
        writer
            .add_file("struct Parser;", &FileMetadata::new("/core/b.rs", "core", 1))
            .unwrap();
        assert_eq!(writer.num_docs().unwrap(), 0);

        writer.commit().unwrap();
        assert_eq!(writer.num_docs().unwrap(), 2);
    }

    #[test]
    fn reopens_existing_index() {
        let temp = TempDir::new().unwrap();
        let location = IndexLocation::on_disk(temp.path());
        {
            let mut writer = open(&location, false);
            writer.add_document(&doc("/core/a.rs")).unwrap();
            writer.close().unwrap();
        }
        let writer = open(&location, false);
        assert_eq!(writer.num_docs().unwrap(), 1);
    }

    #[test]
    fn create_discards_existing_documents() {
        let location = IndexLocation::in_memory();
        {
            let mut writer = open(&location, false);
            writer.add_document(&doc("/core/a.rs")).unwrap();
            writer.close().unwrap();
        }
        let mut writer = open(&location, true);
        assert_eq!(writer.num_docs().unwrap(), 1);
        writer.commit().unwrap();
        assert_eq!(writer.num_docs().unwrap(), 0);
    }

    #[test]
    fn deletes_by_path() {
        let location = IndexLocation::in_memory();
        let mut writer = open(&location, false);
        writer.add_document(&doc("/core/a.rs")).unwrap();
        writer.add_document(&doc("/core/b.rs")).unwrap();
        writer.commit().unwrap();

        writer.delete_document("/core/a.rs");
        writer.delete_document("/core/missing.rs");
        writer.commit().unwrap();
        assert_eq!(writer.num_docs().unwrap(), 1);

        writer.delete_all().unwrap();
        writer.commit().unwrap();
        assert_eq!(writer.num_docs().unwrap(), 0);
    }

    #[test]
    fn rollback_discards_uncommitted_changes() {
        let location = IndexLocation::in_memory();
        let mut writer = open(&location, false);
        writer.add_document(&doc("/core/a.rs")).unwrap();
        writer.rollback().unwrap();
        writer.commit().unwrap();
        assert_eq!(writer.num_docs().unwrap(), 0);
    }

    #[test]
    fn commit_advances_generation_and_notifies() {
        let location = IndexLocation::in_memory();
        let generation = IndexGeneration::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let mut writer = open(&location, false)
            .with_generation(generation.clone())
            .with_callback(Arc::new(IndexCallback::new(move |event| {
                sink.lock().unwrap().push(event);
            })));

        writer.commit().unwrap();
        writer.commit().unwrap();
        assert_eq!(generation.current(), 2);
        assert_eq!(
            *events.lock().unwrap(),
            vec![IndexEvent::Updated, IndexEvent::Updated]
        );
    }

    #[test]
    fn force_merge_leaves_one_segment() {
        let location = IndexLocation::in_memory();
        let mut writer = open(&location, false);
        for i in 0..3 {
            writer.add_document(&doc(&format!("/core/{i}.rs"))).unwrap();
            writer.commit().unwrap();
        }
        writer.force_merge().unwrap();
        writer.close().unwrap();

        let index = IndexContext::default()
            .open_index(&location, OpenMode::Existing)
            .unwrap();
        assert_eq!(index.searchable_segment_ids().unwrap().len(), 1);
    }

    #[test]
    fn second_writer_is_locked_out() {
        let location = IndexLocation::in_memory();
        let _first = open(&location, false);
        let err = IndexWriter::open(
            &location,
            &IndexContext::default(),
            false,
            &IndexSettings::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, IndexError::Locked(_)));
    }
}
