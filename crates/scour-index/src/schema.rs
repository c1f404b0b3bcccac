//! Index schema.
//!
//! One document per source file:
//! - `contents`: analyzed source text, positions indexed, not stored
//! - `file`, `name`, `ext`, `proj`, `jar`: exact-match strings, stored
//! - `modified`: epoch milliseconds, indexed, stored and fast

use scour_analysis::Field as DocField;
use tantivy::schema::{
    FAST, Field, INDEXED, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing,
    TextOptions,
};

use crate::analyzer::SCOUR_TOKENIZER;

/// Handles to all fields in the index schema.
#[derive(Debug, Clone)]
pub struct IndexSchema {
    /// The underlying Tantivy schema.
    schema: Schema,
    /// Analyzed file contents.
    pub contents: Field,
    /// Full file path, the document identity.
    pub file: Field,
    /// Last path segment.
    pub name: Field,
    /// Lowercased extension or the no-value marker.
    pub ext: Field,
    /// Owning project.
    pub proj: Field,
    /// Modification time in epoch milliseconds.
    pub modified: Field,
    /// Containing archive or the no-value marker.
    pub jar: Field,
}

impl IndexSchema {
    /// Creates the schema with every document field configured.
    pub fn new() -> Self {
        let mut builder = Schema::builder();

        let contents_options = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(SCOUR_TOKENIZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        );
        let contents = builder.add_text_field(DocField::Contents.name(), contents_options);

        let file = builder.add_text_field(DocField::File.name(), STRING | STORED);
        let name = builder.add_text_field(DocField::Name.name(), STRING | STORED);
        let ext = builder.add_text_field(DocField::Ext.name(), STRING | STORED);
        let proj = builder.add_text_field(DocField::Proj.name(), STRING | STORED);
        let jar = builder.add_text_field(DocField::Jar.name(), STRING | STORED);
        let modified = builder.add_i64_field(DocField::Modified.name(), INDEXED | STORED | FAST);

        Self {
            schema: builder.build(),
            contents,
            file,
            name,
            ext,
            proj,
            modified,
            jar,
        }
    }

    /// Returns a reference to the underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Maps a document field to its schema handle.
    pub fn field(&self, field: DocField) -> Field {
        match field {
            DocField::Contents => self.contents,
            DocField::File => self.file,
            DocField::Name => self.name,
            DocField::Ext => self.ext,
            DocField::Proj => self.proj,
            DocField::Modified => self.modified,
            DocField::Jar => self.jar,
        }
    }
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self::new()
    }
}
