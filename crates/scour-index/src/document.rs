//! Documents as they enter the index.
//!
//! Callers describe a file with [`FileMetadata`] and a [`ContentSource`]; the pair becomes
//! an [`IndexedDocument`] holding one value per schema field.

use std::{
    fs::File,
    io::{self, Cursor, Read},
    path::{Path, PathBuf},
};

use scour_analysis::NO_VALUE;
use tantivy::TantivyDocument;

use crate::schema::IndexSchema;

/// Re-openable source of file contents.
///
/// Every call to [`open`](Self::open) starts from the beginning, so a failed attempt can be
/// retried with a fresh reader.
pub trait ContentSource {
    /// Opens a reader over the full contents.
    fn open(&self) -> io::Result<Box<dyn Read + '_>>;

    /// Reads the full contents, replacing invalid UTF-8.
    fn read_text(&self) -> io::Result<String> {
        let mut bytes = Vec::new();
        self.open()?.read_to_end(&mut bytes)?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })
    }
}

impl ContentSource for Path {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(self)?))
    }
}

impl ContentSource for PathBuf {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        self.as_path().open()
    }
}

impl ContentSource for str {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(Cursor::new(self.as_bytes())))
    }
}

impl ContentSource for String {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        self.as_str().open()
    }
}

/// Metadata describing one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Full path, unique within the index.
    pub path: String,
    /// Owning project.
    pub project: String,
    /// Last modification time in epoch milliseconds.
    pub modified_millis: i64,
    /// Containing archive, if any.
    pub jar: Option<String>,
}

impl FileMetadata {
    /// Describes a file that is not inside an archive.
    pub fn new(path: impl Into<String>, project: impl Into<String>, modified_millis: i64) -> Self {
        Self {
            path: path.into(),
            project: project.into(),
            modified_millis,
            jar: None,
        }
    }

    /// Marks the file as living inside `jar`.
    pub fn with_jar(mut self, jar: impl Into<String>) -> Self {
        self.jar = Some(jar.into());
        self
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str())
    }

    /// Lowercased text after the last dot of the file name, or [`NO_VALUE`].
    pub fn extension(&self) -> String {
        match self.file_name().rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => NO_VALUE.to_string(),
        }
    }
}

/// One file's field values, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDocument {
    /// Full path.
    pub file: String,
    /// Last path segment.
    pub name: String,
    /// Lowercased extension or [`NO_VALUE`].
    pub ext: String,
    /// Owning project.
    pub proj: String,
    /// Modification time in epoch milliseconds.
    pub modified: i64,
    /// Containing archive or [`NO_VALUE`].
    pub jar: String,
    /// Text to analyze.
    pub contents: String,
}

impl IndexedDocument {
    /// Builds the document for a file and its text.
    pub fn from_file(metadata: &FileMetadata, contents: impl Into<String>) -> Self {
        Self {
            file: metadata.path.clone(),
            name: metadata.file_name().to_string(),
            ext: metadata.extension(),
            proj: metadata.project.clone(),
            modified: metadata.modified_millis,
            jar: metadata.jar.clone().unwrap_or_else(|| NO_VALUE.to_string()),
            contents: contents.into(),
        }
    }

    /// Converts to a Tantivy document.
    pub(crate) fn to_tantivy(&self, schema: &IndexSchema) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        doc.add_text(schema.contents, &self.contents);
        doc.add_text(schema.file, &self.file);
        doc.add_text(schema.name, &self.name);
        doc.add_text(schema.ext, &self.ext);
        doc.add_text(schema.proj, &self.proj);
        doc.add_i64(schema.modified, self.modified);
        doc.add_text(schema.jar, &self.jar);
        doc
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    #[test]
    fn derives_name_and_extension() {
        let meta = FileMetadata::new("/core/src/Parser.JAVA", "core", 42);
        assert_eq!(meta.file_name(), "Parser.JAVA");
        assert_eq!(meta.extension(), "java");

        let doc = IndexedDocument::from_file(&meta, "class Parser {}");
        assert_eq!(doc.name, "Parser.JAVA");
        assert_eq!(doc.ext, "java");
        assert_eq!(doc.jar, NO_VALUE);
        assert_eq!(doc.modified, 42);
    }

    #[test]
    fn missing_extension_uses_marker() {
        let meta = FileMetadata::new("/core/Makefile", "core", 0);
        assert_eq!(meta.extension(), NO_VALUE);
    }

    #[test]
    fn archive_members_keep_jar() {
        let meta = FileMetadata::new("org/lib/Util.class", "deps", 0).with_jar("/m2/lib.jar");
        assert_eq!(meta.file_name(), "Util.class");
        let doc = IndexedDocument::from_file(&meta, "");
        assert_eq!(doc.jar, "/m2/lib.jar");
    }

    #[test]
    fn sources_reopen_from_start() {
        let text = String::from("hello");
        assert_eq!(text.read_text().unwrap(), "hello");
        assert_eq!(text.read_text().unwrap(), "hello");
    }

    #[test]
    fn file_source_reads_lossily() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        fs::write(temp.path(), b"ok \xff end").unwrap();
        let text = temp.path().read_text().unwrap();
        assert!(text.starts_with("ok "));
        assert!(text.ends_with(" end"));
    }
}
