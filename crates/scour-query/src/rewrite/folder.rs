//! Folder scoping.

use scour_analysis::{Field, FieldName};

use super::QueryRewriter;
use crate::ast::Query;

/// Turns folder scopes into path prefixes on the file field.
///
/// `dir:/ws/proj/src` and `file:/ws/proj/src/` both match every file below
/// `/ws/proj/src/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FolderScoper;

impl FolderScoper {
    /// Returns `path` ending in exactly one `/`.
    fn folder_prefix(path: &str) -> String {
        format!("{}/", path.trim_end_matches('/'))
    }
}

impl QueryRewriter for FolderScoper {
    fn term(&mut self, field: &FieldName, text: &str) -> Query {
        match field {
            FieldName::Dir => Query::prefix(Field::File, Self::folder_prefix(text)),
            FieldName::Doc(Field::File) if text.ends_with('/') => {
                Query::prefix(Field::File, Self::folder_prefix(text))
            }
            _ => Query::term(field.clone(), text),
        }
    }

    fn prefix(&mut self, field: &FieldName, prefix: &str) -> Query {
        match field {
            FieldName::Dir => Query::prefix(Field::File, prefix),
            _ => Query::prefix(field.clone(), prefix),
        }
    }
}
