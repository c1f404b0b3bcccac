//! The document field model.
//!
//! Every indexed file is split into the same fixed set of fields. Indexing and
//! querying both address fields through [`Field`], so a value written under one
//! name is always looked up under the same name.

use std::{fmt, str::FromStr};

use crate::error::FieldError;

/// Stored value for metadata that is absent, such as the archive of a file that
/// is not inside one.
pub const NO_VALUE: &str = "<none>";

/// A named channel of document data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// File contents. Tokenized and analyzed, never stored verbatim.
    Contents,
    /// Full path of the file. Identifies the document.
    File,
    /// Last path segment of the file.
    Name,
    /// Lowercased file extension, or [`NO_VALUE`].
    Ext,
    /// Owning project.
    Proj,
    /// Last modification time in milliseconds since the Unix epoch.
    Modified,
    /// Containing archive, or [`NO_VALUE`].
    Jar,
}

impl Field {
    /// Every field, in schema order.
    pub const ALL: [Self; 7] = [
        Self::Contents,
        Self::File,
        Self::Name,
        Self::Ext,
        Self::Proj,
        Self::Modified,
        Self::Jar,
    ];

    /// Returns the stable name used in the schema and in query syntax.
    pub fn name(self) -> &'static str {
        match self {
            Self::Contents => "contents",
            Self::File => "file",
            Self::Name => "name",
            Self::Ext => "ext",
            Self::Proj => "proj",
            Self::Modified => "modified",
            Self::Jar => "jar",
        }
    }

    /// Looks up a field by its exact schema name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Returns true if values of this field are split into multiple terms.
    pub fn is_tokenized(self) -> bool {
        matches!(self, Self::Contents)
    }

    /// Returns true if values of this field are stored and retrievable.
    pub fn is_stored(self) -> bool {
        !self.is_tokenized()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| FieldError::Unknown(s.to_string()))
    }
}

/// The target of a query clause.
///
/// Besides the document fields, queries may address pseudo fields that are
/// rewritten into document fields before execution, and names that have not
/// been resolved yet (aliases, typos).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldName {
    /// A document field.
    Doc(Field),
    /// A folder scope, rewritten into a path prefix on [`Field::File`].
    Dir,
    /// A working set, rewritten into its member projects on [`Field::Proj`].
    WorkingSet,
    /// A name that is not (yet) a known field.
    Other(String),
}

impl FieldName {
    /// Name of the folder pseudo field.
    pub const DIR: &'static str = "dir";
    /// Name of the working-set pseudo field.
    pub const WORKING_SET: &'static str = "ws";

    /// The default field for unqualified terms.
    pub const fn contents() -> Self {
        Self::Doc(Field::Contents)
    }

    /// Resolves a canonical name. Anything else is kept as [`FieldName::Other`].
    pub fn parse(name: &str) -> Self {
        match name {
            Self::DIR => Self::Dir,
            Self::WORKING_SET => Self::WorkingSet,
            _ => Field::from_name(name).map_or_else(|| Self::Other(name.to_string()), Self::Doc),
        }
    }

    /// Returns the document field, if this is one.
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::Doc(field) => Some(*field),
            _ => None,
        }
    }

    /// Returns true if this targets the contents field.
    pub fn is_contents(&self) -> bool {
        matches!(self, Self::Doc(Field::Contents))
    }

    /// Returns the name as written in query syntax.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Doc(field) => field.name(),
            Self::Dir => Self::DIR,
            Self::WorkingSet => Self::WORKING_SET,
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Field> for FieldName {
    fn from(field: Field) -> Self {
        Self::Doc(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.name()), Some(field));
            assert_eq!(field.name().parse::<Field>().unwrap(), field);
        }
    }

    #[test]
    fn unknown_field_name() {
        assert_eq!(Field::from_name("title"), None);
        assert_eq!(
            "title".parse::<Field>(),
            Err(FieldError::Unknown("title".into()))
        );
    }

    #[test]
    fn only_contents_is_tokenized() {
        let tokenized: Vec<_> = Field::ALL.into_iter().filter(|f| f.is_tokenized()).collect();
        assert_eq!(tokenized, vec![Field::Contents]);
        assert!(Field::Jar.is_stored());
        assert!(!Field::Contents.is_stored());
    }

    #[test]
    fn field_name_parse() {
        assert_eq!(FieldName::parse("ext"), FieldName::Doc(Field::Ext));
        assert_eq!(FieldName::parse("dir"), FieldName::Dir);
        assert_eq!(FieldName::parse("ws"), FieldName::WorkingSet);
        assert_eq!(
            FieldName::parse("Extension"),
            FieldName::Other("Extension".into())
        );
    }

    #[test]
    fn field_name_display() {
        assert_eq!(FieldName::contents().to_string(), "contents");
        assert_eq!(FieldName::Other("x".into()).to_string(), "x");
        assert_eq!(FieldName::Dir.field(), None);
        assert_eq!(FieldName::from(Field::Proj).field(), Some(Field::Proj));
    }
}
