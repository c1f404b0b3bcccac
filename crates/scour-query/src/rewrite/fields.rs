//! Field name and value normalization passes.

use scour_analysis::{Field, FieldName};

use super::QueryRewriter;
use crate::ast::Query;

/// Alternative names accepted for fields, matched case-insensitively.
const FIELD_ALIASES: &[(&str, FieldName)] = &[
    ("project", FieldName::Doc(Field::Proj)),
    ("extension", FieldName::Doc(Field::Ext)),
    ("type", FieldName::Doc(Field::Ext)),
    ("filename", FieldName::Doc(Field::Name)),
    ("fn", FieldName::Doc(Field::Name)),
    ("path", FieldName::Doc(Field::File)),
    ("folder", FieldName::Dir),
    ("directory", FieldName::Dir),
    ("in", FieldName::Dir),
    ("workingset", FieldName::WorkingSet),
    ("working_set", FieldName::WorkingSet),
    ("content", FieldName::Doc(Field::Contents)),
    ("text", FieldName::Doc(Field::Contents)),
    ("mod", FieldName::Doc(Field::Modified)),
    ("date", FieldName::Doc(Field::Modified)),
    ("since", FieldName::Doc(Field::Modified)),
    ("archive", FieldName::Doc(Field::Jar)),
];

/// Resolves a field name or alias, ignoring case.
pub fn resolve_field_alias(name: &str) -> Option<FieldName> {
    let lower = name.to_lowercase();
    match FieldName::parse(&lower) {
        FieldName::Other(_) => FIELD_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lower)
            .map(|(_, field)| field.clone()),
        known => Some(known),
    }
}

/// Rewrites field names that are aliases into canonical names.
///
/// Unknown names are kept; they match nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldAliaser;

impl FieldAliaser {
    /// Returns the canonical form of `field`.
    fn canonical(field: &FieldName) -> FieldName {
        match field {
            FieldName::Other(name) => resolve_field_alias(name).unwrap_or_else(|| field.clone()),
            other => other.clone(),
        }
    }
}

impl QueryRewriter for FieldAliaser {
    fn term(&mut self, field: &FieldName, text: &str) -> Query {
        Query::term(Self::canonical(field), text)
    }

    fn phrase(&mut self, field: &FieldName, terms: &[String], slop: u32) -> Query {
        Query::Phrase {
            field: Self::canonical(field),
            terms: terms.to_vec(),
            slop,
        }
    }

    fn prefix(&mut self, field: &FieldName, prefix: &str) -> Query {
        Query::prefix(Self::canonical(field), prefix)
    }

    fn wildcard(&mut self, field: &FieldName, pattern: &str) -> Query {
        Query::wildcard(Self::canonical(field), pattern)
    }

    fn fuzzy(&mut self, field: &FieldName, text: &str, distance: u8) -> Query {
        Query::Fuzzy {
            field: Self::canonical(field),
            text: text.to_string(),
            distance,
        }
    }
}

/// Expands comma-separated metadata values into an OR of the values:
/// `ext:java,kt` matches either extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExpander;

impl QueryRewriter for CsvExpander {
    fn term(&mut self, field: &FieldName, text: &str) -> Query {
        let original = Query::term(field.clone(), text);
        if field.is_contents() || !text.contains(',') {
            return original;
        }

        let values: Vec<Query> = text
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Query::term(field.clone(), value))
            .collect();
        Query::any_of(values).unwrap_or(original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Clause;

    #[test]
    fn resolves_aliases_ignoring_case() {
        assert_eq!(
            resolve_field_alias("Extension"),
            Some(FieldName::Doc(Field::Ext))
        );
        assert_eq!(resolve_field_alias("FOLDER"), Some(FieldName::Dir));
        assert_eq!(resolve_field_alias("PROJ"), Some(FieldName::Doc(Field::Proj)));
        assert_eq!(resolve_field_alias("ws"), Some(FieldName::WorkingSet));
        assert_eq!(resolve_field_alias("title"), None);
    }

    #[test]
    fn aliaser_rewrites_leaf_fields() {
        let query = Query::term(FieldName::Other("project".into()), "core");
        assert_eq!(
            FieldAliaser.rewrite(&query),
            Query::term(Field::Proj, "core")
        );
        let query = Query::prefix(FieldName::Other("Path".into()), "/src/");
        assert_eq!(
            FieldAliaser.rewrite(&query),
            Query::prefix(Field::File, "/src/")
        );
    }

    #[test]
    fn aliaser_keeps_unknown_fields() {
        let query = Query::term(FieldName::Other("title".into()), "x");
        assert_eq!(FieldAliaser.rewrite(&query), query);
    }

    #[test]
    fn csv_values_become_alternatives() {
        let expected = Query::boolean(vec![
            Clause::should(Query::term(Field::Ext, "java")),
            Clause::should(Query::term(Field::Ext, "kt")),
        ])
        .unwrap();
        assert_eq!(
            CsvExpander.rewrite(&Query::term(Field::Ext, "java, kt,")),
            expected
        );
    }

    #[test]
    fn csv_ignores_contents_and_plain_values() {
        let contents = Query::contents("a,b");
        assert_eq!(CsvExpander.rewrite(&contents), contents);
        let plain = Query::term(Field::Proj, "core");
        assert_eq!(CsvExpander.rewrite(&plain), plain);
        let empty = Query::term(Field::Proj, ",");
        assert_eq!(CsvExpander.rewrite(&empty), empty);
    }
}
