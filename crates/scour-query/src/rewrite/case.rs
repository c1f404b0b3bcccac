//! Case handling passes.

use scour_analysis::{CamelCaseSplitter, Field, FieldName, TermSplitter};

use super::{QueryRewriter, fields::resolve_field_alias};
use crate::ast::Query;

/// Lets a camel-case contents word also match its parts:
/// `parseXml` becomes `parseXml OR (parse AND xml)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpperCaseExpander;

impl UpperCaseExpander {
    /// Returns true if an uppercase letter follows a lowercase one.
    fn has_inner_upper(text: &str) -> bool {
        let chars: Vec<char> = text.chars().collect();
        chars
            .windows(2)
            .any(|pair| pair[0].is_lowercase() && pair[1].is_uppercase())
    }
}

impl QueryRewriter for UpperCaseExpander {
    fn term(&mut self, field: &FieldName, text: &str) -> Query {
        let original = Query::term(field.clone(), text);
        if !field.is_contents() || !Self::has_inner_upper(text) {
            return original;
        }

        let parts: Vec<Query> = CamelCaseSplitter
            .split(text)
            .into_iter()
            .map(|range| Query::term(field.clone(), text[range].to_lowercase()))
            .collect();
        if parts.len() < 2 {
            return original;
        }

        Query::all_of(parts)
            .and_then(|parts| Query::any_of(vec![original.clone(), parts]))
            .unwrap_or(original)
    }
}

/// Lowercases values of fields indexed in lower case: contents and extension.
///
/// Aliases of those fields are lowercased too, since alias resolution runs
/// later.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowerCaser;

impl LowerCaser {
    /// Returns true if values of `field` are stored lowercased.
    fn applies_to(field: &FieldName) -> bool {
        let canonical = match field {
            FieldName::Other(name) => resolve_field_alias(name),
            other => Some(other.clone()),
        };
        matches!(
            canonical,
            Some(FieldName::Doc(Field::Contents | Field::Ext))
        )
    }

    /// Lowercases `text` when `field` needs it.
    fn normalize(field: &FieldName, text: &str) -> String {
        if Self::applies_to(field) {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }
}

impl QueryRewriter for LowerCaser {
    fn term(&mut self, field: &FieldName, text: &str) -> Query {
        Query::term(field.clone(), Self::normalize(field, text))
    }

    fn phrase(&mut self, field: &FieldName, terms: &[String], slop: u32) -> Query {
        Query::Phrase {
            field: field.clone(),
            terms: terms.iter().map(|t| Self::normalize(field, t)).collect(),
            slop,
        }
    }

    fn prefix(&mut self, field: &FieldName, prefix: &str) -> Query {
        Query::prefix(field.clone(), Self::normalize(field, prefix))
    }

    fn wildcard(&mut self, field: &FieldName, pattern: &str) -> Query {
        Query::wildcard(field.clone(), Self::normalize(field, pattern))
    }

    fn fuzzy(&mut self, field: &FieldName, text: &str, distance: u8) -> Query {
        Query::Fuzzy {
            field: field.clone(),
            text: Self::normalize(field, text),
            distance,
        }
    }
}
