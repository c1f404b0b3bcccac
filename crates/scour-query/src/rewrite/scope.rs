//! Result scoping passes: filters, working sets and the current project.

use scour_analysis::{Field, FieldName};

use super::{QueryRewriter, WorkingSets};
use crate::ast::{Clause, Query};

/// Marker value of `proj:` meaning "the project of the active editor".
pub const CURRENT_PROJECT_MARKER: &str = ".";

/// Requires every result to also match a filter query.
#[derive(Debug, Clone, Copy)]
pub struct FilterInjector<'a> {
    /// Filter to require.
    filter: &'a Query,
}

impl<'a> FilterInjector<'a> {
    /// Creates the pass for `filter`.
    pub fn new(filter: &'a Query) -> Self {
        Self { filter }
    }
}

impl QueryRewriter for FilterInjector<'_> {
    fn rewrite(&mut self, query: &Query) -> Query {
        Query::boolean(vec![
            Clause::must(query.clone()),
            Clause::must(self.filter.clone()),
        ])
        .unwrap_or_else(|| query.clone())
    }
}

/// Replaces `ws:<name>` with an OR of the projects in the working set.
///
/// Unknown or empty working sets are left as they are and match nothing.
pub struct WorkingSetExpander<'a> {
    /// Working-set resolver.
    sets: &'a dyn WorkingSets,
}

impl<'a> WorkingSetExpander<'a> {
    /// Creates the pass over `sets`.
    pub fn new(sets: &'a dyn WorkingSets) -> Self {
        Self { sets }
    }
}

impl QueryRewriter for WorkingSetExpander<'_> {
    fn term(&mut self, field: &FieldName, text: &str) -> Query {
        let original = Query::term(field.clone(), text);
        if *field != FieldName::WorkingSet {
            return original;
        }

        let projects = self.sets.projects(text).unwrap_or_default();
        Query::any_of(
            projects
                .into_iter()
                .map(|project| Query::term(Field::Proj, project))
                .collect(),
        )
        .unwrap_or(original)
    }
}

/// Substitutes the current project for `proj:.`.
#[derive(Debug, Clone, Copy)]
pub struct CurrentProjectResolver<'a> {
    /// Name of the current project.
    project: &'a str,
}

impl<'a> CurrentProjectResolver<'a> {
    /// Creates the pass for `project`.
    pub fn new(project: &'a str) -> Self {
        Self { project }
    }
}

impl QueryRewriter for CurrentProjectResolver<'_> {
    fn term(&mut self, field: &FieldName, text: &str) -> Query {
        if field.field() == Some(Field::Proj) && text == CURRENT_PROJECT_MARKER {
            Query::term(Field::Proj, self.project)
        } else {
            Query::term(field.clone(), text)
        }
    }
}
