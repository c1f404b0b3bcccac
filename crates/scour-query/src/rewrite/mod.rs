//! Query rewriting.
//!
//! A rewrite pass is a pure `Query -> Query` transform implemented through
//! [`QueryRewriter`]: a pass overrides the node kinds it cares about and
//! inherits a structural walk for everything else. [`PASS_ORDER`] is the one
//! place that decides which pass runs before which.

mod case;
mod fields;
mod folder;
mod fuzzy;
mod modified;
mod prefix;
mod scope;

use std::{collections::HashMap, fmt, hash::BuildHasher};

use scour_analysis::{Field, FieldName};

pub use case::{LowerCaser, UpperCaseExpander};
pub use fields::{CsvExpander, FieldAliaser, resolve_field_alias};
pub use folder::FolderScoper;
pub use fuzzy::Fuzzifier;
pub use modified::{ModifiedSince, parse_time_span};
pub use prefix::LastTermPrefixer;
pub use scope::{CURRENT_PROJECT_MARKER, CurrentProjectResolver, FilterInjector, WorkingSetExpander};

use crate::ast::{BooleanQuery, Clause, DEFAULT_FUZZY_DISTANCE, Query};

/// A structural query transform.
///
/// Every method returns a new node. The defaults rebuild the input unchanged,
/// descending into boolean clauses and boosts.
pub trait QueryRewriter {
    /// Rewrites any node. Dispatches to the per-kind methods.
    fn rewrite(&mut self, query: &Query) -> Query {
        walk_query(self, query)
    }

    /// Rewrites a term node.
    fn term(&mut self, field: &FieldName, text: &str) -> Query {
        Query::term(field.clone(), text)
    }

    /// Rewrites a phrase node.
    fn phrase(&mut self, field: &FieldName, terms: &[String], slop: u32) -> Query {
        Query::Phrase {
            field: field.clone(),
            terms: terms.to_vec(),
            slop,
        }
    }

    /// Rewrites a prefix node.
    fn prefix(&mut self, field: &FieldName, prefix: &str) -> Query {
        Query::prefix(field.clone(), prefix)
    }

    /// Rewrites a wildcard node.
    fn wildcard(&mut self, field: &FieldName, pattern: &str) -> Query {
        Query::wildcard(field.clone(), pattern)
    }

    /// Rewrites a fuzzy node.
    fn fuzzy(&mut self, field: &FieldName, text: &str, distance: u8) -> Query {
        Query::Fuzzy {
            field: field.clone(),
            text: text.to_string(),
            distance,
        }
    }

    /// Rewrites a range node.
    fn range(&mut self, field: Field, lower: Option<i64>, upper: Option<i64>) -> Query {
        Query::Range {
            field,
            lower,
            upper,
        }
    }

    /// Rewrites a boolean node.
    fn boolean(&mut self, query: &BooleanQuery) -> Query {
        walk_boolean(self, query)
    }

    /// Decides whether a clause is rewritten. Clauses that are not entered are
    /// copied unchanged.
    fn enter_clause(&mut self, _clause: &Clause) -> bool {
        true
    }

    /// Rewrites a boost node.
    fn boost(&mut self, query: &Query, factor: f32) -> Query {
        Query::boost(self.rewrite(query), factor)
    }
}

/// Dispatches `query` to the matching method of `rewriter`.
pub fn walk_query<R: QueryRewriter + ?Sized>(rewriter: &mut R, query: &Query) -> Query {
    match query {
        Query::Term { field, text } => rewriter.term(field, text),
        Query::Phrase { field, terms, slop } => rewriter.phrase(field, terms, *slop),
        Query::Prefix { field, prefix } => rewriter.prefix(field, prefix),
        Query::Wildcard { field, pattern } => rewriter.wildcard(field, pattern),
        Query::Fuzzy {
            field,
            text,
            distance,
        } => rewriter.fuzzy(field, text, *distance),
        Query::Boolean(boolean) => rewriter.boolean(boolean),
        Query::Boost { query, factor } => rewriter.boost(query, *factor),
        Query::Range {
            field,
            lower,
            upper,
        } => rewriter.range(*field, *lower, *upper),
    }
}

/// Rewrites every entered clause of `query`, keeping occurrences.
pub fn walk_boolean<R: QueryRewriter + ?Sized>(rewriter: &mut R, query: &BooleanQuery) -> Query {
    let clauses: Vec<Clause> = query
        .clauses()
        .iter()
        .map(|clause| {
            if rewriter.enter_clause(clause) {
                Clause {
                    occur: clause.occur,
                    query: rewriter.rewrite(&clause.query),
                }
            } else {
                clause.clone()
            }
        })
        .collect();

    Query::boolean(clauses).unwrap_or_else(|| Query::Boolean(query.clone()))
}

/// Resolves working-set names to the projects they contain.
pub trait WorkingSets {
    /// Returns the member projects of `name`, or `None` if it is unknown.
    fn projects(&self, name: &str) -> Option<Vec<String>>;
}

impl<S: BuildHasher> WorkingSets for HashMap<String, Vec<String>, S> {
    fn projects(&self, name: &str) -> Option<Vec<String>> {
        self.get(name).cloned()
    }
}

/// A resolver that knows no working sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWorkingSets;

impl WorkingSets for NoWorkingSets {
    fn projects(&self, _name: &str) -> Option<Vec<String>> {
        None
    }
}

/// Inputs shared by the rewrite passes.
#[derive(Clone, Copy)]
pub struct RewriteContext<'a> {
    /// Replace contents terms with fuzzy alternatives.
    pub fuzzy: bool,
    /// Complete the last typed term as a prefix.
    pub prefix_last_term: bool,
    /// Shortest term, in characters, that prefix completion applies to.
    pub min_prefix_length: usize,
    /// Edit distance used by fuzzy alternatives.
    pub fuzzy_distance: u8,
    /// Extra restriction every result must satisfy.
    pub filter: Option<&'a Query>,
    /// Project substituted for the current-project marker.
    pub current_project: Option<&'a str>,
    /// Working-set resolver.
    pub working_sets: &'a dyn WorkingSets,
    /// Reference time for relative modification times, in epoch milliseconds.
    pub now_millis: i64,
}

impl Default for RewriteContext<'_> {
    fn default() -> Self {
        Self {
            fuzzy: false,
            prefix_last_term: false,
            min_prefix_length: 3,
            fuzzy_distance: DEFAULT_FUZZY_DISTANCE,
            filter: None,
            current_project: None,
            working_sets: &NoWorkingSets,
            now_millis: 0,
        }
    }
}

impl fmt::Debug for RewriteContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteContext")
            .field("fuzzy", &self.fuzzy)
            .field("prefix_last_term", &self.prefix_last_term)
            .field("min_prefix_length", &self.min_prefix_length)
            .field("fuzzy_distance", &self.fuzzy_distance)
            .field("filter", &self.filter)
            .field("current_project", &self.current_project)
            .field("now_millis", &self.now_millis)
            .finish_non_exhaustive()
    }
}

/// The rewrite passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    /// Camel-case words also match their parts.
    UpperCase,
    /// Lowercases contents and extension values.
    LowerCase,
    /// Fuzzy alternatives for contents terms.
    Fuzzy,
    /// Comma-separated metadata values match any of the values.
    CommaSeparated,
    /// Field aliases become canonical field names.
    FieldAlias,
    /// Relative modification times become ranges.
    ModifiedSince,
    /// Folder scopes become path prefixes.
    Folder,
    /// The last typed term also matches as a prefix.
    PrefixLastTerm,
    /// The result filter is required.
    Filter,
    /// Working sets become their member projects.
    WorkingSet,
    /// The current-project marker becomes the project name.
    CurrentProject,
}

/// Order in which passes run.
pub const PASS_ORDER: [Pass; 11] = [
    Pass::UpperCase,
    Pass::LowerCase,
    Pass::Fuzzy,
    Pass::CommaSeparated,
    Pass::FieldAlias,
    Pass::ModifiedSince,
    Pass::Folder,
    Pass::PrefixLastTerm,
    Pass::Filter,
    Pass::WorkingSet,
    Pass::CurrentProject,
];

impl Pass {
    /// Returns a short name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::UpperCase => "uppercase",
            Self::LowerCase => "lowercase",
            Self::Fuzzy => "fuzzy",
            Self::CommaSeparated => "comma-separated",
            Self::FieldAlias => "field-alias",
            Self::ModifiedSince => "modified-since",
            Self::Folder => "folder",
            Self::PrefixLastTerm => "prefix-last-term",
            Self::Filter => "filter",
            Self::WorkingSet => "working-set",
            Self::CurrentProject => "current-project",
        }
    }

    /// Applies the pass, or returns `None` when the context disables it.
    pub fn apply(self, query: &Query, ctx: &RewriteContext<'_>) -> Option<Query> {
        let rewritten = match self {
            Self::UpperCase => UpperCaseExpander.rewrite(query),
            Self::LowerCase => LowerCaser.rewrite(query),
            Self::Fuzzy if ctx.fuzzy => Fuzzifier::new(ctx.fuzzy_distance).rewrite(query),
            Self::CommaSeparated => CsvExpander.rewrite(query),
            Self::FieldAlias => FieldAliaser.rewrite(query),
            Self::ModifiedSince => ModifiedSince::new(ctx.now_millis).rewrite(query),
            Self::Folder => FolderScoper.rewrite(query),
            Self::PrefixLastTerm if ctx.prefix_last_term && !ctx.fuzzy => {
                LastTermPrefixer::new(ctx.min_prefix_length).rewrite(query)
            }
            Self::Filter => FilterInjector::new(ctx.filter?).rewrite(query),
            Self::WorkingSet => WorkingSetExpander::new(ctx.working_sets).rewrite(query),
            Self::CurrentProject => {
                CurrentProjectResolver::new(ctx.current_project?).rewrite(query)
            }
            Self::Fuzzy | Self::PrefixLastTerm => return None,
        };
        Some(rewritten)
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs `passes` in order over `query`.
pub fn rewrite(query: &Query, passes: &[Pass], ctx: &RewriteContext<'_>) -> Query {
    passes.iter().fold(query.clone(), |current, pass| {
        pass.apply(&current, ctx).unwrap_or(current)
    })
}

/// Runs `passes` in order, keeping the tree produced by every applied pass.
pub fn rewrite_traced(
    query: &Query,
    passes: &[Pass],
    ctx: &RewriteContext<'_>,
) -> Vec<(Pass, Query)> {
    let mut trace: Vec<(Pass, Query)> = Vec::new();
    for pass in passes {
        let current = trace.last().map_or(query, |(_, q)| q);
        if let Some(next) = pass.apply(current, ctx) {
            trace.push((*pass, next));
        }
    }
    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Occur;

    /// Renames every term; checks the default walk reaches nested nodes.
    struct Renamer;

    impl QueryRewriter for Renamer {
        fn term(&mut self, field: &FieldName, text: &str) -> Query {
            Query::term(field.clone(), format!("{text}!"))
        }

        fn enter_clause(&mut self, clause: &Clause) -> bool {
            clause.occur != Occur::MustNot
        }
    }

    #[test]
    fn default_walk_descends_and_respects_enter_clause() {
        let query = Query::boolean(vec![
            Clause::must(Query::boost(Query::contents("a"), 2.0)),
            Clause::must_not(Query::contents("b")),
        ])
        .unwrap();
        let expected = Query::boolean(vec![
            Clause::must(Query::boost(Query::contents("a!"), 2.0)),
            Clause::must_not(Query::contents("b")),
        ])
        .unwrap();
        assert_eq!(Renamer.rewrite(&query), expected);
    }

    #[test]
    fn pass_order_is_complete_and_unique() {
        let mut seen = Vec::new();
        for pass in PASS_ORDER {
            assert!(!seen.contains(&pass), "{pass} listed twice");
            seen.push(pass);
        }
        assert_eq!(seen.len(), 11);
        assert_eq!(PASS_ORDER[0], Pass::UpperCase);
        assert_eq!(PASS_ORDER[10], Pass::CurrentProject);
    }

    #[test]
    fn disabled_passes_are_skipped() {
        let ctx = RewriteContext::default();
        let query = Query::contents("parser");
        assert_eq!(Pass::Fuzzy.apply(&query, &ctx), None);
        assert_eq!(Pass::PrefixLastTerm.apply(&query, &ctx), None);
        assert_eq!(Pass::Filter.apply(&query, &ctx), None);
        assert_eq!(Pass::CurrentProject.apply(&query, &ctx), None);
        assert_eq!(rewrite(&query, &PASS_ORDER, &ctx), query);
    }

    #[test]
    fn fuzzy_disables_prefixing() {
        let ctx = RewriteContext {
            fuzzy: true,
            prefix_last_term: true,
            ..RewriteContext::default()
        };
        assert_eq!(
            Pass::PrefixLastTerm.apply(&Query::contents("parser"), &ctx),
            None
        );
    }

    #[test]
    fn traced_rewrite_keeps_intermediate_trees() {
        let ctx = RewriteContext {
            prefix_last_term: true,
            ..RewriteContext::default()
        };
        let query = Query::contents("Parser");
        let trace = rewrite_traced(&query, &PASS_ORDER, &ctx);
        let passes: Vec<Pass> = trace.iter().map(|(pass, _)| *pass).collect();
        assert!(passes.contains(&Pass::LowerCase));
        assert!(passes.contains(&Pass::PrefixLastTerm));
        assert!(!passes.contains(&Pass::Fuzzy));

        let lowered = &trace
            .iter()
            .find(|(pass, _)| *pass == Pass::LowerCase)
            .unwrap()
            .1;
        assert_eq!(lowered, &Query::contents("parser"));
        assert_eq!(
            trace.last().unwrap().1,
            rewrite(&query, &PASS_ORDER, &ctx)
        );
    }

    #[test]
    fn working_sets_from_map() {
        let mut sets = HashMap::new();
        sets.insert("core".to_string(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(sets.projects("core").unwrap().len(), 2);
        assert_eq!(sets.projects("other"), None);
        assert_eq!(NoWorkingSets.projects("core"), None);
    }
}
