//! Query AST.
//!
//! A tree of analyzed query nodes, ready to be rewritten and then compiled
//! against an index. Nodes are immutable values: rewriting builds a new tree.

use std::fmt;

use scour_analysis::{Field, FieldName};

/// Default maximum edit distance of a fuzzy query.
pub const DEFAULT_FUZZY_DISTANCE: u8 = 2;

/// Requirement kind of a boolean clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occur {
    /// The clause must match.
    Must,
    /// The clause may match and adds to the score when it does.
    Should,
    /// The clause must not match.
    MustNot,
}

/// One operand of a [`BooleanQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Requirement kind.
    pub occur: Occur,
    /// Operand.
    pub query: Query,
}

impl Clause {
    /// A required clause.
    pub fn must(query: Query) -> Self {
        Self {
            occur: Occur::Must,
            query,
        }
    }

    /// An optional clause.
    pub fn should(query: Query) -> Self {
        Self {
            occur: Occur::Should,
            query,
        }
    }

    /// A prohibited clause.
    pub fn must_not(query: Query) -> Self {
        Self {
            occur: Occur::MustNot,
            query,
        }
    }
}

/// A boolean combination of clauses. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanQuery {
    /// Operands, in input order.
    clauses: Vec<Clause>,
}

impl BooleanQuery {
    /// Creates a boolean query, or `None` when there are no clauses.
    pub fn new(clauses: Vec<Clause>) -> Option<Self> {
        if clauses.is_empty() {
            None
        } else {
            Some(Self { clauses })
        }
    }

    /// Returns the clauses in input order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Consumes the query, returning its clauses.
    pub fn into_clauses(self) -> Vec<Clause> {
        self.clauses
    }
}

/// An analyzed query node.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Exact term match.
    Term {
        /// Target field.
        field: FieldName,
        /// Term text.
        text: String,
    },
    /// Terms at consecutive positions.
    Phrase {
        /// Target field.
        field: FieldName,
        /// Terms in order.
        terms: Vec<String>,
        /// Allowed positional distance.
        slop: u32,
    },
    /// Any term starting with `prefix`.
    Prefix {
        /// Target field.
        field: FieldName,
        /// Required prefix.
        prefix: String,
    },
    /// Any term matching a pattern where `*` matches any run of characters and
    /// `?` exactly one.
    Wildcard {
        /// Target field.
        field: FieldName,
        /// Pattern.
        pattern: String,
    },
    /// Any term within `distance` edits of `text`.
    Fuzzy {
        /// Target field.
        field: FieldName,
        /// Term text.
        text: String,
        /// Maximum edit distance.
        distance: u8,
    },
    /// Boolean combination.
    Boolean(BooleanQuery),
    /// Scales the score of the inner query.
    Boost {
        /// Inner query.
        query: Box<Self>,
        /// Score multiplier.
        factor: f32,
    },
    /// Numeric range over a document field. Bounds are inclusive.
    Range {
        /// Target field.
        field: Field,
        /// Lower bound, if any.
        lower: Option<i64>,
        /// Upper bound, if any.
        upper: Option<i64>,
    },
}

impl Query {
    /// A term on the given field.
    pub fn term(field: impl Into<FieldName>, text: impl Into<String>) -> Self {
        Self::Term {
            field: field.into(),
            text: text.into(),
        }
    }

    /// A term on the contents field.
    pub fn contents(text: impl Into<String>) -> Self {
        Self::term(Field::Contents, text)
    }

    /// A prefix query on the given field.
    pub fn prefix(field: impl Into<FieldName>, prefix: impl Into<String>) -> Self {
        Self::Prefix {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    /// A wildcard query on the given field.
    pub fn wildcard(field: impl Into<FieldName>, pattern: impl Into<String>) -> Self {
        Self::Wildcard {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// A fuzzy query with the default edit distance.
    pub fn fuzzy(field: impl Into<FieldName>, text: impl Into<String>) -> Self {
        Self::Fuzzy {
            field: field.into(),
            text: text.into(),
            distance: DEFAULT_FUZZY_DISTANCE,
        }
    }

    /// A boosted query.
    pub fn boost(query: Self, factor: f32) -> Self {
        Self::Boost {
            query: Box::new(query),
            factor,
        }
    }

    /// A boolean query, or `None` without clauses.
    pub fn boolean(clauses: Vec<Clause>) -> Option<Self> {
        BooleanQuery::new(clauses).map(Self::Boolean)
    }

    /// Optional clauses: at least one must match.
    ///
    /// A single query is returned unchanged.
    pub fn any_of(mut queries: Vec<Self>) -> Option<Self> {
        if queries.len() == 1 {
            return queries.pop();
        }
        Self::boolean(queries.into_iter().map(Clause::should).collect())
    }

    /// Required clauses: all must match.
    ///
    /// A single query is returned unchanged.
    pub fn all_of(mut queries: Vec<Self>) -> Option<Self> {
        if queries.len() == 1 {
            return queries.pop();
        }
        Self::boolean(queries.into_iter().map(Clause::must).collect())
    }

    /// Returns the targeted field of a leaf node.
    pub fn field(&self) -> Option<&FieldName> {
        match self {
            Self::Term { field, .. }
            | Self::Phrase { field, .. }
            | Self::Prefix { field, .. }
            | Self::Wildcard { field, .. }
            | Self::Fuzzy { field, .. } => Some(field),
            Self::Boolean(_) | Self::Boost { .. } | Self::Range { .. } => None,
        }
    }

    /// Returns the (field, text) pairs of every term and phrase word that is
    /// not under a prohibited clause, in traversal order.
    pub fn terms(&self) -> Vec<(FieldName, String)> {
        let mut terms = Vec::new();
        self.collect_terms(&mut terms);
        terms
    }

    /// Walks the tree for [`Self::terms`].
    fn collect_terms(&self, out: &mut Vec<(FieldName, String)>) {
        match self {
            Self::Term { field, text } => out.push((field.clone(), text.clone())),
            Self::Phrase { field, terms, .. } => {
                out.extend(terms.iter().map(|t| (field.clone(), t.clone())));
            }
            Self::Boolean(query) => {
                for clause in query.clauses() {
                    if clause.occur != Occur::MustNot {
                        clause.query.collect_terms(out);
                    }
                }
            }
            Self::Boost { query, .. } => query.collect_terms(out),
            Self::Prefix { .. }
            | Self::Wildcard { .. }
            | Self::Fuzzy { .. }
            | Self::Range { .. } => {}
        }
    }

    /// Writes the query, parenthesizing boolean operands.
    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(_) => write!(f, "({self})"),
            _ => write!(f, "{self}"),
        }
    }
}

impl fmt::Display for Query {
    /// Query-syntax rendering, used for logging and diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term { field, text } => write!(f, "{field}:{text}"),
            Self::Phrase { field, terms, slop } => {
                write!(f, "{field}:\"{}\"", terms.join(" "))?;
                if *slop > 0 {
                    write!(f, "~{slop}")?;
                }
                Ok(())
            }
            Self::Prefix { field, prefix } => write!(f, "{field}:{prefix}*"),
            Self::Wildcard { field, pattern } => write!(f, "{field}:{pattern}"),
            Self::Fuzzy {
                field,
                text,
                distance,
            } => write!(f, "{field}:{text}~{distance}"),
            Self::Boolean(query) => {
                for (idx, clause) in query.clauses().iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" ")?;
                    }
                    match clause.occur {
                        Occur::Must => f.write_str("+")?,
                        Occur::MustNot => f.write_str("-")?,
                        Occur::Should => {}
                    }
                    clause.query.fmt_operand(f)?;
                }
                Ok(())
            }
            Self::Boost { query, factor } => {
                query.fmt_operand(f)?;
                write!(f, "^{factor}")
            }
            Self::Range {
                field,
                lower,
                upper,
            } => {
                let lower = lower.map_or_else(|| "*".to_string(), |v| v.to_string());
                let upper = upper.map_or_else(|| "*".to_string(), |v| v.to_string());
                write!(f, "{field}:[{lower} TO {upper}]")
            }
        }
    }
}
