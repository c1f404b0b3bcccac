//! Query syntax tree.
//!
//! The direct result of parsing a query string, before analysis. Lowering
//! turns it into a [`crate::Query`].

use std::fmt;

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpr {
    /// A single word as typed, possibly carrying wildcards or a fuzzy suffix.
    Term(String),

    /// A quoted sequence of words.
    Phrase(Vec<String>),

    /// Documents matching the inner expression are excluded.
    Not(Box<Self>),

    /// Every operand must match.
    And(Vec<Self>),

    /// Any operand may match.
    Or(Vec<Self>),

    /// `name:expr`.
    Field {
        /// Field name as typed (e.g., ext, proj, modified).
        name: String,
        /// Value matched against that field.
        expr: Box<Self>,
    },

    /// `expr^factor`.
    Boost {
        /// Boosted operand.
        expr: Box<Self>,
        /// Score multiplier.
        factor: f32,
    },
}

impl QueryExpr {
    /// Conjunction of `exprs`, splicing in operands of nested conjunctions.
    pub fn and(exprs: Vec<Self>) -> Self {
        Self::flatten(exprs, true)
    }

    /// Disjunction of `exprs`, splicing in operands of nested disjunctions.
    pub fn or(exprs: Vec<Self>) -> Self {
        Self::flatten(exprs, false)
    }

    /// Shared flattening for [`Self::and`] and [`Self::or`].
    fn flatten(exprs: Vec<Self>, conjunction: bool) -> Self {
        let mut flattened: Vec<Self> = Vec::with_capacity(exprs.len());
        for expr in exprs {
            match (expr, conjunction) {
                (Self::And(inner), true) | (Self::Or(inner), false) => flattened.extend(inner),
                (other, _) => flattened.push(other),
            }
        }

        if flattened.len() == 1 {
            return flattened.remove(0);
        }
        if conjunction {
            Self::And(flattened)
        } else {
            Self::Or(flattened)
        }
    }

    /// `expr^factor`.
    pub fn boost(expr: Self, factor: f32) -> Self {
        Self::Boost {
            expr: Box::new(expr),
            factor,
        }
    }

    /// Formats the expression as a query string that parses back to itself.
    pub fn to_query_string(&self) -> String {
        match self {
            Self::Term(text) => text.clone(),
            Self::Phrase(words) => format!("\"{}\"", words.join(" ")),
            Self::Not(inner) => format!("-{}", inner.grouped()),
            Self::And(exprs) => exprs
                .iter()
                .map(Self::grouped)
                .collect::<Vec<_>>()
                .join(" "),
            Self::Or(exprs) => exprs
                .iter()
                .map(Self::grouped)
                .collect::<Vec<_>>()
                .join(" OR "),
            Self::Field { name, expr } => format!("{name}:{}", expr.grouped()),
            Self::Boost { expr, factor } => format!("{}^{factor}", expr.grouped()),
        }
    }

    /// Formats the expression, parenthesized if it has several operands.
    fn grouped(&self) -> String {
        match self {
            Self::And(exprs) | Self::Or(exprs) if exprs.len() > 1 => {
                format!("({})", self.to_query_string())
            }
            _ => self.to_query_string(),
        }
    }

    /// One line per node, children indented under their parent.
    fn write_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            Self::Term(text) => writeln!(f, "{pad}Term({text:?})"),
            Self::Phrase(words) => writeln!(f, "{pad}Phrase({words:?})"),
            Self::Not(inner) => {
                writeln!(f, "{pad}Not")?;
                inner.write_tree(f, indent + 1)
            }
            Self::And(exprs) | Self::Or(exprs) => {
                let label = if matches!(self, Self::And(_)) { "And" } else { "Or" };
                writeln!(f, "{pad}{label}")?;
                for expr in exprs {
                    expr.write_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::Field { name, expr } => {
                writeln!(f, "{pad}Field({name:?})")?;
                expr.write_tree(f, indent + 1)
            }
            Self::Boost { expr, factor } => {
                writeln!(f, "{pad}Boost({factor})")?;
                expr.write_tree(f, indent + 1)
            }
        }
    }
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}
