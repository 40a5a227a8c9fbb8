//! The recursive graph-pattern tree.
//!
//! A [`GraphPattern`] is one `{ }` scope: a filter list plus an ordered
//! sequence of [`GraphPatternOperation`] children. The operation enum is
//! a closed sum type with exhaustive matching everywhere, so adding a
//! new pattern kind forces every consumer (identity renumbering, the
//! debug rendering, the language-filter scan) to decide how to handle
//! it.
//!
//! ## Identity numbering
//!
//! Every `GraphPattern` and every `Values` node carries an integer
//! identity assigned by a preorder traversal counter. Identities are
//! unique within one numbering pass and a parent's identity is strictly
//! less than any descendant's. The numbering is recomputed in full
//! after structural mutations (see [`ParsedQuery::merge`]); re-running
//! it on an unchanged tree is a no-op.
//!
//! `Basic`, `Bind`, `Subquery`, and `Service` nodes intentionally carry
//! no identity: subqueries start their own numbering when they are
//! themselves normalized, and the planner addresses the other three
//! through their owning pattern.
//!
//! [`ParsedQuery::merge`]: crate::ParsedQuery::merge

use crate::expr::Expression;
use crate::query::ParsedQuery;
use crate::term::{PropertyPath, Term, TriplePattern};
use crate::var::Variable;
use crate::vocab;
use std::fmt;
use std::sync::Arc;

/// A boolean condition scoped to one pattern level.
#[derive(Clone, Debug)]
pub struct Filter {
    /// The filter condition
    pub expression: Expression,
}

impl Filter {
    /// Create a new filter.
    pub fn new(expression: Expression) -> Self {
        Self { expression }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FILTER({})", self.expression.descriptor())
    }
}

/// An ordered sequence of triple patterns.
#[derive(Clone, Debug, Default)]
pub struct BasicGraphPattern {
    /// The triples, in pattern order
    pub triples: Vec<TriplePattern>,
}

/// A bind operation: compute an expression, assign it to a variable.
///
/// The same representation serves user-written `BIND` clauses, compiled
/// SELECT aliases, and the internal binds the resolver materializes for
/// expression GROUP BY / ORDER BY keys.
#[derive(Clone, Debug)]
pub struct Bind {
    /// The bound expression
    pub expression: Expression,
    /// The target variable
    pub target: Variable,
}

/// An inline table of bindings. Carries its own identity.
#[derive(Clone, Debug)]
pub struct ValuesClause {
    /// Identity assigned by the numbering pass
    pub id: u64,
    /// The bound variables, in declaration order
    pub variables: Vec<Variable>,
    /// One row per binding; row length matches `variables`
    pub rows: Vec<Vec<Term>>,
}

impl ValuesClause {
    /// Create a values clause. The identity is assigned by the next
    /// numbering pass.
    pub fn new(variables: Vec<Variable>, rows: Vec<Vec<Term>>) -> Self {
        Self {
            id: 0,
            variables,
            rows,
        }
    }
}

/// A pattern delegated to an external endpoint.
#[derive(Clone, Debug)]
pub struct Service {
    /// The endpoint: an IRI or a variable
    pub endpoint: Term,
    /// The delegated pattern; not renumbered by the owning query
    pub pattern: GraphPattern,
    /// SILENT modifier present
    pub silent: bool,
}

/// A transitive property-path pattern.
#[derive(Clone, Debug)]
pub struct TransPath {
    pub subject: Term,
    pub object: Term,
    /// Minimum number of path steps
    pub min: u64,
    /// Maximum number of path steps, if bounded
    pub max: Option<u64>,
    /// The single-step pattern; not renumbered by the owning query
    pub pattern: GraphPattern,
}

/// One node in a graph pattern's child sequence.
#[derive(Clone, Debug)]
pub enum GraphPatternOperation {
    /// A basic graph pattern (triples only)
    Basic(BasicGraphPattern),
    /// A bind operation
    Bind(Bind),
    /// `OPTIONAL { ... }`
    Optional(GraphPattern),
    /// `{ ... } UNION { ... }`
    Union {
        left: GraphPattern,
        right: GraphPattern,
    },
    /// `MINUS { ... }`
    Minus(GraphPattern),
    /// A nested `{ ... }` block
    Group(GraphPattern),
    /// An inline VALUES table
    Values(ValuesClause),
    /// An embedded, independently scoped query
    Subquery(Box<ParsedQuery>),
    /// A pattern delegated to an external endpoint
    Service(Service),
    /// A transitive property-path pattern
    TransPath(TransPath),
}

/// One `{ }` scope of a query body.
#[derive(Clone, Debug, Default)]
pub struct GraphPattern {
    /// Identity assigned by the numbering pass
    pub id: u64,
    /// Filters scoped to this pattern level
    pub filters: Vec<Filter>,
    /// Child nodes, in pattern order
    pub children: Vec<GraphPatternOperation>,
}

impl GraphPattern {
    /// Create an empty graph pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute identity numbering over this pattern and its
    /// descendants, preorder.
    ///
    /// The counter is threaded explicitly: assign, increment, recurse.
    /// Only the structural sub-patterns of each child are entered;
    /// `Subquery` children keep their own independent id space and
    /// `TransPath` sub-patterns are not renumbered by the owning query.
    pub fn recompute_ids(&mut self, counter: &mut u64) {
        self.id = *counter;
        *counter += 1;
        for child in &mut self.children {
            match child {
                GraphPatternOperation::Union { left, right } => {
                    left.recompute_ids(counter);
                    right.recompute_ids(counter);
                }
                GraphPatternOperation::Optional(pattern)
                | GraphPatternOperation::Minus(pattern)
                | GraphPatternOperation::Group(pattern) => {
                    pattern.recompute_ids(counter);
                }
                GraphPatternOperation::Values(values) => {
                    values.id = *counter;
                    *counter += 1;
                }
                GraphPatternOperation::TransPath(_) => {
                    // The single-step sub-pattern keeps its ids.
                }
                GraphPatternOperation::Basic(_)
                | GraphPatternOperation::Bind(_)
                | GraphPatternOperation::Subquery(_)
                | GraphPatternOperation::Service(_) => {
                    // No identity of their own.
                }
            }
        }
    }

    /// Rewrite a scope-wide language constraint on `variable` into
    /// triple-level annotations, or a synthetic triple if none apply.
    ///
    /// Scans the basic graph patterns directly owned by this pattern
    /// (filters have the whole pattern as their scope) for triples
    /// whose object is `variable` and whose predicate is a bare IRI,
    /// and prefixes each matching predicate with `@<langtag>@`. The
    /// planner exploits the annotated predicate through a specialized
    /// index path.
    ///
    /// If nothing matched, a triple
    /// `?variable <language-predicate> <language-entity>` is appended
    /// instead; always correct, less efficient.
    ///
    /// Nested scopes (OPTIONAL, UNION, subqueries, ...) are not
    /// entered.
    pub fn add_language_filter(&mut self, variable: &Variable, language_in_quotes: &str) {
        let langtag = language_in_quotes.trim_matches('"');

        let mut found_match = false;
        for child in &mut self.children {
            let GraphPatternOperation::Basic(basic) = child else {
                continue;
            };
            for triple in &mut basic.triples {
                if triple.object.as_var() != Some(variable) {
                    continue;
                }
                if let PropertyPath::Iri(iri) = &mut triple.predicate {
                    *iri = Arc::from(format!("@{langtag}@{iri}"));
                    found_match = true;
                }
            }
        }

        if !found_match {
            tracing::debug!(
                variable = %variable,
                langtag,
                "language filter variable does not appear as the object of any \
                 rewritable triple; adding a language-predicate triple instead"
            );

            if !matches!(
                self.children.last(),
                Some(GraphPatternOperation::Basic(_))
            ) {
                self.children
                    .push(GraphPatternOperation::Basic(BasicGraphPattern::default()));
            }
            let Some(GraphPatternOperation::Basic(basic)) = self.children.last_mut() else {
                unreachable!("a trailing basic graph pattern was just ensured");
            };
            basic.triples.push(TriplePattern::new(
                Term::Var(variable.clone()),
                PropertyPath::from_iri(vocab::LANGUAGE_PREDICATE),
                Term::Iri(vocab::convert_langtag_to_entity_uri(langtag)),
            ));
        }
    }

    pub(crate) fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indentation: usize) -> fmt::Result {
        let outer = "  ".repeat(indentation.saturating_sub(1));
        let inner = "  ".repeat(indentation);
        write!(f, "{outer}{{")?;
        for filter in &self.filters {
            write!(f, "\n{inner}{filter}")?;
        }
        for child in &self.children {
            writeln!(f)?;
            child.fmt_indented(f, indentation + 1)?;
        }
        write!(f, "\n{outer}}}")
    }
}

impl fmt::Display for GraphPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 1)
    }
}

impl GraphPatternOperation {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indentation: usize) -> fmt::Result {
        let pad = "  ".repeat(indentation.saturating_sub(1));
        match self {
            GraphPatternOperation::Basic(basic) => {
                if basic.triples.is_empty() {
                    return write!(f, "{pad}{{}}");
                }
                for (i, triple) in basic.triples.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{pad}{triple}")?;
                }
                Ok(())
            }
            GraphPatternOperation::Bind(bind) => {
                write!(f, "{pad}BIND({} AS {})", bind.expression.descriptor(), bind.target)
            }
            GraphPatternOperation::Optional(pattern) => {
                writeln!(f, "{pad}OPTIONAL")?;
                pattern.fmt_indented(f, indentation)
            }
            GraphPatternOperation::Union { left, right } => {
                left.fmt_indented(f, indentation)?;
                writeln!(f, "\n{pad}UNION")?;
                right.fmt_indented(f, indentation)
            }
            GraphPatternOperation::Minus(pattern) => {
                writeln!(f, "{pad}MINUS")?;
                pattern.fmt_indented(f, indentation)
            }
            GraphPatternOperation::Group(pattern) => {
                writeln!(f, "{pad}GROUP")?;
                pattern.fmt_indented(f, indentation)
            }
            GraphPatternOperation::Values(values) => {
                let vars: Vec<String> = values.variables.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "{pad}VALUES ({}) [{} rows, id {}]",
                    vars.join(" "),
                    values.rows.len(),
                    values.id
                )
            }
            GraphPatternOperation::Subquery(query) => {
                writeln!(f, "{pad}SUBQUERY")?;
                query.root_graph_pattern.fmt_indented(f, indentation)
            }
            GraphPatternOperation::Service(service) => {
                writeln!(f, "{pad}SERVICE {}", service.endpoint)?;
                service.pattern.fmt_indented(f, indentation)
            }
            GraphPatternOperation::TransPath(path) => {
                let max = match path.max {
                    Some(max) => max.to_string(),
                    None => "*".to_string(),
                };
                writeln!(
                    f,
                    "{pad}TRANS-PATH {} -> {} [{}, {}]",
                    path.subject, path.object, path.min, max
                )?;
                path.pattern.fmt_indented(f, indentation)
            }
        }
    }
}
