//! # Tern DB Query Normalizer
//!
//! The semantic-normalization core of the Tern DB query compiler, with:
//! - A graph-pattern tree with stable preorder identity numbering
//! - A variable-visibility registry shared by SELECT and CONSTRUCT
//! - A five-stage solution-modifier resolver (GROUP BY, HAVING,
//!   ORDER BY, LIMIT/OFFSET, SELECT alias normalization)
//! - Language-filter rewriting into the predicate encoding the index
//!   layer understands
//!
//! ## Architecture
//!
//! The grammar builds a [`ParsedQuery`]: a clause, a pattern tree, and
//! raw [`SolutionModifiers`]. Normalization happens in two moves:
//!
//! 1. **Assemble**: patterns are numbered ([`GraphPattern::recompute_ids`]),
//!    language filters rewritten ([`GraphPattern::add_language_filter`]),
//!    sub-queries inlined ([`ParsedQuery::merge`])
//! 2. **Resolve**: [`ParsedQuery::add_solution_modifiers`] validates and
//!    normalizes the modifier clauses in one pass, after which the query
//!    is ready for planning
//!
//! Expressions stay opaque behind the [`QueryExpression`] trait; the
//! normalizer only asks which variables they mention and whether they
//! aggregate.
//!
//! ## Quick Start
//!
//! ```
//! use tern_db_normalize::{
//!     Clause, GroupKey, ParsedQuery, SelectClause, SolutionModifiers, Variable,
//! };
//!
//! let mut clause = SelectClause::explicit();
//! clause.add_selected_variable(Variable::new("x"));
//!
//! let mut query = ParsedQuery::new(Clause::Select(clause));
//! query.register_variable_visible_in_query_body(Variable::new("x"));
//!
//! let modifiers = SolutionModifiers::new()
//!     .with_group_key(GroupKey::Variable(Variable::new("x")))
//!     .with_limit(10);
//! query.add_solution_modifiers(modifiers)?;
//!
//! assert_eq!(query.group_by_variables, vec![Variable::new("x")]);
//! assert_eq!(query.limit_offset.limit, Some(10));
//! # Ok::<(), tern_db_normalize::QueryError>(())
//! ```

pub mod clause;
pub mod error;
pub mod expr;
pub mod modifier;
pub mod pattern;
pub mod query;
pub mod term;
pub mod var;
pub mod vocab;

mod resolve;

// Re-exports
pub use clause::{Alias, Clause, ConstructClause, ConstructTriple, SelectClause};
pub use error::{ErrorMetadata, QueryError, Result};
pub use expr::{Expression, QueryExpression};
pub use modifier::{
    GroupKey, LimitOffsetClause, OrderClause, OrderKey, SolutionModifiers, VariableOrderKey,
};
pub use pattern::{
    BasicGraphPattern, Bind, Filter, GraphPattern, GraphPatternOperation, Service, TransPath,
    ValuesClause,
};
pub use query::ParsedQuery;
pub use term::{PropertyPath, Term, TriplePattern};
pub use var::{Variable, INTERNAL_VARIABLE_PREFIX};
