//! The top-level parsed-query object.
//!
//! A [`ParsedQuery`] owns a clause, the root graph pattern, and the
//! resolved solution modifiers. The grammar constructs it with raw
//! modifier clauses still un-normalized; the solution-modifier resolver
//! ([`ParsedQuery::add_solution_modifiers`], see the `resolve` module)
//! then mutates it exactly once, after which downstream consumers treat
//! it as immutable — except for [`ParsedQuery::merge`], which inlines
//! another query's body and renumbers pattern identities.

use crate::clause::{Alias, Clause, ConstructClause, SelectClause};
use crate::expr::Expression;
use crate::modifier::{LimitOffsetClause, VariableOrderKey};
use crate::pattern::{Bind, GraphPattern, GraphPatternOperation};
use crate::var::Variable;
use std::fmt;

/// A parsed query, normalized in place by the resolver.
#[derive(Clone, Debug)]
pub struct ParsedQuery {
    /// The SELECT or CONSTRUCT clause
    pub clause: Clause,
    /// The query body
    pub root_graph_pattern: GraphPattern,
    /// Resolved GROUP BY variables, in clause order
    pub group_by_variables: Vec<Variable>,
    /// HAVING expressions, stored verbatim
    pub having_clauses: Vec<Expression>,
    /// Resolved ORDER BY keys; expression keys have been materialized
    /// as internal variables
    pub order_by: Vec<VariableOrderKey>,
    /// LIMIT/OFFSET/TEXTLIMIT
    pub limit_offset: LimitOffsetClause,
    /// Whether the ORDER BY was generated by the engine rather than
    /// written by the user; affects display/explain output only
    pub is_internal_sort: bool,
    /// Number of pattern identities assigned by the last numbering pass
    pub num_graph_patterns: u64,
    pub(crate) num_internal_variables: u64,
}

impl ParsedQuery {
    /// Create an empty query around a clause. The grammar fills in the
    /// pattern tree afterwards.
    pub fn new(clause: Clause) -> Self {
        Self {
            clause,
            root_graph_pattern: GraphPattern::new(),
            group_by_variables: Vec::new(),
            having_clauses: Vec::new(),
            order_by: Vec::new(),
            limit_offset: LimitOffsetClause::default(),
            is_internal_sort: false,
            num_graph_patterns: 0,
            num_internal_variables: 0,
        }
    }

    /// Whether the clause is a SELECT clause.
    pub fn has_select_clause(&self) -> bool {
        matches!(self.clause, Clause::Select(_))
    }

    /// Whether the clause is a CONSTRUCT clause.
    pub fn has_construct_clause(&self) -> bool {
        matches!(self.clause, Clause::Construct(_))
    }

    /// The SELECT clause, if the query has one.
    pub fn select_clause(&self) -> Option<&SelectClause> {
        match &self.clause {
            Clause::Select(c) => Some(c),
            Clause::Construct(_) => None,
        }
    }

    /// The CONSTRUCT clause, if the query has one.
    pub fn construct_clause(&self) -> Option<&ConstructClause> {
        match &self.clause {
            Clause::Select(_) => None,
            Clause::Construct(c) => Some(c),
        }
    }

    /// The SELECT aliases; empty for CONSTRUCT queries, which have none.
    pub fn aliases(&self) -> &[Alias] {
        match &self.clause {
            Clause::Select(c) => c.aliases(),
            Clause::Construct(_) => &[],
        }
    }

    /// The variables visible in the query body, in registration order.
    pub fn visible_variables(&self) -> &[Variable] {
        self.clause.visible_variables()
    }

    /// Register one variable as visible in the query body.
    pub fn register_variable_visible_in_query_body(&mut self, variable: Variable) {
        self.clause.add_visible_variable(variable);
    }

    /// Register several variables as visible in the query body.
    pub fn register_variables_visible_in_query_body(&mut self, variables: &[Variable]) {
        for variable in variables {
            self.clause.add_visible_variable(variable.clone());
        }
    }

    /// The selected variables (SELECT) or the template variables
    /// (CONSTRUCT).
    pub fn constructed_or_selected_variables(&self) -> Vec<Variable> {
        match &self.clause {
            Clause::Select(c) => c.selected_variables(),
            Clause::Construct(c) => c.contained_variables().to_vec(),
        }
    }

    /// Append a bind operation to the end of the query body.
    ///
    /// When `target_is_visible` is false the target stays out of the
    /// visible set and therefore out of `SELECT *`; this is how
    /// internal helper binds are kept invisible.
    pub fn add_bind(&mut self, expression: Expression, target: Variable, target_is_visible: bool) {
        if target_is_visible {
            self.register_variable_visible_in_query_body(target.clone());
        }
        self.root_graph_pattern
            .children
            .push(GraphPatternOperation::Bind(Bind { expression, target }));
    }

    /// Bind `expression` to a fresh internal variable at the end of the
    /// query body and return that variable.
    ///
    /// The target is deliberately not registered as visible, so it can
    /// never be selected by `SELECT *` or collide with user variables.
    pub(crate) fn add_internal_bind(&mut self, expression: Expression) -> Variable {
        let target = Variable::internal(self.num_internal_variables);
        self.num_internal_variables += 1;
        self.add_bind(expression, target.clone(), false);
        target
    }

    /// Inline another query's body: append its root-pattern children
    /// after this query's (order preserved), then recompute identity
    /// numbering over the combined tree.
    ///
    /// Operates on pattern structure only; the other query's clause and
    /// modifiers are discarded.
    pub fn merge(&mut self, other: ParsedQuery) {
        self.root_graph_pattern
            .children
            .extend(other.root_graph_pattern.children);

        let mut counter = 0;
        self.root_graph_pattern.recompute_ids(&mut counter);
        self.num_graph_patterns = counter;
    }
}

impl fmt::Display for ParsedQuery {
    /// Deterministic, human-readable dump for logs and test fixtures.
    /// Not a parseable format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.clause {
            Clause::Select(select) => {
                let vars: Vec<String> = select
                    .selected_variables()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                writeln!(f, "SELECT: {{")?;
                writeln!(f, "  {}", vars.join(", "))?;
                writeln!(f, "}}")?;
                writeln!(f, "ALIASES: {{")?;
                for alias in select.aliases() {
                    writeln!(f, "  {alias}")?;
                }
                writeln!(f, "}}")?;
            }
            Clause::Construct(construct) => {
                writeln!(f, "CONSTRUCT {{")?;
                for triple in construct.template() {
                    writeln!(f, "  {triple}")?;
                }
                writeln!(f, "}}")?;
            }
        }

        writeln!(f, "WHERE:")?;
        self.root_graph_pattern.fmt_indented(f, 1)?;
        writeln!(f)?;

        match self.limit_offset.limit {
            Some(limit) => writeln!(f, "LIMIT: {limit}")?,
            None => writeln!(f, "LIMIT: none")?,
        }
        match self.limit_offset.text_limit {
            Some(text_limit) => writeln!(f, "TEXTLIMIT: {text_limit}")?,
            None => writeln!(f, "TEXTLIMIT: none")?,
        }
        writeln!(f, "OFFSET: {}", self.limit_offset.offset)?;

        if let Clause::Select(select) = &self.clause {
            writeln!(
                f,
                "DISTINCT modifier is {}present.",
                if select.distinct { "" } else { "not " }
            )?;
            writeln!(
                f,
                "REDUCED modifier is {}present.",
                if select.reduced { "" } else { "not " }
            )?;
        }

        write!(f, "ORDER BY: ")?;
        if self.order_by.is_empty() {
            writeln!(f, "not specified")?;
        } else {
            let keys: Vec<String> = self
                .order_by
                .iter()
                .map(|key| {
                    format!(
                        "{} {}",
                        key.variable,
                        if key.descending { "(DESC)" } else { "(ASC)" }
                    )
                })
                .collect();
            writeln!(f, "{}", keys.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::testing::StubExpression;
    use crate::pattern::BasicGraphPattern;
    use crate::term::{PropertyPath, Term, TriplePattern};

    fn select_query() -> ParsedQuery {
        ParsedQuery::new(Clause::Select(SelectClause::asterisk()))
    }

    fn basic_child() -> GraphPatternOperation {
        GraphPatternOperation::Basic(BasicGraphPattern {
            triples: vec![TriplePattern::new(
                Term::Var(Variable::new("s")),
                PropertyPath::from_iri("http://example.org/p"),
                Term::Var(Variable::new("o")),
            )],
        })
    }

    // =========================================================================
    // Binds and internal variables
    // =========================================================================

    #[test]
    fn test_add_bind_visibility() {
        let mut query = select_query();
        query.add_bind(
            StubExpression::plain("?a + 1", &["a"]),
            Variable::new("b"),
            true,
        );
        assert_eq!(query.visible_variables(), &[Variable::new("b")]);
        assert_eq!(query.root_graph_pattern.children.len(), 1);

        query.add_bind(
            StubExpression::plain("?a + 2", &["a"]),
            Variable::new("c"),
            false,
        );
        assert_eq!(query.visible_variables(), &[Variable::new("b")]);
        assert_eq!(query.root_graph_pattern.children.len(), 2);
    }

    #[test]
    fn test_internal_binds_are_fresh_and_invisible() {
        let mut query = select_query();
        let first = query.add_internal_bind(StubExpression::plain("?a + 1", &["a"]));
        let second = query.add_internal_bind(StubExpression::plain("?a + 2", &["a"]));

        assert_ne!(first, second);
        assert!(first.is_internal());
        assert!(second.is_internal());
        assert!(query.visible_variables().is_empty());
        assert_eq!(query.root_graph_pattern.children.len(), 2);
    }

    // =========================================================================
    // Merge
    // =========================================================================

    #[test]
    fn test_merge_appends_children_and_renumbers() {
        let mut left = select_query();
        left.root_graph_pattern.children.push(basic_child());
        left.root_graph_pattern
            .children
            .push(GraphPatternOperation::Optional(GraphPattern::new()));
        let mut counter = 0;
        left.root_graph_pattern.recompute_ids(&mut counter);
        left.num_graph_patterns = counter;

        let mut right = select_query();
        right
            .root_graph_pattern
            .children
            .push(GraphPatternOperation::Group(GraphPattern::new()));
        right.root_graph_pattern.children.push(basic_child());

        left.merge(right);

        assert_eq!(left.root_graph_pattern.children.len(), 4);
        // Fresh, contiguous ids from zero: root, optional child, group child.
        assert_eq!(left.num_graph_patterns, 3);
        assert_eq!(left.root_graph_pattern.id, 0);
        let GraphPatternOperation::Optional(optional) = &left.root_graph_pattern.children[1]
        else {
            panic!("expected optional child");
        };
        assert_eq!(optional.id, 1);
        let GraphPatternOperation::Group(group) = &left.root_graph_pattern.children[2] else {
            panic!("expected group child");
        };
        assert_eq!(group.id, 2);
    }

    // =========================================================================
    // Display
    // =========================================================================

    #[test]
    fn test_display_select_dump() {
        let mut clause = SelectClause::explicit();
        clause.add_selected_variable(Variable::new("x"));
        clause.distinct = true;
        let mut query = ParsedQuery::new(Clause::Select(clause));
        query.root_graph_pattern.children.push(basic_child());
        query.limit_offset.limit = Some(10);
        query
            .order_by
            .push(VariableOrderKey::new(Variable::new("x"), true));

        let dump = query.to_string();
        assert!(dump.contains("SELECT: {\n  ?x\n}"));
        assert!(dump.contains("WHERE:"));
        assert!(dump.contains("{s: ?s, p: <http://example.org/p>, o: ?o}"));
        assert!(dump.contains("LIMIT: 10"));
        assert!(dump.contains("TEXTLIMIT: none"));
        assert!(dump.contains("OFFSET: 0"));
        assert!(dump.contains("DISTINCT modifier is present."));
        assert!(dump.contains("REDUCED modifier is not present."));
        assert!(dump.contains("ORDER BY: ?x (DESC)"));
    }

    #[test]
    fn test_display_construct_dump() {
        use crate::clause::{ConstructClause, ConstructTriple};
        let clause = ConstructClause::new(vec![ConstructTriple::new(
            Term::Var(Variable::new("s")),
            Term::iri("http://example.org/p"),
            Term::Var(Variable::new("o")),
        )]);
        let query = ParsedQuery::new(Clause::Construct(clause));

        let dump = query.to_string();
        assert!(dump.contains("CONSTRUCT {"));
        assert!(dump.contains("?s <http://example.org/p> ?o ."));
        assert!(dump.contains("ORDER BY: not specified"));
        assert!(!dump.contains("DISTINCT"));
    }
}
