//! SELECT and CONSTRUCT clauses, aliases, and variable visibility.
//!
//! Both clause kinds track the set of variables *visible* in the query
//! body: the variables observably bound at the top level of the clause.
//! This set is the sole oracle for every "is this variable usable here"
//! check in the solution-modifier resolver. It grows during parsing and
//! resolution and never shrinks.

use crate::expr::Expression;
use crate::term::Term;
use crate::var::Variable;
use std::fmt;

/// A SELECT alias: `(expression AS ?target)`.
#[derive(Clone, Debug)]
pub struct Alias {
    /// The aliased expression
    pub expression: Expression,
    /// The target variable
    pub target: Variable,
}

impl Alias {
    /// Create a new alias.
    pub fn new(expression: Expression, target: Variable) -> Self {
        Self { expression, target }
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} AS {})", self.expression.descriptor(), self.target)
    }
}

/// What a SELECT clause selects: everything, or an explicit list.
#[derive(Clone, Debug)]
enum Selection {
    /// `SELECT *`
    Asterisk,
    /// Explicit variable list (alias targets included, in clause order)
    Explicit(Vec<Variable>),
}

/// A SELECT clause.
///
/// Alias targets appear both in the alias list and in the explicit
/// selection, in the order written. After the resolver runs on a
/// non-grouping query, the alias list is empty and the selection is
/// unchanged (aliases become ordinary binds in the query body).
#[derive(Clone, Debug)]
pub struct SelectClause {
    /// DISTINCT modifier present
    pub distinct: bool,
    /// REDUCED modifier present
    pub reduced: bool,
    selection: Selection,
    aliases: Vec<Alias>,
    visible_variables: Vec<Variable>,
}

impl SelectClause {
    /// Create a `SELECT *` clause.
    pub fn asterisk() -> Self {
        Self {
            distinct: false,
            reduced: false,
            selection: Selection::Asterisk,
            aliases: Vec::new(),
            visible_variables: Vec::new(),
        }
    }

    /// Create a SELECT clause with an empty explicit selection.
    pub fn explicit() -> Self {
        Self {
            distinct: false,
            reduced: false,
            selection: Selection::Explicit(Vec::new()),
            aliases: Vec::new(),
            visible_variables: Vec::new(),
        }
    }

    /// Append a bare variable to the explicit selection.
    ///
    /// Converts an asterisk clause to an explicit one; the grammar only
    /// produces one of the two shapes.
    pub fn add_selected_variable(&mut self, variable: Variable) {
        match &mut self.selection {
            Selection::Explicit(vars) => vars.push(variable),
            Selection::Asterisk => {
                self.selection = Selection::Explicit(vec![variable]);
            }
        }
    }

    /// Append an alias; its target also joins the explicit selection.
    pub fn add_alias(&mut self, alias: Alias) {
        self.add_selected_variable(alias.target.clone());
        self.aliases.push(alias);
    }

    /// Whether this clause selects all variables via `*`.
    pub fn is_asterisk(&self) -> bool {
        matches!(self.selection, Selection::Asterisk)
    }

    /// The selected variables.
    ///
    /// An asterisk expands to the visible variables, excluding
    /// normalizer-internal ones.
    pub fn selected_variables(&self) -> Vec<Variable> {
        match &self.selection {
            Selection::Asterisk => self
                .visible_variables
                .iter()
                .filter(|v| !v.is_internal())
                .cloned()
                .collect(),
            Selection::Explicit(vars) => vars.clone(),
        }
    }

    /// The aliases of this clause.
    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    /// Drop all aliases, keeping the selected variables unchanged.
    ///
    /// Called after aliases have been compiled to binds in the query
    /// body; downstream consumers then see aliasing as ordinary binding.
    pub fn delete_aliases_but_keep_variables(&mut self) {
        self.aliases.clear();
    }

    /// The variables visible in the query body, in registration order.
    pub fn visible_variables(&self) -> &[Variable] {
        &self.visible_variables
    }

    /// Register a variable as visible. Repeated registration has no
    /// effect.
    pub fn add_visible_variable(&mut self, variable: Variable) {
        if !self.visible_variables.contains(&variable) {
            self.visible_variables.push(variable);
        }
    }
}

/// A triple in a CONSTRUCT template. Predicates are plain terms here;
/// templates have no property paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructTriple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl ConstructTriple {
    /// Create a new template triple.
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl fmt::Display for ConstructTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// A CONSTRUCT clause: a template of triples to build per solution.
///
/// The visible set starts out as the distinct variables of the
/// template, in first-occurrence order.
#[derive(Clone, Debug)]
pub struct ConstructClause {
    template: Vec<ConstructTriple>,
    contained_variables: Vec<Variable>,
    visible_variables: Vec<Variable>,
}

impl ConstructClause {
    /// Create a CONSTRUCT clause from its template.
    pub fn new(template: Vec<ConstructTriple>) -> Self {
        let mut contained = Vec::new();
        for triple in &template {
            for term in [&triple.subject, &triple.predicate, &triple.object] {
                if let Term::Var(v) = term {
                    if !contained.contains(v) {
                        contained.push(v.clone());
                    }
                }
            }
        }
        Self {
            template,
            visible_variables: contained.clone(),
            contained_variables: contained,
        }
    }

    /// The template triples.
    pub fn template(&self) -> &[ConstructTriple] {
        &self.template
    }

    /// The distinct variables of the template, in first-occurrence order.
    pub fn contained_variables(&self) -> &[Variable] {
        &self.contained_variables
    }

    /// The variables visible in the query body, in registration order.
    pub fn visible_variables(&self) -> &[Variable] {
        &self.visible_variables
    }

    /// Register a variable as visible. Repeated registration has no
    /// effect.
    pub fn add_visible_variable(&mut self, variable: Variable) {
        if !self.visible_variables.contains(&variable) {
            self.visible_variables.push(variable);
        }
    }
}

/// The clause of a query: SELECT or CONSTRUCT.
#[derive(Clone, Debug)]
pub enum Clause {
    Select(SelectClause),
    Construct(ConstructClause),
}

impl Clause {
    /// The variables visible in the query body, in registration order.
    pub fn visible_variables(&self) -> &[Variable] {
        match self {
            Clause::Select(c) => c.visible_variables(),
            Clause::Construct(c) => c.visible_variables(),
        }
    }

    /// Register a variable as visible in the query body.
    pub fn add_visible_variable(&mut self, variable: Variable) {
        match self {
            Clause::Select(c) => c.add_visible_variable(variable),
            Clause::Construct(c) => c.add_visible_variable(variable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::testing::StubExpression;

    // =========================================================================
    // Visibility registry
    // =========================================================================

    #[test]
    fn test_visibility_grows_and_deduplicates() {
        let mut clause = Clause::Select(SelectClause::asterisk());
        clause.add_visible_variable(Variable::new("a"));
        clause.add_visible_variable(Variable::new("b"));
        clause.add_visible_variable(Variable::new("a"));
        assert_eq!(
            clause.visible_variables(),
            &[Variable::new("a"), Variable::new("b")]
        );
    }

    #[test]
    fn test_asterisk_expansion_skips_internal_variables() {
        let mut clause = SelectClause::asterisk();
        clause.add_visible_variable(Variable::new("a"));
        clause.add_visible_variable(Variable::new("__internal_0"));
        clause.add_visible_variable(Variable::new("b"));
        assert_eq!(
            clause.selected_variables(),
            vec![Variable::new("a"), Variable::new("b")]
        );
    }

    // =========================================================================
    // SELECT clause
    // =========================================================================

    #[test]
    fn test_alias_target_joins_selection() {
        let mut clause = SelectClause::explicit();
        clause.add_selected_variable(Variable::new("x"));
        clause.add_alias(Alias::new(
            StubExpression::aggregate("COUNT(?y)", &["y"]),
            Variable::new("c"),
        ));

        assert!(!clause.is_asterisk());
        assert_eq!(
            clause.selected_variables(),
            vec![Variable::new("x"), Variable::new("c")]
        );
        assert_eq!(clause.aliases().len(), 1);

        clause.delete_aliases_but_keep_variables();
        assert!(clause.aliases().is_empty());
        assert_eq!(
            clause.selected_variables(),
            vec![Variable::new("x"), Variable::new("c")]
        );
    }

    // =========================================================================
    // CONSTRUCT clause
    // =========================================================================

    #[test]
    fn test_construct_contained_variables() {
        let clause = ConstructClause::new(vec![
            ConstructTriple::new(
                Term::Var(Variable::new("s")),
                Term::iri("http://example.org/p"),
                Term::Var(Variable::new("o")),
            ),
            ConstructTriple::new(
                Term::Var(Variable::new("o")),
                Term::iri("http://example.org/q"),
                Term::literal("fixed"),
            ),
        ]);
        assert_eq!(
            clause.contained_variables(),
            &[Variable::new("s"), Variable::new("o")]
        );
        assert_eq!(clause.visible_variables(), clause.contained_variables());
    }
}
