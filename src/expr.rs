//! Boundary to the expression subsystem.
//!
//! The normalizer never evaluates or inspects the structure of
//! expressions; it only needs a small capability surface: which
//! variables an expression mentions, whether it aggregates, and a
//! human-readable descriptor for error messages and debug dumps.
//! [`QueryExpression`] is that surface, and [`Expression`] is the
//! cloneable handle the rest of the crate passes around.

use crate::var::Variable;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Capability surface of the expression subsystem.
///
/// Implemented by the expression crate; the normalizer only consumes it.
pub trait QueryExpression: fmt::Debug + Send + Sync {
    /// All variables mentioned anywhere in the expression.
    fn contained_variables(&self) -> Vec<Variable>;

    /// Whether the expression contains an aggregate function anywhere.
    fn contains_aggregate(&self) -> bool;

    /// Whether the expression is an aggregate over the given group-by
    /// variables, i.e. every variable it mentions is either aggregated
    /// or part of the group.
    fn is_aggregate(&self, group_variables: &HashSet<Variable>) -> bool;

    /// The variables that are neither aggregated nor part of the group.
    fn unaggregated_variables(&self, group_variables: &HashSet<Variable>) -> Vec<Variable>;

    /// A human-readable rendering of the expression, typically close to
    /// how it was written in the query.
    fn descriptor(&self) -> String;
}

/// A shared handle to an expression.
///
/// Cloning is cheap; two clones refer to the same expression.
#[derive(Clone, Debug)]
pub struct Expression(Arc<dyn QueryExpression>);

impl Expression {
    /// Wrap an expression produced by the expression subsystem.
    pub fn new(inner: Arc<dyn QueryExpression>) -> Self {
        Self(inner)
    }

    /// All variables mentioned anywhere in the expression.
    pub fn contained_variables(&self) -> Vec<Variable> {
        self.0.contained_variables()
    }

    /// Whether the expression contains an aggregate function anywhere.
    pub fn contains_aggregate(&self) -> bool {
        self.0.contains_aggregate()
    }

    /// Whether the expression is an aggregate over `group_variables`.
    pub fn is_aggregate(&self, group_variables: &HashSet<Variable>) -> bool {
        self.0.is_aggregate(group_variables)
    }

    /// The variables that are neither aggregated nor grouped.
    pub fn unaggregated_variables(&self, group_variables: &HashSet<Variable>) -> Vec<Variable> {
        self.0.unaggregated_variables(group_variables)
    }

    /// Human-readable rendering for errors and debug dumps.
    pub fn descriptor(&self) -> String {
        self.0.descriptor()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Stub expressions for tests.

    use super::*;

    /// A test expression with fixed variables and aggregate-ness.
    #[derive(Debug)]
    pub struct StubExpression {
        descriptor: String,
        variables: Vec<Variable>,
        aggregate: bool,
    }

    impl StubExpression {
        /// A non-aggregate expression mentioning `variables`.
        pub fn plain(descriptor: &str, variables: &[&str]) -> Expression {
            Expression::new(Arc::new(Self {
                descriptor: descriptor.to_string(),
                variables: variables.iter().map(Variable::new).collect(),
                aggregate: false,
            }))
        }

        /// An aggregate expression over `variables` (e.g. `COUNT(?x)`).
        pub fn aggregate(descriptor: &str, variables: &[&str]) -> Expression {
            Expression::new(Arc::new(Self {
                descriptor: descriptor.to_string(),
                variables: variables.iter().map(Variable::new).collect(),
                aggregate: true,
            }))
        }
    }

    impl QueryExpression for StubExpression {
        fn contained_variables(&self) -> Vec<Variable> {
            self.variables.clone()
        }

        fn contains_aggregate(&self) -> bool {
            self.aggregate
        }

        fn is_aggregate(&self, group_variables: &HashSet<Variable>) -> bool {
            // An aggregate stub aggregates all its variables; a plain
            // stub is consistent only if every variable is grouped.
            self.aggregate || self.variables.iter().all(|v| group_variables.contains(v))
        }

        fn unaggregated_variables(&self, group_variables: &HashSet<Variable>) -> Vec<Variable> {
            if self.aggregate {
                return Vec::new();
            }
            self.variables
                .iter()
                .filter(|v| !group_variables.contains(v))
                .cloned()
                .collect()
        }

        fn descriptor(&self) -> String {
            self.descriptor.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StubExpression;
    use super::*;

    #[test]
    fn test_handle_delegation() {
        let expr = StubExpression::plain("?a + ?b", &["a", "b"]);
        assert_eq!(
            expr.contained_variables(),
            vec![Variable::new("a"), Variable::new("b")]
        );
        assert!(!expr.contains_aggregate());
        assert_eq!(expr.descriptor(), "?a + ?b");
        assert_eq!(expr.to_string(), "?a + ?b");
    }

    #[test]
    fn test_aggregate_over_group() {
        let group: HashSet<Variable> = [Variable::new("x")].into_iter().collect();

        let count = StubExpression::aggregate("COUNT(?y)", &["y"]);
        assert!(count.is_aggregate(&group));
        assert!(count.unaggregated_variables(&group).is_empty());

        let plain = StubExpression::plain("?x + ?y", &["x", "y"]);
        assert!(!plain.is_aggregate(&group));
        assert_eq!(
            plain.unaggregated_variables(&group),
            vec![Variable::new("y")]
        );
    }
}
