//! Raw solution-modifier clauses, as produced by the grammar.
//!
//! [`SolutionModifiers`] is the transient input to
//! [`ParsedQuery::add_solution_modifiers`](crate::ParsedQuery::add_solution_modifiers):
//! GROUP BY keys, HAVING expressions, ORDER BY keys, and
//! LIMIT/OFFSET/TEXTLIMIT, exactly as written. The resolver consumes it
//! once and leaves the query in its normalized shape.

use crate::clause::Alias;
use crate::expr::Expression;
use crate::var::Variable;
use serde::{Deserialize, Serialize};

/// One GROUP BY entry.
#[derive(Clone, Debug)]
pub enum GroupKey {
    /// `GROUP BY ?x`
    Variable(Variable),
    /// `GROUP BY (expr)` — materialized via an internal bind
    Expression(Expression),
    /// `GROUP BY (expr AS ?x)` — materialized via a visible bind
    Alias(Alias),
}

/// An ORDER BY key that orders by a variable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableOrderKey {
    /// The variable to order by
    pub variable: Variable,
    /// Descending order (`DESC(?x)`)
    pub descending: bool,
}

impl VariableOrderKey {
    /// Create a new variable order key.
    pub fn new(variable: Variable, descending: bool) -> Self {
        Self {
            variable,
            descending,
        }
    }
}

/// One ORDER BY entry, as written.
#[derive(Clone, Debug)]
pub enum OrderKey {
    /// `ORDER BY ?x` / `ORDER BY DESC(?x)`
    Variable(VariableOrderKey),
    /// `ORDER BY (expr)` — materialized via an internal bind when the
    /// query performs no grouping
    Expression {
        expression: Expression,
        descending: bool,
    },
}

/// The ORDER BY clause: keys plus the internal-sort marker.
#[derive(Clone, Debug, Default)]
pub struct OrderClause {
    /// The order keys, in clause order
    pub keys: Vec<OrderKey>,
    /// True for a sort the engine generated itself rather than one the
    /// user wrote; affects display/explain output only.
    pub is_internal_sort: bool,
}

/// LIMIT, OFFSET, and TEXTLIMIT values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOffsetClause {
    /// Maximum number of solutions, if limited
    pub limit: Option<u64>,
    /// Number of solutions to skip
    pub offset: u64,
    /// Maximum number of text-match results per entity, if limited
    pub text_limit: Option<u64>,
}

/// The raw solution modifiers of one query.
#[derive(Clone, Debug, Default)]
pub struct SolutionModifiers {
    /// GROUP BY keys, in clause order
    pub group_by: Vec<GroupKey>,
    /// HAVING expressions, in clause order
    pub having: Vec<Expression>,
    /// ORDER BY clause
    pub order_by: OrderClause,
    /// LIMIT/OFFSET/TEXTLIMIT
    pub limit_offset: LimitOffsetClause,
}

impl SolutionModifiers {
    /// Create empty modifiers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a GROUP BY key.
    pub fn with_group_key(mut self, key: GroupKey) -> Self {
        self.group_by.push(key);
        self
    }

    /// Append a HAVING expression.
    pub fn with_having(mut self, expression: Expression) -> Self {
        self.having.push(expression);
        self
    }

    /// Append an ORDER BY key.
    pub fn with_order_key(mut self, key: OrderKey) -> Self {
        self.order_by.keys.push(key);
        self
    }

    /// Set the LIMIT.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit_offset.limit = Some(limit);
        self
    }

    /// Set the OFFSET.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.limit_offset.offset = offset;
        self
    }

    /// Set the TEXTLIMIT.
    pub fn with_text_limit(mut self, text_limit: u64) -> Self {
        self.limit_offset.text_limit = Some(text_limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::testing::StubExpression;

    #[test]
    fn test_builders() {
        let modifiers = SolutionModifiers::new()
            .with_group_key(GroupKey::Variable(Variable::new("x")))
            .with_having(StubExpression::plain("?x > 3", &["x"]))
            .with_order_key(OrderKey::Variable(VariableOrderKey::new(
                Variable::new("x"),
                true,
            )))
            .with_limit(10)
            .with_offset(5)
            .with_text_limit(2);

        assert_eq!(modifiers.group_by.len(), 1);
        assert_eq!(modifiers.having.len(), 1);
        assert_eq!(modifiers.order_by.keys.len(), 1);
        assert!(!modifiers.order_by.is_internal_sort);
        assert_eq!(modifiers.limit_offset.limit, Some(10));
        assert_eq!(modifiers.limit_offset.offset, 5);
        assert_eq!(modifiers.limit_offset.text_limit, Some(2));
    }
}
