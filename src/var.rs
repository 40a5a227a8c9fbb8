//! Query variables.
//!
//! A [`Variable`] is an interned identifier with value equality and a
//! stable hash, usable as a map key. The name is stored without the
//! leading `?` sigil; `Display` adds it back.
//!
//! The normalizer materializes helper expressions by binding them to
//! *internal* variables: names under a reserved prefix plus a counter
//! that is unique per query. The grammar rejects user-written variable
//! names starting with `__`, so internal names can never collide with
//! query text, and they are excluded from `SELECT *` expansion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Reserved name prefix for normalizer-generated variables.
pub const INTERNAL_VARIABLE_PREFIX: &str = "__internal_";

/// A query variable (e.g. `?name`).
///
/// The name does not include the leading `?`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable {
    name: Arc<str>,
}

impl Variable {
    /// Create a new variable from its name (without the `?` sigil).
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
        }
    }

    /// Create the `n`-th internal variable of a query.
    ///
    /// Callers thread `n` from [`ParsedQuery`](crate::ParsedQuery)'s
    /// per-query counter; the counter is query-local state, not
    /// process-wide.
    pub(crate) fn internal(n: u64) -> Self {
        Self {
            name: Arc::from(format!("{INTERNAL_VARIABLE_PREFIX}{n}")),
        }
    }

    /// The variable name, without the `?` sigil.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is a normalizer-generated internal variable.
    ///
    /// Internal variables are never part of a `SELECT *` expansion.
    pub fn is_internal(&self) -> bool {
        self.name.starts_with(INTERNAL_VARIABLE_PREFIX)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_variable_equality_and_hash() {
        let a = Variable::new("x");
        let b = Variable::new("x");
        let c = Variable::new("y");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Variable> = [a, c].into_iter().collect();
        assert!(set.contains(&b));
    }

    #[test]
    fn test_variable_display() {
        assert_eq!(Variable::new("label").to_string(), "?label");
    }

    #[test]
    fn test_internal_variables() {
        let v0 = Variable::internal(0);
        let v1 = Variable::internal(1);
        assert_ne!(v0, v1);
        assert!(v0.is_internal());
        assert!(v1.is_internal());
        assert!(!Variable::new("x").is_internal());
    }
}
