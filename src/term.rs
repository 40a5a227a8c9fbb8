//! Terms, property paths, and triple patterns.
//!
//! These are the leaves of the graph-pattern tree: a [`TriplePattern`]
//! is subject / predicate / object, where the predicate is a
//! [`PropertyPath`] (a bare IRI in the common case) and subject/object
//! are [`Term`]s (variables or fixed terms).

use crate::var::Variable;
use std::fmt;
use std::sync::Arc;

/// A term in subject or object position: a variable or a fixed value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term {
    /// A variable (`?x`)
    Var(Variable),
    /// An IRI, stored without angle brackets
    Iri(Arc<str>),
    /// A literal, stored in its lexical form
    Literal(Arc<str>),
}

impl Term {
    /// Create an IRI term.
    pub fn iri(iri: impl AsRef<str>) -> Self {
        Self::Iri(Arc::from(iri.as_ref()))
    }

    /// Create a literal term.
    pub fn literal(value: impl AsRef<str>) -> Self {
        Self::Literal(Arc::from(value.as_ref()))
    }

    /// Whether this term is a variable.
    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    /// The variable, if this term is one.
    pub fn as_var(&self) -> Option<&Variable> {
        match self {
            Term::Var(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Variable> for Term {
    fn from(v: Variable) -> Self {
        Term::Var(v)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(v) => write!(f, "{v}"),
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Literal(value) => write!(f, "\"{value}\""),
        }
    }
}

/// A property-path expression in predicate position.
///
/// The `Iri` leaf is the common case and the only shape the
/// language-filter rewrite touches; a predicate variable is a distinct
/// case, never conflated with an IRI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyPath {
    /// A bare IRI predicate
    Iri(Arc<str>),
    /// A predicate variable
    Var(Variable),
    /// Inverse path (`^p`)
    Inverse(Box<PropertyPath>),
    /// Sequence path (`p1 / p2 / ...`)
    Sequence(Vec<PropertyPath>),
    /// Alternative path (`p1 | p2 | ...`)
    Alternative(Vec<PropertyPath>),
    /// Transitive closure (`p+`, `p*`, bounded repetitions)
    Transitive {
        path: Box<PropertyPath>,
        min: u64,
        max: Option<u64>,
    },
}

impl PropertyPath {
    /// Create a bare IRI path.
    pub fn from_iri(iri: impl AsRef<str>) -> Self {
        Self::Iri(Arc::from(iri.as_ref()))
    }

    /// Whether this path is a bare IRI (not a variable, not a complex path).
    pub fn is_iri(&self) -> bool {
        matches!(self, PropertyPath::Iri(_))
    }

    /// Whether this path is a predicate variable.
    pub fn is_var(&self) -> bool {
        matches!(self, PropertyPath::Var(_))
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyPath::Iri(iri) => write!(f, "<{iri}>"),
            PropertyPath::Var(v) => write!(f, "{v}"),
            PropertyPath::Inverse(path) => write!(f, "^{path}"),
            PropertyPath::Sequence(paths) => {
                let rendered: Vec<String> = paths.iter().map(ToString::to_string).collect();
                write!(f, "({})", rendered.join("/"))
            }
            PropertyPath::Alternative(paths) => {
                let rendered: Vec<String> = paths.iter().map(ToString::to_string).collect();
                write!(f, "({})", rendered.join("|"))
            }
            PropertyPath::Transitive { path, min, max } => match max {
                Some(max) => write!(f, "{path}{{{min},{max}}}"),
                None => write!(f, "{path}{{{min},}}"),
            },
        }
    }
}

/// A triple pattern: subject, predicate (property path), object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: PropertyPath,
    pub object: Term,
}

impl TriplePattern {
    /// Create a new triple pattern.
    pub fn new(subject: Term, predicate: PropertyPath, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{s: {}, p: {}, o: {}}}",
            self.subject, self.predicate, self.object
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_accessors() {
        let var = Term::Var(Variable::new("x"));
        assert!(var.is_var());
        assert_eq!(var.as_var(), Some(&Variable::new("x")));

        let iri = Term::iri("http://example.org/p");
        assert!(!iri.is_var());
        assert_eq!(iri.as_var(), None);
    }

    #[test]
    fn test_property_path_shapes() {
        let iri = PropertyPath::from_iri("http://example.org/p");
        assert!(iri.is_iri());
        assert!(!iri.is_var());

        let var = PropertyPath::Var(Variable::new("p"));
        assert!(!var.is_iri());
        assert!(var.is_var());

        let inverse = PropertyPath::Inverse(Box::new(iri));
        assert!(!inverse.is_iri());
    }

    #[test]
    fn test_triple_display() {
        let triple = TriplePattern::new(
            Term::Var(Variable::new("s")),
            PropertyPath::from_iri("http://example.org/p"),
            Term::literal("v"),
        );
        assert_eq!(
            triple.to_string(),
            "{s: ?s, p: <http://example.org/p>, o: \"v\"}"
        );
    }
}
