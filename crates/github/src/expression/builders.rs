//! Constructors for [`Expr`] trees.
//!
//! Builders over fixed context paths are infallible. Builders that take caller
//! data which can be malformed return [`ExprError`].

use super::{
    EVENT_ACTION, EVENT_NAME, Expr, ExprError, LABEL_NAME, PropertyPath, RawExpression, Terms,
};

/// A quoted string constant.
#[must_use]
pub fn literal(value: impl Into<String>) -> Expr {
    Expr::Literal(value.into())
}

/// A reference to a context path.
///
/// # Errors
///
/// Returns [`ExprError::InvalidPropertyPath`] for empty or malformed paths.
pub fn property(path: impl Into<String>) -> Result<Expr, ExprError> {
    PropertyPath::new(path).map(Expr::Property)
}

/// Reference to one of the well-known paths defined in this module.
pub(crate) fn known_property(path: &'static str) -> Expr {
    Expr::Property(PropertyPath(path.to_string()))
}

/// `left == right`
#[must_use]
pub fn equals(left: Expr, right: Expr) -> Expr {
    Expr::Equality {
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// `contains(haystack, needle)`
#[must_use]
pub fn contains(haystack: Expr, needle: Expr) -> Expr {
    Expr::Contains {
        haystack: Box::new(haystack),
        needle: Box::new(needle),
    }
}

/// `!(child)`
#[must_use]
pub fn not(child: Expr) -> Expr {
    Expr::Negation(Box::new(child))
}

/// AND of all terms.
///
/// # Errors
///
/// Returns [`ExprError::EmptyTerms`] when `terms` is empty.
pub fn all_of(terms: Vec<Expr>) -> Result<Expr, ExprError> {
    Terms::new(terms, "and").map(Expr::Conjunction)
}

/// OR of all terms.
///
/// # Errors
///
/// Returns [`ExprError::EmptyTerms`] when `terms` is empty.
pub fn any_of(terms: Vec<Expr>) -> Result<Expr, ExprError> {
    Terms::new(terms, "or").map(Expr::Disjunction)
}

/// An already-rendered expression, e.g. a user-authored `if:`.
///
/// # Errors
///
/// See [`RawExpression::new`].
pub fn raw(text: &str) -> Result<Expr, ExprError> {
    RawExpression::new(text).map(Expr::Raw)
}

/// `github.event_name == 'name'`
#[must_use]
pub fn event_type_equals(name: &str) -> Expr {
    equals(known_property(EVENT_NAME), literal(name))
}

/// `github.event.action == 'action'`
#[must_use]
pub fn action_equals(action: &str) -> Expr {
    equals(known_property(EVENT_ACTION), literal(action))
}

/// `contains(github.event.label.name, 'name')`
#[must_use]
pub fn label_contains(name: &str) -> Expr {
    contains(known_property(LABEL_NAME), literal(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sugar_builders_expand() {
        assert_eq!(
            event_type_equals("issues"),
            equals(property("github.event_name").unwrap(), literal("issues"))
        );
        assert_eq!(
            action_equals("labeled"),
            equals(property("github.event.action").unwrap(), literal("labeled"))
        );
        assert_eq!(
            label_contains("bug"),
            contains(property("github.event.label.name").unwrap(), literal("bug"))
        );
    }

    #[test]
    fn test_empty_term_lists_fail() {
        assert_eq!(
            all_of(Vec::new()),
            Err(ExprError::EmptyTerms { operator: "and" })
        );
        assert_eq!(
            any_of(Vec::new()),
            Err(ExprError::EmptyTerms { operator: "or" })
        );
    }

    #[test]
    fn test_invalid_property_fails() {
        assert!(matches!(
            property("github..event"),
            Err(ExprError::InvalidPropertyPath { .. })
        ));
    }

    #[test]
    fn test_structural_equality() {
        let a = any_of(vec![event_type_equals("push"), label_contains("bug")]).unwrap();
        let b = any_of(vec![event_type_equals("push"), label_contains("bug")]).unwrap();
        assert_eq!(a, b);
    }
}
