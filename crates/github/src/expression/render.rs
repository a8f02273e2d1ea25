//! Lowering of [`Expr`] trees to GitHub Actions expression syntax.
//!
//! GitHub gives `&&` higher precedence than `||`. Mixed groupings are
//! parenthesised in both directions, and raw atoms are parenthesised whenever
//! they appear under an operator.

use super::{Expr, Terms};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Join {
    And,
    Or,
}

impl Join {
    const fn operator(self) -> &'static str {
        match self {
            Self::And => " && ",
            Self::Or => " || ",
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write_literal(f, value),
            Self::Property(path) => f.write_str(path.as_str()),
            Self::Equality { left, right } => {
                write_operand(f, left)?;
                f.write_str(" == ")?;
                write_operand(f, right)
            }
            Self::Contains { haystack, needle } => write!(f, "contains({haystack}, {needle})"),
            Self::Negation(child) => write!(f, "!({child})"),
            Self::Conjunction(terms) => write_joined(f, terms, Join::And),
            Self::Disjunction(terms) => write_joined(f, terms, Join::Or),
            Self::Raw(raw) => f.write_str(raw.as_str()),
        }
    }
}

/// Single-quoted, with embedded quotes doubled.
fn write_literal(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    write!(f, "'{}'", value.replace('\'', "''"))
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Expr) -> fmt::Result {
    match operand {
        Expr::Equality { .. } | Expr::Conjunction(_) | Expr::Disjunction(_) | Expr::Raw(_) => {
            write!(f, "({operand})")
        }
        _ => write!(f, "{operand}"),
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, terms: &Terms, join: Join) -> fmt::Result {
    for (i, term) in terms.as_slice().iter().enumerate() {
        if i > 0 {
            f.write_str(join.operator())?;
        }
        if needs_group(term, join) {
            write!(f, "({term})")?;
        } else {
            write!(f, "{term}")?;
        }
    }
    Ok(())
}

fn needs_group(term: &Expr, parent: Join) -> bool {
    match term {
        Expr::Conjunction(_) => parent == Join::Or,
        Expr::Disjunction(_) => parent == Join::And,
        Expr::Raw(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        all_of, any_of, contains, equals, event_type_equals, label_contains, literal, not,
        property, raw,
    };

    #[test]
    fn test_render_leaves() {
        assert_eq!(literal("issues").render(), "'issues'");
        assert_eq!(literal("it's").render(), "'it''s'");
        assert_eq!(property("github.event_name").unwrap().render(), "github.event_name");
        assert_eq!(
            event_type_equals("push").render(),
            "github.event_name == 'push'"
        );
        assert_eq!(
            label_contains("bug").render(),
            "contains(github.event.label.name, 'bug')"
        );
    }

    #[test]
    fn test_render_negation_always_parenthesises() {
        assert_eq!(
            not(event_type_equals("push")).render(),
            "!(github.event_name == 'push')"
        );
        assert_eq!(
            not(not(property("github.event.issue.locked").unwrap())).render(),
            "!(!(github.event.issue.locked))"
        );
    }

    #[test]
    fn test_render_same_kind_nesting_is_flat() {
        let inner = any_of(vec![event_type_equals("a"), event_type_equals("b")]).unwrap();
        let outer = any_of(vec![inner, event_type_equals("c")]).unwrap();
        assert_eq!(
            outer.render(),
            "github.event_name == 'a' || github.event_name == 'b' || github.event_name == 'c'"
        );
    }

    #[test]
    fn test_render_or_inside_and() {
        let or = any_of(vec![event_type_equals("a"), event_type_equals("b")]).unwrap();
        let and = all_of(vec![or, label_contains("x")]).unwrap();
        assert_eq!(
            and.render(),
            "(github.event_name == 'a' || github.event_name == 'b') && contains(github.event.label.name, 'x')"
        );
    }

    #[test]
    fn test_render_and_inside_or() {
        let and = all_of(vec![event_type_equals("a"), label_contains("x")]).unwrap();
        let or = any_of(vec![and, event_type_equals("b")]).unwrap();
        assert_eq!(
            or.render(),
            "(github.event_name == 'a' && contains(github.event.label.name, 'x')) || github.event_name == 'b'"
        );
    }

    #[test]
    fn test_render_single_term_groups() {
        let single = all_of(vec![event_type_equals("push")]).unwrap();
        assert_eq!(single.render(), "github.event_name == 'push'");

        let nested = any_of(vec![single, event_type_equals("issues")]).unwrap();
        assert_eq!(
            nested.render(),
            "(github.event_name == 'push') || github.event_name == 'issues'"
        );
    }

    #[test]
    fn test_render_raw_atoms() {
        let top = raw("a || b").unwrap();
        assert_eq!(top.render(), "a || b");

        let and = all_of(vec![raw("a || b").unwrap(), raw("c").unwrap()]).unwrap();
        assert_eq!(and.render(), "(a || b) && (c)");

        assert_eq!(not(raw("a || b").unwrap()).render(), "!(a || b)");
    }

    #[test]
    fn test_render_compound_equality_operands() {
        let expr = equals(
            any_of(vec![
                property("github.event.issue.title").unwrap(),
                literal("none"),
            ])
            .unwrap(),
            literal("x"),
        );
        assert_eq!(expr.render(), "(github.event.issue.title || 'none') == 'x'");
    }

    #[test]
    fn test_render_nested_equality_operands() {
        let inner = equals(property("github.event.issue.locked").unwrap(), literal("x"));
        assert_eq!(
            equals(literal("true"), inner.clone()).render(),
            "'true' == (github.event.issue.locked == 'x')"
        );
        assert_eq!(
            equals(inner, literal("true")).render(),
            "(github.event.issue.locked == 'x') == 'true'"
        );
    }

    #[test]
    fn test_render_contains_arguments_unparenthesised() {
        let expr = contains(
            property("github.event.issue.body").unwrap(),
            literal("/deploy"),
        );
        assert_eq!(expr.render(), "contains(github.event.issue.body, '/deploy')");
    }

    #[test]
    fn test_render_is_deterministic() {
        let expr = any_of(vec![
            all_of(vec![event_type_equals("issues"), label_contains("bug")]).unwrap(),
            not(event_type_equals("issues")),
        ])
        .unwrap();
        assert_eq!(expr.render(), expr.render());
        assert_eq!(expr.render(), expr.clone().render());
    }
}
