//! Tri-valued truthiness.
//!
//! The branch rewrite needs to know whether an `if` test is truthy, falsy,
//! or undecidable at compile time. This goes further than the constant
//! evaluator: `new X()` has no constant value but is always truthy, and
//! `COND && f()` is decidably falsy when `COND` is known false even though
//! `f()` is opaque.

use crate::KnownVars;
use crate::evaluator::constant_value;
use debranch_parser::ast::{Expr, LogicalOp, UnaryOp};

/// Compile-time truthiness of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truthiness {
    True,
    False,
    /// Cannot be decided without running the program.
    Indeterminate,
}

impl Truthiness {
    fn negate(self) -> Truthiness {
        match self {
            Truthiness::True => Truthiness::False,
            Truthiness::False => Truthiness::True,
            Truthiness::Indeterminate => Truthiness::Indeterminate,
        }
    }

    fn from_bool(b: bool) -> Truthiness {
        if b { Truthiness::True } else { Truthiness::False }
    }
}

/// Decide the truthiness of `expr` under `known`, or give up with
/// [`Truthiness::Indeterminate`].
pub fn boolean_condition(expr: &Expr, known: &KnownVars) -> Truthiness {
    match expr {
        // An assignment yields its right-hand side.
        Expr::Assign { value, .. } => boolean_condition(value, known),

        // Always fresh objects, always truthy.
        Expr::Array { .. } | Expr::Object { .. } | Expr::New { .. } | Expr::Function(_) => {
            Truthiness::True
        }

        Expr::Binary { .. } => match constant_value(expr, false, known) {
            Some(value) => Truthiness::from_bool(value.is_truthy()),
            None => Truthiness::Indeterminate,
        },

        Expr::Call { .. } | Expr::Member { .. } | Expr::Update { .. } | Expr::This { .. } => {
            Truthiness::Indeterminate
        }

        Expr::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => match boolean_condition(test, known) {
            Truthiness::True => boolean_condition(consequent, known),
            Truthiness::False => boolean_condition(alternate, known),
            Truthiness::Indeterminate => {
                // Both branches agreeing decides it even with an opaque test.
                let when_true = boolean_condition(consequent, known);
                let when_false = boolean_condition(alternate, known);
                if when_true == when_false {
                    when_true
                } else {
                    Truthiness::Indeterminate
                }
            }
        },

        Expr::Ident { name, .. } => match known.get(name) {
            Some(value) => Truthiness::from_bool(value.is_truthy()),
            None => Truthiness::Indeterminate,
        },

        Expr::Literal { value, .. } => Truthiness::from_bool(value.is_truthy()),

        Expr::Logical {
            op, left, right, ..
        } => {
            let left = boolean_condition(left, known);
            let right = boolean_condition(right, known);
            match op {
                // `a && b` is falsy whenever either side is known falsy,
                // even if the other cannot be decided.
                LogicalOp::And => match (left, right) {
                    (Truthiness::Indeterminate, Truthiness::False) => Truthiness::False,
                    (Truthiness::Indeterminate, _) => Truthiness::Indeterminate,
                    (Truthiness::False, _) => Truthiness::False,
                    (Truthiness::True, r) => r,
                },
                // Dually, `a || b` is truthy whenever either side is known
                // truthy.
                LogicalOp::Or => match (left, right) {
                    (Truthiness::Indeterminate, Truthiness::True) => Truthiness::True,
                    (Truthiness::Indeterminate, _) => Truthiness::Indeterminate,
                    (Truthiness::True, _) => Truthiness::True,
                    (Truthiness::False, r) => r,
                },
            }
        }

        Expr::Sequence { expressions, .. } => match expressions.last() {
            Some(last) => boolean_condition(last, known),
            None => Truthiness::Indeterminate,
        },

        Expr::Unary { op, argument, .. } => match op {
            UnaryOp::Void => Truthiness::False,
            UnaryOp::TypeOf => Truthiness::True,
            UnaryOp::Not => boolean_condition(argument, known).negate(),
            _ => match constant_value(expr, false, known) {
                Some(value) => Truthiness::from_bool(value.is_truthy()),
                None => Truthiness::Indeterminate,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debranch_parser::ast::{Stmt, Value};
    use debranch_parser::parse;

    fn truthiness_with(src: &str, known: &KnownVars) -> Truthiness {
        let program = parse(src).expect("parse failure");
        let expr = match program.body.into_iter().next() {
            Some(Stmt::Expression { expression, .. }) => expression,
            other => panic!("expected expression statement, got {other:?}"),
        };
        boolean_condition(&expr, known)
    }

    fn truthiness(src: &str) -> Truthiness {
        truthiness_with(src, &KnownVars::new())
    }

    #[test]
    fn literals() {
        assert_eq!(truthiness("1;"), Truthiness::True);
        assert_eq!(truthiness("0;"), Truthiness::False);
        assert_eq!(truthiness("'';"), Truthiness::False);
        assert_eq!(truthiness("'x';"), Truthiness::True);
        assert_eq!(truthiness("null;"), Truthiness::False);
    }

    #[test]
    fn fresh_objects_are_truthy() {
        assert_eq!(truthiness("[];"), Truthiness::True);
        assert_eq!(truthiness("({});"), Truthiness::True);
        assert_eq!(truthiness("new Date();"), Truthiness::True);
        assert_eq!(truthiness("(function () {});"), Truthiness::True);
    }

    #[test]
    fn opaque_expressions_are_indeterminate() {
        assert_eq!(truthiness("f();"), Truthiness::Indeterminate);
        assert_eq!(truthiness("a.b;"), Truthiness::Indeterminate);
        assert_eq!(truthiness("this;"), Truthiness::Indeterminate);
        assert_eq!(truthiness("x;"), Truthiness::Indeterminate);
    }

    #[test]
    fn known_identifiers_coerce() {
        let mut known = KnownVars::new();
        known.define("__DEV__", Value::Bool(false));
        known.define("VERSION", Value::Str("1.0".to_string()));
        assert_eq!(truthiness_with("__DEV__;", &known), Truthiness::False);
        assert_eq!(truthiness_with("VERSION;", &known), Truthiness::True);
        assert_eq!(truthiness_with("OTHER;", &known), Truthiness::Indeterminate);
    }

    #[test]
    fn and_absorbs_known_falsehood() {
        let mut known = KnownVars::new();
        known.define("FLAG", Value::Bool(false));
        // The opaque call cannot rescue a falsy conjunction.
        assert_eq!(truthiness_with("FLAG && f();", &known), Truthiness::False);
        assert_eq!(truthiness_with("f() && FLAG;", &known), Truthiness::False);
        assert_eq!(
            truthiness_with("f() && g();", &known),
            Truthiness::Indeterminate
        );
    }

    #[test]
    fn or_absorbs_known_truth() {
        let mut known = KnownVars::new();
        known.define("FLAG", Value::Bool(true));
        assert_eq!(truthiness_with("FLAG || f();", &known), Truthiness::True);
        assert_eq!(truthiness_with("f() || FLAG;", &known), Truthiness::True);
        assert_eq!(truthiness_with("0 || f();", &known), Truthiness::Indeterminate);
    }

    #[test]
    fn conditional_resolves_the_test_first() {
        assert_eq!(truthiness("1 ? x : 0;"), Truthiness::Indeterminate);
        assert_eq!(truthiness("0 ? 0 : 'yes';"), Truthiness::True);
    }

    #[test]
    fn conditional_with_opaque_test_needs_agreement() {
        assert_eq!(truthiness("f() ? 1 : 2;"), Truthiness::True);
        assert_eq!(truthiness("f() ? 1 : 0;"), Truthiness::Indeterminate);
        assert_eq!(truthiness("f() ? 0 : '';"), Truthiness::False);
    }

    #[test]
    fn unary_special_cases() {
        assert_eq!(truthiness("void f();"), Truthiness::False);
        assert_eq!(truthiness("typeof x;"), Truthiness::True);
        assert_eq!(truthiness("!f();"), Truthiness::Indeterminate);
        assert_eq!(truthiness("!0;"), Truthiness::True);
        assert_eq!(truthiness("-1;"), Truthiness::True);
        assert_eq!(truthiness("-x;"), Truthiness::Indeterminate);
    }

    #[test]
    fn binary_through_the_evaluator() {
        assert_eq!(truthiness("1 + 1 === 2;"), Truthiness::True);
        assert_eq!(truthiness("1 > 2;"), Truthiness::False);
        assert_eq!(truthiness("a > 2;"), Truthiness::Indeterminate);
    }

    #[test]
    fn assignment_yields_its_value() {
        assert_eq!(truthiness("x = 1;"), Truthiness::True);
        assert_eq!(truthiness("x = f();"), Truthiness::Indeterminate);
    }

    #[test]
    fn sequence_yields_its_last() {
        assert_eq!(truthiness("(f(), 1);"), Truthiness::True);
        assert_eq!(truthiness("(1, f());"), Truthiness::Indeterminate);
    }
}
