//! Side-effect analysis.
//!
//! Decides whether evaluating an expression can observably affect state
//! beyond producing its value. Calls, constructions, member accesses (getter
//! hazard), assignments and updates always can; containers inherit from
//! their children; an identifier read is effect-free only when it resolves
//! to a binding that is provably never reassigned.

use crate::KnownVars;
use crate::evaluator::is_constant;
use debranch_binder::ScopeLookup;
use debranch_parser::ast::{Expr, Property};

/// Can evaluating `expr` have an observable effect?
pub fn has_side_effect(expr: &Expr, scope: &dyn ScopeLookup) -> bool {
    match expr {
        Expr::Assign { .. } | Expr::Call { .. } | Expr::New { .. } | Expr::Update { .. } => true,

        // Property loads can run getters or throw on undefined objects.
        Expr::Member { .. } => true,

        Expr::Array { elements, .. } => elements.iter().any(|el| has_side_effect(el, scope)),
        Expr::Object { properties, .. } => properties
            .iter()
            .any(|prop| property_has_side_effect(prop, scope)),
        Expr::Sequence { expressions, .. } => {
            expressions.iter().any(|e| has_side_effect(e, scope))
        }

        Expr::Binary { .. } => !is_constant(expr, false, &KnownVars::new()),

        Expr::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => {
            has_side_effect(test, scope)
                || has_side_effect(consequent, scope)
                || has_side_effect(alternate, scope)
        }

        Expr::Logical { left, right, .. } => {
            has_side_effect(left, scope) || has_side_effect(right, scope)
        }

        Expr::Unary { op, argument, .. } => {
            use debranch_parser::ast::UnaryOp;
            if matches!(
                op,
                UnaryOp::Void | UnaryOp::Delete | UnaryOp::TypeOf | UnaryOp::Not
            ) {
                has_side_effect(argument, scope)
            } else {
                !is_constant(expr, false, &KnownVars::new())
            }
        }

        Expr::Ident { name, .. } => match scope.resolve(name) {
            Some(binding) => !binding.is_static(),
            // Unresolved reads can hit a global getter or throw.
            None => true,
        },

        Expr::Literal { .. } | Expr::This { .. } | Expr::Function(_) => false,
    }
}

fn property_has_side_effect(property: &Property, scope: &dyn ScopeLookup) -> bool {
    has_side_effect(&property.value, scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use debranch_binder::ScopeStack;
    use debranch_parser::ast::Stmt;
    use debranch_parser::parse;

    /// Side effect of the first expression statement, resolved against the
    /// program's own scope.
    fn effect_of(src: &str) -> bool {
        let program = parse(src).expect("parse failure");
        let mut scopes = ScopeStack::new();
        scopes.enter_program(&program);
        let expr = program
            .body
            .iter()
            .find_map(|stmt| match stmt {
                Stmt::Expression { expression, .. } => Some(expression),
                _ => None,
            })
            .expect("no expression statement");
        has_side_effect(expr, &scopes)
    }

    #[test]
    fn calls_always_have_effects() {
        assert!(effect_of("f();"));
        assert!(effect_of("var f = function () {}; f();"));
    }

    #[test]
    fn constructions_and_updates_have_effects() {
        assert!(effect_of("new X();"));
        assert!(effect_of("var i = 0; i++;"));
        assert!(effect_of("var o = {}; o.p;"));
        assert!(effect_of("var a = 0; a = 1;"));
    }

    #[test]
    fn literals_and_functions_do_not() {
        assert!(!effect_of("42;"));
        assert!(!effect_of("'s';"));
        assert!(!effect_of("this;"));
        assert!(!effect_of("(function () { g(); });"));
    }

    #[test]
    fn static_identifier_reads_are_effect_free() {
        assert!(!effect_of("var FLAG = false; FLAG;"));
        assert!(effect_of("var flag = false; flag = true; flag;"));
        // Unresolved globals might be getters.
        assert!(effect_of("window;"));
    }

    #[test]
    fn containers_inherit_from_children() {
        assert!(!effect_of("[1, 2, 3];"));
        assert!(effect_of("[1, f(), 3];"));
        assert!(!effect_of("({ a: 1 });"));
        assert!(effect_of("({ a: f() });"));
        assert!(!effect_of("(1, 2);"));
        assert!(effect_of("(1, f());"));
    }

    #[test]
    fn constant_binaries_are_effect_free() {
        assert!(!effect_of("1 + 2;"));
        assert!(effect_of("a + 2;"));
    }

    #[test]
    fn benign_unaries_look_through() {
        assert!(!effect_of("var FLAG = 1; typeof FLAG;"));
        assert!(!effect_of("!0;"));
        assert!(!effect_of("void 0;"));
        // The operand still counts.
        assert!(effect_of("typeof f();"));
        assert!(effect_of("typeof x;"));
    }

    #[test]
    fn coercing_unaries_require_constants() {
        assert!(!effect_of("-1;"));
        assert!(effect_of("-x;"));
    }

    #[test]
    fn conditional_checks_all_three() {
        assert!(!effect_of("var c = 1; 1 ? 2 : 3;"));
        assert!(effect_of("1 ? f() : 3;"));
        assert!(effect_of("f() ? 1 : 2;"));
    }
}
