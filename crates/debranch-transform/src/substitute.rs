//! Known-constant substitution.
//!
//! Rewrites identifier reads whose name is bound in [`KnownVars`] into the
//! corresponding literal, so a retained test like `__DEV__ && f()` comes out
//! as `false && f()`. Write positions (assignment targets, update operands)
//! are left untouched.

use crate::KnownVars;
use debranch_parser::ast::{Expr, MemberProp, Property};

/// Replace every read of a known identifier in `expr` with its literal.
pub fn substitute(expr: Expr, known: &KnownVars) -> Expr {
    if known.is_empty() {
        return expr;
    }
    subst(expr, known)
}

fn subst(expr: Expr, known: &KnownVars) -> Expr {
    match expr {
        Expr::Ident { name, span } => match known.get(&name) {
            Some(value) => Expr::Literal {
                value: value.clone(),
                span,
            },
            None => Expr::Ident { name, span },
        },

        leaf @ (Expr::Literal { .. } | Expr::This { .. }) => leaf,

        Expr::Unary { op, argument, span } => Expr::Unary {
            op,
            argument: Box::new(subst(*argument, known)),
            span,
        },

        // The operand of `++`/`--` is a write position.
        Expr::Update {
            op,
            prefix,
            argument,
            span,
        } => Expr::Update {
            op,
            prefix,
            argument: Box::new(subst_write_target(*argument, known)),
            span,
        },

        Expr::Binary {
            op,
            left,
            right,
            span,
        } => Expr::Binary {
            op,
            left: Box::new(subst(*left, known)),
            right: Box::new(subst(*right, known)),
            span,
        },

        Expr::Logical {
            op,
            left,
            right,
            span,
        } => Expr::Logical {
            op,
            left: Box::new(subst(*left, known)),
            right: Box::new(subst(*right, known)),
            span,
        },

        Expr::Assign {
            op,
            target,
            value,
            span,
        } => Expr::Assign {
            op,
            target: Box::new(subst_write_target(*target, known)),
            value: Box::new(subst(*value, known)),
            span,
        },

        Expr::Conditional {
            test,
            consequent,
            alternate,
            span,
        } => Expr::Conditional {
            test: Box::new(subst(*test, known)),
            consequent: Box::new(subst(*consequent, known)),
            alternate: Box::new(subst(*alternate, known)),
            span,
        },

        Expr::Call {
            callee,
            arguments,
            span,
        } => Expr::Call {
            callee: Box::new(subst(*callee, known)),
            arguments: subst_all(arguments, known),
            span,
        },

        Expr::New {
            callee,
            arguments,
            span,
        } => Expr::New {
            callee: Box::new(subst(*callee, known)),
            arguments: subst_all(arguments, known),
            span,
        },

        Expr::Member {
            object,
            property,
            span,
        } => Expr::Member {
            object: Box::new(subst(*object, known)),
            property: match property {
                MemberProp::Static(name) => MemberProp::Static(name),
                MemberProp::Computed(index) => {
                    MemberProp::Computed(Box::new(subst(*index, known)))
                }
            },
            span,
        },

        Expr::Array { elements, span } => Expr::Array {
            elements: subst_all(elements, known),
            span,
        },

        Expr::Object { properties, span } => Expr::Object {
            properties: properties
                .into_iter()
                .map(|prop| Property {
                    key: prop.key,
                    value: subst(prop.value, known),
                    span: prop.span,
                })
                .collect(),
            span,
        },

        Expr::Sequence { expressions, span } => Expr::Sequence {
            expressions: subst_all(expressions, known),
            span,
        },

        // A nested function may shadow the name with a parameter or local;
        // substitution stops at function boundaries.
        function @ Expr::Function(_) => function,
    }
}

fn subst_all(exprs: Vec<Expr>, known: &KnownVars) -> Vec<Expr> {
    exprs.into_iter().map(|e| subst(e, known)).collect()
}

/// A bare identifier target stays as written; a member target still gets its
/// object and computed index substituted.
fn subst_write_target(target: Expr, known: &KnownVars) -> Expr {
    match target {
        Expr::Ident { .. } => target,
        other => subst(other, known),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KnownVars;
    use debranch_parser::ast::{Stmt, Value};
    use debranch_parser::parse;

    fn first_expr(src: &str) -> Expr {
        let program = parse(src).expect("parse failure");
        match program.body.into_iter().next() {
            Some(Stmt::Expression { expression, .. }) => expression,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn dev_false() -> KnownVars {
        let mut known = KnownVars::new();
        known.define("__DEV__", Value::Bool(false));
        known
    }

    #[test]
    fn replaces_known_reads() {
        let expr = substitute(first_expr("__DEV__ && f();"), &dev_false());
        let Expr::Logical { left, .. } = expr else {
            panic!("expected logical expression");
        };
        assert!(matches!(
            *left,
            Expr::Literal {
                value: Value::Bool(false),
                ..
            }
        ));
    }

    #[test]
    fn preserves_the_identifier_span() {
        let original = first_expr("__DEV__;");
        let span = original.span();
        let expr = substitute(original, &dev_false());
        assert_eq!(expr.span(), span);
    }

    #[test]
    fn leaves_unknown_names_alone() {
        let expr = substitute(first_expr("other && f();"), &dev_false());
        let Expr::Logical { left, .. } = expr else {
            panic!("expected logical expression");
        };
        assert!(matches!(*left, Expr::Ident { ref name, .. } if name == "other"));
    }

    #[test]
    fn skips_write_positions() {
        let expr = substitute(first_expr("__DEV__ = f();"), &dev_false());
        let Expr::Assign { target, .. } = expr else {
            panic!("expected assignment");
        };
        assert!(matches!(*target, Expr::Ident { ref name, .. } if name == "__DEV__"));

        let expr = substitute(first_expr("__DEV__++;"), &dev_false());
        let Expr::Update { argument, .. } = expr else {
            panic!("expected update");
        };
        assert!(matches!(*argument, Expr::Ident { ref name, .. } if name == "__DEV__"));
    }

    #[test]
    fn member_names_are_not_values() {
        let expr = substitute(first_expr("a.__DEV__;"), &dev_false());
        let Expr::Member { property, .. } = expr else {
            panic!("expected member expression");
        };
        assert!(matches!(property, MemberProp::Static(ref name) if name == "__DEV__"));

        let expr = substitute(first_expr("a[__DEV__];"), &dev_false());
        let Expr::Member { property, .. } = expr else {
            panic!("expected member expression");
        };
        assert!(matches!(
            property,
            MemberProp::Computed(index)
                if matches!(*index, Expr::Literal { value: Value::Bool(false), .. })
        ));
    }

    #[test]
    fn stops_at_function_boundaries() {
        let expr = substitute(
            first_expr("(function () { return __DEV__; });"),
            &dev_false(),
        );
        let Expr::Function(function) = expr else {
            panic!("expected function expression");
        };
        let Stmt::Return {
            argument: Some(argument),
            ..
        } = &function.body[0]
        else {
            panic!("expected return statement");
        };
        assert!(matches!(argument, Expr::Ident { name, .. } if name == "__DEV__"));
    }

    #[test]
    fn empty_environment_is_identity() {
        let original = first_expr("__DEV__ && f();");
        let substituted = substitute(original.clone(), &KnownVars::new());
        assert_eq!(substituted, original);
    }
}
