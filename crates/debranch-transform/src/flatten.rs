//! Block flattening.
//!
//! Branch collapsing replaces `if` statements with bare blocks, which can
//! leave `{ { a(); } { b(); } }` shapes behind. This pass splices the
//! statements of a directly nested block into its parent's statement list.
//! It runs bottom-up, so arbitrarily deep nesting collapses in one pass.
//! Blocks that declare `let`/`const` bindings keep their braces, since those
//! bindings must not escape into the enclosing scope.

use debranch_parser::ast::{DeclKind, Expr, Program, Stmt};
use debranch_parser::walk::{self, Visitor};

/// Splice directly nested blocks throughout `program`.
pub fn flatten_blocks(program: Program) -> Program {
    let program = walk::rewrite_program(program, &mut Flattener);
    Program {
        body: splice(program.body),
        span: program.span,
    }
}

struct Flattener;

impl Visitor for Flattener {
    // Children are already rewritten on leave, so any block nested inside
    // `body` is itself flat by now.
    fn leave_stmt(&mut self, stmt: Stmt) -> Stmt {
        match stmt {
            Stmt::Block { body, span } => Stmt::Block {
                body: splice(body),
                span,
            },
            Stmt::FunctionDecl { mut function, span } => {
                function.body = splice(function.body);
                Stmt::FunctionDecl { function, span }
            }
            other => other,
        }
    }

    fn leave_expr(&mut self, expr: Expr) -> Expr {
        match expr {
            Expr::Function(mut function) => {
                function.body = splice(function.body);
                Expr::Function(function)
            }
            other => other,
        }
    }
}

fn splice(body: Vec<Stmt>) -> Vec<Stmt> {
    let mut out = Vec::with_capacity(body.len());
    for stmt in body {
        match stmt {
            Stmt::Block { body, .. } if !declares_lexicals(&body) => out.extend(body),
            other => out.push(other),
        }
    }
    out
}

/// `let`/`const` are block-scoped: splicing one into the parent list can
/// collide with a sibling declaration of the same name or leak the binding
/// past its block. `var` and function declarations hoist to function scope
/// either way, so they move freely.
fn declares_lexicals(body: &[Stmt]) -> bool {
    body.iter().any(|stmt| {
        matches!(
            stmt,
            Stmt::VarDecl {
                kind: DeclKind::Let | DeclKind::Const,
                ..
            }
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use debranch_parser::ast::Expr;
    use debranch_parser::parse;

    fn flatten(src: &str) -> Program {
        flatten_blocks(parse(src).expect("parse failure"))
    }

    fn is_call_to(stmt: &Stmt, name: &str) -> bool {
        matches!(
            stmt,
            Stmt::Expression { expression: Expr::Call { callee, .. }, .. }
                if matches!(&**callee, Expr::Ident { name: n, .. } if n == name)
        )
    }

    #[test]
    fn splices_top_level_blocks() {
        let program = flatten("{ a(); } { b(); }");
        assert_eq!(program.body.len(), 2);
        assert!(is_call_to(&program.body[0], "a"));
        assert!(is_call_to(&program.body[1], "b"));
    }

    #[test]
    fn deep_nesting_collapses_in_one_pass() {
        let program = flatten("{ { { a(); } } b(); }");
        assert_eq!(program.body.len(), 2);
        assert!(is_call_to(&program.body[0], "a"));
        assert!(is_call_to(&program.body[1], "b"));
    }

    #[test]
    fn if_branch_blocks_are_not_spliced() {
        // A block that is the body of an `if` is load-bearing syntax.
        let program = flatten("if (x) { a(); b(); }");
        assert_eq!(program.body.len(), 1);
        let Stmt::If { consequent, .. } = &program.body[0] else {
            panic!("expected if statement");
        };
        assert!(matches!(&**consequent, Stmt::Block { body, .. } if body.len() == 2));
    }

    #[test]
    fn function_bodies_are_flattened() {
        let program = flatten("function f() { { a(); } b(); }");
        let Stmt::FunctionDecl { function, .. } = &program.body[0] else {
            panic!("expected function declaration");
        };
        assert_eq!(function.body.len(), 2);
        assert!(is_call_to(&function.body[0], "a"));
    }

    #[test]
    fn function_expressions_are_flattened() {
        let program = flatten("var f = function () { { a(); } };");
        let Stmt::VarDecl { declarations, .. } = &program.body[0] else {
            panic!("expected var declaration");
        };
        let Some(Expr::Function(function)) = &declarations[0].init else {
            panic!("expected function initializer");
        };
        assert_eq!(function.body.len(), 1);
        assert!(is_call_to(&function.body[0], "a"));
    }

    #[test]
    fn lexical_blocks_keep_their_braces() {
        // Splicing these would put two `let x` declarations in the same
        // scope, which is a SyntaxError at runtime.
        let program = flatten("{ let x = 1; f(x); } { let x = 2; g(x); }");
        assert_eq!(program.body.len(), 2);
        assert!(matches!(&program.body[0], Stmt::Block { body, .. } if body.len() == 2));
        assert!(matches!(&program.body[1], Stmt::Block { body, .. } if body.len() == 2));

        let program = flatten("{ const c = 1; } a();");
        assert_eq!(program.body.len(), 2);
        assert!(matches!(&program.body[0], Stmt::Block { .. }));
    }

    #[test]
    fn var_blocks_still_splice() {
        // `var` hoists to function scope whether or not the braces stay.
        let program = flatten("{ var a = 1; } { var b = 2; } c();");
        assert_eq!(program.body.len(), 3);
        assert!(matches!(&program.body[0], Stmt::VarDecl { .. }));
        assert!(matches!(&program.body[1], Stmt::VarDecl { .. }));
        assert!(is_call_to(&program.body[2], "c"));
    }

    #[test]
    fn lexical_block_nested_in_plain_block_survives() {
        // The outer braces go, the scoping braces stay.
        let program = flatten("{ { let t = q(); use(t); } } done();");
        assert_eq!(program.body.len(), 2);
        assert!(matches!(&program.body[0], Stmt::Block { body, .. } if body.len() == 2));
        assert!(is_call_to(&program.body[1], "done"));
    }

    #[test]
    fn flat_programs_are_untouched() {
        let program = flatten("a(); if (x) { b(); } c();");
        assert_eq!(program.body.len(), 3);
    }
}
