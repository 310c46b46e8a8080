//! The `if`-statement rewrite.
//!
//! For every `if` whose test has a decidable truthiness, the statement is
//! replaced by a block holding the surviving branch. The test expression is
//! retained (with known constants substituted in) only when discarding it
//! would drop an observable effect. Undecidable tests leave the statement
//! untouched.

use crate::truthiness::{Truthiness, boolean_condition};
use crate::{KnownVars, has_side_effect, substitute};
use debranch_binder::{Binding, ScopeLookup, ScopeStack};
use debranch_parser::ast::{Expr, Program, Stmt};
use debranch_parser::walk::{self, Visitor};
use tracing::debug;

/// Collapse every decidable `if` statement in `program` under the known
/// constants `known`. The result usually wants a [`crate::flatten_blocks`]
/// pass to clean up the blocks this leaves behind.
pub fn eliminate_branches(program: Program, known: &KnownVars) -> Program {
    let mut eliminator = BranchEliminator {
        known,
        scopes: ScopeStack::new(),
    };
    eliminator.scopes.enter_program(&program);
    walk::rewrite_program(program, &mut eliminator)
}

/// Scope view that treats the known-constants environment as a layer of
/// never-reassigned bindings over the real lexical scopes. A known name
/// shadows whatever the program declares, matching substitution.
struct KnownVarsScope<'a> {
    known: &'a KnownVars,
    inner: &'a dyn ScopeLookup,
}

impl ScopeLookup for KnownVarsScope<'_> {
    fn resolve(&self, name: &str) -> Option<Binding> {
        if self.known.contains(name) {
            return Some(Binding::statically_known());
        }
        self.inner.resolve(name)
    }
}

struct BranchEliminator<'a> {
    known: &'a KnownVars,
    scopes: ScopeStack,
}

impl BranchEliminator<'_> {
    /// Rewrites run on enter, so a collapsed branch's own `if` statements
    /// are still visited afterwards.
    fn rewrite_if(
        &self,
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
        span: debranch_common::Span,
    ) -> Stmt {
        let verdict = boolean_condition(&test, self.known);
        if verdict == Truthiness::Indeterminate {
            return Stmt::If {
                test,
                consequent,
                alternate,
                span,
            };
        }

        let scope = KnownVarsScope {
            known: self.known,
            inner: &self.scopes,
        };
        let effectful = has_side_effect(&test, &scope);
        debug!(?verdict, effectful, offset = span.start, "collapsing if statement");

        let mut body = Vec::new();
        if effectful {
            let test_span = test.span();
            body.push(Stmt::Expression {
                expression: substitute(test, self.known),
                span: test_span,
            });
        }
        match verdict {
            Truthiness::True => body.push(*consequent),
            Truthiness::False => {
                if let Some(alternate) = alternate {
                    body.push(*alternate);
                }
            }
            Truthiness::Indeterminate => unreachable!("handled above"),
        }
        Stmt::Block { body, span }
    }
}

impl Visitor for BranchEliminator<'_> {
    fn enter_stmt(&mut self, stmt: Stmt) -> Stmt {
        match stmt {
            Stmt::If {
                test,
                consequent,
                alternate,
                span,
            } => self.rewrite_if(test, consequent, alternate, span),
            Stmt::FunctionDecl { function, span } => {
                self.scopes.enter_function(&function);
                Stmt::FunctionDecl { function, span }
            }
            other => other,
        }
    }

    fn leave_stmt(&mut self, stmt: Stmt) -> Stmt {
        if matches!(stmt, Stmt::FunctionDecl { .. }) {
            self.scopes.leave();
        }
        stmt
    }

    fn enter_expr(&mut self, expr: Expr) -> Expr {
        if let Expr::Function(function) = &expr {
            self.scopes.enter_function(function);
        }
        expr
    }

    fn leave_expr(&mut self, expr: Expr) -> Expr {
        if matches!(expr, Expr::Function(_)) {
            self.scopes.leave();
        }
        expr
    }
}
