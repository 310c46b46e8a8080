//! Lexical scope analysis.
//!
//! The side-effect analyzer needs exactly one fact about an identifier: does
//! it resolve to a binding that is provably never reassigned? Reading such a
//! binding cannot observably affect anything, so a discarded test that only
//! mentions static bindings can be dropped outright.
//!
//! Scopes are an explicit, invocation-local stack entered and left in
//! lock-step with tree descent (`enter_program`/`enter_function`/`leave`),
//! never shared mutable state, so independent transform invocations can run
//! in parallel.
//!
//! Resolution intentionally over-approximates ES5 `var` hoisting: `let` and
//! `const` are hoisted to the enclosing function scope like `var`. That can
//! only make more identifiers resolve, and a binding is marked non-static
//! whenever any assignment in scope could reach it, so the approximation
//! never claims an effect-free read that is not.

use debranch_parser::ast::{Declarator, Expr, Function, MemberProp, Program, Stmt};
use rustc_hash::FxHashMap;
use tracing::trace;

/// What scope resolution knows about one declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    assigned: bool,
}

impl Binding {
    /// A binding that is provably never reassigned in its lifetime.
    pub const fn statically_known() -> Self {
        Self { assigned: false }
    }

    /// True when the binding is never the target of an assignment or
    /// update anywhere it is visible.
    pub fn is_static(&self) -> bool {
        !self.assigned
    }
}

/// The seam consumed by the side-effect analyzer. The branch eliminator
/// layers a known-constants view on top of the real stack through this trait.
pub trait ScopeLookup {
    fn resolve(&self, name: &str) -> Option<Binding>;
}

/// Invocation-local stack of lexical scopes.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<FxHashMap<String, Binding>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Push the top-level scope for a program.
    pub fn enter_program(&mut self, program: &Program) {
        let scope = build_scope(&[], &program.body);
        trace!(bindings = scope.len(), "entered program scope");
        self.scopes.push(scope);
    }

    /// Push the scope a function body executes in.
    pub fn enter_function(&mut self, function: &Function) {
        let params: Vec<&str> = function.params.iter().map(|p| p.name.as_str()).collect();
        let mut scope = build_scope(&params, &function.body);
        // A named function expression can refer to itself.
        if let Some(name) = &function.name {
            scope
                .entry(name.clone())
                .or_insert(Binding { assigned: false });
        }
        self.scopes.push(scope);
    }

    pub fn leave(&mut self) {
        debug_assert!(!self.scopes.is_empty(), "scope stack underflow");
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl ScopeLookup for ScopeStack {
    fn resolve(&self, name: &str) -> Option<Binding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }
}

/// Collect the names declared in a scope body and decide, for each, whether
/// any reachable assignment can rewrite it.
fn build_scope(params: &[&str], body: &[Stmt]) -> FxHashMap<String, Binding> {
    let mut names: Vec<String> = params.iter().map(|p| (*p).to_string()).collect();
    hoist_declarations(body, &mut names);

    let mut scope = FxHashMap::default();
    for name in names {
        if scope.contains_key(&name) {
            continue;
        }
        let assigned = body.iter().any(|stmt| stmt_assigns(stmt, &name));
        scope.insert(name, Binding { assigned });
    }
    scope
}

/// Names declared in a scope body: declarators and function declarations,
/// hoisted out of nested blocks but not out of nested functions.
fn hoist_declarations(body: &[Stmt], names: &mut Vec<String>) {
    for stmt in body {
        match stmt {
            Stmt::VarDecl { declarations, .. } => {
                for Declarator { name, .. } in declarations {
                    names.push(name.clone());
                }
            }
            Stmt::FunctionDecl { function, .. } => {
                if let Some(name) = &function.name {
                    names.push(name.clone());
                }
            }
            Stmt::Block { body, .. } => hoist_declarations(body, names),
            Stmt::If {
                consequent,
                alternate,
                ..
            } => {
                hoist_declarations(std::slice::from_ref(consequent), names);
                if let Some(alt) = alternate {
                    hoist_declarations(std::slice::from_ref(alt), names);
                }
            }
            Stmt::Expression { .. } | Stmt::Return { .. } | Stmt::Empty { .. } => {}
        }
    }
}

// =============================================================================
// Assignment scanning
// =============================================================================

fn stmt_assigns(stmt: &Stmt, name: &str) -> bool {
    match stmt {
        Stmt::Expression { expression, .. } => expr_assigns(expression, name),
        Stmt::Block { body, .. } => body.iter().any(|s| stmt_assigns(s, name)),
        Stmt::If {
            test,
            consequent,
            alternate,
            ..
        } => {
            expr_assigns(test, name)
                || stmt_assigns(consequent, name)
                || alternate.as_deref().is_some_and(|alt| stmt_assigns(alt, name))
        }
        Stmt::VarDecl { declarations, .. } => declarations
            .iter()
            .any(|decl| decl.init.as_ref().is_some_and(|init| expr_assigns(init, name))),
        Stmt::FunctionDecl { function, .. } => function_assigns(function, name),
        Stmt::Return { argument, .. } => {
            argument.as_ref().is_some_and(|arg| expr_assigns(arg, name))
        }
        Stmt::Empty { .. } => false,
    }
}

fn expr_assigns(expr: &Expr, name: &str) -> bool {
    match expr {
        Expr::Assign { target, value, .. } => {
            matches!(&**target, Expr::Ident { name: n, .. } if n == name)
                || expr_assigns(target, name)
                || expr_assigns(value, name)
        }
        Expr::Update { argument, .. } => {
            matches!(&**argument, Expr::Ident { name: n, .. } if n == name)
                || expr_assigns(argument, name)
        }
        Expr::Unary { argument, .. } => expr_assigns(argument, name),
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            expr_assigns(left, name) || expr_assigns(right, name)
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => {
            expr_assigns(test, name)
                || expr_assigns(consequent, name)
                || expr_assigns(alternate, name)
        }
        Expr::Call {
            callee, arguments, ..
        }
        | Expr::New {
            callee, arguments, ..
        } => expr_assigns(callee, name) || arguments.iter().any(|arg| expr_assigns(arg, name)),
        Expr::Member {
            object, property, ..
        } => {
            expr_assigns(object, name)
                || matches!(property, MemberProp::Computed(index) if expr_assigns(index, name))
        }
        Expr::Array { elements, .. } => elements.iter().any(|el| expr_assigns(el, name)),
        Expr::Object { properties, .. } => {
            properties.iter().any(|prop| expr_assigns(&prop.value, name))
        }
        Expr::Sequence { expressions, .. } => {
            expressions.iter().any(|e| expr_assigns(e, name))
        }
        // A closure can reassign a captured binding, so nested functions are
        // scanned too unless they shadow the name.
        Expr::Function(function) => function_assigns(function, name),
        Expr::Literal { .. } | Expr::Ident { .. } | Expr::This { .. } => false,
    }
}

fn function_assigns(function: &Function, name: &str) -> bool {
    if function_shadows(function, name) {
        return false;
    }
    function.body.iter().any(|stmt| stmt_assigns(stmt, name))
}

fn function_shadows(function: &Function, name: &str) -> bool {
    if function.params.iter().any(|p| p.name == name) {
        return true;
    }
    if function.name.as_deref() == Some(name) {
        return true;
    }
    let mut declared = Vec::new();
    hoist_declarations(&function.body, &mut declared);
    declared.iter().any(|d| d == name)
}
