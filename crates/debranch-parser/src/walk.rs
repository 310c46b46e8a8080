//! Generic tree rewriting.
//!
//! A single fold primitive drives every pass: visitors take a node by value
//! and return either the same node or a replacement. `enter_*` runs before a
//! node's children are rewritten (so a replacement's children are still
//! visited), `leave_*` after. Passes that need no hook just keep the default
//! identity implementations.

use crate::ast::{Expr, Function, MemberProp, Program, Property, Stmt};

pub trait Visitor {
    fn enter_stmt(&mut self, stmt: Stmt) -> Stmt {
        stmt
    }
    fn leave_stmt(&mut self, stmt: Stmt) -> Stmt {
        stmt
    }
    fn enter_expr(&mut self, expr: Expr) -> Expr {
        expr
    }
    fn leave_expr(&mut self, expr: Expr) -> Expr {
        expr
    }
}

pub fn rewrite_program<V: Visitor>(program: Program, visitor: &mut V) -> Program {
    Program {
        body: rewrite_stmts(program.body, visitor),
        span: program.span,
    }
}

pub fn rewrite_stmts<V: Visitor>(body: Vec<Stmt>, visitor: &mut V) -> Vec<Stmt> {
    body.into_iter()
        .map(|stmt| rewrite_stmt(stmt, visitor))
        .collect()
}

pub fn rewrite_stmt<V: Visitor>(stmt: Stmt, visitor: &mut V) -> Stmt {
    let stmt = visitor.enter_stmt(stmt);
    let stmt = match stmt {
        Stmt::Expression { expression, span } => Stmt::Expression {
            expression: rewrite_expr(expression, visitor),
            span,
        },
        Stmt::Block { body, span } => Stmt::Block {
            body: rewrite_stmts(body, visitor),
            span,
        },
        Stmt::If {
            test,
            consequent,
            alternate,
            span,
        } => Stmt::If {
            test: rewrite_expr(test, visitor),
            consequent: Box::new(rewrite_stmt(*consequent, visitor)),
            alternate: alternate.map(|alt| Box::new(rewrite_stmt(*alt, visitor))),
            span,
        },
        Stmt::VarDecl {
            kind,
            declarations,
            span,
        } => Stmt::VarDecl {
            kind,
            declarations: declarations
                .into_iter()
                .map(|mut decl| {
                    decl.init = decl.init.map(|init| rewrite_expr(init, visitor));
                    decl
                })
                .collect(),
            span,
        },
        Stmt::FunctionDecl { function, span } => Stmt::FunctionDecl {
            function: rewrite_function(function, visitor),
            span,
        },
        Stmt::Return { argument, span } => Stmt::Return {
            argument: argument.map(|arg| rewrite_expr(arg, visitor)),
            span,
        },
        Stmt::Empty { span } => Stmt::Empty { span },
    };
    visitor.leave_stmt(stmt)
}

pub fn rewrite_expr<V: Visitor>(expr: Expr, visitor: &mut V) -> Expr {
    let expr = visitor.enter_expr(expr);
    let expr = match expr {
        Expr::Literal { value, span } => Expr::Literal { value, span },
        Expr::Ident { name, span } => Expr::Ident { name, span },
        Expr::This { span } => Expr::This { span },
        Expr::Unary { op, argument, span } => Expr::Unary {
            op,
            argument: Box::new(rewrite_expr(*argument, visitor)),
            span,
        },
        Expr::Update {
            op,
            prefix,
            argument,
            span,
        } => Expr::Update {
            op,
            prefix,
            argument: Box::new(rewrite_expr(*argument, visitor)),
            span,
        },
        Expr::Binary {
            op,
            left,
            right,
            span,
        } => Expr::Binary {
            op,
            left: Box::new(rewrite_expr(*left, visitor)),
            right: Box::new(rewrite_expr(*right, visitor)),
            span,
        },
        Expr::Logical {
            op,
            left,
            right,
            span,
        } => Expr::Logical {
            op,
            left: Box::new(rewrite_expr(*left, visitor)),
            right: Box::new(rewrite_expr(*right, visitor)),
            span,
        },
        Expr::Assign {
            op,
            target,
            value,
            span,
        } => Expr::Assign {
            op,
            target: Box::new(rewrite_expr(*target, visitor)),
            value: Box::new(rewrite_expr(*value, visitor)),
            span,
        },
        Expr::Conditional {
            test,
            consequent,
            alternate,
            span,
        } => Expr::Conditional {
            test: Box::new(rewrite_expr(*test, visitor)),
            consequent: Box::new(rewrite_expr(*consequent, visitor)),
            alternate: Box::new(rewrite_expr(*alternate, visitor)),
            span,
        },
        Expr::Call {
            callee,
            arguments,
            span,
        } => Expr::Call {
            callee: Box::new(rewrite_expr(*callee, visitor)),
            arguments: rewrite_exprs(arguments, visitor),
            span,
        },
        Expr::New {
            callee,
            arguments,
            span,
        } => Expr::New {
            callee: Box::new(rewrite_expr(*callee, visitor)),
            arguments: rewrite_exprs(arguments, visitor),
            span,
        },
        Expr::Member {
            object,
            property,
            span,
        } => Expr::Member {
            object: Box::new(rewrite_expr(*object, visitor)),
            property: match property {
                MemberProp::Static(name) => MemberProp::Static(name),
                MemberProp::Computed(index) => {
                    MemberProp::Computed(Box::new(rewrite_expr(*index, visitor)))
                }
            },
            span,
        },
        Expr::Array { elements, span } => Expr::Array {
            elements: rewrite_exprs(elements, visitor),
            span,
        },
        Expr::Object { properties, span } => Expr::Object {
            properties: properties
                .into_iter()
                .map(|prop| Property {
                    key: prop.key,
                    value: rewrite_expr(prop.value, visitor),
                    span: prop.span,
                })
                .collect(),
            span,
        },
        Expr::Sequence { expressions, span } => Expr::Sequence {
            expressions: rewrite_exprs(expressions, visitor),
            span,
        },
        Expr::Function(function) => Expr::Function(rewrite_function(function, visitor)),
    };
    visitor.leave_expr(expr)
}

fn rewrite_exprs<V: Visitor>(exprs: Vec<Expr>, visitor: &mut V) -> Vec<Expr> {
    exprs
        .into_iter()
        .map(|expr| rewrite_expr(expr, visitor))
        .collect()
}

fn rewrite_function<V: Visitor>(function: Function, visitor: &mut V) -> Function {
    Function {
        name: function.name,
        params: function.params,
        body: rewrite_stmts(function.body, visitor),
        span: function.span,
    }
}
