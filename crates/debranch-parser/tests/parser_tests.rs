use debranch_parser::ast::*;
use debranch_parser::parse;

fn first_expr(src: &str) -> Expr {
    let program = parse(src).expect("parse failure");
    match program.body.into_iter().next() {
        Some(Stmt::Expression { expression, .. }) => expression,
        other => panic!("expected an expression statement, got {other:?}"),
    }
}

#[test]
fn parses_literals() {
    assert!(matches!(
        first_expr("42;"),
        Expr::Literal {
            value: Value::Number(n),
            ..
        } if n == 42.0
    ));
    assert!(matches!(
        first_expr("'hi';"),
        Expr::Literal { value: Value::Str(s), .. } if s == "hi"
    ));
    assert!(matches!(
        first_expr("null;"),
        Expr::Literal {
            value: Value::Null,
            ..
        }
    ));
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let Expr::Binary { op, right, .. } = first_expr("1 + 2 * 3;") else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(
        *right,
        Expr::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn logical_or_is_outermost() {
    let Expr::Logical { op, left, .. } = first_expr("a && b || c;") else {
        panic!("expected logical");
    };
    assert_eq!(op, LogicalOp::Or);
    assert!(matches!(
        *left,
        Expr::Logical {
            op: LogicalOp::And,
            ..
        }
    ));
}

#[test]
fn parentheses_override_precedence() {
    let Expr::Binary { op, left, .. } = first_expr("(1 + 2) * 3;") else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Mul);
    assert!(matches!(
        *left,
        Expr::Binary {
            op: BinaryOp::Add,
            ..
        }
    ));
}

#[test]
fn slash_in_expression_position_is_a_regex() {
    assert!(matches!(
        first_expr("/ab+c/i;"),
        Expr::Literal {
            value: Value::RegExp { pattern, flags },
            ..
        } if pattern == "ab+c" && flags == "i"
    ));
    // ...but after an operand it is division.
    assert!(matches!(
        first_expr("a / b;"),
        Expr::Binary {
            op: BinaryOp::Div,
            ..
        }
    ));
}

#[test]
fn relational_keywords_parse() {
    assert!(matches!(
        first_expr("'x' in obj;"),
        Expr::Binary {
            op: BinaryOp::In,
            ..
        }
    ));
    assert!(matches!(
        first_expr("a instanceof B;"),
        Expr::Binary {
            op: BinaryOp::InstanceOf,
            ..
        }
    ));
}

#[test]
fn member_call_chains() {
    let Expr::Call { callee, .. } = first_expr("a.b[c](1);") else {
        panic!("expected call");
    };
    let Expr::Member { object, property, .. } = *callee else {
        panic!("expected member");
    };
    assert!(matches!(property, MemberProp::Computed(_)));
    assert!(matches!(
        *object,
        Expr::Member {
            property: MemberProp::Static(_),
            ..
        }
    ));
}

#[test]
fn new_with_member_callee() {
    let Expr::New { callee, arguments, .. } = first_expr("new a.B(1, 2);") else {
        panic!("expected new");
    };
    assert!(matches!(*callee, Expr::Member { .. }));
    assert_eq!(arguments.len(), 2);
}

#[test]
fn conditional_and_sequence() {
    assert!(matches!(
        first_expr("a ? b : c;"),
        Expr::Conditional { .. }
    ));
    let Expr::Sequence { expressions, .. } = first_expr("a, b, c;") else {
        panic!("expected sequence");
    };
    assert_eq!(expressions.len(), 3);
}

#[test]
fn assignment_is_right_associative() {
    let Expr::Assign { value, .. } = first_expr("a = b = 1;") else {
        panic!("expected assignment");
    };
    assert!(matches!(*value, Expr::Assign { .. }));
}

#[test]
fn if_else_associates_with_nearest_if() {
    let program = parse("if (a) if (b) c(); else d();").unwrap();
    let Stmt::If {
        consequent,
        alternate,
        ..
    } = &program.body[0]
    else {
        panic!("expected if");
    };
    assert!(alternate.is_none());
    assert!(matches!(
        **consequent,
        Stmt::If {
            alternate: Some(_),
            ..
        }
    ));
}

#[test]
fn var_declarations() {
    let program = parse("var a = 1, b;").unwrap();
    let Stmt::VarDecl {
        kind, declarations, ..
    } = &program.body[0]
    else {
        panic!("expected var decl");
    };
    assert_eq!(*kind, DeclKind::Var);
    assert_eq!(declarations.len(), 2);
    assert!(declarations[0].init.is_some());
    assert!(declarations[1].init.is_none());
}

#[test]
fn automatic_semicolon_insertion() {
    let program = parse("a()\nb()").unwrap();
    assert_eq!(program.body.len(), 2);

    // `return` is a restricted production: the newline terminates it.
    let program = parse("function f() { return\n1; }").unwrap();
    let Stmt::FunctionDecl { function, .. } = &program.body[0] else {
        panic!("expected function");
    };
    assert!(matches!(
        function.body[0],
        Stmt::Return { argument: None, .. }
    ));
}

#[test]
fn object_literals() {
    let Expr::Object { properties, .. } = first_expr("({ a: 1, 'b c': 2, 3: x });") else {
        panic!("expected object");
    };
    assert_eq!(properties.len(), 3);
    assert!(matches!(&properties[0].key, PropertyKey::Ident(k) if k == "a"));
    assert!(matches!(&properties[1].key, PropertyKey::Str(k) if k == "b c"));
    assert!(matches!(&properties[2].key, PropertyKey::Num(n) if *n == 3.0));
}

#[test]
fn spans_point_into_the_source() {
    let src = "  foo(bar);";
    let program = parse(src).unwrap();
    let Stmt::Expression { expression, span } = &program.body[0] else {
        panic!("expected expression statement");
    };
    assert_eq!(&src[span.start as usize..span.end as usize], "foo(bar);");
    let Expr::Call { callee, .. } = expression else {
        panic!("expected call");
    };
    let ident_span = callee.span();
    assert_eq!(&src[ident_span.start as usize..ident_span.end as usize], "foo");
}

#[test]
fn unsupported_statements_are_rejected() {
    let err = parse("while (a) { b(); }").unwrap_err();
    assert!(err.message.contains("not supported"), "{}", err.message);
}

#[test]
fn malformed_input_is_a_syntax_error() {
    assert!(parse("if (a {").is_err());
    assert!(parse("a +").is_err());
    assert!(parse("'unterminated").is_err());
}
