//! Recursive-descent parser for the ES5 subset the transform operates on.
//!
//! Statements: expression statements (with automatic semicolon insertion),
//! blocks, `if`/`else`, `var`/`let`/`const`, function declarations, `return`
//! and empty statements. Expressions: the complete ES5 operator grammar.
//! Anything else (loops, `switch`, `try`, ...) is rejected with a clear
//! error instead of being misparsed.

use crate::ast::*;
use crate::error::ParseError;
use crate::scanner::{Scanner, Token, TokenKind};
use debranch_common::Span;

pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token,
    /// End offset of the most recently consumed token.
    last_end: u32,
    source_len: u32,
}

/// Parse a whole source file.
pub fn parse(src: &str) -> Result<Program, ParseError> {
    let program = Parser::new(src)?.parse_program()?;
    tracing::trace!(statements = program.body.len(), "parsed program");
    Ok(program)
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Result<Self, ParseError> {
        let mut scanner = Scanner::new(src);
        let current = scanner.next_token()?;
        Ok(Self {
            scanner,
            current,
            last_end: 0,
            source_len: src.len() as u32,
        })
    }

    // =========================================================================
    // Token plumbing
    // =========================================================================

    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.scanner.next_token()?;
        let prev = std::mem::replace(&mut self.current, next);
        self.last_end = prev.span.end;
        Ok(prev)
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.current.kind == *kind
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        if self.at(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            self.advance()
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, what: &str) -> ParseError {
        ParseError::new(
            format!("expected {what} but found {}", describe(&self.current.kind)),
            self.current.span,
        )
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.last_end)
    }

    /// Automatic semicolon insertion: an explicit `;`, a closing `}`, end of
    /// input, or a line terminator before the next token all terminate a
    /// statement.
    fn consume_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat(&TokenKind::Semicolon)? {
            return Ok(());
        }
        if self.at(&TokenKind::RightBrace)
            || self.at(&TokenKind::Eof)
            || self.current.newline_before
        {
            return Ok(());
        }
        Err(self.unexpected("`;`"))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        while !self.at(&TokenKind::Eof) {
            body.push(self.parse_statement()?);
        }
        Ok(Program {
            body,
            span: Span::new(0, self.source_len),
        })
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        match &self.current.kind {
            TokenKind::LeftBrace => self.parse_block(),
            TokenKind::If => self.parse_if(),
            TokenKind::Var => self.parse_var_decl(DeclKind::Var),
            TokenKind::Let => self.parse_var_decl(DeclKind::Let),
            TokenKind::Const => self.parse_var_decl(DeclKind::Const),
            TokenKind::Function => {
                self.advance()?;
                let function = self.parse_function_rest(start, true)?;
                let span = function.span;
                Ok(Stmt::FunctionDecl { function, span })
            }
            TokenKind::Return => self.parse_return(),
            TokenKind::Semicolon => {
                self.advance()?;
                Ok(Stmt::Empty {
                    span: self.span_from(start),
                })
            }
            TokenKind::ReservedWord(word) => Err(ParseError::new(
                format!("`{word}` statements are not supported by this tool"),
                self.current.span,
            )),
            _ => {
                let expression = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Stmt::Expression {
                    expression,
                    span: self.span_from(start),
                })
            }
        }
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        self.expect(&TokenKind::LeftBrace, "`{`")?;
        let mut body = Vec::new();
        while !self.at(&TokenKind::RightBrace) {
            if self.at(&TokenKind::Eof) {
                return Err(self.unexpected("`}`"));
            }
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RightBrace, "`}`")?;
        Ok(Stmt::Block {
            body,
            span: self.span_from(start),
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        self.expect(&TokenKind::If, "`if`")?;
        self.expect(&TokenKind::LeftParen, "`(`")?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "`)`")?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.eat(&TokenKind::Else)? {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            test,
            consequent,
            alternate,
            span: self.span_from(start),
        })
    }

    fn parse_var_decl(&mut self, kind: DeclKind) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        self.advance()?; // var/let/const
        let mut declarations = Vec::new();
        loop {
            let decl_start = self.current.span.start;
            let name = self.parse_identifier_name("variable name")?;
            let init = if self.eat(&TokenKind::Equals)? {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            declarations.push(Declarator {
                name,
                init,
                span: self.span_from(decl_start),
            });
            if !self.eat(&TokenKind::Comma)? {
                break;
            }
        }
        self.consume_semicolon()?;
        Ok(Stmt::VarDecl {
            kind,
            declarations,
            span: self.span_from(start),
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current.span.start;
        self.expect(&TokenKind::Return, "`return`")?;
        // Restricted production: a newline after `return` ends the statement.
        let argument = if self.at(&TokenKind::Semicolon)
            || self.at(&TokenKind::RightBrace)
            || self.at(&TokenKind::Eof)
            || self.current.newline_before
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;
        Ok(Stmt::Return {
            argument,
            span: self.span_from(start),
        })
    }

    fn parse_identifier_name(&mut self, what: &str) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Parses the remainder of a function after `function` was consumed.
    fn parse_function_rest(
        &mut self,
        start: u32,
        require_name: bool,
    ) -> Result<Function, ParseError> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Some(name)
            }
            _ if require_name => return Err(self.unexpected("function name")),
            _ => None,
        };

        self.expect(&TokenKind::LeftParen, "`(`")?;
        let mut params = Vec::new();
        if !self.at(&TokenKind::RightParen) {
            loop {
                let param_start = self.current.span.start;
                let name = self.parse_identifier_name("parameter name")?;
                params.push(Param {
                    name,
                    span: self.span_from(param_start),
                });
                if !self.eat(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen, "`)`")?;

        self.expect(&TokenKind::LeftBrace, "`{`")?;
        let mut body = Vec::new();
        while !self.at(&TokenKind::RightBrace) {
            if self.at(&TokenKind::Eof) {
                return Err(self.unexpected("`}`"));
            }
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RightBrace, "`}`")?;

        Ok(Function {
            name,
            params,
            body,
            span: self.span_from(start),
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let first = self.parse_assignment()?;
        if !self.at(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat(&TokenKind::Comma)? {
            expressions.push(self.parse_assignment()?);
        }
        Ok(Expr::Sequence {
            expressions,
            span: self.span_from(start),
        })
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let left = self.parse_conditional()?;

        let Some(op) = assign_op(&self.current.kind) else {
            return Ok(left);
        };
        if !matches!(left, Expr::Ident { .. } | Expr::Member { .. }) {
            return Err(ParseError::new(
                "invalid assignment target",
                left.span(),
            ));
        }
        self.advance()?;
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(left),
            value: Box::new(value),
            span: self.span_from(start),
        })
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let test = self.parse_binary(0)?;
        if !self.eat(&TokenKind::Question)? {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect(&TokenKind::Colon, "`:`")?;
        let alternate = self.parse_assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span: self.span_from(start),
        })
    }

    /// Precedence climbing over the binary and logical operator tiers.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let mut left = self.parse_unary()?;
        loop {
            if let Some(op) = logical_op(&self.current.kind) {
                if op.precedence() < min_prec {
                    break;
                }
                self.advance()?;
                let right = self.parse_binary(op.precedence() + 1)?;
                left = Expr::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    span: self.span_from(start),
                };
            } else if let Some(op) = binary_op(&self.current.kind) {
                if op.precedence() < min_prec {
                    break;
                }
                self.advance()?;
                let right = self.parse_binary(op.precedence() + 1)?;
                left = Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    span: self.span_from(start),
                };
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        if let Some(op) = unary_op(&self.current.kind) {
            self.advance()?;
            let argument = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                argument: Box::new(argument),
                span: self.span_from(start),
            });
        }
        if let Some(op) = update_op(&self.current.kind) {
            self.advance()?;
            let argument = self.parse_unary()?;
            if !matches!(argument, Expr::Ident { .. } | Expr::Member { .. }) {
                return Err(ParseError::new(
                    "invalid increment/decrement target",
                    argument.span(),
                ));
            }
            return Ok(Expr::Update {
                op,
                prefix: true,
                argument: Box::new(argument),
                span: self.span_from(start),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let expr = self.parse_left_hand_side()?;
        // Restricted production: no newline between operand and `++`/`--`.
        if !self.current.newline_before {
            if let Some(op) = update_op(&self.current.kind) {
                if !matches!(expr, Expr::Ident { .. } | Expr::Member { .. }) {
                    return Err(ParseError::new(
                        "invalid increment/decrement target",
                        expr.span(),
                    ));
                }
                self.advance()?;
                return Ok(Expr::Update {
                    op,
                    prefix: false,
                    argument: Box::new(expr),
                    span: self.span_from(start),
                });
            }
        }
        Ok(expr)
    }

    fn parse_left_hand_side(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let mut expr = if self.at(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let name = self.parse_property_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: MemberProp::Static(name),
                        span: self.span_from(start),
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance()?;
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket, "`]`")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: MemberProp::Computed(Box::new(index)),
                        span: self.span_from(start),
                    };
                }
                TokenKind::LeftParen => {
                    let arguments = self.parse_arguments()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        arguments,
                        span: self.span_from(start),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_new(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        self.expect(&TokenKind::New, "`new`")?;
        let mut callee = if self.at(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        // Member accesses bind tighter than the `new` arguments.
        loop {
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let name = self.parse_property_name()?;
                    callee = Expr::Member {
                        object: Box::new(callee),
                        property: MemberProp::Static(name),
                        span: self.span_from(start),
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance()?;
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket, "`]`")?;
                    callee = Expr::Member {
                        object: Box::new(callee),
                        property: MemberProp::Computed(Box::new(index)),
                        span: self.span_from(start),
                    };
                }
                _ => break,
            }
        }
        let arguments = if self.at(&TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr::New {
            callee: Box::new(callee),
            arguments,
            span: self.span_from(start),
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(&TokenKind::LeftParen, "`(`")?;
        let mut arguments = Vec::new();
        if !self.at(&TokenKind::RightParen) {
            loop {
                arguments.push(self.parse_assignment()?);
                if !self.eat(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen, "`)`")?;
        Ok(arguments)
    }

    /// A name after `.` — keywords are valid property names in ES5.
    fn parse_property_name(&mut self) -> Result<String, ParseError> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name) | TokenKind::ReservedWord(name) => name.clone(),
            other => match keyword_text(other) {
                Some(text) => text.to_string(),
                None => return Err(self.unexpected("property name")),
            },
        };
        self.advance()?;
        Ok(name)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current.span.start;
        let span = self.current.span;
        match &self.current.kind {
            TokenKind::NumericLiteral(value) => {
                let value = *value;
                self.advance()?;
                Ok(Expr::Literal {
                    value: Value::Number(value),
                    span,
                })
            }
            TokenKind::StringLiteral(value) => {
                let value = value.clone();
                self.advance()?;
                Ok(Expr::Literal {
                    value: Value::Str(value),
                    span,
                })
            }
            TokenKind::True => {
                self.advance()?;
                Ok(Expr::Literal {
                    value: Value::Bool(true),
                    span,
                })
            }
            TokenKind::False => {
                self.advance()?;
                Ok(Expr::Literal {
                    value: Value::Bool(false),
                    span,
                })
            }
            TokenKind::Null => {
                self.advance()?;
                Ok(Expr::Literal {
                    value: Value::Null,
                    span,
                })
            }
            TokenKind::Slash | TokenKind::SlashEquals => {
                let regex = self.scanner.rescan_regex(&self.current)?;
                let regex_span = regex.span;
                self.current = regex;
                let Token { kind, .. } = self.advance()?;
                let TokenKind::RegexLiteral { pattern, flags } = kind else {
                    unreachable!("rescan_regex returned a non-regex token");
                };
                Ok(Expr::Literal {
                    value: Value::RegExp { pattern, flags },
                    span: regex_span,
                })
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(Expr::Ident { name, span })
            }
            TokenKind::This => {
                self.advance()?;
                Ok(Expr::This { span })
            }
            TokenKind::Function => {
                self.advance()?;
                let function = self.parse_function_rest(start, false)?;
                Ok(Expr::Function(function))
            }
            TokenKind::LeftParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen, "`)`")?;
                Ok(expr)
            }
            TokenKind::LeftBracket => {
                self.advance()?;
                let mut elements = Vec::new();
                while !self.at(&TokenKind::RightBracket) {
                    if self.at(&TokenKind::Comma) {
                        return Err(ParseError::new(
                            "array elisions are not supported",
                            self.current.span,
                        ));
                    }
                    elements.push(self.parse_assignment()?);
                    if !self.eat(&TokenKind::Comma)? {
                        break;
                    }
                }
                self.expect(&TokenKind::RightBracket, "`]`")?;
                Ok(Expr::Array {
                    elements,
                    span: self.span_from(start),
                })
            }
            TokenKind::LeftBrace => self.parse_object(start),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_object(&mut self, start: u32) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftBrace, "`{`")?;
        let mut properties = Vec::new();
        while !self.at(&TokenKind::RightBrace) {
            let prop_start = self.current.span.start;
            let key = match &self.current.kind {
                TokenKind::Identifier(name) | TokenKind::ReservedWord(name) => {
                    PropertyKey::Ident(name.clone())
                }
                TokenKind::StringLiteral(value) => PropertyKey::Str(value.clone()),
                TokenKind::NumericLiteral(value) => PropertyKey::Num(*value),
                other => match keyword_text(other) {
                    Some(text) => PropertyKey::Ident(text.to_string()),
                    None => return Err(self.unexpected("property key")),
                },
            };
            self.advance()?;
            self.expect(&TokenKind::Colon, "`:`")?;
            let value = self.parse_assignment()?;
            properties.push(Property {
                key,
                value,
                span: self.span_from(prop_start),
            });
            if !self.eat(&TokenKind::Comma)? {
                break;
            }
        }
        self.expect(&TokenKind::RightBrace, "`}`")?;
        Ok(Expr::Object {
            properties,
            span: self.span_from(start),
        })
    }
}

// =============================================================================
// Token classification
// =============================================================================

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Bar => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Ampersand => BinaryOp::BitAnd,
        TokenKind::EqualsEquals => BinaryOp::LooseEq,
        TokenKind::ExclamationEquals => BinaryOp::LooseNe,
        TokenKind::EqualsEqualsEquals => BinaryOp::StrictEq,
        TokenKind::ExclamationEqualsEquals => BinaryOp::StrictNe,
        TokenKind::LessThan => BinaryOp::Lt,
        TokenKind::GreaterThan => BinaryOp::Gt,
        TokenKind::LessEquals => BinaryOp::Le,
        TokenKind::GreaterEquals => BinaryOp::Ge,
        TokenKind::In => BinaryOp::In,
        TokenKind::InstanceOf => BinaryOp::InstanceOf,
        TokenKind::LessLess => BinaryOp::Shl,
        TokenKind::GreaterGreater => BinaryOp::Shr,
        TokenKind::GreaterGreaterGreater => BinaryOp::UShr,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        _ => return None,
    })
}

fn logical_op(kind: &TokenKind) -> Option<LogicalOp> {
    Some(match kind {
        TokenKind::AmpersandAmpersand => LogicalOp::And,
        TokenKind::BarBar => LogicalOp::Or,
        _ => return None,
    })
}

fn unary_op(kind: &TokenKind) -> Option<UnaryOp> {
    Some(match kind {
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Minus => UnaryOp::Minus,
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Exclamation => UnaryOp::Not,
        TokenKind::TypeOf => UnaryOp::TypeOf,
        TokenKind::Void => UnaryOp::Void,
        TokenKind::Delete => UnaryOp::Delete,
        _ => return None,
    })
}

fn update_op(kind: &TokenKind) -> Option<UpdateOp> {
    Some(match kind {
        TokenKind::PlusPlus => UpdateOp::Incr,
        TokenKind::MinusMinus => UpdateOp::Decr,
        _ => return None,
    })
}

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Equals => AssignOp::Assign,
        TokenKind::PlusEquals => AssignOp::AddAssign,
        TokenKind::MinusEquals => AssignOp::SubAssign,
        TokenKind::StarEquals => AssignOp::MulAssign,
        TokenKind::SlashEquals => AssignOp::DivAssign,
        TokenKind::PercentEquals => AssignOp::ModAssign,
        TokenKind::LessLessEquals => AssignOp::ShlAssign,
        TokenKind::GreaterGreaterEquals => AssignOp::ShrAssign,
        TokenKind::GreaterGreaterGreaterEquals => AssignOp::UShrAssign,
        TokenKind::AmpersandEquals => AssignOp::BitAndAssign,
        TokenKind::BarEquals => AssignOp::BitOrAssign,
        TokenKind::CaretEquals => AssignOp::BitXorAssign,
        _ => return None,
    })
}

fn keyword_text(kind: &TokenKind) -> Option<&'static str> {
    Some(match kind {
        TokenKind::If => "if",
        TokenKind::Else => "else",
        TokenKind::Function => "function",
        TokenKind::Var => "var",
        TokenKind::Let => "let",
        TokenKind::Const => "const",
        TokenKind::Return => "return",
        TokenKind::New => "new",
        TokenKind::Delete => "delete",
        TokenKind::Void => "void",
        TokenKind::TypeOf => "typeof",
        TokenKind::In => "in",
        TokenKind::InstanceOf => "instanceof",
        TokenKind::This => "this",
        TokenKind::True => "true",
        TokenKind::False => "false",
        TokenKind::Null => "null",
        _ => return None,
    })
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Identifier(name) => format!("identifier `{name}`"),
        TokenKind::ReservedWord(word) => format!("keyword `{word}`"),
        TokenKind::NumericLiteral(n) => format!("number `{n}`"),
        TokenKind::StringLiteral(_) => "string literal".to_string(),
        TokenKind::RegexLiteral { .. } => "regex literal".to_string(),
        TokenKind::Eof => "end of input".to_string(),
        other => match keyword_text(other) {
            Some(text) => format!("`{text}`"),
            None => "punctuation".to_string(),
        },
    }
}
