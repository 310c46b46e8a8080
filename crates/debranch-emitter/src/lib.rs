//! JavaScript code generation.
//!
//! Prints a rewritten tree back to source text and records a source map
//! entry for every statement start and every identifier, literal and `this`
//! read, so a debugger stepping through the stripped output lands on the
//! right positions in the original file.
//!
//! Formatting is fixed: four-space indentation, single-quoted strings,
//! spaces around binary operators, one statement per line. Parentheses are
//! reconstructed from operator precedence rather than preserved, so
//! semantically redundant ones disappear.

use debranch_common::{LineMap, SourceMapGenerator, Span};
use debranch_parser::ast::{
    DeclKind, Expr, Function, MemberProp, Program, Property, PropertyKey, Stmt, Value,
    number_to_string,
};
use tracing::trace;

const INDENT: &str = "    ";

/// Print `program` and build its source map against `source_text`.
///
/// `source_name` is recorded in the map's `sources`, `output_name` as its
/// `file`.
pub fn generate(
    program: &Program,
    source_text: &str,
    source_name: &str,
    output_name: &str,
) -> (String, SourceMapGenerator) {
    let mut emitter = Emitter::new(source_text, source_name, output_name);
    for stmt in &program.body {
        emitter.emit_stmt(stmt, 0);
    }
    trace!(
        lines = emitter.line + 1,
        bytes = emitter.out.len(),
        "emitted program"
    );
    (emitter.out, emitter.map)
}

struct Emitter {
    out: String,
    /// Current generated line, zero-based.
    line: u32,
    /// Byte offset in `out` where the current line starts.
    line_start: usize,
    map: SourceMapGenerator,
    source_index: u32,
    positions: LineMap,
}

impl Emitter {
    fn new(source_text: &str, source_name: &str, output_name: &str) -> Self {
        let mut map = SourceMapGenerator::new(output_name.to_string());
        let source_index = map.add_source(source_name.to_string());
        Self {
            out: String::new(),
            line: 0,
            line_start: 0,
            map,
            source_index,
            positions: LineMap::new(source_text),
        }
    }

    fn write(&mut self, text: &str) {
        debug_assert!(!text.contains('\n'), "line breaks go through newline()");
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.line += 1;
        self.line_start = self.out.len();
    }

    fn write_indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
    }

    fn column(&self) -> u32 {
        (self.out.len() - self.line_start) as u32
    }

    /// Map the next characters written to the original position of `span`.
    fn record(&mut self, span: Span) {
        let (original_line, original_column) = self.positions.position(span.start);
        self.map.add_simple_mapping(
            self.line,
            self.column(),
            self.source_index,
            original_line,
            original_column,
        );
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn emit_stmt(&mut self, stmt: &Stmt, depth: usize) {
        self.write_indent(depth);
        self.record(stmt.span());
        match stmt {
            Stmt::Expression { expression, .. } => {
                let hazard = starts_statement_hazard(expression);
                if hazard {
                    self.write("(");
                }
                self.emit_expr(expression, 0);
                if hazard {
                    self.write(")");
                }
                self.write(";");
                self.newline();
            }
            Stmt::Block { body, .. } => {
                self.write("{");
                self.newline();
                for inner in body {
                    self.emit_stmt(inner, depth + 1);
                }
                self.write_indent(depth);
                self.write("}");
                self.newline();
            }
            Stmt::If {
                test,
                consequent,
                alternate,
                ..
            } => self.emit_if(test, consequent, alternate.as_deref(), depth),
            Stmt::VarDecl {
                kind, declarations, ..
            } => {
                self.emit_var_decl(*kind, declarations);
                self.write(";");
                self.newline();
            }
            Stmt::FunctionDecl { function, .. } => {
                self.emit_function(function, depth);
                self.newline();
            }
            Stmt::Return { argument, .. } => {
                self.write("return");
                if let Some(argument) = argument {
                    self.write(" ");
                    self.emit_expr(argument, 0);
                }
                self.write(";");
                self.newline();
            }
            Stmt::Empty { .. } => {
                self.write(";");
                self.newline();
            }
        }
    }

    fn emit_if(&mut self, test: &Expr, consequent: &Stmt, alternate: Option<&Stmt>, depth: usize) {
        self.write("if (");
        self.emit_expr(test, 0);
        self.write(")");
        self.emit_branch_body(consequent, depth);
        if let Some(alternate) = alternate {
            self.write_indent(depth);
            self.write("else");
            if let Stmt::If {
                test,
                consequent,
                alternate,
                ..
            } = alternate
            {
                // `else if` chains stay on one line.
                self.write(" ");
                self.emit_if(test, consequent, alternate.as_deref(), depth);
            } else {
                self.emit_branch_body(alternate, depth);
            }
        }
    }

    /// The body of an `if` or `else`: blocks open on the same line, single
    /// statements drop to an indented line.
    fn emit_branch_body(&mut self, body: &Stmt, depth: usize) {
        if let Stmt::Block { body: inner, .. } = body {
            self.write(" {");
            self.newline();
            for stmt in inner {
                self.emit_stmt(stmt, depth + 1);
            }
            self.write_indent(depth);
            self.write("}");
            self.newline();
        } else {
            self.newline();
            self.emit_stmt(body, depth + 1);
        }
    }

    fn emit_var_decl(&mut self, kind: DeclKind, declarations: &[debranch_parser::ast::Declarator]) {
        self.write(kind.as_str());
        self.write(" ");
        for (i, decl) in declarations.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.record(decl.span);
            self.write(&decl.name);
            if let Some(init) = &decl.init {
                self.write(" = ");
                // Initializers sit at assignment level: sequences need parens.
                self.emit_expr(init, PREC_ASSIGN);
            }
        }
    }

    fn emit_function(&mut self, function: &Function, depth: usize) {
        self.write("function ");
        if let Some(name) = &function.name {
            self.write(name);
        }
        self.write("(");
        for (i, param) in function.params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.record(param.span);
            self.write(&param.name);
        }
        self.write(") {");
        self.newline();
        for stmt in &function.body {
            self.emit_stmt(stmt, depth + 1);
        }
        self.write_indent(depth);
        self.write("}");
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Emit `expr`, parenthesizing when its own precedence is below what the
    /// surrounding context requires.
    fn emit_expr(&mut self, expr: &Expr, min_prec: u8) {
        if precedence(expr) < min_prec {
            self.write("(");
            self.emit_expr_inner(expr);
            self.write(")");
        } else {
            self.emit_expr_inner(expr);
        }
    }

    fn emit_expr_inner(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { value, span } => {
                self.record(*span);
                self.emit_value(value);
            }
            Expr::Ident { name, span } => {
                self.record(*span);
                self.write(name);
            }
            Expr::This { span } => {
                self.record(*span);
                self.write("this");
            }
            Expr::Unary { op, argument, .. } => {
                self.write(op.as_str());
                if op.is_keyword() || needs_separating_space(*op, argument) {
                    self.write(" ");
                }
                self.emit_expr(argument, PREC_UNARY);
            }
            Expr::Update {
                op,
                prefix,
                argument,
                ..
            } => {
                if *prefix {
                    self.write(op.as_str());
                    self.emit_expr(argument, PREC_LHS);
                } else {
                    self.emit_expr(argument, PREC_LHS);
                    self.write(op.as_str());
                }
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                let prec = op.precedence();
                self.emit_expr(left, prec);
                self.write(" ");
                self.write(op.as_str());
                self.write(" ");
                self.emit_expr(right, prec + 1);
            }
            Expr::Logical {
                op, left, right, ..
            } => {
                let prec = op.precedence();
                self.emit_expr(left, prec);
                self.write(" ");
                self.write(op.as_str());
                self.write(" ");
                self.emit_expr(right, prec + 1);
            }
            Expr::Assign {
                op, target, value, ..
            } => {
                self.emit_expr(target, PREC_LHS);
                self.write(" ");
                self.write(op.as_str());
                self.write(" ");
                self.emit_expr(value, PREC_ASSIGN);
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.emit_expr(test, PREC_CONDITIONAL + 1);
                self.write(" ? ");
                self.emit_expr(consequent, PREC_ASSIGN);
                self.write(" : ");
                self.emit_expr(alternate, PREC_ASSIGN);
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                self.emit_expr(callee, PREC_LHS);
                self.emit_arguments(arguments);
            }
            Expr::New {
                callee, arguments, ..
            } => {
                self.write("new ");
                // A call in callee position must be forced into parens, or
                // the argument list would bind to the wrong expression.
                self.emit_expr(callee, PREC_MEMBER);
                self.emit_arguments(arguments);
            }
            Expr::Member {
                object, property, ..
            } => {
                // `1..x` is a syntax error without parens around the number.
                if matches!(
                    &**object,
                    Expr::Literal {
                        value: Value::Number(_),
                        ..
                    }
                ) {
                    self.write("(");
                    self.emit_expr(object, 0);
                    self.write(")");
                } else {
                    self.emit_expr(object, PREC_LHS);
                }
                match property {
                    MemberProp::Static(name) => {
                        self.write(".");
                        self.write(name);
                    }
                    MemberProp::Computed(index) => {
                        self.write("[");
                        self.emit_expr(index, 0);
                        self.write("]");
                    }
                }
            }
            Expr::Array { elements, .. } => {
                self.write("[");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.emit_expr(element, PREC_ASSIGN);
                }
                self.write("]");
            }
            Expr::Object { properties, .. } => {
                if properties.is_empty() {
                    self.write("{}");
                    return;
                }
                self.write("{ ");
                for (i, property) in properties.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.emit_property(property);
                }
                self.write(" }");
            }
            Expr::Sequence { expressions, .. } => {
                for (i, expression) in expressions.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.emit_expr(expression, PREC_ASSIGN);
                }
            }
            Expr::Function(function) => {
                // Statement indentation is lost inside expressions; nested
                // bodies restart from the current depth estimate.
                let depth = self.current_depth();
                self.emit_function(function, depth);
            }
        }
    }

    fn emit_arguments(&mut self, arguments: &[Expr]) {
        self.write("(");
        for (i, argument) in arguments.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.emit_expr(argument, PREC_ASSIGN);
        }
        self.write(")");
    }

    fn emit_property(&mut self, property: &Property) {
        self.record(property.span);
        match &property.key {
            PropertyKey::Ident(name) => self.write(name),
            PropertyKey::Str(s) => self.emit_string(s),
            PropertyKey::Num(n) => {
                let text = number_to_string(*n);
                self.write(&text);
            }
        }
        self.write(": ");
        self.emit_expr(&property.value, PREC_ASSIGN);
    }

    fn emit_value(&mut self, value: &Value) {
        match value {
            Value::Undefined => self.write("undefined"),
            Value::Null => self.write("null"),
            Value::Bool(true) => self.write("true"),
            Value::Bool(false) => self.write("false"),
            Value::Number(n) => {
                let text = number_to_string(*n);
                self.write(&text);
            }
            Value::Str(s) => self.emit_string(s),
            Value::RegExp { pattern, flags } => {
                self.write("/");
                self.write(pattern);
                self.write("/");
                self.write(flags);
            }
        }
    }

    fn emit_string(&mut self, s: &str) {
        let mut text = String::with_capacity(s.len() + 2);
        text.push('\'');
        for c in s.chars() {
            match c {
                '\'' => text.push_str("\\'"),
                '\\' => text.push_str("\\\\"),
                '\n' => text.push_str("\\n"),
                '\r' => text.push_str("\\r"),
                '\t' => text.push_str("\\t"),
                '\0' => text.push_str("\\0"),
                c if (c as u32) < 0x20 => {
                    text.push_str(&format!("\\x{:02x}", c as u32));
                }
                c => text.push(c),
            }
        }
        text.push('\'');
        self.write(&text);
    }

    /// Indentation depth of the line being written, derived from what has
    /// already been emitted on it.
    fn current_depth(&self) -> usize {
        let line = &self.out[self.line_start..];
        let spaces = line.len() - line.trim_start_matches(' ').len();
        spaces / INDENT.len()
    }
}

// =============================================================================
// Precedence
// =============================================================================

const PREC_SEQUENCE: u8 = 0;
const PREC_ASSIGN: u8 = 1;
const PREC_CONDITIONAL: u8 = 2;
const PREC_UNARY: u8 = 13;
const PREC_POSTFIX: u8 = 14;
const PREC_LHS: u8 = 15;
const PREC_MEMBER: u8 = 16;
const PREC_PRIMARY: u8 = 17;

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Sequence { .. } => PREC_SEQUENCE,
        Expr::Assign { .. } => PREC_ASSIGN,
        Expr::Conditional { .. } => PREC_CONDITIONAL,
        Expr::Logical { op, .. } => op.precedence(),
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Unary { .. } => PREC_UNARY,
        Expr::Update { prefix, .. } => {
            if *prefix {
                PREC_UNARY
            } else {
                PREC_POSTFIX
            }
        }
        Expr::Call { .. } => PREC_LHS,
        Expr::New { .. } | Expr::Member { .. } => PREC_MEMBER,
        Expr::Literal { .. }
        | Expr::Ident { .. }
        | Expr::This { .. }
        | Expr::Array { .. }
        | Expr::Object { .. }
        | Expr::Function(_) => PREC_PRIMARY,
    }
}

/// Would this expression statement's first token be misparsed as a block or
/// function declaration?
fn starts_statement_hazard(expr: &Expr) -> bool {
    match expr {
        Expr::Function(_) | Expr::Object { .. } => true,
        Expr::Binary { left, .. } | Expr::Logical { left, .. } => starts_statement_hazard(left),
        Expr::Assign { target, .. } => starts_statement_hazard(target),
        Expr::Conditional { test, .. } => starts_statement_hazard(test),
        Expr::Call { callee, .. } => starts_statement_hazard(callee),
        Expr::Member { object, .. } => starts_statement_hazard(object),
        Expr::Sequence { expressions, .. } => expressions
            .first()
            .is_some_and(starts_statement_hazard),
        Expr::Update {
            prefix: false,
            argument,
            ..
        } => starts_statement_hazard(argument),
        _ => false,
    }
}

/// `-(-x)` must not print as `--x`.
fn needs_separating_space(op: debranch_parser::ast::UnaryOp, argument: &Expr) -> bool {
    use debranch_parser::ast::{UnaryOp, UpdateOp};
    match op {
        UnaryOp::Minus => match argument {
            Expr::Unary {
                op: UnaryOp::Minus, ..
            } => true,
            Expr::Update {
                op: UpdateOp::Decr,
                prefix: true,
                ..
            } => true,
            Expr::Literal {
                value: Value::Number(n),
                ..
            } => n.is_sign_negative(),
            _ => false,
        },
        UnaryOp::Plus => matches!(
            argument,
            Expr::Unary {
                op: UnaryOp::Plus, ..
            } | Expr::Update {
                op: UpdateOp::Incr,
                prefix: true,
                ..
            }
        ),
        _ => false,
    }
}
