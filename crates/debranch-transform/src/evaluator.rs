//! Compile-time constant evaluation.
//!
//! The predicate and the evaluator are fused: [`constant_value`] decides
//! constancy and computes the value in one structural recursion, so the two
//! can never drift apart. [`is_constant`] is the value-free form for callers
//! that only need the boolean (the side-effect analyzer), and [`evaluate`]
//! keeps the precondition contract of the classic split API: calling it on a
//! node that is not constant is a programming error and panics.
//!
//! Operator semantics reproduce JavaScript exactly — coercions, the
//! loose/strict equality split, string-concatenating `+`, 32-bit bitwise
//! arithmetic. `delete` folds to `true` unconditionally: deletability is not
//! modeled, and `true` is what the operator yields for every non-reference
//! operand a constant expression can contain.

use crate::KnownVars;
use debranch_parser::ast::{
    BinaryOp, Expr, LogicalOp, UnaryOp, Value, string_to_number,
};

/// Is `expr` a compile-time constant?
///
/// `allow_regexp` admits regex literals, which denote a fresh object per
/// evaluation and therefore only count as constant where object identity
/// cannot be observed (under `!`, `void`, `delete` and the logical
/// operators).
pub fn is_constant(expr: &Expr, allow_regexp: bool, known: &KnownVars) -> bool {
    match expr {
        Expr::Literal { value, .. } => {
            !matches!(value, Value::RegExp { .. }) || allow_regexp
        }
        Expr::Ident { name, .. } => known.contains(name),
        Expr::Unary { op, argument, .. } => {
            is_constant(argument, operand_admits_regexp(*op), known)
        }
        Expr::Binary {
            op, left, right, ..
        } => {
            // Membership tests need a runtime object on the right.
            if matches!(op, BinaryOp::In | BinaryOp::InstanceOf) {
                return false;
            }
            is_constant(left, false, known) && is_constant(right, false, known)
        }
        Expr::Logical { left, right, .. } => {
            is_constant(left, true, known) && is_constant(right, true, known)
        }
        Expr::Update { .. }
        | Expr::Assign { .. }
        | Expr::Conditional { .. }
        | Expr::Call { .. }
        | Expr::New { .. }
        | Expr::Member { .. }
        | Expr::Array { .. }
        | Expr::Object { .. }
        | Expr::Sequence { .. }
        | Expr::This { .. }
        | Expr::Function(_) => false,
    }
}

/// The value of `expr` if it is a compile-time constant, `None` otherwise.
///
/// `constant_value(e, a, k).is_some()` agrees with `is_constant(e, a, k)`
/// by construction — both follow the same recursion.
pub fn constant_value(expr: &Expr, allow_regexp: bool, known: &KnownVars) -> Option<Value> {
    match expr {
        Expr::Literal { value, .. } => {
            if matches!(value, Value::RegExp { .. }) && !allow_regexp {
                None
            } else {
                Some(value.clone())
            }
        }
        Expr::Ident { name, .. } => known.get(name).cloned(),
        Expr::Unary { op, argument, .. } => {
            let argument = constant_value(argument, operand_admits_regexp(*op), known)?;
            Some(apply_unary(*op, &argument))
        }
        Expr::Binary {
            op, left, right, ..
        } => {
            if matches!(op, BinaryOp::In | BinaryOp::InstanceOf) {
                return None;
            }
            let left = constant_value(left, false, known)?;
            let right = constant_value(right, false, known)?;
            Some(apply_binary(*op, &left, &right))
        }
        Expr::Logical {
            op, left, right, ..
        } => {
            let left = constant_value(left, true, known)?;
            let right = constant_value(right, true, known)?;
            Some(apply_logical(*op, left, right))
        }
        _ => None,
    }
}

/// Evaluate an expression already proven constant.
///
/// Precondition: `is_constant(expr, true, known)`. Violating it is an
/// internal-invariant fault and aborts — guessing a value here would
/// silently corrupt emitted programs.
pub fn evaluate(expr: &Expr, known: &KnownVars) -> Value {
    constant_value(expr, true, known)
        .unwrap_or_else(|| panic!("evaluate() called on a non-constant expression at {}", expr.span()))
}

/// `void`, `delete` and `!` discard or collapse their operand's identity,
/// so a regex operand is fine; every other unary operator coerces.
fn operand_admits_regexp(op: UnaryOp) -> bool {
    matches!(op, UnaryOp::Void | UnaryOp::Delete | UnaryOp::Not)
}

// =============================================================================
// Operator semantics
// =============================================================================

pub fn apply_unary(op: UnaryOp, argument: &Value) -> Value {
    match op {
        UnaryOp::Plus => Value::Number(argument.to_number()),
        UnaryOp::Minus => Value::Number(-argument.to_number()),
        UnaryOp::BitNot => Value::Number(f64::from(!to_int32(argument.to_number()))),
        UnaryOp::Not => Value::Bool(!argument.is_truthy()),
        // Deletability is not tracked; `true` matches the runtime result for
        // any operand a constant expression can contain.
        UnaryOp::Delete => Value::Bool(true),
        UnaryOp::Void => Value::Undefined,
        UnaryOp::TypeOf => Value::Str(argument.type_of().to_string()),
    }
}

pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::BitOr => int32_op(left, right, |a, b| a | b),
        BinaryOp::BitXor => int32_op(left, right, |a, b| a ^ b),
        BinaryOp::BitAnd => int32_op(left, right, |a, b| a & b),
        BinaryOp::LooseEq => Value::Bool(loose_eq(left, right)),
        BinaryOp::LooseNe => Value::Bool(!loose_eq(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_eq(left, right)),
        BinaryOp::StrictNe => Value::Bool(!strict_eq(left, right)),
        BinaryOp::Lt => Value::Bool(compare(left, right, |o| o == std::cmp::Ordering::Less)),
        BinaryOp::Gt => Value::Bool(compare(left, right, |o| o == std::cmp::Ordering::Greater)),
        BinaryOp::Le => Value::Bool(compare(left, right, |o| o != std::cmp::Ordering::Greater)),
        BinaryOp::Ge => Value::Bool(compare(left, right, |o| o != std::cmp::Ordering::Less)),
        BinaryOp::Shl => {
            let shift = to_uint32(right.to_number()) & 31;
            Value::Number(f64::from(to_int32(left.to_number()) << shift))
        }
        BinaryOp::Shr => {
            let shift = to_uint32(right.to_number()) & 31;
            Value::Number(f64::from(to_int32(left.to_number()) >> shift))
        }
        BinaryOp::UShr => {
            let shift = to_uint32(right.to_number()) & 31;
            Value::Number(f64::from(to_uint32(left.to_number()) >> shift))
        }
        BinaryOp::Add => {
            if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                Value::Str(format!("{}{}", left.to_js_string(), right.to_js_string()))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        // IEEE remainder with the dividend's sign, same as JavaScript `%`.
        BinaryOp::Mod => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::In | BinaryOp::InstanceOf => {
            unreachable!("membership tests are never compile-time constants")
        }
    }
}

pub fn apply_logical(op: LogicalOp, left: Value, right: Value) -> Value {
    match op {
        LogicalOp::And => {
            if left.is_truthy() {
                right
            } else {
                left
            }
        }
        LogicalOp::Or => {
            if left.is_truthy() {
                left
            } else {
                right
            }
        }
    }
}

// =============================================================================
// Numeric coercions
// =============================================================================

/// JavaScript `ToInt32`: modulo 2^32, wrapped into the signed range.
pub fn to_int32(n: f64) -> i32 {
    let u = to_uint32(n);
    if u >= 0x8000_0000 {
        (u as i64 - 0x1_0000_0000) as i32
    } else {
        u as i32
    }
}

/// JavaScript `ToUint32`: modulo 2^32.
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let m = n.trunc() % 4_294_967_296.0;
    let m = if m < 0.0 { m + 4_294_967_296.0 } else { m };
    m as u32
}

fn int32_op(left: &Value, right: &Value, f: impl Fn(i32, i32) -> i32) -> Value {
    Value::Number(f64::from(f(
        to_int32(left.to_number()),
        to_int32(right.to_number()),
    )))
}

/// Abstract (`==`) equality over primitive values.
fn loose_eq(left: &Value, right: &Value) -> bool {
    use Value::*;
    match (left, right) {
        (Undefined | Null, Undefined | Null) => true,
        (Number(_), Number(_)) | (Str(_), Str(_)) | (Bool(_), Bool(_)) => strict_eq(left, right),
        (Number(a), Str(s)) => *a == string_to_number(s),
        (Str(s), Number(b)) => string_to_number(s) == *b,
        (Bool(b), other) => loose_eq(&Number(if *b { 1.0 } else { 0.0 }), other),
        (other, Bool(b)) => loose_eq(other, &Number(if *b { 1.0 } else { 0.0 })),
        _ => false,
    }
}

/// Strict (`===`) equality. `NaN !== NaN` and `+0 === -0` fall out of the
/// underlying f64 comparison.
fn strict_eq(left: &Value, right: &Value) -> bool {
    use Value::*;
    match (left, right) {
        (Undefined, Undefined) | (Null, Null) => true,
        (Bool(a), Bool(b)) => a == b,
        (Number(a), Number(b)) => a == b,
        (Str(a), Str(b)) => a == b,
        _ => false,
    }
}

/// Relational comparison: lexicographic when both operands are strings,
/// numeric otherwise. Any NaN makes every relational operator false.
fn compare(left: &Value, right: &Value, accept: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        return accept(a.cmp(b));
    }
    let a = left.to_number();
    let b = right.to_number();
    match a.partial_cmp(&b) {
        Some(ordering) => accept(ordering),
        None => false,
    }
}
