//! The polymorphic operator table.
//!
//! Every operator is a total function over values: it either produces a
//! value of the documented kind or fails. Errors leave the table without a
//! source position; the engines attach the operator token's position.

use super::value::Value;
use crate::error::LumenError;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

/// `+`: integer addition, string concatenation, or number-to-string
/// concatenation in either order.
pub fn add(left: &Value, right: &Value) -> Result<Value, LumenError> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l + r)),
        (Value::Int(l), Value::Str(r)) => Ok(Value::string(format!("{l}{r}"))),
        (Value::Str(l), Value::Int(r)) => Ok(Value::string(format!("{l}{r}"))),
        (Value::Str(l), Value::Str(r)) => Ok(Value::string(format!("{l}{r}"))),
        _ => Err(unsupported("+", left, right)),
    }
}

pub fn sub(left: &Value, right: &Value) -> Result<Value, LumenError> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l - r)),
        _ => Err(unsupported("-", left, right)),
    }
}

/// `*`: integer multiplication, or string repetition with a non-negative
/// count on either side.
pub fn mul(left: &Value, right: &Value) -> Result<Value, LumenError> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l * r)),
        (Value::Str(s), Value::Int(count)) | (Value::Int(count), Value::Str(s)) => {
            repeat(s, count)
        }
        _ => Err(unsupported("*", left, right)),
    }
}

pub fn div(left: &Value, right: &Value) -> Result<Value, LumenError> {
    match (left, right) {
        (Value::Int(_), Value::Int(r)) if r.is_zero() => {
            Err(LumenError::runtime("divide by zero"))
        }
        (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l / r)),
        _ => Err(unsupported("/", left, right)),
    }
}

pub fn modulo(left: &Value, right: &Value) -> Result<Value, LumenError> {
    match (left, right) {
        (Value::Int(_), Value::Int(r)) if r.is_zero() => {
            Err(LumenError::runtime("divide by zero"))
        }
        (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l % r)),
        _ => Err(unsupported("%", left, right)),
    }
}

pub fn less(left: &Value, right: &Value) -> Result<Value, LumenError> {
    compare("<", left, right, |l, r| l < r)
}

pub fn less_equal(left: &Value, right: &Value) -> Result<Value, LumenError> {
    compare("<=", left, right, |l, r| l <= r)
}

pub fn greater(left: &Value, right: &Value) -> Result<Value, LumenError> {
    compare(">", left, right, |l, r| l > r)
}

pub fn greater_equal(left: &Value, right: &Value) -> Result<Value, LumenError> {
    compare(">=", left, right, |l, r| l >= r)
}

/// `==`: defined when both operands share a kind among integer, bool and
/// string. Comparing across kinds is a type error, not `false`.
pub fn eq(left: &Value, right: &Value) -> Result<Value, LumenError> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Ok(Value::Bool(l == r)),
        (Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(l == r)),
        (Value::Str(l), Value::Str(r)) => Ok(Value::Bool(l == r)),
        _ => Err(LumenError::type_error(left.kind(), right.kind())),
    }
}

pub fn not_eq(left: &Value, right: &Value) -> Result<Value, LumenError> {
    match eq(left, right)? {
        Value::Bool(equal) => Ok(Value::Bool(!equal)),
        other => Err(LumenError::type_error("bool", other.kind())),
    }
}

/// Unary `-`.
pub fn negate(value: &Value) -> Result<Value, LumenError> {
    match value {
        Value::Int(n) => Ok(Value::Int(-n)),
        other => Err(LumenError::type_error("integer", other.kind())),
    }
}

/// Unary `+`: identity on integers.
pub fn identity(value: &Value) -> Result<Value, LumenError> {
    match value {
        Value::Int(n) => Ok(Value::Int(n.clone())),
        other => Err(LumenError::type_error("integer", other.kind())),
    }
}

/// Unary `!`.
pub fn not(value: &Value) -> Result<Value, LumenError> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        other => Err(LumenError::type_error("bool", other.kind())),
    }
}

fn compare(
    op: &str,
    left: &Value,
    right: &Value,
    f: fn(&BigInt, &BigInt) -> bool,
) -> Result<Value, LumenError> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Ok(Value::Bool(f(l, r))),
        _ => Err(unsupported(op, left, right)),
    }
}

fn repeat(text: &str, count: &BigInt) -> Result<Value, LumenError> {
    if count.is_negative() {
        return Err(LumenError::runtime(
            "can't repeat a string a negative number of times",
        ));
    }
    let Some(count) = count.to_usize() else {
        return Err(LumenError::runtime("string repeat count is too large"));
    };
    Ok(Value::string(text.repeat(count)))
}

fn unsupported(op: &str, left: &Value, right: &Value) -> LumenError {
    LumenError::runtime(format!(
        "unsupported operands for '{}': {} and {}",
        op,
        left.kind(),
        right.kind()
    ))
}
