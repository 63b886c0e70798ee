use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::TypeError;
use crate::value::{Operator, Value, ValueKind};

/// Longest padding a format marker can request. Nothing longer fits in a file
/// name on the file systems we rename on.
pub const MAX_FORMAT_WIDTH: usize = 255;

type ApplyFn = fn(Value, Value) -> Value;

type DispatchKey = (Operator, ValueKind, ValueKind);

static DISPATCH_TABLE: Lazy<HashMap<DispatchKey, ApplyFn>> = Lazy::new(|| {
    use Operator::*;
    use ValueKind::{Format, Int, Str};

    let entries: [(DispatchKey, ApplyFn); 9] = [
        ((Add, Int, Int), |l, r| Value::Int(int(&l).wrapping_add(int(&r)))),
        ((Add, Int, Str), concat),
        ((Add, Str, Int), concat),
        ((Add, Str, Str), concat),
        ((Sub, Int, Int), |l, r| Value::Int(int(&l).wrapping_sub(int(&r)))),
        ((Mul, Int, Int), |l, r| Value::Int(int(&l).wrapping_mul(int(&r)))),
        ((Mul, Int, Format), |l, r| zero_pad(int(&l), width(&r))),
        ((Mul, Format, Int), |l, r| zero_pad(int(&r), width(&l))),
        ((Div, Int, Int), |l, r| Value::Int(divide(int(&l), int(&r)))),
    ];
    entries.into_iter().collect()
});

/// Builds the dispatch table ahead of the first evaluation.
pub fn warmup_operator_tables() {
    Lazy::force(&DISPATCH_TABLE);
}

impl Operator {
    /// Combines two operands, or fails if this operator has no entry for
    /// their kinds.
    pub fn apply(self, left: Value, right: Value) -> Result<Value, TypeError> {
        let key = (self, left.kind(), right.kind());
        match DISPATCH_TABLE.get(&key) {
            Some(apply) => Ok(apply(left, right)),
            None => Err(TypeError {
                operator: self,
                left: key.1,
                right: key.2,
            }),
        }
    }
}

// The accessors below are only reached through a table key that already
// fixed the operand kinds.

fn int(value: &Value) -> i64 {
    match value {
        Value::Int(value) => *value,
        other => unreachable!("dispatch keyed an integer, got {other:?}"),
    }
}

fn width(value: &Value) -> i64 {
    match value {
        Value::Format(width) => *width,
        other => unreachable!("dispatch keyed a format marker, got {other:?}"),
    }
}

fn text(value: Value) -> String {
    match value {
        Value::Int(value) => value.to_string(),
        Value::Str(value) => value,
        other => unreachable!("dispatch keyed text, got {other:?}"),
    }
}

fn concat(left: Value, right: Value) -> Value {
    let mut out = text(left);
    out.push_str(&text(right));
    Value::Str(out)
}

fn divide(left: i64, right: i64) -> i64 {
    if right == 0 {
        i64::MAX
    } else {
        left.wrapping_div(right)
    }
}

fn zero_pad(value: i64, min_digits: i64) -> Value {
    let width = usize::try_from(min_digits)
        .unwrap_or(0)
        .min(MAX_FORMAT_WIDTH);
    let sign = if value < 0 { "-" } else { "" };
    Value::Str(format!("{sign}{:0>width$}", value.unsigned_abs()))
}
