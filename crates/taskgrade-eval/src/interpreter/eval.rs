//! Expression evaluation for the interpreter.
//!
//! Contains the exhaustive `eval_expr` function that maps each [`Expr`] to its
//! runtime value using checked arithmetic and trap semantics. Commands and
//! control flow are handled by the [`super::Interpreter`] in `state.rs`.
//!
//! Expressions have no side effects and their nesting is bounded at parse
//! time, so evaluating one is not charged against the step limit.

use indexmap::IndexMap;

use taskgrade_core::ops::{ArithOp, BinaryOp, CmpOp, LogicOp, UnaryOp};
use taskgrade_core::{Expr, Value};

use super::error::RuntimeError;
use super::state::{ExecutionState, Limits};

/// Evaluates an expression against the current state.
///
/// # Errors
///
/// Returns `RuntimeError` for:
/// - Reads of unbound variables
/// - Operand type mismatches
/// - Integer overflow, non-finite floats, and division by zero
/// - Out of range list indices and missing map keys
/// - Constructed values heavier than `limits.max_value_size` or nested deeper
///   than `limits.max_value_depth`
pub fn eval_expr(expr: &Expr, state: &ExecutionState, limits: &Limits) -> Result<Value, RuntimeError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),

        Expr::Var(name) => state
            .variable(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() }),

        // Containers are bounded element by element, so an oversized one
        // fails before the rest of it is built.
        Expr::List(items) => {
            let mut values = Vec::with_capacity(items.len());
            let mut budget = Budget::new(limits);
            for item in items {
                let value = eval_expr(item, state, limits)?;
                budget.admit(0, &value)?;
                values.push(value);
            }
            Ok(Value::List(values))
        }

        Expr::Object(fields) => {
            let mut entries = IndexMap::with_capacity(fields.len());
            let mut budget = Budget::new(limits);
            for (key, field) in fields {
                let value = eval_expr(field, state, limits)?;
                budget.admit(key.len(), &value)?;
                entries.insert(key.clone(), value);
            }
            Ok(Value::Map(entries))
        }

        Expr::Unary { op, operand } => {
            let value = eval_expr(operand, state, limits)?;
            eval_unary(*op, value)
        }

        // Logic operators short-circuit, so the right side is evaluated lazily.
        Expr::Binary {
            op: BinaryOp::Logic(logic_op),
            lhs,
            rhs,
        } => {
            let lhs = expect_bool(eval_expr(lhs, state, limits)?)?;
            match (logic_op, lhs) {
                (LogicOp::And, false) => Ok(Value::Bool(false)),
                (LogicOp::Or, true) => Ok(Value::Bool(true)),
                _ => Ok(Value::Bool(expect_bool(eval_expr(rhs, state, limits)?)?)),
            }
        }

        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, state, limits)?;
            let rhs = eval_expr(rhs, state, limits)?;
            eval_binary(*op, lhs, rhs, limits)
        }

        Expr::Set { target, key, value } => {
            let target = eval_expr(target, state, limits)?;
            let key = eval_expr(key, state, limits)?;
            let value = eval_expr(value, state, limits)?;
            match (target, key) {
                (Value::Map(mut entries), Value::Str(key)) => {
                    entries.insert(key, value);
                    check_size(Value::Map(entries), limits)
                }
                (Value::List(mut items), Value::Int(index)) => {
                    let slot = list_index(index, items.len())?;
                    items[slot] = value;
                    check_size(Value::List(items), limits)
                }
                (target, key) => Err(RuntimeError::type_mismatch(
                    "map with string key or list with int index",
                    format!("{} with {} key", target.type_name(), key.type_name()),
                )),
            }
        }
    }
}

/// Evaluates a condition, which must produce a bool.
pub fn eval_condition(expr: &Expr, state: &ExecutionState, limits: &Limits) -> Result<bool, RuntimeError> {
    expect_bool(eval_expr(expr, state, limits)?)
}

fn eval_unary(op: UnaryOp, value: Value) -> Result<Value, RuntimeError> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| overflow(UnaryOp::Neg.keyword())),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Len, Value::List(items)) => length(items.len()),
        (UnaryOp::Len, Value::Str(s)) => length(s.chars().count()),
        (UnaryOp::Len, Value::Map(entries)) => length(entries.len()),
        (UnaryOp::Neg, other) => Err(RuntimeError::type_mismatch("int or float", other.type_name())),
        (UnaryOp::Not, other) => Err(RuntimeError::type_mismatch("bool", other.type_name())),
        (UnaryOp::Len, other) => Err(RuntimeError::type_mismatch("list, string, or map", other.type_name())),
    }
}

fn eval_binary(op: BinaryOp, lhs: Value, rhs: Value, limits: &Limits) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Arith(arith_op) => eval_arith(arith_op, &lhs, &rhs),
        BinaryOp::Compare(cmp_op) => eval_compare(cmp_op, &lhs, &rhs).map(Value::Bool),
        // Handled with short-circuiting in eval_expr.
        BinaryOp::Logic(LogicOp::And) => Ok(Value::Bool(expect_bool(lhs)? && expect_bool(rhs)?)),
        BinaryOp::Logic(LogicOp::Or) => Ok(Value::Bool(expect_bool(lhs)? || expect_bool(rhs)?)),
        BinaryOp::Get => match (lhs, rhs) {
            (Value::List(mut items), Value::Int(index)) => {
                let slot = list_index(index, items.len())?;
                Ok(items.swap_remove(slot))
            }
            (Value::Map(mut entries), Value::Str(key)) => entries
                .swap_remove(&key)
                .ok_or(RuntimeError::MissingKey { key }),
            (container, key) => Err(RuntimeError::type_mismatch(
                "list with int index or map with string key",
                format!("{} with {} key", container.type_name(), key.type_name()),
            )),
        },
        BinaryOp::Concat => match (lhs, rhs) {
            (Value::Str(mut a), Value::Str(b)) => {
                check_weight(1 + a.len() + b.len(), limits)?;
                a.push_str(&b);
                Ok(Value::Str(a))
            }
            (Value::List(mut a), Value::List(b)) => {
                check_weight(1 + a.iter().chain(&b).map(Value::weight).sum::<usize>(), limits)?;
                a.extend(b);
                Ok(Value::List(a))
            }
            (a, b) => Err(RuntimeError::type_mismatch(
                "two strings or two lists",
                format!("{} and {}", a.type_name(), b.type_name()),
            )),
        },
        BinaryOp::Push => match lhs {
            Value::List(mut items) => {
                items.push(rhs);
                check_size(Value::List(items), limits)
            }
            other => Err(RuntimeError::type_mismatch("list", other.type_name())),
        },
    }
}

// ---------------------------------------------------------------------------
// Arithmetic evaluation
// ---------------------------------------------------------------------------

fn eval_arith(op: ArithOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            if matches!(op, ArithOp::Div | ArithOp::Rem) && b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            let result = match op {
                ArithOp::Add => a.checked_add(b),
                ArithOp::Sub => a.checked_sub(b),
                ArithOp::Mul => a.checked_mul(b),
                // i64::MIN / -1 is the only overflowing case.
                ArithOp::Div => a.checked_div(b),
                ArithOp::Rem => a.checked_rem(b),
            };
            result.map(Value::Int).ok_or_else(|| overflow(arith_keyword(op)))
        }
        (Value::Float(a), Value::Float(b)) => {
            let (a, b) = (*a, *b);
            if matches!(op, ArithOp::Div | ArithOp::Rem) && b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            let result = match op {
                ArithOp::Add => a + b,
                ArithOp::Sub => a - b,
                ArithOp::Mul => a * b,
                ArithOp::Div => a / b,
                ArithOp::Rem => a % b,
            };
            if result.is_finite() {
                Ok(Value::Float(result))
            } else {
                Err(overflow(arith_keyword(op)))
            }
        }
        _ => Err(RuntimeError::type_mismatch(
            "two ints or two floats",
            format!("{} and {}", lhs.type_name(), rhs.type_name()),
        )),
    }
}

fn eval_compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<bool, RuntimeError> {
    use std::cmp::Ordering;

    let ordering = match op {
        CmpOp::Eq => return Ok(lhs.loosely_equals(rhs)),
        CmpOp::Ne => return Ok(!lhs.loosely_equals(rhs)),
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            // Floats are always finite, so partial_cmp cannot fail.
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => {
                return Err(RuntimeError::type_mismatch(
                    "two ints, two floats, or two strings",
                    format!("{} and {}", lhs.type_name(), rhs.type_name()),
                ))
            }
        },
    };

    Ok(match op {
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::Ne => ordering != Ordering::Equal,
    })
}

fn arith_keyword(op: ArithOp) -> &'static str {
    BinaryOp::Arith(op).keyword()
}

fn overflow(operation: &str) -> RuntimeError {
    RuntimeError::NumericOverflow {
        operation: operation.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn expect_bool(value: Value) -> Result<bool, RuntimeError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(RuntimeError::type_mismatch("bool", other.type_name())),
    }
}

fn length(len: usize) -> Result<Value, RuntimeError> {
    i64::try_from(len)
        .map(Value::Int)
        .map_err(|_| overflow(UnaryOp::Len.keyword()))
}

fn list_index(index: i64, len: usize) -> Result<usize, RuntimeError> {
    usize::try_from(index)
        .ok()
        .filter(|slot| *slot < len)
        .ok_or(RuntimeError::IndexOutOfBounds { index, len })
}

/// Checks a value built from already bounded parts against both limits.
fn check_size(value: Value, limits: &Limits) -> Result<Value, RuntimeError> {
    check_weight(value.weight(), limits)?;
    check_depth(value.depth(), limits)?;
    Ok(value)
}

fn check_weight(weight: usize, limits: &Limits) -> Result<(), RuntimeError> {
    if weight > limits.max_value_size {
        return Err(RuntimeError::ValueTooLarge {
            limit: limits.max_value_size,
        });
    }
    Ok(())
}

fn check_depth(depth: usize, limits: &Limits) -> Result<(), RuntimeError> {
    if depth > limits.max_value_depth {
        return Err(RuntimeError::ValueTooDeep {
            limit: limits.max_value_depth,
        });
    }
    Ok(())
}

/// Running weight of a container under construction. Each element's depth
/// is checked as it is admitted.
struct Budget<'l> {
    limits: &'l Limits,
    weight: usize,
}

impl<'l> Budget<'l> {
    fn new(limits: &'l Limits) -> Self {
        Budget { limits, weight: 1 }
    }

    fn admit(&mut self, key_len: usize, element: &Value) -> Result<(), RuntimeError> {
        self.weight = self.weight.saturating_add(key_len).saturating_add(element.weight());
        check_weight(self.weight, self.limits)?;
        check_depth(element.depth() + 1, self.limits)
    }
}
