// src/resource/expr/eval.rs

//! Interpreter for [`Expr`] trees against one binding of resource records.

use std::cmp::Ordering;
use std::collections::HashMap;

use thiserror::Error;

use super::ast::{Builtin, CmpOp, Expr, Value};
use crate::resource::record::ResourceRecord;

/// Alias to the record it is bound to for one evaluation.
pub type Binding<'a> = HashMap<&'a str, &'a ResourceRecord>;

/// Failure while evaluating one binding.
///
/// These never escape requirement evaluation: a binding that errors is
/// simply not a match.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("alias {0:?} is not bound")]
    UnboundAlias(String),

    #[error("record bound to {alias:?} has no field {field:?}")]
    MissingField { alias: String, field: String },

    #[error("unsupported operand types for {op}: {lhs} and {rhs}")]
    Type {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("cannot convert {value} with {func}()")]
    Conversion { func: &'static str, value: String },
}

pub fn eval(expr: &Expr, binding: &Binding<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Field { alias, field } => {
            let record = binding
                .get(alias.as_str())
                .ok_or_else(|| EvalError::UnboundAlias(alias.clone()))?;
            record
                .get(field)
                .map(|v| Value::Str(v.clone()))
                .ok_or_else(|| EvalError::MissingField {
                    alias: alias.clone(),
                    field: field.clone(),
                })
        }
        Expr::List(items) => items
            .iter()
            .map(|item| eval(item, binding))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Call { func, arg } => call(*func, eval(arg, binding)?),
        Expr::Not(inner) => Ok(Value::Bool(!eval(inner, binding)?.is_truthy())),
        Expr::And(lhs, rhs) => {
            if !eval(lhs, binding)?.is_truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(eval(rhs, binding)?.is_truthy()))
        }
        Expr::Or(lhs, rhs) => {
            if eval(lhs, binding)?.is_truthy() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(eval(rhs, binding)?.is_truthy()))
        }
        Expr::Compare { op, lhs, rhs } => {
            let lhs = eval(lhs, binding)?;
            let rhs = eval(rhs, binding)?;
            compare(*op, &lhs, &rhs).map(Value::Bool)
        }
    }
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn order(op: &'static str, lhs: &Value, rhs: &Value) -> Result<Ordering, EvalError> {
    let type_error = || EvalError::Type {
        op,
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    };

    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).ok_or_else(type_error),
            _ => Err(type_error()),
        },
    }
}

fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match (container, item) {
        (Value::List(items), _) => Ok(items.iter().any(|v| values_equal(v, item))),
        (Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(needle.as_str())),
        _ => Err(EvalError::Type {
            op: "in",
            lhs: item.type_name(),
            rhs: container.type_name(),
        }),
    }
}

fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    Ok(match op {
        CmpOp::Eq => values_equal(lhs, rhs),
        CmpOp::Ne => !values_equal(lhs, rhs),
        CmpOp::Lt => order("<", lhs, rhs)? == Ordering::Less,
        CmpOp::Le => order("<=", lhs, rhs)? != Ordering::Greater,
        CmpOp::Gt => order(">", lhs, rhs)? == Ordering::Greater,
        CmpOp::Ge => order(">=", lhs, rhs)? != Ordering::Less,
        CmpOp::In => contains(rhs, lhs)?,
        CmpOp::NotIn => !contains(rhs, lhs)?,
    })
}

fn call(func: Builtin, arg: Value) -> Result<Value, EvalError> {
    match func {
        Builtin::Len => match &arg {
            Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
            Value::List(items) => Ok(Value::Int(items.len() as i64)),
            _ => Err(EvalError::Conversion {
                func: "len",
                value: arg.to_string(),
            }),
        },
        Builtin::Int => match &arg {
            Value::Int(n) => Ok(Value::Int(*n)),
            Value::Float(n) if n.is_finite() => Ok(Value::Int(n.trunc() as i64)),
            Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
            Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                EvalError::Conversion {
                    func: "int",
                    value: arg.to_string(),
                }
            }),
            _ => Err(EvalError::Conversion {
                func: "int",
                value: arg.to_string(),
            }),
        },
        Builtin::Float => match &arg {
            Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                EvalError::Conversion {
                    func: "float",
                    value: arg.to_string(),
                }
            }),
            other => other.as_number().map(Value::Float).ok_or_else(|| {
                EvalError::Conversion {
                    func: "float",
                    value: arg.to_string(),
                }
            }),
        },
        Builtin::Bool => Ok(Value::Bool(arg.is_truthy())),
    }
}
