//! Conditions for `if`.
//!
//! A condition is either a single value tested for truthiness or a
//! `left OP right` comparison. `==` and `!=` compare any values deeply;
//! `<`, `<=`, `>` and `>=` need both sides to be numeric.

use serde_json::Value;
use wispy_scan::split_respect_quotes;

use crate::context::RenderContext;
use crate::error::TemplateError;
use crate::resolver::resolve_value;
use crate::value::{as_number, is_truthy, loose_eq, stringify};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "==" => Op::Eq,
            "!=" => Op::Ne,
            "<" => Op::Lt,
            "<=" => Op::Le,
            ">" => Op::Gt,
            ">=" => Op::Ge,
            _ => return None,
        })
    }
}

// A missing operand is null, so `if .user` on an absent user is simply false.
fn operand(ctx: &RenderContext<'_>, token: &str) -> Result<Value, TemplateError> {
    match resolve_value(ctx, token) {
        Err(TemplateError::NotFound(_)) => Ok(Value::Null),
        other => other,
    }
}

/// Evaluates a condition against the context.
pub fn evaluate(ctx: &RenderContext<'_>, condition: &str) -> Result<bool, TemplateError> {
    let tokens = split_respect_quotes(condition);
    match tokens.as_slice() {
        [single] => Ok(is_truthy(&operand(ctx, single)?)),
        [left, symbol, right] => {
            let op = Op::parse(symbol).ok_or_else(|| {
                TemplateError::usage("if", format!("unknown comparison operator `{}`", symbol))
            })?;
            compare(&operand(ctx, left)?, op, &operand(ctx, right)?, symbol)
        }
        [] => Err(TemplateError::usage("if", "missing condition")),
        _ => Err(TemplateError::usage(
            "if",
            format!("expected `VALUE` or `LEFT OP RIGHT`, got `{}`", condition.trim()),
        )),
    }
}

fn compare(left: &Value, op: Op, right: &Value, op_token: &str) -> Result<bool, TemplateError> {
    match op {
        Op::Eq => Ok(loose_eq(left, right)),
        Op::Ne => Ok(!loose_eq(left, right)),
        _ => {
            let (Some(a), Some(b)) = (as_number(left), as_number(right)) else {
                return Err(TemplateError::Incomparable {
                    left: stringify(left),
                    op: op_token.to_string(),
                    right: stringify(right),
                });
            };
            Ok(match op {
                Op::Lt => a < b,
                Op::Le => a <= b,
                Op::Gt => a > b,
                _ => a >= b,
            })
        }
    }
}
