//! Variable lookup and filter pipelines.
//!
//! Paths are dotted (`.user.name`, `.items.0.title`): a leading dot, empty
//! segments ignored, object keys and array indices walked in turn. See
//! [`RenderContext`] for the order scopes are searched in.
//!
//! An expression is a value followed by any number of `| filter args`
//! stages, each receiving the previous stage's output.

use serde_json::{Map, Value};
use wispy_scan::{split_outside_quotes, split_respect_quotes, unquote};

use crate::context::RenderContext;
use crate::engine::Engine;
use crate::error::TemplateError;
use crate::value;

fn segments(path: &str) -> Vec<&str> {
    path.trim()
        .trim_start_matches('.')
        .split('.')
        .filter(|s| !s.is_empty())
        .collect()
}

fn walk<'v>(mut current: &'v Value, segments: &[&str]) -> Option<&'v Value> {
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

fn walk_map<'v>(map: &'v Map<String, Value>, segments: &[&str]) -> Option<&'v Value> {
    let (first, rest) = segments.split_first()?;
    walk(map.get(*first)?, rest)
}

/// Finds the value at a dotted path: Props, then loop bindings, then Data.
///
/// A path that only partly matches in Props still falls through to the
/// later scopes.
pub fn lookup<'c>(ctx: &'c RenderContext<'_>, path: &str) -> Option<&'c Value> {
    let segments = segments(path);
    let (first, rest) = segments.split_first()?;

    walk_map(&ctx.props, &segments)
        .or_else(|| ctx.binding(first).and_then(|v| walk(v, rest)))
        .or_else(|| walk_map(&ctx.data, &segments))
}

/// Like [`lookup`], but owned and with a [`TemplateError::NotFound`] on a miss.
pub fn resolve(ctx: &RenderContext<'_>, path: &str) -> Result<Value, TemplateError> {
    lookup(ctx, path)
        .cloned()
        .ok_or_else(|| TemplateError::NotFound(path.trim().to_string()))
}

/// Interprets one argument token: a `.path`, a quoted string, a boolean,
/// `null`, a number, or a bare word taken as a path.
pub fn resolve_value(ctx: &RenderContext<'_>, token: &str) -> Result<Value, TemplateError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TemplateError::NotFound(String::new()));
    }
    if token.starts_with('.') {
        return resolve(ctx, token);
    }
    if token.starts_with('"') || token.starts_with('\'') {
        return Ok(Value::String(unquote(token).to_string()));
    }
    match token {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "null" => return Ok(Value::Null),
        _ => {}
    }
    if let Ok(int) = token.parse::<i64>() {
        return Ok(Value::from(int));
    }
    if let Ok(float) = token.parse::<f64>() {
        if float.is_finite() {
            return Ok(value::number(float));
        }
    }
    resolve(ctx, token)
}

/// Evaluates `value | filter args | ...`.
///
/// A missing head value runs through the pipeline as null so that a
/// `default` stage can replace it. Without one the miss is reported.
pub fn evaluate(ctx: &RenderContext<'_>, expression: &str) -> Result<Value, TemplateError> {
    let mut stages = split_outside_quotes(expression, '|').into_iter();
    let head = stages.next().unwrap_or_default();

    let (mut current, missing) = match resolve_value(ctx, head) {
        Ok(v) => (v, None),
        Err(err @ TemplateError::NotFound(_)) => (Value::Null, Some(err)),
        Err(err) => return Err(err),
    };

    let mut defaulted = false;
    for stage in stages {
        defaulted |= stage.split_whitespace().next() == Some("default");
        current = apply_filter(ctx.engine(), stage, current)?;
    }

    match missing {
        Some(err) if !defaulted => Err(err),
        _ => Ok(current),
    }
}

fn apply_filter(engine: &Engine, stage: &str, input: Value) -> Result<Value, TemplateError> {
    let tokens = split_respect_quotes(stage);
    let Some((name, args)) = tokens.split_first() else {
        return Err(TemplateError::usage("|", "empty filter stage"));
    };

    let filter = engine
        .filter(name)
        .ok_or_else(|| TemplateError::UnknownFilter(name.to_string()))?;
    let args: Vec<&str> = args.iter().map(|a| unquote(a)).collect();

    filter
        .apply(input, &args)
        .map_err(|err| TemplateError::FilterFailed {
            name: name.to_string(),
            message: err.to_string(),
        })
}
