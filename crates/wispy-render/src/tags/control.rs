//! Conditionals, loops, assignment and comments.

use serde_json::{Map, Value};
use tracing::trace;
use wispy_scan::{find_top_level, split_respect_quotes};

use super::{Tag, TagCall, TagOutput};
use crate::condition;
use crate::context::RenderContext;
use crate::error::TemplateError;
use crate::resolver;

/// `{% if COND %}then{% else %}otherwise{% end-if %}`
pub struct If;

impl Tag for If {
    fn render(&self, ctx: &mut RenderContext<'_>, out: &mut String, call: &TagCall<'_>) -> TagOutput {
        let delims = ctx.engine().delimiters();
        let block = match call.block(delims) {
            Ok(block) => block,
            Err(err) => return TagOutput::error(call.end, err),
        };

        let (then, otherwise) = match find_top_level(
            block.body,
            &delims.open_marker(call.name),
            &delims.close_marker(call.name),
            &delims.bare_marker("else"),
        ) {
            Some(span) => (&block.body[..span.start], Some(&block.body[span.end..])),
            None => (block.body, None),
        };

        let errors = match condition::evaluate(ctx, call.args) {
            Ok(true) => ctx.render(out, then),
            Ok(false) => match otherwise {
                Some(body) => ctx.render(out, body),
                None => Vec::new(),
            },
            Err(err) => vec![err],
        };
        TagOutput::with_errors(block.next, errors)
    }
}

/// `else` only has meaning inside an `if` body, which splits on it before
/// rendering. One met by the scanner is stray.
pub struct Else;

impl Tag for Else {
    fn render(&self, _ctx: &mut RenderContext<'_>, _out: &mut String, call: &TagCall<'_>) -> TagOutput {
        TagOutput::error(call.end, call.usage("`else` outside of an `if` block"))
    }
}

/// `{% each VAR in PATH %}body{% end-each %}`
///
/// Arrays iterate their elements and objects their values in key order.
/// Every iteration gets a fresh scope holding VAR; anything assigned in the
/// body is dropped with it.
pub struct Each;

impl Tag for Each {
    fn render(&self, ctx: &mut RenderContext<'_>, out: &mut String, call: &TagCall<'_>) -> TagOutput {
        let block = match call.block(ctx.engine().delimiters()) {
            Ok(block) => block,
            Err(err) => return TagOutput::error(call.end, err),
        };

        let tokens = split_respect_quotes(call.args);
        let [var, "in", path] = tokens.as_slice() else {
            return TagOutput::error(block.next, call.usage("expected `VAR in PATH`"));
        };
        let var = var.trim_start_matches('.');
        if var.is_empty() {
            return TagOutput::error(block.next, call.usage("loop variable is empty"));
        }

        let items = match resolver::resolve_value(ctx, path) {
            Ok(Value::Array(items)) => items,
            Ok(Value::Object(map)) => {
                let mut entries: Vec<(String, Value)> = map.into_iter().collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                entries.into_iter().map(|(_, v)| v).collect()
            }
            Ok(Value::Null) => Vec::new(),
            Ok(_) => {
                return TagOutput::error(
                    block.next,
                    TemplateError::NotIterable {
                        path: path.to_string(),
                    },
                )
            }
            Err(err) => return TagOutput::error(block.next, err),
        };

        trace!(var, count = items.len(), "each");
        let mut errors = Vec::new();
        for item in items {
            ctx.push_scope(Map::from_iter([(var.to_string(), item)]));
            errors.extend(ctx.render(out, block.body));
            ctx.pop_scope();
        }
        TagOutput::with_errors(block.next, errors)
    }
}

/// `{% assign VAR = EXPR %}` stores into the current scope; `.a.b` paths nest.
pub struct Assign;

impl Tag for Assign {
    fn render(&self, ctx: &mut RenderContext<'_>, _out: &mut String, call: &TagCall<'_>) -> TagOutput {
        let Some((var, expr)) = call.args.split_once('=') else {
            return TagOutput::error(call.end, call.usage("expected `VAR = EXPR`"));
        };
        let (var, expr) = (var.trim(), expr.trim());
        if expr.is_empty() {
            return TagOutput::error(call.end, call.usage("missing value"));
        }

        match resolver::evaluate(ctx, expr) {
            Ok(value) => {
                if ctx.assign(var, value) {
                    TagOutput::at(call.end)
                } else {
                    TagOutput::error(call.end, call.usage("missing variable name"))
                }
            }
            Err(err) => TagOutput::error(call.end, err),
        }
    }
}

/// `{% comment %}...{% end-comment %}` renders nothing.
pub struct Comment;

impl Tag for Comment {
    fn render(&self, ctx: &mut RenderContext<'_>, _out: &mut String, call: &TagCall<'_>) -> TagOutput {
        match call.block(ctx.engine().delimiters()) {
            Ok(block) => TagOutput::at(block.next),
            Err(err) => TagOutput::error(call.end, err),
        }
    }
}
