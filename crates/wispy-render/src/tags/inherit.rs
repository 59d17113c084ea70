//! Layout wrapping and parent/child inheritance.
//!
//! Both mechanisms render the child first and hand the result to the outer
//! template through the context's `passed` slot, where a `{% passed %}` tag
//! picks it up. `extends` additionally lets the child override named
//! `block`s of the parent with `slot` sections.

use tracing::debug;
use wispy_scan::{find_closing, split_respect_quotes, unquote, Delimiters};

use super::{Tag, TagCall, TagOutput};
use crate::context::RenderContext;
use crate::error::TemplateError;
use crate::loader::{self, TemplateKind};

fn tag_name<'a>(call: &TagCall<'a>) -> Option<&'a str> {
    split_respect_quotes(call.args)
        .first()
        .copied()
        .map(unquote)
        .filter(|name| !name.is_empty())
}

/// Renders `layout_name` from the layouts directory with `inner` as passed content.
///
/// When the layout cannot be found, or is already wrapping this content
/// further out, the inner content is written unwrapped.
fn wrap(
    ctx: &mut RenderContext<'_>,
    out: &mut String,
    layout_name: &str,
    inner: String,
) -> Vec<TemplateError> {
    let config = ctx.engine().config();
    match loader::load(config, &ctx.scoped_dir, TemplateKind::Layout, layout_name) {
        Ok((path, layout)) => {
            let saved = ctx.passed.replace(inner);
            let result = ctx.in_template(path, |ctx| ctx.render(out, &layout));
            let unused = std::mem::replace(&mut ctx.passed, saved);
            match result {
                Ok(errors) => errors,
                Err(err) => {
                    out.push_str(&unused.unwrap_or_default());
                    vec![err]
                }
            }
        }
        Err(err) => {
            out.push_str(&inner);
            vec![err]
        }
    }
}

/// First registration of a name wins, so the most derived template keeps its override.
fn store_override(ctx: &mut RenderContext<'_>, name: &str, content: &str) {
    if ctx.blocks.contains_key(name) {
        debug!(block = name, "override already set");
        return;
    }
    ctx.blocks.insert(name.to_string(), content.to_string());
}

/// `{% layout NAME %}content[{% end-layout %}]`
///
/// Without a closing tag the layout wraps the rest of the template.
pub struct Layout;

impl Tag for Layout {
    fn render(&self, ctx: &mut RenderContext<'_>, out: &mut String, call: &TagCall<'_>) -> TagOutput {
        let block = call.block_or_rest(ctx.engine().delimiters());
        let Some(name) = tag_name(call) else {
            let mut errors = vec![call.usage("missing layout name")];
            errors.extend(ctx.render(out, block.body));
            return TagOutput::with_errors(block.next, errors);
        };

        if ctx.bypass_layouts() {
            debug!(layout = name, "layout bypassed by request header");
            return TagOutput::with_errors(block.next, ctx.render(out, block.body));
        }

        let (inner, mut errors) = ctx.render_to_string(block.body);
        errors.extend(wrap(ctx, out, name, inner));
        TagOutput::with_errors(block.next, errors)
    }
}

/// `{% passed %}` emits the relayed child content once.
pub struct Passed;

impl Tag for Passed {
    fn render(&self, ctx: &mut RenderContext<'_>, out: &mut String, call: &TagCall<'_>) -> TagOutput {
        if let Some(content) = ctx.passed.take() {
            out.push_str(&content);
        }
        TagOutput::at(call.end)
    }
}

/// `{% extends NAME %}child body[{% end-extends %}]`
///
/// `slot` sections in the child body become block overrides; the remaining
/// text is trimmed, rendered and passed to the parent.
pub struct Extends;

impl Tag for Extends {
    fn render(&self, ctx: &mut RenderContext<'_>, out: &mut String, call: &TagCall<'_>) -> TagOutput {
        let delims = ctx.engine().delimiters();
        let block = call.block_or_rest(delims);
        let Some(name) = tag_name(call) else {
            return TagOutput::error(block.next, call.usage("missing parent name"));
        };

        let (rest, mut errors) = collect_slots(ctx, delims, block.body);
        let (inner, render_errors) = ctx.render_to_string(rest.trim());
        errors.extend(render_errors);
        errors.extend(wrap(ctx, out, name, inner));
        TagOutput::with_errors(block.next, errors)
    }
}

/// Pulls `slot` sections out of `body` into the context's overrides and
/// returns the text outside them.
fn collect_slots(
    ctx: &mut RenderContext<'_>,
    delims: &Delimiters,
    body: &str,
) -> (String, Vec<TemplateError>) {
    let open = delims.open_marker("slot");
    let close = delims.close_marker("slot");
    let mut rest = String::with_capacity(body.len());
    let mut errors = Vec::new();
    let mut cursor = 0;

    while let Some(rel) = body[cursor..].find(&open) {
        let tag_start = cursor + rel;
        let name_start = tag_start + open.len();
        // Leave a broken tag for the renderer to report.
        let Some(name_len) = body[name_start..].find(delims.end()) else {
            break;
        };
        rest.push_str(&body[cursor..tag_start]);

        let name = unquote(body[name_start..name_start + name_len].trim());
        let tag_end = name_start + name_len + delims.end().len();
        match find_closing(body, &open, &close, tag_end) {
            Some(span) => {
                store_override(ctx, name, &body[tag_end..span.start]);
                cursor = span.end;
            }
            None => {
                errors.push(TemplateError::UnclosedBlock {
                    tag: "slot".to_string(),
                    expected: close.clone(),
                });
                cursor = tag_end;
            }
        }
    }

    rest.push_str(&body[cursor..]);
    (rest, errors)
}

/// `{% slot NAME %}...{% end-slot %}` outside `extends` registers an override directly.
pub struct Slot;

/// `{% define NAME %}...{% end-define %}` stores a region for a later `block`.
pub struct Define;

fn store_block_body(ctx: &mut RenderContext<'_>, call: &TagCall<'_>) -> TagOutput {
    let block = match call.block(ctx.engine().delimiters()) {
        Ok(block) => block,
        Err(err) => return TagOutput::error(call.end, err),
    };
    match tag_name(call) {
        Some(name) => {
            store_override(ctx, name, block.body);
            TagOutput::at(block.next)
        }
        None => TagOutput::error(block.next, call.usage("missing name")),
    }
}

impl Tag for Slot {
    fn render(&self, ctx: &mut RenderContext<'_>, _out: &mut String, call: &TagCall<'_>) -> TagOutput {
        store_block_body(ctx, call)
    }
}

impl Tag for Define {
    fn render(&self, ctx: &mut RenderContext<'_>, _out: &mut String, call: &TagCall<'_>) -> TagOutput {
        store_block_body(ctx, call)
    }
}

/// `{% block NAME %}default{% end-block %}` renders the override for NAME
/// if one was registered, else its own default content.
pub struct BlockTag;

impl Tag for BlockTag {
    fn render(&self, ctx: &mut RenderContext<'_>, out: &mut String, call: &TagCall<'_>) -> TagOutput {
        let block = match call.block(ctx.engine().delimiters()) {
            Ok(block) => block,
            Err(err) => return TagOutput::error(call.end, err),
        };
        let Some(name) = tag_name(call) else {
            return TagOutput::error(block.next, call.usage("missing block name"));
        };

        let errors = match ctx.blocks.get(name).cloned() {
            Some(content) => ctx.render(out, &content),
            None => ctx.render(out, block.body),
        };
        TagOutput::with_errors(block.next, errors)
    }
}
