//! Partial inclusion.

use serde_json::Map;
use wispy_scan::split_respect_quotes;

use super::{Tag, TagCall, TagOutput};
use crate::context::RenderContext;
use crate::loader::{self, TemplateKind};
use crate::resolver;

/// `{% partial NAME key=value... %}`
///
/// The partial renders with Props set to the given arguments, whose values
/// are expressions (`title="Hi"`, `user=.author`, `n=3`). Props and the
/// current template path are restored afterwards.
pub struct Partial;

impl Tag for Partial {
    fn render(&self, ctx: &mut RenderContext<'_>, out: &mut String, call: &TagCall<'_>) -> TagOutput {
        let tokens = split_respect_quotes(call.args);
        let Some((name, params)) = tokens.split_first() else {
            return TagOutput::error(call.end, call.usage("missing partial name"));
        };

        let mut errors = Vec::new();
        let mut props = Map::new();
        for param in params {
            match param.split_once('=') {
                Some((key, raw)) if !key.is_empty() => match resolver::resolve_value(ctx, raw) {
                    Ok(value) => {
                        props.insert(key.to_string(), value);
                    }
                    Err(err) => errors.push(err),
                },
                _ => errors.push(call.usage(format!("expected `key=value`, got `{}`", param))),
            }
        }

        let config = ctx.engine().config();
        let (path, content) =
            match loader::load(config, &ctx.scoped_dir, TemplateKind::Partial, name) {
                Ok(found) => found,
                Err(err) => {
                    errors.push(err);
                    return TagOutput::with_errors(call.end, errors);
                }
            };

        let saved = std::mem::replace(&mut ctx.props, props);
        match ctx.in_template(path, |ctx| ctx.render(out, &content)) {
            Ok(render_errors) => errors.extend(render_errors),
            Err(err) => errors.push(err),
        }
        ctx.props = saved;

        TagOutput::with_errors(call.end, errors)
    }
}
