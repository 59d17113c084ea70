//! Head elements and the tags that emit collected head content.

use wispy_scan::{split_respect_quotes, unquote};

use super::{Tag, TagCall, TagOutput};
use crate::assets::AssetKind;
use crate::context::RenderContext;
use crate::error::TemplateError;
use crate::head::HeadTag;
use crate::resolver;
use crate::value::stringify;

/// Attribute value: `.path` resolves against the context, anything else is literal.
fn attribute_value(ctx: &RenderContext<'_>, raw: &str) -> Result<String, TemplateError> {
    if raw.starts_with('.') {
        resolver::resolve_value(ctx, raw).map(|v| stringify(&v))
    } else {
        Ok(unquote(raw).to_string())
    }
}

/// `{% meta name="description" content=.summary %}` and
/// `{% link rel="icon" href="/favicon.ico" %}`.
pub struct Element {
    name: &'static str,
}

impl Element {
    pub fn meta() -> Self {
        Self { name: "meta" }
    }

    pub fn link() -> Self {
        Self { name: "link" }
    }
}

impl Tag for Element {
    fn render(&self, ctx: &mut RenderContext<'_>, _out: &mut String, call: &TagCall<'_>) -> TagOutput {
        let tokens = split_respect_quotes(call.args);
        if tokens.is_empty() {
            return TagOutput::error(call.end, call.usage("missing attributes"));
        }

        let mut tag = HeadTag::new(self.name);
        for token in tokens {
            let quote_at = token.find(['"', '\'']).unwrap_or(token.len());
            match token.split_once('=') {
                Some((key, raw)) if !key.is_empty() && key.len() < quote_at => {
                    match attribute_value(ctx, raw) {
                        Ok(value) => tag = tag.attr(key, &value),
                        Err(err) => return TagOutput::error(call.end, err),
                    }
                }
                _ => tag = tag.flag(unquote(token)),
            }
        }

        ctx.head.add(tag);
        TagOutput::at(call.end)
    }
}

/// `{% title "Home" %}`, `{% title .page.title %}` or `{% title Plain words %}`.
///
/// The first title registered wins, so a page's title beats its layout's.
pub struct Title;

impl Tag for Title {
    fn render(&self, ctx: &mut RenderContext<'_>, _out: &mut String, call: &TagCall<'_>) -> TagOutput {
        let args = call.args.trim();
        if args.is_empty() {
            return TagOutput::error(call.end, call.usage("missing title"));
        }

        let text = if args.starts_with(['.', '"', '\'']) {
            match resolver::evaluate(ctx, args) {
                Ok(value) => stringify(&value),
                Err(err) => return TagOutput::error(call.end, err),
            }
        } else {
            args.to_string()
        };

        ctx.head.add(HeadTag::new("title").body(text));
        TagOutput::at(call.end)
    }
}

/// Writes collected content: `root-head`, `root-css` and `root-js`.
///
/// These belong in the root layout, which renders after the page has
/// registered everything.
pub enum Emit {
    Head,
    Css,
    Js,
}

impl Tag for Emit {
    fn render(&self, ctx: &mut RenderContext<'_>, out: &mut String, call: &TagCall<'_>) -> TagOutput {
        let html = match self {
            Emit::Head => ctx.head.render(),
            Emit::Css => ctx.assets.render(AssetKind::Css),
            Emit::Js => ctx.assets.render(AssetKind::Js),
        };
        out.push_str(&html);
        TagOutput::at(call.end)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{Engine, ErrorKind, RenderContext};

    #[test]
    fn meta_link_and_title() {
        let engine = Engine::new();
        let mut ctx = RenderContext::new(&engine, ".");
        ctx.data.insert("summary".into(), json!("A \"quoted\" page"));
        let out = engine.render(
            &mut ctx,
            "{% title .summary | upcase %}{% meta name=\"description\" content=.summary %}{% link rel=preload href=\"/f.woff2\" crossorigin %}{% root-head %}",
        );
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        assert_eq!(
            out.output,
            "<title>A &quot;QUOTED&quot; PAGE</title>\n\
             <meta name=\"description\" content=\"A &quot;quoted&quot; page\">\n\
             <link rel=\"preload\" href=\"/f.woff2\" crossorigin>"
        );
    }

    #[test]
    fn first_title_wins() {
        let engine = Engine::new();
        let out = engine.render_str(
            "{% title Page title %}{% title \"Layout default\" %}{% root-head %}",
            json!({}),
        );
        assert_eq!(out.output, "<title>Page title</title>");
    }

    #[test]
    fn duplicate_meta_is_emitted_once() {
        let engine = Engine::new();
        let out = engine.render_str(
            "{% meta charset=utf-8 %}{% meta charset=\"utf-8\" %}{% root-head %}",
            json!({}),
        );
        assert_eq!(out.output, "<meta charset=\"utf-8\">");
    }

    #[test]
    fn missing_arguments() {
        let engine = Engine::new();
        let out = engine.render_str("{% meta %}{% title %}", json!({}));
        let kinds: Vec<ErrorKind> = out.errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![ErrorKind::Usage, ErrorKind::Usage]);
    }

    #[test]
    fn root_css_and_js_emit_registered_assets() {
        let engine = Engine::new();
        let out = engine.render_str(
            "{% js %}b(){% end-js %}{% css %}a{}{% end-css %}<head>{% root-css %}</head>{% root-js %}",
            json!({}),
        );
        assert_eq!(out.output, "<head><style>a{}</style></head><script>b()</script>");
    }

    #[test]
    fn emit_with_nothing_registered() {
        let engine = Engine::new();
        let out = engine.render_str("[{% root-head %}{% root-css %}{% root-js %}]", json!({}));
        assert_eq!(out.output, "[]");
    }
}
