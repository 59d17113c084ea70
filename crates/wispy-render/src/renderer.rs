//! The scan-and-dispatch loop.

use tracing::trace;
use wispy_scan::{Scanner, Token};

use crate::context::RenderContext;
use crate::error::TemplateError;
use crate::resolver;
use crate::tags::TagCall;
use crate::value::stringify;

/// Renders `raw` into `out`.
///
/// Text is copied, expressions are resolved and written, and tags are
/// handed to their registered handler, which reports where scanning
/// resumes. Nothing here stops the render except an unterminated start
/// delimiter; every other problem is collected and the scan moves on.
pub(crate) fn render_raw(ctx: &mut RenderContext<'_>, out: &mut String, raw: &str) -> Vec<TemplateError> {
    let engine = ctx.engine();
    let delims = engine.delimiters();
    let mut scanner = Scanner::new(raw, delims);
    let mut errors = Vec::new();

    while let Some(token) = scanner.next() {
        match token {
            Token::Text(text) => out.push_str(text),
            Token::Unclosed { position } => {
                errors.push(TemplateError::UnclosedDelimiter {
                    position,
                    delimiter: delims.end().to_string(),
                });
                break;
            }
            Token::Tag(tag) if tag.is_expression() => match resolver::evaluate(ctx, tag.contents) {
                Ok(value) => out.push_str(&stringify(&value)),
                Err(err) => errors.push(err),
            },
            Token::Tag(tag) => {
                let (name, args) = tag.name_and_args();
                let Some(handler) = engine.tag(name) else {
                    errors.push(TemplateError::UnknownTag(name.to_string()));
                    continue;
                };

                trace!(tag = name, at = tag.start, "dispatch");
                let call = TagCall {
                    name,
                    args,
                    raw,
                    start: tag.start,
                    end: tag.end,
                };
                let result = handler.render(ctx, out, &call);
                errors.extend(result.errors);
                scanner.seek(result.next);
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{Engine, ErrorKind, TemplateError};

    #[test]
    fn text_and_expressions() {
        let engine = Engine::new();
        let out = engine.render_str("Hi {% .name %}, {% .n | size %}!", json!({"name": "Ada", "n": "abc"}));
        assert_eq!(out.output, "Hi Ada, 3!");
        assert!(out.errors.is_empty());
    }

    #[test]
    fn unknown_tag_is_skipped() {
        let engine = Engine::new();
        let out = engine.render_str("a{% bogus x y %}b", json!({}));
        assert_eq!(out.output, "ab");
        assert!(matches!(&out.errors[..], [TemplateError::UnknownTag(name)] if name == "bogus"));
        assert_eq!(out.errors[0].kind(), ErrorKind::Dispatch);
    }

    #[test]
    fn unclosed_delimiter_stops_the_scan() {
        let engine = Engine::new();
        let out = engine.render_str("a{% .x %}b{% .x", json!({"x": 1}));
        assert_eq!(out.output, "a1b");
        assert!(matches!(
            &out.errors[..],
            [TemplateError::UnclosedDelimiter { position: 10, .. }]
        ));
    }

    #[test]
    fn missing_variable_renders_nothing() {
        let engine = Engine::new();
        let out = engine.render_str("[{% .nope %}]", json!({}));
        assert_eq!(out.output, "[]");
        assert_eq!(out.errors[0].kind(), ErrorKind::Resolution);
    }

    #[test]
    fn errors_accumulate() {
        let engine = Engine::new();
        let out = engine.render_str("{% .a %}{% nope %}{% .b | nofilter %}ok", json!({"b": 1}));
        assert_eq!(out.output, "ok");
        assert_eq!(out.errors.len(), 3);
    }
}
