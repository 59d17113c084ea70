//! Tag dispatch.
//!
//! Anything between delimiters that does not start with `.` is a tag: the
//! first word names it, the rest are its arguments. The renderer looks the
//! name up in the engine's [`TagRegistry`] and hands control to the [`Tag`],
//! which writes output, may consume text past its own delimiters (a block
//! body up to `{% end-name %}`), and returns where scanning resumes.
//!
//! # Built-in tags
//!
//! | Tag | Form |
//! |-----|------|
//! | `if` / `else` | `{% if COND %}...{% else %}...{% end-if %}` |
//! | `each` | `{% each VAR in PATH %}...{% end-each %}` |
//! | `assign` | `{% assign VAR = EXPR %}` |
//! | `comment` | `{% comment %}...{% end-comment %}` |
//! | `partial` | `{% partial NAME key=value... %}` |
//! | `layout` | `{% layout NAME %}...[{% end-layout %}]` |
//! | `extends` | `{% extends NAME %}...[{% end-extends %}]` |
//! | `slot` | `{% slot NAME %}...{% end-slot %}` |
//! | `block` | `{% block NAME %}default{% end-block %}` |
//! | `define` | `{% define NAME %}...{% end-define %}` |
//! | `passed` | `{% passed %}` |
//! | `import` | `{% import PATH [options] %}` |
//! | `css` / `js` | `{% css %}...{% end-css %}` |
//! | `meta` / `link` / `title` | `{% meta name="x" content=.y %}` |
//! | `root-head` / `root-css` / `root-js` | `{% root-css %}` |
//!
//! # Custom tags
//!
//! ```rust
//! use wispy_render::{Engine, RenderContext, TagCall, TagOutput};
//!
//! let engine = Engine::builder()
//!     .tag("year", |_ctx: &mut RenderContext<'_>, out: &mut String, call: &TagCall<'_>| {
//!         out.push_str("2024");
//!         TagOutput::at(call.end)
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(engine.render_str("(c) {% year %}", serde_json::json!({})).output, "(c) 2024");
//! ```

mod assets;
mod control;
mod head;
mod include;
mod inherit;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use wispy_scan::{find_closing, Delimiters};

use crate::context::RenderContext;
use crate::error::TemplateError;

/// One tag occurrence handed to a [`Tag`].
#[derive(Debug, Clone, Copy)]
pub struct TagCall<'a> {
    /// Tag name as written.
    pub name: &'a str,
    /// Everything after the name, trimmed.
    pub args: &'a str,
    /// The full text being rendered.
    pub raw: &'a str,
    /// Offset of the tag's start delimiter in `raw`.
    pub start: usize,
    /// Offset just past the tag's end delimiter in `raw`.
    pub end: usize,
}

/// Body of a block tag and where scanning resumes after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    pub body: &'a str,
    pub next: usize,
}

impl<'a> TagCall<'a> {
    /// The body up to the balancing `end-NAME` marker.
    pub fn block(&self, delims: &Delimiters) -> Result<Block<'a>, TemplateError> {
        let close = delims.close_marker(self.name);
        match find_closing(self.raw, &delims.open_marker(self.name), &close, self.end) {
            Some(span) => Ok(Block {
                body: &self.raw[self.end..span.start],
                next: span.end,
            }),
            None => Err(TemplateError::UnclosedBlock {
                tag: self.name.to_string(),
                expected: close,
            }),
        }
    }

    /// The body up to an optional `end-NAME` marker, else the rest of the text.
    pub fn block_or_rest(&self, delims: &Delimiters) -> Block<'a> {
        self.block(delims).unwrap_or(Block {
            body: &self.raw[self.end..],
            next: self.raw.len(),
        })
    }

    pub(crate) fn usage(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::usage(self.name, message)
    }
}

/// Where scanning resumes after a tag, plus what went wrong inside it.
#[derive(Debug, Default)]
pub struct TagOutput {
    pub next: usize,
    pub errors: Vec<TemplateError>,
}

impl TagOutput {
    pub fn at(next: usize) -> Self {
        Self {
            next,
            errors: Vec::new(),
        }
    }

    pub fn with_errors(next: usize, errors: Vec<TemplateError>) -> Self {
        Self { next, errors }
    }

    pub fn error(next: usize, error: TemplateError) -> Self {
        Self {
            next,
            errors: vec![error],
        }
    }
}

/// A named directive.
///
/// Implementations are shared by every render using the engine, so they
/// keep no per-render state of their own; everything lives in the
/// [`RenderContext`].
pub trait Tag: Send + Sync {
    fn render(&self, ctx: &mut RenderContext<'_>, out: &mut String, call: &TagCall<'_>) -> TagOutput;
}

impl<F> Tag for F
where
    F: Fn(&mut RenderContext<'_>, &mut String, &TagCall<'_>) -> TagOutput + Send + Sync,
{
    fn render(&self, ctx: &mut RenderContext<'_>, out: &mut String, call: &TagCall<'_>) -> TagOutput {
        (self)(ctx, out, call)
    }
}

/// Name to tag table. Re-registering a name replaces the old entry.
#[derive(Clone, Default)]
pub struct TagRegistry {
    tags: HashMap<String, Arc<dyn Tag>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in tag.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert("if", control::If);
        registry.insert("else", control::Else);
        registry.insert("each", control::Each);
        registry.insert("assign", control::Assign);
        registry.insert("comment", control::Comment);
        registry.insert("partial", include::Partial);
        registry.insert("layout", inherit::Layout);
        registry.insert("passed", inherit::Passed);
        registry.insert("extends", inherit::Extends);
        registry.insert("slot", inherit::Slot);
        registry.insert("block", inherit::BlockTag);
        registry.insert("define", inherit::Define);
        registry.insert("import", assets::Import);
        registry.insert("css", assets::InlineAsset::css());
        registry.insert("js", assets::InlineAsset::js());
        registry.insert("meta", head::Element::meta());
        registry.insert("link", head::Element::link());
        registry.insert("title", head::Title);
        registry.insert("root-head", head::Emit::Head);
        registry.insert("root-css", head::Emit::Css);
        registry.insert("root-js", head::Emit::Js);
        registry
    }

    pub fn insert<T: Tag + 'static>(&mut self, name: impl Into<String>, tag: T) {
        let name = name.into();
        if self.tags.insert(name.clone(), Arc::new(tag)).is_some() {
            warn!(tag = %name, "tag registered twice, keeping the latest");
        }
    }

    /// Moves every entry of `other` in, replacing same-named tags.
    pub fn extend(&mut self, other: TagRegistry) {
        for (name, tag) in other.tags {
            if self.tags.insert(name.clone(), tag).is_some() {
                debug!(tag = %name, "replacing built-in tag");
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tag> {
        self.tags.get(name).map(|t| t.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tags.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
