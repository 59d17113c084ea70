//! # Wispy Render - Tag-Based Page Templates
//!
//! `wispy-render` renders HTML pages from text templates with embedded
//! `{% ... %}` tags. Templates include partials, wrap themselves in layouts,
//! fill blocks of a parent template, and register stylesheets, scripts and
//! head elements that the root layout emits once, deduplicated and ordered.
//!
//! ## Core Concepts
//!
//! - [`Engine`]: configuration plus the tag and filter tables, shared and immutable
//! - [`RenderContext`]: per-render state (data scopes, relayed content, registries)
//! - [`Rendered`]: output plus the accumulated [`TemplateError`]s
//! - [`Tag`] / [`Filter`]: extension points, registered through [`EngineBuilder`]
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use wispy_render::Engine;
//!
//! let engine = Engine::new();
//! let out = engine.render_str(
//!     "{% each item in .items %}<li>{% .item | capitalize %}</li>{% end-each %}",
//!     json!({"items": ["one", "two"]}),
//! );
//! assert_eq!(out.output, "<li>One</li><li>Two</li>");
//! assert!(out.errors.is_empty());
//! ```
//!
//! ## Expressions
//!
//! A tag whose contents start with `.` is an expression: a dotted path
//! looked up in the partial's props, then loop variables, then page data,
//! optionally piped through filters (`{% .title | truncate 20 | upcase %}`).
//!
//! ## Errors
//!
//! Rendering never fails outright. Unknown tags, missing variables, missing
//! partials and malformed arguments each add a [`TemplateError`] and the
//! render carries on; only a start delimiter with no end delimiter stops the
//! scan of the text it appears in.
//!
//! ## Pages
//!
//! [`Engine::render_page`] renders a page file from a site directory, merges
//! its sidecar data file and the request's query parameters into the data,
//! and wraps the result in the site's root layout:
//!
//! ```text
//! site/
//!   layouts/root.hstm      <html><head>{% root-head %}{% root-css %}</head>
//!                          <body>{% passed %}{% root-js %}</body></html>
//!   partials/card.hstm
//!   pages/about/index.hstm
//!   pages/about/data_en.json
//! ```

pub mod assets;
mod condition;
pub mod config;
mod context;
mod engine;
mod error;
pub mod filters;
pub mod head;
mod loader;
mod page;
mod renderer;
mod request;
mod resolver;
pub mod tags;
mod value;

pub use assets::{Asset, AssetError, AssetKind, AssetRegistry, AssetSource};
pub use config::{DelimiterConfig, EngineConfig};
pub use context::RenderContext;
pub use engine::{Engine, EngineBuilder, Rendered};
pub use error::{ConfigError, ErrorKind, TemplateError};
pub use filters::{Filter, FilterError, FilterRegistry};
pub use head::{HeadTag, HeadTagRegistry};
pub use request::RequestInfo;
pub use tags::{Block, Tag, TagCall, TagOutput, TagRegistry};
pub use value::{escape_html, is_truthy, stringify};

pub use wispy_scan::Delimiters;
