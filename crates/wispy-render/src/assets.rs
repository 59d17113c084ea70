//! Page asset collection.
//!
//! Tags such as `import`, `css` and `js` register stylesheets and scripts
//! while a page renders; `root-css` and `root-js` emit them later, usually
//! from the root layout. The [`AssetRegistry`] drops duplicates and orders
//! what remains by priority.
//!
//! # Keys
//!
//! Each asset has a deterministic dedup key:
//!
//! | Source | Key |
//! |--------|-----|
//! | inline | `inline:CSS:<sha256 of content>` |
//! | external | `external:JS:<cleaned path>` |
//!
//! # Priorities
//!
//! Lower priorities render first. An asset registered with priority `0` gets
//! a default by type: CSS 100, module JS 200, classic JS 300.

use std::collections::HashSet;
use std::fmt;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::value::escape_html;

pub const CSS_PRIORITY: i32 = 100;
pub const JS_MODULE_PRIORITY: i32 = 200;
pub const JS_PRIORITY: i32 = 300;

/// Gap left between a dependency and the asset that needs it.
const DEPENDENCY_STEP: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Css,
    Js,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Css => write!(f, "CSS"),
            AssetKind::Js => write!(f, "JS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// Content emitted inside `<style>` or `<script>`.
    Inline(String),
    /// Path or URL emitted as a `<link>` or `<script src>`.
    External(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("external {0} asset has no path")]
    MissingPath(AssetKind),
}

/// A stylesheet or script waiting to be emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub kind: AssetKind,
    pub source: AssetSource,
    pub priority: i32,
    pub media: Option<String>,
    pub is_async: bool,
    pub defer: bool,
    pub module: bool,
}

impl Asset {
    pub fn inline(kind: AssetKind, content: impl Into<String>) -> Self {
        Self::with_source(kind, AssetSource::Inline(content.into()))
    }

    pub fn external(kind: AssetKind, path: impl Into<String>) -> Self {
        Self::with_source(kind, AssetSource::External(path.into()))
    }

    fn with_source(kind: AssetKind, source: AssetSource) -> Self {
        Self {
            kind,
            source,
            priority: 0,
            media: None,
            is_async: false,
            defer: false,
            module: false,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }

    pub fn module(mut self, module: bool) -> Self {
        self.module = module;
        self
    }

    pub fn is_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    pub fn defer(mut self, defer: bool) -> Self {
        self.defer = defer;
        self
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.source, AssetSource::Inline(_))
    }

    /// Deterministic identity used for deduplication.
    pub fn key(&self) -> String {
        match &self.source {
            AssetSource::Inline(content) => {
                let digest = Sha256::digest(content.as_bytes());
                format!("inline:{}:{}", self.kind, hex::encode(digest))
            }
            AssetSource::External(path) => {
                format!("external:{}:{}", self.kind, clean_path(path))
            }
        }
    }

    fn default_priority(&self) -> i32 {
        match self.kind {
            AssetKind::Css => CSS_PRIORITY,
            AssetKind::Js if self.module => JS_MODULE_PRIORITY,
            AssetKind::Js => JS_PRIORITY,
        }
    }

    fn matches(&self, key: &str, dependency: &str) -> bool {
        if key == dependency {
            return true;
        }
        match &self.source {
            AssetSource::External(path) => clean_path(path) == clean_path(dependency),
            AssetSource::Inline(_) => false,
        }
    }

    fn render(&self) -> String {
        match (self.kind, &self.source) {
            (AssetKind::Css, AssetSource::Inline(content)) => {
                format!("<style{}>{}</style>", self.media_attr(), content)
            }
            (AssetKind::Css, AssetSource::External(path)) => format!(
                "<link rel=\"stylesheet\" href=\"{}\"{}>",
                escape_html(path),
                self.media_attr()
            ),
            (AssetKind::Js, AssetSource::Inline(content)) => {
                format!("<script{}>{}</script>", self.script_attrs(), content)
            }
            (AssetKind::Js, AssetSource::External(path)) => format!(
                "<script src=\"{}\"{}></script>",
                escape_html(path),
                self.script_attrs()
            ),
        }
    }

    fn media_attr(&self) -> String {
        match &self.media {
            Some(media) if !media.is_empty() => format!(" media=\"{}\"", escape_html(media)),
            _ => String::new(),
        }
    }

    fn script_attrs(&self) -> String {
        let mut attrs = String::new();
        if self.module {
            attrs.push_str(" type=\"module\"");
        }
        if self.is_async {
            attrs.push_str(" async");
        }
        if self.defer {
            attrs.push_str(" defer");
        }
        attrs
    }
}

/// Lexically normalizes a slash-separated path. URLs pass through untouched.
pub fn clean_path(path: &str) -> String {
    if path.contains("://") || path.starts_with("//") {
        return path.to_string();
    }

    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Deduplicating, priority-ordered asset collection for one render.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    assets: Vec<Asset>,
    seen: HashSet<String>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an asset, ordered after every named dependency.
    ///
    /// Lower priorities are emitted first, so a dependent's priority is
    /// raised to `DEPENDENCY_STEP` above the highest priority among its
    /// dependencies. Subtracting from the lowest one would put it ahead of
    /// them. At the top of the range the raise saturates and registration
    /// order keeps the dependent last.
    ///
    /// Dependencies are matched by dedup key or by path. Returns `Ok(false)`
    /// when an asset with the same key is already registered.
    pub fn add(&mut self, mut asset: Asset, dependencies: &[&str]) -> Result<bool, AssetError> {
        if let AssetSource::External(path) = &asset.source {
            if path.trim().is_empty() {
                return Err(AssetError::MissingPath(asset.kind));
            }
        }

        let key = asset.key();
        if self.seen.contains(&key) {
            debug!(%key, "skipping duplicate asset");
            return Ok(false);
        }

        if asset.priority == 0 {
            asset.priority = asset.default_priority();
        }

        let floor = dependencies
            .iter()
            .filter_map(|dep| {
                self.assets
                    .iter()
                    .find(|existing| existing.matches(&existing.key(), dep))
                    .map(|existing| existing.priority)
            })
            .max();
        if let Some(floor) = floor {
            if asset.priority <= floor {
                asset.priority = floor.saturating_add(DEPENDENCY_STEP);
            }
        }

        debug!(%key, priority = asset.priority, "registered asset");
        self.seen.insert(key);
        self.assets.push(asset);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Assets of one kind in emission order.
    pub fn ordered(&self, kind: AssetKind) -> Vec<&Asset> {
        let mut selected: Vec<&Asset> = self.assets.iter().filter(|a| a.kind == kind).collect();
        // stable: equal priorities keep registration order
        selected.sort_by_key(|a| a.priority);
        selected
    }

    /// Renders every asset of one kind as HTML, one element per line.
    pub fn render(&self, kind: AssetKind) -> String {
        self.ordered(kind)
            .into_iter()
            .map(Asset::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
