//! The engine: configuration plus the tag and filter tables.

use std::path::PathBuf;

use serde_json::{Map, Value};
use wispy_scan::Delimiters;

use crate::config::EngineConfig;
use crate::context::RenderContext;
use crate::error::{ConfigError, TemplateError};
use crate::filters::{Filter, FilterRegistry};
use crate::tags::{Tag, TagRegistry};

/// Output of a render together with everything that went wrong on the way.
///
/// Errors never abort a render; `output` holds whatever could be produced.
#[derive(Debug, Default)]
pub struct Rendered {
    pub output: String,
    pub errors: Vec<TemplateError>,
}

impl Rendered {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Immutable after construction and safe to share across threads; all
/// per-render state lives in a [`RenderContext`].
pub struct Engine {
    config: EngineConfig,
    delimiters: Delimiters,
    tags: TagRegistry,
    filters: FilterRegistry,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with default configuration and every built-in tag and filter.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            delimiters: Delimiters::default(),
            tags: TagRegistry::with_builtins(),
            filters: FilterRegistry::with_builtins(),
        }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    pub fn tag(&self, name: &str) -> Option<&dyn Tag> {
        self.tags.get(name)
    }

    pub fn filter(&self, name: &str) -> Option<&dyn Filter> {
        self.filters.get(name)
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.names()
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.names()
    }

    /// A fresh context whose partials, layouts and imports resolve under `scoped_dir`.
    pub fn context(&self, scoped_dir: impl Into<PathBuf>) -> RenderContext<'_> {
        RenderContext::new(self, scoped_dir)
    }

    /// Renders `raw` against an existing context.
    ///
    /// The context keeps whatever the render registered (assets, head tags,
    /// blocks, assigned values), so it can be inspected or reused afterwards.
    pub fn render(&self, ctx: &mut RenderContext<'_>, raw: &str) -> Rendered {
        let (output, errors) = ctx.render_to_string(raw);
        Rendered { output, errors }
    }

    /// Renders a standalone string with `data` as the Data scope.
    ///
    /// A non-object `data` leaves Data empty. Files resolve relative to the
    /// working directory.
    pub fn render_str(&self, raw: &str, data: Value) -> Rendered {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let mut ctx = self.context(".").with_data(data);
        self.render(&mut ctx, raw)
    }
}

/// Builds an [`Engine`] with custom configuration, tags or filters.
///
/// Built-ins are always present; registering a built-in name replaces it.
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    tags: TagRegistry,
    filters: FilterRegistry,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn delimiters(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.config.delimiters.start = start.into();
        self.config.delimiters.end = end.into();
        self
    }

    pub fn tag<T: Tag + 'static>(mut self, name: impl Into<String>, tag: T) -> Self {
        self.tags.insert(name, tag);
        self
    }

    pub fn filter<F: Filter + 'static>(mut self, name: impl Into<String>, filter: F) -> Self {
        self.filters.insert(name, filter);
        self
    }

    /// Validates the configuration and assembles the engine.
    pub fn build(self) -> Result<Engine, ConfigError> {
        let delimiters = self.config.validate()?;

        let mut tags = TagRegistry::with_builtins();
        tags.extend(self.tags);

        let mut filters = FilterRegistry::with_builtins();
        filters.extend(self.filters);

        Ok(Engine {
            config: self.config,
            delimiters,
            tags,
            filters,
        })
    }
}
