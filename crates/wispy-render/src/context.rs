//! Per-render state.
//!
//! A [`RenderContext`] is created once per page or string render. It carries
//! the data scopes variables resolve against, the content relayed between
//! templates (`passed`, named blocks), the current file position used for
//! relative imports, and the asset and head registries that tags fill in.
//!
//! The [`Engine`] it borrows is shared and never mutated, so any number of
//! contexts can render concurrently against one engine.
//!
//! # Scopes
//!
//! Variable lookups try, in order:
//!
//! 1. Props, the key/value arguments of the partial being rendered
//! 2. Loop scopes, innermost first
//! 3. Data, the page-level values
//!
//! Each loop iteration opens a scope holding its variable. `assign` writes to
//! the innermost scope that already has the name, otherwise to the innermost
//! scope, otherwise to Data. A nested write below a Data value copies that
//! value into the scope first, so nothing assigned inside an iteration
//! outlives it.
//!
//! # Cycles
//!
//! Every file being rendered is kept on a stack together with the Props it
//! was entered with. Entering a file that is already on the stack with the
//! same Props cannot terminate, and [`RenderContext::in_template`] refuses it
//! with a [`TemplateError::Cycle`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::assets::AssetRegistry;
use crate::engine::Engine;
use crate::error::TemplateError;
use crate::head::HeadTagRegistry;
use crate::renderer;
use crate::request::RequestInfo;

pub struct RenderContext<'e> {
    engine: &'e Engine,
    /// Page-level values.
    pub data: Map<String, Value>,
    /// Arguments of the partial currently rendering.
    pub props: Map<String, Value>,
    scopes: Vec<Map<String, Value>>,
    /// Named overrides captured from child templates (`slot`, `define`).
    pub blocks: HashMap<String, String>,
    /// Rendered content waiting for a `passed` tag.
    pub passed: Option<String>,
    /// File whose content is being rendered, if any.
    pub current_template: Option<PathBuf>,
    /// Site root that partials, layouts and imports resolve under.
    pub scoped_dir: PathBuf,
    pub assets: AssetRegistry,
    pub head: HeadTagRegistry,
    pub request: Option<RequestInfo>,
    depth: usize,
    active: Vec<(PathBuf, Map<String, Value>)>,
}

impl<'e> RenderContext<'e> {
    pub fn new(engine: &'e Engine, scoped_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            data: Map::new(),
            props: Map::new(),
            scopes: Vec::new(),
            blocks: HashMap::new(),
            passed: None,
            current_template: None,
            scoped_dir: scoped_dir.into(),
            assets: AssetRegistry::new(),
            head: HeadTagRegistry::new(),
            request: None,
            depth: 0,
            active: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_request(mut self, request: RequestInfo) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.current_template = Some(path.into());
        self
    }

    /// The engine, borrowed for as long as the context lives.
    pub fn engine(&self) -> &'e Engine {
        self.engine
    }

    /// Current nesting depth of [`render`](Self::render) calls.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Renders `raw` into `out`, returning the problems found.
    ///
    /// Every nested render (block bodies, partials, layouts) goes through
    /// here; past the configured `max_depth` the subtree is skipped and a
    /// [`TemplateError::DepthExceeded`] is reported instead.
    pub fn render(&mut self, out: &mut String, raw: &str) -> Vec<TemplateError> {
        let max = self.engine.config().max_depth;
        if self.depth >= max {
            return vec![TemplateError::DepthExceeded {
                max,
                template: self.template_label(),
            }];
        }

        self.depth += 1;
        let errors = renderer::render_raw(self, out, raw);
        self.depth -= 1;
        errors
    }

    /// Renders into a fresh string.
    pub fn render_to_string(&mut self, raw: &str) -> (String, Vec<TemplateError>) {
        let mut out = String::with_capacity(raw.len());
        let errors = self.render(&mut out, raw);
        (out, errors)
    }

    /// Runs `f` with `path` as the current template, restoring the previous one after.
    ///
    /// Fails without calling `f` when `path` is already being rendered with
    /// the current Props.
    pub fn in_template<R>(
        &mut self,
        path: PathBuf,
        f: impl FnOnce(&mut Self) -> R,
    ) -> Result<R, TemplateError> {
        if self
            .active
            .iter()
            .any(|(active, props)| *active == path && *props == self.props)
        {
            let mut chain: Vec<String> = self
                .active
                .iter()
                .map(|(active, _)| active.display().to_string())
                .collect();
            chain.push(path.display().to_string());
            return Err(TemplateError::Cycle {
                template: path.display().to_string(),
                chain: chain.join(" -> "),
            });
        }

        self.active.push((path.clone(), self.props.clone()));
        let previous = self.current_template.replace(path);
        let result = f(self);
        self.current_template = previous;
        self.active.pop();
        Ok(result)
    }

    /// Directory of the current template, or the site root outside any file.
    pub fn template_dir(&self) -> &Path {
        self.current_template
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(self.scoped_dir.as_path())
    }

    pub(crate) fn template_label(&self) -> String {
        match &self.current_template {
            Some(path) => path.display().to_string(),
            None => "<inline template>".to_string(),
        }
    }

    pub fn push_scope(&mut self, scope: Map<String, Value>) {
        self.scopes.push(scope);
    }

    pub fn pop_scope(&mut self) -> Option<Map<String, Value>> {
        self.scopes.pop()
    }

    /// Innermost loop-scope value with this name.
    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Stores `value` at a dotted path, creating objects on the way.
    ///
    /// The module docs describe which scope receives it. Non-object values
    /// met along the path are replaced. Returns `false` when the path has no
    /// segments.
    pub fn assign(&mut self, path: &str, value: Value) -> bool {
        let segments: Vec<&str> = path
            .trim()
            .trim_start_matches('.')
            .split('.')
            .filter(|s| !s.is_empty())
            .collect();
        let Some(first) = segments.first().copied() else {
            return false;
        };

        let target = match self.scopes.iter().rposition(|scope| scope.contains_key(first)) {
            Some(index) => &mut self.scopes[index],
            None => match self.scopes.last_mut() {
                Some(scope) => {
                    if segments.len() > 1 {
                        if let Some(existing) = self.data.get(first) {
                            scope.insert(first.to_string(), existing.clone());
                        }
                    }
                    scope
                }
                None => &mut self.data,
            },
        };
        insert_path(target, &segments, value)
    }

    /// Whether the inbound request asked for layouts to be skipped.
    pub fn bypass_layouts(&self) -> bool {
        let header = &self.engine.config().bypass_header;
        if header.is_empty() {
            return false;
        }
        self.request
            .as_ref()
            .and_then(|req| req.header(header))
            .map(|value| !value.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(false)
    }
}

fn insert_path(mut map: &mut Map<String, Value>, segments: &[&str], value: Value) -> bool {
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };
    for segment in parents {
        let entry = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        map = match entry {
            Value::Object(inner) => inner,
            _ => return false,
        };
    }
    map.insert(last.to_string(), value);
    true
}
