//! Name to file resolution for partials, layouts and parents.
//!
//! A name resolves under the site root in two attempts:
//!
//! 1. `<site>/<dir>/<name><ext>`
//! 2. `<site>/<dir>/<name>/index<ext>`
//!
//! where `<dir>` is `partials_dir` or `layouts_dir` from the
//! [`EngineConfig`]. A name that already carries the extension is tried
//! as-is first. Files are read on every use; nothing is cached.

use std::path::{Path, PathBuf};

use tracing::debug;
use wispy_scan::unquote;

use crate::config::EngineConfig;
use crate::error::TemplateError;

/// Which directory a template name resolves in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Partial,
    Layout,
}

impl TemplateKind {
    fn dir<'c>(&self, config: &'c EngineConfig) -> &'c str {
        match self {
            TemplateKind::Partial => &config.partials_dir,
            TemplateKind::Layout => &config.layouts_dir,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TemplateKind::Partial => "partial",
            TemplateKind::Layout => "layout",
        }
    }
}

/// Candidate paths for a name, in the order they are tried.
pub fn candidates(config: &EngineConfig, site: &Path, kind: TemplateKind, name: &str) -> Vec<PathBuf> {
    let name = unquote(name.trim());
    let base = site.join(kind.dir(config));
    let ext = &config.extension;

    let mut paths = Vec::with_capacity(3);
    if !ext.is_empty() && name.ends_with(ext.as_str()) {
        paths.push(base.join(name));
    }
    paths.push(base.join(format!("{}{}", name, ext)));
    paths.push(base.join(name).join(format!("index{}", ext)));
    paths
}

/// Finds the first existing candidate file.
pub fn locate(
    config: &EngineConfig,
    site: &Path,
    kind: TemplateKind,
    name: &str,
) -> Result<PathBuf, TemplateError> {
    let tried = candidates(config, site, kind, name);
    for path in &tried {
        if path.is_file() {
            debug!(kind = kind.label(), name, path = %path.display(), "resolved template");
            return Ok(path.clone());
        }
    }

    debug!(kind = kind.label(), name, "template not found");
    Err(TemplateError::TemplateNotFound {
        what: kind.label(),
        name: unquote(name.trim()).to_string(),
        tried: tried
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Reads a template file.
pub fn read(path: &Path) -> Result<String, TemplateError> {
    std::fs::read_to_string(path).map_err(|source| TemplateError::read(path, source))
}

/// Locates and reads in one step.
pub fn load(
    config: &EngineConfig,
    site: &Path,
    kind: TemplateKind,
    name: &str,
) -> Result<(PathBuf, String), TemplateError> {
    let path = locate(config, site, kind, name)?;
    let content = read(&path)?;
    Ok((path, content))
}
