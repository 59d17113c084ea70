//! Asset registration: `import`, `css` and `js`.

use std::path::{Path, PathBuf};

use tracing::warn;
use wispy_scan::{parse_flags, parse_options, split_respect_quotes, TagOptions};

use super::{Tag, TagCall, TagOutput};
use crate::assets::{Asset, AssetKind};
use crate::condition;
use crate::context::RenderContext;
use crate::error::TemplateError;
use crate::loader;

fn is_remote(path: &str) -> bool {
    path.starts_with("https://") || path.starts_with("http://") || path.starts_with("//")
}

/// Asset kind by extension; `.mjs` implies a module script.
fn kind_of(path: &str) -> Option<(AssetKind, bool)> {
    let ext = Path::new(path.split(['?', '#']).next().unwrap_or(path))
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match ext.as_str() {
        "css" => Some((AssetKind::Css, false)),
        "js" => Some((AssetKind::Js, false)),
        "mjs" => Some((AssetKind::Js, true)),
        _ => None,
    }
}

/// Applies `priority=N media=.. async defer module` to an asset.
fn apply_options(call: &TagCall<'_>, mut asset: Asset, opts: &TagOptions) -> Result<Asset, TemplateError> {
    if let Some(raw) = opts.get("priority") {
        let priority = raw
            .parse()
            .map_err(|_| call.usage(format!("invalid priority `{}`", raw)))?;
        asset = asset.priority(priority);
    }
    if let Some(media) = opts.get("media") {
        asset = asset.media(media);
    }
    if opts.flag("async") {
        asset = asset.is_async(true);
    }
    if opts.flag("defer") {
        asset = asset.defer(true);
    }
    if opts.flag("module") {
        asset = asset.module(true);
    }
    Ok(asset)
}

fn register(ctx: &mut RenderContext<'_>, asset: Asset, dependencies: &[&str]) -> Option<TemplateError> {
    match ctx.assets.add(asset, dependencies) {
        Ok(_) => None,
        Err(err) => {
            warn!(error = %err, "asset registration failed");
            Some(err.into())
        }
    }
}

/// `{% import PATH [inline|external] [priority=N] [media=..] [async] [defer] [module] [after=DEP] [if=COND] %}`
///
/// `~/` paths resolve next to the current template, `http(s)://` paths are
/// always linked, anything else resolves under the site root and is inlined
/// unless marked `external`. Stylesheets and scripts go to the asset
/// registry; any other file is written into the output as-is.
pub struct Import;

impl Tag for Import {
    fn render(&self, ctx: &mut RenderContext<'_>, out: &mut String, call: &TagCall<'_>) -> TagOutput {
        let tokens = split_respect_quotes(call.args);
        let opts = parse_options(tokens.iter().copied());
        let Some(path) = opts.positional().or_else(|| opts.get("path")) else {
            return TagOutput::error(call.end, call.usage("missing path"));
        };

        if let Some(cond) = opts.get("if") {
            match condition::evaluate(ctx, cond) {
                Ok(true) => {}
                Ok(false) => return TagOutput::at(call.end),
                Err(err) => return TagOutput::error(call.end, err),
            }
        }

        let kind = kind_of(path);
        let external = is_remote(path) || (opts.flag("external") && !opts.flag("inline"));

        let asset = if external {
            let Some((kind, module)) = kind else {
                return TagOutput::error(
                    call.end,
                    call.usage(format!("cannot link `{}`: not a .css or .js file", path)),
                );
            };
            Asset::external(kind, path).module(module)
        } else {
            let file: PathBuf = match path.strip_prefix("~/") {
                Some(relative) => ctx.template_dir().join(relative),
                None => ctx.scoped_dir.join(path.trim_start_matches('/')),
            };
            let content = match loader::read(&file) {
                Ok(content) => content,
                Err(err) => return TagOutput::error(call.end, err),
            };
            match kind {
                Some((kind, module)) => Asset::inline(kind, content).module(module),
                None => {
                    out.push_str(&content);
                    return TagOutput::at(call.end);
                }
            }
        };

        let asset = match apply_options(call, asset, &opts) {
            Ok(asset) => asset,
            Err(err) => return TagOutput::error(call.end, err),
        };
        let dependencies: Vec<&str> = opts.get("after").into_iter().collect();
        match register(ctx, asset, &dependencies) {
            Some(err) => TagOutput::error(call.end, err),
            None => TagOutput::at(call.end),
        }
    }
}

/// `{% css [priority=N] [media=..] %}...{% end-css %}` and
/// `{% js [async] [defer] [module] [priority=N] %}...{% end-js %}`.
///
/// The body is rendered, so it may use variables, and an enclosing
/// `<style>` or `<script>` element is stripped.
pub struct InlineAsset {
    kind: AssetKind,
    open: &'static str,
    close: &'static str,
}

impl InlineAsset {
    pub fn css() -> Self {
        Self {
            kind: AssetKind::Css,
            open: "<style>",
            close: "</style>",
        }
    }

    pub fn js() -> Self {
        Self {
            kind: AssetKind::Js,
            open: "<script>",
            close: "</script>",
        }
    }

    fn strip_wrapper<'s>(&self, content: &'s str) -> &'s str {
        let content = content.trim();
        let content = content.strip_prefix(self.open).unwrap_or(content);
        let content = content.strip_suffix(self.close).unwrap_or(content);
        content.trim()
    }
}

impl Tag for InlineAsset {
    fn render(&self, ctx: &mut RenderContext<'_>, _out: &mut String, call: &TagCall<'_>) -> TagOutput {
        let block = match call.block(ctx.engine().delimiters()) {
            Ok(block) => block,
            Err(err) => return TagOutput::error(call.end, err),
        };

        let (rendered, mut errors) = ctx.render_to_string(block.body);
        let content = self.strip_wrapper(&rendered);
        if content.is_empty() {
            return TagOutput::with_errors(block.next, errors);
        }

        let tokens = split_respect_quotes(call.args);
        let opts = parse_flags(tokens.iter().copied());
        match apply_options(call, Asset::inline(self.kind, content), &opts) {
            Ok(asset) => errors.extend(register(ctx, asset, &[])),
            Err(err) => errors.push(err),
        }
        TagOutput::with_errors(block.next, errors)
    }
}
