//! Whole-page rendering: page data, the page itself, then the root layout.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::engine::{Engine, Rendered};
use crate::error::TemplateError;
use crate::loader::{self, TemplateKind};
use crate::request::RequestInfo;

impl Engine {
    /// Renders the page at `page` (relative to `site`) inside the root layout.
    ///
    /// Data is built from `data`, the request's query parameters under
    /// `URL.Query`, and the page directory's sidecar data file, which wins on
    /// conflicting keys. The page's rendered output is relayed to the root
    /// layout through `passed`; a request carrying the bypass header gets the
    /// page alone.
    ///
    /// Only an unreadable page or sidecar file is an `Err`; everything else
    /// is collected in [`Rendered::errors`].
    pub fn render_page(
        &self,
        site: impl AsRef<Path>,
        page: impl AsRef<Path>,
        data: Map<String, Value>,
        request: Option<RequestInfo>,
    ) -> Result<Rendered, TemplateError> {
        let site = site.as_ref();
        let page_path = site.join(page.as_ref());
        let content = loader::read(&page_path)?;

        let mut data = data;
        if let Some(request) = &request {
            set_query(&mut data, request.query_object());
        }
        if let Some(dir) = page_path.parent() {
            merge_sidecar(&mut data, &dir.join(&self.config().data_file))?;
        }

        let mut ctx = self.context(site).with_data(data);
        if let Some(request) = request {
            ctx = ctx.with_request(request);
        }

        let (page_output, mut errors) = ctx
            .in_template(page_path, |ctx| ctx.render_to_string(&content))
            .unwrap_or_else(|err| (String::new(), vec![err]));

        if ctx.bypass_layouts() {
            debug!(page = %page.as_ref().display(), "layout bypass requested, skipping root layout");
            return Ok(Rendered {
                output: page_output,
                errors,
            });
        }

        let config = self.config();
        let (layout_path, layout) =
            match loader::load(config, site, TemplateKind::Layout, &config.root_layout) {
                Ok(found) => found,
                Err(err) => {
                    errors.push(err);
                    return Ok(Rendered {
                        output: page_output,
                        errors,
                    });
                }
            };

        ctx.passed = Some(page_output);
        let (output, layout_errors) = ctx
            .in_template(layout_path, |ctx| ctx.render_to_string(&layout))
            .unwrap_or_else(|err| (String::new(), vec![err]));
        errors.extend(layout_errors);
        Ok(Rendered { output, errors })
    }
}

fn set_query(data: &mut Map<String, Value>, query: Map<String, Value>) {
    let url = data
        .entry("URL")
        .or_insert_with(|| Value::Object(Map::new()));
    if !url.is_object() {
        *url = Value::Object(Map::new());
    }
    if let Value::Object(url) = url {
        url.insert("Query".to_string(), Value::Object(query));
    }
}

fn merge_sidecar(data: &mut Map<String, Value>, path: &Path) -> Result<(), TemplateError> {
    if !path.is_file() {
        debug!(path = %path.display(), "no page data file");
        return Ok(());
    }
    let raw = loader::read(path)?;
    let sidecar: Map<String, Value> =
        serde_json::from_str(&raw).map_err(|source| TemplateError::Data {
            path: path.to_path_buf(),
            source,
        })?;
    data.extend(sidecar);
    Ok(())
}
