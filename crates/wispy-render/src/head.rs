//! Collected `<head>` elements.

use std::collections::HashSet;

use tracing::debug;

use crate::value::escape_html;

/// Head elements rendered without a closing tag.
const VOID_TAGS: &[&str] = &["meta", "link", "base"];

/// One element destined for the document head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadTag {
    pub name: String,
    /// Attributes already formatted as `key="value"` or a bare flag.
    pub attributes: Vec<String>,
    pub body: Option<String>,
}

impl HeadTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            body: None,
        }
    }

    /// Adds a `key="value"` attribute, escaping the value.
    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attributes
            .push(format!("{}=\"{}\"", key, escape_html(value)));
        self
    }

    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn key(&self) -> String {
        format!("{}:{}", self.name, self.attributes.join(":"))
    }

    fn render(&self) -> String {
        let attrs: String = self
            .attributes
            .iter()
            .map(|a| format!(" {}", a))
            .collect();

        if VOID_TAGS.contains(&self.name.as_str()) {
            format!("<{}{}>", self.name, attrs)
        } else if self.name == "title" {
            let body = self.body.as_deref().unwrap_or_default();
            format!("<title{}>{}</title>", attrs, escape_html(body))
        } else {
            format!("<!-- unsupported head tag: {} -->", escape_html(&self.name))
        }
    }
}

/// Deduplicating head element collection, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct HeadTagRegistry {
    tags: Vec<HeadTag>,
    seen: HashSet<String>,
}

impl HeadTagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag unless one with the same name and attributes exists.
    pub fn add(&mut self, tag: HeadTag) -> bool {
        let key = tag.key();
        if !self.seen.insert(key) {
            debug!(tag = %tag.name, "skipping duplicate head tag");
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn tags(&self) -> &[HeadTag] {
        &self.tags
    }

    pub fn render(&self) -> String {
        self.tags
            .iter()
            .map(HeadTag::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insertion_wins_and_order_is_kept() {
        let mut reg = HeadTagRegistry::new();
        assert!(reg.add(HeadTag::new("title").body("Page")));
        assert!(reg.add(HeadTag::new("meta").attr("charset", "utf-8")));
        assert!(!reg.add(HeadTag::new("title").body("Layout default")));
        assert!(!reg.add(HeadTag::new("meta").attr("charset", "utf-8")));

        assert_eq!(
            reg.render(),
            "<title>Page</title>\n<meta charset=\"utf-8\">"
        );
    }

    #[test]
    fn void_and_unknown_kinds() {
        let mut reg = HeadTagRegistry::new();
        reg.add(
            HeadTag::new("link")
                .attr("rel", "icon")
                .attr("href", "/favicon.ico"),
        );
        reg.add(HeadTag::new("script").attr("src", "x.js"));
        assert_eq!(
            reg.render(),
            "<link rel=\"icon\" href=\"/favicon.ico\">\n<!-- unsupported head tag: script -->"
        );
    }

    #[test]
    fn title_body_is_escaped() {
        let mut reg = HeadTagRegistry::new();
        reg.add(HeadTag::new("title").body("Fish & <Chips>"));
        assert_eq!(reg.render(), "<title>Fish &amp; &lt;Chips&gt;</title>");
    }
}
