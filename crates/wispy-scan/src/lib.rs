//! Delimiter scanning for wispy templates.
//!
//! This crate holds the grammar-free half of the template engine: finding
//! `{% ... %}` spans in raw text, splitting tag arguments without breaking
//! quoted strings, and locating the matching close marker of a block tag
//! that may nest inside itself.
//!
//! It knows nothing about what a tag *does*. The renderer in `wispy-render`
//! drives a [`Scanner`] and hands each [`Token::Tag`] to its dispatch table.
//!
//! # Example
//!
//! ```rust
//! use wispy_scan::{Delimiters, Scanner, Token};
//!
//! let delims = Delimiters::default();
//! let tokens: Vec<_> = Scanner::new("Hi {% .name %}!", &delims).collect();
//!
//! assert_eq!(tokens[0], Token::Text("Hi "));
//! assert!(matches!(tokens[1], Token::Tag(ref tag) if tag.contents == ".name"));
//! assert_eq!(tokens[2], Token::Text("!"));
//! ```
//!
//! # Block markers
//!
//! Block tags are matched on their canonical spelling: the opening marker is
//! `{% name ` (note the trailing space) and the closing marker is
//! `{% end-name %}`. [`Delimiters::open_marker`] and
//! [`Delimiters::close_marker`] build both for the configured delimiters, and
//! [`find_closing`] pairs them up.

mod span;
mod tokens;

pub use span::{find_closing, find_top_level, Span};
pub use tokens::{
    parse_flags, parse_options, split_outside_quotes, split_respect_quotes, unquote, TagOptions,
};

use std::fmt;

/// Default opening delimiter.
pub const DEFAULT_START: &str = "{%";
/// Default closing delimiter.
pub const DEFAULT_END: &str = "%}";

/// Error returned when a delimiter pair cannot be used for scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelimiterError {
    /// One of the delimiters is the empty string.
    Empty,
    /// Start and end delimiters are identical.
    Identical(String),
}

impl fmt::Display for DelimiterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelimiterError::Empty => write!(f, "delimiters must not be empty"),
            DelimiterError::Identical(d) => {
                write!(f, "start and end delimiters must differ (both are {:?})", d)
            }
        }
    }
}

impl std::error::Error for DelimiterError {}

/// A validated start/end delimiter pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    start: String,
    end: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            start: DEFAULT_START.to_string(),
            end: DEFAULT_END.to_string(),
        }
    }
}

impl Delimiters {
    /// Creates a delimiter pair, rejecting empty or identical strings.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Result<Self, DelimiterError> {
        let start = start.into();
        let end = end.into();
        if start.is_empty() || end.is_empty() {
            return Err(DelimiterError::Empty);
        }
        if start == end {
            return Err(DelimiterError::Identical(start));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    /// Opening marker of a block tag: `{% name `.
    pub fn open_marker(&self, name: &str) -> String {
        format!("{} {} ", self.start, name)
    }

    /// Closing marker of a block tag: `{% end-name %}`.
    pub fn close_marker(&self, name: &str) -> String {
        format!("{} end-{} {}", self.start, name, self.end)
    }

    /// Argument-less marker such as `{% else %}`.
    pub fn bare_marker(&self, name: &str) -> String {
        format!("{} {} {}", self.start, name, self.end)
    }

    /// Strips the delimiters and the whitespace cut-set from a full tag span.
    ///
    /// `{%  each x in .y %}` becomes `each x in .y`.
    pub fn inner<'a>(&self, tag: &'a str) -> &'a str {
        let tag = tag.strip_prefix(self.start.as_str()).unwrap_or(tag);
        let tag = tag.strip_suffix(self.end.as_str()).unwrap_or(tag);
        tag.trim()
    }
}

/// A tag found by the [`Scanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken<'a> {
    /// Trimmed text between the delimiters.
    pub contents: &'a str,
    /// Byte offset of the start delimiter.
    pub start: usize,
    /// Byte offset just past the end delimiter.
    pub end: usize,
}

impl<'a> TagToken<'a> {
    /// Whether the contents are a variable expression (`.path | filter`).
    pub fn is_expression(&self) -> bool {
        self.contents.starts_with('.')
    }

    /// Splits the contents at the first whitespace into name and arguments.
    pub fn name_and_args(&self) -> (&'a str, &'a str) {
        match self.contents.find(char::is_whitespace) {
            Some(idx) => (&self.contents[..idx], self.contents[idx..].trim_start()),
            None => (self.contents, ""),
        }
    }
}

/// Token types produced by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Literal text to copy verbatim.
    Text(&'a str),
    /// A complete `{% ... %}` span.
    Tag(TagToken<'a>),
    /// A start delimiter with no end delimiter after it. Scanning stops here.
    Unclosed {
        /// Byte offset of the orphan start delimiter.
        position: usize,
    },
}

/// Left-to-right delimiter scanner.
///
/// The scanner yields literal text and tags in order. Tag handlers may
/// consume text past the tag itself (block bodies); the driver then calls
/// [`Scanner::seek`] to jump the cursor forward.
pub struct Scanner<'a, 'd> {
    input: &'a str,
    delims: &'d Delimiters,
    pos: usize,
    done: bool,
}

impl<'a, 'd> Scanner<'a, 'd> {
    pub fn new(input: &'a str, delims: &'d Delimiters) -> Self {
        Self {
            input,
            delims,
            pos: 0,
            done: false,
        }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor forward to `pos`.
    ///
    /// The cursor never moves backwards; a smaller position is ignored so a
    /// misbehaving handler cannot make the scan loop forever.
    pub fn seek(&mut self, pos: usize) {
        let pos = pos.min(self.input.len());
        if pos > self.pos {
            self.pos = pos;
        }
    }
}

impl<'a, 'd> Iterator for Scanner<'a, 'd> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.input.len() {
            return None;
        }

        let remaining = &self.input[self.pos..];
        let start = self.delims.start();
        let end = self.delims.end();

        let Some(open) = remaining.find(start) else {
            self.pos = self.input.len();
            return Some(Token::Text(remaining));
        };

        if open > 0 {
            self.pos += open;
            return Some(Token::Text(&remaining[..open]));
        }

        // At a start delimiter
        let after_start = start.len();
        match remaining[after_start..].find(end) {
            Some(close) => {
                let tag_end = after_start + close + end.len();
                let token = TagToken {
                    contents: self.delims.inner(&remaining[..tag_end]),
                    start: self.pos,
                    end: self.pos + tag_end,
                };
                self.pos += tag_end;
                Some(Token::Tag(token))
            }
            None => {
                self.done = true;
                Some(Token::Unclosed { position: self.pos })
            }
        }
    }
}
