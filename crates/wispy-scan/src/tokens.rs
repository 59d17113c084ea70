//! Quote-aware argument splitting shared by every tag and the filter pipeline.

/// Splits on runs of ASCII whitespace, keeping quoted runs together.
///
/// `"` and `'` open a quoted run closed by the same character. Quote
/// characters stay in the token, empty tokens are never produced, and an
/// unterminated quote runs to the end of the input.
///
/// ```rust
/// use wispy_scan::split_respect_quotes;
///
/// assert_eq!(
///     split_respect_quotes(r#"truncate "a b"  'c'"#),
///     vec!["truncate", "\"a b\"", "'c'"]
/// );
/// ```
pub fn split_respect_quotes(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut token_start: Option<usize> = None;
    let mut quote: Option<char> = None;

    for (idx, ch) in input.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch.is_ascii_whitespace() => {
                if let Some(start) = token_start.take() {
                    tokens.push(&input[start..idx]);
                }
            }
            None => {
                if token_start.is_none() {
                    token_start = Some(idx);
                }
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                }
            }
        }
    }

    if let Some(start) = token_start {
        tokens.push(&input[start..]);
    }
    tokens
}

/// Splits on `sep` wherever it occurs outside quotes. Pieces are trimmed.
pub fn split_outside_quotes(input: &str, sep: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut quote: Option<char> = None;
    let mut last = 0;

    for (idx, ch) in input.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == sep => {
                pieces.push(input[last..idx].trim());
                last = idx + ch.len_utf8();
            }
            None => {}
        }
    }
    pieces.push(input[last..].trim());
    pieces
}

/// Strips one matching pair of surrounding `"` or `'`.
pub fn unquote(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Tag options parsed from `positional key=value flag` argument lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagOptions {
    positional: Option<String>,
    pairs: Vec<(String, String)>,
    flags: Vec<String>,
}

impl TagOptions {
    /// The first bare token, unquoted.
    pub fn positional(&self) -> Option<&str> {
        self.positional.as_deref()
    }

    /// Value of the first `key=value` pair with this key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a bare flag was given, either standalone or as `flag=true`.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f == name) || self.get(name) == Some("true")
    }

    /// All `key=value` pairs in source order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }
}

/// Classifies tokens as positional, `key=value`, or flag.
///
/// A token is a pair when it contains `=` before any quote character and the
/// key is non-empty.
pub fn parse_options<'a, I>(tokens: I) -> TagOptions
where
    I: IntoIterator<Item = &'a str>,
{
    classify(tokens, true)
}

/// Like [`parse_options`] for tags that take no positional argument: every
/// bare token is a flag.
pub fn parse_flags<'a, I>(tokens: I) -> TagOptions
where
    I: IntoIterator<Item = &'a str>,
{
    classify(tokens, false)
}

fn classify<'a, I>(tokens: I, positional: bool) -> TagOptions
where
    I: IntoIterator<Item = &'a str>,
{
    let mut opts = TagOptions::default();

    for token in tokens {
        let quote_at = token.find(['"', '\'']).unwrap_or(token.len());
        match token.find('=') {
            Some(eq) if eq > 0 && eq < quote_at => {
                let key = &token[..eq];
                let value = unquote(&token[eq + 1..]);
                opts.pairs.push((key.to_string(), value.to_string()));
            }
            _ if positional && opts.positional.is_none() => {
                opts.positional = Some(unquote(token).to_string());
            }
            _ => opts.flags.push(unquote(token).to_string()),
        }
    }

    opts
}
