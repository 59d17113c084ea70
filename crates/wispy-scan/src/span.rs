//! Balanced matching of same-named block tags.

/// Byte range of a marker inside the searched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Finds the close marker that balances an already-consumed open marker.
///
/// `from` is the offset just past the opening tag. Every `open` seen before a
/// candidate `close` raises the nesting depth, and a `close` seen at depth
/// zero is the match. Returns `None` when the block is never closed.
///
/// ```rust
/// use wispy_scan::find_closing;
///
/// let raw = "{% each a in .x %}{% each b in .y %}B{% end-each %}{% end-each %}tail";
/// let span = find_closing(raw, "{% each ", "{% end-each %}", 18).unwrap();
/// assert_eq!(&raw[span.end..], "tail");
/// ```
pub fn find_closing(raw: &str, open: &str, close: &str, from: usize) -> Option<Span> {
    if from > raw.len() || open.is_empty() || close.is_empty() {
        return None;
    }

    let mut depth = 0usize;
    let mut cursor = from;

    loop {
        let candidate = cursor + raw.get(cursor..)?.find(close)?;

        if let Some(rel) = raw[cursor..candidate].find(open) {
            depth += 1;
            cursor += rel + open.len();
            continue;
        }

        if depth == 0 {
            return Some(Span {
                start: candidate,
                end: candidate + close.len(),
            });
        }

        depth -= 1;
        cursor = candidate + close.len();
    }
}

/// Finds `marker` at nesting depth zero relative to `open`/`close` pairs.
///
/// Used to split an `if` body on its own `else` while ignoring the `else`
/// of nested conditionals.
pub fn find_top_level(raw: &str, open: &str, close: &str, marker: &str) -> Option<Span> {
    if marker.is_empty() {
        return None;
    }

    let mut depth = 0usize;
    let mut cursor = 0usize;

    while cursor < raw.len() {
        let rest = &raw[cursor..];
        let hits = [
            (rest.find(open), open.len(), 1i8),
            (rest.find(close), close.len(), -1i8),
            (rest.find(marker), marker.len(), 0i8),
        ];

        let Some((rel, len, kind)) = hits
            .iter()
            .filter_map(|(pos, len, kind)| pos.map(|p| (p, *len, *kind)))
            .filter(|(_, len, _)| *len > 0)
            .min_by_key(|(pos, _, _)| *pos)
        else {
            return None;
        };

        let at = cursor + rel;
        match kind {
            0 if depth == 0 => {
                return Some(Span {
                    start: at,
                    end: at + len,
                })
            }
            1 => depth += 1,
            -1 => depth = depth.saturating_sub(1),
            _ => {}
        }
        cursor = at + len;
    }

    None
}
