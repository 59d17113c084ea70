//! Property-based tests for the scanner and tokenizer.

use proptest::prelude::*;
use wispy_scan::{find_closing, split_respect_quotes, Delimiters, Scanner, Token};

// ============================================================================
// Strategies
// ============================================================================

// Text that cannot contain a delimiter.
fn plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!\n<>/]{0,60}"
}

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Delimiter-free text comes back as a single unchanged text token.
    #[test]
    fn plain_text_passes_through(text in plain_text()) {
        let delims = Delimiters::default();
        let joined: String = Scanner::new(&text, &delims)
            .map(|t| match t {
                Token::Text(s) => s.to_string(),
                other => panic!("unexpected token {:?}", other),
            })
            .collect();
        prop_assert_eq!(joined, text);
    }

    /// Concatenating text tokens and raw tag spans reproduces the input.
    #[test]
    fn scanner_covers_input(parts in prop::collection::vec((plain_text(), word()), 0..8)) {
        let mut input = String::new();
        for (text, name) in &parts {
            input.push_str(text);
            input.push_str("{% ");
            input.push_str(name);
            input.push_str(" %}");
        }

        let delims = Delimiters::default();
        let mut rebuilt = String::new();
        let mut tags = 0;
        for token in Scanner::new(&input, &delims) {
            match token {
                Token::Text(s) => rebuilt.push_str(s),
                Token::Tag(tag) => {
                    tags += 1;
                    rebuilt.push_str(&input[tag.start..tag.end]);
                }
                Token::Unclosed { .. } => prop_assert!(false, "no tag is unclosed"),
            }
        }
        prop_assert_eq!(rebuilt, input);
        prop_assert_eq!(tags, parts.len());
    }

    /// Tokens are never empty and quoted whitespace survives the split.
    #[test]
    fn tokens_never_empty(words in prop::collection::vec(word(), 0..6), quoted in "[a-z ]{0,12}") {
        let input = format!("{}  \"{}\"  ", words.join("   "), quoted);
        let tokens = split_respect_quotes(&input);

        prop_assert!(tokens.iter().all(|t| !t.is_empty()));
        let expected_quoted = format!("\"{}\"", quoted);
        prop_assert_eq!(tokens.last().copied(), Some(expected_quoted.as_str()));
        prop_assert_eq!(tokens.len(), words.len() + 1);
    }

    /// Any depth of self-nesting resolves to the outermost close marker.
    #[test]
    fn nested_blocks_match_outermost(depth in 1usize..8, body in plain_text()) {
        let open = "{% each x in .y %}";
        let close = "{% end-each %}";
        let raw = format!("{}{}{}tail", open.repeat(depth), body, close.repeat(depth));

        let span = find_closing(&raw, "{% each ", close, open.len()).unwrap();
        prop_assert_eq!(&raw[span.end..], "tail");
    }
}
