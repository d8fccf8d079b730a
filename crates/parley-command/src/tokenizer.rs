//! Splits a raw chat utterance into tokens.
//!
//! Splitting happens on unescaped whitespace. Single- and double-quoted
//! segments hold together, and the quotes are *retained* in the emitted
//! token: the value inferrer downstream is responsible for stripping them
//! and resolving escape sequences, so the tokenizer never interprets
//! content. A backslash escapes the next character inside or outside quotes
//! (and is likewise retained). The literal token `--` passes through
//! verbatim; later stages read it as the end-of-options marker.

use crate::error::TokenizeError;

/// Tokenize `input` into whitespace-separated, quote-aware tokens.
///
/// Returns [`TokenizeError::UnterminatedQuote`] when a quote opened at some
/// byte offset is never closed.
pub fn tokenize(input: &str) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<(char, usize)> = None;
    let mut escaped = false;

    for (offset, c) in input.char_indices() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }

        match c {
            '\\' => {
                in_token = true;
                current.push(c);
                escaped = true;
            }
            '"' | '\'' => {
                in_token = true;
                current.push(c);
                match quote {
                    Some((q, _)) if q == c => quote = None,
                    None => quote = Some((c, offset)),
                    _ => {}
                }
            }
            c if c.is_whitespace() && quote.is_none() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }

    if let Some((quote, offset)) = quote {
        return Err(TokenizeError::UnterminatedQuote { quote, offset });
    }

    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(
            tokenize("foo:bar baz  qux").unwrap(),
            vec!["foo:bar", "baz", "qux"]
        );
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \t ").unwrap().is_empty());
    }

    #[test]
    fn quotes_hold_tokens_together_and_are_retained() {
        assert_eq!(
            tokenize(r#"echo "hello world" done"#).unwrap(),
            vec!["echo", "\"hello world\"", "done"]
        );
        assert_eq!(
            tokenize("echo 'single quoted'").unwrap(),
            vec!["echo", "'single quoted'"]
        );
    }

    #[test]
    fn nested_other_quote_kind_is_literal() {
        assert_eq!(
            tokenize(r#"say "it's fine""#).unwrap(),
            vec!["say", r#""it's fine""#]
        );
    }

    #[test]
    fn backslash_escapes_whitespace() {
        assert_eq!(tokenize(r"one\ token").unwrap(), vec![r"one\ token"]);
    }

    #[test]
    fn backslash_escapes_quote() {
        assert_eq!(
            tokenize(r#"say \"not-a-quote"#).unwrap(),
            vec!["say", r#"\"not-a-quote"#]
        );
    }

    #[test]
    fn double_dash_is_a_verbatim_token() {
        assert_eq!(
            tokenize("deploy:run -v -- --not-an-option").unwrap(),
            vec!["deploy:run", "-v", "--", "--not-an-option"]
        );
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = tokenize(r#"echo "oops"#).unwrap_err();
        match err {
            TokenizeError::UnterminatedQuote { quote, offset } => {
                assert_eq!(quote, '"');
                assert_eq!(offset, 5);
            }
        }
    }
}
