//! Errors produced while turning an utterance into a [`Command`].
//!
//! [`Command`]: crate::Command

use parley_types::InferError;

/// Tokenization failures. User-caused; reported verbatim with position.
#[derive(Debug, thiserror::Error)]
pub enum TokenizeError {
    #[error("unterminated {quote} quote opened at byte {offset}")]
    UnterminatedQuote { quote: char, offset: usize },
}

/// Command parsing failures.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("empty input")]
    EmptyInput,

    #[error("invalid bundle:command pair: {0:?}")]
    InvalidBundleCommandPair(String),

    #[error("command name must not be empty: {0:?}")]
    EmptyCommandName(String),

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Infer(#[from] InferError),
}
