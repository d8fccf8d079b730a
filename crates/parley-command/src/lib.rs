//! Chat-utterance tokenization and command parsing.
//!
//! The pipeline is `tokenize` -> `parse`: an input line like
//! `deploy:rollout -f --region=us-east-1 -- web api` becomes a typed
//! [`Command`] with inferred option values and positional parameters. Both
//! stages are pure functions; errors are user-caused and reported verbatim.

pub mod error;
pub mod parser;
pub mod tokenizer;

pub use error::{ParseError, TokenizeError};
pub use parser::{parse, split_command, tokenize_and_parse, Command, ParseOptions};
pub use tokenizer::tokenize;
