//! Rule parsing errors. All user-caused; reported verbatim.

use parley_types::InferError;

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("unterminated {quote} quote opened at byte {offset}")]
    UnterminatedQuote { quote: char, offset: usize },

    #[error("malformed rule: {0}")]
    MalformedRule(String),

    #[error("condition doesn't conform to the form A OP B: {0:?}")]
    MalformedCondition(String),

    #[error("unsupported operator: {0:?}")]
    UnsupportedOperator(String),

    #[error("unknown collection modifier: {0:?}")]
    UnknownModifier(String),

    #[error(transparent)]
    Command(#[from] parley_command::ParseError),

    #[error(transparent)]
    Infer(#[from] InferError),
}
