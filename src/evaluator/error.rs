use crate::parser::ExpressionError;

/// Failure while evaluating a description expression. The messages read like
/// the errors an author would see in a browser console.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("SyntaxError: {0}")]
    Syntax(#[from] ExpressionError),
    #[error("ReferenceError: {name} is not defined")]
    UndefinedIdentifier { name: String },
    #[error("TypeError: Cannot read properties of null (reading '{property}')")]
    NullProperty { property: String },
    #[error("TypeError: {name} is not a function")]
    UnknownFunction { name: String },
    #[error("TypeError: {receiver}.{method} is not a function")]
    UnknownMethod { receiver: String, method: String },
    #[error("TypeError: {message}")]
    TypeError { message: String },
}
