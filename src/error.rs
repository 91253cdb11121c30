use std::path::PathBuf;

/// Why a macro body did not classify as a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Reason {
    #[error("digit out of range for the literal's radix")]
    MalformedDigit,
    #[error("suffix or operand type conflicts with the operation")]
    SuffixConflict,
    #[error("identifier does not name a valid earlier definition")]
    UnknownIdentifier,
    #[error("string segments have irreconcilable encodings")]
    EncodingMismatch,
    #[error("macro body is empty")]
    EmptyBody,
    #[error("function-like macro cannot be evaluated without arguments")]
    ParameterizedMacro,
    #[error("body is not a literal expression")]
    Syntax,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("integer literal does not fit in 64 bits")]
    Overflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("operand type not allowed here")]
    TypeMismatch,
    #[error("expression nested too deeply")]
    NestingTooDeep,
}

/// Errors from loading a macro table, as opposed to classifying its entries.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
