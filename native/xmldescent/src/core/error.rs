//! Syntax error diagnostics

/// A fatal grammar violation, located by line and column
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("XML syntax error at line {line}, column {column} of {source_name}: expecting {expected}, but encountered '{actual}'")]
pub struct SyntaxError {
    /// The offending token, or "end of input"
    pub actual: String,
    /// What would have been accepted
    pub expected: String,
    /// 1-based column
    pub column: usize,
    /// Name of the source being parsed
    pub source_name: String,
    /// 1-based line
    pub line: usize,
}

impl SyntaxError {
    pub fn new(
        actual: impl Into<String>,
        expected: impl Into<String>,
        column: usize,
        source_name: impl Into<String>,
        line: usize,
    ) -> Self {
        SyntaxError {
            actual: actual.into(),
            expected: expected.into(),
            column,
            source_name: source_name.into(),
            line,
        }
    }
}

/// Failure to turn raw input bytes into a document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}
