use crate::errors::CliconfError;

/// Malformed configuration text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct FormatError {
    pub line: usize,
    pub message: String,
}

impl FormatError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl CliconfError for FormatError {
    fn error_code(&self) -> &'static str {
        "FORMAT_SYNTAX_ERROR"
    }

    fn is_user_error(&self) -> bool {
        true
    }
}
