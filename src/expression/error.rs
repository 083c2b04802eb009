//! Error types for expression translation.

use std::fmt;

/// Errors that can occur while translating expression text
#[derive(Debug, Clone, PartialEq)]
pub enum TranslateError {
    /// The text did not parse as a single expression
    InvalidExpression {
        /// Text exactly as the caller supplied it, before normalization
        text: String,
        reason: String,
    },

    /// A recognized construct with no translation
    UnsupportedConstruct(String),
}

impl TranslateError {
    pub fn invalid(text: impl Into<String>, reason: impl fmt::Display) -> Self {
        TranslateError::InvalidExpression {
            text: text.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unsupported(what: impl Into<String>) -> Self {
        TranslateError::UnsupportedConstruct(what.into())
    }
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateError::InvalidExpression { text, reason } => {
                write!(f, "Invalid expression '{}': {}", text, reason)
            }
            TranslateError::UnsupportedConstruct(what) => {
                write!(f, "Unsupported construct: {}", what)
            }
        }
    }
}

impl std::error::Error for TranslateError {}

/// Result type for translation
pub type TranslateResult<T> = Result<T, TranslateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TranslateError::invalid("[col(\"a\") >]", "Unexpected token: Eof");
        assert_eq!(
            err.to_string(),
            "Invalid expression '[col(\"a\") >]': Unexpected token: Eof"
        );

        let err = TranslateError::unsupported("binary operator %");
        assert_eq!(err.to_string(), "Unsupported construct: binary operator %");
    }
}
