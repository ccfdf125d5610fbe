//! Error types for the Rapid conversion components.
//!
//! - [`ConvertError`] - failures inside the CSV converter and the JSON standardizer
//! - [`ServerError`] - HTTP layer failures
//!
//! Conversion errors never escape a component: they are turned into a failed
//! [`crate::models::ConversionResult`] whose message is the error's `Display`.

use thiserror::Error;

// =============================================================================
// Conversion Errors
// =============================================================================

/// Errors raised while decoding, parsing or serializing a conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Content cannot be interpreted as text in the requested encoding.
    #[error("Failed to decode content: {0}")]
    Decode(String),

    /// Malformed delimited text.
    #[error("Invalid delimited content at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Malformed JSON input.
    #[error("Invalid JSON input: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Input deserialized to nothing usable. The message is reported verbatim.
    #[error("{0}")]
    EmptyInput(&'static str),

    /// Output encoding failure.
    #[error("Failed to serialize result: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl ConvertError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket bind or serve failure.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for conversion steps.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_format() {
        let err = ConvertError::parse(3, "unterminated quoted field");
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("unterminated quoted field"));
    }

    #[test]
    fn test_empty_input_is_verbatim() {
        let err = ConvertError::EmptyInput("Failed to parse JSON string");
        assert_eq!(err.to_string(), "Failed to parse JSON string");
    }

    #[test]
    fn test_json_error_keeps_source_text() {
        let source = serde_json::from_str::<serde_json::Value>("[1,").unwrap_err();
        let expected = source.to_string();
        let err = ConvertError::InvalidJson(source);
        assert!(err.to_string().contains(&expected));
    }
}
