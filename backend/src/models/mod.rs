//! Domain models shared by the conversion components.
//!
//! - [`ConversionRequest`] - settings for a CSV to JSON conversion
//! - [`ContentEncoding`] - how the request content is encoded
//! - [`ConversionResult`] - success flag, message and payload envelope
//! - [`StandardizedRecord`] - one flattened Data License field

use serde::{Deserialize, Serialize};

use crate::error::ConvertResult;

/// Message carried by every successful [`ConversionResult`].
pub const SUCCESS_MESSAGE: &str = "Success";

// =============================================================================
// Content Encoding
// =============================================================================

/// Encoding of [`ConversionRequest::content`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentEncoding {
    /// Try base64 first, fall back to literal text.
    ///
    /// Literal text that is also valid base64 is decoded anyway.
    #[default]
    Auto,
    /// Content must be base64.
    Base64,
    /// Content is taken literally.
    Plain,
}

impl ContentEncoding {
    /// Parse an encoding name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "base64" | "b64" => Some(Self::Base64),
            "plain" | "text" | "utf-8" | "utf8" => Some(Self::Plain),
            _ => None,
        }
    }
}

// =============================================================================
// Conversion Request
// =============================================================================

/// Settings for one CSV to JSON conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Raw content, literal UTF-8 or base64.
    pub content: String,
    /// Field separator, may be longer than one character.
    pub delimiter: String,
    /// First retained row supplies the column names.
    pub has_header_row: bool,
    /// Raw rows discarded before parsing.
    pub skip_leading_rows: usize,
    /// Parsed rows discarded at the end.
    pub skip_trailing_rows: usize,
    /// Drop rows whose fields are all empty.
    pub ignore_blank_lines: bool,
    pub encoding: ContentEncoding,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            content: String::new(),
            delimiter: ",".to_string(),
            has_header_row: true,
            skip_leading_rows: 0,
            skip_trailing_rows: 0,
            ignore_blank_lines: true,
            encoding: ContentEncoding::Auto,
        }
    }
}

impl ConversionRequest {
    /// Create a request with default settings for the given content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_header_row(mut self, has_header_row: bool) -> Self {
        self.has_header_row = has_header_row;
        self
    }

    pub fn with_skip_leading_rows(mut self, rows: usize) -> Self {
        self.skip_leading_rows = rows;
        self
    }

    pub fn with_skip_trailing_rows(mut self, rows: usize) -> Self {
        self.skip_trailing_rows = rows;
        self
    }

    pub fn with_ignore_blank_lines(mut self, ignore: bool) -> Self {
        self.ignore_blank_lines = ignore;
        self
    }

    pub fn with_encoding(mut self, encoding: ContentEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

// =============================================================================
// Conversion Result
// =============================================================================

/// Uniform outcome of both conversion components.
///
/// `result` is empty whenever `is_success` is false.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub is_success: bool,
    pub message: String,
    pub result: String,
}

impl ConversionResult {
    pub fn success(result: String) -> Self {
        Self {
            is_success: true,
            message: SUCCESS_MESSAGE.to_string(),
            result,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            message: message.into(),
            result: String::new(),
        }
    }
}

impl From<ConvertResult<String>> for ConversionResult {
    fn from(outcome: ConvertResult<String>) -> Self {
        match outcome {
            Ok(json) => Self::success(json),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

// =============================================================================
// Standardized Record
// =============================================================================

/// One non-metadata field of a Data License request block, with the block's
/// metadata copied alongside.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StandardizedRecord {
    pub request_id: Option<String>,
    pub request_name: Option<String>,
    pub snapshot_start_time: Option<String>,
    pub snapshot_time_zone: Option<String>,
    pub identifier: Option<String>,
    #[serde(rename = "RC")]
    pub rc: Option<String>,
    pub date: Option<String>,
    pub field_mnemonic: String,
    pub value: Option<String>,
}
