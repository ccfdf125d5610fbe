//! HTTP request bodies and response mapping.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{ContentEncoding, ConversionRequest, ConversionResult};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Answer for a CSV request without content.
pub const MISSING_CONTENT_MESSAGE: &str =
    "No value for the fileContent query string parameter provided.";

/// Body of `/api/CsvToJson`.
///
/// Every field is optional; absent and `null` fields take the default of
/// [`ConversionRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvToJsonRequestBody {
    #[serde(default)]
    pub file_content: Option<String>,
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub has_column_headers: Option<bool>,
    #[serde(default)]
    pub remove_top_rows: Option<i64>,
    #[serde(default)]
    pub remove_bottom_rows: Option<i64>,
    #[serde(default)]
    pub ignore_blank_lines: Option<bool>,
    #[serde(default)]
    pub content_encoding: Option<ContentEncoding>,
}

impl CsvToJsonRequestBody {
    /// Build conversion settings. Negative row counts mean zero.
    pub fn into_request(self) -> ConversionRequest {
        let defaults = ConversionRequest::default();
        ConversionRequest {
            content: self.file_content.unwrap_or_default(),
            delimiter: self.delimiter.unwrap_or(defaults.delimiter),
            has_header_row: self.has_column_headers.unwrap_or(defaults.has_header_row),
            skip_leading_rows: row_count(self.remove_top_rows),
            skip_trailing_rows: row_count(self.remove_bottom_rows),
            ignore_blank_lines: self.ignore_blank_lines.unwrap_or(defaults.ignore_blank_lines),
            encoding: self.content_encoding.unwrap_or(defaults.encoding),
        }
    }
}

fn row_count(value: Option<i64>) -> usize {
    value.map_or(0, |n| usize::try_from(n).unwrap_or(0))
}

/// Success → 200 with the payload verbatim; failure → 400 with the message.
pub fn conversion_response(result: ConversionResult) -> Response {
    if result.is_success {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
            result.result,
        )
            .into_response()
    } else {
        text_response(StatusCode::BAD_REQUEST, result.message)
    }
}

/// Plain-text response used for every error answer.
pub fn text_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
        message.into(),
    )
        .into_response()
}

/// Payload of `/health`.
pub fn health_payload() -> Value {
    json!({
        "status": "ok",
        "service": "rapid",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "csvToJson": "GET|POST /api/CsvToJson",
            "standardize": "GET|POST /api/StandardizeJsonDataRequest",
            "logs": "GET /api/logs (SSE)"
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_defaults() {
        let body: CsvToJsonRequestBody = serde_json::from_str(r#"{"fileContent": "a,b"}"#).unwrap();
        let request = body.into_request();

        assert_eq!(request, ConversionRequest::new("a,b"));
    }

    #[test]
    fn test_body_nulls_take_defaults() {
        let body: CsvToJsonRequestBody = serde_json::from_str(
            r#"{"fileContent": "x", "delimiter": null, "hasColumnHeaders": null, "ignoreBlankLines": null}"#,
        )
        .unwrap();
        let request = body.into_request();

        assert_eq!(request.delimiter, ",");
        assert!(request.has_header_row);
        assert!(request.ignore_blank_lines);
    }

    #[test]
    fn test_body_full() {
        let body: CsvToJsonRequestBody = serde_json::from_str(
            r#"{
                "fileContent": "YSxi",
                "delimiter": ";",
                "hasColumnHeaders": false,
                "removeTopRows": 2,
                "removeBottomRows": 1,
                "ignoreBlankLines": false,
                "contentEncoding": "base64"
            }"#,
        )
        .unwrap();
        let request = body.into_request();

        assert_eq!(request.delimiter, ";");
        assert!(!request.has_header_row);
        assert_eq!(request.skip_leading_rows, 2);
        assert_eq!(request.skip_trailing_rows, 1);
        assert!(!request.ignore_blank_lines);
        assert_eq!(request.encoding, ContentEncoding::Base64);
    }

    #[test]
    fn test_negative_row_counts_are_zero() {
        let body: CsvToJsonRequestBody =
            serde_json::from_str(r#"{"removeTopRows": -3, "removeBottomRows": -1}"#).unwrap();
        let request = body.into_request();

        assert_eq!(request.skip_leading_rows, 0);
        assert_eq!(request.skip_trailing_rows, 0);
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let parsed = serde_json::from_str::<CsvToJsonRequestBody>(r#"{"contentEncoding": "gzip"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_response_mapping() {
        let ok = conversion_response(ConversionResult::success("[]".into()));
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(ok.headers()[header::CONTENT_TYPE], JSON_CONTENT_TYPE);

        let bad = conversion_response(ConversionResult::failure("nope"));
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(bad.headers()[header::CONTENT_TYPE], TEXT_CONTENT_TYPE);
    }
}
