//! Flatten Data License request responses into one record per field.
//!
//! A response is an array of request blocks, each block a JSON object of
//! mnemonic → value pairs. Seven mnemonics describe the request itself; every
//! other mnemonic becomes a [`StandardizedRecord`] carrying that metadata.
//!
//! ```text
//! [{ "DL_REQUEST_ID": "X", "IDENTIFIER": "AAPL", "PX_LAST": "1", "PX_OPEN": "2" }]
//!                                   │
//!                                   ▼
//! [{ RequestId: X, Identifier: AAPL, FieldMnemonic: PX_LAST, Value: 1 },
//!  { RequestId: X, Identifier: AAPL, FieldMnemonic: PX_OPEN, Value: 2 }]
//! ```

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;
use std::fmt;

use crate::api::logs::{log_error, log_info, log_success};
use crate::error::{ConvertError, ConvertResult};
use crate::models::{ConversionResult, StandardizedRecord};

pub const DL_REQUEST_ID: &str = "DL_REQUEST_ID";
pub const DL_REQUEST_NAME: &str = "DL_REQUEST_NAME";
pub const DL_SNAPSHOT_START_TIME: &str = "DL_SNAPSHOT_START_TIME";
pub const DL_SNAPSHOT_TZ: &str = "DL_SNAPSHOT_TZ";
pub const IDENTIFIER: &str = "IDENTIFIER";
pub const RC: &str = "RC";
pub const DATE: &str = "DATE";
pub const LAST_UPDATE_DT: &str = "LAST_UPDATE_DT";

/// Mnemonics that describe the request rather than carry data.
pub const METADATA_MNEMONICS: [&str; 7] = [
    DL_REQUEST_ID,
    DL_REQUEST_NAME,
    DL_SNAPSHOT_START_TIME,
    DL_SNAPSHOT_TZ,
    IDENTIFIER,
    RC,
    DATE,
];

/// Reported when the input is JSON `null` (or blank).
pub const DESERIALIZE_FAILED: &str = "Failed to deserialize JSON string.";
/// Reported when the input is an empty array.
pub const PARSE_FAILED: &str = "Failed to parse JSON string";

/// Case-insensitive membership in [`METADATA_MNEMONICS`].
pub fn is_metadata(mnemonic: &str) -> bool {
    METADATA_MNEMONICS
        .iter()
        .any(|m| m.eq_ignore_ascii_case(mnemonic))
}

// =============================================================================
// Request Blocks
// =============================================================================

/// One request block: mnemonic/value pairs in document order.
///
/// Repeated keys are kept; lookups take the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestBlock {
    pub pairs: Vec<(String, Option<String>)>,
}

impl RequestBlock {
    /// Value of the first pair whose mnemonic matches, ignoring ASCII case.
    pub fn lookup(&self, mnemonic: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(mnemonic))
            .and_then(|(_, value)| value.as_deref())
    }
}

impl<'de> Deserialize<'de> for RequestBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BlockVisitor;

        impl<'de> Visitor<'de> for BlockVisitor {
            type Value = RequestBlock;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of mnemonic/value pairs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RequestBlock, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((mnemonic, value)) = map.next_entry::<String, Value>()? {
                    let value = scalar_text(&mnemonic, value).map_err(de::Error::custom)?;
                    pairs.push((mnemonic, value));
                }
                Ok(RequestBlock { pairs })
            }
        }

        deserializer.deserialize_map(BlockVisitor)
    }
}

/// Scalars become text; nested values are rejected.
fn scalar_text(mnemonic: &str, value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err(format!(
            "mnemonic '{}' has a nested value, expected a string or null",
            mnemonic
        )),
    }
}

// =============================================================================
// Block Metadata
// =============================================================================

/// Metadata resolved once per block and copied into each emitted record.
#[derive(Debug, Clone, Copy, Default)]
struct BlockMetadata<'a> {
    request_id: Option<&'a str>,
    request_name: Option<&'a str>,
    snapshot_start_time: Option<&'a str>,
    snapshot_time_zone: Option<&'a str>,
    identifier: Option<&'a str>,
    rc: Option<&'a str>,
    /// `DATE` when non-empty, else `DL_SNAPSHOT_START_TIME`.
    date: Option<&'a str>,
    // Looked up but never emitted.
    #[allow(dead_code)]
    last_update_date: Option<&'a str>,
}

impl<'a> BlockMetadata<'a> {
    fn resolve(block: &'a RequestBlock) -> Self {
        let snapshot_start_time = block.lookup(DL_SNAPSHOT_START_TIME);
        let date = block
            .lookup(DATE)
            .filter(|d| !d.is_empty())
            .or(snapshot_start_time);

        Self {
            request_id: block.lookup(DL_REQUEST_ID),
            request_name: block.lookup(DL_REQUEST_NAME),
            snapshot_start_time,
            snapshot_time_zone: block.lookup(DL_SNAPSHOT_TZ),
            identifier: block.lookup(IDENTIFIER),
            rc: block.lookup(RC),
            date,
            last_update_date: block.lookup(LAST_UPDATE_DT),
        }
    }

    fn record(&self, mnemonic: &str, value: Option<&str>) -> StandardizedRecord {
        StandardizedRecord {
            request_id: self.request_id.map(String::from),
            request_name: self.request_name.map(String::from),
            snapshot_start_time: self.snapshot_start_time.map(String::from),
            snapshot_time_zone: self.snapshot_time_zone.map(String::from),
            identifier: self.identifier.map(String::from),
            rc: self.rc.map(String::from),
            date: self.date.map(String::from),
            field_mnemonic: mnemonic.to_string(),
            value: value.map(String::from),
        }
    }
}

// =============================================================================
// Standardization
// =============================================================================

/// Standardize a Data License JSON response.
///
/// Never fails: errors are reported through the returned envelope.
pub fn standardize(json: &str) -> ConversionResult {
    log_info(format!("Standardizing {} bytes of request data", json.len()));

    let result = ConversionResult::from(standardize_json(json));
    if !result.is_success {
        log_error(&result.message);
    }
    result
}

/// Same as [`standardize`] but returns the error instead of an envelope.
pub fn standardize_json(json: &str) -> ConvertResult<String> {
    let blocks = parse_blocks(json)?;
    let records = flatten(&blocks);

    log_success(format!(
        "{} request blocks -> {} field records",
        blocks.len(),
        records.len()
    ));

    serde_json::to_string_pretty(&records).map_err(ConvertError::Serialization)
}

/// Parse the response into request blocks.
pub fn parse_blocks(json: &str) -> ConvertResult<Vec<RequestBlock>> {
    if json.trim().is_empty() {
        return Err(ConvertError::EmptyInput(DESERIALIZE_FAILED));
    }

    let blocks: Option<Vec<RequestBlock>> =
        serde_json::from_str(json).map_err(ConvertError::InvalidJson)?;

    match blocks {
        None => Err(ConvertError::EmptyInput(DESERIALIZE_FAILED)),
        Some(blocks) if blocks.is_empty() => Err(ConvertError::EmptyInput(PARSE_FAILED)),
        Some(blocks) => Ok(blocks),
    }
}

/// One record per non-metadata pair, in block order then pair order.
pub fn flatten(blocks: &[RequestBlock]) -> Vec<StandardizedRecord> {
    blocks
        .iter()
        .flat_map(|block| {
            let metadata = BlockMetadata::resolve(block);
            block
                .pairs
                .iter()
                .filter(|(mnemonic, _)| !is_metadata(mnemonic))
                .map(move |(mnemonic, value)| metadata.record(mnemonic, value.as_deref()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(json: &str) -> Vec<StandardizedRecord> {
        let result = standardize(json);
        assert!(result.is_success, "standardize failed: {}", result.message);
        assert_eq!(result.message, "Success");
        serde_json::from_str(&result.result).unwrap()
    }

    #[test]
    fn test_one_record_per_field() {
        let out = records(r#"[{"DL_REQUEST_ID": "X", "FOO": "1", "BAR": "2"}]"#);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].request_id.as_deref(), Some("X"));
        assert_eq!(out[0].field_mnemonic, "FOO");
        assert_eq!(out[0].value.as_deref(), Some("1"));
        assert_eq!(out[1].request_id.as_deref(), Some("X"));
        assert_eq!(out[1].field_mnemonic, "BAR");
        assert_eq!(out[1].value.as_deref(), Some("2"));
    }

    #[test]
    fn test_metadata_copied_into_every_record() {
        let out = records(
            r#"[{
                "DL_REQUEST_ID": "id-1",
                "DL_REQUEST_NAME": "daily",
                "DL_SNAPSHOT_START_TIME": "2020-01-01T06:00:00",
                "DL_SNAPSHOT_TZ": "Europe/London",
                "IDENTIFIER": "AAPL US Equity",
                "RC": "0",
                "DATE": "2020-01-02",
                "PX_LAST": "300.35"
            }]"#,
        );

        assert_eq!(out.len(), 1);
        let record = &out[0];
        assert_eq!(record.request_name.as_deref(), Some("daily"));
        assert_eq!(record.snapshot_start_time.as_deref(), Some("2020-01-01T06:00:00"));
        assert_eq!(record.snapshot_time_zone.as_deref(), Some("Europe/London"));
        assert_eq!(record.identifier.as_deref(), Some("AAPL US Equity"));
        assert_eq!(record.rc.as_deref(), Some("0"));
        assert_eq!(record.date.as_deref(), Some("2020-01-02"));
        assert_eq!(record.field_mnemonic, "PX_LAST");
    }

    #[test]
    fn test_empty_date_falls_back_to_snapshot_time() {
        let out = records(
            r#"[{"DATE": "", "DL_SNAPSHOT_START_TIME": "2020-01-01", "A": "1", "B": "2"}]"#,
        );
        assert!(out.iter().all(|r| r.date.as_deref() == Some("2020-01-01")));
    }

    #[test]
    fn test_null_date_falls_back_to_snapshot_time() {
        let out = records(r#"[{"DATE": null, "DL_SNAPSHOT_START_TIME": "2021-06-30", "A": "1"}]"#);
        assert_eq!(out[0].date.as_deref(), Some("2021-06-30"));
    }

    #[test]
    fn test_mnemonics_match_case_insensitively() {
        let out = records(r#"[{"dl_request_id": "X", "Rc": "9", "FOO": "1"}]"#);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].request_id.as_deref(), Some("X"));
        assert_eq!(out[0].rc.as_deref(), Some("9"));
    }

    #[test]
    fn test_first_duplicate_metadata_wins() {
        let out = records(r#"[{"DL_REQUEST_ID": "first", "dl_request_id": "second", "FOO": "1"}]"#);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].request_id.as_deref(), Some("first"));
    }

    #[test]
    fn test_last_update_dt_is_a_data_field() {
        let out = records(r#"[{"LAST_UPDATE_DT": "2020-01-01", "FOO": "1"}]"#);
        let mnemonics: Vec<_> = out.iter().map(|r| r.field_mnemonic.as_str()).collect();
        assert_eq!(mnemonics, ["LAST_UPDATE_DT", "FOO"]);
    }

    #[test]
    fn test_blocks_keep_their_own_metadata() {
        let out = records(
            r#"[
                {"IDENTIFIER": "A", "PX": "1"},
                {"IDENTIFIER": "B", "PX": "2", "VOL": "3"}
            ]"#,
        );
        let summary: Vec<_> = out
            .iter()
            .map(|r| (r.identifier.as_deref(), r.field_mnemonic.as_str()))
            .collect();
        assert_eq!(
            summary,
            [(Some("A"), "PX"), (Some("B"), "PX"), (Some("B"), "VOL")]
        );
    }

    #[test]
    fn test_missing_metadata_and_null_values() {
        let result = standardize(r#"[{"FOO": null}]"#);
        let value: serde_json::Value = serde_json::from_str(&result.result).unwrap();
        assert_eq!(
            value,
            json!([{
                "RequestId": null,
                "RequestName": null,
                "SnapshotStartTime": null,
                "SnapshotTimeZone": null,
                "Identifier": null,
                "RC": null,
                "Date": null,
                "FieldMnemonic": "FOO",
                "Value": null
            }])
        );
    }

    #[test]
    fn test_scalar_values_become_text() {
        let out = records(r#"[{"PX": 12.5, "FLAG": true}]"#);
        assert_eq!(out[0].value.as_deref(), Some("12.5"));
        assert_eq!(out[1].value.as_deref(), Some("true"));
    }

    #[test]
    fn test_metadata_only_block_yields_empty_array() {
        let result = standardize(r#"[{"DL_REQUEST_ID": "X"}]"#);
        assert!(result.is_success);
        assert_eq!(result.result, "[]");
    }

    #[test]
    fn test_null_input() {
        let result = standardize("null");
        assert!(!result.is_success);
        assert_eq!(result.message, DESERIALIZE_FAILED);
        assert!(result.result.is_empty());
    }

    #[test]
    fn test_blank_input() {
        let result = standardize("  ");
        assert_eq!(result.message, "Failed to deserialize JSON string.");
    }

    #[test]
    fn test_empty_array() {
        let result = standardize("[]");
        assert!(!result.is_success);
        assert_eq!(result.message, "Failed to parse JSON string");
        assert!(result.result.is_empty());
    }

    #[test]
    fn test_malformed_json() {
        let result = standardize(r#"[{"FOO": "1"}"#);
        assert!(!result.is_success);
        assert!(result.message.starts_with("Invalid JSON input"));
    }

    #[test]
    fn test_nested_value_rejected() {
        let result = standardize(r#"[{"FOO": {"x": 1}}]"#);
        assert!(!result.is_success);
        assert!(result.message.contains("mnemonic 'FOO'"));
    }

    #[test]
    fn test_is_metadata() {
        assert!(is_metadata("date"));
        assert!(is_metadata("DL_SNAPSHOT_TZ"));
        assert!(!is_metadata("LAST_UPDATE_DT"));
        assert!(!is_metadata("PX_LAST"));
    }
}
