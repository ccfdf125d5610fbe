//! Delimited text to tabular JSON.
//!
//! ```text
//! content ──decode──▶ text ──read_rows──▶ raw rows ──skip/filter──▶ rows
//!    rows ──header──▶ Table ──serialize──▶ [{"col": "value", ...}, ...]
//! ```

use crate::api::logs::{log_error, log_info, log_info_indent, log_success};
use crate::error::{ConvertError, ConvertResult};
use crate::models::{ConversionRequest, ConversionResult};
use crate::parser::{decode_content, read_rows, RawRow};

use super::table::Table;

/// Convert delimited text into a pretty-printed JSON array of row objects.
///
/// Never fails: errors are reported through the returned envelope.
///
/// # Example
/// ```
/// use rapid::{convert, ConversionRequest, ContentEncoding};
///
/// let request = ConversionRequest::new("a,b\n1,2\n3,4").with_encoding(ContentEncoding::Plain);
/// let result = convert(&request);
///
/// assert!(result.is_success);
/// let rows: serde_json::Value = serde_json::from_str(&result.result).unwrap();
/// assert_eq!(rows[1]["b"], "4");
/// ```
pub fn convert(request: &ConversionRequest) -> ConversionResult {
    log_info(format!(
        "Converting {} bytes of delimited content (delimiter {:?})",
        request.content.len(),
        request.delimiter
    ));

    let result = ConversionResult::from(csv_to_json(request));
    if !result.is_success {
        log_error(&result.message);
    }
    result
}

/// Same as [`convert`] but returns the error instead of an envelope.
pub fn csv_to_json(request: &ConversionRequest) -> ConvertResult<String> {
    let table = build_table(request)?;

    log_success(format!(
        "{} rows x {} columns",
        table.len(),
        table.columns().len()
    ));
    for (i, column) in table.columns().iter().enumerate() {
        log_info_indent(format!("[{:2}] {}", i + 1, column), 1);
    }

    serde_json::to_string_pretty(&table).map_err(ConvertError::Serialization)
}

/// Decode, split, trim and load the request content into a [`Table`].
pub fn build_table(request: &ConversionRequest) -> ConvertResult<Table> {
    let text = decode_content(&request.content, request.encoding)?;
    let rows = select_rows(read_rows(&text, &request.delimiter)?, request)?;

    let mut rows = rows.into_iter();
    let header = if request.has_header_row {
        rows.next().map(|row| row.fields)
    } else {
        None
    };

    let mut table = Table::new();
    for row in rows {
        let line = row.line;
        match &header {
            Some(names) => {
                let mut values = row.fields.into_iter();
                let cells = names
                    .iter()
                    .map(|name| (name.clone(), values.next().unwrap_or_default()))
                    .collect::<Vec<_>>();
                table.push_row(line, cells)?;
            }
            None => {
                let cells = row
                    .fields
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| (positional_name(i), value));
                table.push_row(line, cells)?;
            }
        }
    }

    Ok(table)
}

/// Apply blank-row filtering, leading skip and trailing skip, in that order.
///
/// Ignored blank rows never count toward either skip. When blank rows are
/// kept, they are counted like any other row.
fn select_rows(raw: Vec<RawRow>, request: &ConversionRequest) -> ConvertResult<Vec<RawRow>> {
    let mut rows: Vec<RawRow> = raw
        .into_iter()
        .filter(|row| !(request.ignore_blank_lines && row.is_blank()))
        .skip(request.skip_leading_rows)
        .collect();

    let keep = rows
        .len()
        .checked_sub(request.skip_trailing_rows)
        .ok_or_else(|| {
            ConvertError::parse(
                rows.last().map_or(1, |row| row.line),
                format!(
                    "cannot remove {} trailing rows, only {} rows remain",
                    request.skip_trailing_rows,
                    rows.len()
                ),
            )
        })?;
    rows.truncate(keep);

    Ok(rows)
}

/// Column name for the `index`-th field of a headerless row.
fn positional_name(index: usize) -> String {
    format!("Field{}", index + 1)
}
