//! Content decoding and delimited row reading.
//!
//! Turns the raw request content into text (base64 or literal) and splits it
//! into rows of fields. No column or header logic here.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{ConvertError, ConvertResult};
use crate::models::ContentEncoding;

/// One row of delimited text as read, before any header handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line on which the row starts.
    pub line: usize,
    pub fields: Vec<String>,
}

impl RawRow {
    /// A row is blank when every field is empty: an empty line, `,,` or `""`.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(String::is_empty)
    }
}

/// Decode request content into text.
///
/// `Auto` tries base64 first and falls back to the literal content when the
/// content is not valid base64. Bytes are read as UTF-8 with BOM sniffing;
/// invalid sequences are replaced rather than rejected.
pub fn decode_content(content: &str, encoding: ContentEncoding) -> ConvertResult<String> {
    match encoding {
        ContentEncoding::Plain => Ok(decode_text(content.as_bytes())),
        ContentEncoding::Base64 => {
            let bytes = decode_base64(content)
                .map_err(|e| ConvertError::Decode(format!("content is not valid base64: {}", e)))?;
            Ok(decode_text(&bytes))
        }
        ContentEncoding::Auto => match decode_base64(content) {
            Ok(bytes) => Ok(decode_text(&bytes)),
            Err(_) => Ok(decode_text(content.as_bytes())),
        },
    }
}

/// Standard alphabet, canonical padding. ASCII whitespace between groups is
/// ignored.
fn decode_base64(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = content
        .chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '\r' | '\n'))
        .collect();
    STANDARD.decode(compact)
}

fn decode_text(bytes: &[u8]) -> String {
    let (text, _, _) = encoding_rs::UTF_8.decode(bytes);
    text.into_owned()
}

/// Split text into rows using `delimiter` and double-quote quoting.
///
/// Quoted fields may contain the delimiter, line breaks and `""` escapes.
/// `\n`, `\r\n` and `\r` end a row. An empty line yields a row with one empty
/// field; a trailing line break does not yield an extra row.
pub fn read_rows(text: &str, delimiter: &str) -> ConvertResult<Vec<RawRow>> {
    if delimiter.is_empty() {
        return Err(ConvertError::parse(1, "delimiter must not be empty"));
    }
    if delimiter.contains(['"', '\r', '\n']) {
        return Err(ConvertError::parse(
            1,
            format!("delimiter {:?} must not contain quotes or line breaks", delimiter),
        ));
    }

    let mut rows = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();

    let mut line = 1;
    let mut row_line = 1;
    let mut quote_line = 1;
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut row_started = false;

    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if in_quotes {
            if ch == '"' {
                if rest[1..].starts_with('"') {
                    field.push('"');
                    rest = &rest[2..];
                } else {
                    in_quotes = false;
                    rest = &rest[1..];
                }
                continue;
            }
            if ch == '\n' || (ch == '\r' && !rest[1..].starts_with('\n')) {
                line += 1;
            }
            field.push(ch);
            rest = &rest[ch.len_utf8()..];
            continue;
        }

        if rest.starts_with(delimiter) {
            fields.push(std::mem::take(&mut field));
            rest = &rest[delimiter.len()..];
            at_field_start = true;
            row_started = true;
            continue;
        }

        match ch {
            '\r' | '\n' => {
                fields.push(std::mem::take(&mut field));
                rows.push(RawRow {
                    line: row_line,
                    fields: std::mem::take(&mut fields),
                });
                rest = if rest.starts_with("\r\n") { &rest[2..] } else { &rest[1..] };
                line += 1;
                row_line = line;
                at_field_start = true;
                row_started = false;
            }
            '"' if at_field_start => {
                in_quotes = true;
                quote_line = line;
                at_field_start = false;
                row_started = true;
                rest = &rest[1..];
            }
            _ => {
                field.push(ch);
                at_field_start = false;
                row_started = true;
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    if in_quotes {
        return Err(ConvertError::parse(quote_line, "unterminated quoted field"));
    }
    if row_started {
        fields.push(field);
        rows.push(RawRow {
            line: row_line,
            fields,
        });
    }

    Ok(rows)
}
