//! Transformation module.
//!
//! - Table: ordered-column table and its JSON encoding
//! - CSV to JSON: delimited text to an array of row objects
//! - Standardize: Data License responses to one record per field

pub mod csv_to_json;
pub mod standardize;
pub mod table;

pub use csv_to_json::{build_table, convert, csv_to_json};
pub use standardize::{flatten, parse_blocks, standardize, standardize_json, RequestBlock};
pub use table::Table;
