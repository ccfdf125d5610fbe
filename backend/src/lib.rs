//! # Rapid - record transformations for data pipelines
//!
//! Two stateless conversions, each returning a [`ConversionResult`] envelope:
//!
//! ```text
//! ┌──────────────────┐     ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │ CSV text/base64  │────▶│   Parser    │────▶│    Table    │────▶│ [{col: val}] │
//! └──────────────────┘     └─────────────┘     └─────────────┘     └──────────────┘
//! ┌──────────────────┐     ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │ Data License JSON│────▶│   Blocks    │────▶│  Metadata   │────▶│ field records│
//! └──────────────────┘     └─────────────┘     └─────────────┘     └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rapid::{convert, standardize, ConversionRequest, ContentEncoding};
//!
//! let csv = ConversionRequest::new("a,b\n1,2").with_encoding(ContentEncoding::Plain);
//! assert!(convert(&csv).is_success);
//!
//! let dl = standardize(r#"[{"DL_REQUEST_ID": "X", "PX_LAST": "1"}]"#);
//! assert!(dl.is_success);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`models`] - Requests, results and standardized records
//! - [`parser`] - Content decoding and delimited row reading
//! - [`transform`] - Table building, CSV to JSON, standardization
//! - [`api`] - HTTP triggers and log streaming

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConvertError, ConvertResult, ServerError, ServerResult};

pub use models::{
    ContentEncoding, ConversionRequest, ConversionResult, StandardizedRecord, SUCCESS_MESSAGE,
};

pub use parser::{decode_content, read_rows, RawRow};

pub use transform::{
    build_table, convert, csv_to_json, flatten, parse_blocks, standardize, standardize_json,
    RequestBlock, Table,
};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, ServerConfig};
}
