//! HTTP API module.
//!
//! Exposes both conversions as HTTP triggers, plus the log stream.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{router, start_server, ServerConfig};
pub use types::*;
