//! HTTP record handling.
//!
//! This module splits reassembled session payloads into records and reads
//! request/status lines and headers back out of them.

mod parser;
mod records;

pub use parser::{
    RequestLine, StatusLine, header, request_line, request_url, status_line, unfold_headers,
};
pub use records::{ProtocolRecord, split_records};
