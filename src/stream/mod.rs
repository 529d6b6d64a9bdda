//! Session demultiplexing.
//!
//! This module groups decoded frames into directional TCP sessions keyed by
//! the literal 4-tuple and orders each session's segments by capture time.

mod demux;
mod session;

pub use demux::{DemuxStats, Demultiplexed, Demultiplexer, demultiplex};
pub use session::{Segment, Session};
