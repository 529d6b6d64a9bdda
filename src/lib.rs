#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod capture;
pub mod config;
pub mod conversation;
pub mod dns;
pub mod error;
pub mod http;
pub mod packet;
pub mod stream;

pub use capture::{CaptureFile, CaptureStats, read_capture};
pub use config::Config;
pub use conversation::{Conversation, ConversationId, Report, reassemble, summarize};
pub use error::Error;
pub use packet::{Frame, SessionKey};
pub use stream::{Session, demultiplex};

use std::path::Path;

/// Run the whole pipeline over frames already in memory.
pub fn analyze(frames: Vec<Frame>, config: &Config) -> Report {
    // Counted over every frame, before the service-port filter drops any
    let dns_queries = dns::count_queries(&frames, config.dns_port());
    let demuxed = demultiplex(frames, config);
    let reassembly = reassemble(&demuxed.sessions, config);
    summarize(&demuxed.stats, reassembly, dns_queries)
}

pub fn analyze_file(path: &Path, config: &Config) -> Result<Report, Error> {
    let capture = read_capture(path)?;
    let mut report = analyze(capture.frames, config);
    report.truncated = capture.stats.truncated;
    Ok(report)
}
