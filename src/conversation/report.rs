use super::{Conversation, ConversationId, ConversationState, Reassembly};
use crate::stream::DemuxStats;
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts and conversations of one analyzed capture.
///
/// Every frame or session left out of a conversation is accounted for in
/// one of the skip counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub frames: usize,
    pub sessions: usize,
    pub dns_queries: usize,
    pub malformed_frames: usize,
    pub ambiguous_sessions: usize,
    pub overwritten_halves: usize,
    /// Halves whose connection opening was not captured.
    pub midstream_halves: usize,
    /// The capture file ended in a read error; counts cover what came before.
    pub truncated: bool,
    pub complete: usize,
    pub orphan_responses: usize,
    pub orphan_requests: usize,
    pub conversations: BTreeMap<ConversationId, Conversation>,
}

pub fn summarize(demux: &DemuxStats, reassembly: Reassembly, dns_queries: usize) -> Report {
    let mut report = Report {
        frames: demux.frames,
        sessions: reassembly.stats.sessions,
        dns_queries,
        malformed_frames: demux.malformed,
        ambiguous_sessions: reassembly.stats.ambiguous,
        overwritten_halves: reassembly.stats.overwritten,
        midstream_halves: reassembly.stats.midstream,
        truncated: false,
        complete: 0,
        orphan_responses: 0,
        orphan_requests: 0,
        conversations: BTreeMap::new(),
    };

    for conversation in reassembly.conversations.values() {
        match conversation.state() {
            ConversationState::Complete => report.complete += 1,
            ConversationState::OrphanResponse => report.orphan_responses += 1,
            ConversationState::OrphanRequest => report.orphan_requests += 1,
        }
    }
    report.conversations = reassembly.conversations;
    report
}
