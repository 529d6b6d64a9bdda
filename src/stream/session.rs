//! Per-direction TCP session.
//!
//! A `Session` collects the segments of one directional 4-tuple and keeps
//! them ordered by capture timestamp so the payload each side sent can be
//! rebuilt by concatenation.

use crate::conversation::{ConversationId, Role, canonicalize};
use crate::error::AmbiguousSession;
use crate::packet::{SessionKey, TcpFlags};
use core::time::Duration;

/// Payload-bearing part of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub timestamp: Duration,
    pub flags: TcpFlags,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    key: SessionKey,
    segments: Vec<Segment>,
}

impl Session {
    pub(crate) fn new(key: SessionKey) -> Self {
        Self {
            key,
            segments: Vec::new(),
        }
    }

    /// Build a finished session from segments in any order.
    pub fn from_segments(key: SessionKey, segments: Vec<Segment>) -> Self {
        let mut session = Self { key, segments };
        session.finalize();
        session
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Stable sort, frames captured at the same instant keep arrival order.
    pub(crate) fn finalize(&mut self) {
        self.segments.sort_by_key(|segment| segment.timestamp);
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn frame_count(&self) -> usize {
        self.segments.len()
    }

    pub fn payload_len(&self) -> usize {
        self.segments.iter().map(|s| s.payload.len()).sum()
    }

    /// Everything this side sent, in timestamp order.
    pub fn payload(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.payload_len());
        for segment in &self.segments {
            data.extend_from_slice(&segment.payload);
        }
        data
    }

    /// Timestamp of the final frame.
    pub fn end_time(&self) -> Option<Duration> {
        self.segments.last().map(|s| s.timestamp)
    }

    /// Whether the connection opening was captured. A session without a SYN
    /// was already running when the capture started.
    pub fn saw_syn(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.flags.contains(TcpFlags::SYN))
    }

    pub fn role(&self, service_port: u16) -> Result<(Role, ConversationId), AmbiguousSession> {
        canonicalize(&self.key, service_port)
    }
}
