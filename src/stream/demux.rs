//! Grouping frames into directional sessions.

use super::{Segment, Session};
use crate::config::Config;
use crate::packet::{Frame, SessionKey, Transport};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DemuxStats {
    /// Frames grouped into a session.
    pub frames: usize,
    /// TCP or UDP frames missing a timestamp, address or port.
    pub malformed: usize,
    /// Frames that are not TCP on the service port, including IP traffic
    /// that has no ports at all.
    pub ignored: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demultiplexed {
    pub sessions: BTreeMap<SessionKey, Session>,
    pub stats: DemuxStats,
}

/// Incremental session builder, one `push` per captured frame.
#[derive(Debug)]
pub struct Demultiplexer {
    service_port: u16,
    sessions: BTreeMap<SessionKey, Session>,
    stats: DemuxStats,
}

impl Demultiplexer {
    pub fn new(config: &Config) -> Self {
        Self {
            service_port: config.service_port(),
            sessions: BTreeMap::new(),
            stats: DemuxStats::default(),
        }
    }

    pub fn push(&mut self, frame: Frame) {
        if !frame.transport.has_ports() {
            debug!(transport = ?frame.transport, "Ignoring frame without ports");
            self.stats.ignored += 1;
            return;
        }

        let (timestamp, key) = match frame.identify() {
            Ok(identified) => identified,
            Err(reason) => {
                debug!(%reason, "Skipping malformed frame");
                self.stats.malformed += 1;
                return;
            }
        };

        if frame.transport != Transport::Tcp || !key.involves_port(self.service_port) {
            self.stats.ignored += 1;
            return;
        }

        self.stats.frames += 1;
        self.sessions
            .entry(key)
            .or_insert_with(|| Session::new(key))
            .push(Segment {
                timestamp,
                flags: frame.flags,
                payload: frame.payload,
            });
    }

    /// The capture has no end-of-session marker, so sessions are only
    /// complete once every frame has been pushed.
    pub fn finish(mut self) -> Demultiplexed {
        for session in self.sessions.values_mut() {
            session.finalize();
        }
        info!(
            sessions = self.sessions.len(),
            frames = self.stats.frames,
            malformed = self.stats.malformed,
            ignored = self.stats.ignored,
            "Demultiplexed capture"
        );
        Demultiplexed {
            sessions: self.sessions,
            stats: self.stats,
        }
    }
}

pub fn demultiplex(frames: impl IntoIterator<Item = Frame>, config: &Config) -> Demultiplexed {
    let mut demux = Demultiplexer::new(config);
    for frame in frames {
        demux.push(frame);
    }
    demux.finish()
}
