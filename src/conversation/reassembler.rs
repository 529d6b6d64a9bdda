//! Pairing request and response sessions into conversations.

use super::{ConversationId, Role};
use crate::config::Config;
use crate::http::{ProtocolRecord, split_records};
use crate::packet::SessionKey;
use crate::stream::Session;
use core::time::Duration;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

// serde hands `serialize_with` a reference to the field
#[allow(clippy::ref_option)]
fn as_secs<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_some(&d.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}

/// One direction of a conversation, rebuilt from its session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Half {
    pub session: SessionKey,
    pub records: Vec<ProtocolRecord>,
    #[serde(serialize_with = "as_secs")]
    pub end_time: Option<Duration>,
    pub frames: usize,
    pub bytes: usize,
    /// SYN captured. Without it the capture began mid-connection and the
    /// first records may be the tail of an earlier message.
    pub handshake: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConversationState {
    Complete,
    /// Response seen, request missing from the capture.
    OrphanResponse,
    /// Request seen, no response captured.
    OrphanRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub request: Option<Half>,
    pub response: Option<Half>,
}

impl Conversation {
    fn new(id: ConversationId) -> Self {
        Self {
            id,
            request: None,
            response: None,
        }
    }

    pub fn half(&self, role: Role) -> Option<&Half> {
        match role {
            Role::Request => self.request.as_ref(),
            Role::Response => self.response.as_ref(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.request.is_some() && self.response.is_some()
    }

    pub fn state(&self) -> ConversationState {
        match (&self.request, &self.response) {
            (Some(_), Some(_)) => ConversationState::Complete,
            (Some(_), None) => ConversationState::OrphanRequest,
            (None, Some(_)) => ConversationState::OrphanResponse,
            (None, None) => unreachable!("conversations are created with their first half"),
        }
    }

    /// Returns the half that was replaced, if any.
    fn attach(&mut self, role: Role, half: Half) -> Option<Half> {
        let slot = match role {
            Role::Request => &mut self.request,
            Role::Response => &mut self.response,
        };
        slot.replace(half)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReassemblyStats {
    /// Sessions handed to the reassembler, ambiguous ones included.
    pub sessions: usize,
    pub ambiguous: usize,
    /// Attached halves whose session has no SYN.
    pub midstream: usize,
    /// Halves dropped because a later session claimed the same slot.
    pub overwritten: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reassembly {
    pub conversations: BTreeMap<ConversationId, Conversation>,
    pub stats: ReassemblyStats,
}

pub struct Reassembler<'a> {
    config: &'a Config,
}

impl<'a> Reassembler<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Join the session's payload in timestamp order and split it into records.
    pub fn reconstruct(&self, session: &Session) -> Half {
        let payload = session.payload();
        Half {
            session: *session.key(),
            records: split_records(&payload, self.config.record_separator()),
            end_time: session.end_time(),
            frames: session.frame_count(),
            bytes: payload.len(),
            handshake: session.saw_syn(),
        }
    }

    /// Sessions are attached in iteration order; when two sessions claim the
    /// same half of one conversation the later one wins.
    pub fn reassemble<'s>(&self, sessions: impl IntoIterator<Item = &'s Session>) -> Reassembly {
        let mut reassembly = Reassembly::default();

        for session in sessions {
            reassembly.stats.sessions += 1;

            let (role, id) = match session.role(self.config.service_port()) {
                Ok(classified) => classified,
                Err(e) => {
                    warn!("Excluding session: {e}");
                    reassembly.stats.ambiguous += 1;
                    continue;
                }
            };

            let half = self.reconstruct(session);
            if !half.handshake {
                reassembly.stats.midstream += 1;
            }
            debug!(
                session = %session.key(),
                conversation = %id,
                ?role,
                records = half.records.len(),
                "Attaching session"
            );

            let conversation = reassembly
                .conversations
                .entry(id)
                .or_insert_with(|| Conversation::new(id));
            if let Some(previous) = conversation.attach(role, half) {
                warn!(
                    conversation = %id,
                    ?role,
                    replaced = %previous.session,
                    "Session reused an existing conversation slot, keeping the later one"
                );
                reassembly.stats.overwritten += 1;
            }
        }

        info!(
            conversations = reassembly.conversations.len(),
            sessions = reassembly.stats.sessions,
            ambiguous = reassembly.stats.ambiguous,
            midstream = reassembly.stats.midstream,
            "Reassembled conversations"
        );
        reassembly
    }
}

pub fn reassemble(sessions: &BTreeMap<SessionKey, Session>, config: &Config) -> Reassembly {
    Reassembler::new(config).reassemble(sessions.values())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Segment;
    use crate::packet::TcpFlags;
    use core::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn addr(last: u8, port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)), port)
    }

    fn session(src: SocketAddr, dst: SocketAddr, parts: &[(u64, &str)]) -> Session {
        session_with_flags(src, dst, TcpFlags::ACK, parts)
    }

    fn session_with_flags(
        src: SocketAddr,
        dst: SocketAddr,
        first_flags: TcpFlags,
        parts: &[(u64, &str)],
    ) -> Session {
        Session::from_segments(
            SessionKey::new(src, dst),
            parts
                .iter()
                .enumerate()
                .map(|(i, (millis, payload))| Segment {
                    timestamp: Duration::from_millis(*millis),
                    flags: if i == 0 { first_flags } else { TcpFlags::ACK },
                    payload: payload.as_bytes().to_vec(),
                })
                .collect(),
        )
    }

    fn texts(half: &Half) -> Vec<String> {
        half.records
            .iter()
            .map(|r| r.to_text().into_owned())
            .collect()
    }

    #[test]
    fn test_mirror_pairing() {
        let client = addr(1, 1234);
        let server = addr(2, 80);
        let config = Config::default();
        let sessions = [
            session(client, server, &[(1, "GET / HTTP/1.1\r\n\r\n")]),
            session(server, client, &[(2, "HTTP/1.1 200 OK\r\n\r\n")]),
        ];

        let result = Reassembler::new(&config).reassemble(&sessions);

        assert_eq!(result.conversations.len(), 1);
        let conversation = &result.conversations[&ConversationId::from(SessionKey::new(client, server))];
        assert!(conversation.is_complete());
        assert_eq!(conversation.state(), ConversationState::Complete);
        assert_eq!(
            conversation.half(Role::Request).unwrap().session,
            SessionKey::new(client, server)
        );
        assert_eq!(
            conversation.half(Role::Response).unwrap().session,
            SessionKey::new(server, client)
        );
    }

    #[test]
    fn test_response_before_request_still_pairs() {
        let client = addr(1, 1234);
        let server = addr(2, 80);
        let config = Config::default();
        let sessions = [
            session(server, client, &[(2, "HTTP/1.1 200 OK\r\n\r\n")]),
            session(client, server, &[(1, "GET / HTTP/1.1\r\n\r\n")]),
        ];

        let result = Reassembler::new(&config).reassemble(&sessions);
        assert_eq!(result.conversations.len(), 1);
        assert!(result.conversations.values().all(Conversation::is_complete));
    }

    #[test]
    fn test_orphan_response_is_kept() {
        let config = Config::default();
        let sessions = [session(addr(2, 80), addr(1, 1234), &[(2, "HTTP/1.1 200 OK\r\n")])];

        let result = Reassembler::new(&config).reassemble(&sessions);

        let conversation = result.conversations.values().next().unwrap();
        assert_eq!(conversation.state(), ConversationState::OrphanResponse);
        assert!(conversation.request.is_none());
        assert_eq!(
            conversation.id.key(),
            &SessionKey::new(addr(1, 1234), addr(2, 80))
        );
    }

    #[test]
    fn test_orphan_request_is_kept() {
        let config = Config::default();
        let sessions = [session(addr(1, 1234), addr(2, 80), &[(1, "GET / HTTP/1.1\r\n")])];

        let result = Reassembler::new(&config).reassemble(&sessions);
        let conversation = result.conversations.values().next().unwrap();
        assert_eq!(conversation.state(), ConversationState::OrphanRequest);
    }

    #[test]
    fn test_reconstruct_splits_joined_payload() {
        let config = Config::default();
        let request = session(
            addr(1, 1234),
            addr(2, 80),
            &[(3, "\r\n"), (1, "GET / HTTP/1.1\r\n"), (2, "Host: x\r\n")],
        );

        let half = Reassembler::new(&config).reconstruct(&request);
        assert_eq!(texts(&half), ["GET / HTTP/1.1", "Host: x", "", ""]);
        assert_eq!(half.end_time, Some(Duration::from_millis(3)));
        assert_eq!(half.frames, 3);
        assert_eq!(half.bytes, 27);
    }

    #[test]
    fn test_records_span_segment_boundaries() {
        let config = Config::default();
        let request = session(
            addr(1, 1234),
            addr(2, 80),
            &[(1, "GET / HTTP/1.1\r"), (2, "\nHo"), (3, "st: x\r\n")],
        );

        let half = Reassembler::new(&config).reconstruct(&request);
        assert_eq!(texts(&half), ["GET / HTTP/1.1", "Host: x", ""]);
    }

    #[test]
    fn test_empty_session_yields_no_records() {
        let config = Config::default();
        let handshake = session(addr(1, 1234), addr(2, 80), &[(1, ""), (2, "")]);

        let result = Reassembler::new(&config).reassemble([&handshake]);
        let conversation = result.conversations.values().next().unwrap();
        let request = conversation.request.as_ref().unwrap();
        assert!(request.records.is_empty());
        assert_eq!(request.frames, 2);
    }

    #[test]
    fn test_ambiguous_session_is_excluded() {
        let config = Config::default();
        let sessions = [
            session(addr(1, 1234), addr(2, 443), &[(1, "tls")]),
            session(addr(1, 1235), addr(2, 80), &[(1, "GET / HTTP/1.1\r\n")]),
        ];

        let result = Reassembler::new(&config).reassemble(&sessions);
        assert_eq!(result.conversations.len(), 1);
        assert_eq!(
            result.stats,
            ReassemblyStats {
                sessions: 2,
                ambiguous: 1,
                midstream: 1,
                overwritten: 0
            }
        );
    }

    #[test]
    fn test_sessions_without_syn_are_midstream() {
        let config = Config::default();
        let client = addr(1, 1234);
        let server = addr(2, 80);
        let sessions = [
            session_with_flags(client, server, TcpFlags::SYN, &[(1, ""), (2, "GET / HTTP/1.1\r\n")]),
            session(server, client, &[(3, "HTTP/1.1 200 OK\r\n")]),
        ];

        let result = Reassembler::new(&config).reassemble(&sessions);
        assert_eq!(result.stats.midstream, 1);
        let conversation = result.conversations.values().next().unwrap();
        assert!(conversation.half(Role::Request).unwrap().handshake);
        assert!(!conversation.half(Role::Response).unwrap().handshake);
    }

    #[test]
    fn test_reused_port_last_writer_wins() {
        let config = Config::default();
        let client = addr(1, 1234);
        let server = addr(2, 80);
        let sessions = [
            session(client, server, &[(1, "GET /first HTTP/1.1\r\n")]),
            session(client, server, &[(9, "GET /second HTTP/1.1\r\n")]),
        ];

        let result = Reassembler::new(&config).reassemble(&sessions);
        assert_eq!(result.stats.overwritten, 1);
        let request = result.conversations.values().next().unwrap().request.as_ref().unwrap();
        assert_eq!(texts(request), ["GET /second HTTP/1.1", ""]);
    }

    #[test]
    fn test_reassemble_map() {
        let config = Config::default();
        let client = addr(1, 1234);
        let server = addr(2, 80);
        let sessions: BTreeMap<_, _> = [
            session(client, server, &[(1, "GET / HTTP/1.1\r\n")]),
            session(server, client, &[(2, "HTTP/1.1 200 OK\r\n")]),
        ]
        .into_iter()
        .map(|s| (*s.key(), s))
        .collect();

        let result = reassemble(&sessions, &config);
        assert_eq!(result.stats.sessions, 2);
        assert!(result.conversations.values().all(Conversation::is_complete));
    }
}
