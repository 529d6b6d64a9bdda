//! Mapping a directional session onto the conversation it belongs to.

use crate::error::AmbiguousSession;
use crate::packet::SessionKey;
use core::fmt;
use serde::{Serialize, Serializer};

/// Which half of an exchange a session carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    /// Client speaking to the service.
    Request,
    /// Service answering the client.
    Response,
}

/// A conversation is named by its request direction, client → server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(SessionKey);

impl ConversationId {
    pub fn key(&self) -> &SessionKey {
        &self.0
    }
}

impl From<SessionKey> for ConversationId {
    /// Treats `key` as already being in client → server orientation.
    fn from(key: SessionKey) -> Self {
        Self(key)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for ConversationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Classify `key` and return the conversation both directions resolve to.
///
/// The destination port is checked first, so a session between two
/// service ports counts as a request.
pub fn canonicalize(
    key: &SessionKey,
    service_port: u16,
) -> Result<(Role, ConversationId), AmbiguousSession> {
    if key.dst_port == service_port {
        Ok((Role::Request, ConversationId(*key)))
    } else if key.src_port == service_port {
        Ok((Role::Response, ConversationId(key.mirror())))
    } else {
        Err(AmbiguousSession {
            key: *key,
            service_port,
        })
    }
}
