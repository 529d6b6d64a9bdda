//! Packet decoding and session identification.
//!
//! This module turns captured link-layer bytes into `Frame`s and derives the
//! directional `SessionKey` each TCP frame belongs to. It supports both IPv4
//! and IPv6 packets in various link-layer encapsulations.

mod decode;
mod frame;
mod session_key;

pub use decode::{LinkLayer, decode};
pub use frame::{Frame, TcpFlags, Transport};
pub use session_key::SessionKey;
