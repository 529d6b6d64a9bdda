use super::SessionKey;
use crate::error::MalformedFrame;
use core::net::{IpAddr, SocketAddr};
use core::time::Duration;
use serde::Serialize;

const IPPROTO_TCP: u8 = 6;
const IPPROTO_UDP: u8 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transport {
    Tcp,
    Udp,
    /// Non-first fragment of a datagram carrying this protocol. Only the
    /// first fragment holds the transport header.
    Fragment(u8),
    Other(u8),
}

impl Transport {
    pub fn from_protocol_number(protocol: u8) -> Self {
        match protocol {
            IPPROTO_TCP => Transport::Tcp,
            IPPROTO_UDP => Transport::Udp,
            other => Transport::Other(other),
        }
    }

    /// Whether frames of this kind carry source and destination ports.
    pub fn has_ports(self) -> bool {
        matches!(self, Transport::Tcp | Transport::Udp)
    }
}

/// TCP control bits (byte 13 of the TCP header).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TcpFlags(pub u8);

impl TcpFlags {
    pub const FIN: Self = Self(0x01);
    pub const SYN: Self = Self(0x02);
    pub const RST: Self = Self(0x04);
    pub const PSH: Self = Self(0x08);
    pub const ACK: Self = Self(0x10);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for TcpFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One captured unit as handed over by the capture reader.
///
/// Fields the reader could not recover are `None`. A TCP or UDP frame with a
/// missing field is counted as malformed by the demultiplexer instead of
/// being grouped; frames of other transports never have ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub timestamp: Option<Duration>,
    pub src_ip: Option<IpAddr>,
    pub dst_ip: Option<IpAddr>,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub transport: Transport,
    pub flags: TcpFlags,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn tcp(
        timestamp: Duration,
        src: SocketAddr,
        dst: SocketAddr,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            timestamp: Some(timestamp),
            src_ip: Some(src.ip()),
            dst_ip: Some(dst.ip()),
            src_port: Some(src.port()),
            dst_port: Some(dst.port()),
            transport: Transport::Tcp,
            flags: TcpFlags::ACK,
            payload: payload.into(),
        }
    }

    pub fn udp(
        timestamp: Duration,
        src: SocketAddr,
        dst: SocketAddr,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            transport: Transport::Udp,
            flags: TcpFlags::default(),
            ..Self::tcp(timestamp, src, dst, payload)
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: TcpFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn has_port(&self, port: u16) -> bool {
        self.src_port == Some(port) || self.dst_port == Some(port)
    }

    /// Timestamp and directional key, or the first missing field.
    pub fn identify(&self) -> Result<(Duration, SessionKey), MalformedFrame> {
        let timestamp = self.timestamp.ok_or(MalformedFrame::MissingTimestamp)?;
        let (Some(src_ip), Some(dst_ip)) = (self.src_ip, self.dst_ip) else {
            return Err(MalformedFrame::MissingAddress);
        };
        let (Some(src_port), Some(dst_port)) = (self.src_port, self.dst_port) else {
            return Err(MalformedFrame::MissingPort);
        };
        Ok((
            timestamp,
            SessionKey {
                src_ip,
                src_port,
                dst_ip,
                dst_port,
            },
        ))
    }
}
