//! Link-layer frame decoding
//!
//! Turns the bytes handed out by the capture library into `Frame`s. Ethernet
//! (with at most one 802.1Q tag), Linux cooked capture, BSD loopback and raw
//! IP link types are supported; IPv4 and IPv6 (following its extension
//! header chain) carrying TCP or UDP.

use super::{Frame, TcpFlags, Transport};
use core::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use core::time::Duration;

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86DD;
const ETHERTYPE_VLAN: u16 = 0x8100;

const DLT_NULL: i32 = 0;
const DLT_EN10MB: i32 = 1;
const DLT_RAW: i32 = 101;
const DLT_RAW_OPENBSD: i32 = 12;
const DLT_LINUX_SLL: i32 = 113;
const DLT_IPV4: i32 = 228;
const DLT_IPV6: i32 = 229;

const IPV6_HOP_BY_HOP: u8 = 0;
const IPV6_ROUTING: u8 = 43;
const IPV6_FRAGMENT: u8 = 44;
const IPV6_AUTH: u8 = 51;
const IPV6_DEST_OPTS: u8 = 60;

/// How the capture encapsulates IP packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLayer {
    Ethernet,
    LinuxCooked,
    Loopback,
    RawIp,
}

impl LinkLayer {
    /// Map a pcap data-link type number.
    pub fn from_dlt(dlt: i32) -> Option<Self> {
        match dlt {
            DLT_EN10MB => Some(LinkLayer::Ethernet),
            DLT_LINUX_SLL => Some(LinkLayer::LinuxCooked),
            DLT_NULL => Some(LinkLayer::Loopback),
            DLT_RAW | DLT_RAW_OPENBSD | DLT_IPV4 | DLT_IPV6 => Some(LinkLayer::RawIp),
            _ => None,
        }
    }
}

/// Decode one captured packet. Returns `None` when it does not carry IP.
pub fn decode(link: LinkLayer, packet: &[u8], timestamp: Option<Duration>) -> Option<Frame> {
    let ip_packet = match link {
        LinkLayer::Ethernet => strip_ethernet(packet)?,
        LinkLayer::LinuxCooked => strip_linux_cooked(packet)?,
        // 4-byte address family in host byte order; the IP version nibble tells us enough
        LinkLayer::Loopback => packet.get(4..)?,
        LinkLayer::RawIp => packet,
    };
    let mut frame = from_ip_packet(ip_packet)?;
    frame.timestamp = timestamp;
    Some(frame)
}

fn strip_ethernet(packet: &[u8]) -> Option<&[u8]> {
    if packet.len() < 14 {
        return None;
    }

    // Ethernet header: [6 bytes dst MAC][6 bytes src MAC][2 bytes EtherType]
    let mut ethertype = u16::from_be_bytes([packet[12], packet[13]]);
    let mut offset = 14;

    if ethertype == ETHERTYPE_VLAN {
        if packet.len() < 18 {
            return None;
        }
        ethertype = u16::from_be_bytes([packet[16], packet[17]]);
        offset = 18;
    }

    match ethertype {
        ETHERTYPE_IPV4 | ETHERTYPE_IPV6 => Some(&packet[offset..]),
        _ => None,
    }
}

fn strip_linux_cooked(packet: &[u8]) -> Option<&[u8]> {
    // SLL header is 16 bytes, protocol type in the last two
    if packet.len() < 16 {
        return None;
    }
    match u16::from_be_bytes([packet[14], packet[15]]) {
        ETHERTYPE_IPV4 | ETHERTYPE_IPV6 => Some(&packet[16..]),
        _ => None,
    }
}

fn from_ip_packet(packet: &[u8]) -> Option<Frame> {
    if packet.is_empty() {
        return None;
    }

    // Check IP version from first nibble
    let version = (packet[0] >> 4) & 0x0F;

    match version {
        4 => from_ipv4_packet(packet),
        6 => from_ipv6_packet(packet),
        _ => None,
    }
}

fn from_ipv4_packet(packet: &[u8]) -> Option<Frame> {
    // IPv4 header minimum size is 20 bytes
    if packet.len() < 20 {
        return None;
    }

    let ihl = usize::from(packet[0] & 0x0F) * 4;
    if ihl < 20 || packet.len() < ihl {
        return None;
    }

    // Ethernet pads short frames; the total length field is authoritative
    let total_len = usize::from(u16::from_be_bytes([packet[2], packet[3]]));
    let end = if total_len >= ihl {
        total_len.min(packet.len())
    } else {
        packet.len()
    };

    let protocol = packet[9];
    let src_ip = IpAddr::V4(Ipv4Addr::new(
        packet[12], packet[13], packet[14], packet[15],
    ));
    let dst_ip = IpAddr::V4(Ipv4Addr::new(
        packet[16], packet[17], packet[18], packet[19],
    ));

    // Only the first fragment carries the transport header
    let fragment_offset = u16::from_be_bytes([packet[6], packet[7]]) & 0x1FFF;
    let (transport, transport_data) = if fragment_offset == 0 {
        (Transport::from_protocol_number(protocol), &packet[ihl..end])
    } else {
        (Transport::Fragment(protocol), &[][..])
    };

    Some(with_transport(src_ip, dst_ip, transport, transport_data))
}

fn from_ipv6_packet(packet: &[u8]) -> Option<Frame> {
    // IPv6 header is fixed 40 bytes
    if packet.len() < 40 {
        return None;
    }

    let payload_len = usize::from(u16::from_be_bytes([packet[4], packet[5]]));
    let end = (40 + payload_len).min(packet.len());

    let (transport, transport_data) = skip_ipv6_extensions(packet[6], &packet[40..end]);

    let mut src = [0u8; 16];
    src.copy_from_slice(&packet[8..24]);
    let mut dst = [0u8; 16];
    dst.copy_from_slice(&packet[24..40]);

    Some(with_transport(
        IpAddr::V6(Ipv6Addr::from(src)),
        IpAddr::V6(Ipv6Addr::from(dst)),
        transport,
        transport_data,
    ))
}

/// Walk the extension header chain starting at `next_header` and return the
/// upper-layer transport with the bytes that follow the last extension.
///
/// A chain cut short by the capture ends in `Transport::Other` with the
/// header it stopped at, since the transport is unknown.
fn skip_ipv6_extensions(mut next_header: u8, mut data: &[u8]) -> (Transport, &[u8]) {
    loop {
        let header_len = match next_header {
            IPV6_HOP_BY_HOP | IPV6_ROUTING | IPV6_DEST_OPTS => match data.get(1) {
                Some(&len) => (usize::from(len) + 1) * 8,
                None => return (Transport::Other(next_header), &[]),
            },
            IPV6_AUTH => match data.get(1) {
                Some(&len) => (usize::from(len) + 2) * 4,
                None => return (Transport::Other(next_header), &[]),
            },
            IPV6_FRAGMENT => {
                if data.len() < 8 {
                    return (Transport::Other(next_header), &[]);
                }
                let fragment_offset = u16::from_be_bytes([data[2], data[3]]) >> 3;
                if fragment_offset != 0 {
                    return (Transport::Fragment(data[0]), &[]);
                }
                8
            }
            protocol => return (Transport::from_protocol_number(protocol), data),
        };

        if data.len() < header_len {
            return (Transport::Other(next_header), &[]);
        }
        next_header = data[0];
        data = &data[header_len..];
    }
}

fn with_transport(src_ip: IpAddr, dst_ip: IpAddr, transport: Transport, segment: &[u8]) -> Frame {
    let mut frame = Frame {
        timestamp: None,
        src_ip: Some(src_ip),
        dst_ip: Some(dst_ip),
        src_port: None,
        dst_port: None,
        transport,
        flags: TcpFlags::default(),
        payload: Vec::new(),
    };

    let header_len = match transport {
        Transport::Tcp => {
            if segment.len() < 20 {
                return frame;
            }
            let data_offset = usize::from(segment[12] >> 4) * 4;
            if data_offset < 20 || segment.len() < data_offset {
                return frame;
            }
            frame.flags = TcpFlags(segment[13]);
            data_offset
        }
        Transport::Udp => {
            if segment.len() < 8 {
                return frame;
            }
            8
        }
        Transport::Fragment(_) | Transport::Other(_) => return frame,
    };

    frame.src_port = Some(u16::from_be_bytes([segment[0], segment[1]]));
    frame.dst_port = Some(u16::from_be_bytes([segment[2], segment[3]]));
    frame.payload = segment[header_len..].to_vec();
    frame
}
