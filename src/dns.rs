//! Counting name-resolution messages.
//!
//! Independent of session grouping: every frame on the DNS port is looked at
//! on its own. A message counts when its header is complete and its question
//! count is non-zero, which includes responses echoing their question.

use crate::packet::{Frame, Transport};

const DNS_HEADER_LEN: usize = 12;

pub fn count_queries(frames: &[Frame], dns_port: u16) -> usize {
    frames
        .iter()
        .filter(|frame| frame.has_port(dns_port))
        .filter(|frame| carries_question(frame))
        .count()
}

fn carries_question(frame: &Frame) -> bool {
    let message = match frame.transport {
        Transport::Udp => frame.payload.as_slice(),
        // DNS over TCP prefixes each message with its 2-byte length
        Transport::Tcp => match frame.payload.get(2..) {
            Some(message) => message,
            None => return false,
        },
        Transport::Fragment(_) | Transport::Other(_) => return false,
    };
    if message.len() < DNS_HEADER_LEN {
        return false;
    }
    u16::from_be_bytes([message[4], message[5]]) > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::net::{IpAddr, Ipv4Addr, SocketAddr};
    use core::time::Duration;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 0, 1)), port)
    }

    fn dns_message(qdcount: u16, is_response: bool) -> Vec<u8> {
        let mut message = vec![0u8; DNS_HEADER_LEN];
        message[0..2].copy_from_slice(&0x1234u16.to_be_bytes());
        if is_response {
            message[2] = 0x81;
        }
        message[4..6].copy_from_slice(&qdcount.to_be_bytes());
        // example.com A IN
        message.extend_from_slice(b"\x07example\x03com\x00\x00\x01\x00\x01");
        message
    }

    #[test]
    fn test_counts_queries_and_responses() {
        let frames = vec![
            Frame::udp(Duration::ZERO, addr(50000), addr(53), dns_message(1, false)),
            Frame::udp(Duration::ZERO, addr(53), addr(50000), dns_message(1, true)),
        ];
        assert_eq!(count_queries(&frames, 53), 2);
    }

    #[test]
    fn test_skips_non_dns_and_empty_questions() {
        let frames = vec![
            Frame::udp(Duration::ZERO, addr(50000), addr(53), dns_message(0, false)),
            Frame::udp(Duration::ZERO, addr(50000), addr(53), vec![0u8; 5]),
            Frame::udp(Duration::ZERO, addr(50000), addr(5353), dns_message(1, false)),
            Frame::tcp(Duration::ZERO, addr(50000), addr(80), dns_message(1, false)),
        ];
        assert_eq!(count_queries(&frames, 53), 0);
    }

    #[test]
    fn test_counts_dns_over_tcp() {
        let message = dns_message(1, false);
        let mut payload = u16::try_from(message.len()).unwrap().to_be_bytes().to_vec();
        payload.extend_from_slice(&message);

        let frames = vec![
            Frame::tcp(Duration::ZERO, addr(50000), addr(53), payload),
            // bare ACK on the same connection
            Frame::tcp(Duration::ZERO, addr(53), addr(50000), Vec::<u8>::new()),
        ];
        assert_eq!(count_queries(&frames, 53), 1);
    }
}
