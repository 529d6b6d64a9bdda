use crate::error::Error;
use crate::packet::{Frame, LinkLayer, decode};
use core::time::Duration;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Records read from the file.
    pub packets: usize,
    /// Records that did not carry IPv4 or IPv6.
    pub non_ip: usize,
    /// Reading stopped at a read error before the end of the file.
    pub truncated: bool,
}

/// Frames decoded from an offline capture, in file order.
#[derive(Debug, Clone)]
pub struct CaptureFile {
    pub link: LinkLayer,
    pub frames: Vec<Frame>,
    pub stats: CaptureStats,
}

/// Read and decode every packet of a pcap/pcapng file.
///
/// Failing to open the file or an unknown link type is fatal. A read error
/// after the first packets ends the capture early with what was decoded.
pub fn read_capture(path: &Path) -> Result<CaptureFile, Error> {
    let mut cap = pcap::Capture::from_file(path)
        .map_err(|e| Error::InputUnavailable(format!("{}: {e}", path.display())))?;

    let dlt = cap.get_datalink().0;
    let link = LinkLayer::from_dlt(dlt).ok_or(Error::UnsupportedLinkType(dlt))?;
    info!("Reading {} ({link:?})", path.display());

    let mut frames = Vec::new();
    let mut stats = CaptureStats::default();
    loop {
        match cap.next_packet() {
            Ok(packet) => {
                stats.packets += 1;
                let secs = u64::try_from(packet.header.ts.tv_sec).ok();
                let micros = u64::try_from(packet.header.ts.tv_usec).ok();
                let timestamp = secs
                    .zip(micros)
                    .map(|(s, us)| Duration::from_secs(s) + Duration::from_micros(us));

                match decode(link, packet.data, timestamp) {
                    Some(frame) => frames.push(frame),
                    None => {
                        debug!(packet = stats.packets, "Skipping non-IP packet");
                        stats.non_ip += 1;
                    }
                }
            }
            Err(pcap::Error::NoMorePackets) => break,
            Err(e) => {
                warn!("Error reading packet, stopping early: {e}");
                stats.truncated = true;
                break;
            }
        }
    }

    info!(
        packets = stats.packets,
        frames = frames.len(),
        non_ip = stats.non_ip,
        truncated = stats.truncated,
        "Capture loaded"
    );
    Ok(CaptureFile {
        link,
        frames,
        stats,
    })
}
