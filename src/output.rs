use core::fmt;
use core::time::Duration;
use pcap_conversations_lib::conversation::{Conversation, ConversationState, Half, Report, Role};
use pcap_conversations_lib::http::{request_line, request_url, status_line};

pub(crate) fn report_as_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Human-readable rendering of a report.
pub(crate) struct ReportView<'a>(pub(crate) &'a Report);

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        if report.truncated {
            writeln!(f, "Capture truncated by a read error, counts cover the readable part")?;
        }
        writeln!(f, "Number of frames in capture: {}", report.frames)?;
        writeln!(f, "Number of sessions in capture: {}", report.sessions)?;
        writeln!(f, "Number of DNS queries in capture: {}", report.dns_queries)?;
        writeln!(f, "Malformed frames skipped: {}", report.malformed_frames)?;
        writeln!(f, "Ambiguous sessions skipped: {}", report.ambiguous_sessions)?;
        writeln!(f, "Overwritten halves: {}", report.overwritten_halves)?;
        writeln!(f, "Halves captured mid-connection: {}", report.midstream_halves)?;
        writeln!(
            f,
            "Conversations: {} ({} complete, {} orphan responses, {} orphan requests)",
            report.conversations.len(),
            report.complete,
            report.orphan_responses,
            report.orphan_requests
        )?;

        for conversation in report.conversations.values() {
            writeln!(f)?;
            write_conversation(f, conversation)?;
        }
        Ok(())
    }
}

fn state_label(state: ConversationState) -> &'static str {
    match state {
        ConversationState::Complete => "complete",
        ConversationState::OrphanResponse => "orphan response",
        ConversationState::OrphanRequest => "orphan request",
    }
}

/// `GET http://host/path -> 200 OK`, with `-` for whatever is missing.
pub(crate) fn headline(conversation: &Conversation) -> String {
    let request = conversation.request.as_ref().and_then(|half| {
        let line = request_line(&half.records)?;
        let target = request_url(&half.records).unwrap_or(line.target);
        Some(format!("{} {target}", line.method))
    });
    let status = conversation.response.as_ref().and_then(|half| {
        let line = status_line(&half.records)?;
        Some(if line.reason.is_empty() {
            line.code.to_string()
        } else {
            format!("{} {}", line.code, line.reason)
        })
    });
    format!(
        "{} -> {}",
        request.as_deref().unwrap_or("-"),
        status.as_deref().unwrap_or("-")
    )
}

fn write_conversation(f: &mut fmt::Formatter<'_>, conversation: &Conversation) -> fmt::Result {
    writeln!(
        f,
        "[{}] {}",
        state_label(conversation.state()),
        conversation.id
    )?;
    writeln!(f, "  {}", headline(conversation))?;
    for (role, label) in [(Role::Request, "request"), (Role::Response, "response")] {
        if let Some(half) = conversation.half(role) {
            write_half(f, label, half)?;
        }
    }
    Ok(())
}

fn write_half(f: &mut fmt::Formatter<'_>, label: &str, half: &Half) -> fmt::Result {
    let end = half.end_time.unwrap_or(Duration::ZERO).as_secs_f64();
    writeln!(
        f,
        "  {label}: {} frames, {} bytes, ends at {end:.6}s",
        half.frames, half.bytes
    )?;
    for record in &half.records {
        writeln!(f, "    {:?}", record.to_text())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::net::{IpAddr, Ipv4Addr, SocketAddr};
    use pcap_conversations_lib::{Config, Frame, analyze};

    fn report() -> Report {
        let client = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 40000);
        let server = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), 80);
        analyze(
            vec![
                Frame::tcp(
                    Duration::from_secs(1),
                    client,
                    server,
                    "GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n",
                ),
                Frame::tcp(
                    Duration::from_secs(2),
                    server,
                    client,
                    "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n",
                ),
            ],
            &Config::default(),
        )
    }

    #[test]
    fn test_headline() {
        let report = report();
        let conversation = report.conversations.values().next().unwrap();
        assert_eq!(
            headline(conversation),
            "GET http://example.com/index.html -> 200 OK"
        );
    }

    #[test]
    fn test_text_report() {
        let text = ReportView(&report()).to_string();
        assert!(text.contains("Number of sessions in capture: 2"));
        assert!(text.contains("Halves captured mid-connection: 2"));
        assert!(!text.contains("Capture truncated"));
        assert!(text.contains("[complete] TCP 10.0.0.1:40000 > 10.0.0.2:80"));
        assert!(text.contains("  request: 1 frames, 47 bytes, ends at 1.000000s"));
        assert!(text.contains("    \"Host: example.com\""));
    }

    #[test]
    fn test_truncated_capture_is_flagged() {
        let mut report = report();
        report.truncated = true;
        let text = ReportView(&report).to_string();
        assert!(text.starts_with("Capture truncated"));
    }

    #[test]
    fn test_json_report() {
        let json = report_as_json(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["complete"], 1);
        assert_eq!(value["sessions"], 2);
    }
}
