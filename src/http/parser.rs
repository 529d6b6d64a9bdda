//! HTTP message head inspection.
//!
//! These functions read the start line and headers out of a record sequence
//! for reporting. The records themselves are never rewritten. Obsolete line
//! folding (RFC 7230) is undone before headers are looked up.

use super::ProtocolRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let method = parts.next()?;
        let target = parts.next()?;
        let version = parts.next()?;
        if !version.starts_with("HTTP/") {
            return None;
        }
        Some(Self {
            method: method.to_owned(),
            target: target.to_owned(),
            version: version.to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: String,
    pub code: u16,
    pub reason: String,
}

impl StatusLine {
    pub fn parse(line: &str) -> Option<Self> {
        let (version, rest) = line.trim().split_once(' ')?;
        if !version.starts_with("HTTP/") {
            return None;
        }
        let (code, reason) = rest.split_once(' ').unwrap_or((rest, ""));
        let code = code.parse().ok().filter(|c| (100..1000).contains(c))?;
        Some(Self {
            version: version.to_owned(),
            code,
            reason: reason.trim().to_owned(),
        })
    }
}

/// Start line followed by unfolded header lines, up to the first empty record.
pub fn unfold_headers(records: &[ProtocolRecord]) -> Vec<String> {
    let mut lines = records.iter().map(ProtocolRecord::to_text);
    let mut result = Vec::new();

    // First line is the start line, never folded
    let Some(first_line) = lines.next() else {
        return result;
    };
    result.push(first_line.into_owned());

    let mut current_line = String::new();

    for line in lines.take_while(|l| !l.is_empty()) {
        // Check if this line is a continuation (starts with space or tab)
        if line.starts_with(' ') || line.starts_with('\t') {
            current_line.push(' ');
            current_line.push_str(line.trim());
        } else {
            if !current_line.is_empty() {
                result.push(core::mem::take(&mut current_line));
            }
            current_line.push_str(&line);
        }
    }

    if !current_line.is_empty() {
        result.push(current_line);
    }

    result
}

/// Value of the first header named `name` (case-insensitive).
pub fn header(records: &[ProtocolRecord], name: &str) -> Option<String> {
    unfold_headers(records)
        .into_iter()
        .skip(1)
        .find_map(|line| {
            line.split_once(':').and_then(|(key, value)| {
                key.trim()
                    .eq_ignore_ascii_case(name)
                    .then(|| value.trim().to_owned())
            })
        })
}

pub fn request_line(records: &[ProtocolRecord]) -> Option<RequestLine> {
    RequestLine::parse(&records.first()?.to_text())
}

pub fn status_line(records: &[ProtocolRecord]) -> Option<StatusLine> {
    StatusLine::parse(&records.first()?.to_text())
}

/// Absolute URL of a request, rebuilt from the Host header when the target
/// is origin-form.
pub fn request_url(records: &[ProtocolRecord]) -> Option<String> {
    let request = request_line(records)?;
    let path = request.target.trim_start_matches('/');

    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_owned());
    }

    header(records, "host").map(|host| format!("http://{host}/{path}"))
}
