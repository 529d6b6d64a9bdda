use crate::packet::SessionKey;
use core::fmt::Debug;
use core::fmt::Display;

/// Fatal errors: nothing can be reported when one of these is returned.
pub enum Error {
    InputUnavailable(String),
    UnsupportedLinkType(i32),
}

impl core::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InputUnavailable(s) => write!(f, "Input unavailable: {s}"),
            Error::UnsupportedLinkType(dlt) => write!(f, "Unsupported link type: {dlt}"),
        }
    }
}

/// Rejected configuration values.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    ZeroServicePort,
    ZeroDnsPort,
    PortConflict(u16),
    EmptySeparator,
}

impl core::error::Error for ConfigError {}

impl Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroServicePort => write!(f, "service port must be non-zero"),
            ConfigError::ZeroDnsPort => write!(f, "DNS port must be non-zero"),
            ConfigError::PortConflict(p) => {
                write!(f, "service port and DNS port are both {p}")
            }
            ConfigError::EmptySeparator => write!(f, "record separator must not be empty"),
        }
    }
}

/// Why a frame was left out of session grouping.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MalformedFrame {
    MissingTimestamp,
    MissingAddress,
    MissingPort,
}

impl core::error::Error for MalformedFrame {}

impl Display for MalformedFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Debug for MalformedFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MalformedFrame::MissingTimestamp => write!(f, "frame has no timestamp"),
            MalformedFrame::MissingAddress => write!(f, "frame has no source or destination address"),
            MalformedFrame::MissingPort => write!(f, "frame has no source or destination port"),
        }
    }
}

/// A session where neither endpoint uses the service port.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AmbiguousSession {
    pub key: SessionKey,
    pub service_port: u16,
}

impl core::error::Error for AmbiguousSession {}

impl Display for AmbiguousSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Debug for AmbiguousSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Ambiguous session {}: neither side uses port {}",
            self.key, self.service_port
        )
    }
}
