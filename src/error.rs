use std::fmt::Display;

use thiserror::Error;

/// Error returned from parsing or querying an audio configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A descriptor, or the configuration's `wTotalLength`, extends past the end of the data.
    #[error("{len} bytes at offset {offset} extend past the end of the {total} byte descriptor block")]
    Truncated {
        offset: usize,
        len: usize,
        total: usize,
    },

    /// A descriptor's fields are inconsistent with its length or subtype.
    #[error("malformed descriptor at offset {offset}: {reason}")]
    MalformedDescriptor { offset: usize, reason: &'static str },

    /// An audio interface uses a protocol other than UAC 1.0 (0x00) or UAC 2.0 (0x20).
    #[error("unsupported audio interface protocol 0x{0:02X}")]
    UnsupportedProtocol(u8),

    /// The class-specific header advertises a `bcdADC` other than 0x0100 or 0x0200.
    #[error("unsupported audio device class version 0x{0:04X}")]
    UnsupportedVersion(u16),

    /// A query did not find a matching entity.
    #[error("{0} not found")]
    NotFound(Lookup),
}

impl Error {
    pub(crate) fn malformed(offset: usize, reason: &'static str) -> Self {
        Error::MalformedDescriptor { offset, reason }
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Truncated { .. } => ErrorKind::Truncated,
            Error::MalformedDescriptor { .. } => ErrorKind::MalformedDescriptor,
            Error::UnsupportedProtocol(_) => ErrorKind::UnsupportedProtocol,
            Error::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            Error::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// General category of an [`Error`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::Truncated`].
    Truncated,
    /// See [`Error::MalformedDescriptor`].
    MalformedDescriptor,
    /// See [`Error::UnsupportedProtocol`].
    UnsupportedProtocol,
    /// See [`Error::UnsupportedVersion`].
    UnsupportedVersion,
    /// See [`Error::NotFound`].
    NotFound,
}

/// What a failed query was looking for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The audio control interface the configuration was parsed for.
    ControlInterface(u8),
    /// Any alternate setting of a streaming interface.
    StreamInterface(u8),
    /// Any streaming interface claimed by the control interface.
    ClaimedStream { control: u8 },
    /// One alternate setting of a streaming interface.
    AltSetting { interface: u8, alt_setting: u8 },
    /// A unit, terminal or clock entity by ID.
    Unit(u8),
    /// A unit exists with that ID but is of a different kind.
    UnitKind { id: u8, expected: &'static str },
    /// An endpoint of a streaming alternate setting.
    Endpoint { interface: u8, alt_setting: u8 },
    /// An alternate setting satisfying the search criteria.
    MatchingAltSetting(u8),
}

impl Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lookup::ControlInterface(n) => write!(f, "audio control interface {n}"),
            Lookup::StreamInterface(n) => write!(f, "audio streaming interface {n}"),
            Lookup::ClaimedStream { control } => write!(
                f,
                "audio streaming interface claimed by control interface {control}"
            ),
            Lookup::AltSetting {
                interface,
                alt_setting,
            } => write!(f, "alternate setting {alt_setting} of interface {interface}"),
            Lookup::Unit(id) => write!(f, "unit 0x{id:02X}"),
            Lookup::UnitKind { id, expected } => write!(f, "{expected} with ID 0x{id:02X}"),
            Lookup::Endpoint {
                interface,
                alt_setting,
            } => write!(
                f,
                "isochronous endpoint on interface {interface} alternate setting {alt_setting}"
            ),
            Lookup::MatchingAltSetting(n) => {
                write!(f, "matching alternate setting on interface {n}")
            }
        }
    }
}

/// Result type for `uac_topology` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[test]
fn test_error_display() {
    assert_eq!(
        Error::NotFound(Lookup::AltSetting {
            interface: 1,
            alt_setting: 3
        })
        .to_string(),
        "alternate setting 3 of interface 1 not found"
    );
    assert_eq!(
        Error::UnsupportedProtocol(0x30).to_string(),
        "unsupported audio interface protocol 0x30"
    );
    assert_eq!(
        Error::malformed(12, "bLength is zero").kind(),
        ErrorKind::MalformedDescriptor
    );
}
