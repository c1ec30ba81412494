//! Problems found while parsing that did not stop the parse.

use std::fmt::{Debug, Display};

use log::warn;

use crate::{descriptors::Descriptor, Error};

/// Formats bytes as space-separated hex pairs, e.g. `09 04 01 00`.
pub struct HexDump<'a>(pub &'a [u8]);

impl<'a> Display for HexDump<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl<'a> Debug for HexDump<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{self}]")
    }
}

/// Hex dump of a byte slice.
pub fn hex_dump(bytes: &[u8]) -> String {
    HexDump(bytes).to_string()
}

/// What a [`Diagnostic`] reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A descriptor was rejected or the walk stopped early.
    Error(Error),
    /// A MIDI streaming interface was removed from the claimed streams.
    MidiStreamingSkipped { interface: u8 },
    /// A UAC 2.0 audio control interface had no interface association to claim streams with.
    MissingInterfaceAssociation { interface: u8 },
    /// A header's `bcdADC` names a known release other than the interface protocol's.
    AdcVersionMismatch { interface: u8, adc_version: u16 },
    /// A second entity reused an ID; the first one is kept.
    DuplicateUnitId { id: u8 },
    /// A source or clock reference names an ID no entity carries.
    DanglingReference { unit: u8, reference: u8 },
    /// A streaming alternate setting links to no terminal of its control interface.
    UnresolvedTerminalLink {
        interface: u8,
        alt_setting: u8,
        terminal_link: u8,
    },
    /// A streaming data endpoint points the wrong way for its linked terminal.
    EndpointDirectionMismatch {
        interface: u8,
        alt_setting: u8,
        address: u8,
    },
    /// An audio control interface was dropped because no streaming interface belonged to it.
    OrphanedControlInterface { interface: u8 },
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::Error(e) => write!(f, "{e}"),
            DiagnosticKind::MidiStreamingSkipped { interface } => {
                write!(f, "MIDI streaming interface {interface} skipped")
            }
            DiagnosticKind::MissingInterfaceAssociation { interface } => write!(
                f,
                "no audio interface association for control interface {interface}"
            ),
            DiagnosticKind::AdcVersionMismatch {
                interface,
                adc_version,
            } => write!(
                f,
                "control interface {interface} header bcdADC 0x{adc_version:04X} does not match its protocol"
            ),
            DiagnosticKind::DuplicateUnitId { id } => write!(f, "duplicate unit ID 0x{id:02X}"),
            DiagnosticKind::DanglingReference { unit, reference } => write!(
                f,
                "unit 0x{unit:02X} references unknown entity 0x{reference:02X}"
            ),
            DiagnosticKind::UnresolvedTerminalLink {
                interface,
                alt_setting,
                terminal_link,
            } => write!(
                f,
                "interface {interface} alt {alt_setting} links to unknown terminal 0x{terminal_link:02X}"
            ),
            DiagnosticKind::EndpointDirectionMismatch {
                interface,
                alt_setting,
                address,
            } => write!(
                f,
                "endpoint 0x{address:02X} of interface {interface} alt {alt_setting} has the wrong direction for its terminal"
            ),
            DiagnosticKind::OrphanedControlInterface { interface } => write!(
                f,
                "control interface {interface} has no streaming interfaces"
            ),
        }
    }
}

/// A problem found while parsing, with the byte offset of the descriptor involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub offset: Option<usize>,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(offset: Option<usize>, kind: DiagnosticKind) -> Self {
        Diagnostic { offset, kind }
    }

    /// The parse error, if this diagnostic reports one.
    pub fn error(&self) -> Option<&Error> {
        match &self.kind {
            DiagnosticKind::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} (at offset {offset})", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Collects diagnostics during a parse, logging each as it arrives.
#[derive(Default, Debug)]
pub(crate) struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub(crate) fn report(&mut self, offset: Option<usize>, kind: DiagnosticKind) {
        let d = Diagnostic::new(offset, kind);
        warn!("{d}");
        self.0.push(d);
    }

    pub(crate) fn error(&mut self, e: Error) {
        let offset = match &e {
            Error::Truncated { offset, .. } | Error::MalformedDescriptor { offset, .. } => {
                Some(*offset)
            }
            _ => None,
        };
        self.report(offset, DiagnosticKind::Error(e));
    }

    /// Report a descriptor that was rejected and skipped.
    pub(crate) fn rejected(&mut self, d: &Descriptor, e: Error) {
        warn!("skipping descriptor: {}", HexDump(d));
        self.report(Some(d.offset()), DiagnosticKind::Error(e));
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

#[test]
fn test_hex_dump() {
    assert_eq!(hex_dump(&[0x09, 0x04, 0xab]), "09 04 ab");
    assert_eq!(hex_dump(&[]), "");
    assert_eq!(format!("{:?}", HexDump(&[1, 2])), "[01 02]");

    let d = Diagnostic::new(Some(18), DiagnosticKind::DuplicateUnitId { id: 3 });
    assert_eq!(d.to_string(), "duplicate unit ID 0x03 (at offset 18)");
    assert!(d.error().is_none());
}
