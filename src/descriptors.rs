//! Bounds-checked access to raw USB descriptors.
//!
//! A configuration descriptor block is a sequence of length-prefixed
//! descriptors. [`Cursor`] walks that sequence one `bLength` at a time and
//! refuses to step outside the block, while [`Descriptor`] provides checked
//! little-endian field reads within a single descriptor.

use std::{fmt::Debug, ops::Deref};

use log::warn;

use crate::{Error, Result};

pub const DESCRIPTOR_TYPE_CONFIGURATION: u8 = 0x02;
pub const DESCRIPTOR_LEN_CONFIGURATION: u8 = 9;

pub const DESCRIPTOR_TYPE_INTERFACE: u8 = 0x04;
pub const DESCRIPTOR_LEN_INTERFACE: u8 = 9;

pub const DESCRIPTOR_TYPE_ENDPOINT: u8 = 0x05;
pub const DESCRIPTOR_LEN_ENDPOINT: u8 = 7;
/// Length of an endpoint descriptor carrying `bRefresh` and `bSynchAddress` (UAC 1.0).
pub const DESCRIPTOR_LEN_AUDIO_ENDPOINT: u8 = 9;

pub const DESCRIPTOR_TYPE_INTERFACE_ASSOCIATION: u8 = 0x0B;
pub const DESCRIPTOR_LEN_INTERFACE_ASSOCIATION: u8 = 8;

/// Class-specific interface descriptor.
pub const DESCRIPTOR_TYPE_CS_INTERFACE: u8 = 0x24;
/// Class-specific endpoint descriptor.
pub const DESCRIPTOR_TYPE_CS_ENDPOINT: u8 = 0x25;

pub const CLASS_AUDIO: u8 = 0x01;

pub const SUBCLASS_AUDIOCONTROL: u8 = 0x01;
pub const SUBCLASS_AUDIOSTREAMING: u8 = 0x02;
pub const SUBCLASS_MIDISTREAMING: u8 = 0x03;

pub const PROTOCOL_UAC1: u8 = 0x00;
pub const PROTOCOL_UAC2: u8 = 0x20;

/// Audio device class release an interface follows.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AudioVersion {
    /// USB Audio Class 1.0, interface protocol 0x00.
    Uac1,
    /// USB Audio Class 2.0, interface protocol 0x20.
    Uac2,
}

impl AudioVersion {
    /// Map a `bInterfaceProtocol` / `bFunctionProtocol` value to a version.
    pub fn from_protocol(protocol: u8) -> Option<AudioVersion> {
        match protocol {
            PROTOCOL_UAC1 => Some(AudioVersion::Uac1),
            PROTOCOL_UAC2 => Some(AudioVersion::Uac2),
            _ => None,
        }
    }

    /// Map a header `bcdADC` value to a version.
    pub fn from_bcd_adc(bcd_adc: u16) -> Option<AudioVersion> {
        match bcd_adc {
            0x0100 => Some(AudioVersion::Uac1),
            0x0200 => Some(AudioVersion::Uac2),
            _ => None,
        }
    }

    /// The `bcdADC` value a header of this version carries.
    pub fn bcd_adc(self) -> u16 {
        match self {
            AudioVersion::Uac1 => 0x0100,
            AudioVersion::Uac2 => 0x0200,
        }
    }

    /// The interface protocol code.
    pub fn protocol(self) -> u8 {
        match self {
            AudioVersion::Uac1 => PROTOCOL_UAC1,
            AudioVersion::Uac2 => PROTOCOL_UAC2,
        }
    }
}

/// `bInterfaceClass`, `bInterfaceSubClass` and `bInterfaceProtocol` of an interface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct ClassTriple {
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
}

/// A raw USB descriptor.
///
/// Wraps a byte slice to provide access to the bytes of a descriptor by implementing `Deref` to `[u8]`,
/// while also exposing the descriptor length, type, and its offset in the configuration block.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Descriptor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Descriptor<'a> {
    /// Create a `Descriptor` from a buffer.
    ///
    /// Returns `None` if
    ///   * the slice length is not at least 2.
    ///   * the `bLength` field (first byte) is less than 2 or greater than the slice length.
    pub fn new(buf: &'a [u8]) -> Option<Descriptor<'a>> {
        if buf.len() >= 2 && buf[0] >= 2 && buf.len() >= buf[0] as usize {
            Some(Descriptor {
                data: &buf[..buf[0] as usize],
                offset: 0,
            })
        } else {
            None
        }
    }

    /// Get the length field of the descriptor.
    #[doc(alias = "bLength")]
    pub fn descriptor_len(&self) -> usize {
        self.data[0] as usize
    }

    /// Get the type field of the descriptor.
    #[doc(alias = "bDescriptorType")]
    pub fn descriptor_type(&self) -> u8 {
        self.data[1]
    }

    /// Get the subtype field of a class-specific descriptor, if the descriptor is long enough to have one.
    #[doc(alias = "bDescriptorSubtype")]
    pub fn descriptor_subtype(&self) -> Option<u8> {
        self.data.get(2).copied()
    }

    /// Byte offset of this descriptor from the start of the configuration block.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Fail with [`Error::MalformedDescriptor`] unless `bLength` is at least `min`.
    pub(crate) fn require_len(&self, min: usize, reason: &'static str) -> Result<()> {
        if self.data.len() < min {
            Err(Error::malformed(self.offset, reason))
        } else {
            Ok(())
        }
    }

    /// Read `len` bytes at `pos` within this descriptor.
    pub fn bytes(&self, pos: usize, len: usize) -> Result<&'a [u8]> {
        pos.checked_add(len)
            .and_then(|end| self.data.get(pos..end))
            .ok_or(Error::malformed(
                self.offset,
                "field extends past the descriptor's bLength",
            ))
    }

    pub fn u8_at(&self, pos: usize) -> Result<u8> {
        Ok(self.bytes(pos, 1)?[0])
    }

    pub fn u16_at(&self, pos: usize) -> Result<u16> {
        let b = self.bytes(pos, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a 3-byte little-endian value, the encoding of audio sample rates.
    pub fn u24_at(&self, pos: usize) -> Result<u32> {
        let b = self.bytes(pos, 3)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    pub fn u32_at(&self, pos: usize) -> Result<u32> {
        let b = self.bytes(pos, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a little-endian bitmap of `size` bytes (1 to 4).
    pub(crate) fn bitmap_at(&self, pos: usize, size: usize) -> Result<u32> {
        let b = self.bytes(pos, size)?;
        Ok(b.iter()
            .take(4)
            .enumerate()
            .fold(0, |acc, (i, &byte)| acc | (byte as u32) << (8 * i)))
    }
}

impl<'a> Deref for Descriptor<'a> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data
    }
}

impl<'a> Debug for Descriptor<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Descriptor")
            .field("offset", &self.offset)
            .field("type", &format_args!("0x{:02X}", self.descriptor_type()))
            .field("bytes", &crate::diagnostics::HexDump(self.data))
            .finish()
    }
}

/// Forward-only reader over a configuration descriptor block.
///
/// The cursor advances strictly by each descriptor's `bLength`, so it can
/// never point into the middle of a descriptor nor past the end of the block.
#[derive(Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    /// Offset of the next descriptor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of the block being read.
    pub fn total_len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Get the next descriptor without consuming it.
    ///
    /// Returns `Ok(None)` at the end of the block.
    pub fn peek(&self) -> Result<Option<Descriptor<'a>>> {
        let rest = match self.buf.get(self.pos..) {
            Some(rest) if !rest.is_empty() => rest,
            _ => return Ok(None),
        };

        let len = rest[0] as usize;
        if len == 0 {
            return Err(Error::malformed(self.pos, "bLength is zero"));
        }
        if rest.len() < 2 {
            return Err(self.truncated(2));
        }
        if len < 2 {
            return Err(Error::malformed(
                self.pos,
                "bLength is shorter than the descriptor header",
            ));
        }
        if len > rest.len() {
            return Err(self.truncated(len));
        }

        Ok(Some(Descriptor {
            data: &rest[..len],
            offset: self.pos,
        }))
    }

    /// Get the next descriptor and advance past it.
    pub fn next_descriptor(&mut self) -> Result<Option<Descriptor<'a>>> {
        let r = self.peek()?;
        if let Some(d) = &r {
            self.pos += d.descriptor_len();
        }
        Ok(r)
    }

    /// Advance by `len` bytes regardless of descriptor boundaries.
    ///
    /// Only used to skip a whole class-specific block by its advertised total length.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        match self.pos.checked_add(len) {
            Some(end) if end <= self.buf.len() => {
                self.pos = end;
                Ok(())
            }
            _ => Err(self.truncated(len)),
        }
    }

    fn truncated(&self, len: usize) -> Error {
        warn!(
            "descriptor of {len} bytes at offset {} exceeds block length {}",
            self.pos,
            self.buf.len()
        );
        Error::Truncated {
            offset: self.pos,
            len,
            total: self.buf.len(),
        }
    }
}

macro_rules! descriptor_fields {
    (impl $(<$( $i_lt:lifetime ),+>)? $tname:ident $(<$( $t_lt:lifetime ),+>)? {
        $(
            $(#[$attr:meta])*
            $vis:vis fn $name:ident at $pos:literal -> $ty:ty;
        )*
    }) => {
        impl $(<$( $i_lt ),+>)? $tname $(<$( $t_lt ),+>)? {
            $(
                $(#[$attr])*
                #[inline]
                $vis fn $name(&self) -> $ty { <$ty>::from_le_bytes(self.0[$pos..$pos + std::mem::size_of::<$ty>()].try_into().unwrap()) }
            )*
        }
    }
}

macro_rules! standard_descriptor {
    ($(#[$attr:meta])* $tname:ident, $ty:ident, $min_len:ident, $what:literal) => {
        $(#[$attr])*
        #[derive(Clone, Copy)]
        pub struct $tname<'a>(Descriptor<'a>);

        impl<'a> $tname<'a> {
            /// Interpret a raw descriptor, checking its type and minimum length.
            pub fn try_from_descriptor(d: Descriptor<'a>) -> Result<Self> {
                if d.descriptor_type() != $ty {
                    return Err(Error::malformed(d.offset(), concat!("not ", $what, " descriptor")));
                }
                d.require_len($min_len as usize, concat!($what, " descriptor is too short"))?;
                Ok($tname(d))
            }

            /// Offset of the descriptor in the configuration block.
            pub fn offset(&self) -> usize {
                self.0.offset()
            }

            pub fn descriptor(&self) -> Descriptor<'a> {
                self.0
            }
        }
    };
}

/// Check whether the buffer starts with a configuration descriptor whose
/// `wTotalLength` fits in the buffer.
///
/// On success, returns the `wTotalLength` value.
pub fn validate_config_descriptor(buf: &[u8]) -> Result<usize> {
    if buf.len() < DESCRIPTOR_LEN_CONFIGURATION as usize {
        warn!(
            "config descriptor buffer is {} bytes, need {}",
            buf.len(),
            DESCRIPTOR_LEN_CONFIGURATION
        );
        return Err(Error::Truncated {
            offset: 0,
            len: DESCRIPTOR_LEN_CONFIGURATION as usize,
            total: buf.len(),
        });
    }

    if buf[0] < DESCRIPTOR_LEN_CONFIGURATION {
        warn!("invalid config descriptor bLength {}", buf[0]);
        return Err(Error::malformed(0, "configuration descriptor bLength too short"));
    }

    if buf[1] != DESCRIPTOR_TYPE_CONFIGURATION {
        warn!(
            "config bDescriptorType is {}, not a configuration descriptor",
            buf[1]
        );
        return Err(Error::malformed(0, "not a configuration descriptor"));
    }

    let total_len = u16::from_le_bytes([buf[2], buf[3]]) as usize;
    if total_len < buf[0] as usize {
        warn!("config descriptor wTotalLength {total_len} is shorter than its bLength");
        return Err(Error::malformed(0, "wTotalLength shorter than bLength"));
    }
    if total_len > buf.len() {
        warn!(
            "invalid config descriptor wTotalLength of {total_len} (buffer size is {bufsize})",
            bufsize = buf.len()
        );
        return Err(Error::Truncated {
            offset: 0,
            len: total_len,
            total: buf.len(),
        });
    }

    Ok(total_len)
}

standard_descriptor!(
    /// Standard configuration descriptor heading the block.
    ConfigurationDescriptor,
    DESCRIPTOR_TYPE_CONFIGURATION,
    DESCRIPTOR_LEN_CONFIGURATION,
    "a configuration"
);

descriptor_fields! {
    impl<'a> ConfigurationDescriptor<'a> {
        /// `wTotalLength` descriptor field: Length of the whole configuration block.
        #[doc(alias = "wTotalLength")]
        pub fn total_length at 2 -> u16;

        /// `bNumInterfaces` descriptor field: Number of interfaces.
        #[doc(alias = "bNumInterfaces")]
        pub fn num_interfaces at 4 -> u8;

        /// `bConfigurationValue` descriptor field: Identifier for the configuration.
        #[doc(alias = "bConfigurationValue")]
        pub fn configuration_value at 5 -> u8;
    }
}

standard_descriptor!(
    /// Standard interface descriptor, one per alternate setting.
    InterfaceDescriptor,
    DESCRIPTOR_TYPE_INTERFACE,
    DESCRIPTOR_LEN_INTERFACE,
    "an interface"
);

descriptor_fields! {
    impl<'a> InterfaceDescriptor<'a> {
        /// `bInterfaceNumber` descriptor field: Identifier for the interface.
        #[doc(alias="bInterfaceNumber")]
        pub fn interface_number at 2 -> u8;

        /// `bAlternateSetting` descriptor field: Identifier for this alternate setting.
        #[doc(alias="bAlternateSetting")]
        pub fn alternate_setting at 3 -> u8;

        /// `bNumEndpoints` descriptor field: Number of endpoints in this alternate setting.
        #[doc(alias="bNumEndpoints")]
        pub fn num_endpoints at 4 -> u8;

        /// `bInterfaceClass` descriptor field: Standard interface class.
        #[doc(alias="bInterfaceClass")]
        pub fn class at 5 -> u8;

        /// `bInterfaceSubClass` descriptor field: Standard interface subclass.
        #[doc(alias="bInterfaceSubClass")]
        pub fn subclass at 6 -> u8;

        /// `bInterfaceProtocol` descriptor field: Standard interface protocol.
        #[doc(alias="bInterfaceProtocol")]
        pub fn protocol at 7 -> u8;
    }
}

impl<'a> InterfaceDescriptor<'a> {
    pub fn class_triple(&self) -> ClassTriple {
        ClassTriple {
            class: self.class(),
            subclass: self.subclass(),
            protocol: self.protocol(),
        }
    }
}

standard_descriptor!(
    /// Standard endpoint descriptor.
    EndpointDescriptor,
    DESCRIPTOR_TYPE_ENDPOINT,
    DESCRIPTOR_LEN_ENDPOINT,
    "an endpoint"
);

descriptor_fields! {
    impl<'a> EndpointDescriptor<'a> {
        /// Get the `bEndpointAddress` descriptor field: Endpoint address.
        #[doc(alias = "bEndpointAddress")]
        pub fn address at 2 -> u8;

        /// Get the raw value of the `bmAttributes` descriptor field.
        #[doc(alias = "bmAttributes")]
        pub fn attributes at 3 -> u8;

        /// Get the raw value of the `wMaxPacketSize` descriptor field.
        #[doc(alias = "wMaxPacketSize")]
        pub fn max_packet_size_raw at 4 -> u16;

        /// Get the `bInterval` field: Polling interval in frames or microframes.
        #[doc(alias = "bInterval")]
        pub fn interval at 6 -> u8;
    }
}

impl<'a> EndpointDescriptor<'a> {
    /// `bRefresh`, present only on the 9-byte audio endpoint descriptor.
    pub fn refresh(&self) -> Option<u8> {
        self.0.get(7).copied()
    }

    /// `bSynchAddress`, present only on the 9-byte audio endpoint descriptor.
    pub fn synch_address(&self) -> Option<u8> {
        self.0.get(8).copied()
    }
}

standard_descriptor!(
    /// Interface association descriptor grouping the interfaces of one function.
    InterfaceAssociationDescriptor,
    DESCRIPTOR_TYPE_INTERFACE_ASSOCIATION,
    DESCRIPTOR_LEN_INTERFACE_ASSOCIATION,
    "an interface association"
);

descriptor_fields! {
    impl<'a> InterfaceAssociationDescriptor<'a> {
        #[doc(alias = "bFirstInterface")]
        pub fn first_interface at 2 -> u8;

        #[doc(alias = "bInterfaceCount")]
        pub fn interface_count at 3 -> u8;

        #[doc(alias = "bFunctionClass")]
        pub fn function_class at 4 -> u8;

        #[doc(alias = "bFunctionSubClass")]
        pub fn function_subclass at 5 -> u8;

        #[doc(alias = "bFunctionProtocol")]
        pub fn function_protocol at 6 -> u8;
    }
}

impl<'a> InterfaceAssociationDescriptor<'a> {
    /// Whether this association describes a UAC 2.0 audio function.
    pub fn is_audio_function(&self) -> bool {
        self.function_class() == CLASS_AUDIO
            && self.function_subclass() == 0
            && self.function_protocol() == PROTOCOL_UAC2
    }
}
