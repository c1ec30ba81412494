//! Audio data format tags and the UAC 2.0 `bmFormats` reduction.
//!
//! UAC 1.0 identifies a streaming format by a 16-bit `wFormatTag`. UAC 2.0
//! instead pairs a `bFormatType` with a `bmFormats` bitmap; [`pseudo_format_tag`]
//! turns the latter into the former so both versions can be queried alike.

/// `wFormatTag` values.
pub mod format_tag {
    pub const TYPE_I_UNDEFINED: u16 = 0x0000;
    pub const PCM: u16 = 0x0001;
    pub const PCM8: u16 = 0x0002;
    pub const IEEE_FLOAT: u16 = 0x0003;
    pub const ALAW: u16 = 0x0004;
    pub const MULAW: u16 = 0x0005;

    pub const TYPE_II_UNDEFINED: u16 = 0x1000;
    pub const MPEG: u16 = 0x1001;
    pub const AC3: u16 = 0x1002;

    pub const TYPE_III_UNDEFINED: u16 = 0x2000;
    pub const IEC1937_AC3: u16 = 0x2001;
    pub const IEC1937_MPEG1_LAYER1: u16 = 0x2002;
    pub const IEC1937_MPEG1_LAYER2OR3: u16 = 0x2003;
    pub const IEC1937_MPEG2_EXT: u16 = 0x2004;
    pub const IEC1937_MPEG2_LAYER1_LS: u16 = 0x2005;
    pub const IEC1937_MPEG2_LAYER2OR3_LS: u16 = 0x2006;

    /// Whether a tag is one of the `TYPE_x_UNDEFINED` values.
    pub fn is_undefined(tag: u16) -> bool {
        tag & 0x0FFF == 0
    }
}

pub const FORMAT_TYPE_UNDEFINED: u8 = 0x00;
pub const FORMAT_TYPE_I: u8 = 0x01;
pub const FORMAT_TYPE_II: u8 = 0x02;
pub const FORMAT_TYPE_III: u8 = 0x03;

/// `bFormatType` of a format type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatType {
    #[default]
    Undefined,
    TypeI,
    TypeII,
    TypeIII,
    Other(u8),
}

impl From<u8> for FormatType {
    fn from(b: u8) -> Self {
        match b {
            FORMAT_TYPE_UNDEFINED => FormatType::Undefined,
            FORMAT_TYPE_I => FormatType::TypeI,
            FORMAT_TYPE_II => FormatType::TypeII,
            FORMAT_TYPE_III => FormatType::TypeIII,
            n => FormatType::Other(n),
        }
    }
}

impl FormatType {
    /// Format type implied by the high nibble of a `wFormatTag`.
    pub fn of_tag(tag: u16) -> FormatType {
        match tag >> 12 {
            0 => FormatType::TypeI,
            1 => FormatType::TypeII,
            2 => FormatType::TypeIII,
            _ => FormatType::Undefined,
        }
    }
}

const TYPE_I_FORMATS: &[(u32, u16)] = &[
    (1 << 0, format_tag::PCM),
    (1 << 1, format_tag::PCM8),
    (1 << 2, format_tag::IEEE_FLOAT),
    (1 << 3, format_tag::ALAW),
    (1 << 4, format_tag::MULAW),
];

const TYPE_II_FORMATS: &[(u32, u16)] = &[
    (1 << 0, format_tag::MPEG),
    (1 << 1, format_tag::AC3),
];

// bit 4 (MPEG-2 AAC ADTS) and bits 7 and up (DTS and later) have no UAC 1.0 tag
const TYPE_III_FORMATS: &[(u32, u16)] = &[
    (1 << 0, format_tag::IEC1937_AC3),
    (1 << 1, format_tag::IEC1937_MPEG1_LAYER1),
    (1 << 2, format_tag::IEC1937_MPEG1_LAYER2OR3),
    (1 << 3, format_tag::IEC1937_MPEG2_EXT),
    (1 << 5, format_tag::IEC1937_MPEG2_LAYER1_LS),
    (1 << 6, format_tag::IEC1937_MPEG2_LAYER2OR3_LS),
];

/// Reduce a UAC 2.0 `bFormatType` + `bmFormats` pair to a UAC 1.0 style format tag.
///
/// When several formats are advertised the lowest recognised bit wins. If no
/// bit is recognised the result is the `TYPE_x_UNDEFINED` tag for the format
/// type, and `TYPE_I_UNDEFINED` for unknown format types.
pub fn pseudo_format_tag(format_type: u8, bm_formats: u32) -> u16 {
    let (table, undefined) = match FormatType::from(format_type) {
        FormatType::TypeI => (TYPE_I_FORMATS, format_tag::TYPE_I_UNDEFINED),
        FormatType::TypeII => (TYPE_II_FORMATS, format_tag::TYPE_II_UNDEFINED),
        FormatType::TypeIII => (TYPE_III_FORMATS, format_tag::TYPE_III_UNDEFINED),
        _ => return format_tag::TYPE_I_UNDEFINED,
    };
    table
        .iter()
        .find(|(bit, _)| bm_formats & bit != 0)
        .map_or(undefined, |&(_, tag)| tag)
}

/// Capabilities of a compressed format, from a UAC 1.0 format-specific
/// descriptor or a UAC 2.0 decoder descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSpecific {
    Mpeg { capabilities: u16, features: u8 },
    Ac3 { bsid: u32, features: u8 },
}

#[cfg(test)]
mod tests {
    use super::{format_tag::*, *};

    #[test]
    fn test_pseudo_tags() {
        assert_eq!(pseudo_format_tag(FORMAT_TYPE_I, 0x0000_0001), PCM);
        assert_eq!(pseudo_format_tag(FORMAT_TYPE_I, 0x0000_0006), PCM8);
        assert_eq!(pseudo_format_tag(FORMAT_TYPE_I, 0x0000_0004), IEEE_FLOAT);
        assert_eq!(pseudo_format_tag(FORMAT_TYPE_I, 0x8000_0000), TYPE_I_UNDEFINED);
        assert_eq!(pseudo_format_tag(FORMAT_TYPE_II, 0x0000_0002), AC3);
        assert_eq!(pseudo_format_tag(FORMAT_TYPE_II, 0x0000_0008), TYPE_II_UNDEFINED);
        assert_eq!(pseudo_format_tag(FORMAT_TYPE_III, 0x0000_0008), IEC1937_MPEG2_EXT);
        assert_eq!(pseudo_format_tag(FORMAT_TYPE_III, 0x0000_0040), IEC1937_MPEG2_LAYER2OR3_LS);
        // MPEG-2 AAC ADTS has no tag
        assert_eq!(pseudo_format_tag(FORMAT_TYPE_III, 0x0000_0010), TYPE_III_UNDEFINED);
        assert_eq!(pseudo_format_tag(0x04, 0x0000_0001), TYPE_I_UNDEFINED);
    }

    #[test]
    fn test_undefined() {
        assert!(is_undefined(TYPE_I_UNDEFINED));
        assert!(is_undefined(TYPE_III_UNDEFINED));
        assert!(!is_undefined(MULAW));
        assert_eq!(FormatType::of_tag(AC3), FormatType::TypeII);
    }
}
