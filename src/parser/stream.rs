//! Class-specific audio streaming interface and endpoint descriptors.

use log::debug;

use crate::{
    descriptors::{AudioVersion, Descriptor},
    endpoint::{IsocStreamAttributes, LockDelayUnits},
    format::{self, format_tag, FormatSpecific, FormatType},
    stream::{SampleRates, StreamInterface},
    Error, Result,
};

const AS_GENERAL: u8 = 0x01;
const FORMAT_TYPE: u8 = 0x02;
/// UAC 1.0 only.
const FORMAT_SPECIFIC: u8 = 0x03;
/// UAC 2.0 only.
const ENCODER: u8 = 0x03;
/// UAC 2.0 only.
const DECODER: u8 = 0x04;

const EP_GENERAL: u8 = 0x01;

/// `bDecoder` values of a UAC 2.0 decoder descriptor.
const DECODER_MPEG: u8 = 0x02;
const DECODER_AC3: u8 = 0x03;

pub(super) fn parse_cs_interface(d: &Descriptor, s: &mut StreamInterface) -> Result<()> {
    let subtype = d
        .descriptor_subtype()
        .ok_or(Error::malformed(d.offset(), "missing descriptor subtype"))?;

    match (s.version, subtype) {
        (AudioVersion::Uac1, AS_GENERAL) => {
            d.require_len(7, "AS_GENERAL descriptor is too short")?;
            s.terminal_link = d.u8_at(3)?;
            s.delay = d.u8_at(4)?;
            s.format_tag = d.u16_at(5)?;
            s.format_type = FormatType::of_tag(s.format_tag);
        }
        (AudioVersion::Uac2, AS_GENERAL) => {
            d.require_len(16, "AS_GENERAL descriptor is too short")?;
            let format_type = d.u8_at(5)?;
            let formats = d.u32_at(6)?;
            s.terminal_link = d.u8_at(3)?;
            s.controls = d.u8_at(4)?;
            s.format_type = format_type.into();
            s.format_tag = format::pseudo_format_tag(format_type, formats);
            s.num_channels = d.u8_at(10)?;
            s.channel_config = d.u32_at(11)?;
            if format_tag::is_undefined(s.format_tag) {
                debug!("bmFormats 0x{formats:08X} of format type {format_type} has no format tag");
            }
        }
        (_, FORMAT_TYPE) => format_type(d, s)?,
        (AudioVersion::Uac1, FORMAT_SPECIFIC) => format_specific(d, s)?,
        (AudioVersion::Uac2, ENCODER) => {
            debug!("ignoring encoder descriptor at offset {}", d.offset());
        }
        (AudioVersion::Uac2, DECODER) => decoder(d, s)?,
        _ => {
            return Err(Error::malformed(
                d.offset(),
                "unknown audio streaming descriptor subtype",
            ))
        }
    }
    Ok(())
}

fn format_type(d: &Descriptor, s: &mut StreamInterface) -> Result<()> {
    d.require_len(4, "format type descriptor is too short")?;
    let format_type = FormatType::from(d.u8_at(3)?);

    match (s.version, format_type) {
        (AudioVersion::Uac1, FormatType::TypeI | FormatType::TypeIII) => {
            d.require_len(8, "type I/III format descriptor is too short")?;
            let rates = sample_rates(d, 7)?;
            s.num_channels = d.u8_at(4)?;
            s.subframe_size = d.u8_at(5)?;
            s.bit_resolution = d.u8_at(6)?;
            s.sample_rates = rates;
        }
        (AudioVersion::Uac1, FormatType::TypeII) => {
            d.require_len(9, "type II format descriptor is too short")?;
            let rates = sample_rates(d, 8)?;
            s.max_bit_rate = Some(d.u16_at(4)?);
            s.samples_per_frame = Some(d.u16_at(6)?);
            s.sample_rates = rates;
        }
        (AudioVersion::Uac2, FormatType::TypeI | FormatType::TypeIII) => {
            d.require_len(6, "type I/III format descriptor is too short")?;
            s.subframe_size = d.u8_at(4)?;
            s.bit_resolution = d.u8_at(5)?;
        }
        (AudioVersion::Uac2, FormatType::TypeII) => {
            d.require_len(8, "type II format descriptor is too short")?;
            s.max_bit_rate = Some(d.u16_at(4)?);
            s.samples_per_frame = Some(d.u16_at(6)?);
        }
        (_, other) => debug!("format type {other:?} at offset {} not decoded", d.offset()),
    }
    s.format_type = format_type;
    Ok(())
}

/// Decode `bSamFreqType` at `pos` and the rate table following it.
fn sample_rates(d: &Descriptor, pos: usize) -> Result<SampleRates> {
    match usize::from(d.u8_at(pos)?) {
        0 => Ok(SampleRates::from_range(
            d.u24_at(pos + 1)?,
            d.u24_at(pos + 4)?,
        )),
        n => (0..n)
            .map(|i| d.u24_at(pos + 1 + 3 * i))
            .collect::<Result<Vec<u32>>>()
            .map(SampleRates::Discrete),
    }
}

fn format_specific(d: &Descriptor, s: &mut StreamInterface) -> Result<()> {
    d.require_len(5, "format specific descriptor is too short")?;
    match d.u16_at(3)? {
        format_tag::MPEG => {
            d.require_len(8, "MPEG format specific descriptor is too short")?;
            s.format_specific = Some(FormatSpecific::Mpeg {
                capabilities: d.u16_at(5)?,
                features: d.u8_at(7)?,
            });
        }
        format_tag::AC3 => {
            d.require_len(10, "AC-3 format specific descriptor is too short")?;
            s.format_specific = Some(FormatSpecific::Ac3 {
                bsid: d.u32_at(5)?,
                features: d.u8_at(9)?,
            });
        }
        tag => debug!("format specific descriptor for tag 0x{tag:04X} not decoded"),
    }
    Ok(())
}

fn decoder(d: &Descriptor, s: &mut StreamInterface) -> Result<()> {
    d.require_len(5, "decoder descriptor is too short")?;
    match d.u8_at(4)? {
        DECODER_MPEG => {
            d.require_len(10, "MPEG decoder descriptor is too short")?;
            s.format_specific = Some(FormatSpecific::Mpeg {
                capabilities: d.u16_at(5)?,
                features: d.u8_at(7)?,
            });
        }
        DECODER_AC3 => {
            d.require_len(12, "AC-3 decoder descriptor is too short")?;
            s.format_specific = Some(FormatSpecific::Ac3 {
                bsid: d.u32_at(5)?,
                features: d.u8_at(9)?,
            });
        }
        other => debug!("decoder type {other} not decoded"),
    }
    Ok(())
}

pub(super) fn parse_cs_endpoint(d: &Descriptor, s: &mut StreamInterface) -> Result<()> {
    if d.descriptor_subtype() != Some(EP_GENERAL) {
        debug!("ignoring class-specific endpoint descriptor at offset {}", d.offset());
        return Ok(());
    }

    let attributes = match s.version {
        AudioVersion::Uac1 => {
            d.require_len(7, "EP_GENERAL descriptor is too short")?;
            let attributes = d.u8_at(3)?;
            IsocStreamAttributes {
                has_sample_freq_control: attributes & 0x01 != 0,
                has_pitch_control: attributes & 0x02 != 0,
                max_packets_only: attributes & 0x80 != 0,
                lock_delay_units: LockDelayUnits::from(d.u8_at(4)?),
                lock_delay: d.u16_at(5)?,
            }
        }
        AudioVersion::Uac2 => {
            d.require_len(8, "EP_GENERAL descriptor is too short")?;
            IsocStreamAttributes {
                has_sample_freq_control: false,
                has_pitch_control: d.u8_at(4)? & 0x03 != 0,
                max_packets_only: d.u8_at(3)? & 0x80 != 0,
                lock_delay_units: LockDelayUnits::from(d.u8_at(5)?),
                lock_delay: d.u16_at(6)?,
            }
        }
    };
    s.isoc_attributes = Some(attributes);
    Ok(())
}
