//! UAC 2.0 class-specific audio control descriptors.
//!
//! Compared to UAC 1.0, terminals name a clock entity, channel configs are
//! 32 bits wide and every control is a 2-bit access field.

use crate::{
    control::ControlInterface,
    descriptors::{AudioVersion, Descriptor},
    unit::{
        ClockMultiplier, ClockSelector, ClockSource, ClockType, EffectUnit, ExtensionUnit,
        FeatureUnit, InputTerminal, MixerUnit, OutputTerminal, ProcessingUnit,
        SampleRateConverter, SelectorUnit, Unit,
    },
    Error, Result,
};

const HEADER: u8 = 0x01;
const INPUT_TERMINAL: u8 = 0x02;
const OUTPUT_TERMINAL: u8 = 0x03;
const MIXER_UNIT: u8 = 0x04;
const SELECTOR_UNIT: u8 = 0x05;
const FEATURE_UNIT: u8 = 0x06;
const EFFECT_UNIT: u8 = 0x07;
const PROCESSING_UNIT: u8 = 0x08;
const EXTENSION_UNIT: u8 = 0x09;
const CLOCK_SOURCE: u8 = 0x0a;
const CLOCK_SELECTOR: u8 = 0x0b;
const CLOCK_MULTIPLIER: u8 = 0x0c;
const SAMPLE_RATE_CONVERTER: u8 = 0x0d;

/// Decode one class-specific descriptor of a UAC 2.0 audio control interface.
///
/// The header updates `control` and yields no unit.
pub(super) fn parse_descriptor(d: &Descriptor, control: &mut ControlInterface) -> Result<Option<Unit>> {
    let subtype = d
        .descriptor_subtype()
        .ok_or(Error::malformed(d.offset(), "missing descriptor subtype"))?;

    let unit = match subtype {
        HEADER => {
            d.require_len(9, "audio control header is too short")?;
            control.adc_version = d.u16_at(3)?;
            control.category = Some(d.u8_at(5)?);
            control.total_length = d.u16_at(6)?;
            control.controls = d.u8_at(8)?.into();
            return Ok(None);
        }
        INPUT_TERMINAL => {
            d.require_len(17, "input terminal is too short")?;
            Unit::InputTerminal(InputTerminal {
                unit_id: d.u8_at(3)?,
                terminal_type: d.u16_at(4)?,
                assoc_terminal: d.u8_at(6)?,
                clock_source_id: Some(d.u8_at(7)?),
                num_channels: d.u8_at(8)?,
                channel_config: d.u32_at(9)?,
                channel_names_string: d.u8_at(13)?,
                controls: d.u16_at(14)?,
                label_string: d.u8_at(16)?,
            })
        }
        OUTPUT_TERMINAL => {
            d.require_len(12, "output terminal is too short")?;
            Unit::OutputTerminal(OutputTerminal {
                unit_id: d.u8_at(3)?,
                terminal_type: d.u16_at(4)?,
                assoc_terminal: d.u8_at(6)?,
                source_id: d.u8_at(7)?,
                clock_source_id: Some(d.u8_at(8)?),
                controls: d.u16_at(9)?,
                label_string: d.u8_at(11)?,
            })
        }
        MIXER_UNIT => {
            let p = usize::from(d.u8_at(4)?);
            d.require_len(13 + p, "mixer unit is too short for its input pins")?;
            let len = d.descriptor_len();
            Unit::MixerUnit(MixerUnit {
                unit_id: d.u8_at(3)?,
                source_ids: d.bytes(5, p)?.to_vec(),
                num_channels: d.u8_at(5 + p)?,
                channel_config: d.u32_at(6 + p)?,
                programmable_controls: d.bytes(11 + p, len - 13 - p)?.to_vec(),
                controls: d.u8_at(len - 2)?,
                label_string: d.u8_at(len - 1)?,
            })
        }
        SELECTOR_UNIT => {
            let p = usize::from(d.u8_at(4)?);
            d.require_len(7 + p, "selector unit is too short for its input pins")?;
            Unit::SelectorUnit(SelectorUnit {
                unit_id: d.u8_at(3)?,
                source_ids: d.bytes(5, p)?.to_vec(),
                controls: d.u8_at(5 + p)?,
                label_string: d.u8_at(6 + p)?,
            })
        }
        FEATURE_UNIT => {
            d.require_len(10, "feature unit is too short for one control bitmap")?;
            let len = d.descriptor_len();
            Unit::FeatureUnit(FeatureUnit {
                unit_id: d.u8_at(3)?,
                source_id: d.u8_at(4)?,
                version: AudioVersion::Uac2,
                control_size: 4,
                controls: control_bitmaps(d, 5, (len - 6) / 4)?,
                label_string: d.u8_at(len - 1)?,
            })
        }
        EFFECT_UNIT => {
            d.require_len(8, "effect unit is too short")?;
            let len = d.descriptor_len();
            Unit::EffectUnit(EffectUnit {
                unit_id: d.u8_at(3)?,
                effect_type: d.u16_at(4)?,
                source_id: d.u8_at(6)?,
                controls: control_bitmaps(d, 7, (len - 8) / 4)?,
                label_string: d.u8_at(len - 1)?,
            })
        }
        PROCESSING_UNIT => {
            let p = usize::from(d.u8_at(6)?);
            d.require_len(16 + p, "processing unit is too short for its input pins")?;
            Unit::ProcessingUnit(ProcessingUnit {
                unit_id: d.u8_at(3)?,
                process_type: d.u16_at(4)?,
                source_ids: d.bytes(7, p)?.to_vec(),
                num_channels: d.u8_at(7 + p)?,
                channel_config: d.u32_at(8 + p)?,
                controls: d.bytes(13 + p, 2)?.to_vec(),
                label_string: d.u8_at(15 + p)?,
            })
        }
        EXTENSION_UNIT => {
            let p = usize::from(d.u8_at(6)?);
            d.require_len(15 + p, "extension unit is too short for its input pins")?;
            Unit::ExtensionUnit(ExtensionUnit {
                unit_id: d.u8_at(3)?,
                extension_code: d.u16_at(4)?,
                source_ids: d.bytes(7, p)?.to_vec(),
                num_channels: d.u8_at(7 + p)?,
                channel_config: d.u32_at(8 + p)?,
                controls: d.bytes(13 + p, 1)?.to_vec(),
                label_string: d.u8_at(14 + p)?,
            })
        }
        CLOCK_SOURCE => {
            d.require_len(8, "clock source is too short")?;
            let attributes = d.u8_at(4)?;
            Unit::ClockSource(ClockSource {
                unit_id: d.u8_at(3)?,
                clock_type: ClockType::from_attributes(attributes),
                sync_to_sof: attributes & 0x04 != 0,
                controls: d.u8_at(5)?,
                assoc_terminal: d.u8_at(6)?,
                label_string: d.u8_at(7)?,
            })
        }
        CLOCK_SELECTOR => {
            let p = usize::from(d.u8_at(4)?);
            d.require_len(7 + p, "clock selector is too short for its input pins")?;
            Unit::ClockSelector(ClockSelector {
                unit_id: d.u8_at(3)?,
                clock_source_ids: d.bytes(5, p)?.to_vec(),
                controls: d.u8_at(5 + p)?,
                label_string: d.u8_at(6 + p)?,
            })
        }
        CLOCK_MULTIPLIER => {
            d.require_len(7, "clock multiplier is too short")?;
            Unit::ClockMultiplier(ClockMultiplier {
                unit_id: d.u8_at(3)?,
                clock_source_id: d.u8_at(4)?,
                controls: d.u8_at(5)?,
                label_string: d.u8_at(6)?,
            })
        }
        SAMPLE_RATE_CONVERTER => {
            d.require_len(8, "sample rate converter is too short")?;
            Unit::SampleRateConverter(SampleRateConverter {
                unit_id: d.u8_at(3)?,
                source_id: d.u8_at(4)?,
                clock_source_in_id: d.u8_at(5)?,
                clock_source_out_id: d.u8_at(6)?,
                label_string: d.u8_at(7)?,
            })
        }
        _ => {
            return Err(Error::malformed(
                d.offset(),
                "unknown audio control descriptor subtype",
            ))
        }
    };
    Ok(Some(unit))
}

/// `count` consecutive 32-bit control bitmaps starting at `pos`.
fn control_bitmaps(d: &Descriptor, pos: usize, count: usize) -> Result<Vec<u32>> {
    (0..count).map(|i| d.u32_at(pos + 4 * i)).collect()
}
