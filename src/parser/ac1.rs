//! UAC 1.0 class-specific audio control descriptors.

use crate::{
    bitset::InterfaceSet,
    control::ControlInterface,
    descriptors::{AudioVersion, Descriptor},
    unit::{
        ExtensionUnit, FeatureUnit, InputTerminal, MixerUnit, OutputTerminal, ProcessingUnit,
        SelectorUnit, Unit,
    },
    Error, Result,
};

const HEADER: u8 = 0x01;
const INPUT_TERMINAL: u8 = 0x02;
const OUTPUT_TERMINAL: u8 = 0x03;
const MIXER_UNIT: u8 = 0x04;
const SELECTOR_UNIT: u8 = 0x05;
const FEATURE_UNIT: u8 = 0x06;
const PROCESSING_UNIT: u8 = 0x07;
const EXTENSION_UNIT: u8 = 0x08;

/// Decode one class-specific descriptor of a UAC 1.0 audio control interface.
///
/// The header updates `control` and yields no unit.
pub(super) fn parse_descriptor(d: &Descriptor, control: &mut ControlInterface) -> Result<Option<Unit>> {
    let subtype = d
        .descriptor_subtype()
        .ok_or(Error::malformed(d.offset(), "missing descriptor subtype"))?;

    let unit = match subtype {
        HEADER => {
            header(d, control)?;
            return Ok(None);
        }
        INPUT_TERMINAL => Unit::InputTerminal(input_terminal(d)?),
        OUTPUT_TERMINAL => Unit::OutputTerminal(output_terminal(d)?),
        MIXER_UNIT => Unit::MixerUnit(mixer_unit(d)?),
        SELECTOR_UNIT => Unit::SelectorUnit(selector_unit(d)?),
        FEATURE_UNIT => Unit::FeatureUnit(feature_unit(d)?),
        PROCESSING_UNIT => Unit::ProcessingUnit(processing_unit(d)?),
        EXTENSION_UNIT => Unit::ExtensionUnit(extension_unit(d)?),
        _ => {
            return Err(Error::malformed(
                d.offset(),
                "unknown audio control descriptor subtype",
            ))
        }
    };
    Ok(Some(unit))
}

fn header(d: &Descriptor, control: &mut ControlInterface) -> Result<()> {
    d.require_len(8, "audio control header is too short")?;
    let in_collection = usize::from(d.u8_at(7)?);
    let streams = d.bytes(8, in_collection)?;

    control.adc_version = d.u16_at(3)?;
    control.total_length = d.u16_at(5)?;
    control.streams = streams.iter().copied().collect::<InterfaceSet>();
    Ok(())
}

fn input_terminal(d: &Descriptor) -> Result<InputTerminal> {
    d.require_len(12, "input terminal is too short")?;
    Ok(InputTerminal {
        unit_id: d.u8_at(3)?,
        terminal_type: d.u16_at(4)?,
        assoc_terminal: d.u8_at(6)?,
        num_channels: d.u8_at(7)?,
        channel_config: d.u16_at(8)?.into(),
        clock_source_id: None,
        controls: 0,
        channel_names_string: d.u8_at(10)?,
        label_string: d.u8_at(11)?,
    })
}

fn output_terminal(d: &Descriptor) -> Result<OutputTerminal> {
    d.require_len(9, "output terminal is too short")?;
    Ok(OutputTerminal {
        unit_id: d.u8_at(3)?,
        terminal_type: d.u16_at(4)?,
        assoc_terminal: d.u8_at(6)?,
        source_id: d.u8_at(7)?,
        clock_source_id: None,
        controls: 0,
        label_string: d.u8_at(8)?,
    })
}

fn mixer_unit(d: &Descriptor) -> Result<MixerUnit> {
    let p = usize::from(d.u8_at(4)?);
    d.require_len(10 + p, "mixer unit is too short for its input pins")?;
    let len = d.descriptor_len();
    Ok(MixerUnit {
        unit_id: d.u8_at(3)?,
        source_ids: d.bytes(5, p)?.to_vec(),
        num_channels: d.u8_at(5 + p)?,
        channel_config: d.u16_at(6 + p)?.into(),
        programmable_controls: d.bytes(9 + p, len - 10 - p)?.to_vec(),
        controls: 0,
        label_string: d.u8_at(len - 1)?,
    })
}

fn selector_unit(d: &Descriptor) -> Result<SelectorUnit> {
    let p = usize::from(d.u8_at(4)?);
    d.require_len(6 + p, "selector unit is too short for its input pins")?;
    Ok(SelectorUnit {
        unit_id: d.u8_at(3)?,
        source_ids: d.bytes(5, p)?.to_vec(),
        controls: 0,
        label_string: d.u8_at(5 + p)?,
    })
}

fn feature_unit(d: &Descriptor) -> Result<FeatureUnit> {
    d.require_len(6, "feature unit is too short")?;
    let control_size = d.u8_at(5)?;
    if control_size == 0 {
        return Err(Error::malformed(d.offset(), "feature unit bControlSize is zero"));
    }
    let size = usize::from(control_size);
    d.require_len(7 + size, "feature unit is too short for one control bitmap")?;

    let len = d.descriptor_len();
    let count = (len - 7) / size;
    let controls = (0..count)
        .map(|i| d.bitmap_at(6 + i * size, size))
        .collect::<Result<Vec<u32>>>()?;

    Ok(FeatureUnit {
        unit_id: d.u8_at(3)?,
        source_id: d.u8_at(4)?,
        version: AudioVersion::Uac1,
        control_size,
        controls,
        label_string: d.u8_at(len - 1)?,
    })
}

/// Pins, channel cluster and control bitmap shared by processing and extension units.
struct ProcessingLayout {
    source_ids: Vec<u8>,
    num_channels: u8,
    channel_config: u32,
    controls: Vec<u8>,
    label_string: u8,
}

fn processing_layout(d: &Descriptor) -> Result<ProcessingLayout> {
    let p = usize::from(d.u8_at(6)?);
    d.require_len(13 + p, "processing unit is too short for its input pins")?;
    let n = usize::from(d.u8_at(11 + p)?);
    d.require_len(13 + p + n, "processing unit is too short for its controls")?;
    Ok(ProcessingLayout {
        source_ids: d.bytes(7, p)?.to_vec(),
        num_channels: d.u8_at(7 + p)?,
        channel_config: d.u16_at(8 + p)?.into(),
        controls: d.bytes(12 + p, n)?.to_vec(),
        label_string: d.u8_at(12 + p + n)?,
    })
}

fn processing_unit(d: &Descriptor) -> Result<ProcessingUnit> {
    let layout = processing_layout(d)?;
    Ok(ProcessingUnit {
        unit_id: d.u8_at(3)?,
        process_type: d.u16_at(4)?,
        source_ids: layout.source_ids,
        num_channels: layout.num_channels,
        channel_config: layout.channel_config,
        controls: layout.controls,
        label_string: layout.label_string,
    })
}

fn extension_unit(d: &Descriptor) -> Result<ExtensionUnit> {
    let layout = processing_layout(d)?;
    Ok(ExtensionUnit {
        unit_id: d.u8_at(3)?,
        extension_code: d.u16_at(4)?,
        source_ids: layout.source_ids,
        num_channels: layout.num_channels,
        channel_config: layout.channel_config,
        controls: layout.controls,
        label_string: layout.label_string,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{descriptors::InterfaceDescriptor, ErrorKind};

    fn control() -> ControlInterface {
        let d = Descriptor::new(&[0x09, 0x04, 0x00, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00]).unwrap();
        ControlInterface::new(
            &InterfaceDescriptor::try_from_descriptor(d).unwrap(),
            AudioVersion::Uac1,
        )
    }

    fn parse(bytes: &[u8]) -> Result<Option<Unit>> {
        parse_descriptor(&Descriptor::new(bytes).unwrap(), &mut control())
    }

    #[test]
    fn test_header() {
        let mut c = control();
        let d = Descriptor::new(&[0x0a, 0x24, 0x01, 0x00, 0x01, 0x28, 0x00, 0x02, 0x01, 0x02]).unwrap();
        assert_eq!(parse_descriptor(&d, &mut c), Ok(None));
        assert_eq!(c.adc_version(), 0x0100);
        assert_eq!(c.total_length(), 40);
        assert_eq!(c.controlled_streams().iter().collect::<Vec<_>>(), vec![1, 2]);

        // bInCollection larger than the descriptor
        let d = Descriptor::new(&[0x09, 0x24, 0x01, 0x00, 0x01, 0x28, 0x00, 0x02, 0x01]).unwrap();
        assert_eq!(
            parse_descriptor(&d, &mut c).unwrap_err().kind(),
            ErrorKind::MalformedDescriptor
        );
    }

    #[test]
    #[rustfmt::skip]
    fn test_terminals() {
        let Ok(Some(Unit::InputTerminal(it))) = parse(&[
            0x0c, 0x24, 0x02, 0x01, 0x01, 0x01, 0x00, 0x02, 0x03, 0x00, 0x00, 0x00,
        ]) else { panic!() };
        assert_eq!(it.unit_id, 1);
        assert_eq!(it.terminal_type, 0x0101);
        assert_eq!(it.num_channels, 2);
        assert_eq!(it.channel_config, 3);
        assert_eq!(it.clock_source_id, None);

        let Ok(Some(Unit::OutputTerminal(ot))) = parse(&[
            0x09, 0x24, 0x03, 0x03, 0x01, 0x03, 0x00, 0x02, 0x00,
        ]) else { panic!() };
        assert_eq!(ot.terminal_type, 0x0301);
        assert_eq!(ot.source_id, 2);
    }

    #[test]
    #[rustfmt::skip]
    fn test_feature_unit() {
        let Ok(Some(Unit::FeatureUnit(fu))) = parse(&[
            0x0a, 0x24, 0x06, 0x02, 0x01, 0x01, 0x03, 0x03, 0x03, 0x00,
        ]) else { panic!() };
        assert_eq!(fu.control_size, 1);
        assert_eq!(fu.controls, vec![3, 3, 3]);

        let Ok(Some(Unit::FeatureUnit(fu))) = parse(&[
            0x0b, 0x24, 0x06, 0x02, 0x01, 0x02, 0x01, 0x00, 0x02, 0x02, 0x00,
        ]) else { panic!() };
        assert_eq!(fu.controls, vec![0x0001, 0x0202]);

        assert_eq!(
            parse(&[0x08, 0x24, 0x06, 0x02, 0x01, 0x00, 0x03, 0x00]),
            Err(Error::malformed(0, "feature unit bControlSize is zero"))
        );
        // bLength < 7 + bControlSize
        assert_eq!(
            parse(&[0x08, 0x24, 0x06, 0x02, 0x01, 0x02, 0x03, 0x00]).unwrap_err().kind(),
            ErrorKind::MalformedDescriptor
        );
    }

    #[test]
    #[rustfmt::skip]
    fn test_variable_units() {
        let Ok(Some(Unit::MixerUnit(mu))) = parse(&[
            0x0d, 0x24, 0x04, 0x05,
            0x02, 0x01, 0x02,       // two input pins
            0x02, 0x03, 0x00, 0x00, // channel cluster
            0xff,                   // bmControls
            0x00,
        ]) else { panic!() };
        assert_eq!(mu.source_ids, vec![1, 2]);
        assert_eq!(mu.num_channels, 2);
        assert_eq!(mu.channel_config, 3);
        assert_eq!(mu.programmable_controls, vec![0xff]);

        let Ok(Some(Unit::SelectorUnit(su))) = parse(&[
            0x08, 0x24, 0x05, 0x06, 0x02, 0x01, 0x05, 0x07,
        ]) else { panic!() };
        assert_eq!(su.source_ids, vec![1, 5]);
        assert_eq!(su.label_string, 7);

        let Ok(Some(Unit::ProcessingUnit(pu))) = parse(&[
            0x0f, 0x24, 0x07, 0x07, 0x02, 0x00,
            0x01, 0x06,             // one input pin
            0x02, 0x03, 0x00, 0x00, // channel cluster
            0x01, 0x01,             // bControlSize, bmControls
            0x00,
        ]) else { panic!() };
        assert_eq!(pu.process_type, 0x0002);
        assert_eq!(pu.source_ids, vec![6]);
        assert_eq!(pu.controls, vec![0x01]);

        let Ok(Some(Unit::ExtensionUnit(xu))) = parse(&[
            0x0e, 0x24, 0x08, 0x08, 0x34, 0x12,
            0x01, 0x07,
            0x01, 0x04, 0x00, 0x00,
            0x00,                   // no controls
            0x09,
        ]) else { panic!() };
        assert_eq!(xu.extension_code, 0x1234);
        assert!(xu.controls.is_empty());
        assert_eq!(xu.label_string, 9);

        // selector claiming more pins than it carries
        assert_eq!(
            parse(&[0x07, 0x24, 0x05, 0x06, 0x04, 0x01, 0x00]).unwrap_err().kind(),
            ErrorKind::MalformedDescriptor
        );
        assert_eq!(
            parse(&[0x04, 0x24, 0x0a, 0x01]).unwrap_err().kind(),
            ErrorKind::MalformedDescriptor
        );
    }
}
