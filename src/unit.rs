//! Terminals, units and clock entities of an audio control interface.
//!
//! Every entity is identified by its `bUnitID` / `bTerminalID` / `bClockID`,
//! all of which share one ID space within an audio function. References
//! between entities are stored as those IDs, never as pointers.

use crate::descriptors::AudioVersion;

/// Access level of one control, decoded from a 2-bit UAC 2.0 control field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlAccess {
    #[default]
    NotPresent,
    ReadOnly,
    /// Host programmable.
    ReadWrite,
}

impl ControlAccess {
    /// Decode the low two bits: 0 = not present, 1 = read-only, 3 = read/write.
    ///
    /// The reserved value 2 is treated as not present.
    pub fn from_bits(bits: u32) -> ControlAccess {
        match bits & 0b11 {
            0b01 => ControlAccess::ReadOnly,
            0b11 => ControlAccess::ReadWrite,
            _ => ControlAccess::NotPresent,
        }
    }

    pub fn is_present(self) -> bool {
        self != ControlAccess::NotPresent
    }
}

/// One per-channel feature unit control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureControl {
    Mute,
    Volume,
    Bass,
    Mid,
    Treble,
    GraphicEqualizer,
    AutomaticGain,
    Delay,
    BassBoost,
    Loudness,
    /// UAC 2.0 only.
    InputGain,
    /// UAC 2.0 only.
    InputGainPad,
    /// UAC 2.0 only.
    PhaseInverter,
    /// UAC 2.0 only.
    Underflow,
    /// UAC 2.0 only.
    Overflow,
}

impl FeatureControl {
    /// Position in the control bitmap: one bit per control in UAC 1.0, two in UAC 2.0.
    fn index(self) -> u32 {
        self as u32
    }

    fn defined_in_uac1(self) -> bool {
        self.index() <= FeatureControl::Loudness.index()
    }
}

/// Clock source type, bits `[1:0]` of a clock source's `bmAttributes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockType {
    External,
    InternalFixed,
    InternalVariable,
    InternalProgrammable,
}

impl ClockType {
    pub fn from_attributes(attributes: u8) -> ClockType {
        match attributes & 0b11 {
            0 => ClockType::External,
            1 => ClockType::InternalFixed,
            2 => ClockType::InternalVariable,
            _ => ClockType::InternalProgrammable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputTerminal {
    pub unit_id: u8,
    pub terminal_type: u16,
    pub assoc_terminal: u8,
    pub num_channels: u8,
    /// Spatial location bitmap; 16 bits wide in UAC 1.0, 32 in UAC 2.0.
    pub channel_config: u32,
    /// UAC 2.0 only.
    pub clock_source_id: Option<u8>,
    /// UAC 2.0 only.
    pub controls: u16,
    pub channel_names_string: u8,
    pub label_string: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTerminal {
    pub unit_id: u8,
    pub terminal_type: u16,
    pub assoc_terminal: u8,
    pub source_id: u8,
    /// UAC 2.0 only.
    pub clock_source_id: Option<u8>,
    /// UAC 2.0 only.
    pub controls: u16,
    pub label_string: u8,
}

/// Feature unit with one control bitmap per logical channel.
///
/// `controls[0]` is the master channel, `controls[n]` is channel `n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureUnit {
    pub unit_id: u8,
    pub source_id: u8,
    pub version: AudioVersion,
    /// Bytes per channel bitmap: 1 or 2 in UAC 1.0, always 4 in UAC 2.0.
    pub control_size: u8,
    pub controls: Vec<u32>,
    pub label_string: u8,
}

impl FeatureUnit {
    /// Number of channel bitmaps, master included.
    pub fn num_controls(&self) -> usize {
        self.controls.len()
    }

    pub fn control_access(&self, channel: usize, control: FeatureControl) -> ControlAccess {
        let Some(&bitmap) = self.controls.get(channel) else {
            return ControlAccess::NotPresent;
        };
        match self.version {
            AudioVersion::Uac1 => {
                let bit = control.index();
                if !control.defined_in_uac1() || bit >= self.control_size as u32 * 8 {
                    ControlAccess::NotPresent
                } else if bitmap & (1u32 << bit) != 0 {
                    ControlAccess::ReadWrite
                } else {
                    ControlAccess::NotPresent
                }
            }
            AudioVersion::Uac2 => ControlAccess::from_bits(bitmap >> (2 * control.index())),
        }
    }

    pub fn has_control(&self, channel: usize, control: FeatureControl) -> bool {
        self.control_access(channel, control).is_present()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixerUnit {
    pub unit_id: u8,
    pub source_ids: Vec<u8>,
    pub num_channels: u8,
    pub channel_config: u32,
    /// `bmControls` / `bmMixerControls`: which input/output channel crossings are programmable.
    pub programmable_controls: Vec<u8>,
    /// UAC 2.0 only.
    pub controls: u8,
    pub label_string: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorUnit {
    pub unit_id: u8,
    pub source_ids: Vec<u8>,
    /// UAC 2.0 only.
    pub controls: u8,
    pub label_string: u8,
}

/// UAC 2.0 effect unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectUnit {
    pub unit_id: u8,
    pub effect_type: u16,
    pub source_id: u8,
    pub controls: Vec<u32>,
    pub label_string: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingUnit {
    pub unit_id: u8,
    pub process_type: u16,
    pub source_ids: Vec<u8>,
    pub num_channels: u8,
    pub channel_config: u32,
    pub controls: Vec<u8>,
    pub label_string: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionUnit {
    pub unit_id: u8,
    pub extension_code: u16,
    pub source_ids: Vec<u8>,
    pub num_channels: u8,
    pub channel_config: u32,
    pub controls: Vec<u8>,
    pub label_string: u8,
}

/// UAC 2.0 clock source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockSource {
    pub unit_id: u8,
    pub clock_type: ClockType,
    pub sync_to_sof: bool,
    /// Bits `[1:0]` frequency control, bits `[3:2]` validity control.
    pub controls: u8,
    pub assoc_terminal: u8,
    pub label_string: u8,
}

impl ClockSource {
    pub fn frequency_control(&self) -> ControlAccess {
        ControlAccess::from_bits(self.controls as u32)
    }

    pub fn validity_control(&self) -> ControlAccess {
        ControlAccess::from_bits((self.controls >> 2) as u32)
    }

    /// Whether the frequency control has exactly the requested access:
    /// host programmable if `programmable`, read-only otherwise.
    pub fn has_frequency_control(&self, programmable: bool) -> bool {
        let want = if programmable {
            ControlAccess::ReadWrite
        } else {
            ControlAccess::ReadOnly
        };
        self.frequency_control() == want
    }
}

/// UAC 2.0 clock selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockSelector {
    pub unit_id: u8,
    pub clock_source_ids: Vec<u8>,
    pub controls: u8,
    pub label_string: u8,
}

/// UAC 2.0 clock multiplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockMultiplier {
    pub unit_id: u8,
    pub clock_source_id: u8,
    pub controls: u8,
    pub label_string: u8,
}

/// UAC 2.0 sample rate converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRateConverter {
    pub unit_id: u8,
    pub source_id: u8,
    pub clock_source_in_id: u8,
    pub clock_source_out_id: u8,
    pub label_string: u8,
}

/// Any entity of an audio control topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    InputTerminal(InputTerminal),
    OutputTerminal(OutputTerminal),
    FeatureUnit(FeatureUnit),
    MixerUnit(MixerUnit),
    SelectorUnit(SelectorUnit),
    EffectUnit(EffectUnit),
    ProcessingUnit(ProcessingUnit),
    ExtensionUnit(ExtensionUnit),
    ClockSource(ClockSource),
    ClockSelector(ClockSelector),
    ClockMultiplier(ClockMultiplier),
    SampleRateConverter(SampleRateConverter),
}

impl Unit {
    pub fn id(&self) -> u8 {
        match self {
            Unit::InputTerminal(u) => u.unit_id,
            Unit::OutputTerminal(u) => u.unit_id,
            Unit::FeatureUnit(u) => u.unit_id,
            Unit::MixerUnit(u) => u.unit_id,
            Unit::SelectorUnit(u) => u.unit_id,
            Unit::EffectUnit(u) => u.unit_id,
            Unit::ProcessingUnit(u) => u.unit_id,
            Unit::ExtensionUnit(u) => u.unit_id,
            Unit::ClockSource(u) => u.unit_id,
            Unit::ClockSelector(u) => u.unit_id,
            Unit::ClockMultiplier(u) => u.unit_id,
            Unit::SampleRateConverter(u) => u.unit_id,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Unit::InputTerminal(_) => "input terminal",
            Unit::OutputTerminal(_) => "output terminal",
            Unit::FeatureUnit(_) => "feature unit",
            Unit::MixerUnit(_) => "mixer unit",
            Unit::SelectorUnit(_) => "selector unit",
            Unit::EffectUnit(_) => "effect unit",
            Unit::ProcessingUnit(_) => "processing unit",
            Unit::ExtensionUnit(_) => "extension unit",
            Unit::ClockSource(_) => "clock source",
            Unit::ClockSelector(_) => "clock selector",
            Unit::ClockMultiplier(_) => "clock multiplier",
            Unit::SampleRateConverter(_) => "sample rate converter",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Unit::InputTerminal(_) | Unit::OutputTerminal(_))
    }

    pub fn is_clock_entity(&self) -> bool {
        matches!(
            self,
            Unit::ClockSource(_) | Unit::ClockSelector(_) | Unit::ClockMultiplier(_)
        )
    }

    /// IDs of the entities feeding audio into this one.
    pub fn source_ids(&self) -> &[u8] {
        match self {
            Unit::InputTerminal(_) | Unit::ClockSource(_) => &[],
            Unit::OutputTerminal(u) => std::slice::from_ref(&u.source_id),
            Unit::FeatureUnit(u) => std::slice::from_ref(&u.source_id),
            Unit::EffectUnit(u) => std::slice::from_ref(&u.source_id),
            Unit::SampleRateConverter(u) => std::slice::from_ref(&u.source_id),
            Unit::MixerUnit(u) => &u.source_ids,
            Unit::SelectorUnit(u) => &u.source_ids,
            Unit::ProcessingUnit(u) => &u.source_ids,
            Unit::ExtensionUnit(u) => &u.source_ids,
            Unit::ClockSelector(_) | Unit::ClockMultiplier(_) => &[],
        }
    }

    /// IDs of the clock entities this entity takes its clock from.
    pub fn clock_source_ids(&self) -> Vec<u8> {
        match self {
            Unit::InputTerminal(u) => u.clock_source_id.into_iter().collect(),
            Unit::OutputTerminal(u) => u.clock_source_id.into_iter().collect(),
            Unit::ClockSelector(u) => u.clock_source_ids.clone(),
            Unit::ClockMultiplier(u) => vec![u.clock_source_id],
            Unit::SampleRateConverter(u) => vec![u.clock_source_in_id, u.clock_source_out_id],
            _ => Vec::new(),
        }
    }

    /// Index of the string descriptor naming this entity.
    pub fn label_string_index(&self) -> Option<u8> {
        let i = match self {
            Unit::InputTerminal(u) => u.label_string,
            Unit::OutputTerminal(u) => u.label_string,
            Unit::FeatureUnit(u) => u.label_string,
            Unit::MixerUnit(u) => u.label_string,
            Unit::SelectorUnit(u) => u.label_string,
            Unit::EffectUnit(u) => u.label_string,
            Unit::ProcessingUnit(u) => u.label_string,
            Unit::ExtensionUnit(u) => u.label_string,
            Unit::ClockSource(u) => u.label_string,
            Unit::ClockSelector(u) => u.label_string,
            Unit::ClockMultiplier(u) => u.label_string,
            Unit::SampleRateConverter(u) => u.label_string,
        };
        Some(i).filter(|&i| i != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uac1_feature_bits() {
        let fu = FeatureUnit {
            unit_id: 2,
            source_id: 1,
            version: AudioVersion::Uac1,
            control_size: 2,
            controls: vec![0x0201, 0x0002],
            label_string: 0,
        };
        assert_eq!(fu.num_controls(), 2);
        assert_eq!(fu.control_access(0, FeatureControl::Mute), ControlAccess::ReadWrite);
        assert!(fu.has_control(0, FeatureControl::Loudness));
        assert!(!fu.has_control(0, FeatureControl::Volume));
        assert!(fu.has_control(1, FeatureControl::Volume));
        assert!(!fu.has_control(1, FeatureControl::InputGain));
        assert!(!fu.has_control(2, FeatureControl::Volume));
    }

    #[test]
    fn test_uac2_feature_bits() {
        let fu = FeatureUnit {
            unit_id: 2,
            source_id: 1,
            version: AudioVersion::Uac2,
            control_size: 4,
            // master: mute rw, volume ro; ch1: volume rw, input gain rw
            controls: vec![0b0111, 0x0030_000C],
            label_string: 0,
        };
        assert_eq!(fu.control_access(0, FeatureControl::Mute), ControlAccess::ReadWrite);
        assert_eq!(fu.control_access(0, FeatureControl::Volume), ControlAccess::ReadOnly);
        assert_eq!(fu.control_access(1, FeatureControl::Mute), ControlAccess::NotPresent);
        assert_eq!(fu.control_access(1, FeatureControl::Volume), ControlAccess::ReadWrite);
        assert_eq!(fu.control_access(1, FeatureControl::InputGain), ControlAccess::ReadWrite);
    }

    #[test]
    fn test_clock_source_controls() {
        let cs = ClockSource {
            unit_id: 0x10,
            clock_type: ClockType::from_attributes(0x03),
            sync_to_sof: false,
            controls: 0b0111,
            assoc_terminal: 0,
            label_string: 0,
        };
        assert_eq!(cs.clock_type, ClockType::InternalProgrammable);
        assert!(cs.has_frequency_control(true));
        assert!(!cs.has_frequency_control(false));
        assert_eq!(cs.validity_control(), ControlAccess::ReadOnly);

        let u = Unit::ClockSource(cs);
        assert!(u.is_clock_entity());
        assert!(u.source_ids().is_empty());
        assert_eq!(u.label_string_index(), None);
    }
}
