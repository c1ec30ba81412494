//! Audio control interfaces and their unit topology.

use std::collections::BTreeMap;

use crate::{
    bitset::InterfaceSet,
    descriptors::{AudioVersion, ClassTriple, InterfaceDescriptor},
    endpoint::{Direction, Endpoint},
    unit::{ClockSource, ClockType, FeatureControl, FeatureUnit, Unit},
    Error, Lookup, Result,
};

/// An audio control interface and the topology it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlInterface {
    pub(crate) interface_number: u8,
    pub(crate) alternate_setting: u8,
    pub(crate) num_endpoints: u8,
    pub(crate) class_triple: ClassTriple,
    pub(crate) version: AudioVersion,
    pub(crate) adc_version: u16,
    pub(crate) category: Option<u8>,
    pub(crate) total_length: u16,
    pub(crate) controls: u32,

    /// Entities in descriptor order.
    pub(crate) units: Vec<Unit>,
    /// Entity ID to position in `units`.
    pub(crate) index: BTreeMap<u8, usize>,

    pub(crate) interrupt_endpoint: Option<Endpoint>,
    pub(crate) streams: InterfaceSet,
}

impl ControlInterface {
    pub(crate) fn new(intf: &InterfaceDescriptor, version: AudioVersion) -> ControlInterface {
        ControlInterface {
            interface_number: intf.interface_number(),
            alternate_setting: intf.alternate_setting(),
            num_endpoints: intf.num_endpoints(),
            class_triple: intf.class_triple(),
            version,
            adc_version: 0,
            category: None,
            total_length: 0,
            controls: 0,
            units: Vec::new(),
            index: BTreeMap::new(),
            interrupt_endpoint: None,
            streams: InterfaceSet::default(),
        }
    }

    /// Add an entity to the topology.
    ///
    /// Returns `false` and keeps the existing entity if the ID is already taken.
    pub(crate) fn push_unit(&mut self, unit: Unit) -> bool {
        let id = unit.id();
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id, self.units.len());
        self.units.push(unit);
        true
    }

    pub fn interface_number(&self) -> u8 {
        self.interface_number
    }

    pub fn alternate_setting(&self) -> u8 {
        self.alternate_setting
    }

    pub fn num_endpoints(&self) -> u8 {
        self.num_endpoints
    }

    pub fn class_triple(&self) -> ClassTriple {
        self.class_triple
    }

    /// Class release from the interface protocol.
    pub fn version(&self) -> AudioVersion {
        self.version
    }

    /// `bcdADC` from the class-specific header.
    pub fn adc_version(&self) -> u16 {
        self.adc_version
    }

    /// `bCategory` of a UAC 2.0 header.
    pub fn category(&self) -> Option<u8> {
        self.category
    }

    /// `wTotalLength` of the class-specific block.
    pub fn total_length(&self) -> u16 {
        self.total_length
    }

    /// `bmControls` of a UAC 2.0 header.
    pub fn controls(&self) -> u32 {
        self.controls
    }

    /// All entities in descriptor order.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: u8) -> Result<&Unit> {
        self.index
            .get(&id)
            .map(|&i| &self.units[i])
            .ok_or(Error::NotFound(Lookup::Unit(id)))
    }

    fn unit_as<'a, T>(
        &'a self,
        id: u8,
        expected: &'static str,
        f: impl FnOnce(&'a Unit) -> Option<&'a T>,
    ) -> Result<&'a T> {
        f(self.unit(id)?).ok_or(Error::NotFound(Lookup::UnitKind { id, expected }))
    }

    pub fn feature_unit(&self, id: u8) -> Result<&FeatureUnit> {
        self.unit_as(id, "feature unit", |u| match u {
            Unit::FeatureUnit(fu) => Some(fu),
            _ => None,
        })
    }

    pub fn clock_source(&self, id: u8) -> Result<&ClockSource> {
        self.unit_as(id, "clock source", |u| match u {
            Unit::ClockSource(cs) => Some(cs),
            _ => None,
        })
    }

    /// The standard interrupt endpoint for status notifications.
    pub fn interrupt_endpoint(&self) -> Option<&Endpoint> {
        self.interrupt_endpoint.as_ref()
    }

    pub fn has_interrupt_endpoint(&self) -> bool {
        self.interrupt_endpoint.is_some()
    }

    /// Streaming interfaces this control interface claims, ascending.
    pub fn controlled_streams(&self) -> &InterfaceSet {
        &self.streams
    }

    pub fn channel_has_volume_control(&self, feature_unit: u8, channel: usize) -> Result<bool> {
        Ok(self
            .feature_unit(feature_unit)?
            .has_control(channel, FeatureControl::Volume))
    }

    pub fn channel_has_mute_control(&self, feature_unit: u8, channel: usize) -> Result<bool> {
        Ok(self
            .feature_unit(feature_unit)?
            .has_control(channel, FeatureControl::Mute))
    }

    pub fn master_has_mute_control(&self, feature_unit: u8) -> Result<bool> {
        self.channel_has_mute_control(feature_unit, 0)
    }

    /// Number of channel control bitmaps of a feature unit, master included.
    pub fn num_controls(&self, feature_unit: u8) -> Result<usize> {
        Ok(self.feature_unit(feature_unit)?.num_controls())
    }

    pub fn clock_source_has_frequency_control(&self, id: u8, programmable: bool) -> Result<bool> {
        Ok(self.clock_source(id)?.has_frequency_control(programmable))
    }

    pub fn clock_source_has_validity_control(&self, id: u8) -> Result<bool> {
        Ok(self.clock_source(id)?.validity_control().is_present())
    }

    pub fn clock_source_clock_type(&self, id: u8) -> Result<ClockType> {
        Ok(self.clock_source(id)?.clock_type)
    }

    /// Clock entities referenced by terminals, without duplicates, in the order first referenced.
    pub fn terminal_clock_entities(&self) -> Vec<u8> {
        let mut ids = Vec::new();
        for unit in self.units.iter().filter(|u| u.is_terminal()) {
            for id in unit.clock_source_ids() {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    /// Clock sources a terminal can be clocked from, following selectors and multipliers.
    pub fn clock_source_ids_for(&self, terminal: u8) -> Result<Vec<u8>> {
        let unit = self.unit(terminal)?;
        if !unit.is_terminal() {
            return Err(Error::NotFound(Lookup::UnitKind {
                id: terminal,
                expected: "terminal",
            }));
        }

        let mut sources = Vec::new();
        let mut visited = Vec::new();
        let mut pending = unit.clock_source_ids();
        pending.reverse();

        while let Some(id) = pending.pop() {
            if visited.contains(&id) {
                continue;
            }
            visited.push(id);

            match self.unit(id) {
                Ok(Unit::ClockSource(_)) => sources.push(id),
                Ok(u @ (Unit::ClockSelector(_) | Unit::ClockMultiplier(_))) => {
                    pending.extend(u.clock_source_ids().into_iter().rev())
                }
                _ => {}
            }
        }
        Ok(sources)
    }

    /// Direction of the streaming endpoint attached to a terminal.
    ///
    /// An input terminal receives audio from the host (OUT), an output
    /// terminal sends audio to it (IN).
    pub fn terminal_direction(&self, terminal: u8) -> Result<Direction> {
        match self.unit(terminal)? {
            Unit::InputTerminal(_) => Ok(Direction::Out),
            Unit::OutputTerminal(_) => Ok(Direction::In),
            _ => Err(Error::NotFound(Lookup::UnitKind {
                id: terminal,
                expected: "terminal",
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        descriptors::{Descriptor, InterfaceDescriptor},
        unit::{ClockMultiplier, ClockSelector, ClockType, InputTerminal, OutputTerminal},
        ErrorKind,
    };

    fn control() -> ControlInterface {
        let d = Descriptor::new(&[0x09, 0x04, 0x00, 0x00, 0x00, 0x01, 0x01, 0x20, 0x00]).unwrap();
        ControlInterface::new(
            &InterfaceDescriptor::try_from_descriptor(d).unwrap(),
            AudioVersion::Uac2,
        )
    }

    fn clock(id: u8, controls: u8) -> Unit {
        Unit::ClockSource(ClockSource {
            unit_id: id,
            clock_type: ClockType::InternalFixed,
            sync_to_sof: false,
            controls,
            assoc_terminal: 0,
            label_string: 0,
        })
    }

    fn input_terminal(id: u8, clock: u8) -> Unit {
        Unit::InputTerminal(InputTerminal {
            unit_id: id,
            terminal_type: 0x0101,
            assoc_terminal: 0,
            num_channels: 2,
            channel_config: 3,
            clock_source_id: Some(clock),
            controls: 0,
            channel_names_string: 0,
            label_string: 0,
        })
    }

    #[test]
    fn test_duplicate_id() {
        let mut c = control();
        assert!(c.push_unit(clock(0x10, 0x01)));
        assert!(!c.push_unit(clock(0x10, 0x03)));
        assert_eq!(c.units().len(), 1);
        assert_eq!(c.clock_source(0x10).unwrap().controls, 0x01);
    }

    #[test]
    fn test_lookup_errors() {
        let mut c = control();
        c.push_unit(clock(0x10, 0x07));
        assert_eq!(
            c.feature_unit(0x10).unwrap_err(),
            Error::NotFound(Lookup::UnitKind {
                id: 0x10,
                expected: "feature unit"
            })
        );
        assert_eq!(c.num_controls(0x11).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(c.num_controls(0x11).unwrap_or_default(), 0);
        assert_eq!(c.terminal_direction(0x10).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_clock_paths() {
        let mut c = control();
        c.push_unit(clock(0x10, 0x07));
        c.push_unit(clock(0x11, 0x01));
        c.push_unit(Unit::ClockMultiplier(ClockMultiplier {
            unit_id: 0x12,
            clock_source_id: 0x11,
            controls: 0,
            label_string: 0,
        }));
        c.push_unit(Unit::ClockSelector(ClockSelector {
            unit_id: 0x20,
            clock_source_ids: vec![0x10, 0x12, 0x10],
            controls: 0,
            label_string: 0,
        }));
        c.push_unit(input_terminal(1, 0x20));
        c.push_unit(Unit::OutputTerminal(OutputTerminal {
            unit_id: 2,
            terminal_type: 0x0101,
            assoc_terminal: 0,
            source_id: 1,
            clock_source_id: Some(0x10),
            controls: 0,
            label_string: 0,
        }));
        c.push_unit(input_terminal(3, 0x20));

        assert_eq!(c.terminal_clock_entities(), vec![0x20, 0x10]);
        assert_eq!(c.clock_source_ids_for(1).unwrap(), vec![0x10, 0x11]);
        assert_eq!(c.clock_source_ids_for(2).unwrap(), vec![0x10]);
        assert!(c.clock_source_ids_for(0x20).is_err());

        assert_eq!(c.terminal_direction(1), Ok(Direction::Out));
        assert_eq!(c.terminal_direction(2), Ok(Direction::In));
        assert_eq!(c.clock_source_clock_type(0x11), Ok(ClockType::InternalFixed));
        assert_eq!(c.clock_source_has_validity_control(0x11), Ok(false));
        assert_eq!(c.clock_source_has_validity_control(0x10), Ok(true));
    }
}
