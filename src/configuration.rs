//! The parsed configuration and its topology queries.

use crate::{
    control::ControlInterface,
    diagnostics::Diagnostic,
    parser::Parser,
    stream::{SampleRates, StreamInterface},
    unit::ClockType,
    Error, Lookup, Result,
};

/// Audio topology of one USB configuration, as seen from one audio control interface.
///
/// Built once by [`Parser`] and never modified by queries, except for
/// [`Configuration::add_sample_rates_to_stream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) configuration_value: u8,
    pub(crate) control_interface: u8,
    pub(crate) controls: Vec<ControlInterface>,
    pub(crate) streams: Vec<StreamInterface>,
    pub(crate) midi_interfaces: Vec<u8>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Configuration {
    /// Parse a configuration descriptor block with default options.
    ///
    /// `control_interface` is the audio control interface whose topology is captured.
    pub fn parse(bytes: &[u8], control_interface: u8) -> Result<Configuration> {
        Parser::new(control_interface).parse(bytes)
    }

    /// `bConfigurationValue` of the parsed configuration.
    pub fn configuration_value(&self) -> u8 {
        self.configuration_value
    }

    /// The audio control interface number this configuration was parsed for.
    pub fn control_interface_number(&self) -> u8 {
        self.control_interface
    }

    /// The target audio control interface.
    pub fn control(&self) -> Result<&ControlInterface> {
        self.controls
            .iter()
            .find(|c| c.interface_number == self.control_interface)
            .ok_or(Error::NotFound(Lookup::ControlInterface(
                self.control_interface,
            )))
    }

    /// All retained audio control interfaces.
    pub fn control_interfaces(&self) -> &[ControlInterface] {
        &self.controls
    }

    /// All parsed streaming alternate settings, in descriptor order.
    pub fn stream_interfaces(&self) -> &[StreamInterface] {
        &self.streams
    }

    pub fn stream(&self, interface: u8, alt_setting: u8) -> Result<&StreamInterface> {
        self.streams
            .iter()
            .find(|s| s.interface_number == interface && s.alternate_setting == alt_setting)
            .ok_or(Error::NotFound(Lookup::AltSetting {
                interface,
                alt_setting,
            }))
    }

    pub(crate) fn stream_mut(
        &mut self,
        interface: u8,
        alt_setting: u8,
    ) -> Result<&mut StreamInterface> {
        self.streams
            .iter_mut()
            .find(|s| s.interface_number == interface && s.alternate_setting == alt_setting)
            .ok_or(Error::NotFound(Lookup::AltSetting {
                interface,
                alt_setting,
            }))
    }

    /// Alternate settings of one streaming interface, in descriptor order.
    pub fn alt_settings(&self, interface: u8) -> impl Iterator<Item = &StreamInterface> + '_ {
        self.streams
            .iter()
            .filter(move |s| s.interface_number == interface)
    }

    /// Number of streaming interfaces claimed by the target control interface.
    pub fn num_stream_interfaces(&self) -> usize {
        self.control().map_or(0, |c| c.streams.len())
    }

    /// Lowest streaming interface number claimed by the target control interface.
    pub fn first_stream_interface_number(&self) -> Result<u8> {
        self.control()?
            .streams
            .first()
            .ok_or(Error::NotFound(Lookup::ClaimedStream {
                control: self.control_interface,
            }))
    }

    /// Streaming interface numbers claimed by the target control interface, ascending.
    pub fn controlled_stream_numbers(&self) -> Vec<u8> {
        self.control()
            .map(|c| c.streams.iter().collect())
            .unwrap_or_default()
    }

    pub fn num_alt_settings(&self, interface: u8) -> Result<usize> {
        match self.alt_settings(interface).count() {
            0 => Err(Error::NotFound(Lookup::StreamInterface(interface))),
            n => Ok(n),
        }
    }

    pub fn has_interrupt_endpoint(&self) -> Result<bool> {
        Ok(self.control()?.has_interrupt_endpoint())
    }

    pub fn num_channels(&self, interface: u8, alt_setting: u8) -> Result<u8> {
        Ok(self.stream(interface, alt_setting)?.num_channels)
    }

    pub fn bit_resolution(&self, interface: u8, alt_setting: u8) -> Result<u8> {
        Ok(self.stream(interface, alt_setting)?.bit_resolution)
    }

    pub fn subframe_size(&self, interface: u8, alt_setting: u8) -> Result<u8> {
        Ok(self.stream(interface, alt_setting)?.subframe_size)
    }

    /// `wMaxBitRate` of a type II alternate setting, 0 for other formats.
    pub fn max_bit_rate(&self, interface: u8, alt_setting: u8) -> Result<u16> {
        Ok(self
            .stream(interface, alt_setting)?
            .max_bit_rate
            .unwrap_or_default())
    }

    /// `wSamplesPerFrame` of a type II alternate setting, 0 for other formats.
    pub fn samples_per_frame(&self, interface: u8, alt_setting: u8) -> Result<u16> {
        Ok(self
            .stream(interface, alt_setting)?
            .samples_per_frame
            .unwrap_or_default())
    }

    pub fn sample_rates(&self, interface: u8, alt_setting: u8) -> Result<&SampleRates> {
        Ok(&self.stream(interface, alt_setting)?.sample_rates)
    }

    /// Format tag of an alternate setting; see [`crate::format::format_tag`].
    pub fn format(&self, interface: u8, alt_setting: u8) -> Result<u16> {
        Ok(self.stream(interface, alt_setting)?.format_tag)
    }

    pub fn terminal_link(&self, interface: u8, alt_setting: u8) -> Result<u8> {
        Ok(self.stream(interface, alt_setting)?.terminal_link)
    }

    pub fn interface_class(&self, interface: u8, alt_setting: u8) -> Result<u8> {
        Ok(self.stream(interface, alt_setting)?.class_triple.class)
    }

    pub fn interface_subclass(&self, interface: u8, alt_setting: u8) -> Result<u8> {
        Ok(self.stream(interface, alt_setting)?.class_triple.subclass)
    }

    pub fn channel_has_volume_control(&self, feature_unit: u8, channel: usize) -> Result<bool> {
        self.control()?.channel_has_volume_control(feature_unit, channel)
    }

    pub fn channel_has_mute_control(&self, feature_unit: u8, channel: usize) -> Result<bool> {
        self.control()?.channel_has_mute_control(feature_unit, channel)
    }

    pub fn master_has_mute_control(&self, feature_unit: u8) -> Result<bool> {
        self.control()?.master_has_mute_control(feature_unit)
    }

    /// Number of channel control bitmaps of a feature unit, master included.
    pub fn num_controls(&self, feature_unit: u8) -> Result<usize> {
        self.control()?.num_controls(feature_unit)
    }

    /// Whether clock source `id` has a host programmable (`programmable`) or
    /// read-only frequency control.
    pub fn clock_source_has_frequency_control(&self, id: u8, programmable: bool) -> Result<bool> {
        self.control()?
            .clock_source_has_frequency_control(id, programmable)
    }

    pub fn clock_source_has_validity_control(&self, id: u8) -> Result<bool> {
        self.control()?.clock_source_has_validity_control(id)
    }

    pub fn clock_source_clock_type(&self, id: u8) -> Result<ClockType> {
        self.control()?.clock_source_clock_type(id)
    }

    /// Clock entities referenced by the target's terminals; empty if the target is missing.
    pub fn terminal_clock_entities(&self) -> Vec<u8> {
        self.control()
            .map(|c| c.terminal_clock_entities())
            .unwrap_or_default()
    }

    /// MIDI streaming interfaces that were seen and skipped.
    pub fn midi_interfaces(&self) -> &[u8] {
        &self.midi_interfaces
    }

    /// Problems found while parsing, in the order they were found.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
