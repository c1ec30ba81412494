//! Audio streaming interface alternate settings.

use crate::{
    descriptors::{AudioVersion, ClassTriple, InterfaceDescriptor},
    endpoint::{Direction, Endpoint, IsocStreamAttributes, UsageType},
    format::{FormatSpecific, FormatType},
};

/// Sample rates an alternate setting supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleRates {
    /// A list of discrete rates in Hz.
    Discrete(Vec<u32>),
    /// Any rate in the inclusive range.
    Range { min: u32, max: u32 },
}

impl Default for SampleRates {
    fn default() -> Self {
        SampleRates::Discrete(Vec::new())
    }
}

impl SampleRates {
    /// Continuous range from a `bSamFreqType == 0` descriptor.
    ///
    /// A range whose bounds are equal is a single discrete rate.
    pub fn from_range(a: u32, b: u32) -> SampleRates {
        if a == b {
            SampleRates::Discrete(vec![a])
        } else {
            SampleRates::Range {
                min: a.min(b),
                max: a.max(b),
            }
        }
    }

    pub fn supports(&self, rate: u32) -> bool {
        match self {
            SampleRates::Discrete(rates) => rates.contains(&rate),
            SampleRates::Range { min, max } => (*min..=*max).contains(&rate),
        }
    }

    pub fn lowest(&self) -> Option<u32> {
        match self {
            SampleRates::Discrete(rates) => rates.iter().copied().min(),
            SampleRates::Range { min, .. } => Some(*min),
        }
    }

    pub fn highest(&self) -> Option<u32> {
        match self {
            SampleRates::Discrete(rates) => rates.iter().copied().max(),
            SampleRates::Range { max, .. } => Some(*max),
        }
    }

    /// Number of values as encoded: the discrete count, or 2 for a range.
    pub fn len(&self) -> usize {
        match self {
            SampleRates::Discrete(rates) => rates.len(),
            SampleRates::Range { .. } => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The encoded values: the discrete list, or `[min, max]` for a range.
    pub fn to_vec(&self) -> Vec<u32> {
        match self {
            SampleRates::Discrete(rates) => rates.clone(),
            SampleRates::Range { min, max } => vec![*min, *max],
        }
    }
}

/// One alternate setting of one audio streaming interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInterface {
    pub(crate) interface_number: u8,
    pub(crate) alternate_setting: u8,
    pub(crate) num_endpoints: u8,
    pub(crate) class_triple: ClassTriple,
    pub(crate) version: AudioVersion,
    pub(crate) control_interface: u8,

    pub(crate) terminal_link: u8,
    pub(crate) delay: u8,
    pub(crate) controls: u8,

    pub(crate) format_type: FormatType,
    pub(crate) format_tag: u16,
    pub(crate) num_channels: u8,
    pub(crate) channel_config: u32,
    pub(crate) subframe_size: u8,
    pub(crate) bit_resolution: u8,
    pub(crate) sample_rates: SampleRates,
    pub(crate) max_bit_rate: Option<u16>,
    pub(crate) samples_per_frame: Option<u16>,
    pub(crate) format_specific: Option<FormatSpecific>,

    pub(crate) endpoints: Vec<Endpoint>,
    pub(crate) isoc_attributes: Option<IsocStreamAttributes>,
}

impl StreamInterface {
    pub(crate) fn new(
        intf: &InterfaceDescriptor,
        version: AudioVersion,
        control_interface: u8,
    ) -> StreamInterface {
        StreamInterface {
            interface_number: intf.interface_number(),
            alternate_setting: intf.alternate_setting(),
            num_endpoints: intf.num_endpoints(),
            class_triple: intf.class_triple(),
            version,
            control_interface,
            terminal_link: 0,
            delay: 0,
            controls: 0,
            format_type: FormatType::Undefined,
            format_tag: 0,
            num_channels: 0,
            channel_config: 0,
            subframe_size: 0,
            bit_resolution: 0,
            sample_rates: SampleRates::default(),
            max_bit_rate: None,
            samples_per_frame: None,
            format_specific: None,
            endpoints: Vec::new(),
            isoc_attributes: None,
        }
    }

    /// `bInterfaceNumber`.
    pub fn interface_number(&self) -> u8 {
        self.interface_number
    }

    /// `bAlternateSetting`.
    pub fn alternate_setting(&self) -> u8 {
        self.alternate_setting
    }

    pub fn num_endpoints(&self) -> u8 {
        self.num_endpoints
    }

    pub fn class_triple(&self) -> ClassTriple {
        self.class_triple
    }

    pub fn version(&self) -> AudioVersion {
        self.version
    }

    /// Interface number of the audio control interface this stream belongs to.
    pub fn control_interface(&self) -> u8 {
        self.control_interface
    }

    /// ID of the terminal this stream connects to.
    pub fn terminal_link(&self) -> u8 {
        self.terminal_link
    }

    /// `bDelay` in frames (UAC 1.0 only).
    pub fn delay(&self) -> u8 {
        self.delay
    }

    /// `bmControls` of the class-specific interface descriptor (UAC 2.0 only).
    pub fn controls(&self) -> u8 {
        self.controls
    }

    pub fn format_type(&self) -> FormatType {
        self.format_type
    }

    /// `wFormatTag`, or the pseudo-tag derived from `bmFormats` for UAC 2.0.
    pub fn format_tag(&self) -> u16 {
        self.format_tag
    }

    pub fn num_channels(&self) -> u8 {
        self.num_channels
    }

    /// Spatial location bitmap (UAC 2.0 only).
    pub fn channel_config(&self) -> u32 {
        self.channel_config
    }

    /// Bytes per audio subframe (`bSubframeSize` / `bSubslotSize`).
    pub fn subframe_size(&self) -> u8 {
        self.subframe_size
    }

    pub fn bit_resolution(&self) -> u8 {
        self.bit_resolution
    }

    pub fn sample_rates(&self) -> &SampleRates {
        &self.sample_rates
    }

    /// `wMaxBitRate` in kbit/s of a type II format.
    pub fn max_bit_rate(&self) -> Option<u16> {
        self.max_bit_rate
    }

    /// `wSamplesPerFrame` / `wSlotsPerFrame` of a type II format.
    pub fn samples_per_frame(&self) -> Option<u16> {
        self.samples_per_frame
    }

    pub fn format_specific(&self) -> Option<&FormatSpecific> {
        self.format_specific.as_ref()
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn isoc_attributes(&self) -> Option<&IsocStreamAttributes> {
        self.isoc_attributes.as_ref()
    }

    pub(crate) fn add_endpoint(&mut self, ep: Endpoint) {
        // UAC 2.0 endpoints have no bSynchAddress; an explicit feedback endpoint serves the data endpoint before it
        if self.version == AudioVersion::Uac2 && ep.usage_type() == UsageType::Feedback {
            if let Some(data) = self.endpoints.last_mut() {
                if data.is_isoc_streaming() && data.sync_address.is_none() {
                    data.sync_address = Some(ep.address());
                }
            }
        }
        self.endpoints.push(ep);
    }

    /// The isochronous endpoint carrying audio data, ignoring endpoints that serve as another's sync endpoint.
    pub fn data_endpoint(&self) -> Option<&Endpoint> {
        self.endpoints.iter().find(|ep| {
            ep.is_isoc_streaming()
                && !self
                    .endpoints
                    .iter()
                    .any(|other| other.sync_address() == Some(ep.address()))
        })
    }

    /// The isochronous data endpoint with the given direction.
    pub fn isoc_endpoint(&self, direction: Direction) -> Option<&Endpoint> {
        self.endpoints
            .iter()
            .find(|ep| ep.is_isoc_streaming() && ep.direction() == direction)
    }

    /// The synchronization endpoint serving the data endpoint at `data_address`.
    pub fn associated_endpoint(&self, data_address: u8) -> Option<&Endpoint> {
        let data = self.endpoints.iter().find(|ep| ep.address() == data_address)?;
        match data.sync_address() {
            Some(sync) => self.endpoints.iter().find(|ep| ep.address() == sync),
            None => self
                .endpoints
                .iter()
                .find(|ep| ep.is_isoc_feedback() && ep.direction() != data.direction()),
        }
    }

    /// Whether this alternate setting moves any audio data.
    pub fn has_streaming_endpoint(&self) -> bool {
        self.endpoints
            .iter()
            .any(|ep| ep.is_isoc_streaming() && ep.max_packet_size() != 0)
    }
}
