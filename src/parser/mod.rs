//! Walk a configuration descriptor block and build a [`Configuration`].
//!
//! The outer loop classifies each standard interface descriptor and hands
//! the descriptors that follow it to the audio control ([`ac1`], [`ac2`]) or
//! audio streaming ([`stream`]) parsers until the next interface begins.
//!
//! A descriptor whose fields are inconsistent is reported and skipped. A
//! descriptor that runs past the end of the block, or has a zero `bLength`,
//! stops the walk; everything completed before it is kept.

use log::{debug, trace};

use crate::{
    bitset::InterfaceSet,
    configuration::Configuration,
    control::ControlInterface,
    descriptors::{
        validate_config_descriptor, AudioVersion, ConfigurationDescriptor, Cursor, Descriptor,
        EndpointDescriptor, InterfaceAssociationDescriptor, InterfaceDescriptor, CLASS_AUDIO,
        DESCRIPTOR_TYPE_CS_ENDPOINT, DESCRIPTOR_TYPE_CS_INTERFACE, DESCRIPTOR_TYPE_ENDPOINT,
        DESCRIPTOR_TYPE_INTERFACE, DESCRIPTOR_TYPE_INTERFACE_ASSOCIATION, SUBCLASS_AUDIOCONTROL,
        SUBCLASS_AUDIOSTREAMING, SUBCLASS_MIDISTREAMING,
    },
    diagnostics::{DiagnosticKind, Diagnostics},
    endpoint::Endpoint,
    stream::StreamInterface,
    unit::Unit,
    Error, Result,
};

mod ac1;
mod ac2;
mod stream;


/// `HEADER` subtype, shared by both class releases.
const AC_HEADER: u8 = 0x01;

/// Options for parsing a configuration descriptor block.
///
/// ```
/// # let bytes = [0x09, 0x02, 0x09, 0x00, 0x00, 0x01, 0x00, 0x80, 0x32];
/// let config = uac_topology::Parser::new(0)
///     .validate_topology(false)
///     .parse(&bytes)
///     .unwrap();
/// assert_eq!(config.num_stream_interfaces(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    control_interface: u8,
    dump_descriptors: bool,
    validate_topology: bool,
}

impl Parser {
    /// Parse the topology of audio control interface `control_interface`.
    pub fn new(control_interface: u8) -> Parser {
        Parser {
            control_interface,
            dump_descriptors: false,
            validate_topology: true,
        }
    }

    /// Log every descriptor visited at `trace` level.
    pub fn dump_descriptors(mut self, enable: bool) -> Self {
        self.dump_descriptors = enable;
        self
    }

    /// Check unit references, terminal links and endpoint directions after
    /// parsing, reporting violations as diagnostics. Enabled by default.
    pub fn validate_topology(mut self, enable: bool) -> Self {
        self.validate_topology = enable;
        self
    }

    /// Parse a configuration descriptor block.
    ///
    /// Fails only if the block does not start with a usable configuration
    /// descriptor. Problems inside the block are reported through
    /// [`Configuration::diagnostics`].
    pub fn parse(&self, bytes: &[u8]) -> Result<Configuration> {
        let total_len = validate_config_descriptor(bytes)?;

        // one zero byte past the end in case a reader of the last descriptor overruns
        let mut buf = Vec::with_capacity(total_len + 1);
        buf.extend_from_slice(&bytes[..total_len]);
        buf.push(0);

        let mut walk = Walk {
            parser: self,
            cursor: Cursor::new(&buf[..total_len]),
            diagnostics: Diagnostics::default(),
            association: None,
            controls: Vec::new(),
            streams: Vec::new(),
            midi_interfaces: Vec::new(),
        };

        let configuration_value = walk.configuration_header()?;
        if let Err(e) = walk.run() {
            walk.diagnostics.error(e);
        }
        walk.remove_orphans();
        if self.validate_topology {
            walk.validate();
        }

        Ok(Configuration {
            configuration_value,
            control_interface: self.control_interface,
            controls: walk.controls,
            streams: walk.streams,
            midi_interfaces: walk.midi_interfaces,
            diagnostics: walk.diagnostics.into_vec(),
        })
    }
}

/// State of one pass over a descriptor block.
struct Walk<'p, 'a> {
    parser: &'p Parser,
    cursor: Cursor<'a>,
    diagnostics: Diagnostics,
    /// Most recent audio function interface association.
    association: Option<InterfaceAssociationDescriptor<'a>>,
    controls: Vec<ControlInterface>,
    streams: Vec<StreamInterface>,
    midi_interfaces: Vec<u8>,
}

impl<'p, 'a> Walk<'p, 'a> {
    fn peek(&self) -> Result<Option<Descriptor<'a>>> {
        let d = self.cursor.peek()?;
        if let Some(d) = &d {
            if self.parser.dump_descriptors {
                trace!("{d:?}");
            }
        }
        Ok(d)
    }

    fn advance(&mut self) -> Result<()> {
        self.cursor.next_descriptor()?;
        Ok(())
    }

    fn configuration_header(&mut self) -> Result<u8> {
        let d = self.peek()?.ok_or(Error::malformed(0, "missing configuration descriptor"))?;
        let config = ConfigurationDescriptor::try_from_descriptor(d)?;
        self.advance()?;
        Ok(config.configuration_value())
    }

    /// The outer loop. Returns the error that stopped the walk, if any.
    fn run(&mut self) -> Result<()> {
        while let Some(d) = self.peek()? {
            match d.descriptor_type() {
                DESCRIPTOR_TYPE_INTERFACE_ASSOCIATION => {
                    match InterfaceAssociationDescriptor::try_from_descriptor(d) {
                        Ok(iad) if iad.is_audio_function() => {
                            debug!(
                                "audio function association: interfaces {}..{}",
                                iad.first_interface(),
                                u16::from(iad.first_interface()) + u16::from(iad.interface_count())
                            );
                            self.association = Some(iad);
                        }
                        Ok(_) => {}
                        Err(e) => self.diagnostics.rejected(&d, e),
                    }
                    self.advance()?;
                }
                DESCRIPTOR_TYPE_INTERFACE => {
                    let intf = match InterfaceDescriptor::try_from_descriptor(d) {
                        Ok(intf) => intf,
                        Err(e) => {
                            self.diagnostics.rejected(&d, e);
                            self.advance()?;
                            continue;
                        }
                    };
                    if !self.interface(intf)? {
                        break;
                    }
                }
                _ => self.advance()?,
            }
        }
        Ok(())
    }

    /// Dispatch one interface. Returns `false` if the walk must stop.
    fn interface(&mut self, intf: InterfaceDescriptor<'a>) -> Result<bool> {
        let number = intf.interface_number();
        if intf.class() != CLASS_AUDIO {
            debug!("interface {number}: class 0x{:02X}, skipping", intf.class());
            self.advance()?;
            return Ok(true);
        }

        match intf.subclass() {
            SUBCLASS_AUDIOCONTROL => {
                let Some(version) = AudioVersion::from_protocol(intf.protocol()) else {
                    self.diagnostics.report(
                        Some(intf.offset()),
                        DiagnosticKind::Error(Error::UnsupportedProtocol(intf.protocol())),
                    );
                    return Ok(false);
                };

                let seen = self.controls.iter().any(|c| c.interface_number == number);
                if number == self.parser.control_interface && !seen {
                    debug!("interface {number}: audio control {version:?}");
                    self.control_interface(intf, version)?;
                } else {
                    debug!("interface {number}: audio control {version:?}, not the target");
                    self.skip_control_interface(version)?;
                }
            }
            SUBCLASS_AUDIOSTREAMING => {
                let owner = self
                    .controls
                    .iter()
                    .find(|c| c.streams.contains(number))
                    .map(|c| (c.interface_number, c.version));
                match owner {
                    Some((control, version)) => {
                        debug!(
                            "interface {number} alt {}: audio streaming for control interface {control}",
                            intf.alternate_setting()
                        );
                        self.stream_interface(intf, version, control)?;
                    }
                    None => {
                        debug!("interface {number}: audio streaming, not claimed");
                        self.advance()?;
                    }
                }
            }
            SUBCLASS_MIDISTREAMING => {
                for c in &mut self.controls {
                    c.streams.remove(number);
                }
                if !self.midi_interfaces.contains(&number) {
                    self.midi_interfaces.push(number);
                    self.diagnostics.report(
                        Some(intf.offset()),
                        DiagnosticKind::MidiStreamingSkipped { interface: number },
                    );
                }
                self.advance()?;
            }
            other => {
                debug!("interface {number}: audio subclass 0x{other:02X}, skipping");
                self.advance()?;
            }
        }
        Ok(true)
    }

    /// Skip an audio control interface by the total length its header advertises.
    fn skip_control_interface(&mut self, version: AudioVersion) -> Result<()> {
        self.advance()?;
        let Some(header) = self.peek()? else {
            return Ok(());
        };
        if header.descriptor_type() != DESCRIPTOR_TYPE_CS_INTERFACE
            || header.descriptor_subtype() != Some(AC_HEADER)
        {
            return Ok(());
        }

        let total_length = match version {
            AudioVersion::Uac1 => header.u16_at(5),
            AudioVersion::Uac2 => header.u16_at(6),
        };
        match total_length {
            Ok(len) => {
                debug!("skipping {len} byte audio control block at {}", header.offset());
                self.cursor
                    .skip(usize::from(len).max(header.descriptor_len()))
            }
            Err(e) => {
                self.diagnostics.rejected(&header, e);
                Ok(())
            }
        }
    }

    /// Parse the target audio control interface.
    ///
    /// The record is kept even if the walk stops inside it.
    fn control_interface(&mut self, intf: InterfaceDescriptor<'a>, version: AudioVersion) -> Result<()> {
        let mut control = ControlInterface::new(&intf, version);
        let r = self.control_body(&mut control, version);

        if version == AudioVersion::Uac2 {
            self.claim_associated_streams(&mut control, intf.offset());
        }
        // MIDI interfaces seen before the header are not streams either
        for &n in &self.midi_interfaces {
            control.streams.remove(n);
        }
        self.controls.push(control);
        r
    }

    fn control_body(&mut self, control: &mut ControlInterface, version: AudioVersion) -> Result<()> {
        self.advance()?;

        while let Some(d) = self.peek()? {
            match d.descriptor_type() {
                DESCRIPTOR_TYPE_INTERFACE | DESCRIPTOR_TYPE_INTERFACE_ASSOCIATION => break,
                DESCRIPTOR_TYPE_CS_INTERFACE => {
                    let parsed = match version {
                        AudioVersion::Uac1 => ac1::parse_descriptor(&d, control),
                        AudioVersion::Uac2 => ac2::parse_descriptor(&d, control),
                    };
                    match parsed {
                        Ok(Some(unit)) => self.add_unit(control, &d, unit),
                        Ok(None) if d.descriptor_subtype() == Some(AC_HEADER) => {
                            self.check_adc_version(control, &d)
                        }
                        Ok(None) => {}
                        Err(e) => self.diagnostics.rejected(&d, e),
                    }
                }
                DESCRIPTOR_TYPE_ENDPOINT => match EndpointDescriptor::try_from_descriptor(d) {
                    Ok(ep) => {
                        control.interrupt_endpoint = Some(Endpoint::from_descriptor(&ep, version))
                    }
                    Err(e) => self.diagnostics.rejected(&d, e),
                },
                _ => {}
            }
            self.advance()?;
        }
        Ok(())
    }

    /// A `bcdADC` outside the known releases is unsupported; a known release
    /// that disagrees with the interface protocol is only reported.
    fn check_adc_version(&mut self, control: &ControlInterface, d: &Descriptor) {
        let adc_version = control.adc_version;
        let kind = match AudioVersion::from_bcd_adc(adc_version) {
            None => DiagnosticKind::Error(Error::UnsupportedVersion(adc_version)),
            Some(v) if v != control.version => DiagnosticKind::AdcVersionMismatch {
                interface: control.interface_number,
                adc_version,
            },
            Some(_) => return,
        };
        self.diagnostics.report(Some(d.offset()), kind);
    }

    fn add_unit(&mut self, control: &mut ControlInterface, d: &Descriptor, unit: Unit) {
        let id = unit.id();
        trace!("unit 0x{id:02X}: {}", unit.kind_name());
        if !control.push_unit(unit) {
            self.diagnostics
                .report(Some(d.offset()), DiagnosticKind::DuplicateUnitId { id });
        }
    }

    /// A UAC 2.0 function's streams are the other interfaces of its association.
    fn claim_associated_streams(&mut self, control: &mut ControlInterface, offset: usize) {
        let number = control.interface_number;
        let iad = self.association.filter(|iad| {
            let first = u16::from(iad.first_interface());
            (first..first + u16::from(iad.interface_count())).contains(&u16::from(number))
        });
        let Some(iad) = iad else {
            self.diagnostics.report(
                Some(offset),
                DiagnosticKind::MissingInterfaceAssociation { interface: number },
            );
            return;
        };

        let first = u16::from(iad.first_interface());
        let end = (first + u16::from(iad.interface_count())).min(0x100);
        control.streams = (first + 1..end)
            .map(|n| n as u8)
            .collect::<InterfaceSet>();
    }

    /// Parse one streaming alternate setting.
    ///
    /// The record is kept even if the walk stops inside it.
    fn stream_interface(
        &mut self,
        intf: InterfaceDescriptor<'a>,
        version: AudioVersion,
        control: u8,
    ) -> Result<()> {
        let mut s = StreamInterface::new(&intf, version, control);
        let r = self.stream_body(&mut s, version);
        self.streams.push(s);
        r
    }

    fn stream_body(&mut self, s: &mut StreamInterface, version: AudioVersion) -> Result<()> {
        self.advance()?;

        while let Some(d) = self.peek()? {
            let parsed = match d.descriptor_type() {
                DESCRIPTOR_TYPE_INTERFACE | DESCRIPTOR_TYPE_INTERFACE_ASSOCIATION => break,
                DESCRIPTOR_TYPE_CS_INTERFACE => stream::parse_cs_interface(&d, s),
                DESCRIPTOR_TYPE_ENDPOINT => EndpointDescriptor::try_from_descriptor(d)
                    .map(|ep| s.add_endpoint(Endpoint::from_descriptor(&ep, version))),
                DESCRIPTOR_TYPE_CS_ENDPOINT => stream::parse_cs_endpoint(&d, s),
                _ => Ok(()),
            };
            if let Err(e) = parsed {
                self.diagnostics.rejected(&d, e);
            }
            self.advance()?;
        }
        Ok(())
    }

    /// Drop control interfaces no streaming interface belongs to.
    fn remove_orphans(&mut self) {
        let streams = &self.streams;
        let diagnostics = &mut self.diagnostics;
        self.controls.retain(|c| {
            let used = streams
                .iter()
                .any(|s| s.control_interface == c.interface_number);
            if !used {
                diagnostics.report(
                    None,
                    DiagnosticKind::OrphanedControlInterface {
                        interface: c.interface_number,
                    },
                );
            }
            used
        });
    }

    /// Report references that do not resolve within the parsed topology.
    fn validate(&mut self) {
        for c in &self.controls {
            for unit in &c.units {
                for reference in unit.source_ids().iter().copied().chain(unit.clock_source_ids()) {
                    if c.unit(reference).is_err() {
                        self.diagnostics.report(
                            None,
                            DiagnosticKind::DanglingReference {
                                unit: unit.id(),
                                reference,
                            },
                        );
                    }
                }
            }
        }

        for s in &self.streams {
            if !s.has_streaming_endpoint() {
                continue;
            }
            let Some(c) = self
                .controls
                .iter()
                .find(|c| c.interface_number == s.control_interface)
            else {
                continue;
            };
            let Ok(direction) = c.terminal_direction(s.terminal_link) else {
                self.diagnostics.report(
                    None,
                    DiagnosticKind::UnresolvedTerminalLink {
                        interface: s.interface_number,
                        alt_setting: s.alternate_setting,
                        terminal_link: s.terminal_link,
                    },
                );
                continue;
            };
            if let Some(ep) = s.data_endpoint() {
                if ep.direction() != direction {
                    self.diagnostics.report(
                        None,
                        DiagnosticKind::EndpointDirectionMismatch {
                            interface: s.interface_number,
                            alt_setting: s.alternate_setting,
                            address: ep.address(),
                        },
                    );
                }
            }
        }
    }
}
