//! Alternate setting search and streaming endpoint queries.
//!
//! A host driver picks an alternate setting by channel count, sample size
//! and sample rate, then needs the isochronous endpoints of that setting to
//! schedule transfers. All searches return the lowest qualifying alternate
//! setting number.

use log::debug;

use crate::{
    configuration::Configuration,
    endpoint::{Direction, Endpoint, SyncType},
    format::format_tag,
    stream::{SampleRates, StreamInterface},
    Error, Lookup, Result,
};

impl Configuration {
    /// Lowest alternate setting `>= start` of `interface` whose stream matches `pred`.
    fn next_alt_setting(
        &self,
        interface: u8,
        start: u8,
        pred: impl Fn(&StreamInterface) -> bool,
    ) -> Result<u8> {
        self.alt_settings(interface)
            .filter(|s| s.alternate_setting >= start && pred(s))
            .map(|s| s.alternate_setting)
            .min()
            .ok_or(Error::NotFound(Lookup::MatchingAltSetting(interface)))
    }

    pub fn next_alt_setting_with_channels(
        &self,
        interface: u8,
        start: u8,
        num_channels: u8,
    ) -> Result<u8> {
        self.next_alt_setting(interface, start, |s| s.num_channels == num_channels)
    }

    /// Sample size is matched against `bBitResolution`.
    pub fn next_alt_setting_with_sample_size(
        &self,
        interface: u8,
        start: u8,
        sample_size: u8,
    ) -> Result<u8> {
        self.next_alt_setting(interface, start, |s| s.bit_resolution == sample_size)
    }

    pub fn next_alt_setting_with_sample_rate(
        &self,
        interface: u8,
        start: u8,
        sample_rate: u32,
    ) -> Result<u8> {
        self.next_alt_setting(interface, start, |s| s.sample_rates.supports(sample_rate))
    }

    pub fn next_alt_setting_with_format(
        &self,
        interface: u8,
        start: u8,
        format_tag: u16,
    ) -> Result<u8> {
        self.next_alt_setting(interface, start, |s| s.format_tag == format_tag)
    }

    /// Find the lowest alternate setting with the given channel count, sample
    /// size and sample rate.
    ///
    /// A `sample_rate` of 0 matches any rate. Alternate setting 0 is only
    /// considered when it actually streams, and settings with an undefined
    /// format are never chosen.
    pub fn alt_setting_with(
        &self,
        interface: u8,
        num_channels: u8,
        sample_size: u8,
        sample_rate: u32,
    ) -> Result<u8> {
        self.search_alt_setting(interface, num_channels, sample_size, sample_rate, None)
    }

    /// Like [`Configuration::alt_setting_with`], also requiring a format tag.
    pub fn alt_setting_with_format(
        &self,
        interface: u8,
        num_channels: u8,
        sample_size: u8,
        sample_rate: u32,
        format_tag: u16,
    ) -> Result<u8> {
        self.search_alt_setting(
            interface,
            num_channels,
            sample_size,
            sample_rate,
            Some(format_tag),
        )
    }

    fn search_alt_setting(
        &self,
        interface: u8,
        num_channels: u8,
        sample_size: u8,
        sample_rate: u32,
        format: Option<u16>,
    ) -> Result<u8> {
        let not_found = Error::NotFound(Lookup::MatchingAltSetting(interface));
        let defined = |alt: u8| {
            self.stream(interface, alt)
                .is_ok_and(|s| !format_tag::is_undefined(s.format_tag))
        };

        let mut candidate = match self.stream(interface, 0) {
            Ok(s) if s.has_streaming_endpoint() => 0,
            _ => 1,
        };

        while candidate != 0xFF {
            if !defined(candidate) {
                candidate += 1;
                continue;
            }

            let c = self.next_alt_setting_with_channels(interface, candidate, num_channels)?;
            let alt = self.next_alt_setting_with_sample_size(interface, c, sample_size)?;
            let s = self.stream(interface, alt)?;

            let matches = s.num_channels == num_channels
                && !format_tag::is_undefined(s.format_tag)
                && format.map_or(true, |tag| s.format_tag == tag)
                && (sample_rate == 0 || s.sample_rates.supports(sample_rate));
            if matches {
                debug!("interface {interface}: alt setting {alt} matches {num_channels}ch {sample_size}bit {sample_rate}Hz");
                return Ok(alt);
            }

            candidate = alt.checked_add(1).ok_or(not_found.clone())?;
        }

        Err(not_found)
    }

    pub fn verify_sample_rate_is_supported(
        &self,
        interface: u8,
        alt_setting: u8,
        sample_rate: u32,
    ) -> Result<bool> {
        Ok(self
            .stream(interface, alt_setting)?
            .sample_rates
            .supports(sample_rate))
    }

    /// Lowest supported rate, or 0 if the alternate setting lists none.
    pub fn lowest_sample_rate(&self, interface: u8, alt_setting: u8) -> Result<u32> {
        Ok(self
            .stream(interface, alt_setting)?
            .sample_rates
            .lowest()
            .unwrap_or_default())
    }

    /// Highest supported rate, or 0 if the alternate setting lists none.
    pub fn highest_sample_rate(&self, interface: u8, alt_setting: u8) -> Result<u32> {
        Ok(self
            .stream(interface, alt_setting)?
            .sample_rates
            .highest()
            .unwrap_or_default())
    }

    /// Add the rates a UAC 2.0 clock reports to a streaming alternate setting.
    ///
    /// Rates already listed are skipped, as are rates whose average frame
    /// would not fit in the data endpoint's maximum packet size. Streams
    /// that advertise a continuous range are left unchanged. Returns the
    /// number of rates added.
    pub fn add_sample_rates_to_stream(
        &mut self,
        interface: u8,
        alt_setting: u8,
        sample_rates: &[u32],
    ) -> Result<usize> {
        let s = self.stream_mut(interface, alt_setting)?;
        let ep = s.data_endpoint().ok_or(Error::NotFound(Lookup::Endpoint {
            interface,
            alt_setting,
        }))?;
        let max_packet_size = u64::from(ep.max_packet_size());
        let transactions = u64::from(ep.transactions_per_microframe());
        let bytes_per_frame = u64::from(s.num_channels) * u64::from(s.bit_resolution / 8);

        let SampleRates::Discrete(rates) = &mut s.sample_rates else {
            debug!("interface {interface} alt {alt_setting} has a rate range, not adding rates");
            return Ok(0);
        };

        let mut added = 0;
        for &rate in sample_rates {
            if rates.contains(&rate) {
                continue;
            }
            let average_frame_bytes = u64::from(rate) / (1000 * transactions) * bytes_per_frame;
            if average_frame_bytes > max_packet_size {
                debug!(
                    "interface {interface} alt {alt_setting}: {rate}Hz needs {average_frame_bytes} bytes per transaction, max packet size is {max_packet_size}"
                );
                continue;
            }
            rates.push(rate);
            added += 1;
        }
        Ok(added)
    }

    /// Direction of the isochronous data endpoint, from the terminal the stream links to.
    pub fn isoc_endpoint_direction(&self, interface: u8, alt_setting: u8) -> Result<Direction> {
        let s = self.stream(interface, alt_setting)?;
        let control = self
            .controls
            .iter()
            .find(|c| c.interface_number == s.control_interface)
            .ok_or(Error::NotFound(Lookup::ControlInterface(s.control_interface)))?;
        let direction = control.terminal_direction(s.terminal_link)?;
        s.isoc_endpoint(direction)
            .map(|_| direction)
            .ok_or(Error::NotFound(Lookup::Endpoint {
                interface,
                alt_setting,
            }))
    }

    fn isoc_endpoint(&self, interface: u8, alt_setting: u8, direction: Direction) -> Result<&Endpoint> {
        self.stream(interface, alt_setting)?
            .isoc_endpoint(direction)
            .ok_or(Error::NotFound(Lookup::Endpoint {
                interface,
                alt_setting,
            }))
    }

    pub fn isoc_endpoint_address(
        &self,
        interface: u8,
        alt_setting: u8,
        direction: Direction,
    ) -> Result<u8> {
        Ok(self.isoc_endpoint(interface, alt_setting, direction)?.address())
    }

    pub fn isoc_endpoint_interval(
        &self,
        interface: u8,
        alt_setting: u8,
        direction: Direction,
    ) -> Result<u8> {
        Ok(self.isoc_endpoint(interface, alt_setting, direction)?.interval())
    }

    pub fn isoc_endpoint_max_packet_size(
        &self,
        interface: u8,
        alt_setting: u8,
        direction: Direction,
    ) -> Result<u16> {
        Ok(self
            .isoc_endpoint(interface, alt_setting, direction)?
            .max_packet_size())
    }

    pub fn isoc_endpoint_sync_type(
        &self,
        interface: u8,
        alt_setting: u8,
        direction: Direction,
    ) -> Result<SyncType> {
        Ok(self.isoc_endpoint(interface, alt_setting, direction)?.sync_type())
    }

    fn associated_endpoint(
        &self,
        interface: u8,
        alt_setting: u8,
        data_address: u8,
    ) -> Result<&Endpoint> {
        self.stream(interface, alt_setting)?
            .associated_endpoint(data_address)
            .ok_or(Error::NotFound(Lookup::Endpoint {
                interface,
                alt_setting,
            }))
    }

    /// Address of the feedback endpoint serving the data endpoint at `data_address`.
    pub fn isoc_associated_endpoint_address(
        &self,
        interface: u8,
        alt_setting: u8,
        data_address: u8,
    ) -> Result<u8> {
        Ok(self
            .associated_endpoint(interface, alt_setting, data_address)?
            .address())
    }

    pub fn isoc_associated_endpoint_max_packet_size(
        &self,
        interface: u8,
        alt_setting: u8,
        data_address: u8,
    ) -> Result<u16> {
        Ok(self
            .associated_endpoint(interface, alt_setting, data_address)?
            .max_packet_size())
    }

    /// `bRefresh` of the feedback endpoint, 0 if it has none.
    pub fn isoc_associated_endpoint_refresh_int(
        &self,
        interface: u8,
        alt_setting: u8,
        data_address: u8,
    ) -> Result<u8> {
        Ok(self
            .associated_endpoint(interface, alt_setting, data_address)?
            .refresh()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        descriptors::{SUBCLASS_AUDIOCONTROL, SUBCLASS_AUDIOSTREAMING},
        format::format_tag,
        parser::tests::{config, desc, init, interface, uac1_alt, uac1_format, uac1_header},
        Configuration, ErrorKind, SampleRates,
    };

    /// Interface 1 with four streaming alternate settings:
    /// 1: 2ch 16bit 44.1k/48k, 2: 2ch 24bit 48k/96k, 3: 1ch 16bit 48k,
    /// 4: 2ch 16bit 32k with an undefined format tag.
    #[rustfmt::skip]
    fn multi_alt() -> Configuration {
        let bytes = config(&[
            interface(0, 0, 0, SUBCLASS_AUDIOCONTROL, 0x00),
            uac1_header(&[1], &[
                desc(&[0x24, 0x02, 0x01, 0x01, 0x01, 0x00, 0x02, 0x03, 0x00, 0x00, 0x00]),
                desc(&[0x24, 0x03, 0x03, 0x01, 0x03, 0x00, 0x01, 0x00]),
            ]),
            interface(1, 0, 0, SUBCLASS_AUDIOSTREAMING, 0x00),
            uac1_alt(1, 1, format_tag::PCM, uac1_format(2, 16, &[44100, 48000]), 200),
            uac1_alt(1, 2, format_tag::PCM, uac1_format(2, 24, &[48000, 96000]), 600),
            uac1_alt(1, 3, format_tag::PCM, uac1_format(1, 16, &[48000]), 100),
            uac1_alt(1, 4, 0x0000, uac1_format(2, 16, &[32000]), 200),
        ]);
        Configuration::parse(&bytes, 0).unwrap()
    }

    #[test]
    fn test_alt_setting_with() {
        init();
        let config = multi_alt();
        assert_eq!(config.num_alt_settings(1), Ok(5));

        assert_eq!(config.alt_setting_with(1, 2, 24, 96000), Ok(2));
        assert_eq!(config.alt_setting_with(1, 2, 16, 48000), Ok(1));
        assert_eq!(config.alt_setting_with(1, 1, 16, 0), Ok(3));
        assert_eq!(config.alt_setting_with_format(1, 2, 16, 44100, format_tag::PCM), Ok(1));

        // only the undefined alternate setting offers 32 kHz
        let err = config.alt_setting_with(1, 2, 16, 32000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = config.alt_setting_with(1, 2, 16, 96000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = config.alt_setting_with_format(1, 2, 16, 44100, format_tag::MPEG).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = config.alt_setting_with(2, 2, 16, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_next_alt_setting() {
        let config = multi_alt();
        assert_eq!(config.next_alt_setting_with_sample_rate(1, 0, 96000), Ok(2));
        assert_eq!(config.next_alt_setting_with_sample_rate(1, 0, 48000), Ok(1));
        assert_eq!(config.next_alt_setting_with_sample_rate(1, 2, 48000), Ok(2));
        assert_eq!(config.next_alt_setting_with_channels(1, 2, 2), Ok(2));
        assert_eq!(config.next_alt_setting_with_channels(1, 3, 2), Ok(4));
        assert_eq!(config.next_alt_setting_with_sample_size(1, 2, 16), Ok(3));
        assert_eq!(config.next_alt_setting_with_format(1, 0, 0x0000), Ok(0));
        assert_eq!(config.next_alt_setting_with_format(1, 1, 0x0000), Ok(4));
        assert_eq!(
            config.next_alt_setting_with_sample_size(1, 0, 32).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_sample_rate_bounds() {
        let config = multi_alt();
        assert_eq!(config.lowest_sample_rate(1, 2), Ok(48000));
        assert_eq!(config.highest_sample_rate(1, 2), Ok(96000));
        assert_eq!(config.lowest_sample_rate(1, 0), Ok(0));
        assert_eq!(config.highest_sample_rate(1, 0), Ok(0));
        assert_eq!(
            config.lowest_sample_rate(1, 9).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_add_sample_rates() {
        init();
        let mut config = multi_alt();

        // 768 kHz needs 96 frames of 4 bytes per microframe, over 200 bytes
        assert_eq!(
            config.add_sample_rates_to_stream(1, 1, &[44100, 96000, 768000]),
            Ok(1)
        );
        assert_eq!(
            config.sample_rates(1, 1),
            Ok(&SampleRates::Discrete(vec![44100, 48000, 96000]))
        );
        assert_eq!(config.add_sample_rates_to_stream(1, 1, &[96000]), Ok(0));
        assert_eq!(config.alt_setting_with(1, 2, 16, 96000), Ok(1));

        // alternate setting 0 has no data endpoint
        assert_eq!(
            config.add_sample_rates_to_stream(1, 0, &[48000]).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
