//! Standard and class-specific endpoint records.

use crate::descriptors::{AudioVersion, EndpointDescriptor};

/// USB endpoint direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// OUT endpoint, data goes host -> device.
    Out,
    /// IN endpoint, data goes device -> host.
    In,
}

impl Direction {
    /// Direction encoded in the MSB of an endpoint address.
    pub fn from_address(address: u8) -> Direction {
        match address & 0x80 {
            0 => Direction::Out,
            _ => Direction::In,
        }
    }
}

/// USB endpoint transfer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Control,
    Isochronous,
    Bulk,
    Interrupt,
}

/// Isochronous endpoint synchronization type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncType {
    /// No synchronization.
    #[default]
    NoSync,
    /// Asynchronous synchronization.
    Asynchronous,
    /// Adaptive synchronization.
    Adaptive,
    /// Synchronous synchronization.
    Synchronous,
}

/// Isochronous endpoint usage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageType {
    Data,
    Feedback,
    ImplicitFeedbackData,
    Reserved,
}

/// One standard endpoint of an audio interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub(crate) address: u8,
    pub(crate) attributes: u8,
    pub(crate) max_packet_size: u16,
    pub(crate) interval: u8,
    pub(crate) sync_address: Option<u8>,
    pub(crate) refresh: Option<u8>,
}

impl Endpoint {
    pub(crate) fn from_descriptor(d: &EndpointDescriptor, version: AudioVersion) -> Endpoint {
        let raw = d.max_packet_size_raw();
        let max_packet_size = match version {
            AudioVersion::Uac1 => raw & 0x07FF,
            AudioVersion::Uac2 => (raw & 0x07FF) * (((raw & 0x1800) >> 11) + 1),
        };
        Endpoint {
            address: d.address(),
            attributes: d.attributes(),
            max_packet_size,
            interval: d.interval(),
            sync_address: d.synch_address().filter(|&a| a != 0),
            refresh: d.refresh(),
        }
    }

    /// `bEndpointAddress`: endpoint number in the lower 7 bits, direction in the highest bit.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Raw `bmAttributes`.
    pub fn attributes(&self) -> u8 {
        self.attributes
    }

    pub fn direction(&self) -> Direction {
        Direction::from_address(self.address)
    }

    pub fn transfer_type(&self) -> TransferType {
        match self.attributes & 0x03 {
            0 => TransferType::Control,
            1 => TransferType::Isochronous,
            2 => TransferType::Bulk,
            _ => TransferType::Interrupt,
        }
    }

    /// The return value of this method is only meaningful for isochronous endpoints.
    pub fn sync_type(&self) -> SyncType {
        match (self.attributes & 0x0c) >> 2 {
            0 => SyncType::NoSync,
            1 => SyncType::Asynchronous,
            2 => SyncType::Adaptive,
            _ => SyncType::Synchronous,
        }
    }

    /// The return value of this method is only meaningful for isochronous endpoints.
    pub fn usage_type(&self) -> UsageType {
        match (self.attributes & 0x30) >> 4 {
            0 => UsageType::Data,
            1 => UsageType::Feedback,
            2 => UsageType::ImplicitFeedbackData,
            _ => UsageType::Reserved,
        }
    }

    /// Maximum bytes per service interval.
    ///
    /// For UAC 2.0 this already includes the high-bandwidth transaction multiplier.
    pub fn max_packet_size(&self) -> u16 {
        self.max_packet_size
    }

    pub fn interval(&self) -> u8 {
        self.interval
    }

    /// Address of the synchronization endpoint serving this data endpoint.
    pub fn sync_address(&self) -> Option<u8> {
        self.sync_address
    }

    /// `bRefresh` of a UAC 1.0 synchronization endpoint.
    pub fn refresh(&self) -> Option<u8> {
        self.refresh
    }

    pub fn is_isochronous(&self) -> bool {
        self.transfer_type() == TransferType::Isochronous
    }

    /// Whether this is an isochronous endpoint carrying explicit rate feedback.
    ///
    /// UAC 1.0 devices rarely set the usage bits, so a nonzero `bRefresh`
    /// also marks a synchronization endpoint.
    pub fn is_isoc_feedback(&self) -> bool {
        self.is_isochronous()
            && (self.usage_type() == UsageType::Feedback || self.refresh.is_some_and(|r| r != 0))
    }

    /// Whether this is an isochronous endpoint carrying audio data.
    pub fn is_isoc_streaming(&self) -> bool {
        self.is_isochronous()
            && !self.is_isoc_feedback()
            && self.usage_type() != UsageType::Reserved
    }

    /// Number of transactions per millisecond for the packet-size feasibility check.
    ///
    /// `bInterval` of 0 is treated as 4 (one transaction per frame), and
    /// values above 4 are clamped likewise.
    pub fn transactions_per_microframe(&self) -> u32 {
        match self.interval {
            1..=4 => 8 >> (self.interval - 1),
            _ => 1,
        }
    }
}

/// Lock delay units of a class-specific isochronous data endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockDelayUnits {
    #[default]
    Undefined,
    Milliseconds,
    DecodedPcmSamples,
    Reserved(u8),
}

impl From<u8> for LockDelayUnits {
    fn from(b: u8) -> Self {
        match b {
            0 => LockDelayUnits::Undefined,
            1 => LockDelayUnits::Milliseconds,
            2 => LockDelayUnits::DecodedPcmSamples,
            n => LockDelayUnits::Reserved(n),
        }
    }
}

/// Class-specific isochronous audio data endpoint attributes (`EP_GENERAL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IsocStreamAttributes {
    pub has_sample_freq_control: bool,
    pub has_pitch_control: bool,
    pub max_packets_only: bool,
    pub lock_delay_units: LockDelayUnits,
    pub lock_delay: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::{Descriptor, EndpointDescriptor};

    fn endpoint(bytes: &[u8], version: AudioVersion) -> Endpoint {
        let d = EndpointDescriptor::try_from_descriptor(Descriptor::new(bytes).unwrap()).unwrap();
        Endpoint::from_descriptor(&d, version)
    }

    #[test]
    fn test_uac1_data_and_sync() {
        let data = endpoint(&[0x09, 0x05, 0x01, 0x05, 0xc8, 0x00, 0x01, 0x00, 0x82], AudioVersion::Uac1);
        assert_eq!(data.direction(), Direction::Out);
        assert_eq!(data.sync_type(), SyncType::Asynchronous);
        assert_eq!(data.max_packet_size(), 200);
        assert_eq!(data.sync_address(), Some(0x82));
        assert!(data.is_isoc_streaming());
        assert!(!data.is_isoc_feedback());

        let sync = endpoint(&[0x09, 0x05, 0x82, 0x01, 0x03, 0x00, 0x01, 0x05, 0x00], AudioVersion::Uac1);
        assert_eq!(sync.direction(), Direction::In);
        assert_eq!(sync.sync_address(), None);
        assert!(sync.is_isoc_feedback());
        assert!(!sync.is_isoc_streaming());
    }

    #[test]
    fn test_uac2_high_bandwidth() {
        // 3 transactions of 1024 bytes per microframe
        let ep = endpoint(&[0x07, 0x05, 0x81, 0x05, 0x00, 0x14, 0x01], AudioVersion::Uac2);
        assert_eq!(ep.max_packet_size(), 3072);
        assert_eq!(ep.transactions_per_microframe(), 8);

        let fb = endpoint(&[0x07, 0x05, 0x82, 0x11, 0x04, 0x00, 0x04], AudioVersion::Uac2);
        assert_eq!(fb.usage_type(), UsageType::Feedback);
        assert!(fb.is_isoc_feedback());
        assert_eq!(fb.transactions_per_microframe(), 1);
    }

    #[test]
    fn test_interval_zero() {
        let ep = endpoint(&[0x07, 0x05, 0x01, 0x01, 0x40, 0x00, 0x00], AudioVersion::Uac1);
        assert_eq!(ep.transactions_per_microframe(), 1);
        let ep = endpoint(&[0x07, 0x05, 0x01, 0x01, 0x40, 0x00, 0x02], AudioVersion::Uac1);
        assert_eq!(ep.transactions_per_microframe(), 4);
    }
}
