//! Parser and query engine for USB Audio Class 1.0 and 2.0 configuration descriptors.
//!
//! A host audio driver reads the configuration descriptor block of a device
//! and needs to know which streaming interfaces belong to the audio function
//! it was bound to, what formats and rates each alternate setting carries,
//! which isochronous endpoints move the data, and which controls and clocks
//! the topology offers. [`Parser`] turns the raw block into a
//! [`Configuration`] that answers those questions.
//!
//! ```no_run
//! use uac_topology::{Configuration, Direction};
//!
//! # fn read_config_descriptor() -> Vec<u8> { unimplemented!() }
//! let bytes = read_config_descriptor();
//! let config = Configuration::parse(&bytes, 0)?;
//! for intf in config.controlled_stream_numbers() {
//!     let alt = config.alt_setting_with(intf, 2, 16, 48000)?;
//!     let ep = config.isoc_endpoint_address(intf, alt, Direction::Out)?;
//!     println!("interface {intf} alt {alt} streams on endpoint {ep:02x}");
//! }
//! # Ok::<(), uac_topology::Error>(())
//! ```
//!
//! Parsing is tolerant: a malformed descriptor is skipped and recorded in
//! [`Configuration::diagnostics`], and a truncated block keeps everything
//! parsed before the truncation.

mod bitset;
pub use bitset::InterfaceSet;

pub mod descriptors;
pub use descriptors::{AudioVersion, ClassTriple};

mod configuration;
pub use configuration::Configuration;

mod control;
pub use control::ControlInterface;

mod diagnostics;
pub use diagnostics::{hex_dump, Diagnostic, DiagnosticKind, HexDump};

mod endpoint;
pub use endpoint::{
    Direction, Endpoint, IsocStreamAttributes, LockDelayUnits, SyncType, TransferType, UsageType,
};

mod error;
pub use error::{Error, ErrorKind, Lookup, Result};

pub mod format;
pub use format::{FormatSpecific, FormatType};

mod parser;
pub use parser::Parser;

mod query;

mod stream;
pub use stream::{SampleRates, StreamInterface};

pub mod unit;
pub use unit::Unit;
