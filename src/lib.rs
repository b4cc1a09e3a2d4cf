//! This crate provides drivers for a small family of laboratory sources that speak line
//! based text protocols:
//! * Cryomagnetics 4G two channel superconducting magnet power supply, including the
//!   persistent heater interlock and current sweeps ([cryomag], [interlock], [sweep])
//! * Anritsu MG3690B microwave source ([anritsu])
//! * Windfreak SynthHD PRO RF synthesizer ([synth_hd])
//!
//! Every driver is generic over a transport implementing [embedded_io::Read] &
//! [embedded_io::Write], and it supports `no-std` environments by disabling the default
//! `std` feature. With `std`, [tcp::TcpSocket] connects to instruments on the network and
//! [timer::StdTimer] provides wall clock delays.
//!
//! The drivers log every exchange through the [log] facade at `debug` level; install a
//! logger of your choice to see them.
//!
//! Example connection to a 4G:
//! ```no_run
//! use lab_source_drivers::{CryoMag4G, CryoMagConfig, ChannelId, SweepTimeout};
//!
//! let mut psu = CryoMag4G::connect("TCPIP0::192.168.0.187::4444::SOCKET", CryoMagConfig::default())?;
//! let mut ch = psu.channel(ChannelId::Two);
//! ch.sweep_to(1.5)?;
//! ch.wait_then_pause_sweep(SweepTimeout::Auto)?;
//! # Ok::<(), lab_source_drivers::error::Error<lab_source_drivers::tcp::IoError>>(())
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub mod address;
pub mod anritsu;
pub mod cryomag;
pub mod error;
pub mod interlock;
pub mod link;
pub mod storage;
pub mod sweep;
pub mod synth_hd;
#[cfg(feature = "std")]
pub mod tcp;
pub mod timer;
pub mod types;
pub mod validate;

#[cfg(test)]
mod mock_serial;

pub use anritsu::Mg3690b;
pub use cryomag::{Channel, CryoMag4G, CryoMagConfig};
pub use error::{ConfigurationError, Error, Result, ValidationError};
pub use sweep::SweepTimeout;
pub use synth_hd::{RfChannel, SynthHdPro};
pub use types::{ChannelId, Current, SweepCommand, SweepDirection, SweepState, Units};
