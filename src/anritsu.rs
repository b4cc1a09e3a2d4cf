//! Basic frequency and level control of an Anritsu MG3690 series microwave source.

use log::info;

use crate::{
    error::Result,
    link::{LineLink, parse_float},
    validate::Numbers,
};

/// Permitted CW frequency, GHz.
pub const FREQUENCY_GHZ: Numbers = Numbers::new(2.0, 20.0);
/// Permitted output level, dBm.
pub const POWER_DBM: Numbers = Numbers::new(-30.0, 19.0);

/// An Anritsu MG3690B.
///
/// Some adapters (USB to GPIB in particular) enable the RF output while connecting, so
/// [Self::new] immediately drops the level to the minimum and switches the output off.
/// Check the level before enabling the output.
pub struct Mg3690b<S: embedded_io::Read + embedded_io::Write, const L: usize = 64> {
    link: LineLink<S, L>,
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> Mg3690b<S, L> {
    pub const TERMINATOR: &'static str = "\r\n";

    pub fn new(interface: S) -> Result<Self, S::Error> {
        let mut source = Self {
            link: LineLink::new(interface, Self::TERMINATOR),
        };
        source.set_power(POWER_DBM.min)?;
        source.set_output_enabled(false)?;
        info!("Anritsu MG3690B ready, output off");
        Ok(source)
    }

    /// Get the CW frequency, GHz.
    pub fn frequency(&mut self) -> Result<f64, S::Error> {
        let response = self.link.query("OF0")?;
        parse_float(&response)
    }

    /// Set the CW frequency, GHz.
    pub fn set_frequency(&mut self, ghz: f64) -> Result<(), S::Error> {
        let ghz = FREQUENCY_GHZ.check(ghz)?;
        self.link.write_fmt(format_args!("F0 {ghz} GH; ACW"))
    }

    /// Get the output level, dBm.
    pub fn power(&mut self) -> Result<f64, S::Error> {
        let response = self.link.query("OL0")?;
        parse_float(&response)
    }

    /// Set the output level, dBm.
    pub fn set_power(&mut self, dbm: f64) -> Result<(), S::Error> {
        let dbm = POWER_DBM.check(dbm)?;
        self.link.write_fmt(format_args!("L0 {dbm} DM"))
    }

    /// Switch the RF output. The instrument offers no way to read this back.
    pub fn set_output_enabled(&mut self, enabled: bool) -> Result<(), S::Error> {
        self.link.write(if enabled { "RF1" } else { "RF0" })
    }

    pub fn into_inner(self) -> S {
        self.link.into_inner()
    }
}
