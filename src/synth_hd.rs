//! Windfreak SynthHD PRO two channel RF synthesizer.
//!
//! Every channel command is prefixed with `C{channel};`, followed by a single character
//! command and its value. Reading a parameter back sends `?` as the value.

use core::fmt;

use log::info;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, FromRepr};

use crate::{
    error::{ConfigurationError, Error, Result},
    link::{LineLink, parse_float},
    validate::Numbers,
};

/// Permitted output frequency, Hz.
pub const FREQUENCY_HZ: Numbers = Numbers::new(53e6, 24e9);
/// Permitted output level, dBm.
pub const POWER_DBM: Numbers = Numbers::new(-60.0, 20.0);
/// Permitted dwell per sweep step, ms.
pub const STEP_TIME_MS: Numbers = Numbers::new(4.0, 10e3);
/// Any finite sweep step, Hz.
pub const FREQUENCY_STEP_HZ: Numbers = Numbers::new(f64::MIN, f64::MAX);

/// One of the two RF outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
#[repr(u8)]
pub enum RfChannel {
    Rf0 = 0,
    Rf1 = 1,
}

impl RfChannel {
    pub const ALL: [RfChannel; 2] = [RfChannel::Rf0, RfChannel::Rf1];

    pub fn number(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for RfChannel {
    type Error = ConfigurationError;

    fn try_from(value: u8) -> core::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(RfChannel::Rf0),
            1 => Ok(RfChannel::Rf1),
            other => Err(ConfigurationError::InvalidRfChannel(other)),
        }
    }
}

impl fmt::Display for RfChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RF{}", self.number())
    }
}

/// What a trigger input does. The discriminant is the value sent with `w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, EnumIter, FromRepr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum TriggerMode {
    #[strum(serialize = "none")]
    Disabled = 0,
    FSweep = 1,
    FStep = 2,
    Stop = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum RfSweepDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum RfSweepType {
    Linear,
    Tabular,
}

/// Device metadata. The synthesizer does not report a serial number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity<const L: usize> {
    pub vendor: &'static str,
    pub model: heapless::String<L>,
    pub firmware: heapless::String<L>,
}

/// A Windfreak SynthHD PRO.
pub struct SynthHdPro<S: embedded_io::Read + embedded_io::Write, const L: usize = 64> {
    link: LineLink<S, L>,
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> SynthHdPro<S, L> {
    pub const TERMINATOR: &'static str = "\n";

    /// Take over the synthesizer and switch both channels to automatic calibration.
    pub fn new(interface: S) -> Result<Self, S::Error> {
        let mut synth = Self {
            link: LineLink::new(interface, Self::TERMINATOR),
        };
        for channel in RfChannel::ALL {
            synth
                .link
                .write_fmt(format_args!("C{};T1", channel.number()))?;
        }
        let identity = synth.identity()?;
        info!(
            "{} {} ready, firmware {}",
            identity.vendor, identity.model, identity.firmware
        );
        Ok(synth)
    }

    pub fn identity(&mut self) -> Result<Identity<L>, S::Error> {
        let model = self.link.query("+")?;
        let firmware = self.link.query("v0")?;
        Ok(Identity {
            vendor: "WindFreak",
            model,
            firmware,
        })
    }

    pub fn channel(&mut self, id: RfChannel) -> SynthChannel<'_, S, L> {
        SynthChannel { synth: self, id }
    }

    pub fn into_inner(self) -> S {
        self.link.into_inner()
    }
}

/// One RF output of a [SynthHdPro].
pub struct SynthChannel<'a, S: embedded_io::Read + embedded_io::Write, const L: usize> {
    synth: &'a mut SynthHdPro<S, L>,
    id: RfChannel,
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> SynthChannel<'_, S, L> {
    pub fn id(&self) -> RfChannel {
        self.id
    }

    /// Output frequency, Hz.
    pub fn frequency(&mut self) -> Result<f64, S::Error> {
        self.get_hz('f')
    }

    pub fn set_frequency(&mut self, hz: f64) -> Result<(), S::Error> {
        self.set_hz('f', FREQUENCY_HZ.check(hz)?)
    }

    /// Output level, dBm.
    pub fn power(&mut self) -> Result<f64, S::Error> {
        self.get_number('W')
    }

    pub fn set_power(&mut self, dbm: f64) -> Result<(), S::Error> {
        self.set_dbm('W', POWER_DBM.check(dbm)?)
    }

    /// Whether the last automatic calibration succeeded.
    pub fn calibration_success(&mut self) -> Result<bool, S::Error> {
        let response = self.query(format_args!("V"))?;
        parse_flag(&response)
    }

    pub fn mute(&mut self) -> Result<bool, S::Error> {
        let response = self.get('h')?;
        parse_flag(&response)
    }

    pub fn set_mute(&mut self, mute: bool) -> Result<(), S::Error> {
        self.set('h', format_args!("{}", u8::from(mute)))
    }

    pub fn trigger_mode(&mut self) -> Result<TriggerMode, S::Error> {
        let response = self.get('w')?;
        let index = response
            .trim()
            .parse::<u8>()
            .map_err(|_| Error::<S::Error>::InvalidResponse)?;
        TriggerMode::from_repr(index).ok_or(Error::InvalidResponse)
    }

    pub fn set_trigger_mode(&mut self, mode: TriggerMode) -> Result<(), S::Error> {
        self.set('w', format_args!("{}", mode as u8))
    }

    /// Sweep start frequency, Hz.
    pub fn freq_low(&mut self) -> Result<f64, S::Error> {
        self.get_hz('l')
    }

    pub fn set_freq_low(&mut self, hz: f64) -> Result<(), S::Error> {
        self.set_hz('l', FREQUENCY_HZ.check(hz)?)
    }

    /// Sweep stop frequency, Hz.
    pub fn freq_high(&mut self) -> Result<f64, S::Error> {
        self.get_hz('u')
    }

    pub fn set_freq_high(&mut self, hz: f64) -> Result<(), S::Error> {
        self.set_hz('u', FREQUENCY_HZ.check(hz)?)
    }

    /// Level at the sweep start, dBm.
    pub fn power_low(&mut self) -> Result<f64, S::Error> {
        self.get_number('[')
    }

    pub fn set_power_low(&mut self, dbm: f64) -> Result<(), S::Error> {
        self.set_dbm('[', POWER_DBM.check(dbm)?)
    }

    /// Level at the sweep stop, dBm.
    pub fn power_high(&mut self) -> Result<f64, S::Error> {
        self.get_number(']')
    }

    pub fn set_power_high(&mut self, dbm: f64) -> Result<(), S::Error> {
        self.set_dbm(']', POWER_DBM.check(dbm)?)
    }

    /// Sweep step size, Hz.
    pub fn freq_step(&mut self) -> Result<f64, S::Error> {
        self.get_hz('s')
    }

    pub fn set_freq_step(&mut self, hz: f64) -> Result<(), S::Error> {
        self.set_hz('s', FREQUENCY_STEP_HZ.check(hz)?)
    }

    /// Dwell per sweep step, ms.
    pub fn step_time(&mut self) -> Result<f64, S::Error> {
        self.get_number('t')
    }

    pub fn set_step_time(&mut self, ms: f64) -> Result<(), S::Error> {
        let ms = STEP_TIME_MS.check(ms)?;
        self.set('t', format_args!("{ms:5.3}"))
    }

    pub fn sweep_direction(&mut self) -> Result<RfSweepDirection, S::Error> {
        let response = self.get('^')?;
        Ok(match response.trim() {
            "1" => RfSweepDirection::Up,
            _ => RfSweepDirection::Down,
        })
    }

    pub fn set_sweep_direction(&mut self, direction: RfSweepDirection) -> Result<(), S::Error> {
        let value = match direction {
            RfSweepDirection::Up => 1,
            RfSweepDirection::Down => 0,
        };
        self.set('^', format_args!("{value}"))
    }

    pub fn sweep_type(&mut self) -> Result<RfSweepType, S::Error> {
        let response = self.get('X')?;
        Ok(match response.trim() {
            "1" => RfSweepType::Tabular,
            _ => RfSweepType::Linear,
        })
    }

    pub fn set_sweep_type(&mut self, sweep_type: RfSweepType) -> Result<(), S::Error> {
        let value = match sweep_type {
            RfSweepType::Tabular => 1,
            RfSweepType::Linear => 0,
        };
        self.set('X', format_args!("{value}"))
    }

    fn set_hz(&mut self, command: char, hz: f64) -> Result<(), S::Error> {
        self.set(command, format_args!("{:5.7}", hz / 1e6))
    }

    fn get_hz(&mut self, command: char) -> Result<f64, S::Error> {
        Ok(self.get_number(command)? * 1e6)
    }

    fn set_dbm(&mut self, command: char, dbm: f64) -> Result<(), S::Error> {
        self.set(command, format_args!("{dbm:2.3}"))
    }

    fn get_number(&mut self, command: char) -> Result<f64, S::Error> {
        let response = self.get(command)?;
        parse_float(&response)
    }

    fn set(&mut self, command: char, value: fmt::Arguments<'_>) -> Result<(), S::Error> {
        self.synth
            .link
            .write_fmt(format_args!("C{};{}{}", self.id.number(), command, value))
    }

    fn get(&mut self, command: char) -> Result<heapless::String<L>, S::Error> {
        self.query(format_args!("{command}?"))
    }

    fn query(&mut self, args: fmt::Arguments<'_>) -> Result<heapless::String<L>, S::Error> {
        self.synth
            .link
            .query_fmt(format_args!("C{};{}", self.id.number(), args))
    }
}

/// `0` is false, any other integer true.
fn parse_flag<I: embedded_io::Error>(response: &str) -> Result<bool, I> {
    response
        .trim()
        .parse::<i64>()
        .map(|value| value != 0)
        .map_err(|_| Error::InvalidResponse)
}
