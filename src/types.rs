//! This module contains the types used by the Cryomagnetics 4G command set.

use core::fmt;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::ConfigurationError;

/// One of the two current loops of the supply.
///
/// Only channel 1 is fitted with a persistent heater switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
#[repr(u8)]
pub enum ChannelId {
    One = 1,
    Two = 2,
}

impl ChannelId {
    pub const ALL: [ChannelId; 2] = [ChannelId::One, ChannelId::Two];

    /// The channel number used in `CHAN {n}` commands.
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Whether this channel can switch a persistent heater, and therefore sweep fast.
    pub fn has_heater(self) -> bool {
        matches!(self, ChannelId::One)
    }
}

impl TryFrom<u8> for ChannelId {
    type Error = ConfigurationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ChannelId::One),
            2 => Ok(ChannelId::Two),
            other => Err(ConfigurationError::InvalidChannel(other)),
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Unit system of a channel's current readings and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, EnumIter)]
pub enum Units {
    #[strum(serialize = "A")]
    Amps,
    #[strum(to_string = "kG", serialize = "G")]
    KiloGauss,
}

impl Units {
    /// How close output current must be to a target to count as "there".
    ///
    /// The kG tolerance is tighter than the amp one; this follows the supply's field
    /// calibration.
    pub fn tolerance(self) -> f64 {
        match self {
            Units::Amps => 1e-3,
            Units::KiloGauss => 1e-5,
        }
    }

    /// The token accepted by `UNITS {token}`, the last character of the unit name.
    pub fn command_token(self) -> char {
        match self {
            Units::Amps => 'A',
            Units::KiloGauss => 'G',
        }
    }

    /// Pick the unit system out of a decorated reading such as `"1.25kG"`.
    pub fn from_decoration(response: &str) -> Option<Self> {
        let response = response.trim();
        if response.ends_with('G') {
            Some(Units::KiloGauss)
        } else if response.ends_with('A') {
            Some(Units::Amps)
        } else {
            None
        }
    }
}

/// The tokens accepted by `SWEEP {token}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, EnumIter)]
pub enum SweepCommand {
    #[strum(serialize = "UP")]
    Up,
    #[strum(serialize = "DOWN")]
    Down,
    #[strum(serialize = "PAUSE")]
    Pause,
    #[strum(serialize = "ZERO")]
    Zero,
    #[strum(serialize = "UP FAST")]
    UpFast,
    #[strum(serialize = "DOWN FAST")]
    DownFast,
    #[strum(serialize = "ZERO FAST")]
    ZeroFast,
}

impl SweepCommand {
    /// The fast rate variant of this command. `PAUSE` has none.
    pub fn fast(self) -> Self {
        match self {
            SweepCommand::Up => SweepCommand::UpFast,
            SweepCommand::Down => SweepCommand::DownFast,
            SweepCommand::Zero => SweepCommand::ZeroFast,
            other => other,
        }
    }
}

/// Where an active sweep is heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDirection {
    /// Towards `ulim`.
    Up,
    /// Towards `llim`.
    Down,
    /// Towards zero.
    Zero,
}

/// Sweep engine state as reported by `SWEEP?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Pause,
    Standby,
    Sweeping {
        direction: SweepDirection,
        fast: bool,
    },
}

impl SweepState {
    /// Interpret a `SWEEP?` response, e.g. `"Pause"`, `"Standby"`, `"Sweep Up Fast"`,
    /// `"DOWN"` or `"Zeroing"`. Case is ignored.
    pub fn parse(response: &str) -> Option<Self> {
        let mut direction = None;
        let mut fast = false;
        for word in response.split_whitespace() {
            let is = |token: &str| word.eq_ignore_ascii_case(token);
            if is("pause") || is("paused") {
                return Some(SweepState::Pause);
            } else if is("standby") {
                return Some(SweepState::Standby);
            } else if is("up") {
                direction = Some(SweepDirection::Up);
            } else if is("down") {
                direction = Some(SweepDirection::Down);
            } else if is("zero") || is("zeroing") {
                direction = Some(SweepDirection::Zero);
            } else if is("fast") {
                fast = true;
            }
        }
        direction.map(|direction| SweepState::Sweeping { direction, fast })
    }

    /// Anything other than `Pause` or `Standby` counts as actively sweeping.
    pub fn is_active(&self) -> bool {
        matches!(self, SweepState::Sweeping { .. })
    }
}

/// A current reading together with the unit system it was reported in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Current {
    pub value: f64,
    pub units: Units,
}

impl Current {
    /// True when this reading is within the unit system's tolerance of `target`.
    pub fn is_close_to(&self, target: f64) -> bool {
        (self.value - target).abs() < self.units.tolerance()
    }
}
