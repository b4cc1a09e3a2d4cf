use log::info;

use crate::{
    error::{ConfigurationError, Error, Result},
    link::{LineLink, parse_decorated},
    timer::{Duration, Timer},
    types::{ChannelId, Current, SweepCommand, SweepState, Units},
    validate::Numbers,
};

/// Permitted `LLIM`/`ULIM` values.
pub const CURRENT_LIMIT: Numbers = Numbers::new(-100.0, 100.0);
/// Permitted `VLIM` values, volts.
pub const VOLTAGE_LIMIT: Numbers = Numbers::new(0.0, 10.0);

/// Settle times for commands after which the supply stops responding for a while.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CryoMagConfig {
    /// Wait after switching the persistent heater on or off.
    pub heater_settle: Duration,
    /// Wait after every `SWEEP` command.
    pub sweep_settle: Duration,
}

impl Default for CryoMagConfig {
    fn default() -> Self {
        Self {
            heater_settle: Duration::secs(300),
            sweep_settle: Duration::millis(500),
        }
    }
}

/// A two channel Cryomagnetics 4G magnet power supply.
///
/// You can create a CryoMag4G using any interface which implements [embedded_io::Read] &
/// [embedded_io::Write]; both channels share it. Per channel operations are reached
/// through [Self::channel].
pub struct CryoMag4G<S: embedded_io::Read + embedded_io::Write, T: Timer, const L: usize = 128> {
    pub(crate) link: LineLink<S, L>,
    pub(crate) timer: T,
    pub(crate) config: CryoMagConfig,
    remote: Option<bool>,
}

impl<S: embedded_io::Read + embedded_io::Write, T: Timer, const L: usize> CryoMag4G<S, T, L> {
    /// Line terminator used by the 4G in both directions.
    pub const TERMINATOR: &'static str = "\r\n";

    /// Take over the supply and pause any sweep on either channel.
    pub fn new(interface: S, timer: T, config: CryoMagConfig) -> Result<Self, S::Error> {
        let mut psu = Self {
            link: LineLink::new(interface, Self::TERMINATOR),
            timer,
            config,
            remote: None,
        };
        for id in ChannelId::ALL {
            psu.channel(id).sweep(SweepCommand::Pause)?;
        }
        info!("Cryomagnetics 4G ready, both channels paused");
        Ok(psu)
    }

    /// Access one of the two channels.
    pub fn channel(&mut self, id: ChannelId) -> Channel<'_, S, T, L> {
        Channel { psu: self, id }
    }

    /// Access a channel by its number, 1 or 2.
    pub fn channel_number(&mut self, number: u8) -> Result<Channel<'_, S, T, L>, S::Error> {
        let id = ChannelId::try_from(number)?;
        Ok(self.channel(id))
    }

    /// Switch between remote (`true`) and front panel (`false`) control.
    pub fn set_remote(&mut self, remote: bool) -> Result<(), S::Error> {
        self.link.write(if remote { "REMOTE" } else { "LOCAL" })?;
        self.remote = Some(remote);
        Ok(())
    }

    /// The last control mode set through [Self::set_remote], if any.
    pub fn remote(&self) -> Option<bool> {
        self.remote
    }

    pub fn config(&self) -> &CryoMagConfig {
        &self.config
    }

    /// Release the interface and timer.
    pub fn into_inner(self) -> (S, T) {
        (self.link.into_inner(), self.timer)
    }
}

/// One channel of a [CryoMag4G].
///
/// Holds the supply mutably, so only one channel can talk to the instrument at a time.
pub struct Channel<'a, S: embedded_io::Read + embedded_io::Write, T: Timer, const L: usize> {
    pub(crate) psu: &'a mut CryoMag4G<S, T, L>,
    pub(crate) id: ChannelId,
}

impl<S: embedded_io::Read + embedded_io::Write, T: Timer, const L: usize> Channel<'_, S, T, L> {
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Set the unit system for current readings and limits.
    pub fn set_units(&mut self, units: Units) -> Result<(), S::Error> {
        self.write(format_args!("UNITS {}", units.command_token()))
    }

    /// Get the unit system for current readings and limits.
    pub fn units(&mut self) -> Result<Units, S::Error> {
        let response = self.query(format_args!("UNITS?"))?;
        response
            .trim()
            .parse::<Units>()
            .map_err(|_| Error::InvalidResponse)
    }

    /// Read the current flowing in the magnet.
    pub fn magnet_current(&mut self) -> Result<Current, S::Error> {
        self.query_current("IMAG?")
    }

    /// Read the voltage across the magnet, volts.
    pub fn magnet_voltage(&mut self) -> Result<f64, S::Error> {
        self.query_number("VMAG?")
    }

    /// Read the supply output current.
    pub fn output_current(&mut self) -> Result<Current, S::Error> {
        self.query_current("IOUT?")
    }

    /// Read the supply output voltage, volts.
    pub fn output_voltage(&mut self) -> Result<f64, S::Error> {
        self.query_number("VOUT?")
    }

    /// Get the lower sweep limit.
    pub fn llim(&mut self) -> Result<f64, S::Error> {
        self.query_number("LLIM?")
    }

    /// Set the lower sweep limit.
    pub fn set_llim(&mut self, value: f64) -> Result<(), S::Error> {
        let value = CURRENT_LIMIT.check(value)?;
        self.write(format_args!("LLIM {value}"))
    }

    /// Get the upper sweep limit.
    pub fn ulim(&mut self) -> Result<f64, S::Error> {
        self.query_number("ULIM?")
    }

    /// Set the upper sweep limit.
    pub fn set_ulim(&mut self, value: f64) -> Result<(), S::Error> {
        let value = CURRENT_LIMIT.check(value)?;
        self.write(format_args!("ULIM {value}"))
    }

    /// Get the output voltage limit, volts.
    pub fn vlim(&mut self) -> Result<f64, S::Error> {
        self.query_number("VLIM?")
    }

    /// Set the output voltage limit, volts.
    pub fn set_vlim(&mut self, value: f64) -> Result<(), S::Error> {
        let value = VOLTAGE_LIMIT.check(value)?;
        self.write(format_args!("VLIM {value}"))
    }

    /// The six sweep rates in A/s. The last entry is the fast rate.
    pub fn rates(&mut self) -> Result<[f64; 6], S::Error> {
        let mut rates = [0.0; 6];
        for (i, rate) in rates.iter_mut().enumerate() {
            let response = self.query(format_args!("RATE? {i}"))?;
            *rate = parse_decorated::<S::Error>(&response)?;
        }
        Ok(rates)
    }

    /// The five range boundaries in A.
    pub fn ranges(&mut self) -> Result<[f64; 5], S::Error> {
        let mut ranges = [0.0; 5];
        for (i, range) in ranges.iter_mut().enumerate() {
            let response = self.query(format_args!("RANGE? {i}"))?;
            *range = parse_decorated::<S::Error>(&response)?;
        }
        Ok(ranges)
    }

    /// Get the state of the sweep engine.
    pub fn sweep_state(&mut self) -> Result<SweepState, S::Error> {
        let response = self.query(format_args!("SWEEP?"))?;
        SweepState::parse(&response).ok_or(Error::InvalidResponse)
    }

    /// Send a sweep command, then wait out the period during which the supply ignores us.
    pub fn sweep(&mut self, command: SweepCommand) -> Result<(), S::Error> {
        self.write(format_args!("SWEEP {command}"))?;
        let settle = self.psu.config.sweep_settle;
        self.psu.timer.delay(settle);
        Ok(())
    }

    /// Whether the output current is within tolerance of `target` in the present unit
    /// system.
    pub fn output_close_to(&mut self, target: f64) -> Result<bool, S::Error> {
        Ok(self.output_current()?.is_close_to(target))
    }

    pub(crate) fn require_heater(&self) -> Result<(), S::Error> {
        if self.id.has_heater() {
            Ok(())
        } else {
            Err(ConfigurationError::NoHeater(self.id).into())
        }
    }

    /// A current reading tagged with the unit system it was reported in. Falls back to
    /// asking for the units when the response carries no unit decoration.
    fn query_current(&mut self, verb: &str) -> Result<Current, S::Error> {
        let response = self.query(format_args!("{verb}"))?;
        let value = parse_decorated::<S::Error>(&response)?;
        let units = match Units::from_decoration(&response) {
            Some(units) => units,
            None => self.units()?,
        };
        Ok(Current { value, units })
    }

    fn query_number(&mut self, verb: &str) -> Result<f64, S::Error> {
        let response = self.query(format_args!("{verb}"))?;
        parse_decorated(&response)
    }

    pub(crate) fn write(&mut self, args: core::fmt::Arguments<'_>) -> Result<(), S::Error> {
        self.psu
            .link
            .write_fmt(format_args!("CHAN {}; {}", self.id, args))
    }

    pub(crate) fn query(
        &mut self,
        args: core::fmt::Arguments<'_>,
    ) -> Result<heapless::String<L>, S::Error> {
        self.psu
            .link
            .query_fmt(format_args!("CHAN {}; {}", self.id, args))
    }
}

#[cfg(feature = "std")]
impl CryoMag4G<crate::tcp::TcpSocket, crate::timer::StdTimer> {
    /// Connect to a 4G over its ethernet socket, e.g. `"TCPIP0::192.168.0.187::4444::SOCKET"`.
    ///
    /// Only TCPIP socket addresses are supported.
    pub fn connect(
        address: &str,
        config: CryoMagConfig,
    ) -> Result<Self, crate::tcp::IoError> {
        use crate::address::VisaAddress;

        let (host, port) = match VisaAddress::parse(address)? {
            VisaAddress::TcpipSocket { host, port } => (host, port),
            other => return Err(ConfigurationError::UnsupportedTransport(other.kind()).into()),
        };
        let socket = crate::tcp::TcpSocket::connect(host, port, std::time::Duration::from_secs(5))
            .map_err(Error::SerialError)?;
        info!("Connected to Cryomagnetics 4G at {host}:{port}");
        Self::new(socket, crate::timer::StdTimer::new(), config)
    }
}
