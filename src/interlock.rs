//! Safety checks guarding the persistent heater and concurrent sweeps.

use log::{info, warn};

use crate::{
    cryomag::{Channel, CryoMag4G},
    error::{Error, Result},
    timer::Timer,
    types::{ChannelId, SweepCommand},
};

impl<S: embedded_io::Read + embedded_io::Write, T: Timer, const L: usize> CryoMag4G<S, T, L> {
    /// The first channel whose sweep engine is neither paused nor in standby.
    pub fn active_sweep(&mut self) -> Result<Option<ChannelId>, S::Error> {
        for id in ChannelId::ALL {
            if self.channel(id).sweep_state()?.is_active() {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Fail with [Error::SweepActive] if any channel is sweeping.
    ///
    /// This is a read of the instrument state, not a lock.
    pub fn ensure_no_active_sweep(&mut self) -> Result<(), S::Error> {
        match self.active_sweep()? {
            Some(id) => Err(Error::SweepActive(id)),
            None => Ok(()),
        }
    }
}

impl<S: embedded_io::Read + embedded_io::Write, T: Timer, const L: usize> Channel<'_, S, T, L> {
    /// Whether the persistent heater is on. Only channel 1 has one.
    pub fn heater(&mut self) -> Result<bool, S::Error> {
        self.require_heater()?;
        let response = self.query(format_args!("PSHTR?"))?;
        match response.trim() {
            "1" => Ok(true),
            "0" => Ok(false),
            _ => Err(Error::InvalidResponse),
        }
    }

    /// Switch the persistent heater.
    ///
    /// Switching on pauses an active sweep first, then is refused unless output and
    /// magnet currents match. A refusal from an idle channel sends nothing. The supply is
    /// unresponsive for a while afterwards, so this blocks for the configured heater
    /// settle time.
    pub fn set_heater(&mut self, on: bool) -> Result<(), S::Error> {
        self.require_heater()?;

        let mut paused = false;
        if on {
            if self.sweep_state()?.is_active() {
                self.sweep(SweepCommand::Pause)?;
                paused = true;
            }
            let output = self.output_current()?;
            let magnet = self.magnet_current()?;
            if !output.is_close_to(magnet.value) {
                warn!(
                    "Refusing to engage persistent heater: output {} {}, magnet {} {}",
                    output.value, output.units, magnet.value, magnet.units
                );
                return Err(Error::CurrentMismatch {
                    output: output.value,
                    magnet: magnet.value,
                });
            }
        }

        if !paused {
            self.sweep(SweepCommand::Pause)?;
        }
        self.write(format_args!("PSHTR {}", if on { "ON" } else { "OFF" }))?;
        info!(
            "Persistent heater {}, waiting {} s",
            if on { "on" } else { "off" },
            self.psu.config.heater_settle.to_secs()
        );
        let settle = self.psu.config.heater_settle;
        self.psu.timer.delay(settle);
        Ok(())
    }
}
