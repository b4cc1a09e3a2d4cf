//! Driving a channel's output current to a target and waiting for it to get there.

use log::{debug, info, warn};

use crate::{
    cryomag::{CURRENT_LIMIT, Channel},
    error::{Error, Result},
    timer::{Duration, Timer},
    types::{SweepCommand, SweepDirection, SweepState},
};

/// How long [Channel::wait_then_pause_sweep] may wait before pausing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SweepTimeout {
    /// Twice the time the sweep should take at the slowest applicable rate.
    #[default]
    Auto,
    /// A fixed wall clock limit.
    After(Duration),
}

impl<S: embedded_io::Read + embedded_io::Write, T: Timer, const L: usize> Channel<'_, S, T, L> {
    /// Start sweeping the output current from where it is now to `target`.
    ///
    /// The heater of a heater-capable channel must be on, and no channel may be sweeping
    /// already. Returns as soon as the sweep is running; see
    /// [Self::wait_then_pause_sweep] to wait for it.
    pub fn sweep_to(&mut self, target: f64) -> Result<(), S::Error> {
        let target = CURRENT_LIMIT.check(target)?;

        let heater_on = if self.id.has_heater() {
            if !self.heater()? {
                return Err(Error::HeaterInactive(self.id));
            }
            true
        } else {
            false
        };

        self.psu.ensure_no_active_sweep()?;

        let command = if target == 0.0 {
            SweepCommand::Zero
        } else {
            let output = self.output_current()?.value;
            if target < output {
                self.set_llim(target)?;
                self.set_ulim(output)?;
                SweepCommand::Down
            } else {
                self.set_llim(output)?;
                self.set_ulim(target)?;
                SweepCommand::Up
            }
        };
        let command = if heater_on { command.fast() } else { command };

        info!("Channel {}: sweeping {} to {}", self.id, command, target);
        // The 4G sometimes ignores the first sweep command while it settles from its
        // previous state, so it is always sent twice.
        self.sweep(command)?;
        self.sweep(command)
    }

    /// Wait until the active sweep reaches its target or `timeout` elapses, then pause.
    ///
    /// Does nothing when the channel is already paused or in standby. Running out of time
    /// is not an error: the sweep is paused wherever it got to, so check the output
    /// current afterwards if it matters.
    pub fn wait_then_pause_sweep(&mut self, timeout: SweepTimeout) -> Result<(), S::Error> {
        let (direction, fast) = match self.sweep_state()? {
            SweepState::Sweeping { direction, fast } => (direction, fast),
            SweepState::Pause | SweepState::Standby => return Ok(()),
        };

        let target = match direction {
            SweepDirection::Down => self.llim()?,
            SweepDirection::Up => self.ulim()?,
            SweepDirection::Zero => 0.0,
        };

        let duration = match timeout {
            SweepTimeout::Auto => self.estimated_sweep_duration(fast)?,
            SweepTimeout::After(duration) => duration,
        };
        debug!(
            "Channel {}: waiting up to {} ms for {}",
            self.id,
            duration.to_millis(),
            target
        );

        let start = self.psu.timer.now();
        let mut reached = false;
        while self.psu.timer.elapsed_since(start) < duration {
            if self.output_close_to(target)? {
                reached = true;
                break;
            }
        }
        if !reached {
            warn!(
                "Channel {}: sweep did not reach {} within {} ms, pausing anyway",
                self.id,
                target,
                duration.to_millis()
            );
        }

        self.sweep(SweepCommand::Pause)
    }

    /// Upper bound on how long a sweep between the present limits takes.
    ///
    /// Uses the fast rate when `fast`, otherwise the slowest of the other rates, since we
    /// don't know which range the sweep is in.
    pub fn estimated_sweep_duration(&mut self, fast: bool) -> Result<Duration, S::Error> {
        let llim = self.llim()?;
        let ulim = self.ulim()?;
        let rates = self.rates()?;
        let rate = if fast {
            rates[5]
        } else {
            rates[..5].iter().copied().fold(f64::INFINITY, f64::min)
        };
        if !(rate > 0.0 && rate.is_finite()) {
            return Err(Error::InvalidResponse);
        }

        let seconds = 2.0 * (ulim - llim) / rate;
        Ok(Duration::from_ticks((seconds * 1_000_000.0) as u64))
    }
}
