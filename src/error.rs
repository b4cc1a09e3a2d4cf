//! Our error types for the instrument drivers.

use thiserror::Error;

use crate::types::ChannelId;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for instrument communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    SerialError(I),
    #[error("Communication timeout")]
    Timeout,
    #[error("Command or response does not fit the line buffer")]
    BufferError,
    #[error("Invalid response received")]
    InvalidResponse,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Refused to engage the persistent heater. No command was sent.
    #[error("Refused! Output ({output}) and magnet ({magnet}) currents must match")]
    CurrentMismatch { output: f64, magnet: f64 },
    #[error("Persistent heater must be active to sweep channel {0}")]
    HeaterInactive(ChannelId),
    /// Another sweep is in progress. No command was sent.
    #[error("Sweep on channel {0} is active")]
    SweepActive(ChannelId),
}

/// A value fell outside the domain accepted by a parameter.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ValidationError {
    #[error("{value} is outside the permitted range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },
}

/// Invalid driver construction.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Channel must be either 1 or 2, got {0}")]
    InvalidChannel(u8),
    #[error("RF channel must be either 0 or 1, got {0}")]
    InvalidRfChannel(u8),
    #[error("Channel {0} has no persistent heater")]
    NoHeater(ChannelId),
    #[error("Unsupported transport {0:?}, only TCPIP sockets are supported")]
    UnsupportedTransport(crate::address::TransportKind),
    #[error("Malformed instrument address")]
    MalformedAddress,
}
