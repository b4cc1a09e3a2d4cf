//! VISA style instrument resource addresses, e.g. `TCPIP0::192.168.0.187::4444::SOCKET`.

use crate::error::ConfigurationError;

/// The transport family an address refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Raw TCP socket.
    TcpipSocket,
    /// VXI-11 / HiSLIP instrument over TCP.
    TcpipInstr,
    Gpib,
    Usb,
    /// Serial port.
    Asrl,
}

/// A parsed resource address. Only raw sockets keep their details, as those are the only
/// ones this crate can open itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisaAddress<'a> {
    TcpipSocket { host: &'a str, port: u16 },
    Other(TransportKind),
}

impl<'a> VisaAddress<'a> {
    pub fn parse(address: &'a str) -> Result<Self, ConfigurationError> {
        let mut parts = address.trim().split("::");
        let interface = parts.next().unwrap_or_default();
        let prefix = interface.trim_end_matches(|c: char| c.is_ascii_digit());

        let kind = if prefix.eq_ignore_ascii_case("TCPIP") {
            let host = parts.next().ok_or(ConfigurationError::MalformedAddress)?;
            let rest = parts.next();
            let suffix = parts.next();
            match (rest, suffix) {
                (Some(port), Some(suffix)) if suffix.eq_ignore_ascii_case("SOCKET") => {
                    let port = port
                        .parse::<u16>()
                        .map_err(|_| ConfigurationError::MalformedAddress)?;
                    if host.is_empty() || parts.next().is_some() {
                        return Err(ConfigurationError::MalformedAddress);
                    }
                    return Ok(VisaAddress::TcpipSocket { host, port });
                }
                _ => TransportKind::TcpipInstr,
            }
        } else if prefix.eq_ignore_ascii_case("GPIB") {
            TransportKind::Gpib
        } else if prefix.eq_ignore_ascii_case("USB") {
            TransportKind::Usb
        } else if prefix.eq_ignore_ascii_case("ASRL") {
            TransportKind::Asrl
        } else {
            return Err(ConfigurationError::MalformedAddress);
        };
        Ok(VisaAddress::Other(kind))
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            VisaAddress::TcpipSocket { .. } => TransportKind::TcpipSocket,
            VisaAddress::Other(kind) => *kind,
        }
    }
}
