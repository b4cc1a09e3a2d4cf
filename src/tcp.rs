//! [embedded_io] adapter for instruments reached over a raw TCP socket.

use std::{
    io,
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use log::debug;

/// A connected instrument socket.
pub struct TcpSocket(TcpStream);

/// [std::io::Error] wrapped so it can be used as an [embedded_io::Error].
#[derive(Debug)]
pub struct IoError(pub io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            io::ErrorKind::ConnectionRefused => embedded_io::ErrorKind::ConnectionRefused,
            io::ErrorKind::ConnectionReset => embedded_io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted => embedded_io::ErrorKind::ConnectionAborted,
            io::ErrorKind::NotConnected => embedded_io::ErrorKind::NotConnected,
            io::ErrorKind::AddrInUse => embedded_io::ErrorKind::AddrInUse,
            io::ErrorKind::AddrNotAvailable => embedded_io::ErrorKind::AddrNotAvailable,
            io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            // A read timeout on a socket surfaces as WouldBlock on some platforms.
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                embedded_io::ErrorKind::TimedOut
            }
            io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl TcpSocket {
    /// Connect to `host:port`. `timeout` bounds the connection attempt and every
    /// subsequent read and write.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, IoError> {
        let mut last_error = io::Error::new(io::ErrorKind::NotFound, "host did not resolve");
        for addr in (host, port).to_socket_addrs().map_err(IoError)? {
            debug!("Connecting to {addr}");
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Self::from_stream(stream, timeout),
                Err(e) => last_error = e,
            }
        }
        Err(IoError(last_error))
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: TcpStream, timeout: Duration) -> Result<Self, IoError> {
        stream.set_read_timeout(Some(timeout)).map_err(IoError)?;
        stream.set_write_timeout(Some(timeout)).map_err(IoError)?;
        stream.set_nodelay(true).map_err(IoError)?;
        Ok(Self(stream))
    }

    pub fn into_inner(self) -> TcpStream {
        self.0
    }
}

impl embedded_io::ErrorType for TcpSocket {
    type Error = IoError;
}

impl embedded_io::Read for TcpSocket {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for TcpSocket {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        io::Write::flush(&mut self.0).map_err(IoError)
    }
}
