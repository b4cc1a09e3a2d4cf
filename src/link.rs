//! Line oriented request/response framing over an [embedded_io] byte stream.
//!
//! All of the supported instruments speak a textual protocol: each command is a single
//! line, and each query is answered with a single line. The terminator is fixed when the
//! link is created.

use core::fmt::Write as _;

use log::debug;

use crate::error::{Error, Result};

/// A request/response connection to one instrument.
///
/// `L` is the capacity, in bytes, of the command and response buffers.
pub struct LineLink<S: embedded_io::Read + embedded_io::Write, const L: usize> {
    interface: S,
    terminator: &'static str,
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> LineLink<S, L> {
    pub fn new(interface: S, terminator: &'static str) -> Self {
        Self {
            interface,
            terminator,
        }
    }

    /// Send one command line.
    pub fn write(&mut self, command: &str) -> Result<(), S::Error> {
        debug!("-> {command}");
        self.interface
            .write_all(command.as_bytes())
            .map_err(Error::SerialError)?;
        self.interface
            .write_all(self.terminator.as_bytes())
            .map_err(Error::SerialError)?;
        self.interface.flush().map_err(Error::SerialError)
    }

    /// Format and send one command line.
    pub fn write_fmt(&mut self, args: core::fmt::Arguments<'_>) -> Result<(), S::Error> {
        let command =
            format_command::<L>(args).map_err(|_| Error::<S::Error>::BufferError)?;
        self.write(&command)
    }

    /// Send a command and return the response line with the terminator removed.
    pub fn query(&mut self, command: &str) -> Result<heapless::String<L>, S::Error> {
        self.write(command)?;
        let response = self.read_line()?;
        debug!("<- {response}");
        Ok(response)
    }

    /// Format a command, send it and return the response line.
    pub fn query_fmt(
        &mut self,
        args: core::fmt::Arguments<'_>,
    ) -> Result<heapless::String<L>, S::Error> {
        let command =
            format_command::<L>(args).map_err(|_| Error::<S::Error>::BufferError)?;
        self.query(&command)
    }

    /// Borrow the underlying interface.
    pub fn interface(&self) -> &S {
        &self.interface
    }

    /// Mutably borrow the underlying interface.
    pub fn interface_mut(&mut self) -> &mut S {
        &mut self.interface
    }

    /// Release the underlying interface.
    pub fn into_inner(self) -> S {
        self.interface
    }

    fn read_line(&mut self) -> Result<heapless::String<L>, S::Error> {
        let mut buff: heapless::Vec<u8, L> = heapless::Vec::new();
        let terminator = self.terminator.as_bytes();

        // One byte at a time so we never consume past the end of this response.
        let mut byte = [0u8; 1];
        loop {
            match self.interface.read(&mut byte) {
                Ok(0) => {
                    if buff.is_empty() {
                        return Err(Error::Timeout);
                    }
                    break;
                }
                Ok(_) => {
                    buff.push(byte[0]).map_err(|_| Error::<S::Error>::BufferError)?;
                    if buff.ends_with(terminator) {
                        buff.truncate(buff.len() - terminator.len());
                        break;
                    }
                }
                Err(e) => {
                    use embedded_io::Error as _;
                    // No more data on the wire. Accept an unterminated line if we got one.
                    if matches!(
                        e.kind(),
                        embedded_io::ErrorKind::Other | embedded_io::ErrorKind::TimedOut
                    ) {
                        if buff.is_empty() {
                            return Err(Error::Timeout);
                        }
                        break;
                    }
                    return Err(Error::SerialError(e));
                }
            }
        }

        heapless::String::from_utf8(buff).map_err(|_| Error::InvalidResponse)
    }
}

/// Render a command into a fixed capacity buffer.
pub(crate) fn format_command<const L: usize>(
    args: core::fmt::Arguments<'_>,
) -> core::result::Result<heapless::String<L>, core::fmt::Error> {
    let mut command: heapless::String<L> = heapless::String::new();
    command.write_fmt(args)?;
    Ok(command)
}

/// Parse a response that may carry unit or status decoration, e.g. `"  1.2345A"`.
///
/// Every character other than digits, `.` and `-` is discarded before parsing.
pub fn parse_decorated<I: embedded_io::Error>(response: &str) -> Result<f64, I> {
    let mut digits: heapless::String<32> = heapless::String::new();
    for c in response
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
    {
        digits.push(c).map_err(|_| Error::<I>::InvalidResponse)?;
    }
    digits.parse::<f64>().map_err(|_| Error::InvalidResponse)
}

/// Parse a bare numeric response.
pub fn parse_float<I: embedded_io::Error>(response: &str) -> Result<f64, I> {
    response
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_serial::{MockSerial, MockSerialError};

    type TestResult<T> = Result<T, MockSerialError>;

    #[test]
    fn write_appends_terminator() {
        let mock = MockSerial::new(|_: &str| -> Option<String> { None });
        let mut link: LineLink<_, 64> = LineLink::new(mock, "\r\n");
        link.write("REMOTE").unwrap();
        link.write_fmt(format_args!("CHAN {}; LLIM {}", 1, 0.5))
            .unwrap();
        assert_eq!(link.interface().written_bytes(), b"REMOTE\r\nCHAN 1; LLIM 0.5\r\n");
        assert_eq!(link.interface().lines(), ["REMOTE", "CHAN 1; LLIM 0.5"]);
    }

    #[test]
    fn query_strips_terminator() {
        let mock = MockSerial::new(|line: &str| -> Option<String> {
            match line {
                "CHAN 2; IOUT?" => Some("0.5000A".into()),
                _ => None,
            }
        });
        let mut link: LineLink<_, 64> = LineLink::new(mock, "\r\n");
        let response = link.query("CHAN 2; IOUT?").unwrap();
        assert_eq!(response.as_str(), "0.5000A");
    }

    #[test]
    fn query_without_response_times_out() {
        let mock = MockSerial::new(|_: &str| -> Option<String> { None });
        let mut link: LineLink<_, 64> = LineLink::new(mock, "\n");
        assert!(matches!(link.query("v0"), Err(Error::Timeout)));
    }

    #[test]
    fn overlong_response_is_a_buffer_error() {
        let mock = MockSerial::new(|_: &str| -> Option<String> { Some("x".repeat(40)) });
        let mut link: LineLink<_, 16> = LineLink::new(mock, "\n");
        assert!(matches!(link.query("+"), Err(Error::BufferError)));
    }

    #[test]
    fn overlong_command_is_a_buffer_error() {
        let mock = MockSerial::new(|_: &str| -> Option<String> { None });
        let mut link: LineLink<_, 8> = LineLink::new(mock, "\n");
        let result = link.write_fmt(format_args!("CHAN {}; VLIM {}", 1, 2.5));
        assert!(matches!(result, Err(Error::BufferError)));
        assert!(link.interface().written_bytes().is_empty());
    }

    #[test]
    fn read_error_propagates() {
        let mut mock = MockSerial::new(|_: &str| -> Option<String> { Some("1".into()) });
        mock.set_read_error(true);
        let mut link: LineLink<_, 16> = LineLink::new(mock, "\n");
        assert!(matches!(
            link.query("C0;h?"),
            Err(Error::SerialError(MockSerialError::SimulatedError))
        ));
    }

    #[test]
    fn decorated_numbers() {
        assert_eq!(parse_decorated::<MockSerialError>("1.2345A").unwrap(), 1.2345);
        assert_eq!(parse_decorated::<MockSerialError>(" -0.25kG ").unwrap(), -0.25);
        assert_eq!(parse_decorated::<MockSerialError>("3.000V").unwrap(), 3.0);
        assert!(matches!(
            parse_decorated::<MockSerialError>("Pause"),
            Err(Error::InvalidResponse)
        ));
    }

    #[test]
    fn plain_numbers() {
        let parsed: TestResult<f64> = parse_float("  8.0 ");
        assert_eq!(parsed.unwrap(), 8.0);
        let parsed: TestResult<f64> = parse_float("8.0 GHz");
        assert!(matches!(parsed, Err(Error::InvalidResponse)));
    }
}
