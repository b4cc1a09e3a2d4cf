//! We use this mocking module in unit tests to emulate an instrument on a serial port.
//!
//! Every complete line written to [MockSerial] is recorded and handed to a [Responder],
//! whose reply (if any) becomes the data returned by subsequent reads.

use std::collections::VecDeque;

/// Produces the reply to one command line.
pub trait Responder {
    fn respond(&mut self, line: &str) -> Option<String>;
}

impl<F: FnMut(&str) -> Option<String>> Responder for F {
    fn respond(&mut self, line: &str) -> Option<String> {
        self(line)
    }
}

/// Our mock type used to emulate a serial port.
pub struct MockSerial<R: Responder> {
    responder: R,
    /// Every byte written to the mock serial port.
    write_buffer: Vec<u8>,
    /// Bytes of a line that has not been terminated yet.
    partial_line: Vec<u8>,
    /// Complete command lines, terminators removed.
    lines: Vec<String>,
    /// Pending reply data to be read.
    read_buffer: VecDeque<u8>,
    /// Appended to every reply.
    reply_terminator: &'static str,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
}

#[derive(Debug, PartialEq)]
pub enum MockSerialError {
    /// Simulated link failure.
    SimulatedError,
    /// Would block - no data available
    WouldBlock,
}

impl core::fmt::Display for MockSerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for MockSerialError {}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::SimulatedError => embedded_io::ErrorKind::BrokenPipe,
            MockSerialError::WouldBlock => embedded_io::ErrorKind::Other,
        }
    }
}

impl<R: Responder> embedded_io::ErrorType for MockSerial<R> {
    type Error = MockSerialError;
}

impl<R: Responder> embedded_io::Write for MockSerial<R> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        self.write_buffer.extend_from_slice(buf);
        for &byte in buf {
            if byte == b'\n' {
                self.finish_line();
            } else {
                self.partial_line.push(byte);
            }
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl<R: Responder> embedded_io::Read for MockSerial<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        if self.read_buffer.is_empty() {
            return Err(MockSerialError::WouldBlock);
        }

        let bytes_to_read = core::cmp::min(buf.len(), self.read_buffer.len());
        for (slot, byte) in buf.iter_mut().zip(self.read_buffer.drain(..bytes_to_read)) {
            *slot = byte;
        }
        Ok(bytes_to_read)
    }
}

impl<R: Responder> MockSerial<R> {
    /// Create a new MockSerial whose replies are terminated with `"\r\n"`.
    pub fn new(responder: R) -> Self {
        Self {
            responder,
            write_buffer: Vec::new(),
            partial_line: Vec::new(),
            lines: Vec::new(),
            read_buffer: VecDeque::new(),
            reply_terminator: "\r\n",
            should_error_on_write: false,
            should_error_on_read: false,
        }
    }

    /// Use a different reply terminator.
    pub fn with_reply_terminator(mut self, terminator: &'static str) -> Self {
        self.reply_terminator = terminator;
        self
    }

    /// Get a reference to the raw data that was written to this mock serial port
    pub fn written_bytes(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Every command line written so far.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Command lines that are not queries.
    pub fn commands(&self) -> Vec<&str> {
        self.lines
            .iter()
            .map(String::as_str)
            .filter(|line| !line.contains('?'))
            .collect()
    }

    /// Forget everything written so far.
    pub fn clear_written_data(&mut self) {
        self.write_buffer.clear();
        self.lines.clear();
    }

    pub fn responder(&self) -> &R {
        &self.responder
    }

    pub fn responder_mut(&mut self) -> &mut R {
        &mut self.responder
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    fn finish_line(&mut self) {
        let mut line = String::from_utf8_lossy(&self.partial_line).to_string();
        self.partial_line.clear();
        if line.ends_with('\r') {
            line.pop();
        }
        if let Some(reply) = self.responder.respond(&line) {
            self.read_buffer.extend(reply.bytes());
            self.read_buffer.extend(self.reply_terminator.bytes());
        }
        self.lines.push(line);
    }
}

/// One simulated channel of a Cryomagnetics 4G.
#[derive(Debug, Clone)]
pub struct FakeMagnetChannel {
    pub units: &'static str,
    pub output: f64,
    pub magnet: f64,
    pub output_voltage: f64,
    pub magnet_voltage: f64,
    pub llim: f64,
    pub ulim: f64,
    pub vlim: f64,
    /// Exactly what `SWEEP?` reports.
    pub sweep: String,
    pub heater: bool,
    pub rates: [f64; 6],
    pub ranges: [f64; 5],
    /// How far output current moves towards the sweep target per `IOUT?` poll.
    pub step: f64,
}

impl Default for FakeMagnetChannel {
    fn default() -> Self {
        Self {
            units: "A",
            output: 0.0,
            magnet: 0.0,
            output_voltage: 0.0,
            magnet_voltage: 0.0,
            llim: 0.0,
            ulim: 0.0,
            vlim: 5.0,
            sweep: "Standby".into(),
            heater: false,
            rates: [0.1, 0.05, 0.02, 0.01, 0.005, 0.5],
            ranges: [10.0, 20.0, 40.0, 60.0, 100.0],
            step: 0.25,
        }
    }
}

impl FakeMagnetChannel {
    fn target(&self) -> Option<f64> {
        let sweep = self.sweep.to_ascii_lowercase();
        if sweep.contains("up") {
            Some(self.ulim)
        } else if sweep.contains("down") {
            Some(self.llim)
        } else if sweep.contains("zero") {
            Some(0.0)
        } else {
            None
        }
    }

    /// Move output current one step towards the active sweep target.
    fn advance(&mut self) {
        if let Some(target) = self.target() {
            let remaining = target - self.output;
            if remaining.abs() <= self.step {
                self.output = target;
            } else {
                self.output += self.step.copysign(remaining);
            }
            self.magnet = self.output;
        }
    }

    fn respond(&mut self, command: &str) -> Option<String> {
        let units = self.units;
        match command {
            "UNITS?" => return Some(units.to_string()),
            "IMAG?" => return Some(format!("{}{units}", self.magnet)),
            "IOUT?" => {
                self.advance();
                return Some(format!("{}{units}", self.output));
            }
            "VMAG?" => return Some(format!("{}V", self.magnet_voltage)),
            "VOUT?" => return Some(format!("{}V", self.output_voltage)),
            "LLIM?" => return Some(format!("{}{units}", self.llim)),
            "ULIM?" => return Some(format!("{}{units}", self.ulim)),
            "VLIM?" => return Some(format!("{}V", self.vlim)),
            "SWEEP?" => return Some(self.sweep.clone()),
            "PSHTR?" => return Some(if self.heater { "1" } else { "0" }.into()),
            _ => {}
        }

        let (verb, arg) = command.split_once(' ')?;
        match verb {
            "RATE?" => arg.parse::<usize>().ok().map(|i| self.rates[i].to_string()),
            "RANGE?" => arg.parse::<usize>().ok().map(|i| self.ranges[i].to_string()),
            "UNITS" => {
                self.units = if arg == "G" { "kG" } else { "A" };
                None
            }
            "LLIM" => {
                self.llim = arg.parse().ok()?;
                None
            }
            "ULIM" => {
                self.ulim = arg.parse().ok()?;
                None
            }
            "VLIM" => {
                self.vlim = arg.parse().ok()?;
                None
            }
            "PSHTR" => {
                self.heater = arg == "ON";
                None
            }
            "SWEEP" => {
                self.sweep = match arg {
                    "PAUSE" => "Pause".into(),
                    "UP" => "Sweep Up".into(),
                    "UP FAST" => "Sweep Up Fast".into(),
                    "DOWN" => "Sweep Down".into(),
                    "DOWN FAST" => "Sweep Down Fast".into(),
                    "ZERO" => "Zeroing".into(),
                    "ZERO FAST" => "Zeroing Fast".into(),
                    _ => return None,
                };
                None
            }
            _ => None,
        }
    }
}

/// A simulated two channel Cryomagnetics 4G.
#[derive(Debug, Clone, Default)]
pub struct FakeCryoMag {
    pub channels: [FakeMagnetChannel; 2],
    pub remote: Option<bool>,
}

impl FakeCryoMag {
    pub fn channel_mut(&mut self, number: u8) -> &mut FakeMagnetChannel {
        &mut self.channels[usize::from(number) - 1]
    }
}

impl Responder for FakeCryoMag {
    fn respond(&mut self, line: &str) -> Option<String> {
        match line {
            "REMOTE" => {
                self.remote = Some(true);
                return None;
            }
            "LOCAL" => {
                self.remote = Some(false);
                return None;
            }
            _ => {}
        }
        let (number, command) = line.strip_prefix("CHAN ")?.split_once("; ")?;
        let number: u8 = number.parse().ok()?;
        if !(1..=2).contains(&number) {
            return None;
        }
        self.channel_mut(number).respond(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, Write};

    fn echo(line: &str) -> Option<String> {
        Some(format!("echo {line}"))
    }

    #[test]
    fn test_new_mock_serial() {
        let mock = MockSerial::new(echo);
        assert!(mock.written_bytes().is_empty());
        assert!(mock.lines().is_empty());
        assert!(!mock.should_error_on_write);
        assert!(!mock.should_error_on_read);
    }

    #[test]
    fn test_lines_are_split_on_newline() {
        let mut mock = MockSerial::new(|_: &str| -> Option<String> { None });
        mock.write_all(b"CHAN 1; ").unwrap();
        mock.write_all(b"LLIM 0.5\r\nREMOTE\r\n").unwrap();
        assert_eq!(mock.lines(), ["CHAN 1; LLIM 0.5", "REMOTE"]);
        assert_eq!(mock.written_bytes(), b"CHAN 1; LLIM 0.5\r\nREMOTE\r\n");
    }

    #[test]
    fn test_reply_is_readable() {
        let mut mock = MockSerial::new(echo).with_reply_terminator("\n");
        mock.write_all(b"ping\n").unwrap();

        let mut buffer = [0u8; 32];
        let read = mock.read(&mut buffer).unwrap();
        assert_eq!(&buffer[..read], b"echo ping\n");
    }

    #[test]
    fn test_read_partial_data() {
        let mut mock = MockSerial::new(echo);
        mock.write_all(b"abc\r\n").unwrap();

        let mut buffer = [0u8; 4];
        assert_eq!(mock.read(&mut buffer).unwrap(), 4);
        assert_eq!(&buffer, b"echo");
        let mut rest = [0u8; 16];
        let read = mock.read(&mut rest).unwrap();
        assert_eq!(&rest[..read], b" abc\r\n");
    }

    #[test]
    fn test_read_would_block_when_no_data() {
        let mut mock = MockSerial::new(echo);
        let mut buffer = [0u8; 10];
        assert_eq!(mock.read(&mut buffer), Err(MockSerialError::WouldBlock));
    }

    #[test]
    fn test_error_simulation() {
        let mut mock = MockSerial::new(echo);
        mock.set_write_error(true);
        assert_eq!(mock.write(b"test"), Err(MockSerialError::SimulatedError));
        assert_eq!(mock.flush(), Err(MockSerialError::SimulatedError));
        assert!(mock.written_bytes().is_empty());

        mock.set_write_error(false);
        mock.write_all(b"test\n").unwrap();
        mock.set_read_error(true);
        let mut buffer = [0u8; 10];
        assert_eq!(mock.read(&mut buffer), Err(MockSerialError::SimulatedError));
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            MockSerialError::SimulatedError.kind(),
            embedded_io::ErrorKind::BrokenPipe
        ));
        assert!(matches!(
            MockSerialError::WouldBlock.kind(),
            embedded_io::ErrorKind::Other
        ));
    }

    #[test]
    fn test_commands_excludes_queries() {
        let mut mock = MockSerial::new(|_: &str| -> Option<String> { None });
        mock.write_all(b"CHAN 1; SWEEP?\r\nCHAN 1; SWEEP PAUSE\r\n").unwrap();
        assert_eq!(mock.commands(), ["CHAN 1; SWEEP PAUSE"]);
        mock.clear_written_data();
        assert!(mock.lines().is_empty());
    }

    #[test]
    fn test_fake_cryomag_sweeps_towards_limit() {
        let mut fake = FakeCryoMag::default();
        fake.respond("CHAN 2; ULIM 0.6");
        fake.respond("CHAN 2; SWEEP UP");
        assert_eq!(fake.respond("CHAN 2; SWEEP?").as_deref(), Some("Sweep Up"));
        assert_eq!(fake.respond("CHAN 2; IOUT?").as_deref(), Some("0.25A"));
        assert_eq!(fake.respond("CHAN 2; IOUT?").as_deref(), Some("0.5A"));
        assert_eq!(fake.respond("CHAN 2; IOUT?").as_deref(), Some("0.6A"));
        assert_eq!(fake.respond("CHAN 2; IMAG?").as_deref(), Some("0.6A"));
        assert_eq!(fake.respond("CHAN 3; IOUT?"), None);
    }
}
