use std::env;

use inquire::Select;
use lab_source_drivers::{
    RfChannel, SynthHdPro,
    synth_hd::{RfSweepDirection, RfSweepType, TriggerMode},
    tcp::IoError,
};
use serialport::SerialPort;

// Configuration constants - adjust these for your setup
// The SynthHD is a USB CDC device, the baud rate is ignored but must be valid.
const BAUD_RATE: u32 = 115200;
const SERIAL_TIMEOUT_MS: u64 = 500;
const CW_FREQUENCY_HZ: f64 = 2.4e9;
const CW_POWER_DBM: f64 = -10.0;
const STABILIZATION_DELAY_MS: u64 = 1000;

pub struct PortWrapper(Box<dyn SerialPort>);

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

fn main() {
    env_logger::init();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    let port = serialport::new(&port_name, BAUD_RATE)
        .timeout(std::time::Duration::from_millis(SERIAL_TIMEOUT_MS))
        .open()
        .expect("Failed to open serial port");

    let mut synth: SynthHdPro<PortWrapper, 64> =
        SynthHdPro::new(PortWrapper(port)).expect("Failed to initialise synthesizer");

    let identity = synth.identity().unwrap();
    println!("{:#?}", identity);

    let mut rf0 = synth.channel(RfChannel::Rf0);
    rf0.set_mute(true).unwrap();
    rf0.set_frequency(CW_FREQUENCY_HZ).unwrap();
    rf0.set_power(CW_POWER_DBM).unwrap();
    rf0.set_mute(false).unwrap();
    println!(
        "RF0: {} Hz at {} dBm, calibrated: {}",
        rf0.frequency().unwrap(),
        rf0.power().unwrap(),
        rf0.calibration_success().unwrap()
    );

    std::thread::sleep(std::time::Duration::from_millis(STABILIZATION_DELAY_MS));

    // Prepare a linear sweep on RF1, started by the trigger input
    let mut rf1 = synth.channel(RfChannel::Rf1);
    rf1.set_freq_low(1e9).unwrap();
    rf1.set_freq_high(2e9).unwrap();
    rf1.set_freq_step(10e6).unwrap();
    rf1.set_step_time(10.0).unwrap();
    rf1.set_power_low(-20.0).unwrap();
    rf1.set_power_high(-20.0).unwrap();
    rf1.set_sweep_direction(RfSweepDirection::Up).unwrap();
    rf1.set_sweep_type(RfSweepType::Linear).unwrap();
    rf1.set_trigger_mode(TriggerMode::FSweep).unwrap();
    println!("RF1 trigger mode: {}", rf1.trigger_mode().unwrap());

    synth.channel(RfChannel::Rf0).set_mute(true).unwrap();
    println!("RF0 muted");
}
