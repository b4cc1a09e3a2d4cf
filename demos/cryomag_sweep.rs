use std::env;

use inquire::Confirm;
use lab_source_drivers::{
    ChannelId, CryoMag4G, CryoMagConfig, SweepCommand, SweepTimeout, Units, timer::Duration,
};

// Configuration constants - adjust these for your setup
const DEFAULT_ADDRESS: &str = "TCPIP0::192.168.0.187::4444::SOCKET";
// Our bench magnet's heater switch settles much faster than the 5 minute default.
const HEATER_SETTLE_S: u64 = 10;
const TARGET_A: f64 = 1.0;

fn main() {
    // Run with RUST_LOG=debug to see every command sent to the supply
    env_logger::init();

    let address = env::args().nth(1).unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
    println!("Connecting to: {}", address);

    let config = CryoMagConfig {
        heater_settle: Duration::secs(HEATER_SETTLE_S),
        ..Default::default()
    };
    let mut psu = CryoMag4G::connect(&address, config).expect("Failed to connect to supply");

    psu.set_remote(true).unwrap();
    for id in ChannelId::ALL {
        psu.channel(id).set_units(Units::Amps).unwrap();
    }

    let engage = Confirm::new("Engage the persistent heater on channel 1?")
        .with_default(false)
        .prompt()
        .expect("Failed to read answer");
    if engage {
        match psu.channel(ChannelId::One).set_heater(true) {
            Ok(()) => println!("Persistent heater on"),
            Err(e) => println!("Heater not engaged: {}", e),
        }
    }

    let mut ch = psu.channel(ChannelId::Two);

    // Sweep up and wait for as long as the slowest rate could take
    ch.sweep_to(TARGET_A).unwrap();
    ch.wait_then_pause_sweep(SweepTimeout::Auto).unwrap();
    println!("Output current: {:?}", ch.output_current().unwrap());

    // Sweep down, but only give it a second
    ch.sweep_to(-TARGET_A).unwrap();
    ch.wait_then_pause_sweep(SweepTimeout::After(Duration::secs(1)))
        .unwrap();
    println!("Output current: {:?}", ch.output_current().unwrap());

    // Back to zero
    ch.sweep(SweepCommand::Zero).unwrap();
    ch.wait_then_pause_sweep(SweepTimeout::Auto).unwrap();
    println!("Output current: {:?}", ch.output_current().unwrap());

    psu.set_remote(false).unwrap();
}
