// Decode a CSV logic capture into SPI symbols
//
// The capture needs a header row with `time`, `SCK`, `SS`, `MOSI` and `MISO`
// columns; see the crate docs for the exact layout.

use clap::{Parser, ValueEnum};
use spitrace_rs::{Capture, Framing};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Frame on clock edges (idle-low convention)
    Clock,
    /// Frame on the select line, multi-byte
    Select,
    /// Frame on the select line, one byte per assertion
    Single,
}

impl From<Mode> for Framing {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Clock => Framing::ClockEdge,
            Mode::Select => Framing::ChipSelect,
            Mode::Single => Framing::ChipSelectSingle,
        }
    }
}

#[derive(Parser)]
#[command(about = "Decode a CSV logic capture into SPI symbols")]
struct Args {
    /// Path to the capture CSV
    capture: PathBuf,

    /// Framing discipline
    #[arg(long, value_enum, default_value_t = Mode::Clock)]
    mode: Mode,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let data = std::fs::read(&args.capture)?;
    let capture = Capture::from_channel_csv(&data)?;
    println!(
        "Loaded {} samples from {}",
        capture.len(),
        args.capture.display()
    );
    match capture.trigger_row() {
        Some(row) => println!("Trigger at row {row}"),
        None => println!("Capture ends before the trigger point"),
    }

    let trace = capture.decode(args.mode.into())?;
    println!(
        "\nDecoded {} events and {} data bytes\n",
        trace.events.len(),
        trace.bytes.len()
    );

    for event in &trace.events {
        println!("{:>12}  {}", event.timestamp, event.text());
    }
    println!();
    for byte in &trace.bytes {
        println!(
            "{:>12}  {}  0x{:02X}",
            byte.timestamp,
            byte.lane.as_str(),
            byte.value
        );
    }

    Ok(())
}
