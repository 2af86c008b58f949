// Framing mode comparison
//
// Builds one synthetic capture and decodes it under all three framing
// disciplines to show how the emitted symbol streams differ.

use spitrace_rs::{decode, Framing, Sample};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Select drops, 0x3C is clocked out over eight rising edges, select
    // rises again, then the clock goes quiet.
    let byte = 0x3Cu8;
    let mut samples = vec![sample(0, 0, 1, 0)];
    let mut t = 1;
    samples.push(sample(t, 0, 0, 0));
    t += 1;
    for bit in (0..8).rev() {
        samples.push(sample(t, 1, 0, (byte >> bit) & 1));
        samples.push(sample(t + 1, 0, 0, (byte >> bit) & 1));
        t += 2;
    }
    samples.push(sample(t, 0, 1, 0));
    samples.push(sample(t + 1, 0, 1, 0));

    for framing in [
        Framing::ClockEdge,
        Framing::ChipSelect,
        Framing::ChipSelectSingle,
    ] {
        let trace = decode(samples.iter().copied(), framing)?;
        println!("{framing:?}:");
        for event in &trace.events {
            println!("  {:>4}  {}", event.timestamp, event.text());
        }
        for byte in &trace.bytes {
            println!(
                "  {:>4}  {}  0x{:02X}",
                byte.timestamp,
                byte.lane.as_str(),
                byte.value
            );
        }
        println!();
    }

    Ok(())
}

fn sample(timestamp: i64, sck: u8, ss: u8, mosi: u8) -> Sample {
    Sample {
        timestamp,
        sck: sck != 0,
        ss: ss != 0,
        mosi: mosi != 0,
        miso: mosi == 0,
    }
}
