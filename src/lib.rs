//! # SpiTrace RS
//!
//! A Rust library for decoding raw logic captures of a Serial Peripheral
//! Interface (SPI) bus into a stream of framed symbols.
//!
//! The input is four synchronized boolean channels sampled over time: clock
//! (SCK), chip select (SS), and the two data lines (MOSI, MISO). One
//! deterministic left-to-right pass over the samples produces START/STOP
//! frame markers and 8-bit data bytes on both lanes, each stamped with its
//! capture timestamp and a display classification.
//!
//! ## Features
//!
//! - **Per-sample state machine**: feed samples one at a time, collect
//!   symbols through any [`SymbolSink`]
//! - **Three framing modes**: clock-edge framing, select-line framing, and
//!   a single-byte-per-assertion select variant, unified in one engine
//! - **Capture loading**: CSV captures (per-channel or hex bitmap columns)
//!   via `polars`, with timestamp validation and trigger-row lookup
//! - **Type safety**: closed enumerations for events and symbol classes,
//!   error handling throughout
//!
//! ## Examples
//!
//! ### Decoding a sample feed
//!
//! ```rust
//! use spitrace_rs::{decode, Framing, Lane, Sample};
//!
//! // Idle bus, then 0xA5 clocked out MSB-first, one rising edge per bit.
//! let mut samples = vec![Sample { timestamp: 0, sck: false, ss: true, mosi: false, miso: false }];
//! let byte = 0xA5u8;
//! let mut t = 1;
//! for bit in (0..8).rev() {
//!     let mosi = (byte >> bit) & 1 == 1;
//!     samples.push(Sample { timestamp: t, sck: true, ss: false, mosi, miso: !mosi });
//!     samples.push(Sample { timestamp: t + 1, sck: false, ss: false, mosi, miso: !mosi });
//!     t += 2;
//! }
//! // A second consecutive low closes the frame.
//! samples.push(Sample { timestamp: t, sck: false, ss: true, mosi: false, miso: false });
//!
//! let trace = decode(samples, Framing::ClockEdge)?;
//! assert_eq!(trace.events.len(), 2); // START and STOP
//! let mosi: Vec<u8> = trace.bytes_on(Lane::Mosi).map(|b| b.value).collect();
//! assert_eq!(mosi, vec![0xA5]);
//! # Ok::<(), spitrace_rs::DecodeError>(())
//! ```
//!
//! ### Stepping the decoder by hand
//!
//! ```rust
//! use spitrace_rs::{DecodedTrace, Framing, Sample, SpiDecoder};
//!
//! let mut decoder = SpiDecoder::new(Framing::ChipSelect);
//! let mut trace = DecodedTrace::new();
//!
//! // Select drops: the frame opens.
//! decoder.step(
//!     Sample { timestamp: 0, sck: false, ss: false, mosi: false, miso: false },
//!     &mut trace,
//! );
//! assert_eq!(trace.events[0].text(), "START");
//! ```
//!
//! ### Loading a capture from CSV
//!
//! ```rust
//! use spitrace_rs::{Capture, Framing};
//!
//! let csv = b"time,SCK,SS,MOSI,MISO\n-1,0,1,0,0\n0,0,0,0,0\n1,1,0,1,0\n";
//! let capture = Capture::from_channel_csv(csv)?;
//! println!("trigger at row {:?}", capture.trigger_row());
//!
//! let trace = capture.decode(Framing::ChipSelect)?;
//! println!("{} events, {} bytes", trace.events.len(), trace.bytes.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod capture;
pub mod decoder;
pub mod symbol;

// Re-export the main types for convenience
pub use decoder::{decode, Framing, Phase, Sample, SpiDecoder};

pub use symbol::{
    ByteSymbol, DecodeError, DecodedTrace, EventKind, EventSymbol, Lane, SymbolClass, SymbolSink,
};

pub use capture::{Capture, CaptureError, ChannelMap};
