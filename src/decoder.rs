use crate::symbol::{
    ByteSymbol, DecodeError, DecodedTrace, EventKind, EventSymbol, Lane, SymbolSink,
};
use tracing::{debug, trace};

/// One acquisition sample of the four SPI channels.
///
/// Samples are produced by the capture host in strictly non-decreasing
/// timestamp order and consumed exactly once. Timestamps are in capture time
/// units and may be negative for samples before the trigger point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub timestamp: i64,
    pub sck: bool,
    pub ss: bool,
    pub mosi: bool,
    pub miso: bool,
}

/// Framing discipline of the decode pass, selected once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// Start/stop inferred from the clock line's idle-low convention.
    /// Rising-edge bit capture, any number of bytes per frame.
    #[default]
    ClockEdge,
    /// Start/stop taken from the active-low select line instead; bit capture
    /// stays edge-filtered and multi-byte.
    ChipSelect,
    /// Simplified select-framed variant: level-sampled bit capture and
    /// exactly one byte per select assertion.
    ///
    /// Assumes the capture delivers at most one sample per clock phase; a
    /// sample rate above the clock rate will over-count bits.
    ChipSelectSingle,
}

impl Framing {
    /// Map the host's "use select line" flag onto a framing mode.
    pub fn from_select_flag(use_select: bool) -> Self {
        if use_select {
            Framing::ChipSelect
        } else {
            Framing::ClockEdge
        }
    }
}

/// Decoder phase between frame boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Reading,
    /// Reserved; the decoder never enters this phase.
    Invalid,
}

/// Per-sample SPI decoding state machine.
///
/// Feed samples in timestamp order through [`SpiDecoder::step`]; each step
/// emits zero or more symbols to the given [`SymbolSink`]. The decoder owns
/// no external resources, so dropping it at any point is safe and a partially
/// accumulated byte at end of feed is simply discarded.
#[derive(Debug, Clone)]
pub struct SpiDecoder {
    framing: Framing,
    phase: Phase,
    /// Most recently stored SCK level.
    sck: bool,
    /// SCK level stored before that (edge memory).
    sck_prev: bool,
    /// Most recently stored SS level.
    ss: bool,
    /// Bits accumulated into the current byte, always in `0..8`.
    bit_index: u8,
    byte_mosi: u8,
    byte_miso: u8,
    /// Timestamp of the sample that captured the current byte's first bit.
    byte_start: i64,
}

impl SpiDecoder {
    /// Create a decoder initialized to the electrically idle bus: select
    /// deasserted, clock and data lines low.
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            phase: Phase::Idle,
            sck: false,
            sck_prev: false,
            ss: true,
            bit_index: 0,
            byte_mosi: 0,
            byte_miso: 0,
            byte_start: 0,
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Restore the idle-bus initial state, keeping the framing mode.
    pub fn reset(&mut self) {
        *self = Self::new(self.framing);
    }

    /// Advance the state machine by one sample.
    pub fn step(&mut self, sample: Sample, out: &mut impl SymbolSink) {
        match self.framing {
            Framing::ClockEdge | Framing::ChipSelect => self.step_framed(sample, out),
            Framing::ChipSelectSingle => self.step_single(sample, out),
        }
    }

    /// Multi-byte engine behind `ClockEdge` and `ChipSelect` framing.
    ///
    /// Block order matters and is part of the contract: stop, then start,
    /// then bit capture, then edge-memory update. A start edge is itself a
    /// rising clock edge, so in `ClockEdge` framing it also captures the
    /// frame's first bit in the same step.
    fn step_framed(&mut self, sample: Sample, out: &mut impl SymbolSink) {
        let select_framed = self.framing == Framing::ChipSelect;

        // No new edge information on the clock line. When the select line
        // drives framing it gets tracked independently, so a select edge
        // arriving during a quiet clock is still seen.
        let sck_quiet = self.sck_prev == sample.sck && self.sck == sample.sck;
        if sck_quiet && (!select_framed || self.ss == sample.ss) {
            return;
        }

        // Stop condition; can occur at any time.
        let stop = if select_framed {
            !self.ss && sample.ss
        } else {
            self.sck_prev && !self.sck && !sample.sck
        };
        if stop {
            self.emit_event(EventKind::Stop, sample.timestamp, out);
            self.bit_index = 0;
            self.byte_mosi = 0;
            self.byte_miso = 0;
            self.phase = Phase::Idle;
        }

        // Start condition; re-arms the byte accumulator even mid-frame.
        let start = if select_framed {
            self.ss && !sample.ss
        } else {
            !self.sck_prev && !self.sck && sample.sck
        };
        if start {
            if self.phase == Phase::Idle {
                self.emit_event(EventKind::Start, sample.timestamp, out);
            }
            self.phase = Phase::Reading;
            self.bit_index = 0;
            self.byte_mosi = 0;
            self.byte_miso = 0;
        }

        // Capture one bit per rising clock edge.
        if self.phase == Phase::Reading && sample.sck && !self.sck {
            if self.bit_index == 0 {
                self.byte_start = sample.timestamp;
            }
            self.shift_in(sample.mosi, sample.miso);
            if self.bit_index == 8 {
                self.emit_bytes(self.byte_start, out);
                self.bit_index = 0;
                self.byte_mosi = 0;
                self.byte_miso = 0;
            }
        }

        self.ss = sample.ss;
        self.sck_prev = self.sck;
        self.sck = sample.sck;
    }

    /// Single-byte engine behind `ChipSelectSingle` framing.
    ///
    /// Conditions are exclusive per sample: a select edge never doubles as a
    /// capture sample. Bit capture is level-sampled, and completing the byte
    /// forces the phase back to idle so a long assertion yields exactly one
    /// byte.
    fn step_single(&mut self, sample: Sample, out: &mut impl SymbolSink) {
        // Select still deasserted; nothing to observe.
        if self.ss == sample.ss && sample.ss {
            return;
        }

        if self.ss && !sample.ss {
            if self.phase == Phase::Idle {
                self.emit_event(EventKind::Start, sample.timestamp, out);
            }
            self.phase = Phase::Reading;
            self.bit_index = 0;
            self.byte_mosi = 0;
            self.byte_miso = 0;
        } else if !self.ss && sample.ss {
            self.emit_event(EventKind::Stop, sample.timestamp, out);
            self.phase = Phase::Idle;
        } else if self.phase == Phase::Reading && sample.sck {
            self.shift_in(sample.mosi, sample.miso);
            if self.bit_index == 8 {
                // This variant stamps the byte at the completing sample.
                self.emit_bytes(sample.timestamp, out);
                self.bit_index = 0;
                self.byte_mosi = 0;
                self.byte_miso = 0;
                self.phase = Phase::Idle;
            }
        }

        self.ss = sample.ss;
        self.sck_prev = self.sck;
        self.sck = sample.sck;
    }

    /// OR one MOSI/MISO bit pair into the accumulators, MSB first.
    fn shift_in(&mut self, mosi: bool, miso: bool) {
        self.byte_mosi |= u8::from(mosi) << (7 - self.bit_index);
        self.byte_miso |= u8::from(miso) << (7 - self.bit_index);
        self.bit_index += 1;
        trace!(bit = self.bit_index, mosi, miso, "captured bit");
    }

    fn emit_event(&self, kind: EventKind, timestamp: i64, out: &mut impl SymbolSink) {
        debug!(timestamp, "{}", kind.as_str());
        out.push_event(EventSymbol { kind, timestamp });
    }

    /// Emit the completed byte pair, MOSI first, both at the same timestamp.
    fn emit_bytes(&self, timestamp: i64, out: &mut impl SymbolSink) {
        debug!(timestamp, mosi = self.byte_mosi, miso = self.byte_miso, "byte");
        out.push_byte(ByteSymbol {
            lane: Lane::Mosi,
            value: self.byte_mosi,
            timestamp,
        });
        out.push_byte(ByteSymbol {
            lane: Lane::Miso,
            value: self.byte_miso,
            timestamp,
        });
    }
}

/// Decode an entire sample feed in one pass.
///
/// Output containers are pre-sized from the feed's size hint; a feed can
/// never emit more symbols per stream than it has samples. Allocation
/// failure is reported before any symbol is written.
pub fn decode<I>(samples: I, framing: Framing) -> Result<DecodedTrace, DecodeError>
where
    I: IntoIterator<Item = Sample>,
{
    let samples = samples.into_iter();
    let (lower, upper) = samples.size_hint();
    let mut trace = DecodedTrace::with_capacity(upper.unwrap_or(lower))?;

    let mut decoder = SpiDecoder::new(framing);
    for sample in samples {
        decoder.step(sample, &mut trace);
    }
    Ok(trace)
}
