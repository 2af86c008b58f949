use std::collections::TryReserveError;

/// Data line a decoded byte was captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    Mosi,
    Miso,
}

impl Lane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Mosi => "MOSI",
            Lane::Miso => "MISO",
        }
    }
}

/// Frame boundary markers emitted on the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Start,
    Stop,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "START",
            EventKind::Stop => "STOP",
        }
    }
}

/// Display classification of a symbol.
///
/// Renderers map each class to a distinct style; the decoder itself attaches
/// no palette, only this four-way distinction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolClass {
    Start,
    Stop,
    DataMosi,
    DataMiso,
}

/// A decoded 8-bit data byte on one of the two data lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSymbol {
    pub lane: Lane,
    pub value: u8,
    /// Capture time units; negative before the trigger point.
    pub timestamp: i64,
}

impl ByteSymbol {
    pub fn class(&self) -> SymbolClass {
        match self.lane {
            Lane::Mosi => SymbolClass::DataMosi,
            Lane::Miso => SymbolClass::DataMiso,
        }
    }
}

/// A frame boundary marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSymbol {
    pub kind: EventKind,
    /// Capture time units; negative before the trigger point.
    pub timestamp: i64,
}

impl EventSymbol {
    /// Label shown on the event stream, `"START"` or `"STOP"`.
    pub fn text(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn class(&self) -> SymbolClass {
        match self.kind {
            EventKind::Start => SymbolClass::Start,
            EventKind::Stop => SymbolClass::Stop,
        }
    }
}

/// Receiver for decoded symbols.
///
/// The decoder appends symbols in the order it produces them and never
/// reorders, filters or deduplicates; all framing policy lives in the state
/// machine. Implementations must treat both streams as append-only.
pub trait SymbolSink {
    /// Append a data byte to the byte stream.
    fn push_byte(&mut self, byte: ByteSymbol);

    /// Append a frame marker to the event stream.
    fn push_event(&mut self, event: EventSymbol);
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Unable to allocate decoder output memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

/// The two output streams of one decode pass.
///
/// Bytes and events advance independently; within each stream timestamps are
/// non-decreasing. Only symbols that were actually emitted are stored, so
/// there are no unused trailing slots to clean up afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodedTrace {
    pub bytes: Vec<ByteSymbol>,
    pub events: Vec<EventSymbol>,
}

impl DecodedTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size both streams for a capture of `samples` samples.
    ///
    /// A capture can never produce more symbols than it has samples, so this
    /// is an upper bound. Reservation failure is fatal to the pass before any
    /// symbol is written.
    pub fn with_capacity(samples: usize) -> Result<Self, DecodeError> {
        let mut trace = Self::new();
        trace.bytes.try_reserve(samples)?;
        trace.events.try_reserve(samples)?;
        Ok(trace)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty() && self.events.is_empty()
    }

    /// Bytes captured on a single data line, in emission order.
    pub fn bytes_on(&self, lane: Lane) -> impl Iterator<Item = &ByteSymbol> + '_ {
        self.bytes.iter().filter(move |b| b.lane == lane)
    }
}

impl SymbolSink for DecodedTrace {
    fn push_byte(&mut self, byte: ByteSymbol) {
        self.bytes.push(byte);
    }

    fn push_event(&mut self, event: EventSymbol) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_labels() {
        assert_eq!(EventKind::Start.as_str(), "START");
        assert_eq!(EventKind::Stop.as_str(), "STOP");
    }

    #[test]
    fn test_symbol_classes_are_distinct() {
        let mosi = ByteSymbol {
            lane: Lane::Mosi,
            value: 0xA5,
            timestamp: 0,
        };
        let miso = ByteSymbol {
            lane: Lane::Miso,
            value: 0xA5,
            timestamp: 0,
        };
        let start = EventSymbol {
            kind: EventKind::Start,
            timestamp: 0,
        };
        let stop = EventSymbol {
            kind: EventKind::Stop,
            timestamp: 0,
        };

        let classes = [mosi.class(), miso.class(), start.class(), stop.class()];
        for (i, a) in classes.iter().enumerate() {
            for b in classes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_trace_streams_are_append_only() {
        let mut trace = DecodedTrace::new();
        trace.push_event(EventSymbol {
            kind: EventKind::Start,
            timestamp: 1,
        });
        trace.push_byte(ByteSymbol {
            lane: Lane::Mosi,
            value: 0xFF,
            timestamp: 2,
        });
        trace.push_byte(ByteSymbol {
            lane: Lane::Miso,
            value: 0x00,
            timestamp: 2,
        });

        assert_eq!(trace.events.len(), 1);
        assert_eq!(trace.bytes.len(), 2);
        assert_eq!(trace.bytes_on(Lane::Mosi).count(), 1);
        assert_eq!(trace.bytes_on(Lane::Miso).count(), 1);
    }

    #[test]
    fn test_with_capacity_starts_empty() {
        let trace = DecodedTrace::with_capacity(1024).unwrap();
        assert!(trace.is_empty());
        assert!(trace.bytes.capacity() >= 1024);
    }
}
