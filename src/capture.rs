//! Loading raw logic captures into the decoder's sample feed.
//!
//! The decoder itself is a pure transform; everything in this module is host
//! glue that turns a stored capture into time-ordered [`Sample`]s. Two CSV
//! layouts are supported: one column per channel (named after the bus lines,
//! as a logic analyzer exports them), or a single hex bitmap column holding
//! all channels per sample, split apart through a [`ChannelMap`].

use crate::decoder::{decode, Framing, Sample};
use crate::symbol::{DecodeError, DecodedTrace};
use polars::prelude::*;

const TIME_COLUMN_NAME: &str = "time";
const BITMAP_COLUMN_NAME: &str = "bitmap";
const SCK_COLUMN_NAME: &str = "SCK";
const SS_COLUMN_NAME: &str = "SS";
const MOSI_COLUMN_NAME: &str = "MOSI";
const MISO_COLUMN_NAME: &str = "MISO";

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to read capture data: {0}")]
    Polars(#[from] PolarsError),

    #[error("Capture is missing channel column '{name}'")]
    MissingChannel { name: String },

    #[error("Capture row {row} has no timestamp")]
    MissingTimestamp { row: usize },

    #[error("Capture timestamps go backwards at row {row}")]
    NonMonotonic { row: usize },
}

/// Which bitmap bit position carries which SPI line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMap {
    pub sck: u8,
    pub ss: u8,
    pub mosi: u8,
    pub miso: u8,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            sck: 0,
            ss: 1,
            mosi: 2,
            miso: 3,
        }
    }
}

impl ChannelMap {
    fn split(&self, bitmap: u32) -> (bool, bool, bool, bool) {
        let bit = |pos: u8| (bitmap >> pos) & 1 == 1;
        (bit(self.sck), bit(self.ss), bit(self.mosi), bit(self.miso))
    }
}

/// A validated, time-ordered capture ready for decoding.
#[derive(Debug, Clone)]
pub struct Capture {
    samples: Vec<Sample>,
    trigger_row: Option<usize>,
}

impl Capture {
    /// Parse a capture with one column per channel.
    ///
    /// Expects a header row with a `time` column and the four bus lines
    /// named `SCK`, `SS`, `MOSI` and `MISO` holding `0`/`1` levels. Null
    /// channel cells are read as low.
    pub fn from_channel_csv(data: &[u8]) -> Result<Self, CaptureError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .into_reader_with_file_handle(std::io::Cursor::new(data))
            .finish()?;

        let time = channel_column(&df, TIME_COLUMN_NAME)?;
        let sck = channel_column(&df, SCK_COLUMN_NAME)?;
        let ss = channel_column(&df, SS_COLUMN_NAME)?;
        let mosi = channel_column(&df, MOSI_COLUMN_NAME)?;
        let miso = channel_column(&df, MISO_COLUMN_NAME)?;

        let mut samples = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let timestamp = time
                .get(row)
                .ok_or(CaptureError::MissingTimestamp { row })?;
            let level = |ca: &Int64Chunked| ca.get(row).unwrap_or(0) != 0;
            samples.push(Sample {
                timestamp,
                sck: level(&sck),
                ss: level(&ss),
                mosi: level(&mosi),
                miso: level(&miso),
            });
        }

        log::debug!("Loaded {} samples from channel CSV", samples.len());
        Self::from_samples(samples)
    }

    /// Parse a capture with a hex bitmap column.
    ///
    /// Expects a header row with a `time` column and a `bitmap` column of
    /// hex strings (`0x` prefix optional) holding all channel levels per
    /// sample; `map` names the bit position of each bus line. Unparseable
    /// or null bitmaps are read as all lines low.
    pub fn from_bitmap_csv(data: &[u8], map: ChannelMap) -> Result<Self, CaptureError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .into_reader_with_file_handle(std::io::Cursor::new(data))
            .finish()?;

        let time = channel_column(&df, TIME_COLUMN_NAME)?;
        let bitmap_column = df
            .column(BITMAP_COLUMN_NAME)
            .map_err(|_| CaptureError::MissingChannel {
                name: BITMAP_COLUMN_NAME.to_string(),
            })?;
        let bitmap_strings = bitmap_column.str()?;

        let mut samples = Vec::with_capacity(df.height());
        for (row, bitmap_opt) in bitmap_strings.into_iter().enumerate() {
            let timestamp = time
                .get(row)
                .ok_or(CaptureError::MissingTimestamp { row })?;
            let bitmap_val = bitmap_opt
                .and_then(|s| u32::from_str_radix(s.trim_start_matches("0x"), 16).ok())
                .unwrap_or(0);
            let (sck, ss, mosi, miso) = map.split(bitmap_val);
            samples.push(Sample {
                timestamp,
                sck,
                ss,
                mosi,
                miso,
            });
        }

        log::debug!("Loaded {} samples from bitmap CSV", samples.len());
        Self::from_samples(samples)
    }

    /// Wrap pre-built samples, validating timestamp order and locating the
    /// trigger row (the first sample after time zero).
    pub fn from_samples(samples: Vec<Sample>) -> Result<Self, CaptureError> {
        for (row, pair) in samples.windows(2).enumerate() {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(CaptureError::NonMonotonic { row: row + 1 });
            }
        }
        let trigger_row = samples.iter().position(|s| s.timestamp > 0);
        Ok(Self {
            samples,
            trigger_row,
        })
    }

    /// Index of the first sample with a positive timestamp, if any.
    ///
    /// Informational only; the decoder treats pre- and post-trigger samples
    /// alike.
    pub fn trigger_row(&self) -> Option<usize> {
        self.trigger_row
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The time-ordered sample feed.
    pub fn samples(&self) -> impl ExactSizeIterator<Item = Sample> + '_ {
        self.samples.iter().copied()
    }

    /// Run one decode pass over the capture.
    pub fn decode(&self, framing: Framing) -> Result<DecodedTrace, DecodeError> {
        decode(self.samples(), framing)
    }
}

fn channel_column(df: &DataFrame, name: &str) -> Result<Int64Chunked, CaptureError> {
    let column = df.column(name).map_err(|_| CaptureError::MissingChannel {
        name: name.to_string(),
    })?;
    Ok(column.cast(&DataType::Int64)?.i64()?.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::EventKind;

    #[test]
    fn test_channel_csv_round_trip() {
        let csv = b"time,SCK,SS,MOSI,MISO\n-10,0,1,0,0\n0,0,0,0,0\n10,1,0,1,0\n";
        let capture = Capture::from_channel_csv(csv).unwrap();

        assert_eq!(capture.len(), 3);
        let samples: Vec<Sample> = capture.samples().collect();
        assert_eq!(samples[0].timestamp, -10);
        assert!(samples[0].ss);
        assert!(!samples[0].sck);
        assert!(samples[2].sck);
        assert!(samples[2].mosi);
        assert_eq!(capture.trigger_row(), Some(2));
    }

    #[test]
    fn test_bitmap_csv_split() {
        // Default map: bit0 SCK, bit1 SS, bit2 MOSI, bit3 MISO.
        let csv = b"time,bitmap\n0,0x02\n1,0x05\n2,0x0D\n";
        let capture = Capture::from_bitmap_csv(csv, ChannelMap::default()).unwrap();

        let samples: Vec<Sample> = capture.samples().collect();
        assert!(samples[0].ss && !samples[0].sck);
        assert!(samples[1].sck && samples[1].mosi && !samples[1].ss);
        assert!(samples[2].sck && samples[2].mosi && samples[2].miso);
    }

    #[test]
    fn test_bitmap_without_prefix_and_garbage() {
        let csv = b"time,bitmap\n0,03\n1,zz\n";
        let capture = Capture::from_bitmap_csv(csv, ChannelMap::default()).unwrap();

        let samples: Vec<Sample> = capture.samples().collect();
        assert!(samples[0].sck && samples[0].ss);
        // Unparseable bitmaps read as all-low.
        assert!(!samples[1].sck && !samples[1].ss);
    }

    #[test]
    fn test_missing_channel_column() {
        let csv = b"time,SCK,SS,MOSI\n0,0,1,0\n";
        let err = Capture::from_channel_csv(csv).unwrap_err();
        assert!(matches!(err, CaptureError::MissingChannel { ref name } if name == "MISO"));
    }

    #[test]
    fn test_non_monotonic_timestamps_rejected() {
        let csv = b"time,SCK,SS,MOSI,MISO\n0,0,1,0,0\n5,0,1,0,0\n3,0,1,0,0\n";
        let err = Capture::from_channel_csv(csv).unwrap_err();
        assert!(matches!(err, CaptureError::NonMonotonic { row: 2 }));
    }

    #[test]
    fn test_no_trigger_row_before_time_zero() {
        let csv = b"time,SCK,SS,MOSI,MISO\n-3,0,1,0,0\n-1,0,1,0,0\n";
        let capture = Capture::from_channel_csv(csv).unwrap();
        assert_eq!(capture.trigger_row(), None);
    }

    #[test]
    fn test_decode_from_capture() {
        // One 0xC3 byte, clock-framed.
        let byte = 0xC3u8;
        let mut csv = String::from("time,SCK,SS,MOSI,MISO\n0,0,1,0,0\n");
        let mut t = 1;
        for bit in 0..8 {
            let mosi = (byte >> (7 - bit)) & 1;
            csv.push_str(&format!("{t},1,0,{mosi},0\n"));
            csv.push_str(&format!("{},0,0,{mosi},0\n", t + 1));
            t += 2;
        }
        csv.push_str(&format!("{t},0,1,0,0\n"));
        csv.push_str(&format!("{},0,1,0,0\n", t + 1));

        let capture = Capture::from_channel_csv(csv.as_bytes()).unwrap();
        let trace = capture.decode(Framing::ClockEdge).unwrap();

        assert_eq!(trace.events[0].kind, EventKind::Start);
        assert_eq!(trace.bytes[0].value, byte);
        assert_eq!(trace.events[1].kind, EventKind::Stop);
    }
}
