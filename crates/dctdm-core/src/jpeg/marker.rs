//! JPEG marker definitions (ITU T.81 Table B.1).
//!
//! Adapted from [jpeg-decoder](https://github.com/image-rs/jpeg-decoder)'s
//! marker table, trimmed to the markers this crate's decoder dispatches on.

/// A JPEG marker, decoded from the byte following a run of `0xFF`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Marker {
    /// Start of Frame; the parameter is the SOF type (0 = baseline).
    SOF(u8),
    /// Define Huffman Table.
    DHT,
    /// Restart marker 0-7.
    RST(u8),
    /// Start of Image.
    SOI,
    /// End of Image.
    EOI,
    /// Start of Scan.
    SOS,
    /// Define Quantization Table.
    DQT,
    /// Define Restart Interval.
    DRI,
    /// Application segment 0-15.
    APP(u8),
    /// Comment.
    COM,
    /// Anything else: reserved, extension, or arithmetic-coding markers.
    Other(u8),
}

impl Marker {
    /// Whether this marker is followed by a 2-byte big-endian length field.
    pub fn has_length(self) -> bool {
        !matches!(self, Marker::RST(..) | Marker::SOI | Marker::EOI)
    }

    /// Decode a marker byte (the byte following one or more `0xFF` fill bytes).
    ///
    /// Returns `None` for `0x00` (a stuffed byte) and `0xFF` (a fill byte);
    /// callers consuming a scan's entropy-coded data must special-case those
    /// before calling this.
    pub fn from_u8(n: u8) -> Option<Marker> {
        use Marker::*;
        match n {
            0x00 | 0xFF => None,
            0xC0 => Some(SOF(0)),
            0xC1..=0xCF if n != 0xC4 && n != 0xC8 && n != 0xCC => {
                Some(SOF(n - 0xC0))
            }
            0xC4 => Some(DHT),
            0xD0..=0xD7 => Some(RST(n - 0xD0)),
            0xD8 => Some(SOI),
            0xD9 => Some(EOI),
            0xDA => Some(SOS),
            0xDB => Some(DQT),
            0xDD => Some(DRI),
            0xE0..=0xEF => Some(APP(n - 0xE0)),
            0xFE => Some(COM),
            other => Some(Other(other)),
        }
    }

    /// Encode a marker back to its trailing byte.
    pub fn to_u8(self) -> u8 {
        use Marker::*;
        match self {
            SOF(0) => 0xC0,
            SOF(n) => 0xC0 + n,
            DHT => 0xC4,
            RST(n) => 0xD0 + n,
            SOI => 0xD8,
            EOI => 0xD9,
            SOS => 0xDA,
            DQT => 0xDB,
            DRI => 0xDD,
            APP(n) => 0xE0 + n,
            COM => 0xFE,
            Other(n) => n,
        }
    }

    /// True for SOF markers that aren't baseline DCT (SOF0).
    pub fn is_unsupported_sof(self) -> bool {
        matches!(self, Marker::SOF(n) if n != 0)
    }
}
