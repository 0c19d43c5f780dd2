//! Baseline JPEG codec: just enough of ITU T.81 to decode a 4:4:4,
//! 8-bit-precision, restart-free baseline image into per-MCU DCT
//! coefficients, and to re-encode those coefficients back into a valid
//! file.

pub mod bitio;
pub mod huffman;
pub mod marker;
pub mod parser;
pub mod scan;
pub mod writer;

pub use marker::Marker;
pub use parser::{parse_jpeg, ParsedJpeg};
pub use scan::{decode_scan, encode_scan};
pub use writer::write_jpeg;
