//! JPEG marker-stream parsing: DQT, DHT, SOF0, SOS header, and the
//! entropy-coded scan bytes that follow SOS.
//!
//! Adapted from `stegano-f5::jpeg::parser`, with two deliberate
//! departures: quantization tables are stored in natural (row-major)
//! order internally (the zigzag permutation is applied once, here, on
//! read), and the scan bytes handed back have byte-stuffing already
//! undone so [`crate::jpeg::bitio::BitReader`] can consume them directly.

use crate::error::{DctdmError, Result};
use crate::jpeg::marker::Marker;

/// `ZIGZAG[i]` is the natural (row-major, `row*8+col`) index that the
/// `i`-th zigzag position maps to.
#[rustfmt::skip]
pub const ZIGZAG: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Inverse of [`ZIGZAG`]: `NATURAL_TO_ZIGZAG[row*8+col]` is the zigzag
/// position of that natural index.
pub const NATURAL_TO_ZIGZAG: [usize; 64] = {
    let mut table = [0usize; 64];
    let mut i = 0;
    while i < 64 {
        table[ZIGZAG[i]] = i;
        i += 1;
    }
    table
};

/// A quantization table, stored in natural order: `values[row*8+col]`.
#[derive(Clone, Debug)]
pub struct QuantizationTable {
    pub id: u8,
    pub values: [u16; 64],
}

impl QuantizationTable {
    #[inline]
    pub fn natural(&self, row: usize, col: usize) -> u16 {
        self.values[row * 8 + col]
    }

    /// Re-zigzag for wire emission (§6: DQT is serialized in zigzag order).
    pub fn to_zigzag_bytes(&self) -> [u16; 64] {
        let mut out = [0u16; 64];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.values[ZIGZAG[i]];
        }
        out
    }

    fn from_zigzag(id: u8, zigzag_values: &[u16; 64]) -> Self {
        let mut values = [0u16; 64];
        for (i, &v) in zigzag_values.iter().enumerate() {
            values[ZIGZAG[i]] = v;
        }
        QuantizationTable { id, values }
    }
}

/// Raw DHT contents: the 16-length BITS table plus the canonical symbol
/// list, unprocessed. [`crate::jpeg::huffman::HuffmanTree`] is built from
/// this once parsing completes.
#[derive(Clone, Debug)]
pub struct HuffmanTableSpec {
    pub class: u8,
    pub id: u8,
    pub bits: [u8; 16],
    pub symbols: Vec<u8>,
}

#[derive(Clone, Copy, Debug)]
pub struct Component {
    pub id: u8,
    pub quant_table_id: u8,
    pub dc_table_id: u8,
    pub ac_table_id: u8,
}

#[derive(Clone, Debug)]
pub struct FrameInfo {
    pub width: u16,
    pub height: u16,
    /// Always `[Y, Cb, Cr]` in stream order; enforced by the SOF0 parser.
    pub components: [Component; 3],
}

impl FrameInfo {
    pub fn mcus_wide(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    pub fn mcus_high(&self) -> usize {
        (self.height as usize).div_ceil(8)
    }
}

/// Everything the scan decoder needs, gathered from the marker stream up
/// to and including the SOS header.
#[derive(Clone, Debug)]
pub struct ParsedJpeg {
    pub quant_tables: [Option<QuantizationTable>; 4],
    pub dc_huffman: [Option<HuffmanTableSpec>; 4],
    pub ac_huffman: [Option<HuffmanTableSpec>; 4],
    pub frame: FrameInfo,
    /// Entropy-coded scan bytes with byte-stuffing already removed and the
    /// terminal marker stripped off.
    pub scan_data: Vec<u8>,
}

/// Parse a complete JPEG file, validating the baseline/4:4:4/no-restart
/// profile this crate supports.
pub fn parse_jpeg(data: &[u8]) -> Result<ParsedJpeg> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(DctdmError::MalformedStream(
            "missing SOI marker".to_string(),
        ));
    }

    let mut pos = 2usize;
    let mut quant_tables: [Option<QuantizationTable>; 4] = [None, None, None, None];
    let mut dc_huffman: [Option<HuffmanTableSpec>; 4] = [None, None, None, None];
    let mut ac_huffman: [Option<HuffmanTableSpec>; 4] = [None, None, None, None];
    let mut frame: Option<FrameInfo> = None;

    loop {
        let (marker, next_pos) = read_marker(data, pos)?;
        pos = next_pos;

        match marker {
            Marker::DQT => {
                let (segment, next) = read_segment(data, pos)?;
                parse_dqt(segment, &mut quant_tables)?;
                pos = next;
            }
            Marker::DHT => {
                let (segment, next) = read_segment(data, pos)?;
                parse_dht(segment, &mut dc_huffman, &mut ac_huffman)?;
                pos = next;
            }
            Marker::SOF(0) => {
                let (segment, next) = read_segment(data, pos)?;
                frame = Some(parse_sof0(segment)?);
                pos = next;
            }
            Marker::SOF(_) => {
                return Err(DctdmError::UnsupportedFormat(
                    "only baseline DCT (SOF0) is supported".to_string(),
                ));
            }
            Marker::DRI => {
                return Err(DctdmError::UnsupportedFormat(
                    "restart intervals are not supported".to_string(),
                ));
            }
            Marker::SOS => {
                let (header, next) = read_segment(data, pos)?;
                let frame = frame
                    .as_mut()
                    .ok_or_else(|| DctdmError::MalformedStream("SOS before SOF".to_string()))?;
                parse_sos_header(header, frame)?;

                let (scan_data, _next) = read_scan_data(data, next)?;
                let frame = frame.clone();
                return Ok(ParsedJpeg {
                    quant_tables,
                    dc_huffman,
                    ac_huffman,
                    frame,
                    scan_data,
                });
            }
            Marker::EOI => {
                return Err(DctdmError::MalformedStream(
                    "EOI encountered before SOS".to_string(),
                ));
            }
            other if other.has_length() => {
                // APPn, COM, and anything else with a length: skip.
                let (_segment, next) = read_segment(data, pos)?;
                pos = next;
            }
            _ => {
                // Markers without a length (RST, etc.) shouldn't appear here.
            }
        }
    }
}

/// Scan forward past any `0xFF` fill bytes to the next marker byte,
/// starting at `pos`. Returns the marker and the position just after it.
fn read_marker(data: &[u8], mut pos: usize) -> Result<(Marker, usize)> {
    loop {
        if pos >= data.len() {
            return Err(DctdmError::MalformedStream(
                "unexpected end of stream while looking for a marker".to_string(),
            ));
        }
        if data[pos] != 0xFF {
            return Err(DctdmError::MalformedStream(format!(
                "expected marker at offset {pos}, found 0x{:02X}",
                data[pos]
            )));
        }
        pos += 1;
        if pos >= data.len() {
            return Err(DctdmError::MalformedStream("truncated marker".to_string()));
        }
        let byte = data[pos];
        pos += 1;
        if byte == 0xFF {
            // Fill byte: keep scanning.
            pos -= 1;
            continue;
        }
        let marker = Marker::from_u8(byte).ok_or_else(|| {
            DctdmError::MalformedStream(format!("invalid marker byte 0x{byte:02X}"))
        })?;
        if marker.is_unsupported_sof() {
            return Err(DctdmError::UnsupportedFormat(
                "only baseline DCT (SOF0) is supported".to_string(),
            ));
        }
        return Ok((marker, pos));
    }
}

/// Read a length-prefixed segment body (the 2-byte length field includes
/// itself). Returns `(body, position after body)`.
fn read_segment(data: &[u8], pos: usize) -> Result<(&[u8], usize)> {
    if pos + 2 > data.len() {
        return Err(DctdmError::MalformedStream(
            "truncated segment length".to_string(),
        ));
    }
    let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
    if length < 2 {
        return Err(DctdmError::MalformedStream(
            "segment length too small".to_string(),
        ));
    }
    let body_len = length - 2;
    let body_start = pos + 2;
    let body_end = body_start + body_len;
    if body_end > data.len() {
        return Err(DctdmError::MalformedStream(
            "segment body runs past end of stream".to_string(),
        ));
    }
    Ok((&data[body_start..body_end], body_end))
}

fn parse_dqt(segment: &[u8], tables: &mut [Option<QuantizationTable>; 4]) -> Result<()> {
    let mut pos = 0usize;
    while pos < segment.len() {
        let pq_tq = segment[pos];
        let precision = pq_tq >> 4;
        let id = pq_tq & 0x0F;
        pos += 1;
        if precision != 0 {
            return Err(DctdmError::UnsupportedFormat(
                "only 8-bit quantization table precision is supported".to_string(),
            ));
        }
        if id > 3 {
            return Err(DctdmError::MalformedStream(format!(
                "invalid quantization table id {id}"
            )));
        }
        if pos + 64 > segment.len() {
            return Err(DctdmError::MalformedStream(
                "DQT segment too short".to_string(),
            ));
        }
        let mut zigzag_values = [0u16; 64];
        for (i, slot) in zigzag_values.iter_mut().enumerate() {
            *slot = segment[pos + i] as u16;
        }
        pos += 64;
        tables[id as usize] = Some(QuantizationTable::from_zigzag(id, &zigzag_values));
    }
    Ok(())
}

fn parse_dht(
    segment: &[u8],
    dc_tables: &mut [Option<HuffmanTableSpec>; 4],
    ac_tables: &mut [Option<HuffmanTableSpec>; 4],
) -> Result<()> {
    let mut pos = 0usize;
    while pos < segment.len() {
        let tc_th = segment[pos];
        let class = tc_th >> 4;
        let id = tc_th & 0x0F;
        pos += 1;
        if class > 1 || id > 3 {
            return Err(DctdmError::MalformedStream(format!(
                "invalid Huffman table class={class} id={id}"
            )));
        }
        if pos + 16 > segment.len() {
            return Err(DctdmError::MalformedStream(
                "DHT segment too short for BITS table".to_string(),
            ));
        }
        let mut bits = [0u8; 16];
        bits.copy_from_slice(&segment[pos..pos + 16]);
        pos += 16;

        let total: usize = bits.iter().map(|&n| n as usize).sum();
        if pos + total > segment.len() {
            return Err(DctdmError::MalformedStream(
                "DHT segment too short for symbol list".to_string(),
            ));
        }
        let symbols = segment[pos..pos + total].to_vec();
        pos += total;

        let spec = HuffmanTableSpec {
            class,
            id,
            bits,
            symbols,
        };
        if class == 0 {
            dc_tables[id as usize] = Some(spec);
        } else {
            ac_tables[id as usize] = Some(spec);
        }
    }
    Ok(())
}

fn parse_sof0(segment: &[u8]) -> Result<FrameInfo> {
    if segment.len() < 6 {
        return Err(DctdmError::MalformedStream(
            "SOF0 segment too short".to_string(),
        ));
    }
    let precision = segment[0];
    if precision != 8 {
        return Err(DctdmError::UnsupportedFormat(format!(
            "unsupported sample precision {precision}"
        )));
    }
    let height = u16::from_be_bytes([segment[1], segment[2]]);
    let width = u16::from_be_bytes([segment[3], segment[4]]);
    let num_components = segment[5] as usize;
    if num_components != 3 {
        return Err(DctdmError::UnsupportedFormat(format!(
            "expected 3 components (Y, Cb, Cr), found {num_components}"
        )));
    }
    if segment.len() < 6 + num_components * 3 {
        return Err(DctdmError::MalformedStream(
            "SOF0 segment too short for components".to_string(),
        ));
    }

    let mut components = [Component {
        id: 0,
        quant_table_id: 0,
        dc_table_id: 0,
        ac_table_id: 0,
    }; 3];
    for i in 0..3 {
        let offset = 6 + i * 3;
        let id = segment[offset];
        let sampling = segment[offset + 1];
        if sampling != 0x11 {
            return Err(DctdmError::UnsupportedFormat(
                "only 4:4:4 sampling (1x1 per component) is supported".to_string(),
            ));
        }
        components[i] = Component {
            id,
            quant_table_id: segment[offset + 2],
            dc_table_id: 0,
            ac_table_id: 0,
        };
    }

    Ok(FrameInfo {
        width,
        height,
        components,
    })
}

fn parse_sos_header(segment: &[u8], frame: &mut FrameInfo) -> Result<()> {
    if segment.is_empty() {
        return Err(DctdmError::MalformedStream("empty SOS header".to_string()));
    }
    let num_components = segment[0] as usize;
    if num_components != 3 {
        return Err(DctdmError::UnsupportedFormat(format!(
            "expected a 3-component scan, found {num_components}"
        )));
    }
    if segment.len() < 1 + num_components * 2 + 3 {
        return Err(DctdmError::MalformedStream(
            "SOS header too short".to_string(),
        ));
    }
    for i in 0..num_components {
        let offset = 1 + i * 2;
        let component_id = segment[offset];
        let table_ids = segment[offset + 1];
        let component = frame
            .components
            .iter_mut()
            .find(|c| c.id == component_id)
            .ok_or_else(|| {
                DctdmError::MalformedStream(format!(
                    "SOS references unknown component id {component_id}"
                ))
            })?;
        component.dc_table_id = table_ids >> 4;
        component.ac_table_id = table_ids & 0x0F;
    }
    Ok(())
}

/// Read entropy-coded scan bytes starting at `pos`, undoing byte-stuffing
/// as we go, and stop at the first real marker (any `0xFF xx` with
/// `xx != 0x00`). Restart markers are rejected: this crate's supported
/// profile has no restart interval.
fn read_scan_data(data: &[u8], mut pos: usize) -> Result<(Vec<u8>, usize)> {
    let mut out = Vec::new();
    loop {
        if pos >= data.len() {
            return Err(DctdmError::MalformedStream(
                "scan data runs past end of stream without EOI".to_string(),
            ));
        }
        let byte = data[pos];
        pos += 1;
        if byte != 0xFF {
            out.push(byte);
            continue;
        }
        if pos >= data.len() {
            return Err(DctdmError::MalformedStream(
                "truncated marker in scan data".to_string(),
            ));
        }
        let next = data[pos];
        match next {
            0x00 => {
                out.push(0xFF);
                pos += 1;
            }
            0xFF => {
                // Fill byte, loop again without consuming the stuffed 0xFF.
                out.push(0xFF);
            }
            0xD0..=0xD7 => {
                return Err(DctdmError::UnsupportedFormat(
                    "restart markers are not supported".to_string(),
                ));
            }
            _ => {
                pos += 1;
                let marker = Marker::from_u8(next).ok_or_else(|| {
                    DctdmError::MalformedStream(format!("invalid marker byte 0x{next:02X}"))
                })?;
                if marker != Marker::EOI {
                    return Err(DctdmError::MalformedStream(
                        "unexpected marker before EOI".to_string(),
                    ));
                }
                return Ok((out, pos));
            }
        }
    }
}
