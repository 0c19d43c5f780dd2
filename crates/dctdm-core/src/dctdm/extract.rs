//! §4.J: walk the same coefficient pairs [`super::embed`] wrote and recover
//! the framed payload bytes.

use crate::error::{DctdmError, Result};
use crate::jpeg::parser::QuantizationTable;
use crate::rounding::round_half_away_from_zero;
use crate::store::{Block, CoefficientStore};

/// Sanity bound on the decoded length prefix (spec.md §4.J).
const MAX_PAYLOAD_CHARS: usize = 10_000;

/// Recover the length-prefixed payload bytes modulated into `store`'s Y
/// channel with step `delta`.
pub fn extract(store: &CoefficientStore, delta: i32) -> Result<Vec<u8>> {
    let y_component = store.frame.components[0];
    let quant = store.quant_tables[y_component.quant_table_id as usize]
        .clone()
        .ok_or_else(|| {
            DctdmError::MalformedStream("no quantization table for the Y component".to_string())
        })?;

    let mut bits: Vec<u8> = Vec::new();
    let mut required_bits: Option<usize> = None;

    'outer: for mcu in &store.mcus {
        for row in 1..8usize {
            for col in (0..8usize).step_by(2) {
                if let Some(required) = required_bits {
                    if bits.len() >= required {
                        break 'outer;
                    }
                }

                let (b1, b2) = decode_pair(&mcu.y, row, col, &quant, delta);
                bits.push(b1);
                bits.push(b2);

                if required_bits.is_none() && bits.len() >= 16 {
                    let length = bits_to_u16(&bits[0..16]);
                    log::debug!("decoded payload length prefix: {length} chars");
                    if length == 0 || length as usize > MAX_PAYLOAD_CHARS {
                        return Err(DctdmError::InvalidPayloadLength(length as usize));
                    }
                    required_bits = Some(16 + length as usize * 8);
                }
            }
        }
    }

    let required = required_bits.ok_or(DctdmError::Truncated {
        expected: 16,
        found: bits.len(),
    })?;
    if bits.len() < required {
        return Err(DctdmError::Truncated {
            expected: required,
            found: bits.len(),
        });
    }

    Ok(bits_to_bytes(&bits[16..required]))
}

fn decode_pair(
    block: &Block,
    row: usize,
    col: usize,
    quant: &QuantizationTable,
    delta: i32,
) -> (u8, u8) {
    let q_a = quant.natural(row, col) as i32;
    let q_b = quant.natural(row, col + 1) as i32;
    let q1 = round_half_away_from_zero(block[row][col] as f64 / q_a as f64);
    let q2 = round_half_away_from_zero(block[row][col + 1] as f64 / q_b as f64);

    let d = q1 - q2;
    let abs_d = d.unsigned_abs() as f64;
    let delta_f = delta as f64;
    let k = (abs_d / delta_f).floor();
    let boundary = k * delta_f + delta_f / 2.0;

    let bits = match (d >= 0, abs_d >= boundary) {
        (true, false) => (0, 0),
        (true, true) => (0, 1),
        (false, true) => (1, 0),
        (false, false) => (1, 1),
    };
    log::trace!("pair ({row},{col}): D={d}, boundary={boundary:.2} -> {bits:?}");
    bits
}

fn bits_to_u16(bits: &[u8]) -> u16 {
    bits.iter().fold(0u16, |acc, &b| (acc << 1) | b as u16)
}

fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b))
        .collect()
}
