//! §4.I: pack a payload into length-prefixed bits and modulate them into
//! adjacent AC coefficient-pair differences in the Y channel.

use crate::dctdm::available_pair_bits;
use crate::error::{DctdmError, Result};
use crate::jpeg::parser::QuantizationTable;
use crate::rounding::round_half_away_from_zero;
use crate::store::{Block, CoefficientStore};

/// Modulate `payload` (already framed as raw 8-bit code units, e.g. a
/// base64 string's bytes when encryption is in play) into `store`'s Y
/// channel, using step `delta`.
pub fn embed(store: &mut CoefficientStore, payload: &[u8], delta: i32) -> Result<()> {
    if payload.len() > u16::MAX as usize {
        return Err(DctdmError::InvalidPayloadLength(payload.len()));
    }

    let bits = frame_bits(payload);
    let available = available_pair_bits(store.mcus.len());
    if bits.len() > available {
        return Err(DctdmError::CapacityExceeded {
            required: bits.len().div_ceil(2),
            available: available / 2,
        });
    }

    let y_component = store.frame.components[0];
    let quant = store.quant_tables[y_component.quant_table_id as usize]
        .clone()
        .ok_or_else(|| {
            DctdmError::MalformedStream("no quantization table for the Y component".to_string())
        })?;

    let mut bit_iter = bits.into_iter();
    'outer: for mcu in store.mcus.iter_mut() {
        for row in 1..8usize {
            for col in (0..8usize).step_by(2) {
                let b1 = match bit_iter.next() {
                    Some(b) => b,
                    None => break 'outer,
                };
                let b2 = bit_iter
                    .next()
                    .expect("payload bit count is always even (16 + 8*L)");
                modulate_pair(&mut mcu.y, row, col, &quant, delta, b1, b2);
            }
        }
    }

    Ok(())
}

/// `u16` length prefix followed by one bit per payload bit, MSB-first.
fn frame_bits(payload: &[u8]) -> Vec<u8> {
    let length = payload.len() as u16;
    let mut bits = Vec::with_capacity(16 + payload.len() * 8);
    for i in (0..16).rev() {
        bits.push(((length >> i) & 1) as u8);
    }
    for &byte in payload {
        for i in (0..8).rev() {
            bits.push((byte >> i) & 1);
        }
    }
    bits
}

fn modulate_pair(
    block: &mut Block,
    row: usize,
    col: usize,
    quant: &QuantizationTable,
    delta: i32,
    b1: u8,
    b2: u8,
) {
    let q_a = quant.natural(row, col) as i32;
    let q_b = quant.natural(row, col + 1) as i32;
    let q1 = round_half_away_from_zero(block[row][col] as f64 / q_a as f64);
    let q2 = round_half_away_from_zero(block[row][col + 1] as f64 / q_b as f64);

    let d = q1 - q2;
    let abs_d = d.unsigned_abs() as f64;
    let delta_f = delta as f64;
    let k = (abs_d / delta_f).floor();
    let eps1 = k * delta_f + delta_f / 4.0;
    let eps2 = k * delta_f + delta_f * 3.0 / 4.0;

    let d_prime = match (b1, b2) {
        (0, 0) => eps1,
        (0, 1) => eps2,
        (1, 0) => -eps2,
        (1, 1) => -eps1,
        _ => unreachable!("bits are always 0 or 1"),
    };

    let mu = (q1 + q2) as f64 / 2.0;
    let q1_prime = round_half_away_from_zero(mu + d_prime / 2.0);
    let q2_prime = round_half_away_from_zero(mu - d_prime / 2.0);

    block[row][col] = q1_prime * q_a;
    block[row][col + 1] = q2_prime * q_b;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_bits_encodes_length_then_bytes_msb_first() {
        let bits = frame_bits(&[0b1010_0101]);
        assert_eq!(bits.len(), 16 + 8);
        // length = 1
        assert_eq!(&bits[0..16], &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(&bits[16..24], &[1, 0, 1, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn modulate_pair_preserves_mean_within_rounding() {
        let quant = QuantizationTable {
            id: 0,
            values: [1u16; 64],
        };
        let mut block = [[0i32; 8]; 8];
        block[1][0] = 20;
        block[1][1] = 8;
        let before_mean = (20 + 8) as f64 / 2.0;
        modulate_pair(&mut block, 1, 0, &quant, 6, 1, 0);
        let after_mean = (block[1][0] + block[1][1]) as f64 / 2.0;
        assert!((before_mean - after_mean).abs() <= 1.0);
    }
}
