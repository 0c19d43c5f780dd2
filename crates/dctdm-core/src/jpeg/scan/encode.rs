//! Scan encoding: the inverse of [`super::decode`]. Re-quantizes each
//! dequantized block, zigzag-linearizes it, and emits DC diff + run/size
//! AC + EOB/ZRL using the store's Huffman encode tables.

use crate::error::{DctdmError, Result};
use crate::jpeg::bitio::BitWriter;
use crate::jpeg::huffman::{magnitude_category, un_extend, EOB, ZRL};
use crate::jpeg::parser::ZIGZAG;
use crate::rounding::round_half_away_from_zero;
use crate::store::{Block, CoefficientStore, DecodedHuffmanTable};

/// Encode every MCU in `store` into entropy-coded scan bytes, ready for
/// [`crate::jpeg::writer`] to wrap in JPEG framing.
pub fn encode_scan(store: &CoefficientStore) -> Result<Vec<u8>> {
    let mut writer = BitWriter::new();
    let mut dc_pred = [0i32; 3];

    for mcu in &store.mcus {
        for (ci, component) in store.frame.components.iter().enumerate() {
            let quant = store.quant_table_for(component);
            let dc_table = store.dc_huffman[component.dc_table_id as usize]
                .as_ref()
                .ok_or_else(|| {
                    DctdmError::MalformedStream(
                        "no DC Huffman table available for encoding".to_string(),
                    )
                })?;
            let ac_table = store.ac_huffman[component.ac_table_id as usize]
                .as_ref()
                .ok_or_else(|| {
                    DctdmError::MalformedStream(
                        "no AC Huffman table available for encoding".to_string(),
                    )
                })?;
            let block = match ci {
                0 => &mcu.y,
                1 => &mcu.cb,
                2 => &mcu.cr,
                _ => unreachable!("a frame always has exactly 3 components"),
            };
            encode_block(&mut writer, block, quant, dc_table, ac_table, &mut dc_pred[ci])?;
        }
    }

    Ok(writer.finish())
}

/// Re-quantize a dequantized natural-order block into zigzag-ordered
/// integer coefficients.
fn linearize(block: &Block, quant: &crate::jpeg::parser::QuantizationTable) -> [i32; 64] {
    let mut zz = [0i32; 64];
    for (i, slot) in zz.iter_mut().enumerate() {
        let natural = ZIGZAG[i];
        let (row, col) = (natural / 8, natural % 8);
        let q = quant.natural(row, col) as i32;
        *slot = if q == 0 {
            0
        } else {
            round_half_away_from_zero(block[row][col] as f64 / q as f64)
        };
    }
    zz
}

fn encode_block(
    writer: &mut BitWriter,
    block: &Block,
    quant: &crate::jpeg::parser::QuantizationTable,
    dc_table: &DecodedHuffmanTable,
    ac_table: &DecodedHuffmanTable,
    dc_pred: &mut i32,
) -> Result<()> {
    let zz = linearize(block, quant);

    let diff = zz[0] - *dc_pred;
    *dc_pred = zz[0];
    let s = magnitude_category(diff);
    dc_table.encode_table.write_symbol(writer, s)?;
    if s > 0 {
        writer.write_bits(un_extend(diff, s), s);
    }

    let last_nonzero = zz[1..64].iter().rposition(|&v| v != 0).map(|i| i + 1).unwrap_or(0);

    let mut run = 0u32;
    let mut k = 1usize;
    while k <= last_nonzero {
        if zz[k] == 0 {
            run += 1;
            k += 1;
            continue;
        }
        while run >= 16 {
            ac_table.encode_table.write_symbol(writer, ZRL)?;
            run -= 16;
        }
        let s = magnitude_category(zz[k]);
        let rs = ((run as u8) << 4) | s;
        ac_table.encode_table.write_symbol(writer, rs)?;
        writer.write_bits(un_extend(zz[k], s), s);
        run = 0;
        k += 1;
    }
    ac_table.encode_table.write_symbol(writer, EOB)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::bitio::BitReader;
    use crate::jpeg::scan::decode::decode_block;
    use crate::store::DecodedHuffmanTable;

    fn flat_table(bits_at_length: &[(u8, u8)]) -> ([u8; 16], Vec<u8>) {
        let mut bits = [0u8; 16];
        let mut symbols = Vec::new();
        for &(length, symbol) in bits_at_length {
            bits[(length - 1) as usize] += 1;
            symbols.push(symbol);
        }
        (bits, symbols)
    }

    #[test]
    fn encode_then_decode_block_roundtrips() {
        // DC symbols 0..=2 (sizes), AC symbols EOB/ZRL plus a couple of
        // run/size codes, all on distinct short codes so canonical
        // construction is trivial to reason about.
        let (dc_bits, dc_symbols) = flat_table(&[(1, 0), (2, 1), (2, 2)]);
        let dc_table = DecodedHuffmanTable::build(&dc_bits, &dc_symbols).unwrap();

        let (ac_bits, ac_symbols) = flat_table(&[(1, EOB), (2, 0x01), (3, ZRL)]);
        let ac_table = DecodedHuffmanTable::build(&ac_bits, &ac_symbols).unwrap();

        let mut quant_values = [1u16; 64];
        quant_values[0] = 4;
        let quant = crate::jpeg::parser::QuantizationTable {
            id: 0,
            values: quant_values,
        };

        let mut block = [[0i32; 8]; 8];
        block[0][0] = 20; // DC quantized value 5 at Q=4
        block[0][1] = 3; // AC zigzag index 1, Q=1, value 3

        let mut writer = BitWriter::new();
        let mut dc_pred = 0i32;
        encode_block(&mut writer, &block, &quant, &dc_table, &ac_table, &mut dc_pred).unwrap();
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        let mut decode_pred = 0i32;
        let decoded =
            decode_block(&mut reader, &dc_table, &ac_table, &quant, &mut decode_pred).unwrap();

        assert_eq!(decoded[0][0], 20);
        assert_eq!(decoded[0][1], 3);
        assert_eq!(decode_pred, 5);
    }
}
