//! Scan decoding: DC (differential) + AC (run/size) + dequantize, landing
//! coefficients at their natural `[row][col]` position.

use crate::error::{DctdmError, Result};
use crate::jpeg::bitio::BitReader;
use crate::jpeg::huffman::{extend, EOB, ZRL};
use crate::jpeg::parser::{ParsedJpeg, ZIGZAG};
use crate::store::{CoefficientStore, DecodedHuffmanTable, McuBlock};
use std::rc::Rc;

/// Decode the entropy-coded scan into a [`CoefficientStore`], building the
/// Huffman trees and encode tables from the raw DHT contents along the way.
pub fn decode_scan(parsed: &ParsedJpeg) -> Result<CoefficientStore> {
    let mut quant_tables: [Option<Rc<crate::jpeg::parser::QuantizationTable>>; 4] =
        Default::default();
    for (slot, table) in quant_tables.iter_mut().zip(parsed.quant_tables.iter()) {
        *slot = table.clone().map(Rc::new);
    }

    let mut dc_huffman: [Option<DecodedHuffmanTable>; 4] = Default::default();
    let mut ac_huffman: [Option<DecodedHuffmanTable>; 4] = Default::default();
    for (slot, spec) in dc_huffman.iter_mut().zip(parsed.dc_huffman.iter()) {
        if let Some(spec) = spec {
            *slot = Some(DecodedHuffmanTable::build(&spec.bits, &spec.symbols)?);
        }
    }
    for (slot, spec) in ac_huffman.iter_mut().zip(parsed.ac_huffman.iter()) {
        if let Some(spec) = spec {
            *slot = Some(DecodedHuffmanTable::build(&spec.bits, &spec.symbols)?);
        }
    }

    let mcus_wide = parsed.frame.mcus_wide();
    let mcus_high = parsed.frame.mcus_high();
    let mut mcus = Vec::with_capacity(mcus_wide * mcus_high);

    let mut reader = BitReader::new(&parsed.scan_data);
    let mut dc_pred = [0i32; 3];

    for _ in 0..(mcus_wide * mcus_high) {
        let mut mcu = McuBlock::zeroed();
        for (ci, component) in parsed.frame.components.iter().enumerate() {
            let quant = quant_tables[component.quant_table_id as usize]
                .as_deref()
                .ok_or_else(|| {
                    DctdmError::MalformedStream(
                        "SOF0 references a quantization table with no DQT".to_string(),
                    )
                })?;
            let dc_table = dc_huffman[component.dc_table_id as usize]
                .as_ref()
                .ok_or_else(|| {
                    DctdmError::MalformedStream(
                        "SOS references a DC Huffman table with no DHT".to_string(),
                    )
                })?;
            let ac_table = ac_huffman[component.ac_table_id as usize]
                .as_ref()
                .ok_or_else(|| {
                    DctdmError::MalformedStream(
                        "SOS references an AC Huffman table with no DHT".to_string(),
                    )
                })?;

            let block = decode_block(&mut reader, dc_table, ac_table, quant, &mut dc_pred[ci])?;
            match ci {
                0 => mcu.y = block,
                1 => mcu.cb = block,
                2 => mcu.cr = block,
                _ => unreachable!("a frame always has exactly 3 components"),
            }
        }
        mcus.push(mcu);
    }

    Ok(CoefficientStore {
        frame: parsed.frame.clone(),
        quant_tables,
        dc_huffman,
        ac_huffman,
        mcus,
    })
}

pub(crate) fn decode_block(
    reader: &mut BitReader,
    dc_table: &DecodedHuffmanTable,
    ac_table: &DecodedHuffmanTable,
    quant: &crate::jpeg::parser::QuantizationTable,
    dc_pred: &mut i32,
) -> Result<crate::store::Block> {
    let mut block = [[0i32; 8]; 8];

    let s = dc_table.tree.decode(reader)?;
    if s > 11 {
        return Err(DctdmError::MalformedStream(format!(
            "DC coefficient size category {s} out of range"
        )));
    }
    let r = if s > 0 { reader.read_bits(s)? } else { 0 };
    let diff = extend(r, s);
    *dc_pred += diff;
    block[0][0] = *dc_pred * quant.natural(0, 0) as i32;

    let mut k = 1usize;
    while k < 64 {
        let rs = ac_table.tree.decode(reader)?;
        if rs == EOB {
            break;
        }
        if rs == ZRL {
            k += 16;
            continue;
        }
        let run = (rs >> 4) as usize;
        let s = rs & 0x0F;
        if s > 11 {
            return Err(DctdmError::MalformedStream(format!(
                "AC coefficient size category {s} out of range"
            )));
        }
        k += run;
        if k >= 64 {
            return Err(DctdmError::MalformedStream(
                "AC run advanced past the end of the block".to_string(),
            ));
        }
        let r = reader.read_bits(s)?;
        let v = extend(r, s);
        let natural = ZIGZAG[k];
        let (row, col) = (natural / 8, natural % 8);
        block[row][col] = v * quant.natural(row, col) as i32;
        k += 1;
    }

    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::bitio::BitWriter;
    use crate::jpeg::huffman::{magnitude_category, un_extend};

    fn single_symbol_table(symbol: u8) -> ([u8; 16], Vec<u8>) {
        let mut bits = [0u8; 16];
        bits[0] = 1;
        (bits, vec![symbol])
    }

    #[test]
    fn decode_block_reads_dc_and_single_ac_coefficient() {
        // DC table: one 1-bit code for symbol 4 (size category 4).
        let (dc_bits, dc_symbols) = single_symbol_table(4);
        let dc_table = DecodedHuffmanTable::build(&dc_bits, &dc_symbols).unwrap();

        // AC table: one 1-bit code for EOB.
        let (ac_bits, ac_symbols) = single_symbol_table(EOB);
        let ac_table = DecodedHuffmanTable::build(&ac_bits, &ac_symbols).unwrap();

        let mut writer = BitWriter::new();
        dc_table.encode_table.write_symbol(&mut writer, 4).unwrap();
        let diff = 9i32;
        let s = magnitude_category(diff);
        assert_eq!(s, 4);
        writer.write_bits(un_extend(diff, s), s);
        ac_table.encode_table.write_symbol(&mut writer, EOB).unwrap();
        let bytes = writer.finish();

        let mut quant_values = [1u16; 64];
        quant_values[0] = 2;
        let quant = crate::jpeg::parser::QuantizationTable {
            id: 0,
            values: quant_values,
        };

        let mut reader = BitReader::new(&bytes);
        let mut dc_pred = 0i32;
        let block = decode_block(&mut reader, &dc_table, &ac_table, &quant, &mut dc_pred).unwrap();

        assert_eq!(dc_pred, 9);
        assert_eq!(block[0][0], 18);
        for row in 0..8 {
            for col in 0..8 {
                if (row, col) != (0, 0) {
                    assert_eq!(block[row][col], 0);
                }
            }
        }
    }
}
