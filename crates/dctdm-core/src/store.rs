//! The coefficient store: the interchange format between the scan
//! decoder, the DCTDM embed/extract pass, and the scan encoder.
//!
//! This is the only shared state the three stages pass between them, by
//! move, per MCU record.

use crate::jpeg::huffman::HuffmanTree;
use crate::jpeg::parser::{Component, FrameInfo, QuantizationTable};
use std::rc::Rc;

/// One 8x8 block of dequantized DCT coefficients, addressed `[row][col]`
/// in natural order. Cell `[row][col]` holds `q * Q[row*8+col]` where `q`
/// is the integer quantized coefficient the scan decoder produced.
pub type Block = [[i32; 8]; 8];

/// The three component blocks making up one minimum coded unit.
#[derive(Clone, Debug)]
pub struct McuBlock {
    pub y: Block,
    pub cb: Block,
    pub cr: Block,
}

impl McuBlock {
    pub fn zeroed() -> Self {
        McuBlock {
            y: [[0; 8]; 8],
            cb: [[0; 8]; 8],
            cr: [[0; 8]; 8],
        }
    }
}

/// A decoded Huffman table: its raw BITS+symbols (kept for re-emitting the
/// DHT segment verbatim) plus the tree and inverse encode table derived
/// from them.
#[derive(Clone)]
pub struct DecodedHuffmanTable {
    pub bits: [u8; 16],
    pub symbols: Vec<u8>,
    pub tree: Rc<HuffmanTree>,
    pub encode_table: Rc<crate::jpeg::huffman::HuffmanEncodeTable>,
}

impl DecodedHuffmanTable {
    pub fn build(bits: &[u8; 16], symbols: &[u8]) -> crate::error::Result<Self> {
        let tree = HuffmanTree::build(bits, symbols)?;
        let encode_table = tree.derive_encode_table();
        Ok(DecodedHuffmanTable {
            bits: *bits,
            symbols: symbols.to_vec(),
            tree: Rc::new(tree),
            encode_table: Rc::new(encode_table),
        })
    }
}

/// All MCU records plus the shared, read-only tables needed to
/// re-quantize and re-encode them.
#[derive(Clone)]
pub struct CoefficientStore {
    pub frame: FrameInfo,
    pub quant_tables: [Option<Rc<QuantizationTable>>; 4],
    pub dc_huffman: [Option<DecodedHuffmanTable>; 4],
    pub ac_huffman: [Option<DecodedHuffmanTable>; 4],
    /// MCU records in raster order: index `by * mcus_wide + bx`.
    pub mcus: Vec<McuBlock>,
}

impl CoefficientStore {
    pub fn mcus_wide(&self) -> usize {
        self.frame.mcus_wide()
    }

    pub fn mcus_high(&self) -> usize {
        self.frame.mcus_high()
    }

    pub fn quant_table_for(&self, component: &Component) -> &QuantizationTable {
        self.quant_tables[component.quant_table_id as usize]
            .as_deref()
            .expect("quant table id referenced by SOF0 must have a matching DQT")
    }
}
