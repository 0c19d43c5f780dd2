//! Canonical JPEG Huffman coding: tree construction for decoding, and the
//! derived inverse (symbol -> code) table for encoding.
//!
//! The decode tree is an arena of nodes addressed by index rather than a
//! pointer-based tree, per the design notes: no recursion or heterogeneous
//! containers are needed to walk it.

use crate::error::{DctdmError, Result};
use crate::jpeg::bitio::{BitReader, BitWriter};

/// AC symbol `0x00`: end-of-block, remaining coefficients are zero.
pub const EOB: u8 = 0x00;
/// AC symbol `0xF0`: a run of 16 zero coefficients with no value attached.
pub const ZRL: u8 = 0xF0;

#[derive(Clone, Copy, Debug)]
enum HuffmanNode {
    /// Internal node: (left child index, right child index). `u32::MAX`
    /// marks an unfilled slot.
    Branch(u32, u32),
    /// Leaf node carrying a decoded symbol byte.
    Leaf(u8),
}

/// A canonical Huffman decode tree built from a `BITS[1..16]` table and its
/// flat symbol list (JPEG DHT segment contents).
#[derive(Clone, Debug)]
pub struct HuffmanTree {
    nodes: Vec<HuffmanNode>,
    root: u32,
}

const EMPTY: u32 = u32::MAX;

impl HuffmanTree {
    /// Build a decode tree from the 16 length counts and the symbols in
    /// canonical order (shortest codes first, left-to-right within a
    /// length class).
    pub fn build(bits: &[u8; 16], symbols: &[u8]) -> Result<Self> {
        let mut tree = HuffmanTree {
            nodes: vec![HuffmanNode::Branch(EMPTY, EMPTY)],
            root: 0,
        };

        let mut symbol_iter = symbols.iter();
        // `code` is the canonical Huffman code built up length-class by
        // length-class; `frontier` tracks the leftmost still-open path at
        // the current depth so new leaves fill left-to-right.
        let mut frontier: Vec<u32> = vec![tree.root];

        for length_class in 1..=16u8 {
            let count = bits[(length_class - 1) as usize] as usize;

            // Descend one level: every open path doubles (left, then right).
            let mut next_frontier = Vec::with_capacity(frontier.len() * 2);
            for &node_idx in &frontier {
                let (left, right) = tree.split(node_idx);
                next_frontier.push(left);
                next_frontier.push(right);
            }
            frontier = next_frontier;

            if frontier.len() < count {
                return Err(DctdmError::MalformedStream(
                    "invalid Huffman BITS table (too many codes for tree depth)".to_string(),
                ));
            }

            // The first `count` open slots at this depth become leaves for
            // the next `count` symbols in canonical order; the rest stay
            // open for deeper length classes.
            let mut remaining = Vec::with_capacity(frontier.len() - count);
            for (i, &node_idx) in frontier.iter().enumerate() {
                if i < count {
                    let symbol = *symbol_iter.next().ok_or_else(|| {
                        DctdmError::MalformedStream("DHT symbol list shorter than BITS".to_string())
                    })?;
                    tree.nodes[node_idx as usize] = HuffmanNode::Leaf(symbol);
                } else {
                    remaining.push(node_idx);
                }
            }
            frontier = remaining;
        }

        if symbol_iter.next().is_some() {
            return Err(DctdmError::MalformedStream(
                "DHT symbol list longer than BITS allows".to_string(),
            ));
        }

        Ok(tree)
    }

    /// Split a branch node into fresh left/right children, or return its
    /// existing children if already split. Returns `(left, right)`.
    fn split(&mut self, node_idx: u32) -> (u32, u32) {
        match self.nodes[node_idx as usize] {
            HuffmanNode::Branch(l, r) if l != EMPTY || r != EMPTY => (l, r),
            _ => {
                let left = self.nodes.len() as u32;
                self.nodes.push(HuffmanNode::Branch(EMPTY, EMPTY));
                let right = self.nodes.len() as u32;
                self.nodes.push(HuffmanNode::Branch(EMPTY, EMPTY));
                self.nodes[node_idx as usize] = HuffmanNode::Branch(left, right);
                (left, right)
            }
        }
    }

    /// Decode one symbol by descending the tree bit by bit: `0` = left
    /// child, `1` = right child.
    pub fn decode(&self, reader: &mut BitReader) -> Result<u8> {
        let mut node = self.root;
        loop {
            match self.nodes[node as usize] {
                HuffmanNode::Leaf(symbol) => return Ok(symbol),
                HuffmanNode::Branch(left, right) => {
                    let bit = reader.read_bit()?;
                    node = if bit == 0 { left } else { right };
                    if node == EMPTY {
                        return Err(DctdmError::MalformedStream(
                            "Huffman decode traversed a nonexistent child".to_string(),
                        ));
                    }
                }
            }
        }
    }

    /// Derive the inverse `symbol -> (code, length)` table by walking every
    /// root-to-leaf path once.
    pub fn derive_encode_table(&self) -> HuffmanEncodeTable {
        let mut table = [None; 256];
        self.walk(self.root, 0, 0, &mut table);
        HuffmanEncodeTable { table }
    }

    fn walk(&self, node: u32, code: u16, depth: u8, table: &mut [Option<(u16, u8)>; 256]) {
        match self.nodes[node as usize] {
            HuffmanNode::Leaf(symbol) => table[symbol as usize] = Some((code, depth)),
            HuffmanNode::Branch(left, right) => {
                if left != EMPTY {
                    self.walk(left, code << 1, depth + 1, table);
                }
                if right != EMPTY {
                    self.walk(right, (code << 1) | 1, depth + 1, table);
                }
            }
        }
    }
}

/// Inverse Huffman table: symbol -> (canonical code, code length in bits).
#[derive(Clone, Debug)]
pub struct HuffmanEncodeTable {
    table: [Option<(u16, u8)>; 256],
}

impl HuffmanEncodeTable {
    pub fn write_symbol(&self, writer: &mut BitWriter, symbol: u8) -> Result<()> {
        let (code, length) = self.table[symbol as usize].ok_or_else(|| {
            DctdmError::MalformedStream(format!("symbol 0x{symbol:02X} not in Huffman table"))
        })?;
        writer.write_bits(code as u32, length);
        Ok(())
    }
}

/// `extend(r, s)`: recover a signed DC/AC magnitude from its raw bit
/// pattern `r` of size `s`, per JPEG Figure F.12.
#[inline]
pub fn extend(r: u32, s: u8) -> i32 {
    if s == 0 {
        return 0;
    }
    let vt = 1i32 << (s - 1);
    let r = r as i32;
    if r < vt {
        r - ((1 << s) - 1)
    } else {
        r
    }
}

/// Inverse of [`extend`]: the `s`-bit raw pattern encoding signed value `v`.
/// `s` must be the bit-length category for `v` (0 if `v == 0`).
#[inline]
pub fn un_extend(v: i32, s: u8) -> u32 {
    if s == 0 {
        return 0;
    }
    if v >= 0 {
        v as u32
    } else {
        (v + ((1 << s) - 1)) as u32
    }
}

/// The bit-length category (`size`) of a DC diff or AC coefficient: the
/// number of bits needed to represent `|v|`, 0 for `v == 0`.
#[inline]
pub fn magnitude_category(v: i32) -> u8 {
    if v == 0 {
        0
    } else {
        32 - (v.unsigned_abs()).leading_zeros() as u8
    }
}
