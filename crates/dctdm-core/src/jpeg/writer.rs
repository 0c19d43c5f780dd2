//! Emits a fresh, standards-conformant baseline JPEG from a
//! [`CoefficientStore`] and its already-encoded scan bytes.
//!
//! Unlike a transcoder that patches the scan into an existing file, this
//! builds every segment from scratch: SOI, APP0/JFIF, DQT, SOF0, DHT x4,
//! SOS, the scan, EOI.

use crate::error::{DctdmError, Result};
use crate::store::CoefficientStore;

/// Build a complete JPEG byte stream.
pub fn write_jpeg(store: &CoefficientStore, scan_data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    out.extend_from_slice(&[0xFF, 0xD8]); // SOI

    write_app0_jfif(&mut out);

    for table in store.quant_tables.iter().flatten() {
        write_dqt(&mut out, table);
    }

    write_sof0(&mut out, store)?;

    // DC0, AC0, DC1, AC1, in that order, skipping any table the store
    // doesn't use.
    if let Some(t) = &store.dc_huffman[0] {
        write_dht(&mut out, 0, 0, t);
    }
    if let Some(t) = &store.ac_huffman[0] {
        write_dht(&mut out, 1, 0, t);
    }
    if let Some(t) = &store.dc_huffman[1] {
        write_dht(&mut out, 0, 1, t);
    }
    if let Some(t) = &store.ac_huffman[1] {
        write_dht(&mut out, 1, 1, t);
    }

    write_sos_header(&mut out, store)?;
    out.extend_from_slice(scan_data);

    out.extend_from_slice(&[0xFF, 0xD9]); // EOI

    Ok(out)
}

fn write_segment(out: &mut Vec<u8>, marker: u8, body: &[u8]) {
    out.push(0xFF);
    out.push(marker);
    let length = (body.len() + 2) as u16;
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(body);
}

fn write_app0_jfif(out: &mut Vec<u8>) {
    let mut body = Vec::with_capacity(14);
    body.extend_from_slice(b"JFIF\0");
    body.push(1); // version major
    body.push(1); // version minor
    body.push(0); // density units: 0 = aspect ratio only
    body.extend_from_slice(&1u16.to_be_bytes()); // X density
    body.extend_from_slice(&1u16.to_be_bytes()); // Y density
    body.push(0); // thumbnail width
    body.push(0); // thumbnail height
    write_segment(out, 0xE0, &body);
}

fn write_dqt(out: &mut Vec<u8>, table: &crate::jpeg::parser::QuantizationTable) {
    let mut body = Vec::with_capacity(1 + 64);
    body.push(table.id & 0x0F); // precision 0 (8-bit) in the high nibble
    for v in table.to_zigzag_bytes() {
        body.push(v as u8);
    }
    write_segment(out, 0xDB, &body);
}

fn write_sof0(out: &mut Vec<u8>, store: &CoefficientStore) -> Result<()> {
    let mut body = Vec::with_capacity(6 + 3 * 3);
    body.push(8); // precision
    body.extend_from_slice(&store.frame.height.to_be_bytes());
    body.extend_from_slice(&store.frame.width.to_be_bytes());
    body.push(3); // component count
    for component in &store.frame.components {
        body.push(component.id);
        body.push(0x11); // 1x1 sampling (4:4:4)
        body.push(component.quant_table_id);
    }
    write_segment(out, 0xC0, &body);
    Ok(())
}

fn write_dht(out: &mut Vec<u8>, class: u8, id: u8, table: &crate::store::DecodedHuffmanTable) {
    let mut body = Vec::with_capacity(1 + 16 + table.symbols.len());
    body.push((class << 4) | (id & 0x0F));
    body.extend_from_slice(&table.bits);
    body.extend_from_slice(&table.symbols);
    write_segment(out, 0xC4, &body);
}

fn write_sos_header(out: &mut Vec<u8>, store: &CoefficientStore) -> Result<()> {
    if store.frame.components.len() != 3 {
        return Err(DctdmError::UnsupportedFormat(
            "SOS requires exactly 3 components".to_string(),
        ));
    }
    let mut body = Vec::with_capacity(1 + 3 * 2 + 3);
    body.push(3);
    for component in &store.frame.components {
        body.push(component.id);
        body.push((component.dc_table_id << 4) | (component.ac_table_id & 0x0F));
    }
    body.push(0); // spectral selection start
    body.push(63); // spectral selection end
    body.push(0); // successive approximation
    write_segment(out, 0xDA, &body);
    Ok(())
}
