//! DCTDM: hides short text payloads inside baseline-JPEG images by
//! modulating the differences between adjacent quantized AC luminance
//! coefficients.
//!
//! The crate is built around four components that run as one pipeline:
//!
//! 1. [`jpeg`] — a baseline-JPEG decoder/encoder that exposes and re-emits
//!    quantized DCT coefficients rather than reconstructed pixels.
//! 2. [`store`] — the [`store::CoefficientStore`] that carries those
//!    coefficients between decode, embed/extract, and encode.
//! 3. [`dctdm`] — the embed/extract algorithm itself.
//! 4. [`crypto`] and [`sidecar`] — the optional password layer and the
//!    small sidecar file that records whether a stego payload is encrypted.
//!
//! The crate-level [`embed_file`] and [`extract_file`] functions wire all
//! four together for the common file-in, file-out case; callers that
//! already hold a decoded [`store::CoefficientStore`] (e.g. to embed into
//! an image already open in memory) can call [`dctdm::embed`],
//! [`jpeg::encode_scan`], and [`jpeg::write_jpeg`] directly.

pub mod crypto;
pub mod dctdm;
pub mod error;
pub mod jpeg;
pub mod options;
pub mod rounding;
pub mod sidecar;
pub mod store;

use std::path::Path;

pub use error::{DctdmError, Result};
pub use options::DctdmOptions;
pub use store::CoefficientStore;

/// Decode `cover_path`, embed `message` using `options`, and write the
/// resulting stego JPEG to `out_path`. Writes a `.meta` sidecar alongside
/// `out_path` recording whether the payload was encrypted.
pub fn embed_file(
    cover_path: &Path,
    out_path: &Path,
    message: &str,
    options: &DctdmOptions,
) -> Result<()> {
    let cover_bytes = std::fs::read(cover_path)?;
    let parsed = jpeg::parse_jpeg(&cover_bytes)?;
    let mut store = jpeg::decode_scan(&parsed)?;
    log::debug!(
        "decoded cover {:?}: {}x{}, {} MCUs",
        cover_path,
        store.frame.width,
        store.frame.height,
        store.mcus.len()
    );

    let (payload_text, encrypted) = match &options.password {
        Some(password) => (crypto::encrypt_payload(message, password)?, true),
        None => (message.to_string(), false),
    };

    let payload_bytes = ascii_bytes(&payload_text)?;
    dctdm::embed(&mut store, &payload_bytes, options.delta)?;

    let scan_data = jpeg::encode_scan(&store)?;
    let stego_bytes = jpeg::write_jpeg(&store, &scan_data)?;
    std::fs::write(out_path, stego_bytes)?;

    sidecar::SidecarMetadata { encrypted }.write(out_path)?;
    log::debug!("wrote stego {:?} (encrypted={})", out_path, encrypted);

    Ok(())
}

/// Decode `stego_path`, recover the embedded payload with `options`, and
/// return it as a `String`. Reads the `.meta` sidecar next to `stego_path`
/// to decide whether a password is required; a missing sidecar is treated
/// as `encrypted=false`.
pub fn extract_file(stego_path: &Path, options: &DctdmOptions) -> Result<String> {
    let stego_bytes = std::fs::read(stego_path)?;
    let parsed = jpeg::parse_jpeg(&stego_bytes)?;
    let store = jpeg::decode_scan(&parsed)?;

    let payload_bytes = dctdm::extract(&store, options.delta)?;
    // The payload framing (spec.md §3) is `L` raw 8-bit code units, not
    // UTF-8: `ascii_bytes` accepts the full Latin-1 range (0..=0xFF) at
    // embed time, so decoding must invert that byte-for-byte rather than
    // through `String::from_utf8`, which rejects 0x80..=0xFF.
    let payload_text: String = payload_bytes.iter().map(|&b| b as char).collect();

    let meta = sidecar::SidecarMetadata::read(stego_path)?;
    if meta.encrypted {
        let password = options
            .password
            .as_deref()
            .ok_or(DctdmError::PasswordRequired)?;
        crypto::decrypt_payload(&payload_text, password)
    } else {
        Ok(payload_text)
    }
}

/// Validate that every character is a code point spec.md's 8-bit-per-char
/// framing can carry, and return the lower-byte-per-char encoding.
///
/// spec.md's Design Notes call out that the original implementation
/// silently truncates non-ASCII characters to one byte; per SPEC_FULL's
/// resolution of that Open Question, this crate rejects them instead.
fn ascii_bytes(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|c| {
            if c as u32 <= 0xFF {
                Ok(c as u8)
            } else {
                Err(DctdmError::MalformedStream(format!(
                    "character {c:?} is outside the 8-bit payload framing"
                )))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::parser::{Component, FrameInfo, QuantizationTable};
    use crate::store::{DecodedHuffmanTable, McuBlock};
    use std::rc::Rc;
    use tempfile::tempdir;

    /// The standard Annex K (ITU-T T.81 K.3.3) DC/AC luminance and
    /// chrominance Huffman tables. A single-symbol stand-in table isn't
    /// enough here: once `embed` has touched a cover's AC coefficients,
    /// `encode_scan` emits real run/size symbols, not just EOB.
    mod std_tables {
        pub fn dc_luminance() -> ([u8; 16], Vec<u8>) {
            (
                [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
                vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            )
        }

        pub fn dc_chrominance() -> ([u8; 16], Vec<u8>) {
            (
                [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0],
                vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            )
        }

        #[rustfmt::skip]
        pub fn ac_luminance() -> ([u8; 16], Vec<u8>) {
            (
                [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7D],
                vec![
                    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12,
                    0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
                    0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xA1, 0x08,
                    0x23, 0x42, 0xB1, 0xC1, 0x15, 0x52, 0xD1, 0xF0,
                    0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0A, 0x16,
                    0x17, 0x18, 0x19, 0x1A, 0x25, 0x26, 0x27, 0x28,
                    0x29, 0x2A, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39,
                    0x3A, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
                    0x4A, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59,
                    0x5A, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
                    0x6A, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79,
                    0x7A, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
                    0x8A, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98,
                    0x99, 0x9A, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7,
                    0xA8, 0xA9, 0xAA, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6,
                    0xB7, 0xB8, 0xB9, 0xBA, 0xC2, 0xC3, 0xC4, 0xC5,
                    0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xD2, 0xD3, 0xD4,
                    0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xE1, 0xE2,
                    0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA,
                    0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8,
                    0xF9, 0xFA,
                ],
            )
        }

        #[rustfmt::skip]
        pub fn ac_chrominance() -> ([u8; 16], Vec<u8>) {
            (
                [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 0x77],
                vec![
                    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21,
                    0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61, 0x71,
                    0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91,
                    0xA1, 0xB1, 0xC1, 0x09, 0x23, 0x33, 0x52, 0xF0,
                    0x15, 0x62, 0x72, 0xD1, 0x0A, 0x16, 0x24, 0x34,
                    0xE1, 0x25, 0xF1, 0x17, 0x18, 0x19, 0x1A, 0x26,
                    0x27, 0x28, 0x29, 0x2A, 0x35, 0x36, 0x37, 0x38,
                    0x39, 0x3A, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
                    0x49, 0x4A, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58,
                    0x59, 0x5A, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68,
                    0x69, 0x6A, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78,
                    0x79, 0x7A, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87,
                    0x88, 0x89, 0x8A, 0x92, 0x93, 0x94, 0x95, 0x96,
                    0x97, 0x98, 0x99, 0x9A, 0xA2, 0xA3, 0xA4, 0xA5,
                    0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xB2, 0xB3, 0xB4,
                    0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xC2, 0xC3,
                    0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xD2,
                    0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA,
                    0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9,
                    0xEA, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8,
                    0xF9, 0xFA,
                ],
            )
        }
    }

    /// Build a small synthetic cover image directly from a
    /// [`CoefficientStore`] (no binary JPEG fixtures ship with this crate),
    /// encode it, and write it to disk for the round-trip tests below.
    fn write_synthetic_cover(path: &std::path::Path, mcu_count: usize) {
        let components = [
            Component {
                id: 1,
                quant_table_id: 0,
                dc_table_id: 0,
                ac_table_id: 0,
            },
            Component {
                id: 2,
                quant_table_id: 1,
                dc_table_id: 1,
                ac_table_id: 1,
            },
            Component {
                id: 3,
                quant_table_id: 1,
                dc_table_id: 1,
                ac_table_id: 1,
            },
        ];
        let frame = FrameInfo {
            width: 8 * mcu_count as u16,
            height: 8,
            components,
        };

        let (dc_bits, dc_syms) = std_tables::dc_luminance();
        let dc_table_luma = DecodedHuffmanTable::build(&dc_bits, &dc_syms).unwrap();
        let (ac_bits, ac_syms) = std_tables::ac_luminance();
        let ac_table_luma = DecodedHuffmanTable::build(&ac_bits, &ac_syms).unwrap();
        let (dc_bits, dc_syms) = std_tables::dc_chrominance();
        let dc_table_chroma = DecodedHuffmanTable::build(&dc_bits, &dc_syms).unwrap();
        let (ac_bits, ac_syms) = std_tables::ac_chrominance();
        let ac_table_chroma = DecodedHuffmanTable::build(&ac_bits, &ac_syms).unwrap();

        let quant = QuantizationTable {
            id: 0,
            values: [2u16; 64],
        };
        let quant_chroma = QuantizationTable {
            id: 1,
            values: [2u16; 64],
        };

        let store = CoefficientStore {
            frame,
            quant_tables: [
                Some(Rc::new(quant)),
                Some(Rc::new(quant_chroma)),
                None,
                None,
            ],
            dc_huffman: [Some(dc_table_luma), Some(dc_table_chroma), None, None],
            ac_huffman: [Some(ac_table_luma), Some(ac_table_chroma), None, None],
            mcus: vec![McuBlock::zeroed(); mcu_count],
        };

        let scan_data = jpeg::encode_scan(&store).unwrap();
        let bytes = jpeg::write_jpeg(&store, &scan_data).unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn embed_then_extract_file_roundtrip_without_password() {
        let dir = tempdir().unwrap();
        let cover = dir.path().join("cover.jpg");
        let stego = dir.path().join("stego.jpg");
        write_synthetic_cover(&cover, 4);

        let options = DctdmOptions::new(10);
        embed_file(&cover, &stego, "hi", &options).unwrap();

        let recovered = extract_file(&stego, &options).unwrap();
        assert_eq!(recovered, "hi");

        let meta = sidecar::SidecarMetadata::read(&stego).unwrap();
        assert!(!meta.encrypted);
    }

    #[test]
    fn embed_then_extract_file_roundtrip_with_password() {
        let dir = tempdir().unwrap();
        let cover = dir.path().join("cover.jpg");
        let stego = dir.path().join("stego.jpg");
        write_synthetic_cover(&cover, 16);

        let embed_options = DctdmOptions::new(10).with_password("pw");
        embed_file(&cover, &stego, "secret", &embed_options).unwrap();

        let meta = sidecar::SidecarMetadata::read(&stego).unwrap();
        assert!(meta.encrypted);

        let extract_options = DctdmOptions::new(10).with_password("pw");
        let recovered = extract_file(&stego, &extract_options).unwrap();
        assert_eq!(recovered, "secret");

        let wrong_password = DctdmOptions::new(10).with_password("wrong");
        let err = extract_file(&stego, &wrong_password).unwrap_err();
        assert!(matches!(err, DctdmError::DecryptionFailed));

        let no_password = DctdmOptions::new(10);
        let err = extract_file(&stego, &no_password).unwrap_err();
        assert!(matches!(err, DctdmError::PasswordRequired));
    }

    #[test]
    fn capacity_exceeded_on_a_too_small_cover() {
        let dir = tempdir().unwrap();
        let cover = dir.path().join("cover.jpg");
        let stego = dir.path().join("stego.jpg");
        write_synthetic_cover(&cover, 1);

        let options = DctdmOptions::new(10);
        let err = embed_file(&cover, &stego, "too long for one MCU", &options).unwrap_err();
        assert!(matches!(err, DctdmError::CapacityExceeded { .. }));
    }
}
